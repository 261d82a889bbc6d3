// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use certstore::{
    validate_certificate, validate_store, Certstore, Config, Error, Paths, Result, StoreLocation,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI definitions
// ============================================================================

#[derive(Parser)]
#[command(name = "certstore")]
#[command(about = "List, add, and delete certificates in the Windows certificate store")]
#[command(version)]
#[command(after_help = "\
EXAMPLES:
    certstore list --store root            # Names of trusted root certificates
    certstore list --store ca --json       # Same, as a JSON array
    certstore add --store root corp.der    # Add a certificate (.der, .cer, .crt, .pem)
    certstore delete --store my \"Corp CA\"  # Delete by issuer or friendly name")]
struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Certificate store name (my, ca, root, ...). Defaults to `default_store` from config.toml
    #[arg(short, long, global = true)]
    store: Option<String>,

    /// Store location: current-user or local-machine. Defaults to `location` from config.toml
    #[arg(long, global = true)]
    location: Option<StoreLocation>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the display names of the certificates in a store
    List {
        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Add a certificate file to a store
    Add {
        /// Certificate file; non-DER files are converted with openssl
        file: PathBuf,
    },

    /// Delete a certificate by issuer or friendly name (case-insensitive)
    Delete {
        /// Display name of the certificate
        name: String,
    },

    /// Show or change config.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file path and its effective contents
    Show,
    /// Set a config value (default_store, location, openssl)
    Set { key: String, value: String },
}

/// Output helper that respects --quiet.
#[derive(Clone, Copy)]
struct Output {
    quiet: bool,
}

impl Output {
    fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print a standard message (suppressed with --quiet)
    fn print(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    // Reset SIGPIPE to default behavior (exit) instead of panic
    // This prevents "broken pipe" panics when output is piped to tools like grep/head
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let out = Output::new(cli.quiet);

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let paths = Paths::new()?;
    let config = Config::load(&paths.config)?;
    debug!(config = %paths.config.display(), "loaded configuration");

    let location = cli.location.unwrap_or(config.location);
    let store = cli.store.as_deref().or(config.default_store.as_deref());

    match cli.command {
        Commands::List { json } => cmd_list(location, store, json),
        Commands::Add { file } => cmd_add(&config, location, store, file, out),
        Commands::Delete { name } => cmd_delete(location, store, &name, out),
        Commands::Config { action } => cmd_config(&paths, config, action, out),
        Commands::Completions { .. } => Ok(()),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_list(location: StoreLocation, store: Option<&str>, json: bool) -> Result<()> {
    let certstore = Certstore::open(location, store)?;
    let names = certstore.list()?;

    if json {
        println!("{}", serde_json::to_string(&names)?);
    } else {
        for name in &names {
            println!("{}", name);
        }
    }
    Ok(())
}

fn cmd_add(
    config: &Config,
    location: StoreLocation,
    store: Option<&str>,
    file: PathBuf,
    out: Output,
) -> Result<()> {
    // Report bad input before touching the store
    let name = validate_store(store)?;
    validate_certificate(Some(&file))?;

    let certstore = Certstore::open_named(location, name)?.with_converter(config.converter());
    let message = certstore.add(&file)?;
    out.print(&message);
    Ok(())
}

fn cmd_delete(location: StoreLocation, store: Option<&str>, name: &str, out: Output) -> Result<()> {
    let certstore = Certstore::open(location, store)?;
    let outcome = certstore.delete(name)?;
    out.print(&outcome.to_string());
    Ok(())
}

fn cmd_config(paths: &Paths, mut config: Config, action: ConfigAction, out: Output) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content =
                toml::to_string_pretty(&config).map_err(|e| Error::Config(e.to_string()))?;
            println!("# {}", paths.config.display());
            print!("{}", content);
        }
        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "default_store" => {
                    let name = validate_store(Some(value.as_str()))?;
                    config.default_store = Some(name.as_str().to_string());
                }
                "location" => {
                    config.location = value.parse().map_err(Error::Config)?;
                }
                "openssl" => {
                    if value.is_empty() {
                        return Err(Error::Config("openssl cannot be empty".into()));
                    }
                    config.openssl = PathBuf::from(value);
                }
                _ => {
                    return Err(Error::Config(format!(
                        "Unknown key '{}'. Valid keys: default_store, location, openssl",
                        key
                    )))
                }
            }
            paths.ensure_dir()?;
            config.save(&paths.config)?;
            out.print(&format!("Saved {} to {}", key, paths.config.display()));
        }
    }
    Ok(())
}

fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "certstore", &mut std::io::stdout());
}
