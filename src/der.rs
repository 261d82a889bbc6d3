// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::assertions::is_der;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub const DEFAULT_OPENSSL: &str = "openssl";

/// Reads certificate files as DER, converting other encodings through `openssl x509`.
#[derive(Debug, Clone)]
pub struct DerConverter {
    openssl: PathBuf,
}

impl Default for DerConverter {
    fn default() -> Self {
        Self::new(DEFAULT_OPENSSL)
    }
}

impl DerConverter {
    pub fn new(openssl: impl Into<PathBuf>) -> Self {
        Self {
            openssl: openssl.into(),
        }
    }

    pub fn openssl(&self) -> &Path {
        &self.openssl
    }

    /// Return the DER bytes of the certificate at `path`.
    pub fn read_der(&self, path: &Path) -> Result<Vec<u8>> {
        if is_der(path) {
            return std::fs::read(path).map_err(|e| Error::ReadFile {
                path: path.to_path_buf(),
                source: e,
            });
        }
        self.convert(path)
    }

    fn convert(&self, path: &Path) -> Result<Vec<u8>> {
        let command = format!("{} x509 -outform DER", self.openssl.display());
        debug!(input = %path.display(), openssl = %self.openssl.display(), "converting certificate to DER");

        // DER goes to stdout, no temp file needed
        let output = Command::new(&self.openssl)
            .arg("x509")
            .arg("-in")
            .arg(path)
            .args(["-outform", "DER"])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::CommandNotFound {
                        command: self.openssl.display().to_string(),
                        hint: "Install OpenSSL or set `openssl` in config.toml, or supply the certificate in .der format.".into(),
                    }
                } else {
                    Error::Command {
                        command: command.clone(),
                        stderr: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(Error::Command {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.is_empty() {
            return Err(Error::Command {
                command,
                stderr: format!("no DER output produced for {}", path.display()),
            });
        }

        debug!(bytes = output.stdout.len(), "converted certificate to DER");
        Ok(output.stdout)
    }
}
