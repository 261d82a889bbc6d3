// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::assertions::validate_store;
use crate::der::{DerConverter, DEFAULT_OPENSSL};
use crate::error::{Error, Result};
use crate::store::StoreLocation;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Current config file version. Increment when making breaking changes.
const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config file version for future migration support
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    /// Store used when a command does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_store: Option<String>,
    #[serde(default)]
    pub location: StoreLocation,
    /// OpenSSL binary used to convert non-DER certificates
    #[serde(default = "default_openssl")]
    pub openssl: PathBuf,
}

fn default_config_version() -> u32 {
    CONFIG_VERSION
}

fn default_openssl() -> PathBuf {
    PathBuf::from(DEFAULT_OPENSSL)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            default_store: None,
            location: StoreLocation::default(),
            openssl: default_openssl(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
    pub config: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base = Self::base_dir()?;
        Ok(Self {
            config: base.join("config.toml"),
            base,
        })
    }

    fn base_dir() -> Result<PathBuf> {
        // Check for CERTSTORE_ROOT environment variable first
        if let Ok(custom_root) = std::env::var("CERTSTORE_ROOT") {
            let path = PathBuf::from(&custom_root);
            if !path.is_absolute() {
                return Err(Error::Config(format!(
                    "CERTSTORE_ROOT must be an absolute path, got: {}",
                    custom_root
                )));
            }
            return Ok(path);
        }

        if let Some(proj_dirs) = ProjectDirs::from("", "", "certstore") {
            Ok(proj_dirs.config_dir().to_path_buf())
        } else if let Some(base_dirs) = BaseDirs::new() {
            Ok(base_dirs.config_dir().join("certstore"))
        } else {
            Err(Error::Config(
                "Could not determine a configuration directory. Set CERTSTORE_ROOT.".into(),
            ))
        }
    }

    pub fn ensure_dir(&self) -> Result<()> {
        if !self.base.exists() {
            std::fs::create_dir_all(&self.base).map_err(|e| Error::CreateDir {
                path: self.base.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
                path: path.to_path_buf(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.config_version > CONFIG_VERSION {
            warn!(
                version = self.config_version,
                supported = CONFIG_VERSION,
                "config.toml version is newer than supported; some settings may be ignored"
            );
        }

        if let Some(store) = &self.default_store {
            validate_store(Some(store.as_str()))
                .map_err(|e| Error::Config(format!("default_store: {}", e)))?;
        }

        if self.openssl.as_os_str().is_empty() {
            return Err(Error::Config("openssl cannot be empty".into()));
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| Error::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn converter(&self) -> DerConverter {
        DerConverter::new(&self.openssl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.config_version, 1);
        assert_eq!(config.default_store, None);
        assert_eq!(config.location, StoreLocation::CurrentUser);
        assert_eq!(config.openssl, PathBuf::from("openssl"));
    }

    #[test]
    fn test_config_load_missing_file() {
        let path = PathBuf::from("/nonexistent/config.toml");
        let config =
            Config::load(&path).expect("Config should load with defaults for missing file");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_load_custom_values() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "default_store = \"Root\"").expect("write default_store should succeed");
        writeln!(file, "location = \"local-machine\"").expect("write location should succeed");
        writeln!(file, "openssl = \"/opt/openssl/bin/openssl\"")
            .expect("write openssl should succeed");

        let config = Config::load(file.path()).expect("Config should load successfully");
        assert_eq!(config.default_store.as_deref(), Some("Root"));
        assert_eq!(config.location, StoreLocation::LocalMachine);
        assert_eq!(config.openssl, PathBuf::from("/opt/openssl/bin/openssl"));
        assert_eq!(
            config.converter().openssl(),
            Path::new("/opt/openssl/bin/openssl")
        );
    }

    #[test]
    fn test_config_load_partial() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "default_store = \"ca\"").expect("write default_store should succeed");

        let config = Config::load(file.path()).expect("Config should load with partial values");
        assert_eq!(config.default_store.as_deref(), Some("ca"));
        assert_eq!(config.location, StoreLocation::CurrentUser); // default
        assert_eq!(config.openssl, PathBuf::from("openssl")); // default
    }

    #[test]
    fn test_config_save_and_load() {
        let file = NamedTempFile::new().expect("temp file should be created");
        let config = Config {
            config_version: 1,
            default_store: Some("my".into()),
            location: StoreLocation::LocalMachine,
            openssl: PathBuf::from("C:\\OpenSSL\\bin\\openssl.exe"),
        };

        config
            .save(file.path())
            .expect("Config should save successfully");
        let loaded = Config::load(file.path()).expect("Config should load after save");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_invalid_default_store() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "default_store = \"Chef\"").expect("write default_store should succeed");

        let result = Config::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_invalid_location() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "location = \"elsewhere\"").expect("write location should succeed");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_config_empty_openssl() {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "openssl = \"\"").expect("write openssl should succeed");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_paths_ensure_dir() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let paths = Paths {
            base: temp_dir.path().join("nested").join("certstore"),
            config: temp_dir.path().join("nested").join("certstore").join("config.toml"),
        };
        paths.ensure_dir().expect("directory should be created");
        assert!(paths.base.is_dir());
    }
}
