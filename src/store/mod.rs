// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod win32;

#[cfg(not(windows))]
pub use unsupported::SystemStore;
#[cfg(windows)]
pub use win32::{CertContext, CertIter, SystemStore};

use crate::assertions::{validate_certificate, validate_store, StoreName};
use crate::der::DerConverter;
use crate::error::{NativeError, Operation, Result, Win32Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Iterator over the certificate contexts of a store.
pub type Certificates<'a, C> = Box<dyn Iterator<Item = NativeResult<C>> + 'a>;

/// The native certificate store primitives the store operations are built on.
///
/// Every method returns its error code directly; nothing reads a shared
/// "last error" afterwards.
pub trait NativeStore {
    /// An owned certificate context, released when dropped.
    type Context;

    /// Enumerate the store. The iterator yields an `Err` once and then ends
    /// if the enumeration fails part-way. Dropping it releases the native
    /// enumeration state.
    fn certificates(&self) -> Certificates<'_, Self::Context>;

    /// Issuer-or-friendly display name of a certificate.
    fn display_name(&self, cert: &Self::Context) -> Option<String>;

    /// Add a DER-encoded certificate.
    fn add_encoded(&self, der: &[u8]) -> NativeResult<()>;

    /// Delete a certificate. Consumes the context whether or not the call succeeds.
    fn delete(&self, cert: Self::Context) -> NativeResult<()>;
}

/// Where a system store lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreLocation {
    #[default]
    CurrentUser,
    LocalMachine,
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentUser => write!(f, "current-user"),
            Self::LocalMachine => write!(f, "local-machine"),
        }
    }
}

impl FromStr for StoreLocation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "current-user" | "currentuser" | "user" => Ok(Self::CurrentUser),
            "local-machine" | "localmachine" | "machine" => Ok(Self::LocalMachine),
            _ => Err(format!(
                "invalid store location '{}': expected current-user or local-machine",
                s
            )),
        }
    }
}

/// Result of a delete request. A missing certificate is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(String),
    NotFound(String),
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }

    /// The name that was requested.
    pub fn name(&self) -> &str {
        match self {
            Self::Deleted(name) | Self::NotFound(name) => name,
        }
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted(name) => write!(f, "Deleted certificate {} successfully", name),
            Self::NotFound(name) => write!(
                f,
                "Cannot find certificate with name as `{}`. Please re-verify certificate Issuer name or Friendly name",
                name
            ),
        }
    }
}

/// List the display names of every certificate, in enumeration order.
pub fn cert_list<S: NativeStore + ?Sized>(store: &S) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for cert in store.certificates() {
        let cert = cert.map_err(|e| Win32Error::from_native(e, Operation::Load))?;
        if let Some(name) = store.display_name(&cert) {
            names.push(name);
        }
    }
    debug!(count = names.len(), "enumerated certificates");
    Ok(names)
}

/// Add the certificate file at `path`, converting it to DER if needed.
pub fn cert_add<S: NativeStore + ?Sized>(
    store: &S,
    path: &Path,
    converter: &DerConverter,
) -> Result<String> {
    let cert_path = validate_certificate(Some(path))?;
    let der = converter.read_der(&cert_path)?;

    store
        .add_encoded(&der)
        .map_err(|e| Win32Error::from_native(e, Operation::Add))?;

    let base_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(certificate = %base_name, bytes = der.len(), "added certificate");
    Ok(format!("Added certificate {} successfully", base_name))
}

/// Delete the first certificate whose display name matches `name`, ignoring case.
pub fn cert_delete<S: NativeStore + ?Sized>(store: &S, name: &str) -> Result<DeleteOutcome> {
    let wanted = name.to_lowercase();
    for cert in store.certificates() {
        let cert = cert.map_err(|e| Win32Error::from_native(e, Operation::Delete))?;
        let matches = store
            .display_name(&cert)
            .map(|display| display.to_lowercase() == wanted)
            .unwrap_or(false);

        if matches {
            store
                .delete(cert)
                .map_err(|e| Win32Error::from_native(e, Operation::Delete))?;
            info!(certificate = %name, "deleted certificate");
            return Ok(DeleteOutcome::Deleted(name.to_string()));
        }
    }

    debug!(certificate = %name, "no certificate matched");
    Ok(DeleteOutcome::NotFound(name.to_string()))
}

/// A validated store name paired with an open store.
pub struct Certstore<S: NativeStore> {
    name: StoreName,
    store: S,
    converter: DerConverter,
}

impl Certstore<SystemStore> {
    /// Validate `name` and open that system store.
    pub fn open(location: StoreLocation, name: Option<&str>) -> Result<Self> {
        Self::open_named(location, validate_store(name)?)
    }

    /// Open an already validated system store.
    // SystemStore is uninhabited off Windows
    #[cfg_attr(not(windows), allow(unreachable_code))]
    pub fn open_named(location: StoreLocation, name: StoreName) -> Result<Self> {
        let store = SystemStore::open(location, name.as_str())?;
        Ok(Self::new(name, store))
    }
}

impl<S: NativeStore> Certstore<S> {
    pub fn new(name: StoreName, store: S) -> Self {
        Self {
            name,
            store,
            converter: DerConverter::default(),
        }
    }

    pub fn with_converter(mut self, converter: DerConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn name(&self) -> &StoreName {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list(&self) -> Result<Vec<String>> {
        cert_list(&self.store)
    }

    pub fn add(&self, path: &Path) -> Result<String> {
        cert_add(&self.store, path, &self.converter)
    }

    pub fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        cert_delete(&self.store, name)
    }
}
