// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! List, add, and delete certificates in the Windows certificate store.
//!
//! ```rust,no_run
//! use certstore::{Certstore, StoreLocation};
//! use std::path::Path;
//!
//! let store = Certstore::open(StoreLocation::CurrentUser, Some("root"))?;
//! for name in store.list()? {
//!     println!("{}", name);
//! }
//!
//! println!("{}", store.add(Path::new("corp-root.der"))?);
//! println!("{}", store.delete("Corp Root CA")?);
//! # Ok::<(), certstore::Error>(())
//! ```
//!
//! The store operations are generic over [`NativeStore`], so they can be
//! driven by something other than the OS store.

/// Input validation for store names and certificate files.
pub mod assertions;
/// Configuration handling.
pub mod config;
/// Reading certificates as DER.
pub mod der;
/// Error types.
pub mod error;
/// Certificate store operations.
pub mod store;

pub use assertions::{
    validate_certificate, validate_store, StoreName, VALID_CERT_EXTENSIONS, VALID_STORE_NAMES,
};
pub use config::{Config, Paths};
pub use der::DerConverter;
pub use error::{Error, NativeError, Operation, Result, Win32Error, Win32ErrorKind};
pub use store::{
    cert_add, cert_delete, cert_list, Certstore, DeleteOutcome, NativeStore, StoreLocation,
    SystemStore,
};
