// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::store::{Certificates, NativeResult, NativeStore, StoreLocation};
use std::convert::Infallible;
use tracing::warn;

/// Placeholder for the Windows system store. It cannot be opened here.
#[derive(Debug)]
pub enum SystemStore {}

impl SystemStore {
    pub fn open(location: StoreLocation, name: &str) -> Result<Self> {
        warn!(%location, store = name, "Windows certificate store requested on a non-Windows platform");
        Err(Error::UnsupportedPlatform)
    }
}

impl NativeStore for SystemStore {
    type Context = Infallible;

    fn certificates(&self) -> Certificates<'_, Infallible> {
        match *self {}
    }

    fn display_name(&self, cert: &Infallible) -> Option<String> {
        match *cert {}
    }

    fn add_encoded(&self, _der: &[u8]) -> NativeResult<()> {
        match *self {}
    }

    fn delete(&self, cert: Infallible) -> NativeResult<()> {
        match cert {}
    }
}
