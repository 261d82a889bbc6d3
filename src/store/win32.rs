// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{
    Error, NativeError, Operation, Result, Win32Error, CRYPT_E_NOT_FOUND, ERROR_NO_MORE_FILES,
};
use crate::store::{Certificates, NativeResult, NativeStore, StoreLocation};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use tracing::debug;
use windows::Win32::Foundation::GetLastError;
use windows::Win32::Security::Cryptography::{
    CertAddEncodedCertificateToStore, CertCloseStore, CertDeleteCertificateFromStore,
    CertDuplicateCertificateContext, CertEnumCertificatesInStore, CertFreeCertificateContext,
    CertGetNameStringW, CertOpenStore, CERT_CONTEXT, CERT_NAME_FRIENDLY_DISPLAY_TYPE,
    CERT_NAME_ISSUER_FLAG, CERT_OPEN_STORE_FLAGS, CERT_QUERY_ENCODING_TYPE,
    CERT_STORE_PROV_SYSTEM_W, HCERTSTORE, HCRYPTPROV_LEGACY, X509_ASN_ENCODING,
};

const CERT_SYSTEM_STORE_CURRENT_USER: u32 = 0x0001_0000;
const CERT_SYSTEM_STORE_LOCAL_MACHINE: u32 = 0x0002_0000;

/// CERT_STORE_ADD_USE_EXISTING
const ADD_DISPOSITION: u32 = 2;

impl From<windows::core::Error> for NativeError {
    fn from(e: windows::core::Error) -> Self {
        NativeError(e.code().0)
    }
}

fn last_error() -> NativeError {
    NativeError(unsafe { GetLastError() }.0 as i32)
}

impl StoreLocation {
    fn to_flags(self) -> CERT_OPEN_STORE_FLAGS {
        match self {
            Self::CurrentUser => CERT_OPEN_STORE_FLAGS(CERT_SYSTEM_STORE_CURRENT_USER),
            Self::LocalMachine => CERT_OPEN_STORE_FLAGS(CERT_SYSTEM_STORE_LOCAL_MACHINE),
        }
    }
}

/// An open Windows system certificate store, closed on drop.
pub struct SystemStore {
    handle: HCERTSTORE,
    location: StoreLocation,
    name: String,
}

// SAFETY: HCERTSTORE handles may be used from any thread.
unsafe impl Send for SystemStore {}

impl SystemStore {
    pub fn open(location: StoreLocation, name: &str) -> Result<Self> {
        let wide_name: Vec<u16> = OsStr::new(name)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe {
            CertOpenStore(
                CERT_STORE_PROV_SYSTEM_W,
                CERT_QUERY_ENCODING_TYPE::default(),
                HCRYPTPROV_LEGACY::default(),
                location.to_flags(),
                Some(wide_name.as_ptr() as *const _),
            )
        }
        .map_err(|e| Error::Win32(Win32Error::from_native(e.into(), Operation::Load)))?;

        debug!(%location, store = name, "opened certificate store");
        Ok(Self {
            handle,
            location,
            name: name.to_string(),
        })
    }

    pub fn location(&self) -> StoreLocation {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iter(&self) -> CertIter<'_> {
        CertIter {
            store: self,
            current: std::ptr::null(),
            done: false,
        }
    }
}

impl Drop for SystemStore {
    fn drop(&mut self) {
        unsafe {
            let _ = CertCloseStore(self.handle, 0);
        }
    }
}

impl NativeStore for SystemStore {
    type Context = CertContext;

    fn certificates(&self) -> Certificates<'_, CertContext> {
        Box::new(self.iter())
    }

    fn display_name(&self, cert: &CertContext) -> Option<String> {
        cert.display_name()
    }

    fn add_encoded(&self, der: &[u8]) -> NativeResult<()> {
        unsafe {
            CertAddEncodedCertificateToStore(
                self.handle,
                X509_ASN_ENCODING,
                der,
                ADD_DISPOSITION,
                None,
            )
        }
        .map_err(NativeError::from)
    }

    fn delete(&self, cert: CertContext) -> NativeResult<()> {
        // The delete call frees the context even when it fails
        let raw = cert.into_raw();
        unsafe { CertDeleteCertificateFromStore(raw) }.map_err(NativeError::from)
    }
}

/// An owned reference to one certificate, freed on drop.
pub struct CertContext(*const CERT_CONTEXT);

impl CertContext {
    fn duplicate_of(ptr: *const CERT_CONTEXT) -> Self {
        Self(unsafe { CertDuplicateCertificateContext(Some(ptr)) } as *const _)
    }

    fn into_raw(self) -> *const CERT_CONTEXT {
        let ptr = self.0;
        std::mem::forget(self);
        ptr
    }

    /// Issuer-or-friendly display name.
    pub fn display_name(&self) -> Option<String> {
        let len = unsafe {
            CertGetNameStringW(
                self.0,
                CERT_NAME_FRIENDLY_DISPLAY_TYPE,
                CERT_NAME_ISSUER_FLAG,
                None,
                None,
            )
        };
        if len == 0 {
            return None;
        }

        let mut buf = vec![0u16; len as usize];
        let written = unsafe {
            CertGetNameStringW(
                self.0,
                CERT_NAME_FRIENDLY_DISPLAY_TYPE,
                CERT_NAME_ISSUER_FLAG,
                None,
                Some(&mut buf),
            )
        };
        if written == 0 {
            return None;
        }

        // Count includes the terminating NUL
        buf.truncate((written as usize).saturating_sub(1));
        Some(String::from_utf16_lossy(&buf))
    }

    /// Raw DER bytes of the certificate.
    #[cfg(test)]
    fn encoded(&self) -> &[u8] {
        unsafe {
            let ctx = &*self.0;
            std::slice::from_raw_parts(ctx.pbCertEncoded, ctx.cbCertEncoded as usize)
        }
    }
}

impl Drop for CertContext {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                let _ = CertFreeCertificateContext(Some(self.0));
            }
        }
    }
}

/// Enumeration over a `SystemStore`. The context held between calls is
/// released when the iterator is dropped.
pub struct CertIter<'a> {
    store: &'a SystemStore,
    current: *const CERT_CONTEXT,
    done: bool,
}

impl Iterator for CertIter<'_> {
    type Item = NativeResult<CertContext>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let prev = if self.current.is_null() {
            None
        } else {
            Some(self.current)
        };
        // Frees `prev`
        let next = unsafe { CertEnumCertificatesInStore(self.store.handle, prev) };
        self.current = next as *const _;

        if self.current.is_null() {
            self.done = true;
            let err = last_error();
            return match err.code() {
                CRYPT_E_NOT_FOUND | ERROR_NO_MORE_FILES => None,
                _ => {
                    debug!(code = err.code(), store = %self.store.name, "certificate enumeration failed");
                    Some(Err(err))
                }
            };
        }

        Some(Ok(CertContext::duplicate_of(self.current)))
    }
}

impl Drop for CertIter<'_> {
    fn drop(&mut self) {
        if !self.current.is_null() {
            unsafe {
                let _ = CertFreeCertificateContext(Some(self.current));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::cert_list;

    #[test]
    fn test_open_and_list_current_user_store() {
        let store = SystemStore::open(StoreLocation::CurrentUser, "my")
            .expect("CurrentUser\\My should open");
        assert_eq!(store.name(), "my");
        assert_eq!(store.location(), StoreLocation::CurrentUser);

        let first = cert_list(&store).expect("list should succeed");
        let second = cert_list(&store).expect("second list should succeed");
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_contexts_outlive_iteration() {
        let store = SystemStore::open(StoreLocation::CurrentUser, "root")
            .expect("CurrentUser\\Root should open");
        let contexts: Vec<CertContext> = store.iter().filter_map(|c| c.ok()).collect();
        for ctx in &contexts {
            assert!(!ctx.encoded().is_empty());
        }
    }
}
