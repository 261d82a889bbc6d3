// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// System store names accepted by `validate_store`, lowercase.
pub const VALID_STORE_NAMES: &[&str] = &[
    "my",
    "ca",
    "root",
    "authroot",
    "trust",
    "disallowed",
    "trustedpeople",
    "trustedpublisher",
    "smartcardroot",
    "certificateenrollmentrequests",
];

/// Certificate file extensions accepted by `validate_certificate`, lowercase.
pub const VALID_CERT_EXTENSIONS: &[&str] = &["der", "cer", "crt", "pem"];

/// A store name that passed the allow-list check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreName(String);

impl StoreName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_store(name: Option<&str>) -> Result<StoreName> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(Error::MissingStoreName);
    }

    let lower = name.to_lowercase();
    if !VALID_STORE_NAMES.contains(&lower.as_str()) {
        return Err(Error::InvalidStoreName {
            name: name.to_string(),
            valid: VALID_STORE_NAMES.join(", "),
        });
    }

    Ok(StoreName(lower))
}

/// Check that `path` names an existing certificate file with a known extension.
/// Returns the canonicalized path.
pub fn validate_certificate(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Err(Error::MissingCertificatePath),
    };

    // Must be a regular file, not a directory
    if !path.is_file() {
        return Err(Error::CertificateFileNotFound(path.to_path_buf()));
    }

    if !has_cert_extension(path) {
        return Err(Error::UnsupportedCertificateExtension {
            path: path.to_path_buf(),
            expected: VALID_CERT_EXTENSIONS
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    path.canonicalize().map_err(|e| Error::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn has_cert_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VALID_CERT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// True when the file is already DER encoded and can be submitted as-is.
pub fn is_der(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("der"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_store_accepts_known_names() {
        for name in ["root", "ca", "my", "ROOT", "My", "TrustedPublisher"] {
            let store = validate_store(Some(name)).expect("store name should be valid");
            assert_eq!(store.as_str(), name.to_lowercase());
        }
    }

    #[test]
    fn test_validate_store_rejects_empty() {
        let err = validate_store(Some("")).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = validate_store(Some("   ")).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_validate_store_rejects_absent() {
        let err = validate_store(None).unwrap_err();
        assert!(matches!(err, Error::MissingStoreName));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_validate_store_rejects_unknown() {
        for name in ["Chef", "personal", "root2", "my store"] {
            let err = validate_store(Some(name)).unwrap_err();
            assert!(err.is_invalid_argument(), "{} should be rejected", name);
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn test_validate_certificate_rejects_empty_and_absent() {
        assert!(matches!(
            validate_certificate(None).unwrap_err(),
            Error::MissingCertificatePath
        ));
        assert!(matches!(
            validate_certificate(Some(Path::new(""))).unwrap_err(),
            Error::MissingCertificatePath
        ));
    }

    #[test]
    fn test_validate_certificate_rejects_missing_file() {
        let err = validate_certificate(Some(Path::new("Chef"))).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = validate_certificate(Some(Path::new("/nonexistent/test.der"))).unwrap_err();
        assert!(matches!(err, Error::CertificateFileNotFound(_)));
    }

    #[test]
    fn test_validate_certificate_rejects_directory() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        let sub = dir.path().join("certs.der");
        std::fs::create_dir(&sub).expect("subdirectory should be created");

        let err = validate_certificate(Some(&sub)).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_validate_certificate_rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        for name in ["cert.txt", "cert", "cert.p12"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"data").expect("write should succeed");
            let err = validate_certificate(Some(&path)).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedCertificateExtension { .. }),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_validate_certificate_accepts_known_extensions() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        for name in ["test.der", "test.cer", "test.crt", "test.pem", "TEST.DER"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"data").expect("write should succeed");
            let canonical = validate_certificate(Some(&path)).expect("certificate should be valid");
            assert!(canonical.is_absolute());
        }
    }

    #[test]
    fn test_is_der() {
        assert!(is_der(Path::new("a.der")));
        assert!(is_der(Path::new("a.DER")));
        assert!(!is_der(Path::new("a.pem")));
        assert!(!is_der(Path::new("der")));
    }
}
