// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Certificate store name is required")]
    MissingStoreName,

    #[error("Invalid certificate store name '{name}'. Valid names: {valid}")]
    InvalidStoreName { name: String, valid: String },

    #[error("Certificate file path is required")]
    MissingCertificatePath,

    #[error("Certificate file not found: {0}")]
    CertificateFileNotFound(PathBuf),

    #[error("Unsupported certificate file '{path}'. Expected one of: {expected}")]
    UnsupportedCertificateExtension { path: PathBuf, expected: String },

    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Command '{command}' not found.\n{hint}")]
    CommandNotFound { command: String, hint: String },

    #[error("Command failed: {command}\n{stderr}")]
    Command { command: String, stderr: String },

    #[error(transparent)]
    Win32(#[from] Win32Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The Windows certificate store is not available on this platform")]
    UnsupportedPlatform,
}

impl Error {
    /// True for errors raised by input validation, before any native call.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::MissingStoreName
                | Error::InvalidStoreName { .. }
                | Error::MissingCertificatePath
                | Error::CertificateFileNotFound(_)
                | Error::UnsupportedCertificateExtension { .. }
        )
    }

    /// The platform error, if this is one.
    pub fn as_win32(&self) -> Option<&Win32Error> {
        match self {
            Error::Win32(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Store operation that was in progress when a native call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Add,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Add => write!(f, "add"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Error code returned by a single call into the native certificate API.
///
/// Carries either a raw Win32 code (`1223`) or an HRESULT (`0x80092004`),
/// whichever the OS reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeError(pub i32);

impl NativeError {
    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native error {} (0x{:08X})", self.0, self.0 as u32)
    }
}

pub const ERROR_ACCESS_DENIED: i32 = 5;
pub const ERROR_NO_MORE_FILES: i32 = 18;
pub const ERROR_CANCELLED: i32 = 1223;
pub const CRYPT_E_FILE_ERROR: i32 = 0x8009_2003_u32 as i32;
pub const CRYPT_E_NOT_FOUND: i32 = 0x8009_2004_u32 as i32;
pub const CRYPT_E_ASN1_EOD: i32 = 0x8009_3102_u32 as i32;
pub const CRYPT_E_ASN1_BADTAG: i32 = 0x8009_310B_u32 as i32;

/// Known failure classes of the certificate store API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Win32ErrorKind {
    Cancelled,
    NotFound,
    FileError,
    Asn1BadTag,
    Asn1UnexpectedEnd,
    AccessDenied,
    Other,
}

impl Win32ErrorKind {
    /// Classify a raw Win32 code or HRESULT.
    ///
    /// HRESULTs wrapping a Win32 code (facility 7) are unwrapped first, so
    /// `-2147024891` and `5` both mean access denied.
    pub fn from_code(code: i32) -> Self {
        let bits = code as u32;
        let code = if bits & 0xFFFF_0000 == 0x8007_0000 {
            (bits & 0xFFFF) as i32
        } else {
            code
        };

        match code {
            ERROR_CANCELLED => Self::Cancelled,
            CRYPT_E_NOT_FOUND => Self::NotFound,
            CRYPT_E_FILE_ERROR => Self::FileError,
            CRYPT_E_ASN1_BADTAG => Self::Asn1BadTag,
            CRYPT_E_ASN1_EOD => Self::Asn1UnexpectedEnd,
            ERROR_ACCESS_DENIED => Self::AccessDenied,
            _ => Self::Other,
        }
    }
}

/// A failed native store call, classified by its error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.message())]
pub struct Win32Error {
    pub kind: Win32ErrorKind,
    pub code: i32,
    pub operation: Operation,
}

impl Win32Error {
    pub fn new(code: i32, operation: Operation) -> Self {
        Self {
            kind: Win32ErrorKind::from_code(code),
            code,
            operation,
        }
    }

    pub fn from_native(err: NativeError, operation: Operation) -> Self {
        Self::new(err.code(), operation)
    }

    pub fn message(&self) -> String {
        match self.kind {
            Win32ErrorKind::Cancelled => "The operation was canceled by the user.".to_string(),
            Win32ErrorKind::NotFound => "Cannot find object or property.".to_string(),
            Win32ErrorKind::FileError => {
                "An error occurred while reading or writing to a file.".to_string()
            }
            Win32ErrorKind::Asn1BadTag => {
                "ASN1 bad tag value met. -- Is the certificate in DER format?".to_string()
            }
            Win32ErrorKind::Asn1UnexpectedEnd => "ASN1 unexpected end of data.".to_string(),
            Win32ErrorKind::AccessDenied => {
                "System.UnauthorizedAccessException, Access denied..".to_string()
            }
            Win32ErrorKind::Other => format!(
                "Unable to {} certificate with error: {}.",
                self.operation, self.code
            ),
        }
    }
}
