//! Crate-wide error type.
//!
//! Validation errors (`InvalidSource` through `InvalidLocation`, plus
//! `InvalidConfig`) are raised before any request leaves the process. The
//! remaining variants come from the transport and codec stages and are always
//! returned as a failed result; no stage writes a partial file on failure.

use crate::config::ConfigError;
use crate::transport::TransportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Image source must be a URL: {0:?}")]
    InvalidSource(String),
    #[error("File name must be set and must not contain path separators")]
    InvalidFileName,
    #[error("Unsupported image format {0:?}. Only gif, jpg and png are supported")]
    UnsupportedFormat(String),
    #[error("Non numeric arguments supplied to {operation}: {value:?}")]
    NonNumericArgument {
        operation: &'static str,
        value: String,
    },
    #[error("Unsupported location supplied to label function: {0:?}")]
    InvalidLocation(String),
    #[error("Unrecognized image format: {0}")]
    UnrecognizedFormat(String),
    #[error("Decode failed: {0}")]
    DecodeFailure(String),
    #[error("Encode failed: {0}")]
    EncodeFailure(String),
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Request failed: {0}")]
    TransportFailure(#[from] TransportError),
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for every fallible public operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;
