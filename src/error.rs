//! Error types for linkagg.

use std::io;

use thiserror::Error;

/// Result type alias for linkagg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for linkagg.
#[derive(Error, Debug)]
pub enum Error {
    // Bundle errors
    #[error("there are currently no up egress links in the bundle")]
    NoAvailableLinks,

    #[error("bundle already has all {max} supported links up")]
    BundleFull { max: u16 },

    // Descriptor errors
    #[error("invalid flow descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),

    #[error("unsupported IP protocol number: {0}")]
    UnsupportedProtocol(u8),

    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Protocol/field mismatches in a flow record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("{protocol} flow is missing its {field} port")]
    MissingPort {
        protocol: &'static str,
        field: &'static str,
    },

    #[error("{protocol} flow has {field} port 0 (valid range is 1-65535)")]
    ZeroPort {
        protocol: &'static str,
        field: &'static str,
    },

    #[error("{protocol} flow cannot carry a {field} port")]
    UnexpectedPort {
        protocol: &'static str,
        field: &'static str,
    },
}

impl Error {
    /// Check if the error is an operational bundle condition rather than a
    /// precondition defect. Callers decide how to react (e.g. drop traffic).
    pub fn is_operational(&self) -> bool {
        matches!(self, Error::NoAvailableLinks | Error::BundleFull { .. })
    }
}
