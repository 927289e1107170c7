//! Error types for static resource resolution
//!
//! A resolution miss is not an error: it is reported as `Ok(None)` from
//! `resolve` and `Ok(false)` from `consume`.

use std::io;

use crate::resource::ResourceKind;

/// Errors raised by the static resource layer
#[derive(Debug, thiserror::Error)]
pub enum StaticFilesError {
    /// A required configuration input was missing or blank
    #[error("invalid argument: '{name}' must not be empty")]
    InvalidArgument { name: &'static str },

    /// The configured root is not an existing directory
    #[error("{kind} static resource location must be a folder: '{folder}'")]
    Configuration { kind: ResourceKind, folder: String },

    /// Unexpected I/O failure while checking whether a resource is readable
    #[error("I/O failure while resolving '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// I/O failure while opening or copying a resolved resource
    #[error("failed to stream '{path}': {source}")]
    Streaming {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StaticFilesError {
    /// Whether the failure happened after a resource was resolved and the
    /// response body may already be partially written.
    pub const fn is_streaming_failure(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }
}

pub type Result<T> = std::result::Result<T, StaticFilesError>;
