// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for restcall
//!
//! Dispatch-time errors (`InvalidRequest`, `InvalidPayload`, `Staging`) are
//! returned synchronously by the service. Transport errors travel to the
//! completion handler inside the response result. Cleanup errors end up in
//! the worker pool's error sink.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for restcall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for restcall
#[derive(Error, Debug)]
pub enum Error {
    /// Host, port or endpoint is unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload could not be used for the chosen operation
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Temp file for a multipart upload could not be written
    #[error("Failed to stage upload at {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// DNS, connect, TLS, read or write failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Temp file for a multipart upload could not be deleted
    #[error("Failed to remove staged upload {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Error::InvalidRequest(msg.into())
    }

    /// Create an invalid payload error
    pub fn invalid_payload<S: Into<String>>(msg: S) -> Self {
        Error::InvalidPayload(msg.into())
    }

    /// Create a staging error
    pub fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Staging {
            path: path.into(),
            source,
        }
    }

    /// Create a cleanup error
    pub fn cleanup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Cleanup {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error came from the transport
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a temp file cleanup failure
    pub fn is_cleanup(&self) -> bool {
        matches!(self, Error::Cleanup { .. })
    }

    /// Check if this error is raised synchronously at dispatch
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest(_) | Error::InvalidPayload(_) | Error::Staging { .. }
        )
    }

    /// Path of the staged file involved, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Staging { path, .. } | Error::Cleanup { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
