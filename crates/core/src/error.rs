//! Error types for the conformance harness
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! The taxonomy follows the harness's propagation policy:
//!
//! - Fatal/startup errors ([`Error::Setup`], [`Error::Io`], [`Error::Parse`])
//!   abort the run.
//! - Case-level assertion failures ([`Error::Assertion`],
//!   [`Error::UnknownOperation`]) fail one test case.
//! - Client-raised errors ([`ClientError`]) are captured, not propagated,
//!   when the case expects an error.
//!
//! Skips (schema incompatibility, unmet requirements) are *not* errors and
//! never appear here.

use crate::document::DocumentError;
use crate::topology::TopologyParseError;
use crate::version::VersionParseError;
use std::io;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised by the underlying client library
///
/// The harness never inspects error *content* when verifying an expected
/// error, only its presence; the classification exists so that argument
/// mishandling inside the harness cannot masquerade as a legitimately
/// captured operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A server-side or operation-execution error
    #[error("operation error{}: {message}", code.map(|c| format!(" (code {c})")).unwrap_or_default())]
    Operation {
        /// Server error code, if the server supplied one
        code: Option<i64>,
        /// Human-readable error message
        message: String,
    },

    /// Malformed arguments rejected before reaching the server
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Convenience constructor for an operation error without a code
    pub fn operation(message: impl Into<String>) -> Self {
        ClientError::Operation {
            code: None,
            message: message.into(),
        }
    }

    /// Convenience constructor for a coded operation error
    pub fn operation_with_code(code: i64, message: impl Into<String>) -> Self {
        ClientError::Operation {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Error types for the conformance harness
#[derive(Debug, Error)]
pub enum Error {
    /// Startup/configuration failure (unset variable, missing manifest)
    #[error("setup error: {0}")]
    Setup(String),

    /// I/O error reading a test file or manifest
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A test file failed to parse as JSON
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Field access on a loosely-typed document failed
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// A version string in a test file failed to parse
    #[error("version error: {0}")]
    Version(#[from] VersionParseError),

    /// A topology string in a test file failed to parse
    #[error("topology error: {0}")]
    Topology(#[from] TopologyParseError),

    /// A declared operation name has no registered handler
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// An outcome or event expectation was not met
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// An error raised by the underlying client library
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}
