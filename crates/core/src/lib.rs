//! Core types for the specdrive conformance harness
//!
//! This crate defines the foundational types used throughout the system:
//! - Document: loosely-typed JSON object with typed field accessors
//! - Version: `major.minor.patch` triple for schema and server gating
//! - Topology: deployment-shape classification with requirement matching
//! - Error / ClientError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod topology;
pub mod version;

// Re-export commonly used types
pub use document::{as_f64, value_type_name, Document, DocumentError};
pub use error::{ClientError, Error, Result};
pub use topology::{Topology, TopologyParseError};
pub use version::{Version, VersionParseError};
