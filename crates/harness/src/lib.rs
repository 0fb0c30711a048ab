//! Conformance-test harness for database client libraries
//!
//! The harness loads declarative JSON test files, gates them against the
//! connected server, drives the declared operations through the client
//! contract, and verifies outcomes, collection state, and command
//! monitoring events.
//!
//! Pipeline per case:
//!
//! ```text
//! load -> schema gate -> requirement gate -> fixture -> fail point
//!      -> per operation: run, bank events, verify outcome
//!      -> fail point disable -> verify banked events
//! ```
//!
//! Entry points: [`TestRunner`] for the CRUD suite, [`unified`] for the
//! validation-only pass over unified-format files, and [`SuiteConfig`]
//! for environment-driven suite discovery.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod fixture;
pub mod gate;
pub mod loader;
pub mod matcher;
pub mod operation;
pub mod runner;
pub mod unified;
pub mod verifier;

pub use config::{SuiteConfig, CRUD_TESTS_PATH, MANIFEST_FILE_NAME, UNIFIED_TESTS_PATH};
pub use gate::{schema_compatible, ServerInfo, SUPPORTED_SCHEMA_VERSION};
pub use loader::{load_test_file, TestCase, TestFile};
pub use operation::OperationRunner;
pub use runner::{
    CaseReport, CaseStatus, FileReport, SuiteReport, TestRunner, DEFAULT_COLLECTION,
    DEFAULT_DATABASE,
};
pub use unified::{validate_suite, UnifiedFileReport};
