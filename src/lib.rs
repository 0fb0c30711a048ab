//! specdrive - Conformance-test harness for database client libraries
//!
//! specdrive executes declarative JSON test suites against any client that
//! implements its narrow driver contract, verifying operation results,
//! collection state, and command monitoring events.
//!
//! # Quick Start
//!
//! ```ignore
//! use specdrive::{MemoryClient, SuiteConfig, TestRunner, CRUD_TESTS_PATH};
//!
//! // Run the CRUD suite named by the environment against the in-memory
//! // reference client
//! let client = MemoryClient::new();
//! let config = SuiteConfig::from_env(CRUD_TESTS_PATH)?;
//! let report = TestRunner::new(&client).run_suite(&config)?;
//! assert!(report.all_passed());
//! ```
//!
//! # Architecture
//!
//! The harness drives everything through the [`Client`] / [`Database`] /
//! [`Collection`] traits; swapping the reference [`MemoryClient`] for a
//! real driver adapter changes no runner code. Test-file parsing, gating,
//! operation dispatch, and verification live in `specdrive-harness`;
//! shared document and version types live in `specdrive-core`.

pub use specdrive_client::{
    Client, Collection, CommandStartedEvent, CountOptions, Database, DeleteResult, EventRecorder,
    FindOptions, InsertManyResult, InsertOneResult, MemoryClient, UpdateOptions, UpdateResult,
};
pub use specdrive_core::{
    ClientError, Document, DocumentError, Error, Result, Topology, Version,
};
pub use specdrive_harness::{
    load_test_file, schema_compatible, validate_suite, CaseReport, CaseStatus, FileReport,
    OperationRunner, ServerInfo, SuiteConfig, SuiteReport, TestCase, TestFile, TestRunner,
    UnifiedFileReport, CRUD_TESTS_PATH, DEFAULT_COLLECTION, DEFAULT_DATABASE, MANIFEST_FILE_NAME,
    SUPPORTED_SCHEMA_VERSION, UNIFIED_TESTS_PATH,
};
