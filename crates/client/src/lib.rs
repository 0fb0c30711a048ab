//! Client contract and reference implementation for the specdrive harness
//!
//! This crate defines the narrow surface the harness consumes from a
//! database client library:
//! - **Contract**: [`Client`] / [`Database`] / [`Collection`] traits with
//!   typed operation results and options
//! - **Monitoring**: [`CommandStartedEvent`] and the [`EventRecorder`] the
//!   verifier reads back
//! - **Reference client**: [`MemoryClient`], an in-memory document store
//!   implementing the contract, used by the harness's own test suites
//!
//! The harness implements none of the driver's semantics; swapping
//! [`MemoryClient`] for a real driver adapter changes no runner code.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod events;
pub mod memory;

pub use contract::{
    Client, Collection, CountOptions, Database, DeleteResult, FindOptions, InsertManyResult,
    InsertOneResult, UpdateOptions, UpdateResult,
};
pub use events::{CommandStartedEvent, EventRecorder};
pub use memory::MemoryClient;
