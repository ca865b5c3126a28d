#![forbid(unsafe_code)]
//! systest: discover engine test cases, run them, and watch their status live.
//!
//! The crate is the bookkeeping layer between an external test engine and a presenter:
//! discovery (class enumeration + identifier parsing into a sorted catalog), and a run
//! coordinator that submits requests and folds the engine's lifecycle events into a status
//! table. The engine itself is reached only through the traits in [`engine`].
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`. Lookups by class or method name return `Option`/`Result`, never index blindly.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod presentation;
pub mod session;

pub use systest_core::{RunSummary, TestDescriptor, TestGroup, TestRecord, TestStatus};

pub use catalog::{RowIndex, TestCatalog};
pub use config::{FailureMessagePolicy, RunnerConfig};
pub use coordinator::{RunCoordinator, RunTicket, TableChange};
pub use discovery::{DiscoveryReport, discover, spawn_discovery};
pub use engine::{ScriptedEngine, TestDiscoveryProvider, TestEngine};
pub use errors::{SystestError, SystestResult};
