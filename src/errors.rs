//! Errors surfaced by discovery, the run coordinator and the scripted engine.
//!
//! None of these are fatal. Discovery collects them per class/item and keeps going; commands
//! return them to the caller and leave the status table untouched.

use std::path::PathBuf;

use miette::Diagnostic;
use systest_core::{MalformedIdentifierError, TestDescriptor};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SystestError {
    #[error("cannot resolve test class `{class_name}` (tried {})", .attempted.join(", "))]
    #[diagnostic(
        code(systest::class_resolution),
        help("the engine registry has no class under the plain or the namespace-qualified name")
    )]
    ClassResolution { class_name: String, attempted: Vec<String> },

    #[error("test {descriptor} not found")]
    #[diagnostic(code(systest::not_found), help("run `systest list` to see the discovered tests"))]
    NotFound { descriptor: TestDescriptor },

    #[error(transparent)]
    #[diagnostic(code(systest::malformed_identifier))]
    MalformedIdentifier(#[from] MalformedIdentifierError),

    #[error("run `{label}` is still in progress")]
    #[diagnostic(code(systest::run_in_progress), help("wait for the current run to finish"))]
    RunInProgress { label: String },

    #[error("discovery did not complete: {reason}")]
    #[diagnostic(code(systest::discovery_aborted))]
    DiscoveryAborted { reason: String },

    #[error("cannot load run plan {}: {reason}", .path.display())]
    #[diagnostic(code(systest::plan))]
    Plan { path: PathBuf, reason: String },
}

pub type SystestResult<T> = Result<T, SystestError>;
