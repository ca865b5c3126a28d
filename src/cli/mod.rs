//! CLI module for systest
//!
//! ## Commands
//!
//! - `list` - Discover tests and print the catalog
//! - `run` - Run every test, or one with `--only`, and stream status changes
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::FailureMessagePolicy;
use crate::errors::SystestError;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<SystestError> for CliError {
    fn from(error: SystestError) -> Self {
        // Render through miette so help text and codes reach the user.
        let report = miette::Report::new(error);
        Self::failure(format!("{:?}", report))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Discover engine test cases, run them and watch their status
#[derive(Parser, Debug)]
#[command(name = "systest")]
#[command(version = VERSION)]
#[command(about = "Discover engine test cases, run them and watch their status", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Run plan describing the test classes the engine knows about
    #[arg(long, global = true, value_name = "FILE", default_value = "systest.json")]
    pub plan: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover tests and print the catalog
    List,

    /// Run all tests, or a single one
    Run {
        /// Run only this test (`Class/method` or `[Class method]`)
        #[arg(long, value_name = "TEST")]
        only: Option<String>,
        /// Which reason to keep when a test fails more than once
        #[arg(long, value_enum, default_value_t = FailureMessagePolicy::First)]
        failure_message: FailureMessagePolicy,
        /// Print rows as they start running
        #[arg(short, long)]
        verbose: bool,
        /// Milliseconds the scripted engine waits between events
        #[arg(long, value_name = "MS", default_value_t = 0)]
        delay_ms: u64,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let color = !cli.no_color;
    match cli.command {
        Command::List => commands::list_tests(&cli.plan, color),
        Command::Run {
            only,
            failure_message,
            verbose,
            delay_ms,
        } => commands::run_tests(
            &cli.plan,
            &commands::RunOptions {
                only,
                failure_message,
                verbose,
                color,
                delay_ms,
            },
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["systest", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List));
        assert_eq!(cli.plan, PathBuf::from("systest.json"));
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["systest", "run"]).unwrap();
        if let Command::Run {
            only,
            failure_message,
            verbose,
            delay_ms,
        } = cli.command
        {
            assert!(only.is_none());
            assert_eq!(failure_message, FailureMessagePolicy::First);
            assert!(!verbose);
            assert_eq!(delay_ms, 0);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_run_one() {
        let cli = Cli::try_parse_from([
            "systest",
            "run",
            "--plan",
            "plans/app.json",
            "--only",
            "BetaTests/testTwo",
            "--failure-message",
            "latest",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.plan, PathBuf::from("plans/app.json"));
        if let Command::Run {
            only,
            failure_message,
            verbose,
            ..
        } = cli.command
        {
            assert_eq!(only.as_deref(), Some("BetaTests/testTwo"));
            assert_eq!(failure_message, FailureMessagePolicy::Latest);
            assert!(verbose);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["systest", "run", "--failure-message", "middle"]).is_err());
    }

    #[test]
    fn test_systest_error_converts_to_failure() {
        let err = CliError::from(SystestError::RunInProgress {
            label: "RunAll-TestSuiteRunner".to_string(),
        });
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("run `RunAll-TestSuiteRunner` is still in progress"));
    }
}
