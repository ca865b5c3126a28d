//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use systest_core::TestDescriptor;
use tracing::debug;

use crate::config::{FailureMessagePolicy, RunnerConfig};
use crate::engine::{RunPlan, ScriptedEngine};
use crate::errors::SystestError;
use crate::presentation::{ConsoleReporter, TablePresenter};
use crate::session::{RunSelection, drive, open_session};

use super::{CliError, CliResult, ExitCode};

/// Options for the `run` command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub only: Option<String>,
    pub failure_message: FailureMessagePolicy,
    pub verbose: bool,
    pub color: bool,
    pub delay_ms: u64,
}

/// Parse a `--only` selector: `Class/method` or the engine form `[Class method]`.
pub fn parse_selector(selector: &str) -> CliResult<TestDescriptor> {
    let selector = selector.trim();
    if selector.starts_with('[') || selector.starts_with('-') || selector.starts_with('+') {
        return TestDescriptor::parse(selector).map_err(|e| CliError::failure(e.to_string()));
    }
    match selector.split_once('/') {
        Some((class, method)) if !class.is_empty() && !method.is_empty() && !method.contains('/') => {
            Ok(TestDescriptor::new(class, method))
        }
        _ => Err(CliError::failure(format!(
            "invalid test selector '{}'\nUse Class/method or [Class method]",
            selector
        ))),
    }
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Failed to start runtime: {}", e)))
}

/// Discover tests and print the catalog.
pub fn list_tests(plan_path: &Path, color: bool) -> CliResult<ExitCode> {
    let plan = RunPlan::load(plan_path)?;
    let engine = Arc::new(ScriptedEngine::new(plan));
    let session = runtime()?.block_on(open_session(engine, RunnerConfig::new()))?;

    let mut reporter = ConsoleReporter::new(io::stdout()).with_color(color);
    reporter.on_catalog_ready(session.coordinator.groups());
    for error in &session.discovery_errors {
        reporter.on_error(error);
    }

    Ok(ExitCode::SUCCESS)
}

/// Run every test, or the one named by `--only`, and report live.
pub fn run_tests(plan_path: &Path, options: &RunOptions) -> CliResult<ExitCode> {
    let selection = match &options.only {
        Some(selector) => RunSelection::One(parse_selector(selector)?),
        None => RunSelection::All,
    };
    debug!(?selection, plan = %plan_path.display(), "running tests");

    let plan = RunPlan::load(plan_path)?;
    let engine = Arc::new(ScriptedEngine::new(plan).with_step_delay(Duration::from_millis(options.delay_ms)));
    let config = RunnerConfig::new().with_failure_message_policy(options.failure_message);

    let mut reporter = ConsoleReporter::new(io::stdout())
        .with_color(options.color)
        .with_verbose(options.verbose);

    let failed = runtime()?.block_on(async {
        let mut session = open_session(engine, config).await?;
        for error in &session.discovery_errors {
            reporter.on_error(error);
        }
        drive(&mut session.coordinator, &mut reporter, &selection).await?;
        Ok::<_, SystestError>(session.coordinator.table().failed_count())
    })?;

    if failed > 0 {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
