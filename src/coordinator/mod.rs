//! Run coordinator
//!
//! Owns the [`StatusTable`] and the single subscription to the engine's lifecycle events.
//! Commands (`run_all`, `run_one`) build a [`RunRequest`], hand it to the engine and return
//! straight away; outcomes arrive later as [`EngineEvent`]s that the owning task folds into the
//! table with [`RunCoordinator::apply`] (or the `drain_pending` / `next_event` helpers).
//!
//! ## Single writer
//!
//! The engine may report from any thread, but it only ever *sends*. All table mutations happen
//! here, on whichever task owns the coordinator, so the table needs no locking. Every mutation
//! emits a [`TableChange`] to the presentation layer.
//!
//! ## Record state machine
//!
//! ```text
//! NotRun --willStart--> Running --didFail--> Failed --didFinish--> Failed
//! Running --didFinish(ok)--> Passed
//! Running --didFinish(!ok)--> Failed
//! ```
//!
//! A new run re-enters at `Running`; the `succeeded` flag keeps the previous outcome until the
//! next finish overwrites it.

use std::sync::Arc;

use systest_core::{RunSummary, TestDescriptor, TestGroup, TestRecord, TestStatus};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub mod table;

pub use table::StatusTable;

use crate::catalog::{RowIndex, TestCatalog};
use crate::config::{FailureMessagePolicy, RunnerConfig};
use crate::discovery::resolve_class;
use crate::engine::{EngineEvent, EventStream, RunRequest, TestEngine, TestItemId};
use crate::errors::{SystestError, SystestResult};

/// Message kept on a record that failed without the engine giving a reason.
const UNREPORTED_FAILURE: &str = "failed without a reported reason";

/// Change notification for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TableChange {
    RowChanged(RowIndex),
    RunFinished { label: String },
}

/// Receipt for a submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub label: String,
    pub items: usize,
}

pub struct RunCoordinator<E: TestEngine + ?Sized> {
    engine: Arc<E>,
    config: RunnerConfig,
    table: StatusTable,
    events: EventStream,
    watchers: Vec<UnboundedSender<TableChange>>,
    /// Label of the request the engine is still working on.
    active_run: Option<String>,
}

impl<E: TestEngine + ?Sized> RunCoordinator<E> {
    /// Build the coordinator around a discovered catalog and subscribe to the engine.
    pub fn new(engine: Arc<E>, catalog: TestCatalog, config: RunnerConfig) -> Self {
        let events = engine.subscribe();
        Self {
            engine,
            config,
            table: StatusTable::new(catalog),
            events,
            watchers: Vec::new(),
            active_run: None,
        }
    }

    pub fn groups(&self) -> &[TestGroup] {
        self.table.groups()
    }

    pub fn summary(&self) -> RunSummary {
        *self.table.summary()
    }

    pub fn record(&self, index: RowIndex) -> Option<&TestRecord> {
        self.table.record(index)
    }

    pub fn table(&self) -> &StatusTable {
        &self.table
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// `true` while a submitted request has not reported `RunFinished`.
    pub fn is_busy(&self) -> bool {
        self.active_run.is_some()
    }

    /// Open a change-notification channel.
    pub fn subscribe(&mut self) -> UnboundedReceiver<TableChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.push(tx);
        rx
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Submit every catalog class's full suite as one composite request.
    ///
    /// Classes that no longer resolve are logged and left out of the request.
    pub fn run_all(&mut self) -> SystestResult<RunTicket> {
        self.ensure_idle()?;

        let mut request = RunRequest::new(self.config.run_all_label.as_str());
        for group in self.table.groups() {
            match resolve_class(&*self.engine, &group.name) {
                Ok(handle) => {
                    let items = self.engine.expand_to_test_items(&handle);
                    request.push_suite(handle, items);
                }
                Err(e) => warn!(error = %e, "leaving class out of the run"),
            }
        }

        Ok(self.submit(request))
    }

    /// Submit a single test.
    ///
    /// The owning class's suite is expanded again and searched by method name. On error nothing
    /// is submitted and the table is unchanged.
    pub fn run_one(&mut self, descriptor: &TestDescriptor) -> SystestResult<RunTicket> {
        self.ensure_idle()?;

        let not_found = || SystestError::NotFound {
            descriptor: descriptor.clone(),
        };
        self.table.group_index(&descriptor.class_name).ok_or_else(not_found)?;

        let handle = resolve_class(&*self.engine, &descriptor.class_name)?;
        let item = self
            .engine
            .expand_to_test_items(&handle)
            .into_iter()
            .find(|item| {
                TestDescriptor::parse(item.as_str()).is_ok_and(|parsed| parsed.method_name == descriptor.method_name)
            })
            .ok_or_else(not_found)?;

        let mut request = RunRequest::new(self.config.run_one_label.as_str());
        request.push_suite(handle, vec![item]);
        Ok(self.submit(request))
    }

    fn ensure_idle(&self) -> SystestResult<()> {
        match &self.active_run {
            Some(label) => Err(SystestError::RunInProgress { label: label.clone() }),
            None => Ok(()),
        }
    }

    fn submit(&mut self, request: RunRequest) -> RunTicket {
        let ticket = RunTicket {
            label: request.label.clone(),
            items: request.item_count(),
        };
        info!(label = %ticket.label, items = ticket.items, "submitting run request");
        self.active_run = Some(ticket.label.clone());
        self.engine.submit(request);
        ticket
    }

    // ------------------------------------------------------------------------
    // Event folding
    // ------------------------------------------------------------------------

    /// Fold one engine event into the table.
    pub fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::WillStart { item } => {
                if let Some(descriptor) = parse_item(&item) {
                    self.on_test_will_start(&descriptor);
                }
            }
            EngineEvent::DidFail { item, reason } => {
                if let Some(descriptor) = parse_item(&item) {
                    self.on_test_did_fail(&descriptor, &reason);
                }
            }
            EngineEvent::DidFinish {
                item,
                succeeded,
                duration,
            } => {
                if let Some(descriptor) = parse_item(&item) {
                    self.on_test_did_finish(&descriptor, succeeded, duration);
                }
            }
            EngineEvent::RunFinished { label } => self.on_run_finished(&label),
        }
    }

    /// Fold every event already queued. Returns how many were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and fold it. Returns `false` once the engine closed the stream.
    pub async fn next_event(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => {
                if let Some(label) = self.active_run.take() {
                    warn!(label = %label, "engine closed its event stream before the run finished");
                }
                false
            }
        }
    }

    /// Fold events until the outstanding request finishes.
    pub async fn run_until_idle(&mut self) {
        while self.is_busy() {
            if !self.next_event().await {
                break;
            }
        }
    }

    pub fn on_test_will_start(&mut self, descriptor: &TestDescriptor) -> Option<RowIndex> {
        let index = self.locate(descriptor)?;
        let placeholder = self.config.executing_placeholder.clone();
        let record = self.table.record_mut(index)?;
        record.status = TestStatus::Running;
        record.message = placeholder;
        debug!(test = %descriptor, "test started");
        self.notify(TableChange::RowChanged(index));
        Some(index)
    }

    pub fn on_test_did_fail(&mut self, descriptor: &TestDescriptor, reason: &str) -> Option<RowIndex> {
        let index = self.locate(descriptor)?;
        let policy = self.config.failure_message_policy;
        let record = self.table.record_mut(index)?;
        let first_failure = record.status != TestStatus::Failed;
        if first_failure || policy == FailureMessagePolicy::Latest {
            record.message = reason.to_string();
        }
        record.status = TestStatus::Failed;
        record.succeeded = false;

        self.table.summary_mut().total_failures += 1;
        debug!(test = %descriptor, reason, "test failed");
        self.notify(TableChange::RowChanged(index));
        Some(index)
    }

    pub fn on_test_did_finish(
        &mut self,
        descriptor: &TestDescriptor,
        succeeded: bool,
        duration: f64,
    ) -> Option<RowIndex> {
        let index = self.locate(descriptor)?;
        let placeholder = self.config.executing_placeholder.clone();
        let record = self.table.record_mut(index)?;
        if record.status == TestStatus::Failed {
            record.succeeded = false;
        } else if succeeded {
            record.status = TestStatus::Passed;
            record.succeeded = true;
            record.message.clear();
        } else {
            record.status = TestStatus::Failed;
            record.succeeded = false;
            if record.message == placeholder {
                record.message = UNREPORTED_FAILURE.to_string();
            }
        }
        record.duration = duration;
        let status = record.status;

        let summary = self.table.summary_mut();
        summary.total_duration += duration;
        summary.total_tests += 1;
        debug!(test = %descriptor, %status, duration, "test finished");
        self.notify(TableChange::RowChanged(index));
        Some(index)
    }

    pub fn on_run_finished(&mut self, label: &str) {
        // Only the outstanding request may unblock commands.
        match self.active_run.take() {
            Some(active) if active != label => {
                warn!(expected = %active, finished = label, "finished run does not match the submitted one");
                self.active_run = Some(active);
            }
            _ => {}
        }
        let summary = self.table.summary();
        info!(
            label,
            tests = summary.total_tests,
            failures = summary.total_failures,
            duration = summary.rounded_duration(),
            "run finished"
        );
        self.notify(TableChange::RunFinished {
            label: label.to_string(),
        });
    }

    fn locate(&self, descriptor: &TestDescriptor) -> Option<RowIndex> {
        let index = self.table.locate(descriptor);
        if index.is_none() {
            warn!(test = %descriptor, "event for a test that is not in the table; ignoring");
        }
        index
    }

    fn notify(&mut self, change: TableChange) {
        self.watchers.retain(|watcher| watcher.send(change.clone()).is_ok());
    }
}

fn parse_item(item: &TestItemId) -> Option<TestDescriptor> {
    match TestDescriptor::parse(item.as_str()) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            warn!(error = %e, "ignoring event with a malformed identifier");
            None
        }
    }
}
