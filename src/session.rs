//! Session glue: discovery, then commands, then forwarding table changes to a presenter.
//!
//! Everything here runs on the task that owns the coordinator. Discovery is pushed to the
//! blocking pool and its report comes back through the join handle; engine events are folded
//! one at a time and each resulting [`TableChange`] is forwarded before the next event.

use std::sync::Arc;

use systest_core::{RunSummary, TestDescriptor};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::RunnerConfig;
use crate::coordinator::{RunCoordinator, TableChange};
use crate::discovery::spawn_discovery;
use crate::engine::TestEngine;
use crate::errors::{SystestError, SystestResult};
use crate::presentation::TablePresenter;

/// What a run command targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSelection {
    All,
    One(TestDescriptor),
}

/// A coordinator seeded from discovery, plus whatever discovery had to leave out.
pub struct Session<E: TestEngine + ?Sized> {
    pub coordinator: RunCoordinator<E>,
    pub discovery_errors: Vec<SystestError>,
}

/// Discover in the background and build the coordinator once the catalog is ready.
pub async fn open_session<E>(engine: Arc<E>, config: RunnerConfig) -> SystestResult<Session<E>>
where
    E: TestEngine + ?Sized + 'static,
{
    let report = spawn_discovery(Arc::clone(&engine), config.clone())
        .await
        .map_err(|e| SystestError::DiscoveryAborted { reason: e.to_string() })?;

    Ok(Session {
        coordinator: RunCoordinator::new(engine, report.catalog, config),
        discovery_errors: report.errors,
    })
}

/// Issue `selection` and forward table changes to `presenter` until the run finishes.
///
/// Command errors are shown through the presenter and returned; the table is left as it was.
pub async fn drive<E, P>(
    coordinator: &mut RunCoordinator<E>,
    presenter: &mut P,
    selection: &RunSelection,
) -> SystestResult<RunSummary>
where
    E: TestEngine + ?Sized,
    P: TablePresenter + ?Sized,
{
    let mut changes = coordinator.subscribe();
    let submitted = match selection {
        RunSelection::All => coordinator.run_all(),
        RunSelection::One(descriptor) => coordinator.run_one(descriptor),
    };
    if let Err(e) = submitted {
        presenter.on_error(&e);
        return Err(e);
    }

    while coordinator.is_busy() {
        let open = coordinator.next_event().await;
        forward(coordinator, presenter, &mut changes);
        if !open {
            break;
        }
    }
    forward(coordinator, presenter, &mut changes);

    Ok(coordinator.summary())
}

fn forward<E, P>(coordinator: &RunCoordinator<E>, presenter: &mut P, changes: &mut UnboundedReceiver<TableChange>)
where
    E: TestEngine + ?Sized,
    P: TablePresenter + ?Sized,
{
    while let Ok(change) = changes.try_recv() {
        match change {
            TableChange::RowChanged(index) => {
                if let Some(record) = coordinator.record(index) {
                    presenter.on_row_changed(index, record);
                }
            }
            TableChange::RunFinished { .. } => presenter.on_run_finished(&coordinator.summary()),
        }
    }
}
