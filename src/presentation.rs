//! Presentation layer
//!
//! ## TablePresenter Trait
//!
//! The session drives a [`TablePresenter`] with the catalog once it is ready and with every
//! changed row afterwards. Presenters only read records; they never write to the table.
//!
//! [`ConsoleReporter`] is the terminal rendition: one section per class, a status glyph per row,
//! and the failure/duration labels when a run finishes.

use std::collections::HashMap;
use std::io::Write;

use systest_core::{RunSummary, TestGroup, TestRecord, TestStatus};

use crate::catalog::RowIndex;
use crate::errors::SystestError;

/// Trait for rendering the status table.
pub trait TablePresenter {
    /// Called once discovery has produced the catalog
    fn on_catalog_ready(&mut self, groups: &[TestGroup]);

    /// Called after a record changed
    fn on_row_changed(&mut self, index: RowIndex, record: &TestRecord);

    /// Called when the engine reports the run as finished
    fn on_run_finished(&mut self, summary: &RunSummary);

    /// Called when a command or discovery step failed
    fn on_error(&mut self, _error: &SystestError) {}
}

/// Status indicator shown at the end of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessory {
    /// Grey cross
    NotRun,
    /// Activity spinner
    Spinner,
    /// Red cross
    Failed,
    /// Green check
    Passed,
}

impl Accessory {
    pub fn for_status(status: TestStatus) -> Self {
        match status {
            TestStatus::NotRun => Self::NotRun,
            TestStatus::Running => Self::Spinner,
            TestStatus::Failed => Self::Failed,
            TestStatus::Passed => Self::Passed,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::NotRun | Self::Failed => "✗",
            Self::Spinner => "…",
            Self::Passed => "✓",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::NotRun => "\x1b[90m",
            Self::Spinner => "\x1b[33m",
            Self::Failed => "\x1b[31m",
            Self::Passed => "\x1b[32m",
        }
    }
}

/// Display data for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub title: String,
    /// Empty for a succeeded record, `Reason : {message}` otherwise.
    pub detail: String,
    pub accessory: Accessory,
}

impl RowView {
    pub fn from_record(record: &TestRecord) -> Self {
        let detail = if record.succeeded {
            String::new()
        } else {
            format!("Reason : {}", record.message)
        };
        Self {
            title: record.name().to_string(),
            detail,
            accessory: Accessory::for_status(record.status),
        }
    }

    pub fn render(&self, color: bool) -> String {
        let glyph = if color {
            format!("{}{}\x1b[0m", self.accessory.color(), self.accessory.glyph())
        } else {
            self.accessory.glyph().to_string()
        };
        if self.detail.is_empty() {
            format!("{} {}", glyph, self.title)
        } else {
            format!("{} {}  {}", glyph, self.title, self.detail)
        }
    }
}

/// Terminal presenter.
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    verbose: bool,
    /// Last line printed per row during the current run; a failure followed by its finish
    /// renders the same line twice.
    printed: HashMap<RowIndex, String>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: false,
            verbose: false,
            printed: HashMap::new(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Also print rows as they start running.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // The console is best effort; a closed pipe must not abort the run.
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write> TablePresenter for ConsoleReporter<W> {
    fn on_catalog_ready(&mut self, groups: &[TestGroup]) {
        if groups.is_empty() {
            self.line("No tests discovered");
            return;
        }
        for group in groups {
            let header = if self.color {
                format!("\x1b[1m{}\x1b[0m", group.name)
            } else {
                group.name.clone()
            };
            self.line(&header);
            for record in &group.records {
                let row = RowView::from_record(record).render(self.color);
                self.line(&format!("  {}", row));
            }
        }
    }

    fn on_row_changed(&mut self, index: RowIndex, record: &TestRecord) {
        if !self.verbose && !record.status.is_terminal() {
            return;
        }
        let mut view = RowView::from_record(record);
        view.title = format!("{}::{}", record.descriptor.class_name, view.title);
        let row = view.render(self.color);
        if self.printed.get(&index) == Some(&row) {
            return;
        }
        self.line(&row);
        self.printed.insert(index, row);
    }

    fn on_run_finished(&mut self, summary: &RunSummary) {
        self.printed.clear();
        self.line("");
        self.line(&summary.failure_label());
        self.line(&summary.duration_label());
    }

    fn on_error(&mut self, error: &SystestError) {
        let text = if self.color {
            format!("\x1b[31merror\x1b[0m: {}", error)
        } else {
            format!("error: {}", error)
        };
        self.line(&text);
    }
}
