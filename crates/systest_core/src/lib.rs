//! Shared test vocabulary for systest: descriptors, per-test status records, groups and run
//! counters, plus the engine identifier grammar.
//!
//! ## Notes
//!
//! - This is a "core" crate: **no IO**, no async runtime, no global state. The discovery service
//!   and the run coordinator in the `systest` crate own every mutation of these types.
//! - Group ordering is byte order on the class name, i.e. ascending and case-sensitive.

use std::fmt;

pub mod identifier;

pub use identifier::{MalformedIdentifierError, MalformedReason};

/// Identify one runnable test method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestDescriptor {
    pub class_name: String,
    pub method_name: String,
}

impl TestDescriptor {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Parse an engine identifier. See [`identifier::parse`].
    pub fn parse(identifier: &str) -> Result<Self, MalformedIdentifierError> {
        identifier::parse(identifier)
    }
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&identifier::encode(self))
    }
}

/// Lifecycle status of a single test.
///
/// During a run a record only moves forward: `NotRun -> Running -> (Failed | Passed)`. Starting
/// the test again moves a terminal record back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    NotRun,
    Running,
    Failed,
    Passed,
}

impl TestStatus {
    /// Returns `true` once the test reached an outcome.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Passed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotRun => "not run",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Passed => "passed",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state for one discovered test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub descriptor: TestDescriptor,
    pub status: TestStatus,
    /// Outcome flag of the most recent finished run. Left untouched when a new run starts.
    pub succeeded: bool,
    /// Failure reason, or a human note such as the "executing" placeholder.
    pub message: String,
    /// Seconds reported by the engine for the most recent finish.
    pub duration: f64,
}

impl TestRecord {
    pub fn new(descriptor: TestDescriptor, message: impl Into<String>) -> Self {
        Self {
            descriptor,
            status: TestStatus::NotRun,
            succeeded: false,
            message: message.into(),
            duration: 0.0,
        }
    }

    /// Method name, which is what a row displays.
    pub fn name(&self) -> &str {
        &self.descriptor.method_name
    }
}

/// All records discovered for one test class, in engine order.
#[derive(Debug, Clone, PartialEq)]
pub struct TestGroup {
    pub name: String,
    pub records: Vec<TestRecord>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the record for `method_name`, if the group has one.
    pub fn position(&self, method_name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.descriptor.method_name == method_name)
    }
}

/// Aggregate counters shown under the table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunSummary {
    pub total_tests: usize,
    pub total_failures: usize,
    /// Accumulated seconds across every finished test.
    pub total_duration: f64,
}

impl RunSummary {
    pub fn new(total_tests: usize) -> Self {
        Self {
            total_tests,
            ..Self::default()
        }
    }

    /// Total duration rounded to milliseconds.
    pub fn rounded_duration(&self) -> f64 {
        (self.total_duration * 1000.0).round() / 1000.0
    }

    pub fn failure_label(&self) -> String {
        format!("Failed : {} of {} tests", self.total_failures, self.total_tests)
    }

    pub fn duration_label(&self) -> String {
        // `{:?}` keeps a trailing `.0` on whole seconds.
        format!("Duration : {:?}s", self.rounded_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // Descriptor
    // ========================================

    #[test]
    fn test_descriptor_display_is_canonical_identifier() {
        let descriptor = TestDescriptor::new("AlphaTests", "testOne");
        assert_eq!(descriptor.to_string(), "[AlphaTests testOne]");
    }

    #[test]
    fn test_descriptor_orders_by_class_then_method() {
        let mut descriptors = vec![
            TestDescriptor::new("beta", "a"),
            TestDescriptor::new("Beta", "b"),
            TestDescriptor::new("Beta", "a"),
        ];
        descriptors.sort();
        assert_eq!(
            descriptors,
            vec![
                TestDescriptor::new("Beta", "a"),
                TestDescriptor::new("Beta", "b"),
                TestDescriptor::new("beta", "a"),
            ]
        );
    }

    // ========================================
    // Status and records
    // ========================================

    #[test]
    fn test_status_terminal() {
        assert!(!TestStatus::NotRun.is_terminal());
        assert!(!TestStatus::Running.is_terminal());
        assert!(TestStatus::Failed.is_terminal());
        assert!(TestStatus::Passed.is_terminal());
    }

    #[test]
    fn test_new_record_is_not_run() {
        let record = TestRecord::new(TestDescriptor::new("AlphaTests", "testOne"), "Not yet executed");
        assert_eq!(record.status, TestStatus::NotRun);
        assert!(!record.succeeded);
        assert_eq!(record.message, "Not yet executed");
        assert_eq!(record.name(), "testOne");
    }

    #[test]
    fn test_group_position() {
        let mut group = TestGroup::new("BetaTests");
        group.records.push(TestRecord::new(TestDescriptor::new("BetaTests", "testTwo"), ""));
        group.records.push(TestRecord::new(TestDescriptor::new("BetaTests", "testThree"), ""));
        assert_eq!(group.position("testThree"), Some(1));
        assert_eq!(group.position("testFour"), None);
        assert_eq!(group.len(), 2);
    }

    // ========================================
    // Summary labels
    // ========================================

    #[test]
    fn test_summary_labels() {
        let summary = RunSummary {
            total_tests: 4,
            total_failures: 1,
            total_duration: 0.4217,
        };
        assert_eq!(summary.failure_label(), "Failed : 1 of 4 tests");
        assert_eq!(summary.duration_label(), "Duration : 0.422s");
    }

    #[test]
    fn test_summary_duration_label_whole_seconds() {
        let summary = RunSummary {
            total_duration: 2.0,
            ..RunSummary::new(3)
        };
        assert_eq!(summary.duration_label(), "Duration : 2.0s");
    }
}
