//! Test engine boundary
//!
//! The engine owns class enumeration, test execution and timing. systest only sees it through
//! two traits:
//! - [`TestDiscoveryProvider`] enumerates classes and expands them into test items
//! - [`TestEngine`] accepts run requests and publishes lifecycle events
//!
//! Events travel over a tokio unbounded channel. The engine may send from any thread; the
//! receiving end lives with the run coordinator, which is the only writer of the status table.
//!
//! [`ScriptedEngine`] is the in-process binding used by the CLI and the integration tests.

use std::fmt;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub mod scripted;

pub use scripted::{PlannedClass, PlannedTest, RunPlan, ScriptedEngine};

/// A class the engine resolved by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassHandle {
    name: String,
}

impl ClassHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Runtime name the class was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Opaque engine identifier of one test item, e.g. `-[AlphaTests testOne]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestItemId(String);

impl TestItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TestItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TestItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The items of one class selected for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteRequest {
    pub class: ClassHandle,
    pub items: Vec<TestItemId>,
}

/// A composite run request handed to [`TestEngine::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub label: String,
    pub suites: Vec<SuiteRequest>,
}

impl RunRequest {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            suites: Vec::new(),
        }
    }

    pub fn push_suite(&mut self, class: ClassHandle, items: Vec<TestItemId>) {
        self.suites.push(SuiteRequest { class, items });
    }

    pub fn items(&self) -> impl Iterator<Item = &TestItemId> {
        self.suites.iter().flat_map(|s| s.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.suites.iter().map(|s| s.items.len()).sum()
    }
}

/// Lifecycle notification published by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    WillStart { item: TestItemId },
    /// One assertion failure. May arrive several times per test.
    DidFail { item: TestItemId, reason: String },
    /// Always the last event for an item, after any failures.
    DidFinish {
        item: TestItemId,
        succeeded: bool,
        duration: f64,
    },
    /// Every item of the request labelled `label` has finished.
    RunFinished { label: String },
}

pub type EventStream = UnboundedReceiver<EngineEvent>;
pub type EventSink = UnboundedSender<EngineEvent>;

/// Class registry and suite expansion.
pub trait TestDiscoveryProvider: Send + Sync {
    /// Names of the classes whose direct superclass is `base_type`.
    fn enumerate_subclasses(&self, base_type: &str) -> Vec<String>;

    /// Look a class up by its runtime name.
    fn resolve_class(&self, name: &str) -> Option<ClassHandle>;

    /// Namespace prepended to class names that only resolve qualified (`App.ClassName`).
    fn module_namespace(&self) -> Option<String> {
        None
    }

    /// Expand a class into its test items, in engine order.
    fn expand_to_test_items(&self, class: &ClassHandle) -> Vec<TestItemId>;
}

/// Test execution.
pub trait TestEngine: TestDiscoveryProvider {
    /// Start executing `request` and return without waiting for it.
    fn submit(&self, request: RunRequest);

    /// Open a lifecycle event stream. Events for every later submission are delivered to it.
    fn subscribe(&self) -> EventStream;
}
