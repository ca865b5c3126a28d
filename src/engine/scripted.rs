//! In-process engine that replays a JSON run plan.
//!
//! A plan lists classes, their tests and the outcome each test reports. Submitting a request
//! spawns a dedicated engine thread that publishes the scripted lifecycle events, the same way a
//! real engine reports from its own execution context.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    ClassHandle, EngineEvent, EventSink, EventStream, RunRequest, TestDiscoveryProvider, TestEngine, TestItemId,
};
use crate::errors::{SystestError, SystestResult};

fn default_superclass() -> String {
    "XCTestCase".to_string()
}

/// Classes and scripted outcomes replayed by [`ScriptedEngine`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunPlan {
    /// Module namespace for classes that only resolve qualified.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub classes: Vec<PlannedClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannedClass {
    pub name: String,
    #[serde(default = "default_superclass")]
    pub superclass: String,
    /// Only resolvable as `{namespace}.{name}`.
    #[serde(default)]
    pub qualified_only: bool,
    #[serde(default)]
    pub tests: Vec<PlannedTest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannedTest {
    pub method: String,
    /// Raw identifier to report instead of `-[Class method]`.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Failure reasons, in the order they are reported.
    #[serde(default)]
    pub failures: Vec<String>,
    /// Seconds reported when the test finishes.
    #[serde(default)]
    pub duration: f64,
    /// Outcome reported on finish; defaults to passing when no failures are listed.
    #[serde(default)]
    pub succeeded: Option<bool>,
}

impl PlannedClass {
    fn identifier_for(&self, test: &PlannedTest) -> TestItemId {
        match &test.identifier {
            Some(id) => TestItemId::new(id.as_str()),
            None => TestItemId::new(format!("-[{} {}]", self.name, test.method)),
        }
    }
}

impl RunPlan {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn load(path: &Path) -> SystestResult<Self> {
        let plan_error = |reason: String| SystestError::Plan {
            path: path.to_path_buf(),
            reason,
        };
        let source = fs::read_to_string(path).map_err(|e| plan_error(e.to_string()))?;
        Self::from_json(&source).map_err(|e| plan_error(e.to_string()))
    }

    /// Name the class is registered under at runtime.
    fn runtime_name(&self, class: &PlannedClass) -> String {
        match (&self.namespace, class.qualified_only) {
            (Some(namespace), true) => format!("{}.{}", namespace, class.name),
            _ => class.name.clone(),
        }
    }

    fn find_test(&self, item: &TestItemId) -> Option<&PlannedTest> {
        self.classes
            .iter()
            .flat_map(|class| class.tests.iter().map(move |test| (class, test)))
            .find(|(class, test)| class.identifier_for(test) == *item)
            .map(|(_, test)| test)
    }

    /// Event sequence the engine reports for `request`.
    fn script(&self, request: &RunRequest) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        for item in request.items() {
            let Some(test) = self.find_test(item) else {
                warn!(item = %item, "item is not part of the run plan; skipping");
                continue;
            };
            events.push(EngineEvent::WillStart { item: item.clone() });
            for reason in &test.failures {
                events.push(EngineEvent::DidFail {
                    item: item.clone(),
                    reason: reason.clone(),
                });
            }
            events.push(EngineEvent::DidFinish {
                item: item.clone(),
                succeeded: test.succeeded.unwrap_or(test.failures.is_empty()),
                duration: test.duration,
            });
        }
        events.push(EngineEvent::RunFinished {
            label: request.label.clone(),
        });
        events
    }
}

/// Engine binding backed by a [`RunPlan`].
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    plan: Arc<RunPlan>,
    subscribers: Arc<Mutex<Vec<EventSink>>>,
    step_delay: Duration,
}

impl ScriptedEngine {
    pub fn new(plan: RunPlan) -> Self {
        Self {
            plan: Arc::new(plan),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            step_delay: Duration::ZERO,
        }
    }

    /// Pause between events so a live display has something to show.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    fn sinks(&self) -> Vec<EventSink> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sink| !sink.is_closed());
        subscribers.clone()
    }
}

impl TestDiscoveryProvider for ScriptedEngine {
    fn enumerate_subclasses(&self, base_type: &str) -> Vec<String> {
        self.plan
            .classes
            .iter()
            .filter(|class| class.superclass == base_type)
            .map(|class| class.name.clone())
            .collect()
    }

    fn resolve_class(&self, name: &str) -> Option<ClassHandle> {
        self.plan
            .classes
            .iter()
            .map(|class| self.plan.runtime_name(class))
            .find(|runtime_name| runtime_name == name)
            .map(ClassHandle::new)
    }

    fn module_namespace(&self) -> Option<String> {
        self.plan.namespace.clone()
    }

    fn expand_to_test_items(&self, class: &ClassHandle) -> Vec<TestItemId> {
        self.plan
            .classes
            .iter()
            .find(|planned| self.plan.runtime_name(planned) == class.name())
            .map(|planned| planned.tests.iter().map(|test| planned.identifier_for(test)).collect())
            .unwrap_or_default()
    }
}

/// Report a request that never started as finished, so its watchers do not wait for it.
fn abandon_run(sinks: &[EventSink], label: &str) {
    for sink in sinks {
        let _ = sink.send(EngineEvent::RunFinished {
            label: label.to_string(),
        });
    }
}

impl TestEngine for ScriptedEngine {
    fn submit(&self, request: RunRequest) {
        let events = self.plan.script(&request);
        let sinks = self.sinks();
        let fallback = sinks.clone();
        let delay = self.step_delay;
        debug!(label = %request.label, items = request.item_count(), "engine accepted run request");

        let spawned = thread::Builder::new()
            .name("systest-engine".to_string())
            .spawn(move || {
                for event in events {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    for sink in &sinks {
                        // A dropped receiver only means nobody is watching anymore.
                        let _ = sink.send(event.clone());
                    }
                }
            });
        if let Err(e) = spawned {
            warn!(label = %request.label, error = %e, "failed to start engine thread");
            abandon_run(&fallback, &request.label);
        }
    }

    fn subscribe(&self) -> EventStream {
        let (sink, stream) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
        stream
    }
}
