//! Test discovery
//!
//! Enumerates the direct subclasses of the configured base type, expands each class into its
//! test items and parses their identifiers into a sorted [`TestCatalog`].
//!
//! Failures are collected, not raised: a class that cannot be resolved or an item with a
//! malformed identifier is left out and reported in [`DiscoveryReport::errors`], and the rest of
//! the catalog still loads.

use std::sync::Arc;

use systest_core::TestDescriptor;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogBuilder, TestCatalog};
use crate::config::RunnerConfig;
use crate::engine::{ClassHandle, TestDiscoveryProvider};
use crate::errors::{SystestError, SystestResult};

/// Result of one discovery pass.
#[derive(Debug)]
pub struct DiscoveryReport {
    pub catalog: TestCatalog,
    pub errors: Vec<SystestError>,
}

/// Resolve a class by name, falling back to the namespace-qualified name.
///
/// Classes declared in some source languages are only registered as `{namespace}.{name}`.
pub fn resolve_class<P>(provider: &P, class_name: &str) -> SystestResult<ClassHandle>
where
    P: TestDiscoveryProvider + ?Sized,
{
    if let Some(handle) = provider.resolve_class(class_name) {
        return Ok(handle);
    }

    let mut attempted = vec![class_name.to_string()];
    if let Some(namespace) = provider.module_namespace() {
        let qualified = format!("{}.{}", namespace, class_name);
        if let Some(handle) = provider.resolve_class(&qualified) {
            debug!(class = class_name, qualified = %qualified, "resolved class through module namespace");
            return Ok(handle);
        }
        attempted.push(qualified);
    }

    Err(SystestError::ClassResolution {
        class_name: class_name.to_string(),
        attempted,
    })
}

/// Build the catalog from everything the provider knows about.
pub fn discover<P>(provider: &P, config: &RunnerConfig) -> DiscoveryReport
where
    P: TestDiscoveryProvider + ?Sized,
{
    let mut builder = CatalogBuilder::new(config.not_run_message.as_str());
    let mut errors = Vec::new();

    for class_name in provider.enumerate_subclasses(&config.base_type) {
        let handle = match resolve_class(provider, &class_name) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "skipping test class");
                errors.push(e);
                continue;
            }
        };

        for item in provider.expand_to_test_items(&handle) {
            match TestDescriptor::parse(item.as_str()) {
                Ok(descriptor) => {
                    let shown = descriptor.to_string();
                    if !builder.insert(descriptor) {
                        warn!(test = %shown, "duplicate test item; keeping the first");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "skipping test item");
                    errors.push(e.into());
                }
            }
        }
    }

    let catalog = builder.finish();
    info!(
        groups = catalog.groups().len(),
        tests = catalog.test_count(),
        errors = errors.len(),
        "discovery finished"
    );
    DiscoveryReport { catalog, errors }
}

/// Run [`discover`] on the blocking pool so the caller's task stays responsive.
///
/// Awaiting the handle hands the finished report back to the owning task.
pub fn spawn_discovery<P>(provider: Arc<P>, config: RunnerConfig) -> JoinHandle<DiscoveryReport>
where
    P: TestDiscoveryProvider + ?Sized + 'static,
{
    tokio::task::spawn_blocking(move || discover(&*provider, &config))
}
