//! The sorted catalog of discovered tests.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use systest_core::{TestDescriptor, TestGroup, TestRecord};

/// Position of a record in the table: `(group, item)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowIndex {
    pub group: usize,
    pub item: usize,
}

impl RowIndex {
    pub fn new(group: usize, item: usize) -> Self {
        Self { group, item }
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.group, self.item)
    }
}

/// Groups sorted by class name, each holding its records in engine order.
///
/// Built once at startup by discovery and handed to the run coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCatalog {
    groups: Vec<TestGroup>,
}

impl TestCatalog {
    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<TestGroup> {
        self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of tests across all groups.
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(TestGroup::len).sum()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TestDescriptor> {
        self.groups.iter().flat_map(|g| g.records.iter().map(|r| &r.descriptor))
    }

    pub fn position(&self, descriptor: &TestDescriptor) -> Option<RowIndex> {
        let group = self.groups.iter().position(|g| g.name == descriptor.class_name)?;
        let item = self.groups[group].position(&descriptor.method_name)?;
        Some(RowIndex::new(group, item))
    }
}

/// Accumulates descriptors in discovery order and sorts groups on [`CatalogBuilder::finish`].
#[derive(Debug)]
pub struct CatalogBuilder {
    not_run_message: String,
    groups: BTreeMap<String, Vec<TestDescriptor>>,
    seen: HashSet<TestDescriptor>,
}

impl CatalogBuilder {
    pub fn new(not_run_message: impl Into<String>) -> Self {
        Self {
            not_run_message: not_run_message.into(),
            groups: BTreeMap::new(),
            seen: HashSet::new(),
        }
    }

    /// Add a descriptor. Returns `false` if the pair was already present.
    pub fn insert(&mut self, descriptor: TestDescriptor) -> bool {
        if !self.seen.insert(descriptor.clone()) {
            return false;
        }
        self.groups
            .entry(descriptor.class_name.clone())
            .or_default()
            .push(descriptor);
        true
    }

    pub fn finish(self) -> TestCatalog {
        let not_run_message = self.not_run_message;
        let groups = self
            .groups
            .into_iter()
            .map(|(name, descriptors)| TestGroup {
                name,
                records: descriptors
                    .into_iter()
                    .map(|d| TestRecord::new(d, not_run_message.as_str()))
                    .collect(),
            })
            .collect();
        TestCatalog { groups }
    }
}
