//! The status table: every record plus the run counters.

use systest_core::{RunSummary, TestDescriptor, TestGroup, TestRecord, TestStatus};

use crate::catalog::{RowIndex, TestCatalog};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusTable {
    groups: Vec<TestGroup>,
    summary: RunSummary,
}

impl StatusTable {
    /// Seed the table from a catalog. `total_tests` starts at the catalog size.
    pub fn new(catalog: TestCatalog) -> Self {
        let summary = RunSummary::new(catalog.test_count());
        Self {
            groups: catalog.into_groups(),
            summary,
        }
    }

    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    pub fn group_index(&self, class_name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == class_name)
    }

    pub fn locate(&self, descriptor: &TestDescriptor) -> Option<RowIndex> {
        let group = self.group_index(&descriptor.class_name)?;
        let item = self.groups[group].position(&descriptor.method_name)?;
        Some(RowIndex::new(group, item))
    }

    pub fn record(&self, index: RowIndex) -> Option<&TestRecord> {
        self.groups.get(index.group)?.records.get(index.item)
    }

    pub fn record_mut(&mut self, index: RowIndex) -> Option<&mut TestRecord> {
        self.groups.get_mut(index.group)?.records.get_mut(index.item)
    }

    /// Records currently showing `Failed`, whether or not a reason was reported.
    pub fn failed_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.records.iter())
            .filter(|r| r.status == TestStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;

    fn table() -> StatusTable {
        let mut builder = CatalogBuilder::new("Not yet executed");
        builder.insert(TestDescriptor::new("BetaTests", "testTwo"));
        builder.insert(TestDescriptor::new("AlphaTests", "testOne"));
        StatusTable::new(builder.finish())
    }

    #[test]
    fn test_summary_starts_at_catalog_size() {
        let table = table();
        assert_eq!(table.summary().total_tests, 2);
        assert_eq!(table.summary().total_failures, 0);
        assert_eq!(table.summary().total_duration, 0.0);
    }

    #[test]
    fn test_locate_and_record() {
        let table = table();
        let index = table.locate(&TestDescriptor::new("BetaTests", "testTwo")).unwrap();
        assert_eq!(index, RowIndex::new(1, 0));
        assert_eq!(table.record(index).unwrap().name(), "testTwo");
    }

    #[test]
    fn test_failed_count_reads_statuses() {
        let mut table = table();
        assert_eq!(table.failed_count(), 0);

        // No failure notification, so the counters stay at zero.
        table.record_mut(RowIndex::new(0, 0)).unwrap().status = TestStatus::Failed;
        assert_eq!(table.failed_count(), 1);
        assert_eq!(table.summary().total_failures, 0);
    }

    #[test]
    fn test_out_of_range_index_is_none() {
        let mut table = table();
        assert!(table.record(RowIndex::new(5, 0)).is_none());
        assert!(table.record_mut(RowIndex::new(0, 9)).is_none());
    }
}
