//! Outcome of a whole run.

use crate::job::DatasetReport;

/// Per-dataset reports in completion order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<DatasetReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &DatasetReport> {
        self.reports.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DatasetReport> {
        self.reports.iter().filter(|r| !r.is_success())
    }

    pub fn failed_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.failed().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn report(&self, name: &str) -> Option<&DatasetReport> {
        self.reports.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
