use crate::domain::{XpsError, XpsErrorCategory};
use crate::modules::sampler::RejectedRow;
use serde::{Deserialize, Serialize};

/// One matrix row that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub index: usize,
    pub category: XpsErrorCategory,
    pub placeholder: String,
    pub message: String,
}

impl SkippedRow {
    pub fn from_error(index: usize, error: &XpsError) -> Self {
        Self {
            index,
            category: error.category(),
            placeholder: error.placeholder().to_string(),
            message: error.message().to_string(),
        }
    }

    pub fn from_rejected(rejected: &RejectedRow) -> Self {
        Self::from_error(rejected.index, &rejected.error())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub skipped_rows: Vec<SkippedRow>,
}

impl RunSummary {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_rows.len()
    }

    /// Rows never reached because the run was cancelled.
    pub fn unprocessed(&self) -> usize {
        self.requested
            .saturating_sub(self.succeeded + self.skipped_rows.len())
    }

    pub fn skipped_with(&self, category: XpsErrorCategory) -> usize {
        self.skipped_rows
            .iter()
            .filter(|row| row.category == category)
            .count()
    }

    pub(super) fn record_skip(&mut self, row: SkippedRow) {
        self.skipped_rows.push(row);
    }

    pub(super) fn sort_skips(&mut self) {
        self.skipped_rows.sort_by_key(|row| row.index);
    }
}
