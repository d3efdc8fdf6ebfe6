//! Turns an augmentation matrix into an ordered dataset of synthetic spectra.
//!
//! Rows are independent once the matrix is drawn, so synthesis may run on a
//! rayon pool. Records always come back in sampling order and the pool size
//! never changes the output. Row-level failures (grid mismatch, exhausted
//! weight floor) are collected in the run summary; any other error aborts the
//! build.

mod model;

pub use model::{RunSummary, SkippedRow};

use crate::domain::{
    ExportResult, ReducedRecord, ReferenceSpectrum, SimulatedSpectrumRecord, SynthesisResult,
    XpsError, XpsResult,
};
use crate::modules::DatasetExporter;
use crate::modules::export::{ExportReport, ExportRequest};
use crate::modules::sampler::{AugmentationMatrix, AugmentationRow};
use crate::modules::synthesis::{SynthesisSettings, synthesize};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<SimulatedSpectrumRecord>,
    requested: usize,
    complete: bool,
    summary: RunSummary,
}

impl Dataset {
    pub fn empty(requested: usize) -> Self {
        Self {
            records: Vec::new(),
            requested,
            complete: requested == 0,
            summary: RunSummary::new(requested),
        }
    }

    /// A complete dataset around records produced elsewhere, e.g. reloaded
    /// from an export.
    pub fn from_records(records: Vec<SimulatedSpectrumRecord>) -> Self {
        let mut summary = RunSummary::new(records.len());
        summary.succeeded = records.len();
        Self {
            requested: records.len(),
            complete: true,
            summary,
            records,
        }
    }

    pub fn full_view(&self) -> &[SimulatedSpectrumRecord] {
        &self.records
    }

    pub fn reduced_view(&self) -> Vec<ReducedRecord> {
        self.records.iter().map(SimulatedSpectrumRecord::reduced).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// False when the run was cancelled before every row was processed.
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn export(
        &self,
        exporter: &impl DatasetExporter,
        request: &ExportRequest,
    ) -> ExportResult<ExportReport> {
        exporter.export(self, request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    #[default]
    Sequential,
    /// A dedicated pool; `0` lets rayon pick the thread count.
    Threads(usize),
}

enum RowOutcome {
    Synthesized(SynthesisResult<SimulatedSpectrumRecord>),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    references: Vec<ReferenceSpectrum>,
    settings: SynthesisSettings,
    parallelism: Parallelism,
}

impl DatasetBuilder {
    pub fn new(references: Vec<ReferenceSpectrum>, settings: SynthesisSettings) -> XpsResult<Self> {
        settings.validate()?;
        if references.is_empty() {
            return Err(XpsError::configuration(
                "CONFIG.REFERENCES_EMPTY",
                "a dataset needs at least one reference spectrum",
            ));
        }
        let mut labels = BTreeSet::new();
        for reference in &references {
            if !labels.insert(reference.label()) {
                return Err(XpsError::configuration(
                    "CONFIG.REFERENCE_DUPLICATE",
                    format!("reference label '{}' appears more than once", reference.label()),
                ));
            }
        }

        Ok(Self {
            references,
            settings,
            parallelism: Parallelism::Sequential,
        })
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub const fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    pub fn build(&self, matrix: &AugmentationMatrix) -> XpsResult<Dataset> {
        self.build_with_cancel(matrix, &AtomicBool::new(false))
    }

    /// Build, checking `cancel` before every row. Rows finished before the
    /// flag was seen are kept; the dataset then reports itself incomplete.
    pub fn build_with_cancel(
        &self,
        matrix: &AugmentationMatrix,
        cancel: &AtomicBool,
    ) -> XpsResult<Dataset> {
        if matrix.num_references() != self.references.len() {
            return Err(XpsError::configuration(
                "CONFIG.MATRIX_WIDTH",
                format!(
                    "augmentation matrix mixes {} references but the builder holds {}",
                    matrix.num_references(),
                    self.references.len()
                ),
            ));
        }

        info!(
            requested = matrix.requested(),
            references = self.references.len(),
            mode = %matrix.mode(),
            parallelism = ?self.parallelism,
            "dataset build started"
        );

        let outcomes = match self.parallelism {
            Parallelism::Sequential => self.run_sequential(matrix.rows(), cancel),
            Parallelism::Threads(threads) => self.run_parallel(matrix.rows(), cancel, threads)?,
        };

        let mut records = Vec::with_capacity(outcomes.len());
        let mut summary = RunSummary::new(matrix.requested());
        let mut cancelled = false;

        for (row, outcome) in matrix.rows().iter().zip(outcomes) {
            match outcome {
                RowOutcome::Cancelled => {
                    cancelled = true;
                    break;
                }
                RowOutcome::Synthesized(Ok(record)) => {
                    debug!(row = row.index, "row synthesized");
                    records.push(record);
                }
                RowOutcome::Synthesized(Err(error)) if error.category().is_row_recoverable() => {
                    warn!(row = row.index, placeholder = error.placeholder(), "row skipped: {}", error.message());
                    summary.record_skip(SkippedRow::from_error(row.index, &error));
                }
                RowOutcome::Synthesized(Err(error)) => return Err(error),
            }
        }

        let first_unprocessed = if cancelled {
            matrix
                .rows()
                .get(records.len() + summary.skipped())
                .map(|row| row.index)
        } else {
            None
        };
        for rejected in matrix.rejected() {
            if first_unprocessed.is_some_and(|stop| rejected.index >= stop) {
                continue;
            }
            warn!(row = rejected.index, attempts = rejected.attempts, "row skipped: weight floor exhausted");
            summary.record_skip(SkippedRow::from_rejected(rejected));
        }
        summary.sort_skips();
        summary.succeeded = records.len();

        info!(
            requested = summary.requested,
            succeeded = summary.succeeded,
            skipped = summary.skipped(),
            cancelled,
            "dataset build finished"
        );

        Ok(Dataset {
            records,
            requested: matrix.requested(),
            complete: !cancelled,
            summary,
        })
    }

    fn run_sequential(&self, rows: &[AugmentationRow], cancel: &AtomicBool) -> Vec<RowOutcome> {
        let mut outcomes = Vec::with_capacity(rows.len());
        for row in rows {
            if cancel.load(Ordering::Relaxed) {
                outcomes.push(RowOutcome::Cancelled);
                break;
            }
            outcomes.push(self.synthesize_row(row));
        }
        outcomes
    }

    fn run_parallel(
        &self,
        rows: &[AugmentationRow],
        cancel: &AtomicBool,
        threads: usize,
    ) -> XpsResult<Vec<RowOutcome>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|source| {
                XpsError::internal(
                    "SYS.THREAD_POOL",
                    format!("failed to start synthesis thread pool: {source}"),
                )
            })?;

        Ok(pool.install(|| {
            rows.par_iter()
                .map(|row| {
                    if cancel.load(Ordering::Relaxed) {
                        RowOutcome::Cancelled
                    } else {
                        self.synthesize_row(row)
                    }
                })
                .collect()
        }))
    }

    fn synthesize_row(&self, row: &AugmentationRow) -> RowOutcome {
        RowOutcome::Synthesized(synthesize(&self.references, row, &self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::{Dataset, DatasetBuilder, Parallelism};
    use crate::domain::{ReferenceSpectrum, SimulationMode, XpsErrorCategory};
    use crate::modules::sampler::{ParameterSampler, SamplerSettings};
    use crate::modules::synthesis::SynthesisSettings;
    use std::sync::atomic::AtomicBool;

    fn reference(label: &str, center: f64, start: f64) -> ReferenceSpectrum {
        let x: Vec<f64> = (0..120).map(|index| start + 0.1 * index as f64).collect();
        let y = x
            .iter()
            .map(|energy| 2.0 + 40.0 * (-(energy - center).powi(2) / 0.8).exp())
            .collect();
        ReferenceSpectrum::new(label, x, y).expect("reference")
    }

    fn iron_references() -> Vec<ReferenceSpectrum> {
        vec![
            reference("Fe_metal", 706.5, 700.0),
            reference("FeO", 709.5, 700.0),
            reference("Fe2O3", 710.8, 700.0),
        ]
    }

    #[test]
    fn build_keeps_sampling_order_and_counts() {
        let matrix = ParameterSampler::new(SamplerSettings::with_seed(3))
            .expect("sampler")
            .sample(12, 3, SimulationMode::Combination)
            .expect("matrix");
        let dataset = DatasetBuilder::new(iron_references(), SynthesisSettings::default())
            .expect("builder")
            .build(&matrix)
            .expect("dataset");

        assert!(dataset.is_complete());
        assert_eq!(dataset.len(), 12);
        assert_eq!(dataset.summary().succeeded, 12);
        assert_eq!(dataset.summary().skipped(), 0);
        for (record, row) in dataset.full_view().iter().zip(matrix.rows()) {
            assert_eq!(record.label["FeO"], row.weights[1]);
        }
        assert_eq!(dataset.reduced_view()[4].y, dataset.full_view()[4].y);
    }

    #[test]
    fn preset_cancellation_yields_incomplete_empty_dataset() {
        let matrix = ParameterSampler::default()
            .sample(5, 3, SimulationMode::Single)
            .expect("matrix");
        let builder = DatasetBuilder::new(iron_references(), SynthesisSettings::default())
            .expect("builder");

        for parallelism in [Parallelism::Sequential, Parallelism::Threads(2)] {
            let dataset = builder
                .clone()
                .with_parallelism(parallelism)
                .build_with_cancel(&matrix, &AtomicBool::new(true))
                .expect("cancelled build");
            assert!(!dataset.is_complete());
            assert!(dataset.is_empty());
            assert_eq!(dataset.summary().unprocessed(), 5);
        }
    }

    #[test]
    fn builder_rejects_duplicate_labels_and_width_mismatch() {
        let error = DatasetBuilder::new(
            vec![reference("FeO", 709.5, 700.0), reference("FeO", 709.5, 700.0)],
            SynthesisSettings::default(),
        )
        .expect_err("duplicate labels");
        assert_eq!(error.placeholder(), "CONFIG.REFERENCE_DUPLICATE");

        let matrix = ParameterSampler::default()
            .sample(2, 2, SimulationMode::Single)
            .expect("matrix");
        let error = DatasetBuilder::new(iron_references(), SynthesisSettings::default())
            .expect("builder")
            .build(&matrix)
            .expect_err("width mismatch");
        assert_eq!(error.category(), XpsErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.MATRIX_WIDTH");
    }

    #[test]
    fn empty_dataset_reports_requested_rows() {
        let dataset = Dataset::empty(4);
        assert_eq!(dataset.requested(), 4);
        assert!(!dataset.is_complete());
        assert_eq!(dataset.summary().unprocessed(), 4);
    }
}
