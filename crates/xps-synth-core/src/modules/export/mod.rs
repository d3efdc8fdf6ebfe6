mod codec;
mod model;

pub use model::{
    ExportFormat, ExportLayout, ExportReport, ExportRequest, ExportView, FailedArtifact,
    LoadedRecords,
};

use crate::domain::{ExportResult, ReducedRecord, SimulatedSpectrumRecord, XpsError};
use crate::modules::DatasetExporter;
use crate::modules::dataset::Dataset;
use crate::modules::serialization::{write_binary_artifact, write_text_artifact};
use codec::{Artifact, TabularRecord, decode, encode};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Writes datasets to the local filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileExporter;

impl DatasetExporter for FileExporter {
    fn export(&self, dataset: &Dataset, request: &ExportRequest) -> ExportResult<ExportReport> {
        fs::create_dir_all(&request.directory).map_err(|source| {
            XpsError::export(
                "EXPORT.CREATE_DIR",
                format!(
                    "failed to create export directory '{}': {}",
                    request.directory.display(),
                    source
                ),
            )
        })?;

        let report = match request.view {
            ExportView::Full => write_records(dataset.full_view(), request)?,
            ExportView::Reduced => write_records(&dataset.reduced_view(), request)?,
        };

        info!(
            directory = %request.directory.display(),
            format = %request.format,
            layout = %request.layout,
            view = %request.view,
            written = report.written.len(),
            failed = report.failed.len(),
            "dataset exported"
        );
        Ok(report)
    }
}

fn write_records<T: TabularRecord>(
    records: &[T],
    request: &ExportRequest,
) -> ExportResult<ExportReport> {
    let mut report = ExportReport::default();

    match request.layout {
        ExportLayout::Combined => {
            let path = request.combined_path();
            let artifact = encode(records, request.format, false)?;
            write_artifact(&path, &artifact)?;
            report.written.push(path);
        }
        ExportLayout::PerRecord => {
            for (index, record) in records.iter().enumerate() {
                let path = request.record_path(index);
                let written = encode(std::slice::from_ref(record), request.format, true)
                    .and_then(|artifact| write_artifact(&path, &artifact));
                match written {
                    Ok(()) => report.written.push(path),
                    Err(error) => {
                        warn!(record = index, path = %path.display(), "record export failed: {}", error.message());
                        report.failed.push(FailedArtifact { index, path, error });
                    }
                }
            }
        }
    }

    Ok(report)
}

fn write_artifact(path: &Path, artifact: &Artifact) -> ExportResult<()> {
    let written = match artifact {
        Artifact::Text(content) => write_text_artifact(path, content),
        Artifact::Binary(bytes) => write_binary_artifact(path, bytes),
    };
    written.map_err(|source| {
        XpsError::export(
            "EXPORT.WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Reload a combined artifact or one per-record artifact.
pub fn load_records(path: &Path, format: ExportFormat, view: ExportView) -> ExportResult<LoadedRecords> {
    let bytes = fs::read(path).map_err(|source| {
        XpsError::export(
            "EXPORT.READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;

    match view {
        ExportView::Full => decode::<SimulatedSpectrumRecord>(&bytes, format).map(LoadedRecords::Full),
        ExportView::Reduced => decode::<ReducedRecord>(&bytes, format).map(LoadedRecords::Reduced),
    }
}
