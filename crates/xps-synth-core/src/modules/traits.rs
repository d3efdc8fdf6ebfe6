use crate::domain::{ExportResult, ReferenceSpectrum, XpsResult};
use crate::modules::dataset::Dataset;
use crate::modules::export::{ExportReport, ExportRequest};
use crate::modules::storage::StoredDocument;

/// Resolves reference identifiers to spectra on one shared grid.
pub trait ReferenceSource {
    fn load(&self, ids: &[String]) -> XpsResult<Vec<ReferenceSpectrum>>;
}

pub trait DatasetExporter {
    fn export(&self, dataset: &Dataset, request: &ExportRequest) -> ExportResult<ExportReport>;
}

/// Bulk storage of generated records, one document per record, grouped in
/// named collections.
pub trait DocumentStore {
    fn collection_exists(&self, name: &str) -> XpsResult<bool>;

    fn replace_collection(&mut self, name: &str, documents: &[StoredDocument]) -> XpsResult<()>;

    fn append(&mut self, name: &str, documents: &[StoredDocument]) -> XpsResult<()>;

    fn documents(&self, name: &str) -> XpsResult<Vec<StoredDocument>>;

    /// Removes a collection. Returns whether it existed.
    fn drop_collection(&mut self, name: &str) -> XpsResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::{DatasetExporter, ReferenceSource};
    use crate::domain::{ExportResult, ReferenceSpectrum, XpsError, XpsErrorCategory, XpsResult};
    use crate::modules::dataset::Dataset;
    use crate::modules::export::{ExportReport, ExportRequest};

    struct FailingSource;

    impl ReferenceSource for FailingSource {
        fn load(&self, ids: &[String]) -> XpsResult<Vec<ReferenceSpectrum>> {
            Err(XpsError::missing_reference(
                "INPUT.REFERENCE_NOT_FOUND",
                format!("no reference named '{}'", ids.join(",")),
            ))
        }
    }

    struct FailingExporter;

    impl DatasetExporter for FailingExporter {
        fn export(&self, _dataset: &Dataset, _request: &ExportRequest) -> ExportResult<ExportReport> {
            Err(XpsError::export("EXPORT.WRITE", "target is read-only"))
        }
    }

    #[test]
    fn reference_source_uses_shared_error_types() {
        let error = FailingSource
            .load(&["Fe_metal".to_string()])
            .expect_err("source should fail");
        assert_eq!(error.category(), XpsErrorCategory::MissingReferenceError);
        assert_eq!(error.exit_code(), 3);
        assert!(error.message().contains("Fe_metal"));
    }

    #[test]
    fn dataset_exporter_errors_keep_their_placeholder() {
        let error = FailingExporter
            .export(&Dataset::empty(0), &ExportRequest::new("out", "records"))
            .expect_err("exporter should fail");
        assert_eq!(error.category(), XpsErrorCategory::ExportError);
        assert_eq!(error.placeholder(), "EXPORT.WRITE");
    }
}
