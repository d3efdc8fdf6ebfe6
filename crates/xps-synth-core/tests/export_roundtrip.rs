use tempfile::TempDir;
use xps_synth_core::domain::{ReferenceSpectrum, SimulationMode};
use xps_synth_core::modules::DocumentStore;
use xps_synth_core::modules::dataset::{Dataset, DatasetBuilder};
use xps_synth_core::modules::export::{
    ExportFormat, ExportLayout, ExportRequest, ExportView, FileExporter, load_records,
};
use xps_synth_core::modules::sampler::{ParameterSampler, SamplerSettings};
use xps_synth_core::modules::storage::{DirectoryDocumentStore, OverwritePolicy, upload};
use xps_synth_core::modules::synthesis::SynthesisSettings;

fn nickel_dataset(count: usize) -> Dataset {
    let x: Vec<f64> = (0..150).map(|index| 850.0 + 0.1 * index as f64).collect();
    let line = |center: f64| -> Vec<f64> {
        x.iter()
            .map(|energy| 5.0 + 60.0 / (1.0 + ((energy - center) / 0.7).powi(2)))
            .collect()
    };
    let references = vec![
        ReferenceSpectrum::new("Ni_metal", x.clone(), line(852.6)).expect("reference"),
        ReferenceSpectrum::new("NiO", x.clone(), line(854.0)).expect("reference"),
        ReferenceSpectrum::new("Ni(OH)2", x.clone(), line(855.6)).expect("reference"),
    ];

    let matrix = ParameterSampler::new(SamplerSettings::with_seed(31))
        .expect("sampler")
        .sample(count, 3, SimulationMode::Combination)
        .expect("matrix");
    DatasetBuilder::new(references, SynthesisSettings::default())
        .expect("builder")
        .build(&matrix)
        .expect("dataset")
}

#[test]
fn reduced_records_survive_every_export_format() {
    let temp = TempDir::new().expect("tempdir should be created");
    let dataset = nickel_dataset(6);
    let expected = dataset.reduced_view();

    for format in [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Bincode] {
        let request = ExportRequest::new(temp.path().join(format.as_str()), "nickel")
            .with_format(format)
            .with_view(ExportView::Reduced);
        let report = dataset.export(&FileExporter, &request).expect("export");
        assert!(report.is_clean());

        let reloaded = load_records(&request.combined_path(), format, ExportView::Reduced)
            .expect("reload")
            .into_reduced();
        assert_eq!(reloaded, expected, "{format} round trip");
    }
}

#[test]
fn per_record_full_exports_reload_one_record_each() {
    let temp = TempDir::new().expect("tempdir should be created");
    let dataset = nickel_dataset(4);

    for format in [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Bincode] {
        let request = ExportRequest::new(temp.path(), "ni_")
            .with_format(format)
            .with_layout(ExportLayout::PerRecord);
        let report = dataset.export(&FileExporter, &request).expect("export");
        assert_eq!(report.written.len(), 4);

        for (index, record) in dataset.full_view().iter().enumerate() {
            let reloaded = load_records(&request.record_path(index), format, ExportView::Full)
                .expect("reload")
                .into_reduced();
            assert_eq!(reloaded, vec![record.reduced()]);
        }
    }
}

#[test]
fn directory_store_upload_honours_overwrite_policy() {
    let temp = TempDir::new().expect("tempdir should be created");
    let dataset = nickel_dataset(5);
    let mut store = DirectoryDocumentStore::new(temp.path().join("db"));

    let written = upload(&mut store, "nickel", &dataset, ExportView::Reduced, OverwritePolicy::Fail)
        .expect("first upload");
    assert_eq!(written, "nickel");
    upload(&mut store, "nickel", &dataset, ExportView::Reduced, OverwritePolicy::Fail)
        .expect_err("existing collection with fail policy");

    let renamed = upload(&mut store, "nickel", &dataset, ExportView::Full, OverwritePolicy::Rename)
        .expect("rename");
    assert_eq!(renamed, "nickel_1");
    assert!(store.collection_path("nickel_1").is_file());

    let documents = store.documents("nickel_1").expect("documents");
    assert_eq!(documents.len(), 5);
    let record = &dataset.full_view()[2];
    assert_eq!(documents[2].label, record.label);
    assert_eq!(documents[2].y[10], record.y[10] as f32);
    assert_eq!(documents[2].x[1], 850.1);
    assert_eq!(
        documents[2].parameters.map(|parameters| parameters.scale_y),
        Some(record.scale_y)
    );
}
