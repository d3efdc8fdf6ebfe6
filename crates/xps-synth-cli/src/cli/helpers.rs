use super::CliError;
use super::commands::{GenerateArgs, ReferenceArgs, SamplingArgs};
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use xps_synth_core::config::{GenerationConfig, load_generation_config};
use xps_synth_core::domain::{DistortionToggles, XpsError};
use xps_synth_core::modules::ReferenceSource;
use xps_synth_core::modules::dataset::{Dataset, DatasetBuilder, RunSummary, SkippedRow};
use xps_synth_core::modules::export::{ExportReport, ExportRequest, FileExporter};
use xps_synth_core::modules::reference::TextReferenceStore;
use xps_synth_core::modules::sampler::ParameterSampler;

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides
/// the default `info` level.
pub(super) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn resolve_config(args: &SamplingArgs) -> Result<GenerationConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => load_generation_config(path).map_err(XpsError::from)?,
        None => GenerationConfig::default(),
    };

    if !args.labels.is_empty() {
        config.labels = args.labels.clone();
    }
    if let Some(count) = args.count {
        config.count = count;
    }
    if let Some(mode) = &args.mode {
        config.mode = mode.parse()?;
    }
    if let Some(seed) = args.seed {
        config.sampler.seed = seed;
    }
    config.distortions = DistortionToggles {
        broaden: config.distortions.broaden && !args.no_broaden,
        shift: config.distortions.shift && !args.no_shift,
        noise: config.distortions.noise && !args.no_noise,
    };
    Ok(config)
}

pub(super) fn apply_reference_overrides(config: &mut GenerationConfig, args: &ReferenceArgs) {
    if let Some(directory) = &args.references {
        config.reference_dir = Some(directory.clone());
    }
    if let Some(header_lines) = args.header_lines {
        config.header_lines = header_lines;
    }
    if let Some(threads) = args.threads {
        config.threads = Some(threads);
    }
}

pub(super) fn apply_export_overrides(
    config: &mut GenerationConfig,
    args: &GenerateArgs,
) -> Result<(), CliError> {
    if let Some(directory) = &args.output {
        config.export.directory = Some(directory.clone());
    }
    if let Some(name) = &args.name {
        config.export.name = name.clone();
    }
    if let Some(format) = &args.format {
        config.export.format = format.parse()?;
    }
    if let Some(layout) = &args.layout {
        config.export.layout = layout.parse()?;
    }
    if let Some(view) = &args.view {
        config.export.view = view.parse()?;
    }
    Ok(())
}

pub(super) fn build_dataset(config: &GenerationConfig) -> Result<Dataset, CliError> {
    let directory = config.reference_dir.as_ref().ok_or_else(|| {
        XpsError::configuration(
            "CONFIG.REFERENCE_DIR",
            "a reference directory is required (--references or referenceDir)",
        )
    })?;
    let references = TextReferenceStore::new(directory)
        .with_header_lines(config.header_lines)
        .load(&config.labels)?;

    let matrix = ParameterSampler::new(config.sampler)?
        .sample(config.count, references.len(), config.mode)?
        .with_distortions(config.distortions);

    let dataset = DatasetBuilder::new(references, config.synthesis)?
        .with_parallelism(config.parallelism())
        .build(&matrix)?;
    Ok(dataset)
}

pub(super) fn export_dataset(
    dataset: &Dataset,
    request: &ExportRequest,
) -> Result<ExportReport, CliError> {
    Ok(dataset.export(&FileExporter, request)?)
}

pub(super) fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write to stdout")?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FailedExport {
    pub(super) index: usize,
    pub(super) path: String,
    pub(super) placeholder: String,
    pub(super) message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RunReport {
    pub(super) requested: usize,
    pub(super) succeeded: usize,
    pub(super) skipped: usize,
    pub(super) complete: bool,
    pub(super) skipped_rows: Vec<SkippedRow>,
    pub(super) written: Vec<String>,
    pub(super) failed: Vec<FailedExport>,
}

impl RunReport {
    pub(super) fn new(dataset: &Dataset, export: Option<&ExportReport>) -> Self {
        let summary = dataset.summary();
        let written = export
            .map(|report| {
                report
                    .written_paths()
                    .map(|path| path.display().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let failed = export
            .map(|report| {
                report
                    .failed
                    .iter()
                    .map(|failed| FailedExport {
                        index: failed.index,
                        path: failed.path.display().to_string(),
                        placeholder: failed.error.placeholder().to_string(),
                        message: failed.error.message().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            requested: summary.requested,
            succeeded: summary.succeeded,
            skipped: summary.skipped(),
            complete: dataset.is_complete(),
            skipped_rows: summary.skipped_rows.clone(),
            written,
            failed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UploadReport {
    pub(super) collection: String,
    pub(super) store: String,
    pub(super) documents: usize,
    pub(super) summary: RunSummary,
}

#[derive(Debug, Serialize)]
pub(super) struct DropReport {
    pub(super) collection: String,
    pub(super) store: String,
    pub(super) dropped: bool,
}
