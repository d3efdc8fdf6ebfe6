use super::CliError;
use super::helpers::*;
use std::path::PathBuf;
use tracing::{info, warn};
use xps_synth_core::domain::XpsErrorCategory;
use xps_synth_core::modules::export::ExportView;
use xps_synth_core::modules::sampler::ParameterSampler;
use xps_synth_core::modules::storage::{
    DirectoryDocumentStore, OverwritePolicy, drop_collection, upload,
};

#[derive(clap::Args, Default)]
pub(super) struct SamplingArgs {
    /// JSON generation config; flags below override its values
    #[arg(long)]
    pub(super) config: Option<PathBuf>,

    /// Comma-separated reference labels, in matrix column order
    #[arg(long, value_delimiter = ',')]
    pub(super) labels: Vec<String>,

    /// Number of spectra to simulate
    #[arg(long)]
    pub(super) count: Option<usize>,

    /// Weight mode: single or combination
    #[arg(long)]
    pub(super) mode: Option<String>,

    /// Seed of the parameter stream
    #[arg(long)]
    pub(super) seed: Option<u64>,

    /// Skip Gaussian broadening
    #[arg(long)]
    pub(super) no_broaden: bool,

    /// Skip the energy-axis shift
    #[arg(long)]
    pub(super) no_shift: bool,

    /// Skip noise injection
    #[arg(long)]
    pub(super) no_noise: bool,
}

#[derive(clap::Args, Default)]
pub(super) struct ReferenceArgs {
    /// Directory holding `<label>.txt` reference exports
    #[arg(long)]
    pub(super) references: Option<PathBuf>,

    /// Header lines preceding the data columns
    #[arg(long)]
    pub(super) header_lines: Option<usize>,

    /// Worker threads for synthesis (1 runs on the calling thread)
    #[arg(long)]
    pub(super) threads: Option<usize>,
}

#[derive(clap::Args)]
pub(super) struct GenerateArgs {
    #[command(flatten)]
    pub(super) sampling: SamplingArgs,

    #[command(flatten)]
    pub(super) reference: ReferenceArgs,

    /// Export directory; nothing is written without it
    #[arg(long)]
    pub(super) output: Option<PathBuf>,

    /// Artifact file stem
    #[arg(long)]
    pub(super) name: Option<String>,

    /// Export format: json, csv or bincode
    #[arg(long)]
    pub(super) format: Option<String>,

    /// Export layout: combined or per-record
    #[arg(long)]
    pub(super) layout: Option<String>,

    /// Record view: full or reduced
    #[arg(long)]
    pub(super) view: Option<String>,
}

#[derive(clap::Args)]
pub(super) struct SampleArgs {
    #[command(flatten)]
    pub(super) sampling: SamplingArgs,
}

#[derive(clap::Args)]
pub(super) struct UploadArgs {
    #[command(flatten)]
    pub(super) sampling: SamplingArgs,

    #[command(flatten)]
    pub(super) reference: ReferenceArgs,

    /// Target collection name
    #[arg(long)]
    pub(super) collection: String,

    /// Document store directory
    #[arg(long)]
    pub(super) store: PathBuf,

    /// What to do when the collection exists: fail, overwrite, append or rename
    #[arg(long, default_value = "fail")]
    pub(super) policy: String,

    /// Record view stored per document: full or reduced
    #[arg(long, default_value = "full")]
    pub(super) view: String,
}

#[derive(clap::Args)]
pub(super) struct DropArgs {
    /// Collection to remove
    #[arg(long)]
    pub(super) collection: String,

    /// Document store directory
    #[arg(long)]
    pub(super) store: PathBuf,
}

pub(super) fn run_generate_command(args: GenerateArgs) -> Result<i32, CliError> {
    let mut config = resolve_config(&args.sampling)?;
    apply_reference_overrides(&mut config, &args.reference);
    apply_export_overrides(&mut config, &args)?;
    config.validate()?;

    let dataset = build_dataset(&config)?;
    let export = match config.export_request() {
        Some(request) => Some(export_dataset(&dataset, &request)?),
        None => None,
    };

    print_json(&RunReport::new(&dataset, export.as_ref()))?;

    match export {
        Some(report) if !report.is_clean() => {
            warn!(failed = report.failed.len(), "per-record export incomplete");
            for failed in &report.failed {
                eprintln!("{}", failed.error.diagnostic_line());
            }
            Ok(XpsErrorCategory::ExportError.exit_code())
        }
        _ => Ok(0),
    }
}

pub(super) fn run_sample_command(args: SampleArgs) -> Result<i32, CliError> {
    let config = resolve_config(&args.sampling)?;
    config.validate()?;

    let matrix = ParameterSampler::new(config.sampler)?
        .sample(config.count, config.labels.len(), config.mode)?
        .with_distortions(config.distortions);
    print_json(&matrix)?;
    Ok(0)
}

pub(super) fn run_upload_command(args: UploadArgs) -> Result<i32, CliError> {
    let policy: OverwritePolicy = args.policy.parse()?;
    let view: ExportView = args.view.parse()?;
    let mut config = resolve_config(&args.sampling)?;
    apply_reference_overrides(&mut config, &args.reference);
    config.validate()?;

    let dataset = build_dataset(&config)?;
    let mut store = DirectoryDocumentStore::new(&args.store);
    let collection = upload(&mut store, &args.collection, &dataset, view, policy)?;
    info!(collection = %collection, documents = dataset.len(), "uploaded dataset");

    print_json(&UploadReport {
        collection,
        store: store.root().display().to_string(),
        documents: dataset.len(),
        summary: dataset.summary().clone(),
    })?;
    Ok(0)
}

pub(super) fn run_drop_command(args: DropArgs) -> Result<i32, CliError> {
    let mut store = DirectoryDocumentStore::new(&args.store);
    let dropped = drop_collection(&mut store, &args.collection)?;

    print_json(&DropReport {
        collection: args.collection,
        store: store.root().display().to_string(),
        dropped,
    })?;
    Ok(0)
}
