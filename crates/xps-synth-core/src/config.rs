//! JSON run configuration for a generation run.
//!
//! Every key is optional; missing keys take the defaults below. Command-line
//! flags are layered on top by the CLI before [`GenerationConfig::validate`]
//! runs.

use crate::domain::{DistortionToggles, SimulationMode, XpsError, XpsResult};
use crate::modules::dataset::Parallelism;
use crate::modules::export::{ExportFormat, ExportLayout, ExportRequest, ExportView};
use crate::modules::reference::DEFAULT_HEADER_LINES;
use crate::modules::sampler::{SamplerSettings, validate_simulation_count};
use crate::modules::synthesis::SynthesisSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SIMULATION_COUNT: usize = 100;
pub const DEFAULT_DATASET_NAME: &str = "dataset";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub directory: Option<PathBuf>,
    pub name: String,
    pub format: ExportFormat,
    pub layout: ExportLayout,
    pub view: ExportView,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: None,
            name: DEFAULT_DATASET_NAME.to_string(),
            format: ExportFormat::default(),
            layout: ExportLayout::default(),
            view: ExportView::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub count: usize,
    pub labels: Vec<String>,
    pub reference_dir: Option<PathBuf>,
    pub header_lines: usize,
    pub mode: SimulationMode,
    pub sampler: SamplerSettings,
    pub synthesis: SynthesisSettings,
    pub distortions: DistortionToggles,
    /// `None` synthesizes on the calling thread.
    pub threads: Option<usize>,
    pub export: ExportSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_SIMULATION_COUNT,
            labels: Vec::new(),
            reference_dir: None,
            header_lines: DEFAULT_HEADER_LINES,
            mode: SimulationMode::default(),
            sampler: SamplerSettings::default(),
            synthesis: SynthesisSettings::default(),
            distortions: DistortionToggles::default(),
            threads: None,
            export: ExportSettings::default(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> XpsResult<()> {
        validate_simulation_count(self.count)?;
        if self.labels.is_empty() {
            return Err(XpsError::configuration(
                "CONFIG.REFERENCES_EMPTY",
                "at least one reference label is required",
            ));
        }
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = self.labels.iter().find(|label| !seen.insert(label.as_str())) {
            return Err(XpsError::configuration(
                "CONFIG.REFERENCE_DUPLICATE",
                format!("reference '{duplicate}' is listed more than once"),
            ));
        }
        if self.export.name.trim().is_empty() {
            return Err(XpsError::configuration(
                "CONFIG.EXPORT_NAME",
                "export name must not be empty",
            ));
        }
        self.sampler.validate()?;
        self.synthesis.validate()
    }

    pub fn parallelism(&self) -> Parallelism {
        match self.threads {
            None | Some(1) => Parallelism::Sequential,
            Some(threads) => Parallelism::Threads(threads),
        }
    }

    /// The export target, when an output directory is configured.
    pub fn export_request(&self) -> Option<ExportRequest> {
        let directory = self.export.directory.as_ref()?;
        Some(
            ExportRequest::new(directory, self.export.name.clone())
                .with_format(self.export.format)
                .with_layout(self.export.layout)
                .with_view(self.export.view),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationConfigError {
    #[error("failed to read generation config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse generation config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<GenerationConfigError> for XpsError {
    fn from(error: GenerationConfigError) -> Self {
        let placeholder = match &error {
            GenerationConfigError::Read { .. } => "CONFIG.FILE_READ",
            GenerationConfigError::Parse { .. } => "CONFIG.FILE_PARSE",
        };
        XpsError::configuration(placeholder, error.to_string())
    }
}

pub fn load_generation_config(
    config_path: impl AsRef<Path>,
) -> Result<GenerationConfig, GenerationConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| GenerationConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| GenerationConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{GenerationConfig, GenerationConfigError, load_generation_config};
    use crate::domain::{SimulationMode, XpsError, XpsErrorCategory};
    use crate::modules::dataset::Parallelism;
    use crate::modules::export::{ExportFormat, ExportLayout};
    use crate::modules::sampler::MAX_SIMULATION_COUNT;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn partial_config_files_take_defaults() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run.json");
        fs::write(
            &path,
            r#"{
                "count": 25,
                "labels": ["Fe_metal", "FeO", "Fe3O4", "Fe2O3"],
                "mode": "single",
                "sampler": { "seed": 7 },
                "distortions": { "shift": false },
                "threads": 4,
                "export": { "directory": "out", "format": "csv", "layout": "per-record" }
            }"#,
        )
        .expect("config should be written");

        let config = load_generation_config(&path).expect("config should load");
        assert_eq!(config.count, 25);
        assert_eq!(config.mode, SimulationMode::Single);
        assert_eq!(config.sampler.seed, 7);
        assert_eq!(config.sampler.max_attempts, 10_000);
        assert_eq!(config.header_lines, 8);
        assert!(!config.distortions.shift && config.distortions.noise);
        assert_eq!(config.parallelism(), Parallelism::Threads(4));
        config.validate().expect("config should validate");

        let request = config.export_request().expect("export configured");
        assert_eq!(request.format, ExportFormat::Csv);
        assert_eq!(request.layout, ExportLayout::PerRecord);
        assert_eq!(request.name, "dataset");
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let config = GenerationConfig::default();
        let error = config.validate().expect_err("labels missing");
        assert_eq!(error.placeholder(), "CONFIG.REFERENCES_EMPTY");

        let config = GenerationConfig {
            count: 0,
            labels: vec!["FeO".to_string()],
            ..GenerationConfig::default()
        };
        let error = config.validate().expect_err("zero count");
        assert_eq!(error.category(), XpsErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.SIMULATION_COUNT");
        assert!(config.export_request().is_none());

        let config = GenerationConfig {
            count: MAX_SIMULATION_COUNT + 1,
            ..config
        };
        let error = config.validate().expect_err("oversized count");
        assert_eq!(error.placeholder(), "CONFIG.SIMULATION_COUNT");
    }

    #[test]
    fn file_errors_carry_the_path() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = temp.path().join("missing.json");
        let error = load_generation_config(&missing).expect_err("missing file");
        assert!(matches!(error, GenerationConfigError::Read { .. }));

        let broken = temp.path().join("broken.json");
        fs::write(&broken, "{ count: ").expect("broken config should be written");
        let error = XpsError::from(load_generation_config(&broken).expect_err("bad json"));
        assert_eq!(error.placeholder(), "CONFIG.FILE_PARSE");
        assert!(error.message().contains("broken.json"));
    }
}
