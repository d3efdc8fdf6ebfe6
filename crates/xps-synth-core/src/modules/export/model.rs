use crate::domain::{ReducedRecord, SimulatedSpectrumRecord, XpsError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Bincode,
}

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Bincode => "bincode",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Bincode => "bin",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = XpsError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "bincode" | "bin" => Ok(Self::Bincode),
            other => Err(XpsError::configuration(
                "CONFIG.EXPORT_FORMAT",
                format!("unsupported export format '{other}'; expected json, csv or bincode"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportLayout {
    #[default]
    Combined,
    PerRecord,
}

impl ExportLayout {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::PerRecord => "per-record",
        }
    }
}

impl Display for ExportLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ExportLayout {
    type Err = XpsError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "combined" => Ok(Self::Combined),
            "per-record" | "per_record" => Ok(Self::PerRecord),
            other => Err(XpsError::configuration(
                "CONFIG.EXPORT_LAYOUT",
                format!("unsupported export layout '{other}'; expected combined or per-record"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportView {
    #[default]
    Full,
    Reduced,
}

impl ExportView {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
        }
    }
}

impl Display for ExportView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ExportView {
    type Err = XpsError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "reduced" => Ok(Self::Reduced),
            other => Err(XpsError::configuration(
                "CONFIG.EXPORT_VIEW",
                format!("unsupported export view '{other}'; expected full or reduced"),
            )),
        }
    }
}

/// Where and how a dataset is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub directory: PathBuf,
    pub name: String,
    pub format: ExportFormat,
    pub layout: ExportLayout,
    pub view: ExportView,
}

impl ExportRequest {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            format: ExportFormat::default(),
            layout: ExportLayout::default(),
            view: ExportView::default(),
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_layout(mut self, layout: ExportLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_view(mut self, view: ExportView) -> Self {
        self.view = view;
        self
    }

    pub fn combined_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.name, self.format.extension()))
    }

    pub fn record_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}{}.{}", self.name, index, self.format.extension()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedArtifact {
    pub index: usize,
    pub path: PathBuf,
    pub error: XpsError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedArtifact>,
}

impl ExportReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn written_paths(&self) -> impl Iterator<Item = &Path> {
        self.written.iter().map(PathBuf::as_path)
    }
}

/// Records reloaded from an exported artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedRecords {
    Full(Vec<SimulatedSpectrumRecord>),
    Reduced(Vec<ReducedRecord>),
}

impl LoadedRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Full(records) => records.len(),
            Self::Reduced(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_reduced(self) -> Vec<ReducedRecord> {
        match self {
            Self::Full(records) => records.iter().map(SimulatedSpectrumRecord::reduced).collect(),
            Self::Reduced(records) => records,
        }
    }
}
