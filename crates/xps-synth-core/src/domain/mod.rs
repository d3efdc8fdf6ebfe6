pub mod errors;

pub use errors::{
    ExportResult, SynthesisResult, XpsError, XpsErrorCategory, XpsResult,
};

use crate::numerics::{EnergyGrid, GridError, regularize_samples};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    Single,
    #[default]
    Combination,
}

impl SimulationMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Combination => "combination",
        }
    }
}

impl Display for SimulationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SimulationMode {
    type Err = XpsError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "combination" | "linear" => Ok(Self::Combination),
            other => Err(XpsError::configuration(
                "CONFIG.MODE",
                format!("unknown simulation mode '{other}'; expected 'single' or 'combination'"),
            )),
        }
    }
}

/// Which instrumental distortions a run applies. Disabled distortions are
/// zeroed in the augmentation matrix after sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistortionToggles {
    pub broaden: bool,
    pub shift: bool,
    pub noise: bool,
}

impl Default for DistortionToggles {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl DistortionToggles {
    pub const fn all_enabled() -> Self {
        Self {
            broaden: true,
            shift: true,
            noise: true,
        }
    }

    pub const fn all_disabled() -> Self {
        Self {
            broaden: false,
            shift: false,
            noise: false,
        }
    }
}

/// One measured reference on a uniform energy grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSpectrum {
    label: String,
    grid: EnergyGrid,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl ReferenceSpectrum {
    /// Build from samples that already lie on a uniform grid.
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, GridError> {
        if x.len() != y.len() {
            return Err(GridError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let grid = EnergyGrid::from_points(&x)?;
        if let Some((index, value)) = y
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(GridError::NonFinite { index, value });
        }

        Ok(Self {
            label: label.into(),
            grid,
            x: grid.points(),
            y,
        })
    }

    /// Build from raw lab samples, filling gaps onto the canonical step.
    pub fn regularized(label: impl Into<String>, x: &[f64], y: &[f64]) -> Result<Self, GridError> {
        let samples = regularize_samples(x, y)?;
        Ok(Self {
            label: label.into(),
            grid: samples.grid,
            x: samples.grid.points(),
            y: samples.y,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One synthetic spectrum and the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSpectrumRecord {
    pub label: BTreeMap<String, f64>,
    pub shift_x: Option<f64>,
    pub scale_y: f64,
    pub noise: Option<f64>,
    #[serde(rename = "FWHM")]
    pub fwhm: Option<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SimulatedSpectrumRecord {
    pub fn reduced(&self) -> ReducedRecord {
        ReducedRecord {
            x: self.x.clone(),
            y: self.y.clone(),
            label: self.label.clone(),
        }
    }
}

/// The `(x, y, label)` projection consumed by classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedRecord {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub label: BTreeMap<String, f64>,
}
