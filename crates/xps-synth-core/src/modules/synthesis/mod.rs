mod model;

pub use model::{add_noise, broaden, combine_linear, normalize, shift_spectrum};

use crate::domain::{ReferenceSpectrum, SimulatedSpectrumRecord, SynthesisResult, XpsError, XpsResult};
use crate::modules::sampler::AugmentationRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampled FWHM values are in hundredths of a grid step.
pub const DEFAULT_FWHM_UNITS_PER_STEP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisSettings {
    /// Divisor turning a sampled FWHM value into a kernel width in grid steps.
    pub fwhm_units_per_step: f64,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            fwhm_units_per_step: DEFAULT_FWHM_UNITS_PER_STEP,
        }
    }
}

impl SynthesisSettings {
    pub fn validate(&self) -> XpsResult<()> {
        if !self.fwhm_units_per_step.is_finite() || self.fwhm_units_per_step <= 0.0 {
            return Err(XpsError::configuration(
                "CONFIG.FWHM_UNITS",
                format!(
                    "fwhm units per step must be finite and > 0, got {}",
                    self.fwhm_units_per_step
                ),
            ));
        }
        Ok(())
    }
}

/// Turn one parameter row into one synthetic spectrum.
///
/// Steps: linear combination, Gaussian broadening, axis shift, noise and
/// normalization. A zero FWHM, shift or SNR skips that step and leaves the
/// matching record field empty. Identical inputs give bit-identical output,
/// noise included, because the noise stream is seeded by the row.
pub fn synthesize(
    references: &[ReferenceSpectrum],
    row: &AugmentationRow,
    settings: &SynthesisSettings,
) -> SynthesisResult<SimulatedSpectrumRecord> {
    validate_row(references, row)?;

    let mut y = combine_linear(references, &row.weights)?;

    let fwhm = (row.fwhm != 0.0).then_some(row.fwhm);
    if let Some(fwhm) = fwhm {
        y = broaden(&y, fwhm / settings.fwhm_units_per_step)?;
    }

    let shift_steps = row.shift_x.round() as i64;
    let shift_x = (shift_steps != 0).then_some(shift_steps as f64);
    if shift_steps != 0 {
        y = shift_spectrum(&y, shift_steps);
    }

    // A flat spectrum has no height to scale sigma against and stays untouched.
    let noise = match row.snr {
        snr if snr != 0.0 => (add_noise(&mut y, snr, row.noise_seed) > 0.0).then_some(snr),
        _ => None,
    };

    let scale_y = normalize(&mut y);

    let label: BTreeMap<String, f64> = references
        .iter()
        .zip(&row.weights)
        .map(|(reference, weight)| (reference.label().to_string(), *weight))
        .collect();

    Ok(SimulatedSpectrumRecord {
        label,
        shift_x,
        scale_y,
        noise,
        fwhm,
        x: references[0].x().to_vec(),
        y,
    })
}

fn validate_row(references: &[ReferenceSpectrum], row: &AugmentationRow) -> XpsResult<()> {
    if references.is_empty() {
        return Err(XpsError::configuration(
            "CONFIG.REFERENCES_EMPTY",
            "synthesis needs at least one reference spectrum",
        ));
    }
    if row.weights.len() != references.len() {
        return Err(XpsError::configuration(
            "CONFIG.WEIGHT_ROW_LENGTH",
            format!(
                "row {} has {} weights for {} references",
                row.index,
                row.weights.len(),
                references.len()
            ),
        ));
    }
    if let Some(weight) = row
        .weights
        .iter()
        .find(|weight| !weight.is_finite() || **weight < 0.0)
    {
        return Err(XpsError::configuration(
            "CONFIG.WEIGHT_VALUE",
            format!("row {} has invalid weight {}", row.index, weight),
        ));
    }
    if !row.fwhm.is_finite() || row.fwhm < 0.0 {
        return Err(XpsError::configuration(
            "CONFIG.FWHM",
            format!("row {} has invalid FWHM {}", row.index, row.fwhm),
        ));
    }
    if !row.shift_x.is_finite() {
        return Err(XpsError::configuration(
            "CONFIG.SHIFT",
            format!("row {} has invalid shift {}", row.index, row.shift_x),
        ));
    }
    if !row.snr.is_finite() || row.snr < 0.0 {
        return Err(XpsError::configuration(
            "CONFIG.SNR",
            format!("row {} has invalid signal-to-noise {}", row.index, row.snr),
        ));
    }
    Ok(())
}
