//! Random parameter generation for a generation run.
//!
//! The whole augmentation matrix is drawn up-front from one seeded ChaCha
//! stream: per row, the mixing weights first, then FWHM, shift, SNR and the
//! row's noise seed. Disabling a distortion overwrites its column afterwards
//! and never changes which numbers are drawn.

mod model;

pub use model::{FlooredWeights, WEIGHT_DRAW_CEILING, WeightFloorExhausted, draw_floored_weights};

use crate::domain::{DistortionToggles, SimulationMode, XpsError, XpsResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Range, RangeInclusive};
use tracing::{debug, info, warn};

pub const WEIGHT_FLOOR: f64 = 0.1;
pub const WEIGHT_SUM_TOLERANCE: f64 = 1.0e-6;
pub const FWHM_RANGE: Range<i64> = 145..722;
pub const SHIFT_RANGE: RangeInclusive<i64> = -8..=8;
pub const SNR_RANGE: Range<i64> = 15..200;
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;
pub const MAX_SIMULATION_COUNT: usize = 1_000_000;

/// Number of trailing distortion columns (FWHM, shift, SNR).
pub const DISTORTION_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamplerSettings {
    pub seed: u64,
    pub weight_floor: f64,
    pub max_attempts: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            weight_floor: WEIGHT_FLOOR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SamplerSettings {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> XpsResult<()> {
        if !self.weight_floor.is_finite()
            || self.weight_floor < 0.0
            || self.weight_floor >= WEIGHT_DRAW_CEILING
        {
            return Err(XpsError::configuration(
                "CONFIG.WEIGHT_FLOOR",
                format!(
                    "weight floor must lie in [0, {WEIGHT_DRAW_CEILING}), got {}",
                    self.weight_floor
                ),
            ));
        }
        if self.max_attempts == 0 {
            return Err(XpsError::configuration(
                "CONFIG.MAX_ATTEMPTS",
                "rejection sampling needs at least one attempt",
            ));
        }
        Ok(())
    }
}

/// Parameters for one simulated spectrum. A distortion column holding `0.0`
/// is disabled for that row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationRow {
    pub index: usize,
    pub weights: Vec<f64>,
    pub fwhm: f64,
    pub shift_x: f64,
    pub snr: f64,
    pub noise_seed: u64,
    pub attempts: usize,
}

impl AugmentationRow {
    /// The row in matrix layout: weights followed by FWHM, shift and SNR.
    pub fn columns(&self) -> Vec<f64> {
        let mut columns = Vec::with_capacity(self.weights.len() + DISTORTION_COLUMNS);
        columns.extend_from_slice(&self.weights);
        columns.extend([self.fwhm, self.shift_x, self.snr]);
        columns
    }
}

/// A row whose weight floor could not be met within the retry cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub index: usize,
    pub attempts: usize,
}

impl RejectedRow {
    pub fn error(&self) -> XpsError {
        XpsError::sampling_exhaustion(
            "RUN.WEIGHT_FLOOR_EXHAUSTED",
            format!(
                "row {} could not satisfy the weight floor after {} attempts",
                self.index, self.attempts
            ),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationMatrix {
    mode: SimulationMode,
    num_references: usize,
    requested: usize,
    toggles: DistortionToggles,
    rows: Vec<AugmentationRow>,
    rejected: Vec<RejectedRow>,
}

impl AugmentationMatrix {
    pub const fn mode(&self) -> SimulationMode {
        self.mode
    }

    pub const fn num_references(&self) -> usize {
        self.num_references
    }

    pub const fn requested(&self) -> usize {
        self.requested
    }

    pub const fn toggles(&self) -> DistortionToggles {
        self.toggles
    }

    pub fn rows(&self) -> &[AugmentationRow] {
        &self.rows
    }

    pub fn rejected(&self) -> &[RejectedRow] {
        &self.rejected
    }

    /// Logical `(rows, columns)` shape, counting rejected rows.
    pub const fn shape(&self) -> (usize, usize) {
        (self.requested, self.num_references + DISTORTION_COLUMNS)
    }

    /// Zero the columns of every disabled distortion. Weights, seeds and
    /// enabled columns are left exactly as sampled.
    pub fn with_distortions(mut self, toggles: DistortionToggles) -> Self {
        for row in &mut self.rows {
            if !toggles.broaden {
                row.fwhm = 0.0;
            }
            if !toggles.shift {
                row.shift_x = 0.0;
            }
            if !toggles.noise {
                row.snr = 0.0;
            }
        }
        self.toggles = DistortionToggles {
            broaden: self.toggles.broaden && toggles.broaden,
            shift: self.toggles.shift && toggles.shift,
            noise: self.toggles.noise && toggles.noise,
        };
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterSampler {
    settings: SamplerSettings,
}

/// Counts outside `1..=MAX_SIMULATION_COUNT` are rejected before any row
/// storage is reserved.
pub fn validate_simulation_count(count: usize) -> XpsResult<()> {
    if count == 0 {
        return Err(XpsError::configuration(
            "CONFIG.SIMULATION_COUNT",
            "simulation count must be positive",
        ));
    }
    if count > MAX_SIMULATION_COUNT {
        return Err(XpsError::configuration(
            "CONFIG.SIMULATION_COUNT",
            format!("simulation count {count} exceeds the limit of {MAX_SIMULATION_COUNT}"),
        ));
    }
    Ok(())
}

impl ParameterSampler {
    pub fn new(settings: SamplerSettings) -> XpsResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn sample(
        &self,
        count: usize,
        num_references: usize,
        mode: SimulationMode,
    ) -> XpsResult<AugmentationMatrix> {
        validate_simulation_count(count)?;
        if num_references == 0 {
            return Err(XpsError::configuration(
                "CONFIG.REFERENCES_EMPTY",
                "at least one reference spectrum is required",
            ));
        }

        let floor = self.settings.weight_floor;
        if mode == SimulationMode::Combination
            && num_references > 1
            && floor * num_references as f64 >= 1.0
        {
            warn!(
                num_references,
                floor, "weight floor cannot be met; rows will exhaust the retry cap"
            );
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed);
        let mut rows = Vec::with_capacity(count);
        let mut rejected = Vec::new();

        for index in 0..count {
            let weights = match mode {
                SimulationMode::Combination => draw_floored_weights(
                    &mut rng,
                    num_references,
                    floor,
                    self.settings.max_attempts,
                ),
                SimulationMode::Single => {
                    let chosen = rng.gen_range(0..num_references);
                    let mut one_hot = vec![0.0; num_references];
                    one_hot[chosen] = 1.0;
                    Ok(FlooredWeights {
                        weights: one_hot,
                        attempts: 0,
                    })
                }
            };

            let fwhm = rng.gen_range(FWHM_RANGE) as f64;
            let shift_x = rng.gen_range(SHIFT_RANGE) as f64;
            let snr = rng.gen_range(SNR_RANGE) as f64;
            let noise_seed = rng.r#gen::<u64>();

            match weights {
                Ok(drawn) => {
                    if drawn.attempts > 1 {
                        debug!(row = index, attempts = drawn.attempts, "weight row redrawn");
                    }
                    rows.push(AugmentationRow {
                        index,
                        weights: drawn.weights,
                        fwhm,
                        shift_x,
                        snr,
                        noise_seed,
                        attempts: drawn.attempts,
                    });
                }
                Err(exhausted) => {
                    warn!(row = index, attempts = exhausted.attempts, "weight floor exhausted");
                    rejected.push(RejectedRow {
                        index,
                        attempts: exhausted.attempts,
                    });
                }
            }
        }

        info!(
            requested = count,
            sampled = rows.len(),
            rejected = rejected.len(),
            %mode,
            seed = self.settings.seed,
            "augmentation matrix sampled"
        );

        Ok(AugmentationMatrix {
            mode,
            num_references,
            requested: count,
            toggles: DistortionToggles::all_enabled(),
            rows,
            rejected,
        })
    }
}
