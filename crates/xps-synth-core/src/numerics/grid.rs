//! Uniform energy grids and regularization of lab-exported samples.
//!
//! Lab exports occasionally drop samples or carry rounded energies, which
//! leaves an axis that is only nearly uniform. Regularization resamples such
//! axes by linear interpolation onto `start + j * step`, where the step is the
//! smallest positive spacing in the data. Gaps of ten steps or more separate
//! measurement segments and are never bridged.

use super::interpolate_between;
use serde::{Deserialize, Serialize};

/// Allowed deviation of any spacing from the canonical step, as a fraction of the step.
pub const GRID_RELATIVE_TOLERANCE: f64 = 1.0e-3;

/// Gaps of this many canonical steps or more are segment boundaries and are not interpolated.
pub const SEGMENT_BOUNDARY_GAP: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("energy grid requires at least 2 points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("sample length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("sample value must be finite at index {index}, got {value}")]
    NonFinite { index: usize, value: f64 },
    #[error("energy axis must be strictly monotonic, index {index} has {current} after {previous}")]
    NonMonotonic {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("energy grid step must be finite and > 0, got {value}")]
    InvalidStep { value: f64 },
    #[error("energy spacing at index {index} is {actual}, expected uniform step {expected}")]
    IrregularStep {
        index: usize,
        expected: f64,
        actual: f64,
    },
    #[error("energy gap of {gap} before index {index} spans at least 10 steps of {step}")]
    SegmentBoundary { index: usize, gap: f64, step: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyGrid {
    start: f64,
    step: f64,
    len: usize,
}

impl EnergyGrid {
    pub fn new(start: f64, step: f64, len: usize) -> Result<Self, GridError> {
        if len < 2 {
            return Err(GridError::InsufficientPoints { actual: len });
        }
        if !start.is_finite() {
            return Err(GridError::NonFinite {
                index: 0,
                value: start,
            });
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(GridError::InvalidStep { value: step });
        }

        Ok(Self { start, step, len })
    }

    /// Recognize an already-uniform, strictly increasing axis.
    pub fn from_points(points: &[f64]) -> Result<Self, GridError> {
        validate_axis(points)?;
        let step = (points[points.len() - 1] - points[0]) / (points.len() - 1) as f64;
        for (index, window) in points.windows(2).enumerate() {
            let spacing = window[1] - window[0];
            if (spacing - step).abs() > GRID_RELATIVE_TOLERANCE * step {
                return Err(GridError::IrregularStep {
                    index: index + 1,
                    expected: step,
                    actual: spacing,
                });
            }
        }

        Self::new(points[0], step, points.len())
    }

    pub const fn start(&self) -> f64 {
        self.start
    }

    pub const fn step(&self) -> f64 {
        self.step
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stop(&self) -> f64 {
        self.start + self.step * (self.len - 1) as f64
    }

    pub fn points(&self) -> Vec<f64> {
        (0..self.len)
            .map(|index| self.start + self.step * index as f64)
            .collect()
    }

    /// Same length, and both end points agree within a fraction of a step.
    pub fn matches(&self, other: &EnergyGrid) -> bool {
        let tolerance = GRID_RELATIVE_TOLERANCE * self.step.min(other.step);
        self.len == other.len
            && (self.start - other.start).abs() <= tolerance
            && (self.stop() - other.stop()).abs() <= tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegularizedSamples {
    pub grid: EnergyGrid,
    pub y: Vec<f64>,
    pub interpolated_points: usize,
}

impl RegularizedSamples {
    pub fn x(&self) -> Vec<f64> {
        self.grid.points()
    }
}

pub fn regularize_samples(x: &[f64], y: &[f64]) -> Result<RegularizedSamples, GridError> {
    if x.len() != y.len() {
        return Err(GridError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(GridError::InsufficientPoints { actual: x.len() });
    }
    for (index, value) in y.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(GridError::NonFinite { index, value });
        }
    }

    // Binding-energy exports run high to low.
    let (x, y): (Vec<f64>, Vec<f64>) = if x[0] > x[x.len() - 1] {
        (x.iter().rev().copied().collect(), y.iter().rev().copied().collect())
    } else {
        (x.to_vec(), y.to_vec())
    };
    validate_axis(&x)?;

    let step = x
        .windows(2)
        .map(|window| window[1] - window[0])
        .fold(f64::INFINITY, f64::min);
    if let Some((index, gap)) = x
        .windows(2)
        .map(|window| window[1] - window[0])
        .enumerate()
        .find(|(_, gap)| gap / step >= SEGMENT_BOUNDARY_GAP)
    {
        return Err(GridError::SegmentBoundary {
            index: index + 1,
            gap,
            step,
        });
    }

    if let Ok(grid) = EnergyGrid::from_points(&x) {
        return Ok(RegularizedSamples {
            grid,
            y,
            interpolated_points: 0,
        });
    }

    let span = x[x.len() - 1] - x[0];
    let intervals = (span / step + GRID_RELATIVE_TOLERANCE).floor() as usize;
    let grid = EnergyGrid::new(x[0], step, intervals + 1)?;
    let (resampled, interpolated_points) = resample_onto(&x, &y, &grid);
    Ok(RegularizedSamples {
        grid,
        y: resampled,
        interpolated_points,
    })
}

/// Linear interpolation of `(x, y)` at every grid point. Returns the values
/// and how many grid points fall between samples rather than on one.
fn resample_onto(x: &[f64], y: &[f64], grid: &EnergyGrid) -> (Vec<f64>, usize) {
    let tolerance = GRID_RELATIVE_TOLERANCE * grid.step();
    let mut values = Vec::with_capacity(grid.len());
    let mut interpolated = 0;
    let mut lower = 0;

    for target in grid.points() {
        while lower + 2 < x.len() && x[lower + 1] < target {
            lower += 1;
        }
        let upper = lower + 1;
        let on_sample = (target - x[lower]).abs() <= tolerance
            || (target - x[upper]).abs() <= tolerance;
        if !on_sample {
            interpolated += 1;
        }
        values.push(interpolate_between(
            x[lower], y[lower], x[upper], y[upper], target,
        ));
    }

    (values, interpolated)
}

fn validate_axis(points: &[f64]) -> Result<(), GridError> {
    if points.len() < 2 {
        return Err(GridError::InsufficientPoints {
            actual: points.len(),
        });
    }

    for (index, value) in points.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(GridError::NonFinite { index, value });
        }
        if index > 0 {
            let previous = points[index - 1];
            if value <= previous {
                return Err(GridError::NonMonotonic {
                    index,
                    previous,
                    current: value,
                });
            }
        }
    }

    Ok(())
}
