pub mod broadening;
pub mod grid;

pub use broadening::{
    BroadeningError, GaussianBroadeningInput, GaussianKernel, KERNEL_SIGMA_SPAN,
    broaden_gaussian, fwhm_to_sigma,
};
pub use grid::{
    EnergyGrid, GRID_RELATIVE_TOLERANCE, GridError, RegularizedSamples, SEGMENT_BOUNDARY_GAP,
    regularize_samples,
};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn stable_weighted_sum(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.len() != weights.len() {
        return None;
    }

    let mut sum = 0.0;
    let mut correction = 0.0;
    for (&value, &weight) in values.iter().zip(weights) {
        kahan_add(&mut sum, &mut correction, value * weight);
    }

    Some(sum)
}

/// Arithmetic mean and population standard deviation.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let count = values.len() as f64;
    let mean = stable_sum(values) / count;
    let squared: Vec<f64> = values.iter().map(|value| (value - mean).powi(2)).collect();
    Some((mean, (stable_sum(&squared) / count).sqrt()))
}

pub fn interpolate_between(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 == x0 {
        return y1;
    }
    let fraction = (x - x0) / (x1 - x0);
    y0 + (y1 - y0) * fraction
}

pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
