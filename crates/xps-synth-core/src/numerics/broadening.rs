use std::f64::consts::LN_2;

/// Kernel half-width in standard deviations; ±3σ keeps 99.73% of the mass.
pub const KERNEL_SIGMA_SPAN: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBroadeningInput<'a> {
    pub spectrum: &'a [f64],
    /// Full width at half maximum, in grid steps.
    pub fwhm_steps: f64,
}

impl<'a> GaussianBroadeningInput<'a> {
    pub fn new(spectrum: &'a [f64], fwhm_steps: f64) -> Self {
        Self {
            spectrum,
            fwhm_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BroadeningError {
    #[error("broadening requires at least 2 spectrum points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("spectrum value must be finite at index {index}, got {value}")]
    NonFiniteSpectrum { index: usize, value: f64 },
    #[error("gaussian FWHM must be finite and > 0, got {value}")]
    InvalidFwhm { value: f64 },
}

pub fn fwhm_to_sigma(fwhm: f64) -> f64 {
    fwhm / (2.0 * (2.0 * LN_2).sqrt())
}

/// Discrete Gaussian sampled at integer grid offsets `-half_width..=half_width`,
/// normalized to unit sum.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    weights: Vec<f64>,
    half_width: usize,
}

impl GaussianKernel {
    pub fn new(fwhm_steps: f64) -> Result<Self, BroadeningError> {
        if !fwhm_steps.is_finite() || fwhm_steps <= 0.0 {
            return Err(BroadeningError::InvalidFwhm { value: fwhm_steps });
        }

        let sigma = fwhm_to_sigma(fwhm_steps);
        let half_width = (KERNEL_SIGMA_SPAN * sigma).ceil() as usize;
        let mut weights: Vec<f64> = (0..=2 * half_width)
            .map(|index| {
                let offset = index as f64 - half_width as f64;
                (-0.5 * (offset / sigma).powi(2)).exp()
            })
            .collect();
        let total: f64 = weights.iter().sum();
        for weight in &mut weights {
            *weight /= total;
        }

        Ok(Self {
            weights,
            half_width,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub const fn half_width(&self) -> usize {
        self.half_width
    }

    /// Convolve without wrapping. Near the edges only the in-range part of the
    /// kernel is used and it is renormalized to unit sum.
    pub fn apply(&self, spectrum: &[f64]) -> Vec<f64> {
        let len = spectrum.len();
        let mut output = Vec::with_capacity(len);

        for target in 0..len {
            let first = target.saturating_sub(self.half_width);
            let last = (target + self.half_width).min(len - 1);

            let mut accumulated = 0.0;
            let mut used_weight = 0.0;
            for source in first..=last {
                let weight = self.weights[source + self.half_width - target];
                accumulated += weight * spectrum[source];
                used_weight += weight;
            }
            output.push(accumulated / used_weight);
        }

        output
    }
}

pub fn broaden_gaussian(input: GaussianBroadeningInput<'_>) -> Result<Vec<f64>, BroadeningError> {
    if input.spectrum.len() < 2 {
        return Err(BroadeningError::InsufficientPoints {
            actual: input.spectrum.len(),
        });
    }
    for (index, value) in input.spectrum.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(BroadeningError::NonFiniteSpectrum { index, value });
        }
    }

    let kernel = GaussianKernel::new(input.fwhm_steps)?;
    Ok(kernel.apply(input.spectrum))
}
