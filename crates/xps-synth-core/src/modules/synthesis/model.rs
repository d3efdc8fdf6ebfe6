use crate::domain::{ReferenceSpectrum, SynthesisResult, XpsError};
use crate::numerics::{GaussianBroadeningInput, broaden_gaussian, stable_weighted_sum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Weighted sum of the references on the run grid (the first reference's grid).
/// Only references with a non-zero weight have to share that grid.
pub fn combine_linear(
    references: &[ReferenceSpectrum],
    weights: &[f64],
) -> SynthesisResult<Vec<f64>> {
    let Some(canonical) = references.first() else {
        return Err(XpsError::configuration(
            "CONFIG.REFERENCES_EMPTY",
            "linear combination needs at least one reference spectrum",
        ));
    };
    if weights.len() != references.len() {
        return Err(XpsError::configuration(
            "CONFIG.WEIGHT_ROW_LENGTH",
            format!(
                "weight row has {} entries for {} references",
                weights.len(),
                references.len()
            ),
        ));
    }

    let participating: Vec<(&ReferenceSpectrum, f64)> = references
        .iter()
        .zip(weights.iter().copied())
        .filter(|(_, weight)| *weight != 0.0)
        .collect();

    if let Some((mismatched, _)) = participating
        .iter()
        .find(|(reference, _)| !reference.grid().matches(canonical.grid()))
    {
        return Err(XpsError::grid_mismatch(
            "RUN.GRID_MISMATCH",
            format!(
                "reference '{}' ({} points from {}) does not share the grid of '{}' ({} points from {})",
                mismatched.label(),
                mismatched.grid().len(),
                mismatched.grid().start(),
                canonical.label(),
                canonical.grid().len(),
                canonical.grid().start()
            ),
        ));
    }

    let participating_weights: Vec<f64> = participating.iter().map(|(_, weight)| *weight).collect();
    let mut column = vec![0.0; participating.len()];
    let mut combined = Vec::with_capacity(canonical.len());
    for index in 0..canonical.len() {
        for (slot, (reference, _)) in column.iter_mut().zip(&participating) {
            *slot = reference.y()[index];
        }
        let value = stable_weighted_sum(&column, &participating_weights).ok_or_else(|| {
            XpsError::internal("SYS.LINEAR_COMBINATION", "weight and intensity columns diverged")
        })?;
        combined.push(value);
    }

    Ok(combined)
}

pub fn broaden(spectrum: &[f64], fwhm_steps: f64) -> SynthesisResult<Vec<f64>> {
    broaden_gaussian(GaussianBroadeningInput::new(spectrum, fwhm_steps)).map_err(|source| {
        XpsError::configuration("CONFIG.BROADENING", format!("broadening rejected: {source}"))
    })
}

/// Move the intensity by `steps` grid points toward higher energy (negative
/// steps move it lower). Vacated samples repeat the nearest edge value.
pub fn shift_spectrum(spectrum: &[f64], steps: i64) -> Vec<f64> {
    if spectrum.is_empty() || steps == 0 {
        return spectrum.to_vec();
    }

    let last = spectrum.len() as i64 - 1;
    (0..spectrum.len() as i64)
        .map(|target| spectrum[(target - steps).clamp(0, last) as usize])
        .collect()
}

/// Additive Gaussian noise with standard deviation `(max - min) / snr`.
/// Returns the standard deviation used; zero when the spectrum is flat.
pub fn add_noise(spectrum: &mut [f64], snr: f64, seed: u64) -> f64 {
    let (low, high) = spectrum
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(*value), high.max(*value))
        });
    let height = high - low;
    if !height.is_finite() || height <= 0.0 {
        return 0.0;
    }

    let sigma = height / snr;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for value in spectrum.iter_mut() {
        let sample: f64 = StandardNormal.sample(&mut rng);
        *value += sigma * sample;
    }
    sigma
}

/// Divide by the maximum intensity. Returns the divisor, 1.0 when the
/// maximum is not a positive finite number.
pub fn normalize(spectrum: &mut [f64]) -> f64 {
    let peak = spectrum.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = if peak.is_finite() && peak > 0.0 { peak } else { 1.0 };
    for value in spectrum.iter_mut() {
        *value /= scale;
    }
    scale
}

#[cfg(test)]
mod tests {
    use super::{add_noise, combine_linear, normalize, shift_spectrum};
    use crate::domain::{ReferenceSpectrum, XpsErrorCategory};

    fn reference(label: &str, start: f64, y: Vec<f64>) -> ReferenceSpectrum {
        let x = (0..y.len()).map(|index| start + 0.5 * index as f64).collect();
        ReferenceSpectrum::new(label, x, y).expect("reference")
    }

    #[test]
    fn linear_combination_weights_each_reference() {
        let references = [
            reference("a", 0.0, vec![1.0, 0.0, 2.0]),
            reference("b", 0.0, vec![0.0, 4.0, 2.0]),
        ];
        let combined = combine_linear(&references, &[0.25, 0.75]).expect("combination");
        assert_eq!(combined, vec![0.25, 3.0, 2.0]);
    }

    #[test]
    fn zero_weight_references_do_not_need_the_run_grid() {
        let references = [
            reference("a", 0.0, vec![1.0, 2.0, 3.0]),
            reference("b", 100.0, vec![5.0, 5.0, 5.0, 5.0]),
        ];
        assert_eq!(
            combine_linear(&references, &[1.0, 0.0]).expect("one-hot"),
            vec![1.0, 2.0, 3.0]
        );

        let error = combine_linear(&references, &[0.5, 0.5]).expect_err("mismatch");
        assert_eq!(error.category(), XpsErrorCategory::GridMismatchError);
        assert_eq!(error.placeholder(), "RUN.GRID_MISMATCH");
    }

    #[test]
    fn shift_replicates_edge_values() {
        let spectrum = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(shift_spectrum(&spectrum, 2), vec![1.0, 1.0, 1.0, 2.0, 3.0]);
        assert_eq!(shift_spectrum(&spectrum, -2), vec![3.0, 4.0, 5.0, 5.0, 5.0]);
        assert_eq!(shift_spectrum(&spectrum, 0), spectrum.to_vec());
        assert_eq!(shift_spectrum(&spectrum, 9), vec![1.0; 5]);
    }

    #[test]
    fn noise_is_seeded_and_scaled_by_height() {
        let mut first = vec![0.0, 10.0, 0.0, 0.0];
        let mut second = first.clone();

        let sigma = add_noise(&mut first, 20.0, 77);
        add_noise(&mut second, 20.0, 77);
        assert_eq!(sigma, 0.5);
        assert_eq!(first, second);

        let mut flat = vec![2.0; 4];
        assert_eq!(add_noise(&mut flat, 20.0, 77), 0.0);
        assert_eq!(flat, vec![2.0; 4]);
    }

    #[test]
    fn normalization_reports_divisor() {
        let mut spectrum = vec![1.0, 4.0, 2.0];
        assert_eq!(normalize(&mut spectrum), 4.0);
        assert_eq!(spectrum, vec![0.25, 1.0, 0.5]);

        let mut negative = vec![-1.0, -2.0];
        assert_eq!(normalize(&mut negative), 1.0);
        assert_eq!(negative, vec![-1.0, -2.0]);
    }
}
