use crate::numerics::stable_sum;
use rand::Rng;
use rand::distributions::{Distribution, Uniform};

/// Upper (exclusive) bound of the raw weight draws; the lower bound is the floor.
pub const WEIGHT_DRAW_CEILING: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FlooredWeights {
    pub weights: Vec<f64>,
    /// Number of whole-row draws used. Zero when no draw was needed.
    pub attempts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("weight floor not satisfied after {attempts} attempts")]
pub struct WeightFloorExhausted {
    pub attempts: usize,
}

/// Draw `count` weights uniformly in `[floor, 1.0)`, normalize them to unit sum
/// and redraw the whole row until every normalized weight is at least `floor`.
pub fn draw_floored_weights<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    floor: f64,
    max_attempts: usize,
) -> Result<FlooredWeights, WeightFloorExhausted> {
    if count == 1 {
        return Ok(FlooredWeights {
            weights: vec![1.0],
            attempts: 0,
        });
    }

    let distribution = Uniform::new(floor, WEIGHT_DRAW_CEILING);
    let mut raw = vec![0.0; count];
    for attempt in 1..=max_attempts {
        for value in &mut raw {
            *value = distribution.sample(rng);
        }
        let total = stable_sum(&raw);
        let weights: Vec<f64> = raw.iter().map(|value| value / total).collect();

        if weights.iter().all(|weight| *weight >= floor) {
            return Ok(FlooredWeights { weights, attempts: attempt });
        }
    }

    Err(WeightFloorExhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::{WeightFloorExhausted, draw_floored_weights};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn single_weight_skips_the_rejection_loop() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let drawn = draw_floored_weights(&mut rng, 1, 0.1, 5).expect("single weight");
        assert_eq!(drawn.weights, vec![1.0]);
        assert_eq!(drawn.attempts, 0);
    }

    #[test]
    fn unsatisfiable_floor_reports_exhaustion() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let error = draw_floored_weights(&mut rng, 12, 0.1, 25).expect_err("12 x 0.1 > 1");
        assert_eq!(error, WeightFloorExhausted { attempts: 25 });
    }

    #[test]
    fn drawn_weights_respect_the_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            let drawn = draw_floored_weights(&mut rng, 4, 0.1, 10_000).expect("weights");
            assert!(drawn.attempts >= 1);
            assert!(drawn.weights.iter().all(|weight| *weight >= 0.1));
            let total: f64 = drawn.weights.iter().sum();
            assert!((total - 1.0).abs() < 1.0e-6);
        }
    }
}
