//! Class-imbalance correction for the training set.
//!
//! Survey corpora are small and skewed toward the negative class. Two
//! corrections are supported, selected by the training profile: minority
//! oversampling before fitting, or inverse-frequency sample weights during
//! fitting. Exactly one strategy is active per trained artifact.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ml::forest::LabeledSample;

/// How a training run corrects class imbalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStrategy {
    /// Resample the minority class with replacement until counts match.
    Oversample,
    /// Keep the set as-is and weight samples inversely to class frequency.
    ClassWeight,
}

impl std::fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceStrategy::Oversample => write!(f, "oversample"),
            BalanceStrategy::ClassWeight => write!(f, "class_weight"),
        }
    }
}

/// Oversample the minority class until both classes have equal counts.
///
/// Majority-class rows are carried over verbatim; the minority class is
/// replaced by `majority_count` draws with replacement from its own rows.
/// The output size is `2 × majority_count`. Resampling uses the caller's
/// seeded RNG so a training run is reproducible.
///
/// Callers must ensure both classes are present; an already-balanced set is
/// returned unchanged.
pub fn oversample<R: Rng>(samples: &[LabeledSample], rng: &mut R) -> Vec<LabeledSample> {
    let positives: Vec<&LabeledSample> = samples.iter().filter(|s| s.label == 1).collect();
    let negatives: Vec<&LabeledSample> = samples.iter().filter(|s| s.label == 0).collect();

    if positives.len() == negatives.len() {
        return samples.to_vec();
    }

    let (majority, minority) = if negatives.len() > positives.len() {
        (negatives, positives)
    } else {
        (positives, negatives)
    };

    let mut balanced: Vec<LabeledSample> = majority.into_iter().cloned().collect();
    for _ in 0..balanced.len() {
        let pick = rng.random_range(0..minority.len());
        balanced.push(minority[pick].clone());
    }
    balanced
}

/// Inverse-frequency class weights: `n / (n_classes · count_c)`.
pub fn class_weights(samples: &[LabeledSample]) -> [f64; 2] {
    let n = samples.len() as f64;
    let positives = samples.iter().filter(|s| s.label == 1).count() as f64;
    let negatives = n - positives;
    [n / (2.0 * negatives), n / (2.0 * positives)]
}

/// Per-sample weights under the class-weighting strategy.
pub fn sample_weights(samples: &[LabeledSample]) -> Vec<f64> {
    let weights = class_weights(samples);
    samples.iter().map(|s| weights[s.label.min(1)]).collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn sample(label: usize, tag: u32) -> LabeledSample {
        LabeledSample {
            features: vec![tag, label as u32],
            label,
        }
    }

    fn imbalanced_set() -> Vec<LabeledSample> {
        // 8 negatives, 2 positives (20% positive rate).
        let mut samples: Vec<LabeledSample> = (0..8).map(|i| sample(0, i)).collect();
        samples.push(sample(1, 100));
        samples.push(sample(1, 101));
        samples
    }

    #[test]
    fn test_oversample_equalizes_counts() {
        let samples = imbalanced_set();
        let mut rng = StdRng::seed_from_u64(7);
        let balanced = oversample(&samples, &mut rng);

        let positives = balanced.iter().filter(|s| s.label == 1).count();
        let negatives = balanced.iter().filter(|s| s.label == 0).count();
        assert_eq!(positives, negatives);
        assert_eq!(balanced.len(), 16); // 2 × majority_count
    }

    #[test]
    fn test_oversample_keeps_majority_verbatim() {
        let samples = imbalanced_set();
        let mut rng = StdRng::seed_from_u64(7);
        let balanced = oversample(&samples, &mut rng);

        let original_negatives: Vec<&LabeledSample> =
            samples.iter().filter(|s| s.label == 0).collect();
        let balanced_negatives: Vec<&LabeledSample> =
            balanced.iter().filter(|s| s.label == 0).collect();
        assert_eq!(balanced_negatives.len(), original_negatives.len());
        for (a, b) in original_negatives.iter().zip(&balanced_negatives) {
            assert_eq!(a.features, b.features);
        }
    }

    #[test]
    fn test_oversample_is_seed_reproducible() {
        let samples = imbalanced_set();
        let a = oversample(&samples, &mut StdRng::seed_from_u64(38));
        let b = oversample(&samples, &mut StdRng::seed_from_u64(38));
        assert_eq!(
            a.iter().map(|s| s.features.clone()).collect::<Vec<_>>(),
            b.iter().map(|s| s.features.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_balanced_set_is_untouched() {
        let samples = vec![sample(0, 1), sample(1, 2)];
        let mut rng = StdRng::seed_from_u64(7);
        let balanced = oversample(&samples, &mut rng);
        assert_eq!(balanced.len(), 2);
    }

    #[test]
    fn test_class_weights_are_inverse_frequency() {
        let samples = imbalanced_set();
        let [w0, w1] = class_weights(&samples);
        // 10 / (2·8) and 10 / (2·2)
        assert!((w0 - 0.625).abs() < 1e-12);
        assert!((w1 - 2.5).abs() < 1e-12);

        let weights = sample_weights(&samples);
        assert_eq!(weights.len(), samples.len());
        assert!((weights[0] - w0).abs() < 1e-12);
        assert!((weights[9] - w1).abs() < 1e-12);
    }
}
