//! Evaluation metrics and cross-validated scoring.
//!
//! Scores are reported honestly for a fixed seed: there is no searching
//! across seeds or folds for a favorable split. Balancing is applied inside
//! each training fold only, so test folds keep the corpus's real class
//! distribution.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ml::balance::{BalanceStrategy, oversample, sample_weights};
use crate::ml::forest::{LabeledSample, MIN_TRAINING_SAMPLES, RandomForest};
use crate::ml::{ModelError, TrainingConfig};

/// Classification quality on one evaluation set.
///
/// Precision, recall, and F1 are for the positive (disease) class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-fold and averaged cross-validation scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidation {
    pub folds: Vec<EvalMetrics>,
    pub mean_accuracy: f64,
    pub mean_f1: f64,
}

/// Score predictions against true labels.
pub fn evaluate(predictions: &[usize], labels: &[usize]) -> EvalMetrics {
    debug_assert_eq!(predictions.len(), labels.len());
    let mut tp = 0.0f64;
    let mut fp = 0.0f64;
    let mut tn = 0.0f64;
    let mut fneg = 0.0f64;
    for (&pred, &label) in predictions.iter().zip(labels) {
        match (pred, label) {
            (1, 1) => tp += 1.0,
            (1, 0) => fp += 1.0,
            (0, 0) => tn += 1.0,
            _ => fneg += 1.0,
        }
    }
    let total = tp + fp + tn + fneg;
    let accuracy = if total == 0.0 { 0.0 } else { (tp + tn) / total };
    let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
    let recall = if tp + fneg == 0.0 { 0.0 } else { tp / (tp + fneg) };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    EvalMetrics {
        accuracy,
        precision,
        recall,
        f1,
    }
}

/// Assign sample indices to `k` stratified folds.
///
/// Indices are shuffled per class with a seeded RNG and dealt round-robin,
/// so every fold keeps roughly the corpus's class ratio and the assignment
/// is reproducible.
pub fn stratified_folds(labels: &[usize], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];
    for class in [0usize, 1] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);
        for (pos, idx) in members.into_iter().enumerate() {
            folds[pos % k].push(idx);
        }
    }
    folds
}

/// Stratified k-fold cross-validation of a training configuration.
///
/// Each fold trains on the remaining samples, balanced per the
/// configuration's strategy, and is scored on the held-out fold.
pub fn cross_validate(
    samples: &[LabeledSample],
    config: &TrainingConfig,
) -> Result<CrossValidation, ModelError> {
    if samples.len() < MIN_TRAINING_SAMPLES {
        return Err(ModelError::InsufficientTrainingData {
            min_samples: MIN_TRAINING_SAMPLES,
            actual: samples.len(),
        });
    }
    let labels: Vec<usize> = samples.iter().map(|s| s.label).collect();
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let minority = positives.min(labels.len() - positives);
    // Every fold's training partition must keep both classes.
    if minority < 2 {
        return Err(ModelError::SingleClass);
    }
    let k = config.cv_folds.clamp(2, minority);
    let folds = stratified_folds(&labels, k, config.seed);

    let mut fold_metrics = Vec::with_capacity(k);
    for (fold_idx, test_indices) in folds.iter().enumerate() {
        let train: Vec<LabeledSample> = folds
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != fold_idx)
            .flat_map(|(_, fold)| fold.iter().map(|&i| samples[i].clone()))
            .collect();

        let forest = match config.balance {
            BalanceStrategy::Oversample => {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(fold_idx as u64));
                let balanced = oversample(&train, &mut rng);
                RandomForest::fit(&balanced, None, config)?
            }
            BalanceStrategy::ClassWeight => {
                let weights = sample_weights(&train);
                RandomForest::fit(&train, Some(&weights), config)?
            }
        };

        let mut predictions = Vec::with_capacity(test_indices.len());
        let mut truth = Vec::with_capacity(test_indices.len());
        for &i in test_indices {
            predictions.push(forest.predict(&samples[i].features)?);
            truth.push(samples[i].label);
        }
        fold_metrics.push(evaluate(&predictions, &truth));
    }

    let mean_accuracy =
        fold_metrics.iter().map(|m| m.accuracy).sum::<f64>() / fold_metrics.len() as f64;
    let mean_f1 = fold_metrics.iter().map(|m| m.f1).sum::<f64>() / fold_metrics.len() as f64;
    Ok(CrossValidation {
        folds: fold_metrics,
        mean_accuracy,
        mean_f1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_perfect_and_degenerate() {
        let perfect = evaluate(&[0, 1, 1, 0], &[0, 1, 1, 0]);
        assert_eq!(perfect.accuracy, 1.0);
        assert_eq!(perfect.f1, 1.0);

        // Never predicting the positive class gives zero recall and F1.
        let silent = evaluate(&[0, 0, 0, 0], &[0, 0, 1, 1]);
        assert_eq!(silent.accuracy, 0.5);
        assert_eq!(silent.recall, 0.0);
        assert_eq!(silent.f1, 0.0);
    }

    #[test]
    fn test_stratified_folds_cover_all_indices() {
        let labels = vec![0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 1, 0];
        let folds = stratified_folds(&labels, 3, 42);
        assert_eq!(folds.len(), 3);
        let mut seen: Vec<usize> = folds.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..labels.len()).collect::<Vec<_>>());
        // Each fold holds at least one positive (4 positives over 3 folds).
        for fold in &folds {
            assert!(fold.iter().any(|&i| labels[i] == 1));
        }
    }

    #[test]
    fn test_stratified_folds_are_seed_reproducible() {
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1];
        assert_eq!(
            stratified_folds(&labels, 4, 9),
            stratified_folds(&labels, 4, 9)
        );
    }

    #[test]
    fn test_cross_validate_scores_separable_data() {
        // Label is determined by the first feature; both profiles should
        // recover it almost perfectly.
        let samples: Vec<LabeledSample> = (0..40)
            .map(|i| LabeledSample {
                features: vec![(i % 2) as u32 * 3, (i % 5) as u32, 1],
                label: i % 2,
            })
            .collect();
        let mut config = TrainingConfig::standard();
        config.n_trees = 25;
        let cv = cross_validate(&samples, &config).unwrap();
        assert_eq!(cv.folds.len(), config.cv_folds);
        assert!(cv.mean_accuracy > 0.9, "accuracy {}", cv.mean_accuracy);
        assert!(cv.mean_f1 > 0.9, "f1 {}", cv.mean_f1);
    }

    #[test]
    fn test_cross_validate_rejects_single_class() {
        let samples: Vec<LabeledSample> = (0..20)
            .map(|i| LabeledSample {
                features: vec![i as u32],
                label: 0,
            })
            .collect();
        let err = cross_validate(&samples, &TrainingConfig::standard()).unwrap_err();
        assert!(matches!(err, ModelError::SingleClass));
    }
}
