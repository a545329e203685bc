//! Decision trees and the bagged ensemble risk classifier.
//!
//! Each tree trains on a bootstrap resample of the training rows and draws
//! a random subset of candidate features at every split; the ensemble
//! averages per-tree class distributions into `[p0, p1]`. Per-tree RNGs are
//! derived from the base seed and the tree index, so a fit is deterministic
//! for a given seed and input order no matter how rayon schedules the work.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ml::{ModelError, TrainingConfig};
use crate::ml::encoder::FeatureVector;

/// Fewest rows a forest will train on.
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Decorrelates per-tree seeds derived from the base seed.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// One encoded training row: a feature vector and its binary label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    /// Integer-coded answers, in feature-column order.
    pub features: FeatureVector,
    /// 1 for a positive disease indication, 0 otherwise.
    pub label: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode {
    /// Feature index for split (-1 for leaf).
    feature_idx: i32,
    /// Threshold value for split.
    threshold: f64,
    /// Class distribution at this node (leaves carry the prediction).
    distribution: [f64; 2],
    /// Left child (feature value <= threshold).
    left: Option<Box<TreeNode>>,
    /// Right child.
    right: Option<Box<TreeNode>>,
}

/// A single CART-style classification tree over integer-coded features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<Box<TreeNode>>,
}

/// Split-search limits shared by every node of one tree.
struct SplitParams {
    max_depth: usize,
    min_samples_leaf: usize,
    min_samples_split: usize,
    candidate_features: usize,
}

impl DecisionTree {
    /// Fit a tree on the given rows.
    ///
    /// `weights` carries one weight per sample (class weighting); pass
    /// uniform weights when the set was balanced by resampling instead.
    fn fit(
        samples: &[LabeledSample],
        weights: &[f64],
        indices: &[usize],
        params: &SplitParams,
        rng: &mut StdRng,
    ) -> Self {
        let root = Self::build_node(samples, weights, indices, 0, params, rng);
        Self { root: Some(Box::new(root)) }
    }

    /// Class distribution for a feature vector.
    fn predict_proba(&self, features: &[u32]) -> [f64; 2] {
        let mut node = match &self.root {
            Some(root) => root.as_ref(),
            None => return [0.5, 0.5],
        };
        loop {
            if node.feature_idx < 0 {
                return node.distribution;
            }
            let value = features[node.feature_idx as usize] as f64;
            let child = if value <= node.threshold {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
            match child {
                Some(next) => node = next,
                None => return node.distribution,
            }
        }
    }

    fn build_node(
        samples: &[LabeledSample],
        weights: &[f64],
        indices: &[usize],
        depth: usize,
        params: &SplitParams,
        rng: &mut StdRng,
    ) -> TreeNode {
        let (distribution, impurity) = weighted_distribution(samples, weights, indices);

        let must_stop = depth >= params.max_depth
            || indices.len() < params.min_samples_split
            || impurity == 0.0;
        if must_stop {
            return leaf(distribution);
        }

        let split = Self::find_best_split(samples, weights, indices, impurity, params, rng);
        match split {
            Some((feature_idx, threshold, left_indices, right_indices)) => {
                let left = Self::build_node(samples, weights, &left_indices, depth + 1, params, rng);
                let right =
                    Self::build_node(samples, weights, &right_indices, depth + 1, params, rng);
                TreeNode {
                    feature_idx: feature_idx as i32,
                    threshold,
                    distribution,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                }
            }
            None => leaf(distribution),
        }
    }

    /// Scan a random feature subset for the split with the largest weighted
    /// Gini decrease. Returns `None` when no split satisfies the leaf-size
    /// constraint or every candidate feature is constant.
    fn find_best_split(
        samples: &[LabeledSample],
        weights: &[f64],
        indices: &[usize],
        parent_impurity: f64,
        params: &SplitParams,
        rng: &mut StdRng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
        let n_features = samples[indices[0]].features.len();
        let n_candidates = params.candidate_features.min(n_features);
        let candidates = rand::seq::index::sample(rng, n_features, n_candidates);

        let total_weight: f64 = indices.iter().map(|&i| weights[i]).sum();
        let mut class_totals = [0.0f64; 2];
        for &i in indices {
            class_totals[samples[i].label] += weights[i];
        }

        let mut best_gain = 0.0f64;
        let mut best: Option<(usize, f64)> = None;

        for feature_idx in candidates.iter() {
            let mut ordered: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (samples[i].features[feature_idx] as f64, i))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_weight = 0.0f64;
            let mut left_classes = [0.0f64; 2];
            for pos in 1..ordered.len() {
                let (value, idx) = ordered[pos - 1];
                left_weight += weights[idx];
                left_classes[samples[idx].label] += weights[idx];

                if value == ordered[pos].0 {
                    continue;
                }
                if pos < params.min_samples_leaf
                    || ordered.len() - pos < params.min_samples_leaf
                {
                    continue;
                }

                let right_weight = total_weight - left_weight;
                let right_classes = [
                    class_totals[0] - left_classes[0],
                    class_totals[1] - left_classes[1],
                ];
                let weighted_child_impurity = (left_weight / total_weight)
                    * gini(&left_classes, left_weight)
                    + (right_weight / total_weight) * gini(&right_classes, right_weight);
                let gain = parent_impurity - weighted_child_impurity;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, (value + ordered[pos].0) / 2.0));
                }
            }
        }

        let (feature_idx, threshold) = best?;
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| (samples[i].features[feature_idx] as f64) <= threshold);
        Some((feature_idx, threshold, left_indices, right_indices))
    }
}

fn leaf(distribution: [f64; 2]) -> TreeNode {
    TreeNode {
        feature_idx: -1,
        threshold: 0.0,
        distribution,
        left: None,
        right: None,
    }
}

/// Normalized weighted class distribution and its Gini impurity.
fn weighted_distribution(
    samples: &[LabeledSample],
    weights: &[f64],
    indices: &[usize],
) -> ([f64; 2], f64) {
    let mut class_weights = [0.0f64; 2];
    for &i in indices {
        class_weights[samples[i].label] += weights[i];
    }
    let total: f64 = class_weights[0] + class_weights[1];
    if total == 0.0 {
        return ([0.5, 0.5], 0.0);
    }
    let distribution = [class_weights[0] / total, class_weights[1] / total];
    (distribution, gini(&class_weights, total))
}

/// Gini impurity of a weighted class count pair.
fn gini(class_weights: &[f64; 2], total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    let p0 = class_weights[0] / total;
    let p1 = class_weights[1] / total;
    1.0 - p0 * p0 - p1 * p1
}

/// A bagged ensemble of decision trees producing class-1 probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Train the ensemble.
    ///
    /// Deterministic for a fixed seed and a fixed sample ordering. Trees
    /// are fitted in parallel; each draws its bootstrap and feature subsets
    /// from its own seed-derived RNG.
    pub fn fit(
        samples: &[LabeledSample],
        sample_weights: Option<&[f64]>,
        config: &TrainingConfig,
    ) -> Result<Self, ModelError> {
        if samples.len() < MIN_TRAINING_SAMPLES {
            return Err(ModelError::InsufficientTrainingData {
                min_samples: MIN_TRAINING_SAMPLES,
                actual: samples.len(),
            });
        }
        let n_features = samples[0].features.len();
        for sample in samples {
            if sample.features.len() != n_features {
                return Err(ModelError::FeatureCountMismatch {
                    expected: n_features,
                    actual: sample.features.len(),
                });
            }
        }
        if samples.iter().all(|s| s.label == 0) || samples.iter().all(|s| s.label == 1) {
            return Err(ModelError::SingleClass);
        }

        let uniform;
        let weights: &[f64] = match sample_weights {
            Some(w) => {
                if w.len() != samples.len() {
                    return Err(ModelError::FeatureCountMismatch {
                        expected: samples.len(),
                        actual: w.len(),
                    });
                }
                w
            }
            None => {
                uniform = vec![1.0; samples.len()];
                &uniform
            }
        };

        let params = SplitParams {
            max_depth: config.max_depth.unwrap_or(usize::MAX),
            min_samples_leaf: config.min_samples_leaf.max(1),
            min_samples_split: config.min_samples_split.max(2),
            candidate_features: (n_features as f64).sqrt().ceil() as usize,
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|tree_idx| {
                let tree_seed = config.seed ^ (tree_idx as u64).wrapping_mul(SEED_STRIDE);
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let bootstrap: Vec<usize> = (0..samples.len())
                    .map(|_| rng.random_range(0..samples.len()))
                    .collect();
                DecisionTree::fit(samples, weights, &bootstrap, &params, &mut rng)
            })
            .collect();

        Ok(Self { trees, n_features })
    }

    /// Class-membership probabilities `[p0, p1]` for a feature vector.
    ///
    /// Averages per-tree leaf distributions; the result always sums to 1.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::ModelNotTrained {
                message: "forest has no trees".to_string(),
            });
        }
        if features.len() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut sums = [0.0f64; 2];
        for tree in &self.trees {
            let dist = tree.predict_proba(features);
            sums[0] += dist[0];
            sums[1] += dist[1];
        }
        let total = sums[0] + sums[1];
        Ok([sums[0] / total, sums[1] / total])
    }

    /// Predicted class for a feature vector (probability argmax).
    pub fn predict(&self, features: &FeatureVector) -> Result<usize, ModelError> {
        let proba = self.predict_proba(features)?;
        Ok(usize::from(proba[1] >= proba[0]))
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Expected feature-vector length.
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
