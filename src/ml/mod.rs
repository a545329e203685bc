//! The feature-encoding and risk-classification pipeline.
//!
//! Raw categorical answers are mapped to a stable integer feature space
//! ([`encoder`]), the training set is corrected for class imbalance
//! ([`balance`]), a bagged ensemble of decision trees is fitted
//! ([`forest`]), and the trained model plus its encoders are persisted as a
//! single artifact ([`artifact`]) that the inference service ([`predictor`])
//! loads once and shares read-only.

pub mod artifact;
pub mod balance;
pub mod encoder;
pub mod forest;
pub mod metrics;
pub mod predictor;
pub mod trainer;

pub use artifact::*;
pub use balance::*;
pub use encoder::*;
pub use forest::*;
pub use metrics::*;
pub use predictor::*;
pub use trainer::*;

use serde::{Deserialize, Serialize};

use crate::error::RespiraError;

/// Named training profiles.
///
/// The two variants reproduce the two configurations the model was tuned
/// under; the choice materially changes the persisted artifact's behavior,
/// so it is explicit configuration recorded in the artifact, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingProfile {
    /// 200 unbounded trees trained on an oversampled (class-balanced) set.
    Standard,
    /// 300 depth-capped trees with inverse-frequency class weights and no
    /// resampling.
    Robust,
}

impl std::fmt::Display for TrainingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainingProfile::Standard => write!(f, "standard"),
            TrainingProfile::Robust => write!(f, "robust"),
        }
    }
}

/// Hyperparameters for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Profile this configuration was derived from.
    pub profile: TrainingProfile,
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows trees until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples required in each leaf.
    pub min_samples_leaf: usize,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Class-imbalance correction strategy.
    pub balance: BalanceStrategy,
    /// Seed for bootstrap sampling, feature-subset draws, and oversampling.
    pub seed: u64,
    /// Folds for cross-validated evaluation.
    pub cv_folds: usize,
}

impl TrainingConfig {
    /// The oversampling profile with unbounded trees.
    pub fn standard() -> Self {
        Self {
            profile: TrainingProfile::Standard,
            n_trees: 200,
            max_depth: None,
            min_samples_leaf: 1,
            min_samples_split: 2,
            balance: BalanceStrategy::Oversample,
            seed: 38,
            cv_folds: 5,
        }
    }

    /// The depth-capped, class-weighted profile.
    pub fn robust() -> Self {
        Self {
            profile: TrainingProfile::Robust,
            n_trees: 300,
            max_depth: Some(6),
            min_samples_leaf: 3,
            min_samples_split: 2,
            balance: BalanceStrategy::ClassWeight,
            seed: 42,
            cv_folds: 5,
        }
    }

    /// Defaults for a named profile.
    pub fn for_profile(profile: TrainingProfile) -> Self {
        match profile {
            TrainingProfile::Standard => Self::standard(),
            TrainingProfile::Robust => Self::robust(),
        }
    }

    /// Override the seed, keeping everything else.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Pipeline error types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not trained: {message}")]
    ModelNotTrained { message: String },

    #[error("Feature column '{feature}' has no values to fit an encoder on")]
    EmptyColumn { feature: String },

    #[error("Training data insufficient: need at least {min_samples} samples, got {actual}")]
    InsufficientTrainingData { min_samples: usize, actual: usize },

    #[error("Training corpus contains only one target class")]
    SingleClass,

    #[error("Feature vector has {actual} values, expected {expected}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Missing required answer for '{column}'")]
    MissingAnswer { column: String },

    #[error("Artifact saving failed: {path}")]
    ArtifactSave { path: String },

    #[error("Artifact loading failed: {path}")]
    ArtifactLoad { path: String },

    #[error(
        "Artifact was trained against a different feature schema \
         (expected tag {expected:#010x}, found {actual:#010x})"
    )]
    SchemaMismatch { expected: u32, actual: u32 },
}

impl From<ModelError> for RespiraError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::EmptyColumn { .. }
            | ModelError::InsufficientTrainingData { .. }
            | ModelError::SingleClass => RespiraError::Config(err.to_string()),
            ModelError::ArtifactSave { .. }
            | ModelError::ArtifactLoad { .. }
            | ModelError::SchemaMismatch { .. } => RespiraError::Artifact(err.to_string()),
            ModelError::MissingAnswer { .. } => RespiraError::Input(err.to_string()),
            ModelError::ModelNotTrained { .. } | ModelError::FeatureCountMismatch { .. } => {
                RespiraError::Model(err.to_string())
            }
        }
    }
}
