//! The offline training pipeline.
//!
//! Training is a separate batch process: encode the corpus, derive labels,
//! correct class imbalance per the active profile, fit the forest, score
//! the configuration with cross-validation, and bundle everything into a
//! [`RiskArtifact`]. It runs to completion or fails; nothing here is on the
//! serving path.

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::artifact::RiskArtifact;
use crate::ml::balance::{BalanceStrategy, oversample, sample_weights};
use crate::ml::encoder::{CategoryEncoder, EncoderRegistry};
use crate::ml::forest::{LabeledSample, MIN_TRAINING_SAMPLES, RandomForest};
use crate::ml::metrics::{CrossValidation, cross_validate};
use crate::ml::{ModelError, TrainingConfig, TrainingProfile};
use crate::survey::{FEATURE_COLUMNS, SurveyCorpus};

/// Diagnostics from one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Respondents in the corpus.
    pub rows: usize,
    /// Feature columns used.
    pub n_features: usize,
    /// Corpus class counts, `[negative, positive]`.
    pub class_counts: [usize; 2],
    /// Rows the forest was fitted on (after balancing, if any).
    pub training_rows: usize,
    /// Profile the run used.
    pub profile: TrainingProfile,
    /// Seed the run used.
    pub seed: u64,
    /// Cross-validated scores for this configuration.
    pub cv: CrossValidation,
}

/// A trained artifact plus its diagnostics.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: RiskArtifact,
    pub report: TrainingReport,
}

/// Fit encoders on a corpus and encode every respondent into a labeled
/// sample. Shared by training and evaluation.
pub fn encode_corpus(corpus: &SurveyCorpus) -> Result<(EncoderRegistry, Vec<LabeledSample>)> {
    if corpus.len() < MIN_TRAINING_SAMPLES {
        return Err(ModelError::InsufficientTrainingData {
            min_samples: MIN_TRAINING_SAMPLES,
            actual: corpus.len(),
        }
        .into());
    }
    let encoders = EncoderRegistry::fit(corpus)?;
    let samples = corpus
        .records()
        .iter()
        .map(|record| LabeledSample {
            features: encoders.encode_record(record),
            label: usize::from(record.is_positive()),
        })
        .collect();
    Ok((encoders, samples))
}

/// Run the full training pipeline on a survey corpus.
pub fn train(corpus: &SurveyCorpus, config: &TrainingConfig) -> Result<TrainingOutcome> {
    info!(
        "training profile '{}' on {} respondents",
        config.profile,
        corpus.len()
    );

    let (encoders, samples) = encode_corpus(corpus)?;
    let labels = corpus.labels();

    let positives = samples.iter().filter(|s| s.label == 1).count();
    let negatives = samples.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(ModelError::SingleClass.into());
    }
    info!("class distribution: {negatives} negative / {positives} positive");

    let cv = cross_validate(&samples, config)?;
    info!(
        "cross-validation: accuracy {:.4}, f1 {:.4} over {} folds",
        cv.mean_accuracy,
        cv.mean_f1,
        cv.folds.len()
    );

    let (forest, training_rows) = match config.balance {
        BalanceStrategy::Oversample => {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let balanced = oversample(&samples, &mut rng);
            info!("oversampled training set to {} rows", balanced.len());
            let forest = RandomForest::fit(&balanced, None, config)?;
            (forest, balanced.len())
        }
        BalanceStrategy::ClassWeight => {
            let weights = sample_weights(&samples);
            let forest = RandomForest::fit(&samples, Some(&weights), config)?;
            (forest, samples.len())
        }
    };

    // Target codes follow the same sorted-label rule as the features:
    // "No" -> 0, "Yes" -> 1, matching the numeric labels.
    let target_labels: Vec<&str> = labels
        .iter()
        .map(|&positive| if positive { "Yes" } else { "No" })
        .collect();
    let target_encoder = CategoryEncoder::fit(&target_labels)
        .map_err(|_| ModelError::SingleClass)?;

    let report = TrainingReport {
        rows: corpus.len(),
        n_features: FEATURE_COLUMNS.len(),
        class_counts: [negatives, positives],
        training_rows,
        profile: config.profile,
        seed: config.seed,
        cv,
    };
    let artifact = RiskArtifact::new(forest, encoders, target_encoder, config.clone());
    Ok(TrainingOutcome { artifact, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{POSITIVE_LABEL, SurveyRecord, TARGET_COLUMN};

    /// 20% positive corpus whose target tracks the wheezing answer.
    fn corpus(rows: usize) -> SurveyCorpus {
        let records = (0..rows)
            .map(|i| {
                let positive = i % 5 == 0;
                let mut rec = SurveyRecord::new();
                rec.set("Age Group", ["18-25", "26-40", "41-60"][i % 3]);
                rec.set("Wheezing Sound", if positive { "Yes" } else { "No" });
                rec.set(
                    TARGET_COLUMN,
                    if positive { POSITIVE_LABEL } else { "Normal" },
                );
                rec
            })
            .collect();
        SurveyCorpus::from_records(records)
    }

    fn quick_config() -> TrainingConfig {
        let mut config = TrainingConfig::standard();
        config.n_trees = 20;
        config
    }

    #[test]
    fn test_train_reports_balanced_size() {
        let outcome = train(&corpus(30), &quick_config()).unwrap();
        let report = &outcome.report;
        assert_eq!(report.rows, 30);
        assert_eq!(report.class_counts, [24, 6]);
        // Oversampling doubles the majority count.
        assert_eq!(report.training_rows, 48);
        assert_eq!(outcome.artifact.forest().n_trees(), 20);
    }

    #[test]
    fn test_train_class_weight_profile_keeps_rows() {
        let mut config = TrainingConfig::robust();
        config.n_trees = 20;
        let outcome = train(&corpus(30), &config).unwrap();
        assert_eq!(outcome.report.training_rows, 30);
        assert_eq!(outcome.report.profile, TrainingProfile::Robust);
    }

    #[test]
    fn test_train_rejects_single_class_corpus() {
        let records = (0..20)
            .map(|i| {
                let mut rec = SurveyRecord::new();
                rec.set("Age Group", ["18-25", "26-40"][i % 2]);
                rec.set(TARGET_COLUMN, "Normal");
                rec
            })
            .collect();
        let corpus = SurveyCorpus::from_records(records);
        let err = train(&corpus, &quick_config()).unwrap_err();
        assert!(matches!(err, crate::error::RespiraError::Config(_)));
    }

    #[test]
    fn test_train_rejects_tiny_corpus() {
        let err = train(&corpus(5), &quick_config()).unwrap_err();
        assert!(matches!(err, crate::error::RespiraError::Config(_)));
    }

    #[test]
    fn test_target_encoder_matches_numeric_labels() {
        let outcome = train(&corpus(30), &quick_config()).unwrap();
        let target = outcome.artifact.target_encoder();
        assert_eq!(target.encode("No"), 0);
        assert_eq!(target.encode("Yes"), 1);
    }
}
