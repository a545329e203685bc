//! Categorical encoders mapping survey answers to dense integer codes.
//!
//! Each feature column gets its own [`CategoryEncoder`], fit once on the
//! training corpus and immutable afterwards. Codes are assigned in sorted
//! label order, so refitting on the same corpus always reproduces the same
//! codes. A label unseen at training time encodes to a dedicated
//! out-of-vocabulary code one past the in-vocabulary range, so it can
//! never alias a real category.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ml::ModelError;
use crate::survey::{FEATURE_COLUMNS, SurveyCorpus, SurveyRecord};

/// Ordered integer encoding of one respondent's answers.
pub type FeatureVector = Vec<u32>;

/// An injective mapping from observed category labels to codes `0..k-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Observed labels in sorted order; a label's position is its code.
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fit an encoder on a column's values.
    ///
    /// Distinct labels are collected and sorted; the sorted position is the
    /// code. Fitting on an empty column is a configuration error.
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Result<Self, ModelError> {
        let distinct: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).collect();
        if distinct.is_empty() {
            return Err(ModelError::EmptyColumn {
                feature: String::new(),
            });
        }
        Ok(Self {
            classes: distinct.into_iter().map(String::from).collect(),
        })
    }

    /// Code for a label, or the out-of-vocabulary fallback if unseen.
    pub fn encode(&self, value: &str) -> u32 {
        match self.classes.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => idx as u32,
            Err(_) => self.fallback_code(),
        }
    }

    /// Label for an in-vocabulary code.
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    /// The dedicated out-of-vocabulary code (one past the last label).
    pub fn fallback_code(&self) -> u32 {
        self.classes.len() as u32
    }

    /// Whether a label was observed at fit time.
    pub fn contains(&self, value: &str) -> bool {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .is_ok()
    }

    /// Observed labels in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of observed labels.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the encoder has no labels (never true for a fitted encoder).
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One fitted encoder per feature column.
///
/// Built during the fit phase and immutable afterwards. Feature order comes
/// from [`FEATURE_COLUMNS`], which defines the feature-vector index
/// contract shared by training and inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, CategoryEncoder>,
}

impl EncoderRegistry {
    /// Fit one encoder per feature column on the training corpus.
    ///
    /// Missing answers are canonicalized to `"Unknown"` before fitting, so
    /// every respondent contributes a value to every feature.
    pub fn fit(corpus: &SurveyCorpus) -> Result<Self, ModelError> {
        let mut encoders = BTreeMap::new();
        for feature in FEATURE_COLUMNS {
            let values = corpus.column_values(feature);
            let encoder = CategoryEncoder::fit(&values).map_err(|_| ModelError::EmptyColumn {
                feature: feature.to_string(),
            })?;
            encoders.insert(feature.to_string(), encoder);
        }
        Ok(Self { encoders })
    }

    /// The encoder for a feature column.
    pub fn encoder(&self, feature: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(feature)
    }

    /// Encode a record into a feature vector, in feature-column order.
    ///
    /// Missing answers encode as `"Unknown"`; labels unseen at training
    /// time take each feature's out-of-vocabulary code. Never fails.
    pub fn encode_record(&self, record: &SurveyRecord) -> FeatureVector {
        FEATURE_COLUMNS
            .iter()
            .map(|feature| {
                let answer = record.answer_or_unknown(feature);
                self.encoders[*feature].encode(&answer)
            })
            .collect()
    }

    /// Encode a record, requiring every feature column to be answered.
    ///
    /// This is the inference-request path: a missing answer is a
    /// caller-input error, while an *unrecognized* answer still falls back
    /// to the out-of-vocabulary code.
    pub fn encode_required(&self, record: &SurveyRecord) -> Result<FeatureVector, ModelError> {
        let mut vector = FeatureVector::with_capacity(FEATURE_COLUMNS.len());
        for feature in FEATURE_COLUMNS {
            let answer = record.answer(feature).ok_or_else(|| ModelError::MissingAnswer {
                column: feature.to_string(),
            })?;
            vector.push(self.encoders[feature].encode(&answer));
        }
        Ok(vector)
    }

    /// Sorted vocabulary per feature column, for input-filter displays.
    pub fn vocabularies(&self) -> Vec<(String, Vec<String>)> {
        FEATURE_COLUMNS
            .iter()
            .map(|feature| {
                (
                    feature.to_string(),
                    self.encoders[*feature].classes().to_vec(),
                )
            })
            .collect()
    }

    /// Number of feature columns covered.
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    /// Whether the registry is empty (never true for a fitted registry).
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::MISSING_LABEL;

    fn sample_corpus() -> SurveyCorpus {
        let mut records = Vec::new();
        for (age, wheeze) in [("18-25", "Yes"), ("26-40", "No"), ("18-25", "No")] {
            let mut rec = SurveyRecord::new();
            rec.set("Age Group", age).set("Wheezing Sound", wheeze);
            records.push(rec);
        }
        SurveyCorpus::from_records(records)
    }

    #[test]
    fn test_codes_cover_zero_to_k() {
        let encoder = CategoryEncoder::fit(&["b", "a", "c", "a"]).unwrap();
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.encode("a"), 0);
        assert_eq!(encoder.encode("b"), 1);
        assert_eq!(encoder.encode("c"), 2);
    }

    #[test]
    fn test_refit_is_deterministic() {
        let values = ["Winter", "Summer", "Monsoon", "Winter"];
        let a = CategoryEncoder::fit(&values).unwrap();
        let b = CategoryEncoder::fit(&values).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unseen_label_takes_fallback_code() {
        let encoder = CategoryEncoder::fit(&["No", "Yes"]).unwrap();
        assert_eq!(encoder.encode("Maybe"), encoder.fallback_code());
        assert_eq!(encoder.fallback_code(), 2);
        // The fallback is out of band: no in-vocabulary label decodes to it.
        assert_eq!(encoder.decode(encoder.fallback_code()), None);
    }

    #[test]
    fn test_roundtrip() {
        let encoder = CategoryEncoder::fit(&["Often", "Never", "Sometimes"]).unwrap();
        for label in ["Never", "Often", "Sometimes"] {
            assert_eq!(encoder.decode(encoder.encode(label)), Some(label));
        }
    }

    #[test]
    fn test_empty_column_is_config_error() {
        let values: Vec<&str> = Vec::new();
        assert!(matches!(
            CategoryEncoder::fit(&values),
            Err(ModelError::EmptyColumn { .. })
        ));
    }

    #[test]
    fn test_registry_covers_all_features() {
        let registry = EncoderRegistry::fit(&sample_corpus()).unwrap();
        assert_eq!(registry.len(), FEATURE_COLUMNS.len());
        for feature in FEATURE_COLUMNS {
            assert!(registry.encoder(feature).is_some());
        }
    }

    #[test]
    fn test_registry_encodes_missing_as_unknown() {
        let corpus = sample_corpus();
        let registry = EncoderRegistry::fit(&corpus).unwrap();
        let vector = registry.encode_record(&corpus.records()[0]);
        assert_eq!(vector.len(), FEATURE_COLUMNS.len());

        // Columns nobody answered collapse to a single "Unknown" category.
        let housing = registry.encoder("Housing Type").unwrap();
        assert_eq!(housing.classes(), [MISSING_LABEL]);
        assert_eq!(housing.encode(MISSING_LABEL), 0);
    }

    #[test]
    fn test_encode_required_rejects_missing_answers() {
        let corpus = sample_corpus();
        let registry = EncoderRegistry::fit(&corpus).unwrap();
        // The sample records only answer two of the ten columns.
        let err = registry.encode_required(&corpus.records()[0]).unwrap_err();
        assert!(matches!(err, ModelError::MissingAnswer { .. }));
    }

    #[test]
    fn test_vocabularies_follow_feature_order() {
        let registry = EncoderRegistry::fit(&sample_corpus()).unwrap();
        let vocabularies = registry.vocabularies();
        let names: Vec<&str> = vocabularies.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, FEATURE_COLUMNS.to_vec());
        let (_, wheezing) = vocabularies
            .iter()
            .find(|(n, _)| n == "Wheezing Sound")
            .unwrap();
        assert_eq!(wheezing, &vec!["No".to_string(), "Yes".to_string()]);
    }
}
