//! The persisted training artifact.
//!
//! A classifier must only ever be used with the encoders it was trained
//! against, so both are bundled into one record together with the training
//! configuration and a compatibility tag over the feature schema. The
//! record is written once at the end of a training run and read-only
//! afterwards; retraining replaces it wholesale.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ml::encoder::{CategoryEncoder, EncoderRegistry};
use crate::ml::forest::RandomForest;
use crate::ml::{ModelError, TrainingConfig};
use crate::survey::FEATURE_COLUMNS;

/// Bumped when the serialized layout changes shape.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// CRC32 tag over the ordered feature-column names.
///
/// An artifact trained against a different feature schema carries a
/// different tag and is rejected at load time instead of silently
/// desynchronizing codes.
pub fn feature_schema_tag() -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for column in FEATURE_COLUMNS {
        hasher.update(column.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

/// One trained model and everything needed to serve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskArtifact {
    format_version: u32,
    crate_version: String,
    schema_tag: u32,
    trained_at: DateTime<Utc>,
    config: TrainingConfig,
    forest: RandomForest,
    encoders: EncoderRegistry,
    target_encoder: CategoryEncoder,
}

impl RiskArtifact {
    /// Bundle the outputs of a completed training run.
    pub fn new(
        forest: RandomForest,
        encoders: EncoderRegistry,
        target_encoder: CategoryEncoder,
        config: TrainingConfig,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            crate_version: crate::VERSION.to_string(),
            schema_tag: feature_schema_tag(),
            trained_at: Utc::now(),
            config,
            forest,
            encoders,
            target_encoder,
        }
    }

    /// Write the artifact as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|_| ModelError::ArtifactSave {
            path: path.display().to_string(),
        })?;
        std::fs::write(path, json).map_err(|_| ModelError::ArtifactSave {
            path: path.display().to_string(),
        })?;
        Ok(())
    }

    /// Load an artifact, verifying format and schema compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ModelError::ArtifactLoad {
            path: path.display().to_string(),
        })?;
        let artifact: Self =
            serde_json::from_str(&content).map_err(|_| ModelError::ArtifactLoad {
                path: path.display().to_string(),
            })?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::ArtifactLoad {
                path: format!(
                    "{} (format version {}, expected {})",
                    path.display(),
                    artifact.format_version,
                    ARTIFACT_FORMAT_VERSION
                ),
            });
        }
        let expected = feature_schema_tag();
        if artifact.schema_tag != expected {
            return Err(ModelError::SchemaMismatch {
                expected,
                actual: artifact.schema_tag,
            });
        }
        Ok(artifact)
    }

    /// The trained classifier.
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// The encoder registry the classifier was trained against.
    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    /// The target-label encoder.
    pub fn target_encoder(&self) -> &CategoryEncoder {
        &self.target_encoder
    }

    /// The configuration of the training run that produced this artifact.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// When the training run completed.
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Version of the crate that produced this artifact.
    pub fn crate_version(&self) -> &str {
        &self.crate_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forest::LabeledSample;
    use crate::survey::{SurveyCorpus, SurveyRecord};

    fn trained_artifact() -> RiskArtifact {
        let mut records = Vec::new();
        for i in 0..20 {
            let mut rec = SurveyRecord::new();
            rec.set("Age Group", if i % 2 == 0 { "18-25" } else { "60+" });
            rec.set("Wheezing Sound", if i % 2 == 0 { "No" } else { "Yes" });
            records.push(rec);
        }
        let corpus = SurveyCorpus::from_records(records);
        let encoders = EncoderRegistry::fit(&corpus).unwrap();
        let samples: Vec<LabeledSample> = corpus
            .records()
            .iter()
            .enumerate()
            .map(|(i, rec)| LabeledSample {
                features: encoders.encode_record(rec),
                label: i % 2,
            })
            .collect();
        let mut config = TrainingConfig::standard();
        config.n_trees = 10;
        let forest = RandomForest::fit(&samples, None, &config).unwrap();
        let target_encoder = CategoryEncoder::fit(&["No", "Yes"]).unwrap();
        RiskArtifact::new(forest, encoders, target_encoder, config)
    }

    #[test]
    fn test_schema_tag_is_stable() {
        assert_eq!(feature_schema_tag(), feature_schema_tag());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = trained_artifact();
        artifact.save(&path).unwrap();

        let loaded = RiskArtifact::load(&path).unwrap();
        assert_eq!(loaded.encoders(), artifact.encoders());
        assert_eq!(loaded.config().n_trees, 10);
        assert_eq!(loaded.forest().n_trees(), 10);

        let probe = vec![0u32; 10];
        assert_eq!(
            loaded.forest().predict_proba(&probe).unwrap(),
            artifact.forest().predict_proba(&probe).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = trained_artifact();
        artifact.save(&path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["schema_tag"] = serde_json::json!(12345);
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let err = RiskArtifact::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_load_rejects_missing_or_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = RiskArtifact::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, ModelError::ArtifactLoad { .. }));

        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "not json at all").unwrap();
        let corrupt = RiskArtifact::load(&path).unwrap_err();
        assert!(matches!(corrupt, ModelError::ArtifactLoad { .. }));
    }
}
