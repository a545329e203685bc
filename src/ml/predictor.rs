//! The inference service.
//!
//! A [`RiskPredictor`] is an immutable service context built once from a
//! loaded artifact and shared read-only for the life of the process.
//! Assessment is a pure function of (artifact, input): requests touch no
//! shared mutable state, so any number may run concurrently.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::ModelError;
use crate::ml::artifact::RiskArtifact;
use crate::survey::{FEATURE_COLUMNS, SurveyRecord};

/// Percentage below which a respondent is low-risk.
pub const LOW_RISK_CEILING: f64 = 35.0;

/// Percentage below which a respondent is moderate-risk.
pub const MODERATE_RISK_CEILING: f64 = 55.0;

/// Discretized risk tier.
///
/// The breakpoints are a fixed design choice, not derived from the data,
/// and are reproduced exactly for compatibility with existing consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low Risk"),
            RiskLevel::Moderate => write!(f, "Moderate Risk"),
            RiskLevel::High => write!(f, "High Risk"),
        }
    }
}

/// Tier for a probability percentage. Pure and total.
pub fn risk_level(percentage: f64) -> RiskLevel {
    if percentage < LOW_RISK_CEILING {
        RiskLevel::Low
    } else if percentage < MODERATE_RISK_CEILING {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

/// One scored inference response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Class-1 probability as a percentage, rounded to one decimal.
    pub probability: f64,
    /// Tier derived from the rounded percentage.
    pub risk_level: RiskLevel,
    /// The raw answers as given, echoed for caller-side display and audit.
    pub inputs: BTreeMap<String, String>,
}

/// Serves risk assessments from one loaded artifact.
#[derive(Debug, Clone)]
pub struct RiskPredictor {
    artifact: Arc<RiskArtifact>,
}

impl RiskPredictor {
    /// Wrap a freshly trained or loaded artifact.
    pub fn new(artifact: RiskArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    /// Share an already-loaded artifact.
    pub fn from_arc(artifact: Arc<RiskArtifact>) -> Self {
        Self { artifact }
    }

    /// Load the artifact from disk, failing fast before any request.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(RiskArtifact::load(path)?))
    }

    /// The artifact backing this predictor.
    pub fn artifact(&self) -> &RiskArtifact {
        &self.artifact
    }

    /// Score one respondent.
    ///
    /// All ten feature answers are required; a missing one is a
    /// caller-input error. An answer the encoders have never seen is not
    /// an error: it takes the out-of-vocabulary code and processing
    /// continues.
    pub fn assess(&self, record: &SurveyRecord) -> Result<RiskAssessment> {
        let vector = self.artifact.encoders().encode_required(record)?;
        let proba = self.artifact.forest().predict_proba(&vector)?;

        let probability = (proba[1] * 1000.0).round() / 10.0;
        let inputs: BTreeMap<String, String> = FEATURE_COLUMNS
            .iter()
            .map(|column| {
                let answer = record.answer(column).ok_or_else(|| ModelError::MissingAnswer {
                    column: column.to_string(),
                })?;
                Ok((column.to_string(), answer))
            })
            .collect::<Result<_>>()?;

        Ok(RiskAssessment {
            probability,
            risk_level: risk_level(probability),
            inputs,
        })
    }
}
