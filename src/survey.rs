//! Survey schema and respondent records.
//!
//! The questionnaire has a fixed 24-column layout. Ten of those columns are
//! the categorical model inputs ([`FEATURE_COLUMNS`]); their order defines
//! the feature-vector index contract and must match between training and
//! inference. Spreadsheet decoding happens upstream; this module reads
//! corpora exported as a JSON array or JSONL, one object per respondent
//! keyed by column name.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RespiraError, Result};

/// The full questionnaire layout, in sheet order.
pub const COLUMN_NAMES: [&str; 24] = [
    "Timestamp",
    "Age Group",
    "Gender",
    "Locality",
    "Years in Area",
    "Housing Type",
    "Occupation",
    "Dust Entry Frequency",
    "Nearby Hazards",
    "Worst Pollution Season",
    "Outdoor Avoidance",
    "Health Symptoms",
    "Morning Chest Heaviness",
    "Wheezing Sound",
    "Eye/Throat Irritation",
    "Doctor Visit (Breathing)",
    "Open Drains Nearby",
    "Foul Smell Daily",
    "Construction Pollution",
    "AQI Awareness",
    "First Action on Cough",
    "Disease or Normal",
    "Workshop Interest",
    "Other Concerns",
];

/// The model's input columns. Position in this array is the feature index.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "Age Group",
    "Housing Type",
    "Dust Entry Frequency",
    "Worst Pollution Season",
    "Morning Chest Heaviness",
    "Wheezing Sound",
    "Eye/Throat Irritation",
    "Open Drains Nearby",
    "Foul Smell Daily",
    "Construction Pollution",
];

/// Column holding the screening outcome.
pub const TARGET_COLUMN: &str = "Disease or Normal";

/// Target value treated as a positive disease indication.
pub const POSITIVE_LABEL: &str = "It is a Disease";

/// Canonical label substituted for missing answers before encoding.
pub const MISSING_LABEL: &str = "Unknown";

/// One survey response, keyed by column name.
///
/// Answers are stored as given; canonicalization of missing values happens
/// in the accessors so the raw response survives for display and audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyRecord {
    answers: Map<String, Value>,
}

impl SurveyRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an answer for a column.
    pub fn set<S: Into<String>, V: Into<String>>(&mut self, column: S, value: V) -> &mut Self {
        self.answers
            .insert(column.into(), Value::String(value.into()));
        self
    }

    /// Raw answer for a column, if present and non-empty.
    pub fn answer(&self, column: &str) -> Option<String> {
        match self.answers.get(column) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Some(Value::Null) | None => None,
            // Spreadsheet exports occasionally carry numbers or booleans.
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Answer for a column with missing values canonicalized to
    /// [`MISSING_LABEL`].
    pub fn answer_or_unknown(&self, column: &str) -> String {
        self.answer(column)
            .unwrap_or_else(|| MISSING_LABEL.to_string())
    }

    /// Whether this respondent's target column carries the positive label.
    pub fn is_positive(&self) -> bool {
        self.answer(TARGET_COLUMN).as_deref() == Some(POSITIVE_LABEL)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(answers) => Ok(Self { answers }),
            other => Err(RespiraError::survey(format!(
                "expected a JSON object per respondent, got {other}"
            ))),
        }
    }
}

/// An in-memory survey corpus.
#[derive(Debug, Clone, Default)]
pub struct SurveyCorpus {
    records: Vec<SurveyRecord>,
}

impl SurveyCorpus {
    /// Build a corpus from already-parsed records.
    pub fn from_records(records: Vec<SurveyRecord>) -> Self {
        Self { records }
    }

    /// Load a corpus from a JSON array file or a JSONL file.
    ///
    /// The format is detected from the first non-whitespace byte: `[` means
    /// a single JSON array, anything else is parsed line by line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if content.trim_start().starts_with('[') {
            let values: Vec<Value> = serde_json::from_str(&content)?;
            let records = values
                .into_iter()
                .map(SurveyRecord::from_value)
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self { records });
        }

        // JSONL: one respondent per line, blank lines skipped.
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(&line).map_err(|e| {
                RespiraError::survey(format!("line {}: {e}", line_num + 1))
            })?;
            records.push(SurveyRecord::from_value(value)?);
        }
        Ok(Self { records })
    }

    /// Number of respondents.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus has no respondents.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in corpus order.
    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    /// A column's values in corpus order, missing canonicalized to
    /// [`MISSING_LABEL`].
    pub fn column_values(&self, column: &str) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.answer_or_unknown(column))
            .collect()
    }

    /// A column's present (non-missing) values in corpus order.
    pub fn present_column_values(&self, column: &str) -> Vec<String> {
        self.records.iter().filter_map(|r| r.answer(column)).collect()
    }

    /// Binary labels in corpus order: `true` where the target column equals
    /// [`POSITIVE_LABEL`].
    pub fn labels(&self) -> Vec<bool> {
        self.records.iter().map(|r| r.is_positive()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> SurveyRecord {
        let mut rec = SurveyRecord::new();
        for (col, val) in pairs {
            rec.set(*col, *val);
        }
        rec
    }

    #[test]
    fn test_feature_columns_are_part_of_schema() {
        for col in FEATURE_COLUMNS {
            assert!(COLUMN_NAMES.contains(&col), "{col} missing from schema");
        }
        assert!(COLUMN_NAMES.contains(&TARGET_COLUMN));
    }

    #[test]
    fn test_missing_answers_canonicalize_to_unknown() {
        let rec = record(&[("Age Group", "18-25"), ("Housing Type", "   ")]);
        assert_eq!(rec.answer_or_unknown("Age Group"), "18-25");
        assert_eq!(rec.answer_or_unknown("Housing Type"), MISSING_LABEL);
        assert_eq!(rec.answer_or_unknown("Wheezing Sound"), MISSING_LABEL);
    }

    #[test]
    fn test_positive_label_detection() {
        let positive = record(&[(TARGET_COLUMN, POSITIVE_LABEL)]);
        let negative = record(&[(TARGET_COLUMN, "Normal")]);
        let absent = record(&[]);
        assert!(positive.is_positive());
        assert!(!negative.is_positive());
        assert!(!absent.is_positive());
    }

    #[test]
    fn test_corpus_column_values() {
        let corpus = SurveyCorpus::from_records(vec![
            record(&[("Age Group", "18-25")]),
            record(&[]),
            record(&[("Age Group", "26-40")]),
        ]);
        assert_eq!(
            corpus.column_values("Age Group"),
            vec!["18-25", MISSING_LABEL, "26-40"]
        );
        assert_eq!(
            corpus.present_column_values("Age Group"),
            vec!["18-25", "26-40"]
        );
    }

    #[test]
    fn test_load_jsonl_and_array() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let jsonl = dir.path().join("corpus.jsonl");
        std::fs::write(
            &jsonl,
            "{\"Age Group\": \"18-25\"}\n\n{\"Age Group\": null}\n",
        )?;
        let corpus = SurveyCorpus::load(&jsonl)?;
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.records()[1].answer("Age Group"), None);

        let array = dir.path().join("corpus.json");
        std::fs::write(&array, "[{\"Age Group\": \"60+\"}]")?;
        let corpus = SurveyCorpus::load(&array)?;
        assert_eq!(corpus.len(), 1);
        assert_eq!(
            corpus.records()[0].answer("Age Group").as_deref(),
            Some("60+")
        );
        Ok(())
    }
}
