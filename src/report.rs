//! Aggregate reporting over the survey corpus.
//!
//! Thin grouping and counting for the dashboard collaborator: category
//! breakdowns as `{name, value}` pair sequences, KPI summaries, and the
//! per-feature vocabularies that feed the prediction form's dropdowns.
//! Everything here reads the raw corpus; nothing touches the classifier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::survey::{FEATURE_COLUMNS, SurveyCorpus};

/// One `{name, value}` chart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub value: u64,
}

/// Headline statistics for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_responses: usize,
    /// Share of respondents who saw a doctor for breathing issues, percent.
    pub healthcare_utilization: f64,
    /// Most common answer on construction-pollution impact.
    pub construction_pollution_belief: Option<String>,
    /// Share of respondents aware of AQI, percent.
    pub aqi_awareness: f64,
    /// Share of respondents reporting wheezing, percent.
    pub wheezing_prevalence: f64,
    pub doctor_visits_yes: usize,
}

/// Answer counts for a column, most frequent first.
///
/// Missing answers are skipped; ties break alphabetically so output is
/// deterministic.
pub fn value_counts(corpus: &SurveyCorpus, column: &str) -> Vec<CategoryCount> {
    counts_to_pairs(count_values(corpus.present_column_values(column)))
}

/// Answer counts for a multi-select column whose answers are
/// comma-separated (e.g. Health Symptoms).
pub fn exploded_counts(corpus: &SurveyCorpus, column: &str) -> Vec<CategoryCount> {
    let values = corpus
        .present_column_values(column)
        .iter()
        .flat_map(|answer| answer.split(", ").map(str::to_string).collect::<Vec<_>>())
        .collect();
    counts_to_pairs(count_values(values))
}

/// Sorted unique answers per feature column, for the prediction form.
pub fn feature_filters(corpus: &SurveyCorpus) -> Vec<(String, Vec<String>)> {
    FEATURE_COLUMNS
        .iter()
        .map(|column| {
            let mut unique: Vec<String> = corpus.present_column_values(column);
            unique.sort();
            unique.dedup();
            (column.to_string(), unique)
        })
        .collect()
}

/// Headline statistics computed from the raw corpus.
pub fn kpi_summary(corpus: &SurveyCorpus) -> KpiSummary {
    let total = corpus.len();
    if total == 0 {
        return KpiSummary {
            total_responses: 0,
            healthcare_utilization: 0.0,
            construction_pollution_belief: None,
            aqi_awareness: 0.0,
            wheezing_prevalence: 0.0,
            doctor_visits_yes: 0,
        };
    }

    let doctor_visits_yes = corpus
        .records()
        .iter()
        .filter(|r| r.answer("Doctor Visit (Breathing)").as_deref() == Some("Yes"))
        .count();
    let wheezing_yes = corpus
        .records()
        .iter()
        .filter(|r| r.answer("Wheezing Sound").as_deref() == Some("Yes"))
        .count();
    // Awareness counts everyone whose answer doesn't contain "No".
    let aqi_not_aware = corpus
        .present_column_values("AQI Awareness")
        .iter()
        .filter(|answer| answer.to_lowercase().contains("no"))
        .count();

    let top_pollution = value_counts(corpus, "Construction Pollution")
        .into_iter()
        .next()
        .map(|entry| entry.name);

    KpiSummary {
        total_responses: total,
        healthcare_utilization: percent(doctor_visits_yes, total),
        construction_pollution_belief: top_pollution,
        aqi_awareness: percent(total - aqi_not_aware, total),
        wheezing_prevalence: percent(wheezing_yes, total),
        doctor_visits_yes,
    }
}

fn percent(part: usize, total: usize) -> f64 {
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

fn count_values(values: Vec<String>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

fn counts_to_pairs(counts: BTreeMap<String, u64>) -> Vec<CategoryCount> {
    let mut pairs: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, value)| CategoryCount { name, value })
        .collect();
    pairs.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    pairs
}
