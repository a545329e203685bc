//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, RespiraArgs};
use crate::error::Result;
use crate::ml::metrics::CrossValidation;
use crate::ml::predictor::RiskAssessment;
use crate::ml::trainer::TrainingReport;
use crate::ml::TrainingProfile;
use crate::report::{CategoryCount, KpiSummary};

/// Result structure for training runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub artifact_path: String,
    pub report: TrainingReport,
}

/// Cross-validated scores of one profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileEvaluation {
    pub profile: TrainingProfile,
    pub seed: u64,
    pub cv: CrossValidation,
}

/// Result structure for profile evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResult {
    pub corpus_rows: usize,
    pub profiles: Vec<ProfileEvaluation>,
}

/// Result structure for a column breakdown.
#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnBreakdown {
    pub column: String,
    pub counts: Vec<CategoryCount>,
}

/// Result structure for prediction-form filters.
#[derive(Debug, Serialize, Deserialize)]
pub struct FiltersResult {
    pub filters: BTreeMap<String, Vec<String>>,
}

/// Result structure for artifact inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectResult {
    pub trained_at: String,
    pub crate_version: String,
    pub profile: TrainingProfile,
    pub seed: u64,
    pub n_trees: usize,
    pub n_features: usize,
    pub balance: String,
}

/// Output a result in the requested format.
///
/// `human` renders the result for a terminal; JSON output honors the
/// `--pretty` flag.
pub fn output_result<T: Serialize>(
    message: &str,
    result: &T,
    args: &RespiraArgs,
    human: impl FnOnce(&T),
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 && !message.is_empty() {
                println!("{message}");
                println!();
            }
            human(result);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
pub fn output_json<T: Serialize>(result: &T, args: &RespiraArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Print a training result for a terminal.
pub fn print_train_result(result: &TrainResult) {
    let report = &result.report;
    println!("Training Summary:");
    println!("═════════════════");
    println!("  Rows:               {}", report.rows);
    println!("  Features:           {}", report.n_features);
    println!(
        "  Class distribution: {} negative / {} positive",
        report.class_counts[0], report.class_counts[1]
    );
    println!("  Training rows:      {}", report.training_rows);
    println!("  Profile:            {}", report.profile);
    println!("  Seed:               {}", report.seed);
    print_cv(&report.cv);
    println!();
    println!("Saved: {}", result.artifact_path);
}

/// Print profile evaluations for a terminal.
pub fn print_evaluate_result(result: &EvaluateResult) {
    println!("Profile Evaluation ({} rows):", result.corpus_rows);
    println!("═══════════════════════════════");
    for profile in &result.profiles {
        println!();
        println!("  {} (seed {}):", profile.profile, profile.seed);
        print_cv(&profile.cv);
    }
}

fn print_cv(cv: &CrossValidation) {
    println!(
        "  CV accuracy:        {:.4} ({} folds)",
        cv.mean_accuracy,
        cv.folds.len()
    );
    println!("  CV F1 (positive):   {:.4}", cv.mean_f1);
}

/// Print a risk assessment for a terminal.
pub fn print_assessment(assessment: &RiskAssessment) {
    println!("Risk Assessment:");
    println!("════════════════");
    println!("  Probability: {:.1}%", assessment.probability);
    println!("  Risk level:  {}", assessment.risk_level);
    println!();
    println!("Inputs:");
    for (column, answer) in &assessment.inputs {
        println!("  {column}: {answer}");
    }
}

/// Print the KPI summary for a terminal.
pub fn print_kpis(kpis: &KpiSummary) {
    println!("Survey KPIs:");
    println!("════════════");
    println!("  Total responses:        {}", kpis.total_responses);
    println!(
        "  Healthcare utilization: {:.1}% ({} doctor visits)",
        kpis.healthcare_utilization, kpis.doctor_visits_yes
    );
    println!("  Wheezing prevalence:    {:.1}%", kpis.wheezing_prevalence);
    println!("  AQI awareness:          {:.1}%", kpis.aqi_awareness);
    println!(
        "  Construction pollution: {}",
        kpis.construction_pollution_belief.as_deref().unwrap_or("-")
    );
}

/// Print a column breakdown for a terminal.
pub fn print_breakdown(breakdown: &ColumnBreakdown) {
    println!("{}:", breakdown.column);
    for entry in &breakdown.counts {
        println!("  {:<40} {}", entry.name, entry.value);
    }
}

/// Print filter vocabularies for a terminal.
pub fn print_filters(result: &FiltersResult) {
    println!("Prediction form filters:");
    println!("════════════════════════");
    for (column, values) in &result.filters {
        println!("  {column}: {}", values.join(", "));
    }
}

/// Print artifact metadata for a terminal.
pub fn print_inspect_result(result: &InspectResult) {
    println!("Artifact:");
    println!("═════════");
    println!("  Trained at:    {}", result.trained_at);
    println!("  Crate version: {}", result.crate_version);
    println!("  Profile:       {}", result.profile);
    println!("  Balance:       {}", result.balance);
    println!("  Seed:          {}", result.seed);
    println!("  Trees:         {}", result.n_trees);
    println!("  Features:      {}", result.n_features);
}
