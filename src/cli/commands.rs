//! Command implementations for the respira CLI.

use std::collections::BTreeMap;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{RespiraError, Result};
use crate::ml::TrainingConfig;
use crate::ml::artifact::RiskArtifact;
use crate::ml::metrics::cross_validate;
use crate::ml::predictor::RiskPredictor;
use crate::ml::trainer::{encode_corpus, train};
use crate::report;
use crate::survey::{SurveyCorpus, SurveyRecord};

/// Execute a CLI command based on parsed arguments
pub fn execute_command(args: RespiraArgs) -> Result<()> {
    let command = args.command.clone();
    match command {
        Command::Train(train_args) => train_model(train_args, &args),
        Command::Evaluate(evaluate_args) => evaluate_profiles(evaluate_args, &args),
        Command::Predict(predict_args) => predict_risk(predict_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
        Command::Filters(filters_args) => show_filters(filters_args, &args),
        Command::Inspect(inspect_args) => inspect_artifact(inspect_args, &args),
    }
}

fn train_model(args: TrainArgs, cli_args: &RespiraArgs) -> Result<()> {
    let corpus = SurveyCorpus::load(&args.corpus_file)?;
    let config = apply_overrides(
        TrainingConfig::for_profile(args.profile.into()),
        args.seed,
        args.trees,
        args.folds,
    );

    let outcome = train(&corpus, &config)?;
    outcome.artifact.save(&args.output)?;

    let result = TrainResult {
        artifact_path: args.output.display().to_string(),
        report: outcome.report,
    };
    output_result("Training complete", &result, cli_args, print_train_result)
}

fn evaluate_profiles(args: EvaluateArgs, cli_args: &RespiraArgs) -> Result<()> {
    let corpus = SurveyCorpus::load(&args.corpus_file)?;
    let (_, samples) = encode_corpus(&corpus)?;

    let mut profiles = Vec::new();
    for base in [TrainingConfig::standard(), TrainingConfig::robust()] {
        let config = apply_overrides(base, args.seed, None, args.folds);
        let cv = cross_validate(&samples, &config)?;
        profiles.push(ProfileEvaluation {
            profile: config.profile,
            seed: config.seed,
            cv,
        });
    }

    let result = EvaluateResult {
        corpus_rows: corpus.len(),
        profiles,
    };
    output_result(
        "Evaluation complete",
        &result,
        cli_args,
        print_evaluate_result,
    )
}

fn predict_risk(args: PredictArgs, cli_args: &RespiraArgs) -> Result<()> {
    let predictor = RiskPredictor::load(&args.model_file)?;
    let record = match &args.input {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<SurveyRecord>(&content)?
        }
        None => record_from_answers(&args.answer)?,
    };

    let assessment = predictor.assess(&record)?;
    output_result("", &assessment, cli_args, print_assessment)
}

fn show_stats(args: StatsArgs, cli_args: &RespiraArgs) -> Result<()> {
    let corpus = SurveyCorpus::load(&args.corpus_file)?;
    match args.column {
        Some(column) => {
            let counts = if args.explode {
                report::exploded_counts(&corpus, &column)
            } else {
                report::value_counts(&corpus, &column)
            };
            let breakdown = ColumnBreakdown { column, counts };
            output_result("", &breakdown, cli_args, print_breakdown)
        }
        None => {
            let kpis = report::kpi_summary(&corpus);
            output_result("", &kpis, cli_args, print_kpis)
        }
    }
}

fn show_filters(args: FiltersArgs, cli_args: &RespiraArgs) -> Result<()> {
    let corpus = SurveyCorpus::load(&args.corpus_file)?;
    let filters: BTreeMap<String, Vec<String>> =
        report::feature_filters(&corpus).into_iter().collect();
    let result = FiltersResult { filters };
    output_result("", &result, cli_args, print_filters)
}

fn inspect_artifact(args: InspectArgs, cli_args: &RespiraArgs) -> Result<()> {
    let artifact = RiskArtifact::load(&args.model_file)?;
    let config = artifact.config();
    let result = InspectResult {
        trained_at: artifact.trained_at().to_rfc3339(),
        crate_version: artifact.crate_version().to_string(),
        profile: config.profile,
        seed: config.seed,
        n_trees: artifact.forest().n_trees(),
        n_features: artifact.forest().n_features(),
        balance: config.balance.to_string(),
    };
    output_result("", &result, cli_args, print_inspect_result)
}

fn apply_overrides(
    mut config: TrainingConfig,
    seed: Option<u64>,
    trees: Option<usize>,
    folds: Option<usize>,
) -> TrainingConfig {
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(trees) = trees {
        config.n_trees = trees;
    }
    if let Some(folds) = folds {
        config.cv_folds = folds;
    }
    config
}

/// Build a record from repeated "Column Name=Answer" arguments.
fn record_from_answers(answers: &[String]) -> Result<SurveyRecord> {
    if answers.is_empty() {
        return Err(RespiraError::input(
            "no answers given; use --input or repeat --answer \"Column=Value\"",
        ));
    }
    let mut record = SurveyRecord::new();
    for pair in answers {
        let (column, value) = pair.split_once('=').ok_or_else(|| {
            RespiraError::input(format!("expected \"Column=Value\", got \"{pair}\""))
        })?;
        record.set(column.trim(), value.trim());
    }
    Ok(record)
}
