//! Command line argument parsing for the respira CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ml::TrainingProfile;

/// respira - survey-driven respiratory risk classification
#[derive(Parser, Debug, Clone)]
#[command(name = "respira")]
#[command(about = "Train and serve respiratory risk models from survey data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "respira Contributors")]
#[command(long_about = None)]
pub struct RespiraArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RespiraArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a risk model from a survey corpus
    Train(TrainArgs),

    /// Cross-validate both training profiles on a corpus
    Evaluate(EvaluateArgs),

    /// Score one respondent against a trained model
    Predict(PredictArgs),

    /// Show aggregate survey statistics
    Stats(StatsArgs),

    /// Show prediction-form filter values per feature column
    Filters(FiltersArgs),

    /// Show metadata of a trained model artifact
    Inspect(InspectArgs),
}

/// Selectable training profiles
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileArg {
    /// Oversampled training set, unbounded trees
    Standard,
    /// Class-weighted training, depth-capped trees
    Robust,
}

impl From<ProfileArg> for TrainingProfile {
    fn from(profile: ProfileArg) -> Self {
        match profile {
            ProfileArg::Standard => TrainingProfile::Standard,
            ProfileArg::Robust => TrainingProfile::Robust,
        }
    }
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Survey corpus file (JSON array or JSONL)
    #[arg(value_name = "CORPUS_FILE")]
    pub corpus_file: PathBuf,

    /// Where to write the trained artifact
    #[arg(short, long, default_value = "model.json")]
    pub output: PathBuf,

    /// Training profile
    #[arg(short, long, default_value = "standard")]
    pub profile: ProfileArg,

    /// Random seed override
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tree count override
    #[arg(long)]
    pub trees: Option<usize>,

    /// Cross-validation fold count override
    #[arg(long)]
    pub folds: Option<usize>,
}

/// Arguments for profile evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Survey corpus file (JSON array or JSONL)
    #[arg(value_name = "CORPUS_FILE")]
    pub corpus_file: PathBuf,

    /// Random seed override applied to both profiles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Cross-validation fold count override
    #[arg(long)]
    pub folds: Option<usize>,
}

/// Arguments for scoring a respondent
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Path to the trained artifact
    #[arg(value_name = "MODEL_FILE")]
    pub model_file: PathBuf,

    /// JSON file with one respondent's answers (column name -> answer)
    #[arg(short, long, conflicts_with = "answer")]
    pub input: Option<PathBuf>,

    /// Inline answer as "Column Name=Answer" (repeat for each column)
    #[arg(short, long)]
    pub answer: Vec<String>,
}

/// Arguments for aggregate statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Survey corpus file (JSON array or JSONL)
    #[arg(value_name = "CORPUS_FILE")]
    pub corpus_file: PathBuf,

    /// Break down one column instead of printing the KPI summary
    #[arg(short, long)]
    pub column: Option<String>,

    /// Split comma-separated multi-select answers before counting
    #[arg(long, requires = "column")]
    pub explode: bool,
}

/// Arguments for filter values
#[derive(Parser, Debug, Clone)]
pub struct FiltersArgs {
    /// Survey corpus file (JSON array or JSONL)
    #[arg(value_name = "CORPUS_FILE")]
    pub corpus_file: PathBuf,
}

/// Arguments for artifact inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Path to the trained artifact
    #[arg(value_name = "MODEL_FILE")]
    pub model_file: PathBuf,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = RespiraArgs::parse_from(["respira", "stats", "corpus.jsonl"]);
        assert_eq!(args.verbosity(), 1);

        let args = RespiraArgs::parse_from(["respira", "-q", "stats", "corpus.jsonl"]);
        assert_eq!(args.verbosity(), 0);

        let args = RespiraArgs::parse_from(["respira", "-vv", "stats", "corpus.jsonl"]);
        assert_eq!(args.verbosity(), 2);
    }

    #[test]
    fn test_train_defaults() {
        let args = RespiraArgs::parse_from(["respira", "train", "corpus.jsonl"]);
        match args.command {
            Command::Train(train) => {
                assert_eq!(train.output, PathBuf::from("model.json"));
                assert!(matches!(train.profile, ProfileArg::Standard));
                assert_eq!(train.seed, None);
            }
            _ => panic!("expected train command"),
        }
    }

    #[test]
    fn test_predict_answers() {
        let args = RespiraArgs::parse_from([
            "respira",
            "predict",
            "model.json",
            "-a",
            "Age Group=18-25",
            "-a",
            "Wheezing Sound=No",
        ]);
        match args.command {
            Command::Predict(predict) => assert_eq!(predict.answer.len(), 2),
            _ => panic!("expected predict command"),
        }
    }
}
