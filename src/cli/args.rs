//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use serde::Serialize;

use crate::pipeline::{ClockSource, DuplicatePolicy, ImputeStrategy, SourcePaths};

/// Attrition - Merge HR sources, engineer features and compare attrition classifiers
#[derive(Parser, Debug)]
#[command(name = "attrition")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the default source files
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// General attributes table (defaults to <data-dir>/general_data.csv)
    #[arg(long)]
    pub general: Option<PathBuf>,

    /// Manager survey table (defaults to <data-dir>/manager_survey_data.csv)
    #[arg(long)]
    pub manager_survey: Option<PathBuf>,

    /// Employee survey table (defaults to <data-dir>/employee_survey_data.csv)
    #[arg(long)]
    pub employee_survey: Option<PathBuf>,

    /// Daily arrival timestamps (defaults to <data-dir>/in_time.csv)
    #[arg(long)]
    pub in_time: Option<PathBuf>,

    /// Daily departure timestamps (defaults to <data-dir>/out_time.csv)
    #[arg(long)]
    pub out_time: Option<PathBuf>,

    /// Zip archive holding the in/out tables, used when the CSV pair is unavailable
    /// (defaults to <data-dir>/in_out_time.zip)
    #[arg(long)]
    pub clock_archive: Option<PathBuf>,

    /// Target column name
    #[arg(short, long, default_value = "Attrition")]
    pub target: String,

    /// Fill strategy for numeric nulls.
    /// Options: "median" (default), "mean", "most_frequent", "constant"
    #[arg(long, default_value = "median", value_parser = parse_impute_strategy)]
    pub impute: ImputeStrategy,

    /// Fill value used with --impute constant
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub impute_constant: f64,

    /// Share of rows held out for scoring, in (0, 1)
    #[arg(long, default_value = "0.2", value_parser = validate_test_size)]
    pub test_size: f64,

    /// Seed for the split, SMOTE and the tree ensembles
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Train on the imbalanced split without SMOTE oversampling
    #[arg(long, default_value = "false")]
    pub no_smote: bool,

    /// Fail on duplicate employee ids and on clock tables that disagree
    #[arg(long, default_value = "false")]
    pub strict_keys: bool,

    /// Number of feature importances to show for the best model
    #[arg(long, default_value = "10")]
    pub top_features: usize,

    /// Write the comparison report to this JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Source locations: explicit overrides, else the data-dir defaults
    pub fn source_paths(&self) -> SourcePaths {
        let defaults = SourcePaths::from_data_dir(&self.data_dir);
        let pick = |explicit: &Option<PathBuf>, default: Option<PathBuf>| explicit.clone().or(default);

        SourcePaths {
            general: self.general.clone().unwrap_or(defaults.general),
            manager_survey: self.manager_survey.clone().unwrap_or(defaults.manager_survey),
            employee_survey: self.employee_survey.clone().unwrap_or(defaults.employee_survey),
            clock: ClockSource {
                in_time: pick(&self.in_time, defaults.clock.in_time),
                out_time: pick(&self.out_time, defaults.clock.out_time),
                archive: pick(&self.clock_archive, defaults.clock.archive),
            },
        }
    }

    /// Impute strategy with the constant fill value applied
    pub fn impute_strategy(&self) -> ImputeStrategy {
        match self.impute {
            ImputeStrategy::Constant(_) => ImputeStrategy::Constant(self.impute_constant),
            other => other,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            target: self.target.clone(),
            impute: self.impute_strategy(),
            test_size: self.test_size,
            seed: self.seed,
            smote: !self.no_smote,
            strict_keys: self.strict_keys,
            duplicate_policy: if self.strict_keys {
                DuplicatePolicy::Fail
            } else {
                DuplicatePolicy::KeepFirst
            },
            top_features: self.top_features,
            infer_schema_length: self.infer_schema_length,
        }
    }
}

/// Resolved run settings threaded through every step
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub target: String,
    pub impute: ImputeStrategy,
    pub test_size: f64,
    pub seed: u64,
    pub smote: bool,
    pub strict_keys: bool,
    pub duplicate_policy: DuplicatePolicy,
    pub top_features: usize,
    pub infer_schema_length: usize,
}

fn parse_impute_strategy(s: &str) -> Result<ImputeStrategy, String> {
    s.parse()
}

/// Validator for test_size parameter
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test_size must be strictly between 0.0 and 1.0, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["attrition"]);
        let config = cli.pipeline_config();

        assert_eq!(config.target, "Attrition");
        assert_eq!(config.impute, ImputeStrategy::Median);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.seed, 42);
        assert!(config.smote);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert_eq!(cli.source_paths().general, PathBuf::from("data").join("general_data.csv"));
    }

    #[test]
    fn test_overrides_and_constant_fill() {
        let cli = Cli::parse_from([
            "attrition",
            "--data-dir",
            "hr",
            "--in-time",
            "clock/in.csv",
            "--impute",
            "constant",
            "--impute-constant=-1",
            "--strict-keys",
            "-vv",
        ]);

        let paths = cli.source_paths();
        assert_eq!(paths.clock.in_time, Some(PathBuf::from("clock/in.csv")));
        assert_eq!(paths.clock.out_time, Some(PathBuf::from("hr").join("out_time.csv")));
        assert_eq!(cli.impute_strategy(), ImputeStrategy::Constant(-1.0));
        assert_eq!(cli.pipeline_config().duplicate_policy, DuplicatePolicy::Fail);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_test_size_validation() {
        assert!(validate_test_size("0.3").is_ok());
        assert!(validate_test_size("0").is_err());
        assert!(validate_test_size("1.5").is_err());
        assert!(validate_test_size("abc").is_err());
    }
}
