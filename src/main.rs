//! Attrition: Employee Attrition Analysis CLI
//!
//! Loads the HR sources, derives working-hours behaviour, prepares an encoded
//! feature matrix and ranks several classifier families by ROC-AUC.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing::{warn, Level};

use attrition::cli::Cli;
use attrition::models::{compare_models, default_classifiers, Partitions};
use attrition::pipeline::{
    analyze_missing_values, create_features, encode_categorical, extract_working_hours, handle_missing_values,
    load_sources, merge_sources, smote, split_features_target, stratified_split, Dataset, DEFAULT_DROP_COLUMNS,
    DEFAULT_SMOTE_NEIGHBORS,
};
use attrition::report::{display_comparison, export_analysis, PreparationSummary};
use attrition::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
};
use attrition::AttritionError;

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.pipeline_config();
    let paths = cli.source_paths();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &config.data_dir,
        &config.target,
        &config.impute.to_string(),
        config.test_size,
        config.seed,
        config.smote,
    );

    // Step 1: Load sources
    print_step_header(1, "Load Sources");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading HR tables...");
    let sources = load_sources(&paths, config.infer_schema_length).context("Failed to load HR sources")?;
    finish_with_success(&spinner, "HR tables loaded");

    println!("\n    {} Source Statistics:", style("✧").cyan());
    println!("      General:         {} rows", sources.general.height());
    println!("      Manager survey:  {} rows", sources.manager_survey.height());
    println!("      Employee survey: {} rows", sources.employee_survey.height());

    let mut summary = PreparationSummary::new(sources.general.height());
    let elapsed = step_start.elapsed();
    summary.record_time("load", elapsed);
    print_step_time(elapsed);

    // Step 2: Working hours
    print_step_header(2, "Working Hours");
    let step_start = Instant::now();
    let working_hours = match &sources.clock {
        Some(clock) => {
            let spinner = create_spinner("Summarizing clock-in/out records...");
            match extract_working_hours(&clock.arrivals, &clock.departures) {
                Ok(extraction) => {
                    finish_with_success(&spinner, "Working hours extracted");
                    if !extraction.unmatched_ids.is_empty() {
                        if config.strict_keys {
                            return Err(AttritionError::ClockTableMismatch {
                                ids: extraction.unmatched_ids,
                            }
                            .into());
                        }
                        print_warning(&format!(
                            "{} employee(s) appear in only one clock table; kept with zero working days",
                            extraction.unmatched_ids.len()
                        ));
                        summary.unmatched_clock_ids = extraction.unmatched_ids.len();
                    }
                    print_count("employee(s) with clock records", extraction.summaries.len(), None);
                    Some(extraction.to_frame()?)
                }
                Err(e) => {
                    finish_with_warning(&spinner, "Clock records unusable");
                    warn!("working hours skipped: {}", e);
                    None
                }
            }
        }
        None => {
            print_info("No clock-in/out data found; continuing without working-hours features");
            None
        }
    };
    summary.working_hours_available = working_hours.is_some();
    let elapsed = step_start.elapsed();
    summary.record_time("working hours", elapsed);
    print_step_time(elapsed);

    // Step 3: Merge
    print_step_header(3, "Merge Sources");
    let step_start = Instant::now();
    let merged = merge_sources(
        &sources.general,
        &sources.manager_survey,
        &sources.employee_survey,
        working_hours.as_ref(),
        config.duplicate_policy,
    )
    .context("Failed to merge HR sources")?;
    print_success(&format!(
        "Merged table: {} rows x {} columns",
        merged.height(),
        merged.width()
    ));
    let elapsed = step_start.elapsed();
    summary.record_time("merge", elapsed);
    print_step_time(elapsed);

    // Step 4: Missing values
    print_step_header(4, "Missing Values");
    let step_start = Instant::now();
    let with_nulls = analyze_missing_values(&merged)
        .into_iter()
        .filter(|(_, ratio)| *ratio > 0.0)
        .count();
    if with_nulls == 0 {
        print_info("No missing values in the merged table");
    } else {
        print_count("column(s) with missing values", with_nulls, None);
    }
    let (imputed, imputation) = handle_missing_values(&merged, config.impute)?;
    if imputation.sentinels_cleared > 0 {
        print_count("\"NA\" survey answer(s) cleared", imputation.sentinels_cleared, None);
    }
    print_success(&format!(
        "Imputed {} value(s) using {}",
        imputation.total_filled(),
        config.impute
    ));
    summary.sentinels_cleared = imputation.sentinels_cleared;
    summary.values_imputed = imputation.total_filled();
    let elapsed = step_start.elapsed();
    summary.record_time("missing values", elapsed);
    print_step_time(elapsed);

    // Step 5: Feature engineering
    print_step_header(5, "Feature Engineering");
    let step_start = Instant::now();
    let (engineered, features) = create_features(&imputed)?;
    print_count("derived feature(s) created", features.created.len(), None);
    for skipped in &features.skipped {
        print_info(&format!(
            "Skipped {} (missing {})",
            skipped.feature,
            skipped.missing.join(", ")
        ));
    }
    summary.features_created = features.created.iter().map(|s| s.to_string()).collect();
    summary.features_skipped = features.skipped.iter().map(|s| s.feature.to_string()).collect();
    let elapsed = step_start.elapsed();
    summary.record_time("features", elapsed);
    print_step_time(elapsed);

    // Step 6: Encoding and target split
    print_step_header(6, "Encode & Split Target");
    let step_start = Instant::now();
    let encoded = encode_categorical(&engineered, &config.target)?;
    print_count("categorical column(s) encoded", encoded.encodings.len(), None);

    let drop_columns: Vec<String> = DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect();
    let split = split_features_target(&encoded.frame, &config.target, &drop_columns)?;
    let labels = split
        .labels
        .ok_or_else(|| AttritionError::MissingColumn(config.target.clone()))
        .context("Target column missing from the merged table")?;
    if !split.dropped.is_empty() {
        print_count(
            "identifier/constant column(s) dropped",
            split.dropped.len(),
            Some(&format!("({})", split.dropped.join(", "))),
        );
    }
    let dataset = Dataset::from_frame(&split.features, &labels)?;
    let (stayed, left) = dataset.class_counts();
    print_success(&format!(
        "{} feature(s); {} stayed, {} left",
        dataset.n_features(),
        stayed,
        left
    ));
    summary.columns_encoded = encoded.encodings.len();
    summary.columns_dropped = split.dropped;
    summary.final_features = dataset.n_features();
    let elapsed = step_start.elapsed();
    summary.record_time("encode", elapsed);
    print_step_time(elapsed);

    // Step 7: Split, balance, scale
    print_step_header(7, "Train/Test Split");
    let step_start = Instant::now();
    let (train, test) = stratified_split(&dataset, config.test_size, config.seed)?;
    let train = if config.smote {
        let before = train.n_samples();
        let balanced = smote(&train, DEFAULT_SMOTE_NEIGHBORS, config.seed);
        summary.synthetic_rows = balanced.n_samples() - before;
        print_count("synthetic minority row(s) added by SMOTE", summary.synthetic_rows, None);
        balanced
    } else {
        print_info("SMOTE disabled; training on the original class balance");
        train
    };
    summary.train_rows = train.n_samples();
    summary.test_rows = test.n_samples();
    let partitions = Partitions::new(train, test)?;
    print_success(&format!(
        "Training: {} rows, test: {} rows",
        summary.train_rows, summary.test_rows
    ));
    let elapsed = step_start.elapsed();
    summary.record_time("split", elapsed);
    print_step_time(elapsed);

    // Step 8: Models
    print_step_header(8, "Train & Compare Models");
    let step_start = Instant::now();
    let spinner = create_spinner("Training classifiers...");
    let comparison = compare_models(default_classifiers(config.seed), &partitions);
    if comparison.failures.is_empty() {
        finish_with_success(&spinner, "All models trained");
    } else {
        finish_with_warning(
            &spinner,
            &format!("{} model(s) failed", comparison.failures.len()),
        );
    }
    let elapsed = step_start.elapsed();
    summary.record_time("models", elapsed);
    print_step_time(elapsed);

    summary.display();
    display_comparison(&comparison, config.top_features);

    if let Some(path) = &cli.export {
        export_analysis(&config, &summary, &comparison, path)?;
        print_success(&format!("Report written to {}", path.display()));
    }

    let best = comparison
        .best()
        .ok_or_else(|| anyhow::anyhow!("Every model failed; nothing to compare"))?;
    println!(
        "\n    Best model: {} (ROC-AUC {:.4}, accuracy {:.4}, F1 {:.4})",
        style(&best.model).green().bold(),
        best.metrics.roc_auc,
        best.metrics.accuracy,
        best.metrics.f1
    );

    print_completion();

    Ok(())
}
