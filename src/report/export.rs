//! JSON export of a full analysis run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::cli::PipelineConfig;
use crate::models::ModelComparison;
use crate::report::PreparationSummary;

/// Metadata about the analysis run
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    /// RFC 3339 timestamp of the export
    pub timestamp: String,
    pub version: String,
    pub config: PipelineConfig,
}

#[derive(Debug, Serialize)]
pub struct AnalysisExport<'a> {
    pub metadata: RunMetadata,
    pub preparation: &'a PreparationSummary,
    pub comparison: &'a ModelComparison,
}

/// Write the run configuration, preparation summary and ranked models as JSON
pub fn export_analysis(
    config: &PipelineConfig,
    preparation: &PreparationSummary,
    comparison: &ModelComparison,
    output_path: &Path,
) -> Result<()> {
    let export = AnalysisExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: config.clone(),
        },
        preparation,
        comparison,
    };

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize analysis to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write analysis to {}", output_path.display()))?;

    Ok(())
}
