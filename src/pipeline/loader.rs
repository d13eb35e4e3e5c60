//! Source loader for the HR tables and clock-in/out records

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{info, warn};
use ::zip::ZipArchive;

use super::frame::{is_text, ID_COLUMN};
use super::missing::NOT_ANSWERED;
use crate::error::{AttritionError, Result};

/// Locations of the four HR sources
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub general: PathBuf,
    pub manager_survey: PathBuf,
    pub employee_survey: PathBuf,
    pub clock: ClockSource,
}

impl SourcePaths {
    /// Default file names inside a data directory
    pub fn from_data_dir(dir: &Path) -> Self {
        Self {
            general: dir.join("general_data.csv"),
            manager_survey: dir.join("manager_survey_data.csv"),
            employee_survey: dir.join("employee_survey_data.csv"),
            clock: ClockSource {
                in_time: Some(dir.join("in_time.csv")),
                out_time: Some(dir.join("out_time.csv")),
                archive: Some(dir.join("in_out_time.zip")),
            },
        }
    }
}

/// The clock-in/out data can be supplied as two CSV files, a zip archive, or both.
/// Paired files are tried first.
#[derive(Debug, Clone, Default)]
pub struct ClockSource {
    pub in_time: Option<PathBuf>,
    pub out_time: Option<PathBuf>,
    pub archive: Option<PathBuf>,
}

/// Arrival and departure tables, one row per employee and one column per day
#[derive(Debug, Clone)]
pub struct ClockTables {
    pub arrivals: DataFrame,
    pub departures: DataFrame,
}

/// All loaded sources. `clock` is `None` when no usable clock data was found.
#[derive(Debug, Clone)]
pub struct HrSources {
    pub general: DataFrame,
    pub manager_survey: DataFrame,
    pub employee_survey: DataFrame,
    pub clock: Option<ClockTables>,
}

/// Load every source. Missing or malformed survey tables abort; clock data is optional.
pub fn load_sources(paths: &SourcePaths, infer_schema_length: usize) -> Result<HrSources> {
    // Survey tables keep their raw "NA" text for the missing-value handler
    let general = load_keyed_table_with_nulls(&paths.general, infer_schema_length, Some(NOT_ANSWERED))?;
    let manager_survey = load_keyed_table(&paths.manager_survey, infer_schema_length)?;
    let employee_survey = load_keyed_table(&paths.employee_survey, infer_schema_length)?;
    let clock = load_clock_tables(&paths.clock, infer_schema_length);

    Ok(HrSources {
        general,
        manager_survey,
        employee_survey,
        clock,
    })
}

/// Load a CSV table with a header row
pub fn load_table(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    load_table_with_nulls(path, infer_schema_length, None)
}

/// Load a CSV table, reading `null_marker` cells as null in every column
pub fn load_table_with_nulls(path: &Path, infer_schema_length: usize, null_marker: Option<&str>) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AttritionError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(schema_length(infer_schema_length))
        .map_parse_options(|opts| opts.with_null_values(null_values(null_marker)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| malformed(&path.display().to_string(), e))?;

    info!(
        source = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

/// Load a table that must carry an integer `EmployeeID` column
pub fn load_keyed_table(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    load_keyed_table_with_nulls(path, infer_schema_length, None)
}

fn load_keyed_table_with_nulls(path: &Path, infer_schema_length: usize, null_marker: Option<&str>) -> Result<DataFrame> {
    let df = load_table_with_nulls(path, infer_schema_length, null_marker)?;
    coerce_id_column(df, &path.display().to_string())
}

/// Load the clock tables from paired files, falling back to the archive.
///
/// Failures are logged and the next supply mode is tried. Returns `None` if
/// no mode yields both tables.
pub fn load_clock_tables(source: &ClockSource, infer_schema_length: usize) -> Option<ClockTables> {
    if let (Some(in_path), Some(out_path)) = (&source.in_time, &source.out_time) {
        if in_path.exists() && out_path.exists() {
            match load_clock_pair(in_path, out_path, infer_schema_length) {
                Ok(tables) => return Some(tables),
                Err(e) => warn!("Could not load clock files: {}", e),
            }
        }
    }

    if let Some(archive) = &source.archive {
        if archive.exists() {
            match load_clock_archive(archive, infer_schema_length) {
                Ok(Some(tables)) => return Some(tables),
                Ok(None) => warn!(
                    "Archive {} does not contain both in_time and out_time tables",
                    archive.display()
                ),
                Err(e) => warn!("Could not load clock archive: {}", e),
            }
        }
    }

    info!("clock-in/out data unavailable, working-hours features will be skipped");
    None
}

fn load_clock_pair(in_path: &Path, out_path: &Path, infer_schema_length: usize) -> Result<ClockTables> {
    let arrivals = load_table(in_path, infer_schema_length)?;
    let departures = load_table(out_path, infer_schema_length)?;

    Ok(ClockTables {
        arrivals: normalize_clock_table(arrivals, &in_path.display().to_string())?,
        departures: normalize_clock_table(departures, &out_path.display().to_string())?,
    })
}

/// Read both clock tables from a zip archive.
///
/// Members are matched by case-insensitive substring (`in_time` / `out_time`),
/// the first match wins.
pub fn load_clock_archive(path: &Path, infer_schema_length: usize) -> Result<Option<ClockTables>> {
    if !path.exists() {
        return Err(AttritionError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut arrivals: Option<DataFrame> = None;
    let mut departures: Option<DataFrame> = None;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let lowered = name.to_lowercase();
        // Resource forks added by macOS archivers
        if lowered.contains("__macosx") || lowered.rsplit('/').next().is_some_and(|f| f.starts_with("._")) {
            continue;
        }

        let slot = if lowered.contains("in_time") {
            &mut arrivals
        } else if lowered.contains("out_time") {
            &mut departures
        } else {
            continue;
        };
        if slot.is_some() {
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        let df = read_csv_bytes(bytes, &name, infer_schema_length)?;
        info!(
            member = %name,
            rows = df.height(),
            columns = df.width(),
            "loaded archive member"
        );
        *slot = Some(normalize_clock_table(df, &name)?);
    }

    Ok(match (arrivals, departures) {
        (Some(arrivals), Some(departures)) => Some(ClockTables {
            arrivals,
            departures,
        }),
        _ => None,
    })
}

fn read_csv_bytes(bytes: Vec<u8>, name: &str, infer_schema_length: usize) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(schema_length(infer_schema_length))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| malformed(name, e))
}

/// Rename an auto-named first column to `EmployeeID` and coerce it to integers
pub fn normalize_clock_table(mut df: DataFrame, source_name: &str) -> Result<DataFrame> {
    let first = df
        .get_column_names()
        .first()
        .map(|s| s.to_string())
        .ok_or_else(|| AttritionError::MalformedSource {
            source_name: source_name.to_string(),
            message: "table has no columns".to_string(),
        })?;

    if first != ID_COLUMN && is_auto_named(&first) {
        df.rename(&first, ID_COLUMN.into())?;
    }

    coerce_id_column(df, source_name)
}

/// Header names produced for an empty header cell
fn is_auto_named(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.starts_with("Unnamed") || name.starts_with("column_")
}

/// Make sure `EmployeeID` exists and is Int64, stripping quotes from text ids
pub fn coerce_id_column(mut df: DataFrame, source_name: &str) -> Result<DataFrame> {
    let column = df
        .column(ID_COLUMN)
        .map_err(|_| AttritionError::MalformedSource {
            source_name: source_name.to_string(),
            message: format!("missing '{}' column", ID_COLUMN),
        })?;

    let ids = if is_text(column) {
        let mut parsed: Vec<Option<i64>> = Vec::with_capacity(column.len());
        for value in column.str()?.into_iter() {
            match value {
                None => parsed.push(None),
                Some(raw) => {
                    let cleaned = raw.trim().trim_matches('"').trim();
                    let id = cleaned.parse::<i64>().map_err(|_| AttritionError::MalformedSource {
                        source_name: source_name.to_string(),
                        message: format!("non-integer {} value '{}'", ID_COLUMN, raw),
                    })?;
                    parsed.push(Some(id));
                }
            }
        }
        Column::new(ID_COLUMN.into(), parsed)
    } else {
        column.cast(&DataType::Int64)?
    };

    df.with_column(ids)?;
    Ok(df)
}

fn null_values(null_marker: Option<&str>) -> Option<NullValues> {
    null_marker.map(|marker| NullValues::AllColumnsSingle(marker.into()))
}

/// Convert schema length: 0 means full scan
fn schema_length(infer_schema_length: usize) -> Option<usize> {
    if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    }
}

fn malformed(source_name: &str, error: PolarsError) -> AttritionError {
    AttritionError::MalformedSource {
        source_name: source_name.to_string(),
        message: error.to_string(),
    }
}
