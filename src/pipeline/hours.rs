//! Working-hours features derived from daily clock-in/out timestamps
//!
//! Each employee's arrival and departure rows are paired day by day. A day
//! contributes to the aggregates only when both timestamps parse; the
//! resulting summary carries average/deviation of daily hours plus late
//! arrival and early departure counts and rates.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDateTime, Timelike};
use polars::prelude::*;
use tracing::warn;

use super::frame::{column_names, id_values, string_values, ID_COLUMN};
use crate::error::Result;

/// Arrivals strictly after this time of day are late
pub const LATE_ARRIVAL_CUTOFF: (u32, u32) = (9, 30);

/// Departures strictly before this time of day are early
pub const EARLY_DEPARTURE_CUTOFF: (u32, u32) = (17, 30);

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Output column names, in frame order after `EmployeeID`
pub const HOURS_COLUMNS: [&str; 7] = [
    "AvgWorkingHours",
    "StdWorkingHours",
    "TotalWorkingDays",
    "LateArrivals",
    "EarlyDepartures",
    "LateArrivalRate",
    "EarlyDepartureRate",
];

/// Aggregate attendance behaviour for one employee
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoursSummary {
    pub employee_id: i64,
    /// Mean daily hours, `None` without contributing days
    pub avg_hours: Option<f64>,
    /// Population standard deviation of daily hours
    pub std_hours: Option<f64>,
    /// Days where both timestamps parsed
    pub working_days: usize,
    pub late_arrivals: usize,
    pub early_departures: usize,
}

impl HoursSummary {
    pub fn late_arrival_rate(&self) -> f64 {
        rate(self.late_arrivals, self.working_days)
    }

    pub fn early_departure_rate(&self) -> f64 {
        rate(self.early_departures, self.working_days)
    }
}

fn rate(count: usize, days: usize) -> f64 {
    if days == 0 {
        0.0
    } else {
        count as f64 / days as f64
    }
}

/// Result of the extraction.
///
/// `unmatched_ids` lists employees present in only one of the two tables.
/// They still get a summary row with zero contributing days.
#[derive(Debug, Clone, Default)]
pub struct HoursExtraction {
    pub summaries: Vec<HoursSummary>,
    pub unmatched_ids: Vec<i64>,
}

impl HoursExtraction {
    /// One row per employee with the `HOURS_COLUMNS` metrics
    pub fn to_frame(&self) -> Result<DataFrame> {
        let s = &self.summaries;
        let columns = vec![
            Column::new(ID_COLUMN.into(), s.iter().map(|r| r.employee_id).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[0].into(), s.iter().map(|r| r.avg_hours).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[1].into(), s.iter().map(|r| r.std_hours).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[2].into(), s.iter().map(|r| r.working_days as i64).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[3].into(), s.iter().map(|r| r.late_arrivals as i64).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[4].into(), s.iter().map(|r| r.early_departures as i64).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[5].into(), s.iter().map(|r| r.late_arrival_rate()).collect::<Vec<_>>()),
            Column::new(HOURS_COLUMNS[6].into(), s.iter().map(|r| r.early_departure_rate()).collect::<Vec<_>>()),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

/// Parse a clock timestamp. Empty, `NA` and unrecognized values yield `None`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

pub fn is_late_arrival(arrival: &NaiveDateTime) -> bool {
    let (hour, minute) = LATE_ARRIVAL_CUTOFF;
    arrival.hour() > hour || (arrival.hour() == hour && arrival.minute() > minute)
}

pub fn is_early_departure(departure: &NaiveDateTime) -> bool {
    let (hour, minute) = EARLY_DEPARTURE_CUTOFF;
    departure.hour() < hour || (departure.hour() == hour && departure.minute() < minute)
}

/// Summarize one employee's (arrival, departure) pairs
pub fn summarize_days<'a, I>(employee_id: i64, days: I) -> HoursSummary
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    let mut durations: Vec<f64> = Vec::new();
    let mut late_arrivals = 0;
    let mut early_departures = 0;

    for (arrival, departure) in days {
        let (Some(arrival), Some(departure)) = (
            arrival.and_then(parse_timestamp),
            departure.and_then(parse_timestamp),
        ) else {
            continue;
        };

        // Not clamped: overnight or inverted pairs propagate as computed
        durations.push((departure - arrival).num_seconds() as f64 / 3600.0);

        if is_late_arrival(&arrival) {
            late_arrivals += 1;
        }
        if is_early_departure(&departure) {
            early_departures += 1;
        }
    }

    let (avg_hours, std_hours) = mean_and_std(&durations);

    HoursSummary {
        employee_id,
        avg_hours,
        std_hours,
        working_days: durations.len(),
        late_arrivals,
        early_departures,
    }
}

fn mean_and_std(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (Some(mean), Some(variance.sqrt()))
}

/// Pair the arrival and departure tables and summarize every employee.
///
/// Day columns are matched by label. Rows follow the arrival table's order;
/// employees that only appear in the departure table are appended after it.
pub fn extract_working_hours(arrivals: &DataFrame, departures: &DataFrame) -> Result<HoursExtraction> {
    let day_columns: Vec<String> = column_names(arrivals)
        .into_iter()
        .filter(|c| c != ID_COLUMN)
        .collect();

    let departure_days: Vec<String> = column_names(departures)
        .into_iter()
        .filter(|c| c != ID_COLUMN)
        .collect();
    let (arrival_only, departure_only) = unpaired_days(&day_columns, &departure_days);
    if !arrival_only.is_empty() {
        warn!(
            "{} arrival day column(s) have no departure counterpart and will not contribute (e.g. {})",
            arrival_only.len(),
            arrival_only[0]
        );
    }
    if !departure_only.is_empty() {
        warn!(
            "{} departure day column(s) have no arrival counterpart and will not contribute (e.g. {})",
            departure_only.len(),
            departure_only[0]
        );
    }

    let arrival_ids = id_values(arrivals)?;
    let departure_ids = id_values(departures)?;

    let arrival_rows = index_rows(&arrival_ids, "arrival");
    let departure_rows = index_rows(&departure_ids, "departure");

    // Materialize day columns as strings once; row-wise access follows
    let mut arrival_days: Vec<Vec<Option<String>>> = Vec::with_capacity(day_columns.len());
    let mut departure_values: Vec<Option<Vec<Option<String>>>> = Vec::with_capacity(day_columns.len());
    for day in &day_columns {
        arrival_days.push(string_values(arrivals.column(day)?)?);
        departure_values.push(match departures.column(day) {
            Ok(column) => Some(string_values(column)?),
            Err(_) => None,
        });
    }

    let mut summaries = Vec::with_capacity(arrival_rows.len());
    let mut unmatched: BTreeSet<i64> = BTreeSet::new();
    let mut seen: BTreeSet<i64> = BTreeSet::new();

    for id in arrival_ids.iter().flatten() {
        if !seen.insert(*id) {
            continue;
        }
        let arrival_row = arrival_rows[id];
        let Some(&departure_row) = departure_rows.get(id) else {
            unmatched.insert(*id);
            summaries.push(summarize_days(*id, std::iter::empty()));
            continue;
        };

        let pairs = arrival_days
            .iter()
            .zip(departure_values.iter())
            .map(|(arrival_col, departure_col)| {
                let arrival = arrival_col[arrival_row].as_deref();
                let departure = departure_col
                    .as_ref()
                    .and_then(|col| col[departure_row].as_deref());
                (arrival, departure)
            });
        summaries.push(summarize_days(*id, pairs));
    }

    for id in departure_ids.iter().flatten() {
        if seen.insert(*id) {
            unmatched.insert(*id);
            summaries.push(summarize_days(*id, std::iter::empty()));
        }
    }

    Ok(HoursExtraction {
        summaries,
        unmatched_ids: unmatched.into_iter().collect(),
    })
}

/// Day labels found only in the arrival table, and only in the departure table
pub fn unpaired_days(arrival_days: &[String], departure_days: &[String]) -> (Vec<String>, Vec<String>) {
    let arrivals: BTreeSet<&String> = arrival_days.iter().collect();
    let departures: BTreeSet<&String> = departure_days.iter().collect();
    let arrival_only = arrivals.difference(&departures).map(|d| d.to_string()).collect();
    let departure_only = departures.difference(&arrivals).map(|d| d.to_string()).collect();
    (arrival_only, departure_only)
}

/// Map each id to its first row, warning on repeats
fn index_rows(ids: &[Option<i64>], table: &str) -> HashMap<i64, usize> {
    let mut rows = HashMap::with_capacity(ids.len());
    let mut duplicates = 0usize;
    let mut nulls = 0usize;
    for (row, id) in ids.iter().enumerate() {
        match id {
            Some(id) => {
                if rows.contains_key(id) {
                    duplicates += 1;
                } else {
                    rows.insert(*id, row);
                }
            }
            None => nulls += 1,
        }
    }
    if duplicates > 0 {
        warn!("{} duplicate id row(s) in {} table, keeping first", duplicates, table);
    }
    if nulls > 0 {
        warn!("{} row(s) without an id in {} table were ignored", nulls, table);
    }
    rows
}
