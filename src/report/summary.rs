//! Data preparation summary

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

/// What each preparation step did to the data
#[derive(Debug, Default, Clone, Serialize)]
pub struct PreparationSummary {
    pub employees: usize,
    pub working_hours_available: bool,
    /// Employees with clock rows in only one of the two tables
    pub unmatched_clock_ids: usize,
    pub sentinels_cleared: usize,
    pub values_imputed: usize,
    pub features_created: Vec<String>,
    pub features_skipped: Vec<String>,
    pub columns_encoded: usize,
    pub columns_dropped: Vec<String>,
    pub final_features: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub synthetic_rows: usize,
    #[serde(skip)]
    pub step_times: Vec<(String, Duration)>,
}

impl PreparationSummary {
    pub fn new(employees: usize) -> Self {
        Self {
            employees,
            ..Default::default()
        }
    }

    pub fn record_time(&mut self, step: &str, elapsed: Duration) {
        self.step_times.push((step.to_string(), elapsed));
    }

    pub fn total_time(&self) -> Duration {
        self.step_times.iter().map(|(_, d)| *d).sum()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PREPARATION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("👥 Employees"), Cell::new(self.employees)]);
        table.add_row(vec![
            Cell::new("🕘 Working hours"),
            if self.working_hours_available {
                Cell::new("merged").fg(Color::Green)
            } else {
                Cell::new("unavailable").fg(Color::Yellow)
            },
        ]);
        table.add_row(vec![
            Cell::new("❓ Values imputed"),
            Cell::new(self.values_imputed).fg(if self.values_imputed == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("✨ Features created"),
            Cell::new(self.features_created.len()).fg(Color::Cyan),
        ]);
        table.add_row(vec![
            Cell::new("🔤 Columns encoded"),
            Cell::new(self.columns_encoded),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Columns dropped"),
            Cell::new(self.columns_dropped.len()).fg(if self.columns_dropped.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Final features"),
            Cell::new(self.final_features)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("✂️  Train / test rows"),
            Cell::new(format!("{} / {}", self.train_rows, self.test_rows)),
        ]);
        if self.synthetic_rows > 0 {
            table.add_row(vec![
                Cell::new("🧪 SMOTE rows"),
                Cell::new(self.synthetic_rows).fg(Color::Cyan),
            ]);
        }
        table.add_row(vec![
            Cell::new("⏱  Total time"),
            Cell::new(format!("{:.2}s", self.total_time().as_secs_f64())),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.features_skipped.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Skipped features").yellow(),
                style(format!("({})", self.features_skipped.len())).dim()
            );
            for feature in &self.features_skipped {
                println!("        {} {}", style("•").dim(), feature);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_time_sums_steps() {
        let mut summary = PreparationSummary::new(3);
        summary.record_time("load", Duration::from_millis(200));
        summary.record_time("merge", Duration::from_millis(300));
        assert_eq!(summary.total_time(), Duration::from_millis(500));
    }
}
