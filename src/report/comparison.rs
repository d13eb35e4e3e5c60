//! Console tables for the model comparison

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::models::{ConfusionMatrix, FeatureImportance, ModelComparison};

fn section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn metric_cell(value: f64) -> Cell {
    Cell::new(format!("{:.4}", value)).set_alignment(CellAlignment::Right)
}

/// Ranked model table, failed models, top features and the best model's errors
pub fn display_comparison(comparison: &ModelComparison, top_features: usize) {
    section("🏆", "MODEL COMPARISON");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        ["#", "Model", "Accuracy", "Precision", "Recall", "F1", "ROC-AUC", "Fit (s)"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for (rank, score) in comparison.scores.iter().enumerate() {
        let name = if rank == 0 {
            Cell::new(&score.model).fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&score.model)
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            name,
            metric_cell(score.metrics.accuracy),
            metric_cell(score.metrics.precision),
            metric_cell(score.metrics.recall),
            metric_cell(score.metrics.f1),
            metric_cell(score.metrics.roc_auc).fg(Color::Cyan),
            Cell::new(format!("{:.2}", score.fit_seconds)).set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);

    if !comparison.failures.is_empty() {
        println!();
        println!(
            "      {} {}:",
            style("Failed models").red(),
            style(format!("({})", comparison.failures.len())).dim()
        );
        for failure in &comparison.failures {
            println!("        {} {}: {}", style("•").dim(), failure.model, style(&failure.message).dim());
        }
    }

    let Some(best) = comparison.best() else {
        return;
    };

    if !comparison.importances.is_empty() {
        display_importances(&best.model, &comparison.importances, top_features);
    }
    display_confusion(&best.model, &best.metrics.confusion_matrix);
}

fn display_importances(model: &str, importances: &[FeatureImportance], top: usize) {
    section("🔍", &format!("TOP {} FEATURES ({})", top.min(importances.len()), model));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Importance").add_attribute(Attribute::Bold),
    ]);
    for entry in importances.iter().take(top) {
        table.add_row(vec![Cell::new(&entry.feature), metric_cell(entry.importance)]);
    }
    print_indented(&table);
}

fn display_confusion(model: &str, cm: &ConfusionMatrix) {
    section("🧮", &format!("CONFUSION MATRIX ({})", model));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new(""),
        Cell::new("Predicted stay").add_attribute(Attribute::Bold),
        Cell::new("Predicted leave").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Stayed").add_attribute(Attribute::Bold),
        Cell::new(cm.tn).fg(Color::Green),
        Cell::new(cm.fp).fg(Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Left").add_attribute(Attribute::Bold),
        Cell::new(cm.fn_).fg(Color::Red),
        Cell::new(cm.tp).fg(Color::Green),
    ]);
    print_indented(&table);
}
