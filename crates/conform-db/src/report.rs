//! Tabular comparison report.
//!
//! Plain-text rendering of a comparison outcome. Entries keep their signed
//! deltas so a richer front-end can color positive/negative cells; this
//! renderer just prints them with explicit signs.

use std::fmt::Write as _;

use crate::compare::{Category, ComparisonOutcome};

/// Render the outcome as a fixed-width table.
pub fn render_table(outcome: &ComparisonOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:<32} {:>8} {:>8}",
        "Category", "Shot", "Δstart", "Δend"
    );
    let _ = writeln!(out, "{}", "-".repeat(66));
    for category in Category::ALL {
        for entry in outcome.entries(category) {
            let _ = writeln!(
                out,
                "{:<14} {:<32} {:>8} {:>8}",
                category.label(),
                entry.shot,
                format_delta(entry.start_diff),
                format_delta(entry.end_diff),
            );
        }
    }
    out
}

fn format_delta(delta: Option<i64>) -> String {
    match delta {
        Some(value) => format!("{value:+}"),
        None => "-".to_string(),
    }
}
