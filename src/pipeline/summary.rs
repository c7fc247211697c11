// src/pipeline/summary.rs

//! Plain-text rendering of a check report.

use std::fmt::Write;

use crate::models::{ChartMap, CheckReport};

fn section<T>(out: &mut String, title: &str, map: &ChartMap<T>, noun: &str, nm: impl Fn(&T) -> String) {
    let _ = writeln!(out, "\n=== {title} ===");
    let mut total = 0;
    for (chart, list) in map {
        if list.is_empty() {
            continue;
        }
        total += list.len();
        let _ = writeln!(out, "Chart {chart}: {} {noun}(s)", list.len());
        for item in list {
            let _ = writeln!(out, "  NM {}", nm(item));
        }
    }
    let _ = writeln!(out, "Total: {total}");
}

/// Render a report as the human-readable summary printed by the CLI.
pub fn render_summary(report: &CheckReport) -> String {
    let mut out = String::new();
    let charts: Vec<String> = report.charts.charts().iter().map(u32::to_string).collect();

    let _ = writeln!(out, "Week: {}", report.week);
    let _ = writeln!(out, "Charts: {}", charts.join(", "));
    let _ = writeln!(
        out,
        "Weekly NtM: {}",
        report.weekly_file.as_deref().unwrap_or("NOT FOUND")
    );
    let _ = writeln!(
        out,
        "Section II: {}",
        report.section_ii_file.as_deref().unwrap_or("NOT FOUND")
    );
    let _ = writeln!(out, "PDF count: {}", report.pdf_count);

    section(&mut out, "CORRECTIONS", &report.corrections, "correction", |c| {
        let mut line = c.nm_number.clone();
        if c.is_block_supplement {
            line.push_str(" (chart block)");
        } else if let Some(file) = &c.block_filename {
            let _ = write!(line, " + {file}");
        }
        if let Some(prev) = c.previous_update() {
            let _ = write!(line, " [previous update {prev}]");
        }
        line
    });
    section(&mut out, "NEW T&P NOTICES", &report.tp_notices, "notice", |t| {
        format!("{} ({})", t.nm_number, t.charts_label())
    });

    if report.tp_in_force_available {
        section(&mut out, "T&P IN FORCE", &report.tp_in_force, "notice", |t| {
            format!("{} {}", t.nm_number, t.subject)
        });
    } else {
        let _ = writeln!(out, "\n=== T&P IN FORCE ===\nNot available this week");
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\n=== FAILURES ===");
        for failure in &report.failures {
            let _ = writeln!(out, "  {failure}");
        }
    }
    let _ = writeln!(out, "\nChecked in {}ms", report.duration_ms);
    out
}
