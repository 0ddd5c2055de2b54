//! CLI output formatting.
//!
//! Human-facing summaries of pipeline runs. Output is information-centric:
//! the primary display for every group is its key and post count, with the
//! generated path as trailing context.
//!
//! ```text
//! Tags
//! 001 maps (1 post) → tags/maps/index.html
//! 002 open-data (2 posts) → tags/opendata/index.html
//! Rollup → tags/index.html
//! Skipped 1 key with no usable slug: 日本語
//! Wrote 3 files
//! ```
//!
//! Each summary has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::aggregate::KeySpace;
use crate::rollup::IndexReport;
use crate::search::SearchDocument;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Format the result of an indexing pass.
pub fn format_index_report(report: &IndexReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(match report.mode {
        KeySpace::Date => "Dates".to_string(),
        KeySpace::Authors => "Authors".to_string(),
        KeySpace::Tags => "Tags".to_string(),
    });

    for (pos, group) in report.groups.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}) → {}",
            format_index(pos + 1),
            group.key,
            plural(group.count, "post"),
            group.path.display(),
        ));
    }

    // The rollup is whatever got written beyond the per-group listings.
    if report.written.len() > report.groups.len() {
        if let Some(rollup) = report.written.last() {
            lines.push(format!("Rollup → {}", rollup.display()));
        }
    }

    if !report.skipped.is_empty() {
        lines.push(format!(
            "Skipped {} with no usable slug: {}",
            plural(report.skipped.len(), "key"),
            report.skipped.join(", "),
        ));
    }

    for failed in &report.failed {
        lines.push(format!("Failed → {failed}"));
    }

    lines.push(format!("Wrote {}", plural(report.written.len(), "file")));
    lines
}

pub fn print_index_report(report: &IndexReport) {
    for line in format_index_report(report) {
        println!("{line}");
    }
}

/// Format the result of a search-document extraction pass.
pub fn format_search_report(docs: &[SearchDocument], out_path: &Path) -> Vec<String> {
    let mut lines = vec!["Search".to_string()];

    for (pos, doc) in docs.iter().enumerate() {
        let title = if doc.title.is_empty() {
            "(untitled)"
        } else {
            doc.title.as_str()
        };
        lines.push(format!(
            "{} {} ({}, {}, {})",
            format_index(pos + 1),
            title,
            plural(doc.body.len(), "segment"),
            plural(doc.links.len(), "link"),
            plural(doc.code.len(), "code block"),
        ));
    }

    lines.push(format!(
        "Indexed {} → {}",
        plural(docs.len(), "document"),
        out_path.display(),
    ));
    lines
}

pub fn print_search_report(docs: &[SearchDocument], out_path: &Path) {
    for line in format_search_report(docs, out_path) {
        println!("{line}");
    }
}
