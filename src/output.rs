//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Reports lead with what the user acts on (the page and what is wrong with
//! it) and put counts in a closing summary line. Detail lines are indented
//! four spaces per level under the entity they describe.
//!
//! # Output Format
//!
//! ## Lint
//!
//! ```text
//! blog/third-post.html
//!     article:published_time: Missing article:published_time for blog post
//!
//! Checked 7 files: 1 with problems, 1 violation
//! ```
//!
//! ## Generate
//!
//! ```text
//! Sitemap → sitemap.xml (7 URLs)
//! Robots → robots.txt
//! Feed → blog/rss.xml (2 items)
//!     001 Second Post
//!     002 First Post
//!
//! Left out of feed
//!     blog/third-post.html
//!         missing article:published_time
//! ```
//!
//! ## Inject beacon
//!
//! ```text
//! Updated: about.html
//! Updated: index.html
//! Done. Processed 7 HTML files, updated 2.
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::beacon::BeaconReport;
use crate::generate::{GenerateReport, PageProblem, ScannedPage};
use crate::lint::LintReport;
use crate::theme::{self, Theme};
use crate::types::{PageKind, PageRecord};
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `n` followed by `singular`, pluralized with a trailing `s` when needed.
fn count(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {singular}s")
    }
}

/// Path relative to the site root for display, forward slashes.
fn display_path(path: &Path, root: &Path) -> String {
    crate::scan::relative_path(path, root)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Lint
// ============================================================================

/// Format lint results grouped by file, followed by a summary line.
pub fn format_lint_report(report: &LintReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;

    for violation in &report.violations {
        if current != Some(violation.file.as_str()) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(violation.file.clone());
            current = Some(violation.file.as_str());
        }
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            violation.rule,
            violation.message
        ));
    }

    if !report.violations.is_empty() {
        lines.push(String::new());
    }
    if report.is_clean() {
        lines.push(format!(
            "Checked {}: no problems",
            count(report.files_checked, "file")
        ));
    } else {
        lines.push(format!(
            "Checked {}: {} with problems, {}",
            count(report.files_checked, "file"),
            report.failing_files(),
            count(report.violations.len(), "violation")
        ));
    }
    lines
}

pub fn print_lint_report(report: &LintReport) {
    print_lines(format_lint_report(report));
}

// ============================================================================
// Generate
// ============================================================================

/// Format the artifacts written by a generate run and anything left out.
pub fn format_generate_report(report: &GenerateReport, root: &Path) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Sitemap \u{2192} {} ({})",
            display_path(&report.sitemap_path, root),
            count(report.sitemap_urls, "URL")
        ),
        format!(
            "Robots \u{2192} {}",
            display_path(&report.robots_path, root)
        ),
        format!(
            "Feed \u{2192} {} ({})",
            display_path(&report.feed_path, root),
            count(report.feed_items.len(), "item")
        ),
    ];
    for (i, title) in report.feed_items.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), title));
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Left out of feed".to_string());
        for page in &report.skipped {
            lines.push(format!("{}{}", indent(1), page.path));
            for issue in &page.issues {
                lines.push(format!("{}{}", indent(2), issue));
            }
        }
    }

    if !report.unparseable.is_empty() {
        lines.push(String::new());
        lines.push("Unparseable".to_string());
        for (path, error) in &report.unparseable {
            lines.push(format!("{}{}", indent(1), path));
            lines.push(format!("{}{}", indent(2), error));
        }
    }

    lines
}

pub fn print_generate_report(report: &GenerateReport, root: &Path) {
    print_lines(format_generate_report(report, root));
}

// ============================================================================
// Inject beacon
// ============================================================================

/// Format a beacon injection run: one line per updated file, then totals.
pub fn format_beacon_report(report: &BeaconReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .updated
        .iter()
        .map(|path| format!("Updated: {path}"))
        .collect();
    for path in &report.without_head {
        lines.push(format!("No </head>: {path}"));
    }
    for (path, reason) in &report.unreadable {
        lines.push(format!("Unreadable: {path} ({reason})"));
    }
    lines.push(format!(
        "Done. Processed {} HTML files, updated {}.",
        report.processed,
        report.updated.len()
    ));
    lines
}

pub fn print_beacon_report(report: &BeaconReport) {
    print_lines(format_beacon_report(report));
}

// ============================================================================
// Inspect
// ============================================================================

/// One page as shown by `inspect`: the full record, or why there is none.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum InspectEntry<'a> {
    Ok(&'a PageRecord),
    Unparseable {
        path: &'a str,
        kind: PageKind,
        url: &'a str,
        error: &'a str,
    },
    Incomplete {
        path: &'a str,
        kind: PageKind,
        url: &'a str,
        issues: &'a [crate::types::FieldIssue],
    },
}

impl<'a> From<&'a ScannedPage> for InspectEntry<'a> {
    fn from(page: &'a ScannedPage) -> Self {
        match &page.record {
            Ok(record) => InspectEntry::Ok(record),
            Err(PageProblem::Unparseable { error }) => InspectEntry::Unparseable {
                path: &page.path,
                kind: page.kind,
                url: &page.url,
                error,
            },
            Err(PageProblem::Incomplete { issues }) => InspectEntry::Incomplete {
                path: &page.path,
                kind: page.kind,
                url: &page.url,
                issues,
            },
        }
    }
}

/// Pretty JSON array with one entry per page, in scan order.
pub fn format_inspect(pages: &[ScannedPage]) -> Result<String, serde_json::Error> {
    let entries: Vec<InspectEntry<'_>> = pages.iter().map(InspectEntry::from).collect();
    serde_json::to_string_pretty(&entries)
}

// ============================================================================
// Theme snippet
// ============================================================================

/// The bootstrap script for `<head>` and the button for the page body.
pub fn format_theme_snippet(initial: Theme) -> Vec<String> {
    vec![
        "<!-- in <head> -->".to_string(),
        theme::init_script().into_string(),
        String::new(),
        "<!-- in <body> -->".to_string(),
        theme::toggle_button(initial).into_string(),
    ]
}

pub fn print_theme_snippet(initial: Theme) {
    print_lines(format_theme_snippet(initial));
}

// ============================================================================
// Tests
// ============================================================================
