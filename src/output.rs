//! CLI output formatting for both pipeline stages.
//!
//! Output is information-centric: every entity leads with a positional index
//! and its title, with file paths and failure details as indented context
//! lines. Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! ## Export
//!
//! ```text
//! Diagrams
//! 001 Shop Context (system_context)
//!     Formats: json, plantuml
//! 002 Shop Containers (container)
//!     Formats: json, plantuml, png
//!
//! Failed
//!     Container-Billing: diagram description is invalid: no elements or relationships found
//! ```
//!
//! ## Site
//!
//! ```text
//! Pages
//! 001 index.html
//! 002 diagrams/system-context.html
//!
//! Generated 5 pages, copied 2 assets
//! ```

use crate::generator::ExportReport;
use crate::metadata::DiagramMetadata;
use crate::site::SiteReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format an entity header: positional index + title, with optional detail.
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

const INDENT: &str = "    ";

// ============================================================================
// Stage 1: Export output
// ============================================================================

pub fn format_export_report(report: &ExportReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Diagrams".to_string());
    for (i, view) in report.exported.iter().enumerate() {
        lines.push(entity_header(i + 1, &view.title, Some(&view.diagram_type)));
        lines.push(format!("{INDENT}Key: {}", view.key));
        lines.push(format!("{INDENT}Formats: {}", view.formats.join(", ")));
    }

    if !report.render_failures.is_empty() {
        lines.push(String::new());
        lines.push("Render warnings".to_string());
        for failure in &report.render_failures {
            lines.push(format!("{INDENT}{}: {}", failure.key, failure.error));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for failure in &report.failures {
            lines.push(format!("{INDENT}{}: {}", failure.key, failure.error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Exported {} diagrams, {} failed ({})",
        report.exported.len(),
        report.failures.len(),
        report.cache
    ));
    lines
}

pub fn print_export_report(report: &ExportReport) {
    for line in format_export_report(report) {
        println!("{line}");
    }
}

// ============================================================================
// Check output
// ============================================================================

pub fn format_check_output(records: &[DiagramMetadata]) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("Metadata records".to_string());
    for (i, record) in records.iter().enumerate() {
        lines.push(entity_header(i + 1, &record.title, Some(&record.diagram_type)));
        lines.push(format!("{INDENT}Source: {}", record.file_name()));
        if !record.output_files.is_empty() {
            let formats: Vec<&str> = record.output_files.keys().map(String::as_str).collect();
            lines.push(format!("{INDENT}Formats: {}", formats.join(", ")));
        }
    }
    lines.push(String::new());
    lines.push(format!("{} records loaded", records.len()));
    lines
}

pub fn print_check_output(records: &[DiagramMetadata]) {
    for line in format_check_output(records) {
        println!("{line}");
    }
}

// ============================================================================
// Stage 2: Site output
// ============================================================================

pub fn format_site_report(report: &SiteReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    for (i, page) in report.pages.iter().enumerate() {
        lines.push(entity_header(i + 1, page, None));
    }

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for warning in &report.warnings {
            lines.push(format!("{INDENT}{warning}"));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for failure in &report.failures {
            lines.push(format!("{INDENT}{}: {}", failure.key, failure.error));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} pages, copied {} assets",
        report.pages.len(),
        report.assets_copied
    ));
    lines
}

pub fn print_site_report(report: &SiteReport) {
    for line in format_site_report(report) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ExportedView, ViewFailure};

    #[test]
    fn export_report_lists_views_with_index() {
        let report = ExportReport {
            exported: vec![ExportedView {
                key: "SystemContext-Shop".to_string(),
                title: "Shop Context".to_string(),
                diagram_type: "system_context".to_string(),
                formats: vec!["json".to_string(), "plantuml".to_string()],
            }],
            failures: vec![],
            render_failures: vec![],
            cache: Default::default(),
        };
        let lines = format_export_report(&report);
        assert_eq!(lines[0], "Diagrams");
        assert_eq!(lines[1], "001 Shop Context (system_context)");
        assert!(lines.iter().any(|l| l.contains("Formats: json, plantuml")));
        assert!(lines.last().unwrap().contains("Exported 1 diagrams, 0 failed"));
    }

    #[test]
    fn export_report_shows_failures_section() {
        let report = ExportReport {
            exported: vec![],
            failures: vec![ViewFailure {
                key: "Container-Billing".to_string(),
                error: "no elements or relationships found".to_string(),
            }],
            render_failures: vec![],
            cache: Default::default(),
        };
        let lines = format_export_report(&report);
        assert!(lines.contains(&"Failed".to_string()));
        assert!(lines.iter().any(|l| l.contains("Container-Billing")));
    }

    #[test]
    fn site_report_counts_pages_and_assets() {
        let report = SiteReport {
            pages: vec!["index.html".to_string(), "diagrams/container.html".to_string()],
            assets_copied: 1,
            warnings: vec!["something mild".to_string()],
            failures: vec![],
        };
        let lines = format_site_report(&report);
        assert_eq!(lines[1], "001 index.html");
        assert!(lines.contains(&"Warnings".to_string()));
        assert!(lines.last().unwrap().contains("Generated 2 pages, copied 1 assets"));
    }
}
