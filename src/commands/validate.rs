//! Workspace validation report.

use super::Session;
use crate::analyzer::{self, Severity, ValidationReport};
use crate::prompt::Prompter;
use anyhow::Result;
use colored::Colorize;

/// Validates the workspace and prints the findings, as JSON when asked.
pub fn run<P: Prompter>(session: &Session<P>, json: bool, verbose: bool) -> Result<ValidationReport> {
    let report = analyzer::validate_workspace(&session.root, &session.config, &session.prefs)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(session, &report, verbose);
    }
    Ok(report)
}

fn print_report<P: Prompter>(session: &Session<P>, report: &ValidationReport, verbose: bool) {
    let d = &report.diagnostics;

    if verbose {
        println!(
            "\n{} Files: {}, Registries: {}, Helpers: {} ({} registered)",
            "Diagnostics:".bold(),
            d.files_scanned,
            d.registries,
            d.helpers,
            d.registered_helpers
        );
    }

    if report.findings.is_empty() {
        println!("{} No problems found", "ok:".green().bold());
        return;
    }

    println!(
        "\n{} {} error(s), {} warning(s):\n",
        "Found".red().bold(),
        d.errors,
        d.warnings
    );

    for finding in &report.findings {
        let tag = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warn".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };
        println!(
            "  {} {} {}",
            tag,
            session.display_path(&finding.file).dimmed(),
            finding.message
        );
    }
}
