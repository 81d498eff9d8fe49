//! Markdown output generation.
//!
//! This module renders ingestion reports and trends as markdown, e.g. for
//! pull request comments or CI job summaries.

use benchtrack_analyzer::Classification;
use benchtrack_api::TrendPoint;
use benchtrack_collector::{IngestReport, OutcomeStatus};
use benchtrack_core::payload::format_range;
use std::fmt::{self, Write};

/// Generate a markdown summary of one or more ingestion reports.
pub fn generate_ingest_summary(reports: &[IngestReport]) -> String {
    let mut output = String::new();
    // writing into a String cannot fail
    let _ = write_ingest_summary(&mut output, reports);
    output
}

/// Generate a markdown table of a trend.
pub fn generate_trend_table(tool: &str, benchmark: &str, points: &[TrendPoint]) -> String {
    let mut output = String::new();
    let _ = write_trend_table(&mut output, tool, benchmark, points);
    output
}

fn write_ingest_summary(output: &mut String, reports: &[IngestReport]) -> fmt::Result {
    writeln!(output, "# Benchmark Summary")?;
    writeln!(output)?;

    for report in reports {
        writeln!(output, "## {} @ `{}`", report.tool, short_id(&report.commit_id))?;
        writeln!(output)?;
        writeln!(output, "| Benchmark | Value | Baseline | Change | Result |")?;
        writeln!(output, "|-----------|-------|----------|--------|--------|")?;

        for outcome in &report.outcomes {
            match &outcome.status {
                OutcomeStatus::Evaluated { verdict, .. } => {
                    let result = if verdict.insufficient_history {
                        "stable (insufficient history)".to_string()
                    } else {
                        format!("{} {}", badge(verdict.classification), verdict.classification)
                    };
                    let baseline = if verdict.baseline.is_empty() {
                        "-".to_string()
                    } else {
                        format!("{:.0} {}", verdict.baseline.center(), verdict.unit)
                    };
                    writeln!(
                        output,
                        "| {} | {} {} | {} | {:+.2}% | {} |",
                        outcome.benchmark,
                        verdict.value,
                        verdict.unit,
                        baseline,
                        verdict.delta_percent(),
                        result
                    )?;
                }
                OutcomeStatus::Duplicate => {
                    writeln!(output, "| {} | - | - | - | already recorded |", outcome.benchmark)?;
                }
                OutcomeStatus::Rejected { reason, .. } => {
                    writeln!(output, "| {} | - | - | - | rejected: {} |", outcome.benchmark, reason)?;
                }
                OutcomeStatus::StoreFailed { reason } => {
                    writeln!(output, "| {} | - | - | - | store failure: {} |", outcome.benchmark, reason)?;
                }
                OutcomeStatus::AnalysisFailed { reason } => {
                    writeln!(output, "| {} | - | - | - | not analyzed: {} |", outcome.benchmark, reason)?;
                }
            }
        }
        writeln!(output)?;
    }

    let regressions: usize = reports.iter().map(|r| r.summary().regressed).sum();
    writeln!(output, "---")?;
    writeln!(output, "Runs: {}, regressions: {}", reports.len(), regressions)?;
    Ok(())
}

fn write_trend_table(output: &mut String, tool: &str, benchmark: &str, points: &[TrendPoint]) -> fmt::Result {
    writeln!(output, "# {tool} / {benchmark}")?;
    writeln!(output)?;
    if points.is_empty() {
        writeln!(output, "No data.")?;
        return Ok(());
    }

    writeln!(output, "| Commit | Timestamp | Value | Range |")?;
    writeln!(output, "|--------|-----------|-------|-------|")?;
    for point in points {
        writeln!(
            output,
            "| [`{}`]({}) | {} | {} {} | {} |",
            short_id(&point.commit.id),
            point.commit.url,
            point.commit.timestamp.format("%Y-%m-%d %H:%M:%S %:z"),
            point.value,
            point.unit,
            format_range(point.range)
        )?;
    }
    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(output, "Points: {}", points.len())?;
    Ok(())
}

fn badge(classification: Classification) -> &'static str {
    match classification {
        Classification::Regressed => "🔴",
        Classification::Improved => "🟢",
        Classification::Stable => "⚪",
    }
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
