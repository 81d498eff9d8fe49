//! CLI for Benchtrack.
//!
//! This crate provides the `benchtrack` command-line interface: ingesting
//! CI benchmark runs, importing and exporting `data.js` history dumps, and
//! querying trends.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use benchtrack_analyzer::RegressionAnalyzer;
use benchtrack_api::{QueryApi, TimeRange};
use benchtrack_benchmarks::{dump::DEFAULT_SUITE, export_history, import_dump, io, markdown};
use benchtrack_collector::{IngestReport, IngestionService};
use benchtrack_core::Settings;
use benchtrack_storage::SqliteHistoryStore;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Benchtrack CLI.
#[derive(Parser, Debug)]
#[command(name = "benchtrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML).
    #[arg(short, long, global = true, env = "BENCHTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL, overriding the configuration.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Report output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown tables.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest benchmark runs from a JSON file (one run or an array).
    Ingest {
        /// Run file.
        file: PathBuf,

        /// Exit with status 2 if any benchmark regressed.
        #[arg(long)]
        fail_on_regression: bool,

        /// Report format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,

        /// Write the report to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a `data.js` history dump.
    Import {
        /// Dump file.
        file: PathBuf,

        /// Exit with status 2 if any benchmark regressed.
        #[arg(long)]
        fail_on_regression: bool,

        /// Hide the progress bar.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Export stored history as a `data.js` dump.
    Export {
        /// Destination file.
        file: PathBuf,

        /// Suite name of the exported entries.
        #[arg(long, default_value = DEFAULT_SUITE)]
        suite: String,

        /// Repository URL recorded in the dump.
        #[arg(long, default_value = "")]
        repo_url: String,
    },

    /// Show the trend of one benchmark.
    Trend {
        /// Tool name.
        tool: String,

        /// Benchmark name.
        benchmark: String,

        /// Only commits at or after this time (RFC 3339).
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Only commits at or before this time (RFC 3339).
        #[arg(long)]
        to: Option<DateTime<Utc>>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
    },

    /// Show the latest record of one benchmark.
    Latest {
        /// Tool name.
        tool: String,

        /// Benchmark name.
        benchmark: String,
    },

    /// List tools, or the benchmarks of one tool.
    Names {
        /// Tool name.
        tool: Option<String>,
    },
}

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Success,
    /// Regressions were found and `--fail-on-regression` was set.
    RegressionsFound,
}

impl Cli {
    /// Load settings and apply command-line overrides.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings =
            Settings::load(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(database) = &self.database {
            settings.storage.database_url = database.clone();
        }
        if self.json_logs {
            settings.logging.json = true;
        }
        Ok(settings)
    }
}

/// Run the CLI command.
///
/// # Returns
///
/// Returns the command outcome on success, or an error if the command fails.
pub async fn run(cli: Cli, settings: Settings) -> anyhow::Result<Outcome> {
    debug!(database = %settings.storage.database_url, "opening history store");
    let store = Arc::new(
        SqliteHistoryStore::connect(&settings.storage)
            .await
            .with_context(|| format!("failed to open {}", settings.storage.database_url))?,
    );
    let result = execute(cli.command, store.clone(), settings).await;
    store.close().await;
    result
}

async fn execute(
    command: Commands,
    store: Arc<SqliteHistoryStore>,
    settings: Settings,
) -> anyhow::Result<Outcome> {
    let analyzer = RegressionAnalyzer::new(settings.analyzer.clone());
    let service = IngestionService::new(store.clone(), analyzer);
    let query = QueryApi::new(store.clone());

    match command {
        Commands::Ingest {
            file,
            fail_on_regression,
            format,
            output,
        } => {
            let runs = io::read_runs(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mut reports = Vec::with_capacity(runs.len());
            for run in runs {
                reports.push(service.ingest_run(run).await?);
            }

            let rendered = match format {
                ReportFormat::Markdown => markdown::generate_ingest_summary(&reports),
                ReportFormat::Json => serde_json::to_string_pretty(&reports)?,
            };
            emit(&rendered, output.as_deref())?;
            print_totals(&reports);

            let regressed = reports.iter().any(IngestReport::has_regressions);
            Ok(outcome(regressed, fail_on_regression))
        }

        Commands::Import {
            file,
            fail_on_regression,
            quiet,
        } => {
            let data = io::read_dump(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            info!(file = %file.display(), runs = data.run_count(), "importing benchmark dump");

            let progress = if quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(data.run_count() as u64)
            };
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} runs {msg}")?
                    .progress_chars("=> "),
            );

            let summary = import_dump(&service, &data, |report| {
                progress.set_message(report.commit_id.chars().take(7).collect::<String>());
                progress.inc(1);
            })
            .await;
            progress.finish_and_clear();

            for skipped in &summary.skipped {
                eprintln!(
                    "{} {} ({}): {}",
                    "skipped".yellow(),
                    skipped.commit_id,
                    skipped.suite,
                    skipped.reason
                );
            }
            print_totals(&summary.reports);
            Ok(outcome(summary.has_regressions(), fail_on_regression))
        }

        Commands::Export {
            file,
            suite,
            repo_url,
        } => {
            let data = export_history(store.as_ref(), &repo_url, &suite).await?;
            io::write_dump(&data, &file)
                .with_context(|| format!("failed to write {}", file.display()))?;
            println!(
                "{} {} runs to {}",
                "Exported".green(),
                data.run_count(),
                file.display()
            );
            Ok(Outcome::Success)
        }

        Commands::Trend {
            tool,
            benchmark,
            from,
            to,
            format,
        } => {
            let points = query
                .trend(&tool, &benchmark, TimeRange { from, to })
                .await?;
            match format {
                ReportFormat::Markdown => {
                    print!("{}", markdown::generate_trend_table(&tool, &benchmark, &points))
                }
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&points)?),
            }
            Ok(Outcome::Success)
        }

        Commands::Latest { tool, benchmark } => {
            match query.latest(&tool, &benchmark).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => bail!("no records for {tool}/{benchmark}"),
            }
            Ok(Outcome::Success)
        }

        Commands::Names { tool } => {
            let names = match tool {
                Some(tool) => query.benchmarks(&tool).await?,
                None => query.tools().await?,
            };
            for name in names {
                println!("{name}");
            }
            Ok(Outcome::Success)
        }
    }
}

fn outcome(regressed: bool, fail_on_regression: bool) -> Outcome {
    if regressed && fail_on_regression {
        Outcome::RegressionsFound
    } else {
        Outcome::Success
    }
}

fn emit(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => io::write_markdown(content, path)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn print_totals(reports: &[IngestReport]) {
    let mut regressed = 0;
    let mut improved = 0;
    let mut stored = 0;
    let mut duplicate = 0;
    let mut failed = 0;
    for report in reports {
        let summary = report.summary();
        regressed += summary.regressed;
        improved += summary.improved;
        stored += summary.evaluated + summary.analysis_failed;
        duplicate += summary.duplicate;
        failed += summary.rejected + summary.store_failed;
    }

    let regressions = if regressed > 0 {
        format!("{regressed} regressed").red().bold()
    } else {
        "0 regressed".green()
    };
    eprintln!(
        "{} runs: {} stored, {} duplicate, {} failed, {}, {}",
        reports.len(),
        stored,
        duplicate,
        failed,
        format!("{improved} improved").green(),
        regressions
    );
    for verdict in reports.iter().flat_map(IngestReport::regressions) {
        eprintln!("  {} {}", "regressed".red(), verdict);
    }
}
