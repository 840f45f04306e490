//! Batch command - replay many scripted conversations.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::run::{OutputFormat, ScriptOutcome, format_outcome, run_script};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Script files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each script
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of replaying a single script.
struct ScriptResult {
    path: PathBuf,
    outcome: Option<ScriptOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    script: String,
    conversation_id: &'a str,
    invoice_ready: bool,
    invoice_number: &'a str,
    customer_name: &'a str,
    items: usize,
    total: String,
    error: &'a str,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} scripts to run",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scripts")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let script_start = Instant::now();
        let result = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|script| run_script(&script, &config));
        let processing_time_ms = script_start.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => results.push(ScriptResult {
                path,
                outcome: Some(outcome),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to run {}: {}", path.display(), error_msg);
                    results.push(ScriptResult {
                        path,
                        outcome: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to run {}: {}", path.display(), error_msg);
                    anyhow::bail!("Script failed: {}", error_msg);
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Some(outcome) = &result.outcome else {
                continue;
            };

            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("conversation");
            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            match format_outcome(outcome, args.format) {
                Ok(content) => {
                    fs::write(&output_path, content)?;
                    debug!("Wrote output to {}", output_path.display());
                }
                Err(e) => warn!("Skipping output for {}: {}", result.path.display(), e),
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let completed = results
        .iter()
        .filter(|r| r.outcome.as_ref().is_some_and(|o| o.invoice.is_some()))
        .count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Ran {} scripts in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} produced an invoice, {} incomplete, {} failed",
        style(completed).green(),
        style(results.len() - completed - failed.len()).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed scripts:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ScriptResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for result in results {
        let outcome = result.outcome.as_ref();
        let invoice = outcome.and_then(|o| o.invoice.as_ref());

        wtr.serialize(SummaryRow {
            script: result.path.display().to_string(),
            conversation_id: outcome
                .and_then(|o| o.conversation_id.as_deref())
                .unwrap_or_default(),
            invoice_ready: invoice.is_some(),
            invoice_number: invoice.map(|i| i.invoice_number.as_str()).unwrap_or_default(),
            customer_name: invoice.map(|i| i.customer_name.as_str()).unwrap_or_default(),
            items: invoice.map(|i| i.line_items.len()).unwrap_or_default(),
            total: invoice.map(|i| i.to_data().total).unwrap_or_default(),
            error: result.error.as_deref().unwrap_or_default(),
            processing_time_ms: result.processing_time_ms,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
