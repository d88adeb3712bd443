//! Command implementation: load the table, export it, report

use crate::cli::args::Args;
use crate::error::OdvError;
use crate::exporter::OdvExporter;
use crate::models::{ExportStats, ObservationTable};

use anyhow::{Context, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Run an export as described by the command-line arguments
pub fn run(args: Args) -> Result<ExportStats> {
    setup_logging(&args)?;
    let start_time = Instant::now();

    let mut table = load_table(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    apply_attributes(&mut table, &args);
    info!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_columns(),
        args.input.display()
    );

    let output_path = args.output_path();
    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    let progress_bar = if args.show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")?,
        );
        pb.set_message("exporting...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let exporter = OdvExporter::new(args.to_config());
    let stats = exporter
        .export_with_progress(&mut table, BufWriter::new(file), progress_bar.as_ref())
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    if !args.quiet {
        print_summary(&stats, &output_path, start_time.elapsed());
    }
    Ok(stats)
}

/// Set up structured logging
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("odv_exporter={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Read a CSV or Parquet file into an observation table
pub fn load_table(path: &Path) -> Result<ObservationTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let frame = match extension.as_deref() {
        Some("csv") => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()?
            .collect()?,
        Some("parquet") => LazyFrame::scan_parquet(path, ScanArgsParquet::default())?.collect()?,
        _ => {
            return Err(OdvError::invalid_argument(format!(
                "unsupported input format for {} (expected .csv or .parquet)",
                path.display()
            ))
            .into());
        }
    };

    Ok(ObservationTable::new(frame))
}

/// Attach the attributes given on the command line
pub fn apply_attributes(table: &mut ObservationTable, args: &Args) {
    for (key, value) in &args.global_attributes {
        table.set_global_attribute(key.as_str(), value.as_str());
    }
    for attribute in &args.column_attributes {
        if table.find_column(&attribute.column).is_none() {
            tracing::warn!(
                "Attribute {} given for unknown column {}",
                attribute.key,
                attribute.column
            );
        }
        table.set_column_attribute(
            attribute.column.as_str(),
            attribute.key.as_str(),
            attribute.value.as_str(),
        );
    }
}

fn print_summary(stats: &ExportStats, output_path: &Path, elapsed: Duration) {
    println!("\n{}", "ODV export complete".bright_green().bold());
    println!(
        "  {} {}",
        "Rows written:".bright_cyan(),
        stats.rows_written.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Data columns:".bright_cyan(),
        stats.data_columns.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Primary variable:".bright_cyan(),
        stats.primary_variable.as_deref().unwrap_or("none")
    );
    println!("  {} {}", "CDI references:".bright_cyan(), stats.references);
    if stats.warnings > 0 {
        println!(
            "  {} {} (see file header)",
            "Warnings:".bright_yellow(),
            stats.warnings.to_string().bright_yellow().bold()
        );
    }
    println!("  {} {}", "Output:".bright_cyan(), output_path.display());
    println!("  {} {}", "Time:".bright_cyan(), HumanDuration(elapsed));
}
