#![forbid(unsafe_code)]
//! # moodguard CLI
//!
//! Command-line front end for the `moodguard` crate. Reads a CSV with a
//! `text` column, labels every row with a mental-health topic, and prints the
//! distribution, summary and recommendations. Charts, the word cloud and the
//! labeled table are written to a timestamped report directory.
//!
//! ## Example
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --release -- entries.csv --chart both --out reports
//! ```
//!
//! Set `RUST_LOG=info` to follow the stages. See `--help` for all options.

use clap::Parser;
use log::error;
use moodguard::{
    ChartKind, OpenAiClient, Pipeline, Settings, Strategy, read_records_from_path, render_text,
    write_report,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// CSV file with a `text` column
    input: PathBuf,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory that receives the timestamped report folder
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Classification strategy (overrides the config file)
    #[arg(long, value_enum)]
    classifier: Option<Strategy>,

    /// Which topic chart(s) to draw
    #[arg(long, value_enum, default_value_t = ChartKind::Bar)]
    chart: ChartKind,

    /// Word limit for the summary
    #[arg(long)]
    max_words: Option<usize>,

    /// Labeled reference data for the few-shot classifier (URL or CSV path)
    #[arg(long)]
    reference_data: Option<String>,

    /// Print results only; do not write the report directory
    #[arg(long, default_value_t = false)]
    no_export: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = match Settings::from_env(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    if let Some(classifier) = cli.classifier {
        settings.classifier = classifier;
    }
    if let Some(reference) = cli.reference_data {
        settings.reference_data = reference;
    }
    if let Some(max_words) = cli.max_words {
        settings.summary_max_words = max_words;
    }
    if let Err(e) = settings.validate() {
        error!("Configuration error: {}", e);
        process::exit(1);
    }

    let records = match read_records_from_path(&cli.input) {
        Ok(records) => records,
        Err(e) => {
            error!("ingestion stage failed: {}", e);
            process::exit(1);
        }
    };

    let backend = Arc::new(OpenAiClient::new(
        settings.api_key.clone(),
        settings.api_base.clone(),
        settings.model.clone(),
        settings.timeout,
    ));
    let pipeline = match Pipeline::new(&settings, backend) {
        Ok(pipeline) => pipeline.with_charts(cli.chart),
        Err(e) => {
            error!("classification stage failed: {}", e);
            process::exit(1);
        }
    };

    let report = match pipeline.analyze(&records) {
        Ok(report) => report,
        Err(e) => {
            error!("Run aborted at {} stage: {}", e.stage(), e);
            process::exit(1);
        }
    };
    println!("{}", render_text(&report));

    if !cli.no_export {
        match write_report(&report, &cli.out) {
            Ok(dir) => println!("Report written to {}", dir.display()),
            Err(e) => {
                error!("Export failed: {}", e);
                process::exit(1);
            }
        }
    }
}
