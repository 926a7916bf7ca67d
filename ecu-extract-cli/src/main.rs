//! ECU Extract CLI Application
//!
//! Command-line front-end for the ecu-extract-core library:
//! - `parse` reads one ECU extract and summarizes it
//! - `compare` diffs two revisions of an extract
//!
//! Output is a text report or JSON with a report header.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecu_extract_core::{ExtractConfig, ParsedDocument};
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::ReportHeader;

/// ECU Extract - Parse and compare AUTOSAR ECU extracts
#[derive(Parser, Debug)]
#[command(name = "ecu-extract")]
#[command(about = "Parse and compare AUTOSAR ECU extracts (ARXML)", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Report format (overrides the config file)
    #[arg(short, long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse one extract and summarize its contents
    Parse {
        /// ARXML file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Compare two revisions of an extract
    Compare {
        /// Baseline ARXML file
        #[arg(value_name = "BASE")]
        base: PathBuf,
        /// Revised ARXML file
        #[arg(value_name = "NEW")]
        new: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("ECU Extract CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using extract library v{}", ecu_extract_core::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(format) = args.format {
        config.output.format = format;
    }

    let (content, default_name) = match &args.command {
        Command::Parse { file } => (run_parse(file, &config)?, file_stem(file)),
        Command::Compare { base, new } => (
            run_compare(base, new, &config)?,
            format!("{}_vs_{}", file_stem(base), file_stem(new)),
        ),
    };

    let target = args.output.clone().or_else(|| {
        config.output.output_dir.as_ref().map(|dir| {
            dir.join(format!("{}.{}", default_name, config.output.format.extension()))
        })
    });
    write_output(&content, target.as_deref())
}

fn run_parse(file: &Path, config: &AppConfig) -> Result<String> {
    let doc = load_extract(file, &config.extract)?;

    match config.output.format {
        OutputFormat::Txt => Ok(report::render_parse_txt(&report::display_name(file), &doc)),
        OutputFormat::Json => {
            let header = ReportHeader::new(&[file]);
            report::render_json(&header, &doc, config.output.pretty)
        }
    }
}

fn run_compare(base: &Path, new: &Path, config: &AppConfig) -> Result<String> {
    let (base_doc, new_doc) = rayon::join(
        || load_extract(base, &config.extract),
        || load_extract(new, &config.extract),
    );
    let (base_doc, new_doc) = (base_doc?, new_doc?);

    let result = ecu_extract_core::compare(&base_doc, &new_doc);
    let summary = result.summary();
    log::info!(
        "Differences: {} added, {} deleted, {} modified",
        summary.total.added,
        summary.total.deleted,
        summary.total.modified
    );

    match config.output.format {
        OutputFormat::Txt => Ok(report::render_compare_txt(
            &report::display_name(base),
            &report::display_name(new),
            &result,
        )),
        OutputFormat::Json => {
            let header = ReportHeader::new(&[base, new]);
            report::render_json(&header, &result, config.output.pretty)
        }
    }
}

fn load_extract(path: &Path, config: &ExtractConfig) -> Result<ParsedDocument> {
    ecu_extract_core::parse_file(path, config)
        .with_context(|| format!("Failed to parse ECU extract: {:?}", path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string())
}

/// Write a rendered report to a file, or stdout when no target is given
fn write_output(content: &str, target: Option<&Path>) -> Result<()> {
    match target {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
