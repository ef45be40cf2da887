//! Command-line interface wiring for the `cardsheet` binary.
//!
//! This module owns the clap definitions and turns them into a
//! [`SheetConfig`] and a [`LogConfig`] for the library.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cardsheet::logging::LogConfig;
use cardsheet::{LayoutFile, ResourcePaths, SheetConfig, SheetError, SheetReport, generate_sheet};
use clap::Parser;
use log::{error, info, warn};

pub mod utils;

/// Parsed CLI entrypoint for the `cardsheet` binary.
#[derive(Parser, Debug)]
#[command(
    name = "cardsheet",
    version,
    about = "Lay out business cards with EAN-13 backs on a duplex PDF"
)]
pub struct Cli {
    /// Verbose output: debug level, timestamps and a log file.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Directory holding the record file, template and font
    /// (default: `data/` next to the executable).
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Record file (CSV: name, number, extra).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Front card template image.
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// TrueType font used for all text.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Output PDF.
    #[arg(short = 'o', long, default_value = "cards.pdf")]
    pub output: PathBuf,

    /// JSON file overriding page layout and render settings.
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Directory for temporary rasters (default: fresh directory beside the output).
    #[arg(long = "work-dir")]
    pub work_dir: Option<PathBuf>,

    /// Treat the first CSV row as data.
    #[arg(long = "no-header")]
    pub no_header: bool,

    /// Log file written in debug mode.
    #[arg(long = "log-file", requires = "debug")]
    pub log_file: Option<PathBuf>,

    /// Never wait for Enter after a failure.
    #[arg(long = "no-pause")]
    pub no_pause: bool,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbose: self.debug,
            log_path: self.log_file.clone(),
        }
    }

    pub fn sheet_config(&self) -> Result<SheetConfig> {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(ResourcePaths::default_data_dir);
        let mut resources = ResourcePaths::in_dir(&data_dir);
        if let Some(input) = &self.input {
            resources.records = input.clone();
        }
        if let Some(template) = &self.template {
            resources.template = template.clone();
        }
        if let Some(font) = &self.font {
            resources.font = font.clone();
        }

        let mut config = SheetConfig::new(resources, self.output.clone());
        if let Some(path) = &self.layout {
            let file = LayoutFile::load(path)
                .with_context(|| format!("failed to load layout {}", path.display()))?;
            config.layout = file.layout;
            config.render = file.render;
        }
        config.work_dir = self.work_dir.clone();
        config.has_header = !self.no_header;
        Ok(config)
    }
}

/// Execute a full run.
pub fn run(cli: &Cli) -> Result<SheetReport> {
    let config = cli.sheet_config()?;
    let report = generate_sheet(&config)
        .with_context(|| format!("failed to generate {}", config.output.display()))?;
    if !report.skipped.is_empty() {
        info!("{} row(s) skipped", report.skipped.len());
    }
    if !report.cleanup_failures.is_empty() {
        warn!(
            "Could not remove {} temporary file(s)",
            report.cleanup_failures.len()
        );
    }
    println!("{}", report.output.display());
    Ok(report)
}

/// Log a failed run; in quiet mode add a hint about `--debug`.
pub fn report_failure(cli: &Cli, err: &anyhow::Error) {
    error!("{err:#}");
    if let Some(kind) = err.downcast_ref::<SheetError>().map(SheetError::kind) {
        info!("Failure category: {kind:?}");
    }
    if !cli.debug {
        eprintln!("Run again with --debug for details.");
    }
}
