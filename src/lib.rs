//! Business card sheet generation.
//!
//! Reads a CSV of names and numbers, renders a front (template plus fitted
//! text) and a back (name, EAN-13 barcode, number) for every record and lays
//! them out on duplex-ready PDF pages.

mod artifacts;
pub mod barcode;
pub mod config;
mod error;
pub mod logging;
mod records;
pub mod render;
pub mod sheet;

pub use artifacts::{ArtifactStore, CleanupReport};
pub use barcode::{Ean13, check_digit, coerce_payload, render_barcode, write_barcode};
pub use config::{
    BarcodeOptions, LayoutFile, RenderSettings, ResourcePaths, SheetConfig, SheetLayout,
};
pub use error::{ErrorKind, Result, SheetError};
pub use records::{Record, RecordSet, SkipReason, SkippedRow, load_records, parse_records};
pub use render::{CardComposer, CardFont, FontBounds, FontFit, TextMeasure, fit_text};
pub use sheet::{PagePlan, PageSide, SheetAssembler, SheetDocument, plan_pages};

use std::path::PathBuf;

use log::{info, warn};
use rand::Rng;

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct SheetReport {
    pub output: PathBuf,
    pub cards: usize,
    pub pages: usize,
    pub skipped: Vec<SkippedRow>,
    /// Temporary files that could not be deleted.
    pub cleanup_failures: Vec<PathBuf>,
}

/// Produce the card sheet described by `config`.
pub fn generate_sheet(config: &SheetConfig) -> Result<SheetReport> {
    generate_sheet_with_rng(config, &mut rand::thread_rng())
}

/// Same as [`generate_sheet`] with a caller-supplied source for barcode
/// padding digits.
pub fn generate_sheet_with_rng<R: Rng + ?Sized>(config: &SheetConfig, rng: &mut R) -> Result<SheetReport> {
    config.layout.validate()?;
    config.render.validate()?;
    config.resources.ensure_present()?;

    let font = CardFont::load(&config.resources.font)?;
    let template = render::load_template(&config.resources.template)?;
    let set = load_records(&config.resources.records, config.has_header)?;
    for row in &set.skipped {
        warn!("Skipped line {}: {}", row.line, row.reason);
    }
    if set.records.is_empty() {
        return Err(SheetError::NoRecords {
            path: config.resources.records.clone(),
        });
    }

    info!("Creating cards for:");
    for record in &set.records {
        info!("- {}: {}", record.name, record.number);
    }

    let artifacts = ArtifactStore::create(config.work_dir.as_deref(), &config.output)?;
    let composer = CardComposer::new(&font, &template, &config.layout, &config.render);
    let mut assembler = SheetAssembler::new(composer, &config.layout, artifacts);
    let assembled = assembler.assemble(&set.records, &config.output, rng);
    let cleanup = assembler.finish();
    if !cleanup.failures.is_empty() {
        warn!("{} temporary file(s) were left behind", cleanup.failures.len());
    }
    let assembled = assembled?;

    info!(
        "Done: {} card(s) on {} page(s) in {}",
        set.records.len(),
        assembled.pages,
        assembled.output.display()
    );
    Ok(SheetReport {
        output: assembled.output,
        cards: set.records.len(),
        pages: assembled.pages,
        skipped: set.skipped,
        cleanup_failures: cleanup.failures,
    })
}
