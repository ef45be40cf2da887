//! Physical layout, render settings and resource locations.
//!
//! Everything here is plain immutable data. A run is described entirely by a
//! [`SheetConfig`]; alternate page layouts can be loaded from JSON with
//! [`LayoutFile::load`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SheetError};

const MM_PER_INCH: f32 = 25.4;
const PT_PER_INCH: f32 = 72.0;
/// Largest accepted page side, a little over A0 on its long edge.
const MAX_PAGE_MM: f32 = 2000.0;
const MAX_ROWS: usize = 10_000;

pub const RECORDS_FILE_NAME: &str = "name and numbers.csv";
pub const TEMPLATE_FILE_NAME: &str = "vcard.face.png";
pub const FONT_FILE_NAME: &str = "font.ttf";

/// Millimetres to PDF points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_INCH * PT_PER_INCH
}

/// Millimetres to whole pixels at the given resolution.
pub fn mm_to_px(mm: f32, dpi: u32) -> u32 {
    (mm / MM_PER_INCH * dpi as f32).round() as u32
}

/// PDF points to (fractional) pixels at the given resolution.
pub fn pt_to_px(pt: f32, dpi: u32) -> f32 {
    pt / PT_PER_INCH * dpi as f32
}

/// Card and page geometry in millimetres, PDF orientation (origin bottom-left).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub text_margin_mm: f32,
    /// Left edge of the two columns.
    pub slot_x_mm: [f32; 2],
    /// Bottom edge of the first (top) row.
    pub first_row_bottom_mm: f32,
    pub row_step_mm: f32,
    pub row_gap_mm: f32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            card_width_mm: 90.0,
            card_height_mm: 50.0,
            text_margin_mm: 5.0,
            slot_x_mm: [15.0, 106.0],
            first_row_bottom_mm: 240.0,
            row_step_mm: 51.0,
            row_gap_mm: 1.0,
        }
    }
}

impl SheetLayout {
    /// Vertical distance the cursor descends after each full row.
    pub fn row_advance_mm(&self) -> f32 {
        self.row_step_mm + self.row_gap_mm
    }

    /// Number of two-card rows whose bottom edge stays on the page.
    pub fn rows_per_page(&self) -> usize {
        let advance = self.row_advance_mm();
        if advance <= 0.0
            || !advance.is_finite()
            || self.first_row_bottom_mm.is_nan()
            || self.first_row_bottom_mm < 0.0
        {
            return 0;
        }
        let rows = (self.first_row_bottom_mm / advance).floor().min(MAX_ROWS as f32);
        rows as usize + 1
    }

    pub fn cards_per_page(&self) -> usize {
        self.rows_per_page() * 2
    }

    /// Bottom-left corner (mm) of the card at `index` within its page.
    ///
    /// Back pages swap the two columns so that a duplex print flipped on the
    /// long edge lines each back up with its front.
    pub fn slot_origin_mm(&self, index: usize, back: bool) -> (f32, f32) {
        let column = if back { (index + 1) % 2 } else { index % 2 };
        let row = index / 2;
        let y = self.first_row_bottom_mm - row as f32 * self.row_advance_mm();
        (self.slot_x_mm[column], y)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.page_width_mm,
            self.page_height_mm,
            self.card_width_mm,
            self.card_height_mm,
            self.text_margin_mm,
            self.slot_x_mm[0],
            self.slot_x_mm[1],
            self.first_row_bottom_mm,
            self.row_step_mm,
            self.row_gap_mm,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SheetError::Layout("layout values must be finite".into()));
        }
        if self.page_width_mm > MAX_PAGE_MM || self.page_height_mm > MAX_PAGE_MM {
            return Err(SheetError::Layout(format!(
                "page {} x {} mm exceeds the {MAX_PAGE_MM} mm limit",
                self.page_width_mm, self.page_height_mm
            )));
        }
        if self.card_width_mm <= 0.0 || self.card_height_mm <= 0.0 {
            return Err(SheetError::Layout("card size must be positive".into()));
        }
        if self.page_width_mm <= 0.0 || self.page_height_mm <= 0.0 {
            return Err(SheetError::Layout("page size must be positive".into()));
        }
        if self.text_margin_mm < 0.0 || 2.0 * self.text_margin_mm >= self.card_width_mm {
            return Err(SheetError::Layout(
                "text margin must leave room on the card".into(),
            ));
        }
        if self.row_advance_mm() < self.card_height_mm {
            return Err(SheetError::Layout(format!(
                "row advance {} mm is smaller than the card height {} mm",
                self.row_advance_mm(),
                self.card_height_mm
            )));
        }
        for x in self.slot_x_mm {
            if x < 0.0 || x + self.card_width_mm > self.page_width_mm {
                return Err(SheetError::Layout(format!(
                    "slot at {x} mm does not fit a {} mm card on a {} mm page",
                    self.card_width_mm, self.page_width_mm
                )));
            }
        }
        if self.first_row_bottom_mm < 0.0
            || self.first_row_bottom_mm + self.card_height_mm > self.page_height_mm
        {
            return Err(SheetError::Layout(format!(
                "first row at {} mm leaves the page",
                self.first_row_bottom_mm
            )));
        }
        Ok(())
    }
}

/// Bar geometry for the EAN-13 raster.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    pub module_width_mm: f32,
    pub module_height_mm: f32,
    pub quiet_zone_mm: f32,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            module_width_mm: 0.4,
            module_height_mm: 10.0,
            quiet_zone_mm: 3.0,
        }
    }
}

/// Typography and raster settings for composed cards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub dpi: u32,
    /// Largest font size (px) the fitter starts from.
    pub font_size_max: u32,
    /// Smallest font size (px) the fitter will try.
    pub font_size_min: u32,
    pub accent: [u8; 3],
    pub extra_font_px: u32,
    /// Downward shift (template px) of the front display text.
    pub front_bias_px: i32,
    pub name_baseline_pt: f32,
    pub number_font_pt: f32,
    pub number_baseline_pt: f32,
    pub barcode_inset_pt: f32,
    pub barcode_bottom_pt: f32,
    pub barcode_height_pt: f32,
    pub barcode: BarcodeOptions,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            font_size_max: 300,
            font_size_min: 1,
            accent: [57, 171, 226],
            extra_font_px: 100,
            front_bias_px: 80,
            name_baseline_pt: 50.0,
            number_font_pt: 8.0,
            number_baseline_pt: 5.0,
            barcode_inset_pt: 10.0,
            barcode_bottom_pt: 15.0,
            barcode_height_pt: 80.0,
            barcode: BarcodeOptions::default(),
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<()> {
        if !(72..=1200).contains(&self.dpi) {
            return Err(SheetError::Layout(format!(
                "dpi must be within 72..=1200 (got {})",
                self.dpi
            )));
        }
        if self.font_size_min == 0 || self.font_size_min > self.font_size_max {
            return Err(SheetError::Layout(format!(
                "font size bounds {}..={} are invalid",
                self.font_size_min, self.font_size_max
            )));
        }
        if self.barcode.module_width_mm <= 0.0 || self.barcode.module_height_mm <= 0.0 {
            return Err(SheetError::Layout("barcode modules must be positive".into()));
        }
        Ok(())
    }
}

/// On-disk layout override; every field falls back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutFile {
    pub layout: SheetLayout,
    pub render: RenderSettings,
}

impl LayoutFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| SheetError::io(path, source))?;
        let file: LayoutFile =
            serde_json::from_str(&raw).map_err(|source| SheetError::LayoutFile {
                path: path.to_path_buf(),
                source,
            })?;
        file.layout.validate()?;
        file.render.validate()?;
        Ok(file)
    }
}

/// Locations of the three input files a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub records: PathBuf,
    pub template: PathBuf,
    pub font: PathBuf,
}

impl ResourcePaths {
    /// Resolve the conventional file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            records: dir.join(RECORDS_FILE_NAME),
            template: dir.join(TEMPLATE_FILE_NAME),
            font: dir.join(FONT_FILE_NAME),
        }
    }

    /// `data/` beside the running executable, or `./data` when that is unknown.
    pub fn default_data_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("data")))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// Fail on the first required file that does not exist.
    pub fn ensure_present(&self) -> Result<()> {
        let required = [
            ("record file", &self.records),
            ("card template", &self.template),
            ("font file", &self.font),
        ];
        for (what, path) in required {
            if !path.is_file() {
                return Err(SheetError::MissingResource {
                    what,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Full description of one run.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub resources: ResourcePaths,
    pub layout: SheetLayout,
    pub render: RenderSettings,
    pub output: PathBuf,
    /// Where transient rasters go; a fresh directory beside the output when unset.
    pub work_dir: Option<PathBuf>,
    pub has_header: bool,
}

impl SheetConfig {
    pub fn new(resources: ResourcePaths, output: impl Into<PathBuf>) -> Self {
        Self {
            resources,
            layout: SheetLayout::default(),
            render: RenderSettings::default(),
            output: output.into(),
            work_dir: None,
            has_header: true,
        }
    }
}
