//! EAN-13 barcode encoding and rasterisation.

mod checksum;
mod ean13;

pub use checksum::{PAYLOAD_LEN, check_digit, coerce_payload};
pub use ean13::{Ean13, MODULE_COUNT};

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::{error, info};
use rand::Rng;

use crate::config::{BarcodeOptions, mm_to_px};
use crate::error::{Result, SheetError};

const BAR: Rgb<u8> = Rgb([0, 0, 0]);
const SPACE: Rgb<u8> = Rgb([255, 255, 255]);

/// Rasterise the bars of `code` without any human-readable text.
pub fn render_barcode(code: &Ean13, options: &BarcodeOptions, dpi: u32) -> RgbImage {
    let module_px = options.module_width_mm / 25.4 * dpi as f32;
    let quiet_px = mm_to_px(options.quiet_zone_mm, dpi) as f32;
    let height = mm_to_px(options.module_height_mm, dpi).max(1);
    let width = (2.0 * quiet_px + MODULE_COUNT as f32 * module_px).round() as u32;

    let mut img = ImageBuffer::from_pixel(width.max(1), height, SPACE);
    let edge = |module: usize| (quiet_px + module as f32 * module_px).round() as i32;

    let modules = code.modules();
    let mut idx = 0;
    while idx < MODULE_COUNT {
        if !modules[idx] {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < MODULE_COUNT && modules[idx] {
            idx += 1;
        }
        let x0 = edge(start);
        let bar_width = (edge(idx) - x0).max(1) as u32;
        draw_filled_rect_mut(&mut img, Rect::at(x0, 0).of_size(bar_width, height), BAR);
    }
    img
}

/// Encode `number` (truncated or random-padded to 12 digits), render it and
/// save the PNG to `path`.
pub fn write_barcode<R: Rng + ?Sized>(
    number: &str,
    path: &Path,
    options: &BarcodeOptions,
    dpi: u32,
    rng: &mut R,
) -> Result<(PathBuf, Ean13)> {
    info!("Generating barcode for number {number}");
    let code = Ean13::from_number(number, rng).inspect_err(|err| {
        error!("Barcode generation failed for {number}: {err}");
    })?;
    let img = render_barcode(&code, options, dpi);
    img.save(path).map_err(|source| {
        error!("Failed to save barcode {}: {source}", path.display());
        SheetError::image(path, source)
    })?;
    info!("Barcode {code} written to {}", path.display());
    Ok((path.to_path_buf(), code))
}
