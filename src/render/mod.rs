//! Card face composition.
//!
//! [`CardComposer`] turns one [`Record`](crate::Record) into a front raster
//! (template plus fitted display text) and a back raster (name, barcode and
//! raw number), each saved as its own PNG.

mod back;
mod front;
mod paint;
mod text;

pub use paint::{Palette, Region};
pub use text::{CardFont, FontBounds, FontFit, TextBox, TextMeasure, fit_text};

use std::path::Path;

use image::RgbaImage;
use log::debug;

use crate::config::{RenderSettings, SheetLayout};
use crate::error::{Result, SheetError};

/// Load the front-card template as RGBA.
pub fn load_template(path: &Path) -> Result<RgbaImage> {
    let template = image::open(path)
        .map_err(|source| SheetError::Template {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    debug!(
        "Template {} loaded, {}x{} px",
        path.display(),
        template.width(),
        template.height()
    );
    Ok(template)
}

/// Shared resources for composing every card of a run.
pub struct CardComposer<'a> {
    font: &'a CardFont,
    template: &'a RgbaImage,
    layout: &'a SheetLayout,
    settings: &'a RenderSettings,
    palette: Palette,
}

impl<'a> CardComposer<'a> {
    pub fn new(
        font: &'a CardFont,
        template: &'a RgbaImage,
        layout: &'a SheetLayout,
        settings: &'a RenderSettings,
    ) -> Self {
        Self {
            font,
            template,
            layout,
            settings,
            palette: Palette::from_settings(settings),
        }
    }

    fn bounds(&self, max: u32) -> FontBounds {
        FontBounds {
            min: self.settings.font_size_min.min(max.max(1)),
            max: max.max(1),
        }
    }
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|source| SheetError::image(path, source))
}
