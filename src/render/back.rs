use std::path::Path;

use image::RgbaImage;
use log::{error, info};
use rand::Rng;

use super::paint::{Region, blank_card, draw_border, place_fitted};
use super::{CardComposer, FontBounds, fit_text, save_png};
use crate::barcode::{Ean13, write_barcode};
use crate::config::{mm_to_px, pt_to_px};
use crate::error::{Result, SheetError};
use crate::records::Record;

const BORDER_PT: f32 = 1.0;

impl CardComposer<'_> {
    /// Compose the back face around an already rendered barcode raster.
    pub fn back(&self, record: &Record, barcode: &RgbaImage) -> Result<RgbaImage> {
        let dpi = self.settings.dpi;
        let px = |pt: f32| pt_to_px(pt, dpi).round() as i32;
        let w = mm_to_px(self.layout.card_width_mm, dpi);
        let h = mm_to_px(self.layout.card_height_mm, dpi);
        let margin = mm_to_px(self.layout.text_margin_mm, dpi);

        let mut card = blank_card(w, h, &self.palette);
        draw_border(&mut card, px(BORDER_PT).max(1) as u32, self.palette.border);

        let name = fit_text(
            self.font,
            &record.name,
            w.saturating_sub(2 * margin),
            h / 3,
            self.bounds(self.settings.font_size_max),
        )?;
        let x = (w as i32 - name.ink.width as i32) / 2;
        let y = (px(self.settings.name_baseline_pt) - name.ink.height as i32).max(0);
        self.font
            .draw(&mut card, &record.name, name.size as f32, x, y, self.palette.ink);

        let inset = px(self.settings.barcode_inset_pt);
        let region_height = px(self.settings.barcode_height_pt).max(1);
        let region = Region {
            x: inset,
            y: h as i32 - px(self.settings.barcode_bottom_pt) - region_height,
            width: (w as i32 - 2 * inset).max(1) as u32,
            height: region_height as u32,
        };
        place_fitted(&mut card, barcode, region);

        let number_px = px(self.settings.number_font_pt).max(1) as u32;
        let number = fit_text(
            self.font,
            &record.number,
            w.saturating_sub(2 * margin),
            2 * number_px,
            FontBounds {
                min: self.settings.font_size_min.min(number_px),
                max: number_px,
            },
        )?;
        let x = (w as i32 - number.ink.width as i32) / 2;
        let y = h as i32 - px(self.settings.number_baseline_pt) - number.ink.height as i32;
        self.font
            .draw(&mut card, &record.number, number.size as f32, x, y, self.palette.ink);

        Ok(card)
    }

    /// Render the barcode to `barcode_path`, compose the back face around it
    /// and save that to `path`.
    pub fn write_back<R: Rng + ?Sized>(
        &self,
        record: &Record,
        barcode_path: &Path,
        path: &Path,
        rng: &mut R,
    ) -> Result<Ean13> {
        info!("Creating back for {}", record.name);
        let (written, code) = write_barcode(
            &record.number,
            barcode_path,
            &self.settings.barcode,
            self.settings.dpi,
            rng,
        )?;
        let barcode = image::open(&written)
            .map_err(|source| SheetError::image(&written, source))?
            .to_rgba8();
        let card = self.back(record, &barcode).inspect_err(|err| {
            error!("Back card for {} failed: {err}", record.name);
        })?;
        save_png(&card, path)?;
        info!("Back saved to {}", path.display());
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::Rgba;
    use pretty_assertions::assert_eq;

    use crate::barcode::{Ean13, render_barcode};
    use crate::config::{RenderSettings, SheetLayout};
    use crate::records::Record;
    use crate::render::{CardComposer, CardFont};

    fn fixture_font() -> CardFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        CardFont::load(&path).unwrap()
    }

    fn record() -> Record {
        Record {
            name: "Anna Kuznetsova".into(),
            number: "4006381333931".into(),
            extra: "Room 12".into(),
        }
    }

    #[test]
    fn back_card_has_card_size_border_and_bars() {
        let font = fixture_font();
        let template = image::RgbaImage::from_pixel(1063, 591, Rgba([240, 240, 240, 255]));
        let layout = SheetLayout::default();
        let settings = RenderSettings::default();
        let composer = CardComposer::new(&font, &template, &layout, &settings);

        let code = Ean13::parse("4006381333931").unwrap();
        let bars = image::DynamicImage::ImageRgb8(render_barcode(&code, &settings.barcode, 300))
            .to_rgba8();
        let card = composer.back(&record(), &bars).unwrap();

        assert_eq!(card.dimensions(), (1063, 591));
        assert_eq!(*card.get_pixel(0, 300), Rgba([0, 0, 0, 255]));
        assert_eq!(*card.get_pixel(531, 0), Rgba([0, 0, 0, 255]));
        // Bars are scaled into 42..1021 x 250..473.
        let dark = (42..1021)
            .filter(|&x| card.get_pixel(x, 360)[0] < 64)
            .count();
        assert!(dark > 100, "expected bars, found {dark} dark px");
    }
}
