use std::path::Path;

use image::RgbaImage;
use log::{error, info};

use super::{CardComposer, fit_text, save_png};
use crate::error::Result;
use crate::records::Record;

impl CardComposer<'_> {
    /// Compose the front face on a copy of the template.
    pub fn front(&self, record: &Record) -> Result<RgbaImage> {
        let mut card = self.template.clone();
        let (w, h) = card.dimensions();
        let margin_x = (self.layout.text_margin_mm / self.layout.card_width_mm * w as f32).round() as u32;
        let margin_y = (self.layout.text_margin_mm / self.layout.card_height_mm * h as f32).round() as u32;
        let inner_width = w.saturating_sub(2 * margin_x);

        let display = record.display_name();
        let fit = fit_text(
            self.font,
            display,
            inner_width,
            h / 3,
            self.bounds(self.settings.font_size_max),
        )?;
        // Centred in the upper two thirds, pushed down by the bias.
        let upper = (2 * h / 3) as i32;
        let x = (w as i32 - fit.ink.width as i32) / 2;
        let y = (upper - fit.ink.height as i32) / 2 + self.settings.front_bias_px;
        self.font
            .draw(&mut card, display, fit.size as f32, x, y, self.palette.accent);

        // Fixed size unless the text would run off the card.
        let extra = fit_text(
            self.font,
            &record.extra,
            inner_width,
            h.saturating_sub(2 * margin_y),
            self.bounds(self.settings.extra_font_px),
        )?;
        let x = w as i32 - extra.ink.width as i32 - margin_x as i32;
        let y = h as i32 - extra.ink.height as i32 - margin_y as i32;
        self.font
            .draw(&mut card, &record.extra, extra.size as f32, x, y, self.palette.accent);

        Ok(card)
    }

    /// Compose the front face and save it to `path`.
    pub fn write_front(&self, record: &Record, path: &Path) -> Result<()> {
        info!("Creating front for {}", record.name);
        let card = self.front(record).inspect_err(|err| {
            error!("Front card for {} failed: {err}", record.name);
        })?;
        save_png(&card, path)?;
        info!("Front saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::Rgba;
    use pretty_assertions::assert_eq;

    use crate::config::{RenderSettings, SheetLayout};
    use crate::records::Record;
    use crate::render::{CardComposer, CardFont};

    #[test]
    fn front_card_keeps_template_size_and_draws_accent() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        let font = CardFont::load(&path).unwrap();
        let template = image::RgbaImage::from_pixel(1063, 591, Rgba([255, 255, 255, 255]));
        let layout = SheetLayout::default();
        let settings = RenderSettings::default();
        let composer = CardComposer::new(&font, &template, &layout, &settings);

        let record = Record {
            name: "Anna Kuznetsova".into(),
            number: "4006381333931".into(),
            extra: "Room 12".into(),
        };
        let card = composer.front(&record).unwrap();
        assert_eq!(card.dimensions(), (1063, 591));
        let accent_px = card
            .pixels()
            .filter(|p| p[2] as i32 - p[0] as i32 > 100)
            .count();
        assert!(accent_px > 1000);
        // Nothing drawn in the top margin band.
        assert!((0..1063).all(|x| *card.get_pixel(x, 5) == Rgba([255, 255, 255, 255])));
    }
}
