//! Font loading, ink-box measurement and the font size search.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, Rect, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use log::debug;

use crate::error::{Result, SheetError};

/// Ink bounds of a rendered string relative to the drawing origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Anything that can report how large a string renders at a given size.
pub trait TextMeasure {
    fn ink_box(&self, text: &str, size: f32) -> TextBox;
}

/// Inclusive font size range for [`fit_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontBounds {
    pub min: u32,
    pub max: u32,
}

/// Outcome of a successful fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFit {
    pub size: u32,
    pub ink: TextBox,
}

/// Largest size in `bounds` whose ink box fits `max_width` x `max_height`.
///
/// Sizes are tried from `bounds.max` downwards one pixel at a time; when even
/// `bounds.min` is too large the text is reported as [`SheetError::DoesNotFit`].
pub fn fit_text<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    max_width: u32,
    max_height: u32,
    bounds: FontBounds,
) -> Result<FontFit> {
    if bounds.min == 0 || bounds.min > bounds.max {
        return Err(SheetError::Layout(format!(
            "font size bounds {}..={} are invalid",
            bounds.min, bounds.max
        )));
    }
    let mut size = bounds.max;
    loop {
        let ink = measure.ink_box(text, size as f32);
        if ink.width <= max_width && ink.height <= max_height {
            debug!("Fitted '{text}' at {size}px ({}x{})", ink.width, ink.height);
            return Ok(FontFit { size, ink });
        }
        if size == bounds.min {
            return Err(SheetError::DoesNotFit {
                text: text.to_string(),
                max_width,
                max_height,
            });
        }
        size -= 1;
    }
}

/// A TrueType font used for every string on the cards.
pub struct CardFont {
    font: FontVec,
    path: PathBuf,
}

impl CardFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|source| SheetError::io(path, source))?;
        Self::from_bytes(data, path)
    }

    pub fn from_bytes(data: Vec<u8>, path: &Path) -> Result<Self> {
        let font = FontVec::try_from_vec(data).map_err(|err| SheetError::Font {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Draw `text` so its ink box starts at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, size: f32, x: i32, y: i32, color: Rgba<u8>) {
        let ink = self.ink_box(text, size);
        draw_text_mut(
            canvas,
            color,
            x - ink.left,
            y - ink.top,
            PxScale::from(size),
            &self.font,
            text,
        );
    }
}

impl TextMeasure for CardFont {
    // Mirrors the glyph placement of `imageproc::drawing::draw_text_mut`.
    fn ink_box(&self, text: &str, size: f32) -> TextBox {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0f32;
        let mut last = None;
        let mut bounds: Option<Rect> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);
            let Some(outlined) = scaled.outline_glyph(glyph) else {
                continue;
            };
            if let Some(prev) = last {
                caret += scaled.kern(id, prev);
            }
            last = Some(id);
            let bb = outlined.px_bounds();
            bounds = Some(match bounds {
                None => bb,
                Some(acc) => Rect {
                    min: point(acc.min.x.min(bb.min.x), acc.min.y.min(bb.min.y)),
                    max: point(acc.max.x.max(bb.max.x), acc.max.y.max(bb.max.y)),
                },
            });
        }

        match bounds {
            None => TextBox::default(),
            Some(bb) => {
                let left = bb.min.x.round() as i32;
                let top = bb.min.y.round() as i32;
                TextBox {
                    left,
                    top,
                    width: (bb.max.x.round() as i32 - left).max(0) as u32,
                    height: (bb.max.y.round() as i32 - top).max(0) as u32,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Fixed-pitch stand-in: every char is 0.6 em wide and 1 em tall.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn ink_box(&self, text: &str, size: f32) -> TextBox {
            TextBox {
                left: 0,
                top: 0,
                width: (text.chars().count() as f32 * size * 0.6) as u32,
                height: size as u32,
            }
        }
    }

    const BOUNDS: FontBounds = FontBounds { min: 1, max: 300 };

    fn fixture_font() -> CardFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        CardFont::load(&path).unwrap()
    }

    #[test]
    fn starts_at_max_when_everything_fits() {
        let fit = fit_text(&Monospace, "Ann", 10_000, 10_000, BOUNDS).unwrap();
        assert_eq!(fit.size, 300);
    }

    #[test]
    fn height_limit_binds() {
        let fit = fit_text(&Monospace, "Ann", 10_000, 120, BOUNDS).unwrap();
        assert_eq!(fit.size, 120);
    }

    #[test]
    fn width_limit_binds() {
        // 5 chars * 0.6 * size <= 300  =>  size <= 100
        let fit = fit_text(&Monospace, "Smith", 300, 1_000, BOUNDS).unwrap();
        assert_eq!(fit.size, 100);
        assert!(fit.ink.width <= 300);
    }

    #[test]
    fn unfittable_text_hits_the_floor() {
        let err = fit_text(&Monospace, "Wolfeschlegelsteinhausen", 5, 5, BOUNDS).unwrap_err();
        assert!(matches!(err, SheetError::DoesNotFit { .. }));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let bounds = FontBounds { min: 0, max: 10 };
        assert!(fit_text(&Monospace, "x", 10, 10, bounds).is_err());
    }

    #[test]
    fn size_never_grows_as_width_shrinks() {
        let mut previous = u32::MAX;
        for width in (20..=1200).rev().step_by(7) {
            let fit = fit_text(&Monospace, "Petrova", width, 400, BOUNDS).unwrap();
            assert!(fit.size <= previous, "width {width}");
            previous = fit.size;
        }
    }

    #[test]
    fn real_font_fit_is_monotonic_and_within_bounds() {
        let font = fixture_font();
        let mut previous = u32::MAX;
        for width in (100..=1000).rev().step_by(50) {
            let fit = fit_text(&font, "Ivanova", width, 200, BOUNDS).unwrap();
            assert!(fit.size <= previous, "width {width}");
            assert!(fit.ink.width <= width);
            assert!(fit.ink.height <= 200);
            previous = fit.size;
        }
    }

    #[test]
    fn ink_box_grows_with_size() {
        let font = fixture_font();
        let small = font.ink_box("Card", 20.0);
        let large = font.ink_box("Card", 80.0);
        assert!(large.width > small.width);
        assert!(large.height > small.height);
        assert_eq!(font.ink_box("   ", 40.0), TextBox::default());
    }

    #[test]
    fn drawn_ink_lands_at_requested_origin() {
        let font = fixture_font();
        let mut canvas = RgbaImage::from_pixel(400, 200, Rgba([255, 255, 255, 255]));
        let ink = font.ink_box("H", 100.0);
        font.draw(&mut canvas, "H", 100.0, 50, 40, Rgba([0, 0, 0, 255]));

        let dark = |x: u32, y: u32| canvas.get_pixel(x, y)[0] < 128;
        let xs: Vec<u32> = (0..400).filter(|&x| (0..200).any(|y| dark(x, y))).collect();
        let ys: Vec<u32> = (0..200).filter(|&y| (0..400).any(|x| dark(x, y))).collect();
        assert!(xs[0].abs_diff(50) <= 1);
        assert!(ys[0].abs_diff(40) <= 1);
        assert!((xs[xs.len() - 1] + 1).abs_diff(50 + ink.width) <= 1);
        assert!((ys[ys.len() - 1] + 1).abs_diff(40 + ink.height) <= 1);
    }
}
