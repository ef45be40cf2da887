use image::imageops::{FilterType, overlay, resize};
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::config::RenderSettings;

/// Colours used on both card faces.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub paper: Rgba<u8>,
    pub border: Rgba<u8>,
    pub ink: Rgba<u8>,
    pub accent: Rgba<u8>,
}

impl Palette {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let [r, g, b] = settings.accent;
        Self {
            paper: rgba(0xff, 0xff, 0xff, 0xff),
            border: rgba(0x00, 0x00, 0x00, 0xff),
            ink: rgba(0x00, 0x00, 0x00, 0xff),
            accent: rgba(r, g, b, 0xff),
        }
    }
}

/// Axis-aligned pixel region on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    Rgba([r, g, b, a])
}

pub fn blank_card(width: u32, height: u32, palette: &Palette) -> RgbaImage {
    ImageBuffer::from_pixel(width.max(1), height.max(1), palette.paper)
}

/// Stroke a frame `thickness` pixels wide along the inside of the image edge.
pub fn draw_border(card: &mut RgbaImage, thickness: u32, color: Rgba<u8>) {
    let (w, h) = card.dimensions();
    for inset in 0..thickness.max(1) {
        if 2 * inset >= w || 2 * inset >= h {
            break;
        }
        let rect = Rect::at(inset as i32, inset as i32).of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(card, rect, color);
    }
}

/// Scale `image` to fit inside `region` keeping its aspect ratio, centre it
/// there and composite it onto `card`. Returns where it landed.
pub fn place_fitted(card: &mut RgbaImage, image: &RgbaImage, region: Region) -> Region {
    let (iw, ih) = image.dimensions();
    let scale = (region.width as f32 / iw as f32).min(region.height as f32 / ih as f32);
    let width = ((iw as f32 * scale).round() as u32).clamp(1, region.width.max(1));
    let height = ((ih as f32 * scale).round() as u32).clamp(1, region.height.max(1));
    // Nearest keeps bar edges hard.
    let scaled = resize(image, width, height, FilterType::Nearest);
    let x = region.x + (region.width as i32 - width as i32) / 2;
    let y = region.y + (region.height as i32 - height as i32) / 2;
    overlay(card, &scaled, x as i64, y as i64);
    Region {
        x,
        y,
        width,
        height,
    }
}
