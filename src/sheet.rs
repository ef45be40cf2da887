//! Page planning and PDF assembly.
//!
//! Cards are laid out two per row, top row first. Every sheet of cards
//! produces a front page followed by its back page; the back page mirrors the
//! columns so duplex printing lines each back up with its front.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use log::{debug, error, info};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use rand::Rng;

use crate::artifacts::{ArtifactStore, CleanupReport};
use crate::barcode::Ean13;
use crate::config::{SheetLayout, mm_to_pt};
use crate::error::{Result, SheetError};
use crate::records::Record;
use crate::render::CardComposer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSide {
    Front,
    Back,
}

/// One card drawn on a page, bottom-left corner in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub card: usize,
    pub x_mm: f32,
    pub y_mm: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub side: PageSide,
    pub placements: Vec<Placement>,
}

/// Distribute `count` cards over front/back page pairs.
pub fn plan_pages(count: usize, layout: &SheetLayout) -> Vec<PagePlan> {
    let per_page = layout.cards_per_page().max(1);
    let mut pages = Vec::new();
    let mut start = 0;
    while start < count {
        let end = (start + per_page).min(count);
        for side in [PageSide::Front, PageSide::Back] {
            let placements = (start..end)
                .map(|card| {
                    let (x_mm, y_mm) = layout.slot_origin_mm(card - start, side == PageSide::Back);
                    Placement { card, x_mm, y_mm }
                })
                .collect();
            pages.push(PagePlan { side, placements });
        }
        start = end;
    }
    pages
}

/// Thin wrapper over a `lopdf` document holding raster card images.
pub struct SheetDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    width_pt: f32,
    height_pt: f32,
}

impl SheetDocument {
    pub fn new(layout: &SheetLayout) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            width_pt: mm_to_pt(layout.page_width_mm),
            height_pt: mm_to_pt(layout.page_height_mm),
        }
    }

    /// Embed a raster file as an image XObject.
    pub fn add_image(&mut self, path: &Path) -> Result<ObjectId> {
        let img = image::open(path).map_err(|source| SheetError::image(path, source))?;
        self.add_raster(&img)
    }

    pub fn add_raster(&mut self, img: &DynamicImage) -> Result<ObjectId> {
        let (width, height) = img.dimensions();
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        let rgba = img.to_rgba8();
        if rgba.pixels().any(|p| p[3] != u8::MAX) {
            let alpha: Vec<u8> = rgba.pixels().map(|p| p[3]).collect();
            let mut mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            );
            mask.compress()?;
            dict.set("SMask", self.doc.add_object(mask));
        }

        let mut stream = Stream::new(dict, img.to_rgb8().into_raw());
        stream.compress()?;
        Ok(self.doc.add_object(stream))
    }

    /// Add a page drawing each `(image, x_mm, y_mm)` at `width_mm` x `height_mm`.
    pub fn add_page(&mut self, cards: &[(ObjectId, f32, f32)], width_mm: f32, height_mm: f32) -> Result<()> {
        let mut xobjects = Dictionary::new();
        let mut operations = Vec::with_capacity(cards.len() * 4);
        let (w, h) = (mm_to_pt(width_mm), mm_to_pt(height_mm));
        for (n, &(image_id, x_mm, y_mm)) in cards.iter().enumerate() {
            let name = format!("Im{n}");
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    w.into(),
                    0.into(),
                    0.into(),
                    h.into(),
                    mm_to_pt(x_mm).into(),
                    mm_to_pt(y_mm).into(),
                ],
            ));
            operations.push(Operation::new("Do", vec![name.as_str().into()]));
            operations.push(Operation::new("Q", vec![]));
            xobjects.set(name, image_id);
        }

        let media_box: Vec<Object> = vec![0.into(), 0.into(), self.width_pt.into(), self.height_pt.into()];
        let content = Content { operations }.encode()?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Resources" => dictionary! { "XObject" => xobjects },
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Write the document to `output` via a sibling temporary file so a
    /// failure never leaves a truncated PDF behind.
    pub fn save(mut self, output: &Path) -> Result<usize> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let partial = partial_path(output);
        if let Err(err) = self.doc.save(&partial) {
            let _ = fs::remove_file(&partial);
            return Err(SheetError::io(&partial, err));
        }
        fs::rename(&partial, output).map_err(|source| {
            let _ = fs::remove_file(&partial);
            SheetError::io(output, source)
        })?;
        Ok(count)
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

/// Rasters written for one card.
#[derive(Debug, Clone)]
pub struct CardFaces {
    pub front: PathBuf,
    pub back: PathBuf,
    pub code: Ean13,
}

/// Result of a successful [`SheetAssembler::assemble`].
#[derive(Debug, Clone)]
pub struct AssembledSheet {
    pub output: PathBuf,
    pub pages: usize,
    pub cards: Vec<CardFaces>,
}

/// Composes every card, lays them out and writes the PDF.
pub struct SheetAssembler<'a> {
    composer: CardComposer<'a>,
    layout: &'a SheetLayout,
    artifacts: ArtifactStore,
}

impl<'a> SheetAssembler<'a> {
    pub fn new(composer: CardComposer<'a>, layout: &'a SheetLayout, artifacts: ArtifactStore) -> Self {
        Self {
            composer,
            layout,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn assemble<R: Rng + ?Sized>(
        &mut self,
        records: &[Record],
        output: &Path,
        rng: &mut R,
    ) -> Result<AssembledSheet> {
        let mut cards = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let n = i + 1;
            let front = self.artifacts.register(&format!("card_{n}_front.png"));
            let barcode = self.artifacts.register(&format!("barcode_{n}.png"));
            let back = self.artifacts.register(&format!("card_{n}_back.png"));
            self.composer.write_front(record, &front)?;
            let code = self.composer.write_back(record, &barcode, &back, rng)?;
            cards.push(CardFaces { front, back, code });
        }

        let plans = plan_pages(cards.len(), self.layout);
        let mut doc = SheetDocument::new(self.layout);
        for plan in &plans {
            let mut placed = Vec::with_capacity(plan.placements.len());
            for placement in &plan.placements {
                let faces = &cards[placement.card];
                let path = match plan.side {
                    PageSide::Front => &faces.front,
                    PageSide::Back => &faces.back,
                };
                debug!(
                    "Placing {} at ({}, {}) mm",
                    path.display(),
                    placement.x_mm,
                    placement.y_mm
                );
                placed.push((doc.add_image(path)?, placement.x_mm, placement.y_mm));
            }
            doc.add_page(&placed, self.layout.card_width_mm, self.layout.card_height_mm)?;
        }

        let pages = doc.save(output).inspect_err(|err| {
            error!("Failed to save {}: {err}", output.display());
        })?;
        info!("Saved {} with {pages} pages", output.display());
        Ok(AssembledSheet {
            output: output.to_path_buf(),
            pages,
            cards,
        })
    }

    /// Remove every transient raster.
    pub fn finish(mut self) -> CleanupReport {
        self.artifacts.cleanup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn four_cards_make_one_front_back_pair() {
        let pages = plan_pages(4, &SheetLayout::default());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].side, PageSide::Front);
        assert_eq!(pages[1].side, PageSide::Back);
        assert_eq!(pages[0].placements.len(), 4);
        assert_eq!(
            pages[0].placements[2],
            Placement {
                card: 2,
                x_mm: 15.0,
                y_mm: 188.0
            }
        );
    }

    #[test]
    fn eleven_cards_spill_onto_a_second_sheet() {
        let pages = plan_pages(11, &SheetLayout::default());
        let sides: Vec<_> = pages.iter().map(|p| (p.side, p.placements.len())).collect();
        assert_eq!(
            sides,
            vec![
                (PageSide::Front, 10),
                (PageSide::Back, 10),
                (PageSide::Front, 1),
                (PageSide::Back, 1),
            ]
        );
        assert_eq!(pages[2].placements[0].card, 10);
        assert_eq!(pages[2].placements[0].y_mm, 240.0);
    }

    #[test]
    fn back_page_swaps_columns() {
        let pages = plan_pages(3, &SheetLayout::default());
        let xs = |p: &PagePlan| p.placements.iter().map(|c| c.x_mm).collect::<Vec<_>>();
        assert_eq!(xs(&pages[0]), vec![15.0, 106.0, 15.0]);
        assert_eq!(xs(&pages[1]), vec![106.0, 15.0, 106.0]);
    }

    #[test]
    fn no_cards_no_pages() {
        assert!(plan_pages(0, &SheetLayout::default()).is_empty());
    }

    #[test]
    fn unwritable_output_is_an_io_error_and_leaves_nothing() {
        let dir = std::env::temp_dir().join(format!("cardsheet_missing_{}", std::process::id()));
        let output = dir.join("nested").join("sheet.pdf");
        let mut doc = SheetDocument::new(&SheetLayout::default());
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([9, 9, 9])));
        let id = doc.add_raster(&img).unwrap();
        doc.add_page(&[(id, 15.0, 240.0)], 90.0, 50.0).unwrap();

        let err = doc.save(&output).unwrap_err();
        match err {
            SheetError::Io { path, .. } => assert_eq!(path, dir.join("nested").join("sheet.pdf.part")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn document_round_trips_through_lopdf() {
        let dir = std::env::temp_dir().join(format!(
            "cardsheet_doc_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        let layout = SheetLayout::default();
        let mut doc = SheetDocument::new(&layout);
        let opaque = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 4, image::Rgb([1, 2, 3])));
        let clear = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(8, 4, image::Rgba([0, 0, 0, 0])));
        let a = doc.add_raster(&opaque).unwrap();
        let b = doc.add_raster(&clear).unwrap();
        doc.add_page(&[(a, 15.0, 240.0)], 90.0, 50.0).unwrap();
        doc.add_page(&[(b, 106.0, 240.0)], 90.0, 50.0).unwrap();
        assert_eq!(doc.page_count(), 2);

        let output = dir.join("sheet.pdf");
        assert_eq!(doc.save(&output).unwrap(), 2);
        assert!(!dir.join("sheet.pdf.part").exists());
        let loaded = Document::load(&output).unwrap();
        assert_eq!(loaded.get_pages().len(), 2);
        let masked = loaded
            .get_object(b)
            .unwrap()
            .as_stream()
            .unwrap()
            .dict
            .has(b"SMask");
        assert!(masked);
        fs::remove_dir_all(&dir).unwrap();
    }
}
