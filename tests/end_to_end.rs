use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use cardsheet::{ErrorKind, ResourcePaths, SheetConfig, SheetError, generate_sheet_with_rng};
use image::{Rgba, RgbaImage};
use lopdf::Document;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

const RECORDS: &str = "\
Name,Number,Extra
\"Anna Kuznetsova\",\"4006381333931\",\"Room 12\"
\"#Jane Doe\",\"555\",  \"x\"
\"Boris Petrov\",\"42\",\"Sales\"
\"Half Row\",\"123\"
\"Clara\",\"590123412345\",\"Front desk\"
\"Dmitri Ivanov\",\"97803064061599\",\"Warehouse\"
";

struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(tag: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "cardsheet_e2e_{tag}_{}_{nanos}",
            std::process::id()
        ));
        fs::create_dir_all(root.join("data")).unwrap();
        fs::create_dir_all(root.join("out")).unwrap();
        Self { root }
    }

    fn data(&self) -> PathBuf {
        self.root.join("data")
    }

    fn out(&self) -> PathBuf {
        self.root.join("out")
    }

    fn populate(&self, template_size: (u32, u32)) -> ResourcePaths {
        let resources = ResourcePaths::in_dir(&self.data());
        fs::write(&resources.records, RECORDS).unwrap();
        RgbaImage::from_pixel(template_size.0, template_size.1, Rgba([250, 250, 245, 255]))
            .save(&resources.template)
            .unwrap();
        fs::copy(fixture_font(), &resources.font).unwrap();
        resources
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn fixture_font() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn four_records_make_a_two_page_pdf_and_leave_no_rasters() {
    let scratch = Scratch::new("ok");
    let resources = scratch.populate((1063, 591));
    let config = SheetConfig::new(resources, scratch.out().join("cards.pdf"));

    let report = generate_sheet_with_rng(&config, &mut StdRng::seed_from_u64(7)).unwrap();

    assert_eq!(report.cards, 4);
    assert_eq!(report.pages, 2);
    assert_eq!(report.skipped.len(), 2);
    assert!(report.cleanup_failures.is_empty());

    let doc = Document::load(&report.output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    assert_eq!(entries(&scratch.out()), vec!["cards.pdf".to_string()]);
    assert_eq!(
        entries(&scratch.data()),
        vec![
            "font.ttf".to_string(),
            "name and numbers.csv".to_string(),
            "vcard.face.png".to_string(),
        ]
    );
}

#[test]
fn caller_work_dir_is_emptied_but_kept() {
    let scratch = Scratch::new("workdir");
    let resources = scratch.populate((1063, 591));
    let work = scratch.root.join("work");
    fs::create_dir_all(&work).unwrap();
    let mut config = SheetConfig::new(resources, scratch.out().join("cards.pdf"));
    config.work_dir = Some(work.clone());

    generate_sheet_with_rng(&config, &mut StdRng::seed_from_u64(1)).unwrap();

    assert!(work.is_dir());
    assert!(entries(&work).is_empty());
}

#[test]
fn missing_font_fails_before_any_output() {
    let scratch = Scratch::new("missing");
    let resources = scratch.populate((1063, 591));
    fs::remove_file(&resources.font).unwrap();
    let config = SheetConfig::new(resources, scratch.out().join("cards.pdf"));

    let err = generate_sheet_with_rng(&config, &mut StdRng::seed_from_u64(1)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingResource);
    assert!(matches!(err, SheetError::MissingResource { what: "font file", .. }));
    assert!(entries(&scratch.out()).is_empty());
}

#[test]
fn unfittable_text_aborts_without_partial_output() {
    let scratch = Scratch::new("nofit");
    let resources = scratch.populate((200, 100));
    let mut config = SheetConfig::new(resources, scratch.out().join("cards.pdf"));
    config.render.font_size_min = 50;

    let err = generate_sheet_with_rng(&config, &mut StdRng::seed_from_u64(1)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Render);
    assert!(matches!(err, SheetError::DoesNotFit { .. }));
    assert!(entries(&scratch.out()).is_empty());
}

#[test]
fn header_only_file_has_no_records() {
    let scratch = Scratch::new("empty");
    let resources = scratch.populate((1063, 591));
    fs::write(&resources.records, "Name,Number,Extra\n").unwrap();
    let config = SheetConfig::new(resources, scratch.out().join("cards.pdf"));

    let err = generate_sheet_with_rng(&config, &mut StdRng::seed_from_u64(1)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Read);
    assert!(entries(&scratch.out()).is_empty());
}
