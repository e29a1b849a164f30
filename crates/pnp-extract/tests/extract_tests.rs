mod common;

use common::*;
use pnp_extract::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RED: [u8; 3] = [220, 30, 30];
const GREEN: [u8; 3] = [30, 200, 40];
const BLUE: [u8; 3] = [20, 40, 210];
const GOLD: [u8; 3] = [210, 170, 20];
const TEAL: [u8; 3] = [20, 170, 170];
const PLUM: [u8; 3] = [140, 40, 140];

fn options(dir: &TempDir, pdf: &Path) -> ExtractOptions {
    ExtractOptions {
        output_root: dir.path().join("game"),
        ..ExtractOptions::new(pdf)
    }
}

fn out(dir: &TempDir, folder: &str) -> PathBuf {
    dir.path().join("game").join(folder)
}

#[tokio::test]
async fn test_missing_pdf_is_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.pdf");

    let result = extract(options(&dir, &missing)).await;
    assert!(matches!(result, Err(ExtractError::NotFound(path)) if path == missing));
}

#[tokio::test]
async fn test_alternating_pages_pair_backs_with_fronts() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let fronts = [pdf.card(RED), pdf.card(GREEN), pdf.card(BLUE)];
    let backs = [pdf.card(GOLD), pdf.card(TEAL), pdf.card(PLUM)];
    pdf.page(&grid(&fronts));
    pdf.page(&grid(&backs));
    pdf.save(&pdf_path);

    let report = extract(options(&dir, &pdf_path)).await.unwrap();

    assert_eq!(report.documents, 1);
    assert_eq!(report.pages, 2);
    assert_eq!(report.fronts, 3);
    assert_eq!(report.unique_backs, 3);
    assert_eq!(report.paired_backs, 3);
    assert_eq!(report.common_backs, 0);
    assert!(report.diagnostics.is_empty());

    assert_eq!(
        file_names(&out(&dir, "front")),
        vec!["1_1.png", "1_2.png", "1_3.png"]
    );
    assert_eq!(
        file_names(&out(&dir, "double_sided")),
        vec!["1_1.png", "1_2.png", "1_3.png"]
    );
    assert_eq!(color_of(&out(&dir, "front").join("1_2.png")), GREEN);
    assert_eq!(color_of(&out(&dir, "double_sided").join("1_1.png")), GOLD);
    assert_eq!(color_of(&out(&dir, "double_sided").join("1_3.png")), PLUM);
}

#[tokio::test]
async fn test_short_edge_flip_reverses_backs() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let fronts = [pdf.card(RED), pdf.card(GREEN), pdf.card(BLUE)];
    let backs = [pdf.card(GOLD), pdf.card(TEAL), pdf.card(PLUM)];
    pdf.page(&grid(&fronts));
    pdf.page(&grid(&backs));
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        short_edge_flip: true,
        ..options(&dir, &pdf_path)
    };
    extract(options).await.unwrap();

    let ds = out(&dir, "double_sided");
    assert_eq!(color_of(&ds.join("1_1.png")), PLUM);
    assert_eq!(color_of(&ds.join("1_2.png")), TEAL);
    assert_eq!(color_of(&ds.join("1_3.png")), GOLD);
}

#[tokio::test]
async fn test_common_back_written_once() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let shared = pdf.card(GOLD);
    for sheet in 0..5u8 {
        let fronts = [pdf.card([sheet * 40, 10, 10]), pdf.card([10, sheet * 40, 10])];
        pdf.page(&grid(&fronts));
        pdf.page(&grid(&[shared, shared]));
    }
    pdf.save(&pdf_path);

    let report = extract(options(&dir, &pdf_path)).await.unwrap();

    assert_eq!(report.fronts, 10);
    assert_eq!(report.common_backs, 1);
    assert_eq!(report.unique_backs, 0);
    assert_eq!(file_names(&out(&dir, "back")), vec!["back_1.png"]);
    assert!(file_names(&out(&dir, "double_sided")).is_empty());
    assert_eq!(color_of(&out(&dir, "back").join("back_1.png")), GOLD);
}

#[tokio::test]
async fn test_below_threshold_backs_are_unique() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let shared = pdf.card(GOLD);
    let fronts = [pdf.card(RED), pdf.card(GREEN)];
    pdf.page(&grid(&fronts));
    pdf.page(&grid(&[shared, shared]));
    pdf.save(&pdf_path);

    let report = extract(options(&dir, &pdf_path)).await.unwrap();

    assert_eq!(report.common_backs, 0);
    assert_eq!(report.unique_backs, 2);
    assert_eq!(
        file_names(&out(&dir, "double_sided")),
        vec!["1_1.png", "1_2.png"]
    );
}

#[tokio::test]
async fn test_layout_mismatch_skips_pairing() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let fronts: Vec<_> = (0..6u8).map(|i| pdf.card([i * 30, 100, 100])).collect();
    let backs: Vec<_> = (0..4u8).map(|i| pdf.card([100, i * 30, 100])).collect();
    pdf.page(&grid(&fronts));
    pdf.page(&grid(&backs));
    pdf.save(&pdf_path);

    let report = extract(options(&dir, &pdf_path)).await.unwrap();

    assert_eq!(report.fronts, 6);
    assert_eq!(report.unique_backs, 4);
    assert_eq!(report.paired_backs, 0);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::LayoutMismatch {
            document: pdf_path.clone(),
            front_page: 1,
            back_page: 2,
            fronts: 6,
            backs: 4,
        }]
    );

    assert_eq!(file_names(&out(&dir, "front")).len(), 6);
    assert_eq!(
        file_names(&out(&dir, "double_sided")),
        vec!["2_1.png", "2_2.png", "2_3.png", "2_4.png"]
    );
}

#[tokio::test]
async fn test_header_and_small_images_are_ignored() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let title = pdf.card(RED);
    let icon = pdf.image(100, 100, GREEN);
    let card = pdf.card(BLUE);
    pdf.page(&[
        place(title, 50.0, 20.0),
        place(icon, 200.0, 300.0),
        place(card, 50.0, 300.0),
    ]);
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        fronts_only: true,
        ..options(&dir, &pdf_path)
    };
    let report = extract(options).await.unwrap();

    assert_eq!(report.fronts, 1);
    assert_eq!(file_names(&out(&dir, "front")), vec!["1_1.png"]);
    assert_eq!(color_of(&out(&dir, "front").join("1_1.png")), BLUE);
}

#[tokio::test]
async fn test_empty_page_is_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let card = pdf.card(RED);
    pdf.page(&[place(card, 50.0, 100.0)]);
    pdf.page(&[]);
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        fronts_only: true,
        ..options(&dir, &pdf_path)
    };
    let report = extract(options).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.fronts, 1);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::EmptyPage {
            document: pdf_path.clone(),
            page: 2,
        }]
    );
}

#[tokio::test]
async fn test_skip_pages() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    for color in [RED, GREEN, BLUE] {
        let card = pdf.card(color);
        pdf.page(&[place(card, 50.0, 100.0)]);
    }
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        fronts_only: true,
        skip_pages: Some("2,x".to_string()),
        ..options(&dir, &pdf_path)
    };
    let report = extract(options).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(file_names(&out(&dir, "front")), vec!["1_1.png", "3_1.png"]);
    assert_eq!(color_of(&out(&dir, "front").join("3_1.png")), BLUE);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::InvalidSkip("x".to_string())]
    );
}

#[tokio::test]
async fn test_grid_override_overflow_is_a_warning() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let fronts = [pdf.card(RED), pdf.card(GREEN), pdf.card(BLUE)];
    pdf.page(&grid(&fronts));
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        fronts_only: true,
        grid: Some("2x1".to_string()),
        ..options(&dir, &pdf_path)
    };
    let report = extract(options).await.unwrap();

    assert_eq!(report.fronts, 3);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::GridOverflow {
            document: pdf_path.clone(),
            page: 1,
            found: 3,
            capacity: 2,
        }]
    );
}

#[test]
fn test_invalid_grid_falls_back_to_detection() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let card = pdf.card(RED);
    pdf.page(&[place(card, 50.0, 100.0)]);
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        fronts_only: true,
        grid: Some("three".to_string()),
        ..options(&dir, &pdf_path)
    };
    let report = extract_blocking(&options).unwrap();

    assert_eq!(report.fronts, 1);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::InvalidGrid("three".to_string())]
    );
}

#[test]
fn test_jpeg_written_verbatim() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let (card, bytes) = pdf.jpeg(240, 320, TEAL);
    pdf.page(&[place(card, 50.0, 100.0)]);
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        fronts_only: true,
        ..options(&dir, &pdf_path)
    };
    extract_blocking(&options).unwrap();

    let written = std::fs::read(out(&dir, "front").join("1_1.jpg")).unwrap();
    assert_eq!(written, bytes);
}

#[test]
fn test_placements_inside_forms() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let card = pdf.card(RED);
    let form = pdf.form(card, [120.0, 0.0, 0.0, 160.0, 60.0, 500.0]);
    pdf.form_page(form);
    pdf.save(&pdf_path);

    let source = PdfSource::open(&pdf_path).unwrap();
    assert_eq!(source.page_count(), 1);

    let placements = source.placements(1).unwrap();
    assert_eq!(placements.len(), 1);
    let p = &placements[0];
    assert_eq!(p.image, card);
    assert_eq!((p.pixel_width, p.pixel_height), (200, 200));
    assert!((p.x - 60.0).abs() < 1e-3);
    assert!((p.y - 132.0).abs() < 1e-3);
    assert!((p.width - 120.0).abs() < 1e-3);
    assert!((p.height - 160.0).abs() < 1e-3);

    let image = source.extract_image(card).unwrap();
    assert_eq!(image.ext, "png");
}

#[test]
fn test_unpaired_back_in_alternating_mode_is_reported() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("deck.pdf");

    let mut pdf = TestPdf::new();
    let front = pdf.card(RED);
    let back = pdf.card(GOLD);
    // Front page skipped, so its back has nothing to pair with
    pdf.page(&[place(front, 50.0, 100.0)]);
    pdf.page(&[place(back, 50.0, 100.0)]);
    pdf.save(&pdf_path);

    let options = ExtractOptions {
        skip_pages: Some("1".to_string()),
        ..options(&dir, &pdf_path)
    };
    let report = extract_blocking(&options).unwrap();

    assert_eq!(report.unique_backs, 1);
    assert_eq!(report.paired_backs, 0);
    assert_eq!(file_names(&out(&dir, "double_sided")), vec!["2_1.png"]);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::UnmatchedBack {
            document: pdf_path.clone(),
            page: 2,
            position: 1,
        }]
    );
}
