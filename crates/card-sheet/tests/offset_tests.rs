use card_sheet::*;
use image::{Rgb, RgbImage};

#[tokio::test]
async fn test_offset_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/offset_data.json");

    OffsetData::new(10, 20).save(&path).await.unwrap();
    let loaded = OffsetData::load(&path).await.unwrap();
    assert_eq!(loaded, OffsetData::new(10, 20));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["x_offset"], 10);
    assert_eq!(json["y_offset"], 20);
}

#[tokio::test]
async fn test_missing_offset_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = OffsetData::load(dir.path().join("missing.json")).await;
    assert!(matches!(result, Err(SheetError::Io(_))));
}

fn page(side: SheetSide) -> SheetPage {
    let mut image = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
    image.put_pixel(0, 0, Rgb([0, 0, 0]));
    SheetPage {
        side,
        image,
        label: None,
    }
}

#[test]
fn test_only_back_pages_are_shifted() {
    let mut pages = vec![
        page(SheetSide::Front),
        page(SheetSide::Back),
        page(SheetSide::Front),
        page(SheetSide::Back),
    ];
    let original = pages[0].image.clone();

    let shifted = offset_pages(&mut pages, OffsetData::new(3, 4), 300);
    assert_eq!(shifted, 2);

    assert_eq!(pages[0].image, original);
    assert_eq!(pages[2].image, original);
    for back in [&pages[1], &pages[3]] {
        assert_eq!(*back.image.get_pixel(3, 4), Rgb([0, 0, 0]));
        assert_eq!(*back.image.get_pixel(0, 0), Rgb([255, 255, 255]));
    }
}

#[test]
fn test_offset_scales_with_ppi() {
    let mut pages = vec![page(SheetSide::Front), page(SheetSide::Back)];
    offset_pages(&mut pages, OffsetData::new(3, 4), 600);
    assert_eq!(*pages[1].image.get_pixel(6, 8), Rgb([0, 0, 0]));
}

#[test]
fn test_render_applies_saved_offset_to_backs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for sub in ["front", "back", "double_sided"] {
        std::fs::create_dir_all(root.join(sub)).unwrap();
    }
    RgbImage::from_pixel(40, 60, Rgb([255, 0, 0]))
        .save(root.join("front/card.png"))
        .unwrap();

    let offset_path = root.join("data/offset_data.json");
    std::fs::create_dir_all(root.join("data")).unwrap();
    std::fs::write(&offset_path, r#"{ "x_offset": 10, "y_offset": 20 }"#).unwrap();

    let catalog = LayoutCatalog::from_json_str(
        r#"{
            "card_sizes": { "standard": { "width": 40, "height": 60 } },
            "paper_layouts": {
                "letter": {
                    "width": 200, "height": 200,
                    "card_layouts": {
                        "standard": { "x_pos": [40, 100], "y_pos": [70], "template": "pair_v1" }
                    }
                }
            }
        }"#,
    )
    .unwrap();

    let base = SheetOptions {
        front_dir: root.join("front"),
        back_dir: root.join("back"),
        double_sided_dir: root.join("double_sided"),
        offset_path,
        ..Default::default()
    };
    let with_offset = SheetOptions {
        load_offset: true,
        ..base.clone()
    };

    let plain = SheetPlan::prepare(&catalog, &base, &mut FirstCandidate)
        .unwrap()
        .render()
        .unwrap();
    let shifted = SheetPlan::prepare(&catalog, &with_offset, &mut FirstCandidate)
        .unwrap()
        .render()
        .unwrap();

    assert_eq!(plain.len(), 2);
    assert_eq!(plain[0].image, shifted[0].image);
    assert_ne!(plain[1].image, shifted[1].image);
    assert_eq!(
        shifted[1].image,
        offset_image(&plain[1].image, 10, 20)
    );
}

#[test]
fn test_unreadable_offset_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for sub in ["front", "back", "double_sided"] {
        std::fs::create_dir_all(root.join(sub)).unwrap();
    }
    RgbImage::from_pixel(40, 60, Rgb([255, 0, 0]))
        .save(root.join("front/card.png"))
        .unwrap();

    let options = SheetOptions {
        front_dir: root.join("front"),
        back_dir: root.join("back"),
        double_sided_dir: root.join("double_sided"),
        card_size: CardSize::Standard,
        paper_size: PaperSize::Letter,
        ppi: 30,
        load_offset: true,
        offset_path: root.join("data/missing.json"),
        ..Default::default()
    };

    let pages = SheetPlan::prepare(&LayoutCatalog::builtin().unwrap(), &options, &mut FirstCandidate)
        .unwrap()
        .render()
        .unwrap();
    assert_eq!(pages.len(), 2);
}
