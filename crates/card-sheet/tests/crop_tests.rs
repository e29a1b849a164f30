use card_sheet::*;

const W: u32 = 750;
const H: u32 = 1050;

fn assert_close(a: (f64, f64), b: (f64, f64)) {
    assert!((a.0 - b.0).abs() < 1e-9, "{:?} != {:?}", a, b);
    assert!((a.1 - b.1).abs() < 1e-9, "{:?} != {:?}", a, b);
}

#[test]
fn test_bare_number_is_a_percentage() {
    assert_eq!(parse_crop("9", W, H).unwrap(), (9.0, 9.0));
    assert_eq!(parse_crop("6.5", W, H).unwrap(), (6.5, 6.5));
    assert_eq!(parse_crop(" .5 ", W, H).unwrap(), (0.5, 0.5));
}

#[test]
fn test_empty_is_no_crop() {
    assert_eq!(parse_crop("", W, H).unwrap(), (0.0, 0.0));
    assert_eq!(parse_crop("   ", W, H).unwrap(), (0.0, 0.0));
}

#[test]
fn test_inches_and_millimeters_agree() {
    let inches = parse_crop(".5in", W, H).unwrap();
    let mm = parse_crop("12.7mm", W, H).unwrap();
    assert_close(inches, mm);
}

#[test]
fn test_units_are_case_insensitive() {
    assert_close(
        parse_crop("0.125IN", W, H).unwrap(),
        parse_crop("0.125in", W, H).unwrap(),
    );
    assert_close(
        parse_crop("3MM", W, H).unwrap(),
        parse_crop("3mm", W, H).unwrap(),
    );
}

#[test]
fn test_inch_conversion() {
    // 0.125in per edge on a 2.5in x 3.5in card
    let (x, y) = parse_crop("0.125in", W, H).unwrap();
    assert_close((x, y), (10.0, 2.0 * 0.125 / 3.5 * 100.0));
    assert_close(inches_to_crop(0.125, W, H), (x, y));
}

#[test]
fn test_invalid_crop_names_input() {
    for bad in ["abc", "5px", "-3", "1.2.3mm", "in", "3 mm"] {
        match parse_crop(bad, W, H) {
            Err(SheetError::Config(msg)) => assert!(msg.contains(bad), "{}", msg),
            other => panic!("Expected Config error for {:?}, got {:?}", bad, other),
        }
    }
}

#[test]
fn test_single_cell_bleed_is_unbounded() {
    assert_eq!(
        max_bleed(&[100], &[100], 200, 300),
        (constants::UNBOUNDED_BLEED, constants::UNBOUNDED_BLEED)
    );
}

#[test]
fn test_two_column_bleed() {
    let (x, y) = max_bleed(&[100, 400], &[50], 200, 300);
    assert_eq!(x, 50);
    assert_eq!(y, constants::UNBOUNDED_BLEED);
}

#[test]
fn test_overlapping_cells_are_unbounded() {
    let (x, _) = max_bleed(&[0, 150], &[0, 400], 200, 300);
    assert_eq!(x, constants::UNBOUNDED_BLEED);
}

#[test]
fn test_builtin_layouts_have_positive_gaps() {
    let catalog = LayoutCatalog::builtin().unwrap();
    let resolved = catalog.resolve(CardSize::Standard, PaperSize::Letter).unwrap();
    let (x, y) = max_bleed(
        &resolved.layout.x_pos,
        &resolved.layout.y_pos,
        resolved.card.width,
        resolved.card.height,
    );
    assert!(x > 0 && x < constants::UNBOUNDED_BLEED);
    assert!(y > 0 && y < constants::UNBOUNDED_BLEED);
}

#[test]
fn test_subset_check_ignores_extensions() {
    let fronts = ["a.png", "b.jpg", "set/c.webp"];
    let matching = ["a.jpg", "set/c.png"];
    assert!(check_paths_subset(matching, fronts).is_empty());

    let orphan = ["a.png", "z.png"];
    let missing = check_paths_subset(orphan, fronts);
    assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["z.png".to_string()]);
}
