//! Image compositor
//!
//! Crops, scales and places card images into the cells of a page canvas,
//! adding bleed around each card either from the card's own border (native
//! bleed) or by replicating its edge pixels (synthetic bleed).

mod bleed;

pub use bleed::draw_card_with_bleed;

use crate::catalog::{CardLayout, CardLayoutSize};
use crate::types::*;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::borrow::Cow;

/// Resampling filter used whenever card art is scaled
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Rendering parameters shared by every cell of a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeSettings {
    /// Bleed per edge (baseline px, horizontal and vertical)
    pub bleed: (u32, u32),
    /// Total crop percentage (horizontal, vertical)
    pub crop: (f64, f64),
    /// Output ppi divided by the baseline ppi
    pub ratio: f64,
    /// Pixels trimmed from every edge before bleeding (baseline px)
    pub extend_corners: u32,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            bleed: (0, 0),
            crop: (0.0, 0.0),
            ratio: 1.0,
            extend_corners: 0,
        }
    }
}

/// A card scaled for its cell, with the bleed it still needs
struct PreparedCard {
    image: DynamicImage,
    /// Bleed already present in the image (output px per edge)
    native_bleed: (u32, u32),
    /// Bleed to synthesize by edge replication (output px per edge)
    synthetic_bleed: (u32, u32),
}

/// Draw every card into its cell.
///
/// Card `i` occupies cell `i % capacity`, scanning rows left to right. On a
/// back page each card is rotated 180 degrees and rows are mirrored
/// vertically so that the backs line up with their fronts once the sheet is
/// flipped on its short edge. `None` entries leave their cell empty.
pub fn draw_card_layout(
    canvas: &mut RgbImage,
    cards: &[Option<&DynamicImage>],
    layout: &CardLayout,
    card: CardLayoutSize,
    settings: &CompositeSettings,
    side: SheetSide,
) {
    let cols = layout.num_cols();
    let rows = layout.num_rows();
    let capacity = layout.capacity();
    if capacity == 0 {
        return;
    }

    let scaled = (
        scale(card.width, settings.ratio),
        scale(card.height, settings.ratio),
    );
    let bleed = (
        scale_up(settings.bleed.0, settings.ratio),
        scale_up(settings.bleed.1, settings.ratio),
    );
    let trim = scale(settings.extend_corners, settings.ratio);

    for (i, image) in cards.iter().enumerate() {
        let Some(image) = image else {
            continue;
        };

        let cell = i % capacity;
        let col = cell % cols;
        let row = cell / cols;

        let (row, image) = match side {
            SheetSide::Front => (row, Cow::Borrowed(*image)),
            SheetSide::Back => (rows - row - 1, Cow::Owned(image.rotate180())),
        };

        let x = (layout.x_pos[col] as f64 * settings.ratio).floor() as i64;
        let y = (layout.y_pos[row] as f64 * settings.ratio).floor() as i64;

        let prepared = prepare_card(&image, scaled, bleed, settings.crop);
        let trimmed = trim_edges(prepared.image, trim);

        draw_card_with_bleed(
            canvas,
            &trimmed.to_rgb8(),
            x + trim as i64 - prepared.native_bleed.0 as i64,
            y + trim as i64 - prepared.native_bleed.1 as i64,
            prepared.synthetic_bleed,
        );
    }
}

/// Crop and resize a card for a cell of `scaled` output pixels.
///
/// With a crop, the art is first checked for enough border to supply the
/// requested bleed from its own pixels. If it has it, the card is cropped to
/// the card-plus-bleed region and no bleed is synthesized.
fn prepare_card(
    image: &DynamicImage,
    scaled: (u32, u32),
    bleed: (u32, u32),
    crop: (f64, f64),
) -> PreparedCard {
    let (width, height) = (image.width(), image.height());

    if crop.0 <= 0.0 && crop.1 <= 0.0 {
        return PreparedCard {
            image: image.resize_exact(scaled.0.max(1), scaled.1.max(1), RESIZE_FILTER),
            native_bleed: (0, 0),
            synthetic_bleed: bleed,
        };
    }

    let cropped_w = (width as f64 * (1.0 - crop.0 / 100.0)).floor().max(0.0);
    let cropped_h = (height as f64 * (1.0 - crop.1 / 100.0)).floor().max(0.0);

    let ratio_x = cropped_w / scaled.0.max(1) as f64;
    let ratio_y = cropped_h / scaled.1.max(1) as f64;

    let with_bleed_w = scaled.0 as u64 + 2 * bleed.0 as u64;
    let with_bleed_h = scaled.1 as u64 + 2 * bleed.1 as u64;

    let unscaled_w = (with_bleed_w as f64 * ratio_x).floor();
    let unscaled_h = (with_bleed_h as f64 * ratio_y).floor();

    if unscaled_w < width as f64 && unscaled_h < height as f64 {
        let margin_x = ((width as f64 - unscaled_w) / 2.0).floor() as u32;
        let margin_y = ((height as f64 - unscaled_h) / 2.0).floor() as u32;
        let region = image.crop_imm(
            margin_x,
            margin_y,
            width - 2 * margin_x,
            height - 2 * margin_y,
        );

        return PreparedCard {
            image: region.resize_exact(
                (with_bleed_w as u32).max(1),
                (with_bleed_h as u32).max(1),
                RESIZE_FILTER,
            ),
            native_bleed: bleed,
            synthetic_bleed: (0, 0),
        };
    }

    let margin_x = ((width as f64 * crop.0 / 100.0).floor() as u32 / 2).min(width / 2);
    let margin_y = ((height as f64 * crop.1 / 100.0).floor() as u32 / 2).min(height / 2);
    let region = image.crop_imm(
        margin_x,
        margin_y,
        (width - 2 * margin_x).max(1),
        (height - 2 * margin_y).max(1),
    );

    PreparedCard {
        image: region.resize_exact(scaled.0.max(1), scaled.1.max(1), RESIZE_FILTER),
        native_bleed: (0, 0),
        synthetic_bleed: bleed,
    }
}

/// Remove `trim` pixels from every edge, if the image is large enough
fn trim_edges(image: DynamicImage, trim: u32) -> DynamicImage {
    if trim == 0 || image.width() <= 2 * trim || image.height() <= 2 * trim {
        return image;
    }
    image.crop_imm(
        trim,
        trim,
        image.width() - 2 * trim,
        image.height() - 2 * trim,
    )
}

fn scale(px: u32, ratio: f64) -> u32 {
    (px as f64 * ratio).floor() as u32
}

fn scale_up(px: u32, ratio: f64) -> u32 {
    (px as f64 * ratio).ceil() as u32
}
