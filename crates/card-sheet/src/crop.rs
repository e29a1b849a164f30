//! Crop and bleed arithmetic
//!
//! Crop is expressed as a percentage of the card dimension that is removed in
//! total (half from each edge). Bleed is expressed in baseline pixels.

use crate::constants::{BASELINE_PPI, MM_PER_INCH, UNBOUNDED_BLEED};
use crate::types::*;

/// Parse a crop string into per-axis crop percentages.
///
/// Accepted forms (case-insensitive, surrounding whitespace ignored):
/// - empty: no crop
/// - `9`, `6.5`, `.5`: the same percentage on both axes
/// - `3mm`, `3.5mm`: a physical distance in millimeters
/// - `0.125in`, `.1in`: a physical distance in inches
pub fn parse_crop(text: &str, card_width_px: u32, card_height_px: u32) -> Result<(f64, f64)> {
    let normalized = text.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Ok((0.0, 0.0));
    }

    if let Some(mm) = normalized.strip_suffix("mm").and_then(parse_decimal) {
        return Ok(inches_to_crop(mm / MM_PER_INCH, card_width_px, card_height_px));
    }

    if let Some(inches) = normalized.strip_suffix("in").and_then(parse_decimal) {
        return Ok(inches_to_crop(inches, card_width_px, card_height_px));
    }

    if let Some(percent) = parse_decimal(&normalized) {
        return Ok((percent, percent));
    }

    Err(SheetError::Config(format!("Invalid crop format: '{}'", text)))
}

/// Convert a physical crop distance per edge into crop percentages.
///
/// The factor of two accounts for the crop being taken from both edges.
pub fn inches_to_crop(crop_in: f64, card_width_px: u32, card_height_px: u32) -> (f64, f64) {
    let card_width_in = card_width_px as f64 / BASELINE_PPI as f64;
    let card_height_in = card_height_px as f64 / BASELINE_PPI as f64;

    (
        2.0 * crop_in / card_width_in * 100.0,
        2.0 * crop_in / card_height_in * 100.0,
    )
}

/// Parse an unsigned decimal: `1`, `1.`, `1.5` or `.5`. No sign, no exponent.
fn parse_decimal(s: &str) -> Option<f64> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    let valid = match frac_part {
        None => !int_part.is_empty() && all_digits(int_part),
        Some(frac) => {
            all_digits(int_part) && all_digits(frac) && !(int_part.is_empty() && frac.is_empty())
        }
    };

    if !valid {
        return None;
    }

    let text = if int_part.is_empty() {
        format!("0{}", s)
    } else {
        s.to_string()
    };
    text.parse().ok()
}

/// Compute the largest synthetic bleed that cannot paint into a neighbor.
///
/// Positions are sorted before use. An axis with a single position, or whose
/// first two cells overlap, reports [`UNBOUNDED_BLEED`].
pub fn max_bleed(x_pos: &[u32], y_pos: &[u32], card_width: u32, card_height: u32) -> (u32, u32) {
    (
        axis_bleed(x_pos, card_width),
        axis_bleed(y_pos, card_height),
    )
}

fn axis_bleed(positions: &[u32], card_extent: u32) -> u32 {
    if positions.len() < 2 {
        return UNBOUNDED_BLEED;
    }

    let mut sorted = positions.to_vec();
    sorted.sort_unstable();

    let gap = sorted[1] as i64 - sorted[0] as i64 - card_extent as i64;
    if gap <= 0 {
        return UNBOUNDED_BLEED;
    }

    // ceil(gap / 2)
    ((gap + 1) / 2) as u32
}
