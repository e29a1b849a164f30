//! Synthetic bleed
//!
//! Places a card on the canvas and replicates its outermost pixels outward.
//! Everything is clipped to the canvas, so an unbounded bleed simply runs to
//! the page edge.

use image::{RgbImage, imageops};
use std::ops::Range;

/// Paste `card` with its top-left corner at (`x`, `y`) and extend each edge by
/// `bleed` pixels (horizontal, vertical).
pub fn draw_card_with_bleed(canvas: &mut RgbImage, card: &RgbImage, x: i64, y: i64, bleed: (u32, u32)) {
    imageops::replace(canvas, card, x, y);

    let (w, h) = (card.width() as i64, card.height() as i64);
    if w == 0 || h == 0 {
        return;
    }

    let (bw, bh) = (bleed.0 as i64, bleed.1 as i64);
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

    let above = clip(y - bh, y, ch);
    let below = clip(y + h, y + h + bh, ch);
    let left = clip(x - bw, x, cw);
    let right = clip(x + w, x + w + bw, cw);
    let columns = clip(x, x + w, cw);
    let rows = clip(y, y + h, ch);

    // Top and bottom
    for (band, src_y) in [(above.clone(), 0), (below.clone(), h - 1)] {
        for ty in band {
            for tx in columns.clone() {
                copy_pixel(canvas, card, tx, ty, tx - x, src_y);
            }
        }
    }

    // Left and right
    for (band, src_x) in [(left.clone(), 0), (right.clone(), w - 1)] {
        for tx in band {
            for ty in rows.clone() {
                copy_pixel(canvas, card, tx, ty, src_x, ty - y);
            }
        }
    }

    // Corners
    for (x_band, src_x) in [(left, 0), (right, w - 1)] {
        for (y_band, src_y) in [(above.clone(), 0), (below.clone(), h - 1)] {
            let corner = *card.get_pixel(src_x as u32, src_y as u32);
            for tx in x_band.clone() {
                for ty in y_band.clone() {
                    canvas.put_pixel(tx as u32, ty as u32, corner);
                }
            }
        }
    }
}

fn clip(start: i64, end: i64, limit: i64) -> Range<i64> {
    let start = start.max(0);
    let end = end.min(limit);
    if start >= end { 0..0 } else { start..end }
}

fn copy_pixel(canvas: &mut RgbImage, card: &RgbImage, tx: i64, ty: i64, sx: i64, sy: i64) {
    let pixel = *card.get_pixel(sx as u32, sy as u32);
    canvas.put_pixel(tx as u32, ty as u32, pixel);
}
