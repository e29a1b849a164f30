//! Built-in artwork: the registration-mark page canvas and the default card back
//!
//! A registration image shipped in an assets directory takes precedence over
//! the procedural marks drawn here.

use crate::constants::*;
use crate::images::load_image;
use crate::types::*;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;
use std::path::Path;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// File name of a registration image inside an assets directory
pub fn registration_filename(paper: PaperSize, registration: Registration) -> String {
    format!("{}_registration_{}.jpg", paper, registration.mark_count())
}

/// Create the blank page canvas carrying registration marks.
///
/// `page_width` and `page_height` are baseline pixels; the canvas is scaled
/// by `ratio`.
pub fn registration_canvas(
    assets_dir: Option<&Path>,
    paper: PaperSize,
    registration: Registration,
    page_width: u32,
    page_height: u32,
    ratio: f64,
) -> Result<RgbImage> {
    if let Some(dir) = assets_dir {
        let path = dir.join(registration_filename(paper, registration));
        if path.is_file() {
            let image = load_image(&path)?;
            let width = (image.width() as f64 * ratio).floor() as u32;
            let height = (image.height() as f64 * ratio).floor() as u32;
            return Ok(imageops::resize(&image.to_rgb8(), width, height, FilterType::CatmullRom));
        }
        log::debug!(
            "No registration image at {}, drawing marks instead",
            path.display()
        );
    }

    let width = (page_width as f64 * ratio).floor() as u32;
    let height = (page_height as f64 * ratio).floor() as u32;
    let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), WHITE);
    draw_registration_marks(&mut canvas, registration, ratio);
    Ok(canvas)
}

/// Draw crosshair-in-circle marks near the page corners
fn draw_registration_marks(canvas: &mut RgbImage, registration: Registration, ratio: f64) {
    let inset = scaled(REGISTRATION_MARK_INSET, ratio);
    let (width, height) = (canvas.width() as f32, canvas.height() as f32);

    let mut centers = vec![
        (inset, inset),
        (width - inset, inset),
        (inset, height - inset),
    ];
    if registration == Registration::Four {
        centers.push((width - inset, height - inset));
    }

    let radius = scaled(REGISTRATION_MARK_RADIUS, ratio);
    let arm = scaled(REGISTRATION_MARK_ARM, ratio);

    for (cx, cy) in centers {
        draw_line_segment_mut(canvas, (cx - arm, cy), (cx + arm, cy), BLACK);
        draw_line_segment_mut(canvas, (cx, cy - arm), (cx, cy + arm), BLACK);
        for ring in 0..2 {
            draw_hollow_circle_mut(
                canvas,
                (cx.round() as i32, cy.round() as i32),
                radius.round() as i32 - ring,
                BLACK,
            );
        }
    }
}

fn scaled(px: u32, ratio: f64) -> f32 {
    (px as f64 * ratio) as f32
}

/// The card back used when no back image is supplied
pub fn default_back(width: u32, height: u32) -> RgbaImage {
    let field = Rgba([38, 44, 58, 255]);
    let frame = Rgba([196, 170, 110, 255]);

    let mut image = RgbaImage::from_pixel(width.max(1), height.max(1), field);

    let inset = (width.min(height) / 12).max(1);
    let thickness = (width.min(height) / 60).max(1);
    for step in 0..thickness {
        let offset = (inset + step) as i32;
        let inner_w = width.saturating_sub(2 * (inset + step));
        let inner_h = height.saturating_sub(2 * (inset + step));
        if inner_w == 0 || inner_h == 0 {
            break;
        }
        draw_hollow_rect_mut(
            &mut image,
            Rect::at(offset, offset).of_size(inner_w, inner_h),
            frame,
        );
    }

    // Center diamond
    let size = (width.min(height) / 6).max(1);
    let cx = (width / 2) as i32;
    let cy = (height / 2) as i32;
    for row in 0..size as i32 {
        let half = (size as i32 / 2 - (row - size as i32 / 2).abs()).max(0);
        if half == 0 {
            continue;
        }
        draw_filled_rect_mut(
            &mut image,
            Rect::at(cx - half, cy - size as i32 / 2 + row).of_size(2 * half as u32, 1),
            frame,
        );
    }

    image
}
