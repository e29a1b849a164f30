//! Duplex registration offset
//!
//! Printers drift slightly between the two sides of a sheet. The measured
//! drift is stored as an [`OffsetData`] record and applied to back pages as a
//! wrapping translation.

use crate::constants::BASELINE_PPI;
use crate::types::*;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persisted page-to-page offset in baseline pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OffsetData {
    pub x_offset: i32,
    pub y_offset: i32,
}

impl OffsetData {
    pub fn new(x_offset: i32, y_offset: i32) -> Self {
        Self { x_offset, y_offset }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the record, creating its parent directory if needed
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Synchronous load used from inside the render task
    pub fn load_blocking(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Offset in output pixels: `floor(offset * ppi / 300)`
    pub fn scaled(&self, ppi: u32) -> (i64, i64) {
        let scale = |v: i32| (v as f64 * ppi as f64 / BASELINE_PPI as f64).floor() as i64;
        (scale(self.x_offset), scale(self.y_offset))
    }
}

/// Translate an image by (`dx`, `dy`), wrapping pixels around the edges
pub fn offset_image(image: &RgbImage, dx: i64, dy: i64) -> RgbImage {
    let (width, height) = (image.width() as i64, image.height() as i64);
    if width == 0 || height == 0 {
        return image.clone();
    }

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let src_x = (x as i64 - dx).rem_euclid(width) as u32;
        let src_y = (y as i64 - dy).rem_euclid(height) as u32;
        *image.get_pixel(src_x, src_y)
    })
}

/// Apply `offset` to every back page. Front pages are never moved.
///
/// Returns the number of pages shifted.
pub fn offset_pages(pages: &mut [SheetPage], offset: OffsetData, ppi: u32) -> usize {
    let (dx, dy) = offset.scaled(ppi);
    let mut shifted = 0;

    for page in pages.iter_mut().filter(|p| p.side == SheetSide::Back) {
        page.image = offset_image(&page.image, dx, dy);
        shifted += 1;
    }

    shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn marked(width: u32, height: u32) -> RgbImage {
        let mut image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image
    }

    #[test]
    fn test_offset_wraps() {
        let shifted = offset_image(&marked(10, 10), 3, -2);
        assert_eq!(*shifted.get_pixel(3, 8), Rgb([255, 0, 0]));
        assert_eq!(*shifted.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_scaled_by_ppi() {
        let offset = OffsetData::new(30, -7);
        assert_eq!(offset.scaled(300), (30, -7));
        assert_eq!(offset.scaled(600), (60, -14));
        // floor, not truncation
        assert_eq!(OffsetData::new(-1, 1).scaled(150), (-1, 0));
    }
}
