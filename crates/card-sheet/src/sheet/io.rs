//! Page serialization: a multi-page PDF or numbered PNG files

use crate::constants::*;
use crate::types::*;
use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb};
use imageproc::drawing::{draw_text_mut, text_size};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

/// Font stamped into raster labels unless another one is configured
const DEFAULT_LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Label geometry in output pixels for a page of the given height
struct LabelPlacement {
    top: f64,
    font_px: f64,
}

impl LabelPlacement {
    fn for_page(page_height: u32, ppi: u32) -> Self {
        let ratio = ppi_ratio(ppi);
        Self {
            top: page_height as f64 - (LABEL_OFFSET_FROM_BOTTOM as f64 * ratio).floor(),
            font_px: LABEL_FONT_SIZE as f64 * ratio,
        }
    }
}

// =============================================================================
// PDF Output
// =============================================================================

/// Write all pages into one PDF, each page a full-bleed JPEG image
pub fn write_pdf(pages: &[SheetPage], path: &Path, ppi: u32, quality: u8) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let pt_per_px = POINTS_PER_INCH / ppi as f64;
    let mut page_refs = Vec::with_capacity(pages.len());

    for page in pages {
        let (width_px, height_px) = page.image.dimensions();
        let width_pt = width_px as f64 * pt_per_px;
        let height_pt = height_px as f64 * pt_per_px;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .encode_image(&page.image)
            .map_err(|source| SheetError::Image {
                path: path.to_path_buf(),
                source,
            })?;

        let image_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width_px as i64)),
            ("Height", Object::Integer(height_px as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        let image_id = doc.add_object(Stream::new(image_dict, jpeg).with_compression(false));

        let mut content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q\n", width_pt, height_pt);
        if let Some(label) = &page.label {
            let placement = LabelPlacement::for_page(height_px, ppi);
            let font_pt = placement.font_px * pt_per_px;
            let text_width = label.chars().count() as f64 * font_pt * HELVETICA_CHAR_WIDTH_RATIO;
            let text_x = width_pt / 2.0 - text_width / 2.0;
            let text_y = height_pt - (placement.top + placement.font_px) * pt_per_px;
            content.push_str(&format!(
                "BT /F1 {:.2} Tf {:.2} {:.2} Td ({}) Tj ET\n",
                font_pt,
                text_x,
                text_y,
                escape_pdf_text(label)
            ));
        }
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let resources = Dictionary::from_iter(vec![
            (
                "XObject",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "Im0",
                    Object::Reference(image_id),
                )])),
            ),
            (
                "Font",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "F1",
                    Object::Reference(font_id),
                )])),
            ),
        ]);

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width_pt as f32),
                    Object::Real(height_pt as f32),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
        ]));
        page_refs.push(Object::Reference(page_id));
    }

    let count = page_refs.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(page_refs)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    doc.save(path)?;
    Ok(())
}

/// Escape the characters that are special inside a PDF literal string
fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

// =============================================================================
// Raster Output
// =============================================================================

/// Directory raster pages are written into. A path that looks like a file
/// (has an extension) is reduced to its parent directory.
pub fn image_output_dir(path: &Path) -> PathBuf {
    if path.extension().is_some() && !path.is_dir() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}

/// Write each page as `page<N>.png` (1-based), stamping labels with `font`
pub fn write_images(
    pages: &[SheetPage],
    dir: &Path,
    ppi: u32,
    font: &FontVec,
) -> Result<Vec<PathBuf>> {
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)?;
    }

    let mut written = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let path = dir.join(format!("page{}.png", index + 1));

        match &page.label {
            Some(label) => {
                let mut image = page.image.clone();
                stamp_label(&mut image, label, font, ppi);
                save_png(&image, &path)?;
            }
            None => save_png(&page.image, &path)?,
        }

        written.push(path);
    }

    Ok(written)
}

fn save_png(image: &image::RgbImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| SheetError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Draw `label` centered horizontally near the bottom of the page
pub fn stamp_label(image: &mut image::RgbImage, label: &str, font: &FontVec, ppi: u32) {
    let placement = LabelPlacement::for_page(image.height(), ppi);
    let scale = PxScale::from(placement.font_px as f32);
    let (text_width, _) = text_size(scale, font, label);

    let x = (image.width() as i32 / 2) - (text_width as i32 / 2);
    draw_text_mut(
        image,
        Rgb([0, 0, 0]),
        x,
        placement.top as i32,
        scale,
        font,
        label,
    );
}

/// The font shipped with the crate
pub fn default_label_font() -> Result<FontVec> {
    FontVec::try_from_vec(DEFAULT_LABEL_FONT.to_vec())
        .map_err(|e| SheetError::Config(format!("Cannot load built-in label font: {}", e)))
}

/// Load a TrueType or OpenType font for raster labels
pub fn load_label_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path)?;
    FontVec::try_from_vec(bytes).map_err(|e| {
        SheetError::Config(format!(
            "Cannot load label font \"{}\": {}",
            path.display(),
            e
        ))
    })
}
