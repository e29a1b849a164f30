//! PDF image discovery
//!
//! Walks page content streams, tracking the current transformation matrix,
//! to find every place an image XObject is painted. Images nested inside Form
//! XObjects are found by following the form's matrix and resources.

use crate::constants::*;
use crate::types::*;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};

// =============================================================================
// Types
// =============================================================================

/// One painted occurrence of an image on a page
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// The image XObject; repeated placements of one image share it
    pub image: ObjectId,
    /// Intrinsic pixel size of the image
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Bounding box in points, origin at the page's top-left corner
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Encoded image ready to be written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub bytes: Vec<u8>,
    /// File extension without the dot
    pub ext: &'static str,
}

/// An opened source document
pub struct PdfSource {
    path: PathBuf,
    doc: Document,
    pages: Vec<ObjectId>,
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// `self × other`: apply `self` first, then `other`
    fn then(self, other: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [na, nb, nc, nd, ne, nf] = other.0;
        Matrix([
            a * na + b * nc,
            a * nb + b * nd,
            c * na + d * nc,
            c * nb + d * nd,
            e * na + f * nc + ne,
            e * nb + f * nd + nf,
        ])
    }

    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() != 6 {
            return None;
        }
        let mut values = [0.0; 6];
        for (value, operand) in values.iter_mut().zip(operands) {
            *value = number(operand)?;
        }
        Some(Matrix(values))
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

// =============================================================================
// Document Access
// =============================================================================

impl PdfSource {
    /// Open a PDF. A missing file is reported as [`ExtractError::NotFound`].
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let doc = Document::load(path).map_err(|source| ExtractError::Pdf {
            path: path.to_path_buf(),
            source,
        })?;
        let pages = doc.get_pages().into_values().collect();

        Ok(Self {
            path: path.to_path_buf(),
            doc,
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn pdf_err(&self, source: lopdf::Error) -> ExtractError {
        ExtractError::Pdf {
            path: self.path.clone(),
            source,
        }
    }

    /// Every image placement on a 1-based page, in content order
    pub fn placements(&self, page: u32) -> Result<Vec<Placement>> {
        let Some(&page_id) = page
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
        else {
            return Ok(Vec::new());
        };

        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| self.pdf_err(e))?;
        let media_box = self.media_box(page_dict);
        let resources = self.inherited(page_dict, b"Resources");
        let content = page_content(&self.doc, page_dict).map_err(|e| self.pdf_err(e))?;

        let mut painted = Vec::new();
        self.walk(&content, resources, Matrix::IDENTITY, 0, &mut painted)?;

        let [x0, _, _, y1] = media_box;
        Ok(painted
            .into_iter()
            .map(|(image, (pixel_width, pixel_height), ctm)| {
                let corners = [
                    ctm.apply(0.0, 0.0),
                    ctm.apply(1.0, 0.0),
                    ctm.apply(0.0, 1.0),
                    ctm.apply(1.0, 1.0),
                ];
                let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
                let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
                let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
                let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

                Placement {
                    image,
                    pixel_width,
                    pixel_height,
                    x: min_x - x0,
                    y: y1 - max_y,
                    width: max_x - min_x,
                    height: max_y - min_y,
                }
            })
            .collect())
    }

    /// Height of a 1-based page in points
    pub fn page_height(&self, page: u32) -> f64 {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .and_then(|&id| self.doc.get_dictionary(id).ok())
            .map(|dict| {
                let [_, y0, _, y1] = self.media_box(dict);
                (y1 - y0).abs()
            })
            .unwrap_or(DEFAULT_MEDIA_BOX[3])
    }

    /// Look up a page attribute, following the `Parent` chain
    fn inherited<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut current = dict;
        for _ in 0..MAX_FORM_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(self.resolve(value));
            }
            let parent = current.get(b"Parent").ok()?;
            current = self.resolve(parent).as_dict().ok()?;
        }
        None
    }

    fn media_box(&self, page_dict: &Dictionary) -> [f64; 4] {
        let Some(Object::Array(values)) = self.inherited(page_dict, b"MediaBox") else {
            return DEFAULT_MEDIA_BOX;
        };
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|v| number(self.resolve(v)))
            .collect();
        match numbers.as_slice() {
            [x0, y0, x1, y1] => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        let mut current = obj;
        for _ in 0..MAX_FORM_DEPTH {
            match current {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(target) => current = target,
                    Err(_) => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Find the XObject stream named `name` in a resource dictionary
    fn xobject(&self, resources: Option<&Object>, name: &[u8]) -> Option<(ObjectId, &Stream)> {
        let resources = resources?.as_dict().ok()?;
        let xobjects = self.resolve(resources.get(b"XObject").ok()?).as_dict().ok()?;
        let id = xobjects.get(name).ok()?.as_reference().ok()?;
        let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
        Some((id, stream))
    }

    /// Interpret a content stream, collecting image paints with their CTM
    fn walk(
        &self,
        content: &[u8],
        resources: Option<&Object>,
        base: Matrix,
        depth: usize,
        painted: &mut Vec<(ObjectId, (u32, u32), Matrix)>,
    ) -> Result<()> {
        if depth > MAX_FORM_DEPTH {
            log::warn!(
                "{}: Form XObjects nested deeper than {}, ignoring the rest",
                self.path.display(),
                MAX_FORM_DEPTH
            );
            return Ok(());
        }

        let content = Content::decode(content).map_err(|e| self.pdf_err(e))?;
        let mut ctm = base;
        let mut stack = Vec::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or(base),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(ctm);
                    }
                }
                "Do" => {
                    let Some(Object::Name(name)) = op.operands.first() else {
                        continue;
                    };
                    let Some((id, stream)) = self.xobject(resources, name) else {
                        continue;
                    };

                    match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
                        Ok(b"Image") => {
                            let dims = (
                                dict_u32(&stream.dict, b"Width"),
                                dict_u32(&stream.dict, b"Height"),
                            );
                            painted.push((id, dims, ctm));
                        }
                        Ok(b"Form") => {
                            let matrix = stream
                                .dict
                                .get(b"Matrix")
                                .ok()
                                .and_then(|m| m.as_array().ok())
                                .and_then(|m| Matrix::from_operands(m))
                                .unwrap_or(Matrix::IDENTITY);
                            let form_resources = stream
                                .dict
                                .get(b"Resources")
                                .ok()
                                .map(|r| self.resolve(r))
                                .or(resources);
                            let form_content = stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone());
                            self.walk(
                                &form_content,
                                form_resources,
                                matrix.then(ctm),
                                depth + 1,
                                painted,
                            )?;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    // =========================================================================
    // Image Data
    // =========================================================================

    /// Pull the image data of an XObject out as a file-ready encoding.
    ///
    /// JPEG and JPEG 2000 streams are returned verbatim; 8-bit raw or
    /// Flate-compressed samples are re-encoded as PNG. Anything else is
    /// reported as an unsupported encoding.
    pub fn extract_image(&self, id: ObjectId) -> std::result::Result<ExtractedImage, String> {
        let stream = self
            .doc
            .get_object(id)
            .and_then(|o| o.as_stream())
            .map_err(|e| format!("object {:?} is not an image stream: {}", id, e))?;

        let filters = self.filters(&stream.dict);
        match filters.last().map(Vec::as_slice) {
            Some(b"DCTDecode") if filters.len() == 1 => {
                return Ok(ExtractedImage {
                    bytes: stream.content.clone(),
                    ext: "jpg",
                });
            }
            Some(b"JPXDecode") if filters.len() == 1 => {
                return Ok(ExtractedImage {
                    bytes: stream.content.clone(),
                    ext: "jp2",
                });
            }
            Some(b"DCTDecode") | Some(b"JPXDecode") => {
                let bytes = stream
                    .decompressed_content()
                    .map_err(|e| format!("cannot decode image stream: {}", e))?;
                let ext = if filters.last().map(Vec::as_slice) == Some(b"DCTDecode") {
                    "jpg"
                } else {
                    "jp2"
                };
                return Ok(ExtractedImage { bytes, ext });
            }
            _ => {}
        }

        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .map_err(|e| format!("cannot decode image stream: {}", e))?
        };

        let width = dict_u32(&stream.dict, b"Width");
        let height = dict_u32(&stream.dict, b"Height");
        let bits = dict_u32(&stream.dict, b"BitsPerComponent");
        if bits != 8 {
            return Err(format!("{} bits per component is not supported", bits));
        }

        let color_space = stream
            .dict
            .get(b"ColorSpace")
            .ok()
            .map(|cs| self.resolve(cs));
        let rgb = self.to_rgb(&samples, width, height, color_space)?;

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| format!("cannot encode PNG: {}", e))?;

        Ok(ExtractedImage { bytes, ext: "png" })
    }

    fn filters(&self, dict: &Dictionary) -> Vec<Vec<u8>> {
        match dict.get(b"Filter").map(|f| self.resolve(f)) {
            Ok(Object::Name(name)) => vec![name.clone()],
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|item| self.resolve(item).as_name().ok().map(<[u8]>::to_vec))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Convert 8-bit samples in a supported color space to RGB
    fn to_rgb(
        &self,
        samples: &[u8],
        width: u32,
        height: u32,
        color_space: Option<&Object>,
    ) -> std::result::Result<image::RgbImage, String> {
        let pixels = width as usize * height as usize;
        let space = color_space.ok_or("missing color space")?;

        let rgb: Vec<u8> = match space {
            Object::Name(name) => match name.as_slice() {
                b"DeviceRGB" | b"CalRGB" => take(samples, pixels * 3)?.to_vec(),
                b"DeviceGray" | b"CalGray" => gray_to_rgb(take(samples, pixels)?),
                b"DeviceCMYK" => cmyk_to_rgb(take(samples, pixels * 4)?),
                other => {
                    return Err(format!(
                        "color space {} is not supported",
                        String::from_utf8_lossy(other)
                    ));
                }
            },
            Object::Array(items) => {
                let family = items
                    .first()
                    .map(|f| self.resolve(f))
                    .and_then(|f| f.as_name().ok())
                    .unwrap_or_default();
                match family {
                    b"ICCBased" => {
                        let components = items
                            .get(1)
                            .map(|s| self.resolve(s))
                            .and_then(|s| s.as_stream().ok())
                            .map(|s| dict_u32(&s.dict, b"N"))
                            .unwrap_or(3);
                        match components {
                            1 => gray_to_rgb(take(samples, pixels)?),
                            3 => take(samples, pixels * 3)?.to_vec(),
                            4 => cmyk_to_rgb(take(samples, pixels * 4)?),
                            n => return Err(format!("ICC profile with {} components", n)),
                        }
                    }
                    b"Indexed" => self.indexed_to_rgb(items, take(samples, pixels)?)?,
                    b"CalRGB" => take(samples, pixels * 3)?.to_vec(),
                    b"CalGray" => gray_to_rgb(take(samples, pixels)?),
                    other => {
                        return Err(format!(
                            "color space {} is not supported",
                            String::from_utf8_lossy(other)
                        ));
                    }
                }
            }
            _ => return Err("malformed color space".to_string()),
        };

        image::RgbImage::from_raw(width, height, rgb).ok_or_else(|| "sample size mismatch".to_string())
    }

    /// Expand `[/Indexed base hival lookup]` samples through the lookup table
    fn indexed_to_rgb(&self, items: &[Object], indices: &[u8]) -> std::result::Result<Vec<u8>, String> {
        let base = items.get(1).map(|b| self.resolve(b));
        let base_components = match base {
            Some(Object::Name(name)) if name == b"DeviceGray" => 1,
            Some(Object::Name(name)) if name == b"DeviceCMYK" => 4,
            Some(Object::Name(_)) => 3,
            Some(Object::Array(inner)) => inner
                .get(1)
                .map(|s| self.resolve(s))
                .and_then(|s| s.as_stream().ok())
                .map(|s| dict_u32(&s.dict, b"N") as usize)
                .unwrap_or(3),
            _ => return Err("indexed color space without base".to_string()),
        };

        let lookup: Vec<u8> = match items.get(3).map(|l| self.resolve(l)) {
            Some(Object::String(bytes, _)) => bytes.clone(),
            Some(Object::Stream(stream)) => stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
            _ => return Err("indexed color space without lookup table".to_string()),
        };

        let mut rgb = Vec::with_capacity(indices.len() * 3);
        for &index in indices {
            let start = index as usize * base_components;
            let entry = lookup
                .get(start..start + base_components)
                .ok_or("palette index out of range")?;
            match base_components {
                1 => rgb.extend_from_slice(&[entry[0]; 3]),
                4 => rgb.extend(cmyk_to_rgb(entry)),
                _ => rgb.extend_from_slice(&entry[..3]),
            }
        }
        Ok(rgb)
    }
}

/// Concatenated, decompressed content streams of a page
fn page_content(doc: &Document, page_dict: &Dictionary) -> lopdf::Result<Vec<u8>> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()),
    };

    let ids: Vec<ObjectId> = match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(items) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => vec![*id],
        },
        Object::Array(items) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    };

    let mut result = Vec::new();
    for id in ids {
        if let Ok(stream) = doc.get_object(id)?.as_stream() {
            let content = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            result.extend_from_slice(&content);
            result.push(b'\n');
        }
    }
    Ok(result)
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .ok()
        .and_then(number)
        .map(|v| v.max(0.0) as u32)
        .unwrap_or(0)
}

fn take(samples: &[u8], len: usize) -> std::result::Result<&[u8], String> {
    samples
        .get(..len)
        .ok_or_else(|| format!("expected {} bytes of samples, found {}", len, samples.len()))
}

fn gray_to_rgb(gray: &[u8]) -> Vec<u8> {
    gray.iter().flat_map(|&g| [g, g, g]).collect()
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}
