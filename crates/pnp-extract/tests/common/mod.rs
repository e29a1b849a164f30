#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;

/// Image painted at `(x, y)` from the page's top-left, `width` x `height` points
#[derive(Clone, Copy)]
pub struct Place {
    pub image: ObjectId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn place(image: ObjectId, x: f64, y: f64) -> Place {
    Place {
        image,
        x,
        y,
        width: 100.0,
        height: 140.0,
    }
}

/// Three cards per row starting at y = 100
pub fn grid(images: &[ObjectId]) -> Vec<Place> {
    images
        .iter()
        .enumerate()
        .map(|(i, &image)| {
            let col = (i % 3) as f64;
            let row = (i / 3) as f64;
            place(image, 50.0 + col * 150.0, 100.0 + row * 200.0)
        })
        .collect()
}

pub struct TestPdf {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl TestPdf {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Uncompressed DeviceRGB image of one color
    pub fn image(&mut self, width: u32, height: u32, color: [u8; 3]) -> ObjectId {
        let data: Vec<u8> = (0..width * height).flat_map(|_| color).collect();
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width as i64)),
            ("Height", Object::Integer(height as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);
        self.doc.add_object(Stream::new(dict, data).with_compression(false))
    }

    pub fn card(&mut self, color: [u8; 3]) -> ObjectId {
        self.image(200, 200, color)
    }

    /// JPEG image stored as a DCTDecode stream; returns the id and the bytes
    pub fn jpeg(&mut self, width: u32, height: u32, color: [u8; 3]) -> (ObjectId, Vec<u8>) {
        let image = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, 90)
            .encode_image(&image)
            .unwrap();

        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width as i64)),
            ("Height", Object::Integer(height as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        let id = self
            .doc
            .add_object(Stream::new(dict, bytes.clone()).with_compression(false));
        (id, bytes)
    }

    /// Form XObject that paints `image` in a 1x1 unit square scaled by `matrix`
    pub fn form(&mut self, image: ObjectId, matrix: [f64; 6]) -> ObjectId {
        let content = format!(
            "q {} {} {} {} {} {} cm /Inner Do Q",
            matrix[0], matrix[1], matrix[2], matrix[3], matrix[4], matrix[5]
        );
        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Inner",
                Object::Reference(image),
            )])),
        )]);
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Form".to_vec())),
            (
                "BBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
        ]);
        self.doc.add_object(Stream::new(dict, content.into_bytes()))
    }

    pub fn page(&mut self, places: &[Place]) {
        let mut content = String::new();
        let mut xobjects = Dictionary::new();
        for (i, p) in places.iter().enumerate() {
            let name = format!("Im{}", i);
            let bottom = PAGE_HEIGHT - p.y - p.height;
            content.push_str(&format!(
                "q {} 0 0 {} {} {} cm /{} Do Q\n",
                p.width, p.height, p.x, bottom, name
            ));
            xobjects.set(name, Object::Reference(p.image));
        }
        self.raw_page(content, xobjects);
    }

    /// Page that paints a Form XObject with the identity matrix
    pub fn form_page(&mut self, form: ObjectId) {
        let xobjects = Dictionary::from_iter(vec![("Fm0", Object::Reference(form))]);
        self.raw_page("/Fm0 Do\n".to_string(), xobjects);
    }

    fn raw_page(&mut self, content: String, xobjects: Dictionary) {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);

        let page_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        self.kids.push(Object::Reference(page_id));
    }

    pub fn save(mut self, path: &Path) {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(self.kids)),
                ("Count", Object::Integer(count)),
            ])),
        );
        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", catalog_id);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        self.doc.save(path).unwrap();
    }
}

/// Color of the top-left pixel of an extracted image
pub fn color_of(path: &Path) -> [u8; 3] {
    image::open(path).unwrap().to_rgb8().get_pixel(0, 0).0
}

/// Sorted file names in a directory, empty if it does not exist
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
