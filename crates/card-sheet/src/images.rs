//! Image directory scanning and lookup
//!
//! Each input directory is scanned once into an [`ImageIndex`]. Files are
//! recognized by content sniffing, and double-sided backs are matched to
//! fronts through an extension-insensitive key built during the scan.

use crate::types::*;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Raster formats accepted as card art
const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Tiff,
    ImageFormat::Bmp,
    ImageFormat::Avif,
    ImageFormat::Qoi,
    ImageFormat::Dds,
];

/// Known junk files across operating systems
const EXTRANEOUS_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "Icon\r"];

/// Bytes read from the head of a file for format sniffing
const SNIFF_LEN: usize = 64;

/// Image files found under one directory, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    root: PathBuf,
    /// Relative paths ('/'-separated), naturally sorted
    files: Vec<String>,
    /// Extension-free key -> relative paths sharing it
    by_key: HashMap<String, Vec<String>>,
}

impl ImageIndex {
    /// Scan `root` for image files.
    pub fn scan(root: impl AsRef<Path>, recursive: bool) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SheetError::MissingDirectory(root.to_path_buf()));
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
            let entry = entry.map_err(|e| {
                SheetError::Io(std::io::Error::other(format!(
                    "Cannot scan \"{}\": {}",
                    root.display(),
                    e
                )))
            })?;

            if !entry.file_type().is_file() || is_extraneous(entry.file_name().to_str()) {
                continue;
            }

            if sniff_format(entry.path())?.is_none() {
                log::debug!("Ignoring non-image file {}", entry.path().display());
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative_name(relative));
            }
        }

        files.sort_by(|a, b| natural_cmp(a, b));

        let mut by_key: HashMap<String, Vec<String>> = HashMap::new();
        for file in &files {
            by_key.entry(stem_key(file)).or_default().push(file.clone());
        }

        Ok(Self {
            root: root.to_path_buf(),
            files,
            by_key,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths of every image, naturally sorted
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Absolute path of a relative entry
    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Find the single image whose extension-free key matches `key`.
    ///
    /// Returns `Ok(None)` when no image matches and an error when several do.
    pub fn resolve_key(&self, key: &str) -> Result<Option<PathBuf>> {
        match self.by_key.get(key).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([single]) => Ok(Some(self.path_of(single))),
            Some(many) => Err(SheetError::Input(format!(
                "Ambiguous image match in \"{}\": {}",
                self.root.display(),
                many.join(", ")
            ))),
        }
    }
}

fn is_extraneous(name: Option<&str>) -> bool {
    match name {
        Some(name) => EXTRANEOUS_FILES.contains(&name) || name.starts_with("._"),
        None => false,
    }
}

fn relative_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Identify a supported raster format from the file's leading bytes
pub fn sniff_format(path: &Path) -> Result<Option<ImageFormat>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;

    Ok(image::guess_format(&head)
        .ok()
        .filter(|format| SUPPORTED_FORMATS.contains(format)))
}

/// Extension-insensitive key of a relative path: `dir/card.png` -> `dir/card`
pub fn stem_key(relative: &str) -> String {
    let (dir, name) = match relative.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, relative),
    };

    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };

    match dir {
        Some(dir) => format!("{}/{}", dir, stem),
        None => stem.to_string(),
    }
}

/// Items of `subset` whose extension-free key does not occur in `mainset`
pub fn check_paths_subset<'a, 'b>(
    subset: impl IntoIterator<Item = &'a str>,
    mainset: impl IntoIterator<Item = &'b str>,
) -> BTreeSet<String> {
    let main_keys: BTreeSet<String> = mainset.into_iter().map(stem_key).collect();

    subset
        .into_iter()
        .filter(|path| !main_keys.contains(&stem_key(path)))
        .map(str::to_string)
        .collect()
}

/// Compare strings so that embedded numbers sort by value: `card2` < `card10`
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.as_bytes();
    let mut right = b.as_bytes();

    while !left.is_empty() && !right.is_empty() {
        let (l_chunk, l_rest) = split_chunk(left);
        let (r_chunk, r_rest) = split_chunk(right);

        let l_digits = l_chunk[0].is_ascii_digit();
        let r_digits = r_chunk[0].is_ascii_digit();

        let ordering = match (l_digits, r_digits) {
            (true, true) => compare_numeric(l_chunk, r_chunk),
            _ => l_chunk.cmp(r_chunk),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }

        left = l_rest;
        right = r_rest;
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

/// Split off the leading run of digits or non-digits
fn split_chunk(s: &[u8]) -> (&[u8], &[u8]) {
    let digits = s[0].is_ascii_digit();
    let end = s
        .iter()
        .position(|b| b.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().take_while(|&&b| b == b'0').count() };
    let a_trimmed = &a[trim(a)..];
    let b_trimmed = &b[trim(b)..];

    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Decode an image, identifying the format by content and applying
/// its EXIF orientation.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let to_err = |source: ImageError| SheetError::Image {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| to_err(ImageError::IoError(e)))?;
    let mut decoder = reader.into_decoder().map_err(to_err)?;
    let orientation = decoder.orientation().map_err(to_err)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(to_err)?;
    image.apply_orientation(orientation);

    Ok(image)
}

// =============================================================================
// Back Selection
// =============================================================================

/// Chooses the shared back image when a back directory holds several.
pub trait BackSelector {
    /// Return the index of the chosen candidate
    fn choose(&mut self, candidates: &[PathBuf]) -> usize;
}

impl<F> BackSelector for F
where
    F: FnMut(&[PathBuf]) -> usize,
{
    fn choose(&mut self, candidates: &[PathBuf]) -> usize {
        self(candidates)
    }
}

/// Always picks the first candidate (in natural order)
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl BackSelector for FirstCandidate {
    fn choose(&mut self, _candidates: &[PathBuf]) -> usize {
        0
    }
}
