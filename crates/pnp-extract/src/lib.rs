pub mod classify;
pub mod constants;
mod extract;
pub mod folder;
pub mod grid;
mod options;
pub mod pairing;
pub mod pdf;
mod report;
mod types;

pub use extract::{extract, extract_blocking};
pub use folder::{PdfGroup, find_pdf_pairs};
pub use options::*;
pub use pdf::{ExtractedImage, PdfSource, Placement};
pub use report::{Diagnostic, ExtractionReport};
pub use types::*;
