use std::fmt;
use std::path::PathBuf;

/// Non-fatal condition met during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A page without any card-sized image
    EmptyPage { document: PathBuf, page: u32 },
    /// Front and back page disagree on the number of cards; the pair is not matched.
    /// `document` is the one holding the back page.
    LayoutMismatch {
        document: PathBuf,
        front_page: u32,
        back_page: u32,
        fronts: usize,
        backs: usize,
    },
    /// A unique back with no front at the same position
    UnmatchedBack {
        document: PathBuf,
        page: u32,
        position: usize,
    },
    /// More cards on a page than the requested grid holds
    GridOverflow {
        document: PathBuf,
        page: u32,
        found: usize,
        capacity: usize,
    },
    InvalidGrid(String),
    InvalidSkip(String),
    /// An image whose encoding cannot be written out
    UnsupportedImage {
        document: PathBuf,
        page: u32,
        position: usize,
        reason: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyPage { document, page } => {
                write!(f, "{} page {}: No cards found, skipping", document.display(), page)
            }
            Diagnostic::LayoutMismatch {
                document,
                front_page,
                back_page,
                fronts,
                backs,
            } => write!(
                f,
                "{} front page {} / back page {}: layout mismatch ({} fronts, {} backs), treating fronts as single-sided",
                document.display(),
                front_page,
                back_page,
                fronts,
                backs
            ),
            Diagnostic::UnmatchedBack {
                document,
                page,
                position,
            } => write!(
                f,
                "{} page {}: back {} has no matching front",
                document.display(),
                page,
                position
            ),
            Diagnostic::GridOverflow {
                document,
                page,
                found,
                capacity,
            } => write!(
                f,
                "{} page {}: Found {} cards, expected max {}",
                document.display(),
                page,
                found,
                capacity
            ),
            Diagnostic::InvalidGrid(grid) => {
                write!(f, "Invalid grid format '{}', using auto-detect", grid)
            }
            Diagnostic::InvalidSkip(part) => write!(f, "Invalid page number or range '{}'", part),
            Diagnostic::UnsupportedImage {
                document,
                page,
                position,
                reason,
            } => write!(
                f,
                "{} page {}: card {} not extracted: {}",
                document.display(),
                page,
                position,
                reason
            ),
        }
    }
}

/// Totals and diagnostics of one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub documents: usize,
    pub pages: usize,
    pub fronts: usize,
    pub common_backs: usize,
    pub unique_backs: usize,
    /// Unique backs written under their matching front's name
    pub paired_backs: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionReport {
    /// Record a diagnostic and log it as a warning
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} document(s), {} page(s): {} front(s), {} common back(s), {} unique back(s) ({} paired), {} warning(s)",
            self.documents,
            self.pages,
            self.fronts,
            self.common_backs,
            self.unique_backs,
            self.paired_backs,
            self.diagnostics.len()
        )
    }
}
