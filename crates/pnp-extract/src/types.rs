use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot read PDF \"{}\": {source}", path.display())]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    #[error("Cannot write \"{}\": {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// How the pages of one document are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentMode {
    /// Odd pages are fronts, even pages are their backs
    Alternating,
    /// Every page holds fronts
    FrontsOnly,
    /// Every page holds backs
    BacksOnly,
}

/// Role of a single page within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    Front,
    Back,
}

impl DocumentMode {
    /// Role of a 1-based page number
    pub fn role_of(self, page: u32) -> PageRole {
        match self {
            DocumentMode::Alternating if page % 2 == 0 => PageRole::Back,
            DocumentMode::Alternating | DocumentMode::FrontsOnly => PageRole::Front,
            DocumentMode::BacksOnly => PageRole::Back,
        }
    }
}
