use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Inconsistent input: {0}")]
    Input(String),
    #[error("Directory \"{}\" does not exist or is not a directory", .0.display())]
    MissingDirectory(PathBuf),
    #[error("Cannot read image \"{}\": {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// Physical card sizes known to the layout catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSize {
    Standard,
    StandardDouble,
    Japanese,
    Poker,
    PokerHalf,
    Bridge,
    BridgeSquare,
    Tarot,
    Domino,
    DominoSquare,
}

impl CardSize {
    pub const ALL: [CardSize; 10] = [
        CardSize::Standard,
        CardSize::StandardDouble,
        CardSize::Japanese,
        CardSize::Poker,
        CardSize::PokerHalf,
        CardSize::Bridge,
        CardSize::BridgeSquare,
        CardSize::Tarot,
        CardSize::Domino,
        CardSize::DominoSquare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CardSize::Standard => "standard",
            CardSize::StandardDouble => "standard_double",
            CardSize::Japanese => "japanese",
            CardSize::Poker => "poker",
            CardSize::PokerHalf => "poker_half",
            CardSize::Bridge => "bridge",
            CardSize::BridgeSquare => "bridge_square",
            CardSize::Tarot => "tarot",
            CardSize::Domino => "domino",
            CardSize::DominoSquare => "domino_square",
        }
    }
}

impl fmt::Display for CardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Paper sizes known to the layout catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperSize {
    Letter,
    Tabloid,
    A4,
    A3,
    #[serde(rename = "archb")]
    ArchB,
}

impl PaperSize {
    pub const ALL: [PaperSize; 5] = [
        PaperSize::Letter,
        PaperSize::Tabloid,
        PaperSize::A4,
        PaperSize::A3,
        PaperSize::ArchB,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaperSize::Letter => "letter",
            PaperSize::Tabloid => "tabloid",
            PaperSize::A4 => "a4",
            PaperSize::A3 => "a3",
            PaperSize::ArchB => "archb",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registration mark style printed on every sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Registration {
    /// Marks in three corners (bottom-right left open)
    #[serde(rename = "3")]
    Three,
    /// Marks in all four corners
    #[default]
    #[serde(rename = "4")]
    Four,
}

impl Registration {
    pub fn mark_count(self) -> usize {
        match self {
            Registration::Three => 3,
            Registration::Four => 4,
        }
    }
}

/// Which face of the printed sheet a page represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSide {
    Front,
    Back,
}

/// One rendered page of the output sequence
#[derive(Debug, Clone)]
pub struct SheetPage {
    pub side: SheetSide,
    pub image: image::RgbImage,
    /// Human-readable sheet label, stamped on front pages only
    pub label: Option<String>,
}

/// Summary of a finished render job
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetReport {
    /// Number of card images placed on front pages
    pub cards: usize,
    /// Number of physical sheets (front/back pairs)
    pub sheets: usize,
    /// Number of output pages written
    pub pages: usize,
    /// Whether the built-in default back was used
    pub default_back: bool,
    /// Whether a saved offset was applied to back pages
    pub offset_applied: bool,
    /// Files written (the PDF, or one file per page)
    pub outputs: Vec<PathBuf>,
}
