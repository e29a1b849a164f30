//! Layout catalog
//!
//! A declarative description of every supported card size, every paper size,
//! and the grid geometry used to place a given card size on a given paper.
//! The catalog is parsed and validated once; lookups never touch the file
//! system again.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_LAYOUTS: &str = include_str!("../assets/layouts.json");

/// Pixel dimensions of one card at the baseline resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLayoutSize {
    pub width: u32,
    pub height: u32,
}

/// Grid geometry of one card size on one paper size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLayout {
    /// Left edge of every column (baseline px)
    pub x_pos: Vec<u32>,
    /// Top edge of every row (baseline px)
    pub y_pos: Vec<u32>,
    /// Template identifier printed in the sheet label
    pub template: String,
}

impl CardLayout {
    pub fn num_cols(&self) -> usize {
        self.x_pos.len()
    }

    pub fn num_rows(&self) -> usize {
        self.y_pos.len()
    }

    /// Number of cells on one page
    pub fn capacity(&self) -> usize {
        self.num_cols() * self.num_rows()
    }
}

/// Page dimensions and all card layouts available on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperLayout {
    pub width: u32,
    pub height: u32,
    pub card_layouts: BTreeMap<CardSize, CardLayout>,
}

/// Result of a successful catalog lookup
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLayout<'a> {
    pub card_size: CardSize,
    pub paper_size: PaperSize,
    pub card: CardLayoutSize,
    pub paper: &'a PaperLayout,
    pub layout: &'a CardLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutCatalog {
    card_sizes: BTreeMap<CardSize, CardLayoutSize>,
    paper_layouts: BTreeMap<PaperSize, PaperLayout>,
}

impl LayoutCatalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(DEFAULT_LAYOUTS)
    }

    /// Load and validate a catalog file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            SheetError::Config(format!(
                "Cannot read layout catalog \"{}\": {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a catalog from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: LayoutCatalog = serde_json::from_str(json)
            .map_err(|e| SheetError::Config(format!("Cannot parse layout catalog: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Structural validation: every geometry references a declared card size
    /// and has at least one row and one column.
    pub fn validate(&self) -> Result<()> {
        for (paper_size, paper) in &self.paper_layouts {
            if paper.width == 0 || paper.height == 0 {
                return Err(SheetError::Config(format!(
                    "Paper size \"{}\" has zero dimensions",
                    paper_size
                )));
            }
            for (card_size, layout) in &paper.card_layouts {
                if !self.card_sizes.contains_key(card_size) {
                    return Err(SheetError::Config(format!(
                        "Paper size \"{}\" has a layout for undeclared card size \"{}\"",
                        paper_size, card_size
                    )));
                }
                if layout.x_pos.is_empty() || layout.y_pos.is_empty() {
                    return Err(SheetError::Config(format!(
                        "Layout for \"{}\" on \"{}\" has no rows or no columns",
                        card_size, paper_size
                    )));
                }
            }
        }
        for (card_size, size) in &self.card_sizes {
            if size.width == 0 || size.height == 0 {
                return Err(SheetError::Config(format!(
                    "Card size \"{}\" has zero dimensions",
                    card_size
                )));
            }
        }
        Ok(())
    }

    pub fn card_size(&self, card_size: CardSize) -> Option<CardLayoutSize> {
        self.card_sizes.get(&card_size).copied()
    }

    pub fn paper_layout(&self, paper_size: PaperSize) -> Option<&PaperLayout> {
        self.paper_layouts.get(&paper_size)
    }

    /// All (paper, card) combinations with a geometry
    pub fn supported_pairs(&self) -> Vec<(PaperSize, CardSize)> {
        self.paper_layouts
            .iter()
            .flat_map(|(paper, layout)| layout.card_layouts.keys().map(move |card| (*paper, *card)))
            .collect()
    }

    /// Look up the card dimensions and grid geometry for a (card, paper) pair
    pub fn resolve(&self, card_size: CardSize, paper_size: PaperSize) -> Result<ResolvedLayout<'_>> {
        let paper = self.paper_layouts.get(&paper_size).ok_or_else(|| {
            SheetError::Config(format!(
                "Unsupported paper size \"{}\". Try paper sizes: {}.",
                paper_size,
                join_names(self.paper_layouts.keys())
            ))
        })?;

        let card = self.card_sizes.get(&card_size).copied().ok_or_else(|| {
            SheetError::Config(format!(
                "Unsupported card size \"{}\". Try card sizes: {}.",
                card_size,
                join_names(paper.card_layouts.keys())
            ))
        })?;

        let layout = paper.card_layouts.get(&card_size).ok_or_else(|| {
            SheetError::Config(format!(
                "Unsupported card size \"{}\" with paper size \"{}\". Try card sizes: {}.",
                card_size,
                paper_size,
                join_names(paper.card_layouts.keys())
            ))
        })?;

        Ok(ResolvedLayout {
            card_size,
            paper_size,
            card,
            paper,
            layout,
        })
    }
}

fn join_names<T: std::fmt::Display>(names: impl Iterator<Item = T>) -> String {
    names.map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = LayoutCatalog::builtin().unwrap();
        assert!(!catalog.supported_pairs().is_empty());
        assert!(catalog.card_size(CardSize::Standard).is_some());
    }

    #[test]
    fn test_unknown_card_key_is_rejected() {
        let json = r#"{
            "card_sizes": { "gigantic": { "width": 10, "height": 10 } },
            "paper_layouts": {}
        }"#;
        match LayoutCatalog::from_json_str(json) {
            Err(SheetError::Config(msg)) => assert!(msg.contains("Cannot parse")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_card_size_in_paper_layout() {
        let json = r#"{
            "card_sizes": { "standard": { "width": 750, "height": 1050 } },
            "paper_layouts": {
                "letter": {
                    "width": 2550, "height": 3300,
                    "card_layouts": {
                        "tarot": { "x_pos": [0], "y_pos": [0], "template": "t" }
                    }
                }
            }
        }"#;
        let err = LayoutCatalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("undeclared card size \"tarot\""));
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let json = r#"{
            "card_sizes": { "standard": { "width": 750, "height": 1050 } },
            "paper_layouts": {
                "letter": {
                    "width": 2550, "height": 3300,
                    "card_layouts": {
                        "standard": { "x_pos": [], "y_pos": [100], "template": "t" }
                    }
                }
            }
        }"#;
        assert!(LayoutCatalog::from_json_str(json).is_err());
    }
}
