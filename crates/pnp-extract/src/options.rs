use crate::constants::*;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// A PDF file, or a folder searched recursively for PDFs
    pub input: PathBuf,
    /// Root of the `front/`, `back/` and `double_sided/` output folders
    pub output_root: PathBuf,

    /// Expected grid, e.g. `3x3`. Auto-detected when absent.
    pub grid: Option<String>,
    /// Back pages list their cards in reverse order
    pub short_edge_flip: bool,
    pub min_dimension: u32,
    /// Pages to ignore, e.g. `1,3-5,7`
    pub skip_pages: Option<String>,
    /// Treat every page as a front
    pub fronts_only: bool,
    /// Detect backs shared by many cards and save them once
    pub common_back: bool,

    pub header_fraction: f64,
    pub common_back_threshold: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            grid: None,
            short_edge_flip: false,
            min_dimension: MIN_CARD_DIMENSION,
            skip_pages: None,
            fronts_only: false,
            common_back: true,
            header_fraction: HEADER_BAND_FRACTION,
            common_back_threshold: COMMON_BACK_THRESHOLD,
        }
    }
}

impl ExtractOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Load options from JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| ExtractError::Config(format!("Failed to parse options: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            return Err(ExtractError::Config("No input PDF or folder specified".to_string()));
        }

        if !(0.0..1.0).contains(&self.header_fraction) {
            return Err(ExtractError::Config(format!(
                "Header fraction must be in [0, 1), got {}",
                self.header_fraction
            )));
        }

        if self.common_back_threshold == 0 {
            return Err(ExtractError::Config(
                "Common back threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Grid Override
// =============================================================================

/// Explicit grid shape given as `<cols>x<rows>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOverride {
    pub cols: usize,
    pub rows: usize,
}

impl GridOverride {
    pub fn capacity(&self) -> usize {
        self.cols * self.rows
    }
}

impl FromStr for GridOverride {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let mut parts = normalized.split('x').map(str::trim);

        let cols = parts.next().and_then(|p| p.parse::<usize>().ok());
        let rows = parts.next().and_then(|p| p.parse::<usize>().ok());

        match (cols, rows) {
            (Some(cols), Some(rows)) if cols > 0 && rows > 0 => Ok(Self { cols, rows }),
            _ => Err(format!("Invalid grid format '{}'", s)),
        }
    }
}

impl fmt::Display for GridOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

// =============================================================================
// Page Skipping
// =============================================================================

/// Parse a page list such as `1,3-5,7` into 1-based page numbers.
///
/// Returns the pages and the parts that could not be parsed.
pub fn parse_skip_pages(list: &str) -> (BTreeSet<u32>, Vec<String>) {
    let mut pages = BTreeSet::new();
    let mut invalid = Vec::new();

    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let parsed = match part.split_once('-') {
            Some((start, end)) => match (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
                (Ok(start), Ok(end)) => {
                    // No document has pages past the bound
                    pages.extend(start..=end.min(MAX_SKIP_PAGE));
                    true
                }
                _ => false,
            },
            None => match part.parse::<u32>() {
                Ok(page) => {
                    pages.insert(page);
                    true
                }
                Err(_) => false,
            },
        };

        if !parsed {
            invalid.push(part.to_string());
        }
    }

    (pages, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_pages_grammar() {
        let (pages, invalid) = parse_skip_pages("1, 3-5,7");
        assert_eq!(pages.into_iter().collect::<Vec<_>>(), vec![1, 3, 4, 5, 7]);
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_skip_pages_invalid_parts() {
        let (pages, invalid) = parse_skip_pages("2,abc,4-x,,9");
        assert_eq!(pages.into_iter().collect::<Vec<_>>(), vec![2, 9]);
        assert_eq!(invalid, vec!["abc".to_string(), "4-x".to_string()]);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let (pages, invalid) = parse_skip_pages("5-3");
        assert!(pages.is_empty());
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_oversized_range_is_clamped() {
        let (pages, invalid) = parse_skip_pages("1-4000000000");
        assert_eq!(pages.len(), MAX_SKIP_PAGE as usize);
        assert_eq!(pages.last(), Some(&MAX_SKIP_PAGE));
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_grid_override() {
        assert_eq!(
            "3x3".parse::<GridOverride>(),
            Ok(GridOverride { cols: 3, rows: 3 })
        );
        assert_eq!(
            "2X4".parse::<GridOverride>(),
            Ok(GridOverride { cols: 2, rows: 4 })
        );
        assert!("3".parse::<GridOverride>().is_err());
        assert!("axb".parse::<GridOverride>().is_err());
        assert!("0x3".parse::<GridOverride>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ExtractOptions::default().validate().is_err());
        ExtractOptions::new("deck.pdf").validate().unwrap();

        let bad = ExtractOptions {
            header_fraction: 1.5,
            ..ExtractOptions::new("deck.pdf")
        };
        assert!(bad.validate().is_err());
    }
}
