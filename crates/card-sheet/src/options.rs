use crate::constants::*;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where rendered pages are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum OutputTarget {
    /// One multi-page PDF document
    Pdf(PathBuf),
    /// One `page<N>.png` per page inside a directory
    Images(PathBuf),
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::Pdf(PathBuf::from("game/output/game.pdf"))
    }
}

/// Everything needed to render a deck into print sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    // Inputs
    pub front_dir: PathBuf,
    pub back_dir: PathBuf,
    pub double_sided_dir: PathBuf,

    // Output
    pub output: OutputTarget,
    pub ppi: u32,
    /// JPEG quality of pages embedded in a PDF (1-100)
    pub quality: u8,

    // Geometry
    pub card_size: CardSize,
    pub paper_size: PaperSize,
    pub registration: Registration,

    /// Render card faces only, no back pages
    pub fronts_only: bool,
    /// Crop amount, e.g. `6.5`, `3mm` or `0.125in`
    pub crop: String,
    /// Border trimmed from every card edge before bleeding (baseline px)
    pub extend_corners: u32,
    /// Requested synthetic bleed (baseline px). Capped by the layout maximum;
    /// `None` uses the maximum.
    pub bleed: Option<(u32, u32)>,
    /// Grid cells to leave blank on every page
    pub skip_indices: Vec<usize>,

    // Offset correction
    pub load_offset: bool,
    pub offset_path: PathBuf,

    /// Optional deck name printed in the sheet label
    pub name: Option<String>,

    /// Directory holding registration images; procedural marks otherwise
    pub assets_dir: Option<PathBuf>,
    /// TrueType font used to stamp labels into raster output, replacing the
    /// built-in one
    pub label_font: Option<PathBuf>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            front_dir: PathBuf::from("game/front"),
            back_dir: PathBuf::from("game/back"),
            double_sided_dir: PathBuf::from("game/double_sided"),
            output: OutputTarget::default(),
            ppi: DEFAULT_PPI,
            quality: DEFAULT_QUALITY,
            card_size: CardSize::Standard,
            paper_size: PaperSize::Letter,
            registration: Registration::default(),
            fronts_only: false,
            crop: String::new(),
            extend_corners: 0,
            bleed: None,
            skip_indices: Vec::new(),
            load_offset: false,
            offset_path: PathBuf::from(OFFSET_DATA_PATH),
            name: None,
            assets_dir: None,
            label_font: None,
        }
    }
}

impl SheetOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| SheetError::Config(format!("Failed to parse options: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Checks that do not need the layout catalog or the file system
    pub fn validate(&self) -> Result<()> {
        if self.ppi == 0 {
            return Err(SheetError::Config("Output ppi must be positive".to_string()));
        }

        if !(1..=100).contains(&self.quality) {
            return Err(SheetError::Config(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        if let OutputTarget::Pdf(path) = &self.output {
            let is_pdf = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                return Err(SheetError::Config(format!(
                    "Output path \"{}\" must end in .pdf",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}
