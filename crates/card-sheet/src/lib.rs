pub mod artwork;
pub mod catalog;
pub mod compositor;
pub mod constants;
pub mod crop;
pub mod images;
mod offset;
mod options;
pub mod sheet;
mod types;

pub use catalog::{CardLayout, CardLayoutSize, LayoutCatalog, PaperLayout, ResolvedLayout};
pub use crop::{inches_to_crop, max_bleed, parse_crop};
pub use images::{BackSelector, FirstCandidate, ImageIndex, check_paths_subset};
pub use offset::*;
pub use options::*;
pub use sheet::{BackArt, CardEntry, SheetPlan, build_sheets, build_sheets_blocking};
pub use types::*;
