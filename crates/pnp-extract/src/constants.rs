//! Detection thresholds and output naming for PnP extraction
//!
//! Distances are PDF points measured from the top-left page corner.

// =============================================================================
// Card Detection
// =============================================================================

/// Minimum image width and height (pixels) for an image to count as a card
pub const MIN_CARD_DIMENSION: u32 = 200;

/// Fraction of the page height, measured from the top, treated as a header
pub const HEADER_BAND_FRACTION: f64 = 0.10;

/// Vertical tolerance when grouping placements into rows for ordering
pub const ROW_TOLERANCE: f64 = 20.0;

/// Vertical tolerance when counting rows for grid detection
pub const GRID_ROW_TOLERANCE: f64 = 30.0;

/// Page size assumed when a page has no usable MediaBox (US Letter)
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Maximum nesting of Form XObjects followed while looking for images
pub const MAX_FORM_DEPTH: usize = 16;

/// Highest page number a skip range expands to
pub const MAX_SKIP_PAGE: u32 = 100_000;

// =============================================================================
// Back Classification
// =============================================================================

/// Occurrences across back pages at which an image is a common back
pub const COMMON_BACK_THRESHOLD: usize = 10;

// =============================================================================
// Output
// =============================================================================

/// Default output root holding the three card directories
pub const DEFAULT_OUTPUT_ROOT: &str = "game";

pub const FRONT_DIR: &str = "front";
pub const BACK_DIR: &str = "back";
pub const DOUBLE_SIDED_DIR: &str = "double_sided";
