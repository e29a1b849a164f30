//! Shared constants for sheet layout and rendering
//!
//! All pixel quantities in the layout catalog are expressed at the
//! baseline resolution and scaled by `ppi / BASELINE_PPI` at render time.

// =============================================================================
// Resolution and Units
// =============================================================================

/// Resolution the layout catalog is authored at (pixels per inch)
pub const BASELINE_PPI: u32 = 300;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// PDF points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Ratio between an output resolution and the baseline resolution
#[inline]
pub fn ppi_ratio(ppi: u32) -> f64 {
    ppi as f64 / BASELINE_PPI as f64
}

// =============================================================================
// Bleed
// =============================================================================

/// Bleed reported when a grid axis places no neighbor to collide with.
/// Painting is clipped to the page canvas, so this behaves as unbounded.
pub const UNBOUNDED_BLEED: u32 = 100_000;

// =============================================================================
// Labels
// =============================================================================

/// Distance of the label's top edge from the bottom of the page (baseline px)
pub const LABEL_OFFSET_FROM_BOTTOM: u32 = 140;

/// Label font size (baseline px)
pub const LABEL_FONT_SIZE: f32 = 40.0;

/// Approximate character width ratio for Helvetica
pub const HELVETICA_CHAR_WIDTH_RATIO: f64 = 0.5;

// =============================================================================
// Registration Marks
// =============================================================================

/// Distance of a registration mark's center from the page edges (baseline px)
pub const REGISTRATION_MARK_INSET: u32 = 75;

/// Radius of the registration circle (baseline px)
pub const REGISTRATION_MARK_RADIUS: u32 = 24;

/// Half length of the registration crosshair arms (baseline px)
pub const REGISTRATION_MARK_ARM: u32 = 36;

// =============================================================================
// Output
// =============================================================================

/// Default output resolution
pub const DEFAULT_PPI: u32 = 300;

/// Default JPEG quality for pages embedded in PDF output
pub const DEFAULT_QUALITY: u8 = 75;

/// Relative path of the persisted registration offset
pub const OFFSET_DATA_PATH: &str = "data/offset_data.json";
