//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (samples, Hz, pixels, NDC)
//! - Documented ranges and meanings
//! - Type safety where possible

mod analysis;
mod display;
mod render;

// Re-export all types
pub use analysis::{Configuration, Mode, PCM_FULL_SCALE, VALUE_LIMIT};
pub use display::DisplayTuning;
pub use render::RenderConfig;
