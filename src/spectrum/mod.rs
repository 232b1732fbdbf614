//! Per-frame signal path: window, forward transform, magnitude mapping.

mod mapper;
mod pipeline;
mod window;

pub use mapper::{magnitude, VertexMapper};
pub use pipeline::SpectralPipeline;
pub use window::{blackman_harris, BLACKMAN_HARRIS};
