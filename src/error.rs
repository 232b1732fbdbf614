//! Crate-level error type

use std::fmt;

use crate::audio::CaptureError;
use crate::rendering::RenderError;

/// Fatal errors raised while the frame loop is running
#[derive(Debug)]
pub enum Error {
    /// Audio source failed to deliver samples
    Capture(CaptureError),
    /// Renderer failed to upload or present
    Render(RenderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Capture(err) => write!(f, "{}", err),
            Error::Render(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Capture(err) => std::error::Error::source(err),
            Error::Render(err) => std::error::Error::source(err),
        }
    }
}

impl From<CaptureError> for Error {
    fn from(err: CaptureError) -> Self {
        Error::Capture(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Error::Render(err)
    }
}
