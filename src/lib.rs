//! spectrum-scope library - real-time audio spectrum drawn as line strips

pub mod audio;
pub mod cli;
pub mod error;
pub mod frame;
pub mod params;
pub mod rendering;
pub mod spectrum;

pub use error::Error;
