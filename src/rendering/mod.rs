//! Renderer capability and its winit + wgpu implementation.

mod gpu;
mod window;

use bytemuck::{Pod, Zeroable};
use std::fmt;

pub use gpu::GpuContext;
pub use window::WindowRenderer;

/// Built-in WGSL program: passes NDC positions through, draws a flat colour
pub const DEFAULT_SHADER: &str = include_str!("spectrum.wgsl");

/// One polyline point in normalized device coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
}

impl Vertex {
    pub fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }
}

/// Drawing surface the frame loop submits line strips to
pub trait Renderer {
    /// Pick up size changes and return the current surface size (pixels)
    fn update_viewport(&mut self) -> (u32, u32);

    /// Stage vertices for the next [`Renderer::draw_line_strip`]
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<(), RenderError>;

    /// Draw the last uploaded `vertex_count` vertices as a connected polyline
    fn draw_line_strip(&mut self, vertex_count: u32);

    /// Flush the frame's draws and show them
    fn present(&mut self) -> Result<(), RenderError>;

    /// Handle pending window events without blocking
    fn poll_events(&mut self);

    fn should_close(&self) -> bool;
}

/// Renderer failures
#[derive(Debug)]
pub enum RenderError {
    /// Event loop or window creation failed
    Window(String),
    /// No GPU adapter compatible with the window surface
    NoAdapter,
    /// Device request failed
    Device(String),
    /// Surface could not be created or acquired
    Surface(String),
    /// Shader failed to compile or the pipeline failed to link
    Shader(String),
    /// More vertices uploaded in one frame than the buffer was sized for
    VertexCapacity { requested: usize, capacity: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Window(msg) => write!(f, "Window error: {}", msg),
            RenderError::NoAdapter => write!(f, "Failed to find suitable GPU adapter"),
            RenderError::Device(msg) => write!(f, "Failed to request device: {}", msg),
            RenderError::Surface(msg) => write!(f, "Surface error: {}", msg),
            RenderError::Shader(msg) => write!(f, "Shader program failed to build:\n{}", msg),
            RenderError::VertexCapacity {
                requested,
                capacity,
            } => write!(
                f,
                "Frame needs {} vertices but the vertex buffer holds {}",
                requested, capacity
            ),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<winit::error::EventLoopError> for RenderError {
    fn from(err: winit::error::EventLoopError) -> Self {
        RenderError::Window(err.to_string())
    }
}

impl From<winit::error::OsError> for RenderError {
    fn from(err: winit::error::OsError) -> Self {
        RenderError::Window(err.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        RenderError::Surface(err.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for RenderError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        RenderError::Device(err.to_string())
    }
}
