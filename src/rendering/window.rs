//! winit window driven by the frame loop through event pumping.

use std::sync::Arc;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use super::{GpuContext, RenderError, Renderer, Vertex};
use crate::params::RenderConfig;

/// Pumps allowed for the platform to resume the application at startup
const STARTUP_PUMPS: usize = 100;
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

/// What the window needs once the platform lets us create it
struct Setup {
    render_config: RenderConfig,
    shader_source: String,
    vertex_capacity: usize,
}

impl Setup {
    fn create(self, event_loop: &ActiveEventLoop) -> Result<(Arc<Window>, GpuContext), RenderError> {
        let attributes = Window::default_attributes()
            .with_title(self.render_config.title())
            .with_inner_size(LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(attributes)?);

        let gpu = pollster::block_on(GpuContext::new(
            Arc::clone(&window),
            &self.render_config,
            &self.shader_source,
            self.vertex_capacity,
        ))?;

        Ok((window, gpu))
    }
}

/// Event handler state shared with winit during a pump
struct WindowEvents {
    setup: Option<Setup>,
    created: Option<Result<(Arc<Window>, GpuContext), RenderError>>,
    close_requested: bool,
}

impl ApplicationHandler for WindowEvents {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(setup) = self.setup.take() else {
            return; // Already initialized
        };

        let created = setup.create(event_loop);
        if created.is_err() {
            event_loop.exit();
        }
        self.created = Some(created);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.close_requested = true,
            _ => {}
        }
    }
}

/// Window + GPU renderer.
///
/// Dropping it releases the surface, the window and the event loop, in that
/// order.
pub struct WindowRenderer {
    gpu: GpuContext,
    window: Arc<Window>,
    events: WindowEvents,
    event_loop: EventLoop<()>,
}

impl WindowRenderer {
    /// Open the window and build the GPU pipeline from `shader_source` (WGSL)
    pub fn new(
        render_config: &RenderConfig,
        shader_source: &str,
        vertex_capacity: usize,
    ) -> Result<Self, RenderError> {
        let mut event_loop = EventLoop::new()?;
        let mut events = WindowEvents {
            setup: Some(Setup {
                render_config: render_config.clone(),
                shader_source: shader_source.to_string(),
                vertex_capacity,
            }),
            created: None,
            close_requested: false,
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(STARTUP_PUMP_TIMEOUT), &mut events);

            if let Some(created) = events.created.take() {
                let (window, gpu) = created?;
                return Ok(Self {
                    gpu,
                    window,
                    events,
                    event_loop,
                });
            }

            if let PumpStatus::Exit(code) = status {
                return Err(RenderError::Window(format!(
                    "event loop exited during startup (code {})",
                    code
                )));
            }
        }

        Err(RenderError::Window(
            "platform never resumed the application".to_string(),
        ))
    }
}

impl Renderer for WindowRenderer {
    fn update_viewport(&mut self) -> (u32, u32) {
        let size = self.window.inner_size();
        self.gpu.resize(size.width, size.height);
        self.gpu.size()
    }

    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<(), RenderError> {
        self.gpu.stage_vertices(vertices)
    }

    fn draw_line_strip(&mut self, vertex_count: u32) {
        self.gpu.record_line_strip(vertex_count);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.window.pre_present_notify();
        self.gpu.render()
    }

    fn poll_events(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.events);
        if let PumpStatus::Exit(_) = status {
            self.events.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.events.close_requested
    }
}
