//! wgpu device, line-strip pipeline and per-frame vertex staging.

use log::{debug, error, info, warn};
use std::ops::Range;
use std::sync::Arc;
use winit::window::Window;

use super::{RenderError, Vertex};
use crate::params::RenderConfig;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// GPU resources for drawing spectrum line strips into a window surface.
///
/// Each frame, vertex uploads are appended to one buffer and every line strip
/// is recorded as a range into it, so all strips of a frame go out in one
/// render pass.
pub struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    msaa_samples: u32,
    msaa_view: Option<wgpu::TextureView>,
    clear_color: wgpu::Color,
    /// Vertices written so far this frame
    staged: usize,
    last_upload: Range<u32>,
    draws: Vec<Range<u32>>,
}

impl GpuContext {
    /// Create surface, device and pipeline for `window`.
    ///
    /// `vertex_capacity` is the most vertices a single frame will upload.
    /// Shader compile and pipeline link errors come back as
    /// [`RenderError::Shader`] with the validation message.
    pub async fn new(
        window: Arc<Window>,
        render_config: &RenderConfig,
        shader_source: &str,
        vertex_capacity: usize,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Surface borrows the window for 'static via the Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Spectrum Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            error!("GPU error: {}", err)
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::Surface("surface reports no formats".to_string()))?;

        let msaa_samples = if adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(render_config.msaa_samples)
        {
            render_config.msaa_samples
        } else {
            warn!(
                "{}x MSAA not supported for {:?}, drawing without multisampling",
                render_config.msaa_samples, surface_format
            );
            1
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: render_config.present_mode(),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Compile + link inside a validation scope so a bad shader is reported
        // instead of tripping the uncaptured error handler
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Spectrum Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        let pipeline = create_pipeline(&device, &shader, config.format, msaa_samples);
        if let Some(err) = device.pop_error_scope().await {
            return Err(RenderError::Shader(err.to_string()));
        }

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Spectrum Vertex Buffer"),
            size: (vertex_capacity.max(1) * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let msaa_view = create_msaa_view(&device, &config, msaa_samples);

        let adapter_info = adapter.get_info();
        info!(
            "GPU: {} ({:?}), {:?}, {}x{}, {}x MSAA",
            adapter_info.name,
            adapter_info.backend,
            surface_format,
            config.width,
            config.height,
            msaa_samples
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
            vertex_capacity,
            msaa_samples,
            msaa_view,
            clear_color: render_config.clear_color(),
            staged: 0,
            last_upload: 0..0,
            draws: Vec::with_capacity(2),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface for a new framebuffer size (ignored while zero
    /// sized, e.g. minimised)
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) == self.size() {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.msaa_view = create_msaa_view(&self.device, &self.config, self.msaa_samples);
        debug!("Surface resized to {}x{}", width, height);
    }

    /// Append vertices to this frame's vertex buffer
    pub fn stage_vertices(&mut self, vertices: &[Vertex]) -> Result<(), RenderError> {
        let end = self.staged + vertices.len();
        if end > self.vertex_capacity {
            return Err(RenderError::VertexCapacity {
                requested: end,
                capacity: self.vertex_capacity,
            });
        }

        if !vertices.is_empty() {
            let offset = (self.staged * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress;
            self.queue
                .write_buffer(&self.vertex_buffer, offset, bytemuck::cast_slice(vertices));
        }

        self.last_upload = self.staged as u32..end as u32;
        self.staged = end;
        Ok(())
    }

    /// Record a line strip over the first `vertex_count` vertices of the last
    /// upload
    pub fn record_line_strip(&mut self, vertex_count: u32) {
        let available = self.last_upload.end - self.last_upload.start;
        let count = vertex_count.min(available);
        if count > 0 {
            let start = self.last_upload.start;
            self.draws.push(start..start + count);
        }
    }

    /// Clear, draw every recorded strip, present
    pub fn render(&mut self) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.end_frame();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timed out, frame skipped");
                self.end_frame();
                return Ok(());
            }
            Err(err) => return Err(RenderError::Surface(err.to_string())),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Spectrum Encoder"),
            });

        {
            let (target, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Spectrum Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            for range in &self.draws {
                render_pass.draw(range.clone(), 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.end_frame();

        Ok(())
    }

    fn end_frame(&mut self) {
        self.draws.clear();
        self.staged = 0;
        self.last_upload = 0..0;
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    msaa_samples: u32,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Spectrum Pipeline Layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Spectrum Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: msaa_samples,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

/// Multisampled colour target matching the surface, resolved into it each frame
fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    samples: u32,
) -> Option<wgpu::TextureView> {
    if samples <= 1 {
        return None;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: samples,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}
