use scenekit_common::ViewportSize;
use scenekit_render::{Camera, RenderError, RenderTarget, Renderer};
use scenekit_scene::Scene;

use crate::scene_pass::ScenePass;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A drawn frame waiting to be presented. Overlays may draw into `view`
/// before [`SurfaceFrame::present`].
pub struct SurfaceFrame {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl SurfaceFrame {
    pub fn present(self) {
        self.texture.present();
    }
}

/// Renders into a window surface.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    target: RenderTarget,
    pass: ScenePass,
}

impl SurfaceRenderer {
    /// Create the GPU device and configure `window` at `size` logical pixels.
    pub fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: ViewportSize,
        device_pixel_ratio: f64,
        max_pixel_ratio: f64,
    ) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("scenekit_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let mut target = RenderTarget::new(size, max_pixel_ratio);
        target.set_pixel_ratio(device_pixel_ratio);
        let (width, height) = target.drawing_buffer_size();

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pass = ScenePass::new(&device, format, config.width, config.height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            width = config.width,
            height = config.height,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            target,
            pass,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Configured surface size in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn reconfigure(&mut self) {
        let (width, height) = self.target.drawing_buffer_size();
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.pass.resize(&self.device, width, height);
        tracing::debug!(width, height, "surface reconfigured");
    }
}

impl Renderer for SurfaceRenderer {
    /// `None` when the surface had to be skipped this frame.
    type Output = Option<SurfaceFrame>;
    type Error = GpuError;

    fn target(&self) -> &RenderTarget {
        &self.target
    }

    fn set_size(&mut self, size: ViewportSize) {
        self.target.set_size(size);
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) -> f64 {
        let applied = self.target.set_pixel_ratio(ratio);
        self.reconfigure();
        applied
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<Self::Output, GpuError> {
        if !camera.is_projection_current() {
            return Err(RenderError::StaleProjection {
                aspect: camera.aspect(),
                projection_aspect: camera.projection_aspect(),
            }
            .into());
        }

        let texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                tracing::warn!("surface lost; reconfigured, skipping frame");
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout; skipping frame");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.pass
            .draw(&self.device, &self.queue, &view, scene, camera);

        Ok(Some(SurfaceFrame { texture, view }))
    }
}
