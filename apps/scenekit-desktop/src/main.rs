use anyhow::{Context as _, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use scenekit_common::{Color, ViewportSize};
use scenekit_frame::{
    Clock, DisplayHost, EventHub, FrameHandle, FrameLoopController, FrameScheduler, FrameTimer,
    FullscreenPath, HostEvent, MonotonicClock, PointerBinding, ScenePreset, Stage, StageConfig,
    ViewportSync,
};
use scenekit_input::DoubleClickDetector;
use scenekit_render_wgpu::{SurfaceFrame, SurfaceRenderer};
use scenekit_render::Renderer;
use scenekit_scene::Scene;
use scenekit_tools::{ControlKind, DebugPanel, PanelValue};

#[derive(Parser)]
#[command(name = "scenekit-desktop", about = "Run a scene preset in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene preset; overrides the config file
    #[arg(long)]
    scene: Option<ScenePreset>,

    /// Stage config (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Window facts and fullscreen control backed by winit.
///
/// Borderless fullscreen is the standard path; exclusive video-mode
/// fullscreen is the fallback.
struct WindowHost {
    window: Arc<Window>,
}

impl WindowHost {
    fn exclusive_mode(&self) -> Option<Fullscreen> {
        let monitor = self.window.current_monitor()?;
        let mode = monitor.video_modes().next()?;
        Some(Fullscreen::Exclusive(mode))
    }
}

impl DisplayHost for WindowHost {
    fn inner_size(&self) -> (f64, f64) {
        let size = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        (size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    fn can_request_fullscreen(&self, path: FullscreenPath) -> bool {
        match path {
            FullscreenPath::Standard => true,
            FullscreenPath::Prefixed => self.exclusive_mode().is_some(),
        }
    }

    fn can_exit_fullscreen(&self, _path: FullscreenPath) -> bool {
        true
    }

    fn request_fullscreen(&mut self, path: FullscreenPath) {
        let mode = match path {
            FullscreenPath::Standard => Some(Fullscreen::Borderless(None)),
            FullscreenPath::Prefixed => self.exclusive_mode(),
        };
        self.window.set_fullscreen(mode);
    }

    fn exit_fullscreen(&mut self, _path: FullscreenPath) {
        self.window.set_fullscreen(None);
    }
}

/// Maps frame requests onto winit redraw requests.
struct RedrawScheduler {
    window: Arc<Window>,
    next: u64,
    pending: Option<FrameHandle>,
}

impl RedrawScheduler {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next: 0,
            pending: None,
        }
    }

    fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// Everything that exists once the window does.
struct Running {
    window: Arc<Window>,
    host: WindowHost,
    scheduler: RedrawScheduler,
    controller: FrameLoopController<MonotonicClock, SurfaceRenderer>,
    hub: EventHub<SurfaceRenderer>,
    clicks: DoubleClickDetector,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    egui_ctx: EguiContext,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &StageConfig) -> Result<Self> {
        let setup = config.build_setup()?;

        let attrs = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                config.window.width as f64,
                config.window.height as f64,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let host = WindowHost {
            window: window.clone(),
        };

        let (width, height) = host.inner_size();
        let renderer = SurfaceRenderer::new(
            window.clone(),
            ViewportSize::from_logical(width, height),
            host.device_pixel_ratio(),
            config.max_pixel_ratio,
        )?;

        let egui_ctx = EguiContext::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(renderer.device(), renderer.format(), None, 1, false);

        let mut stage = Stage::new(setup, renderer);
        let sync = ViewportSync::new(config.max_pixel_ratio);
        sync.on_resize(&mut stage, &host);

        let mut hub = EventHub::new();
        sync.attach(&mut hub);
        PointerBinding::attach(&mut hub);

        let mut controller = FrameLoopController::new(MonotonicClock::new(), stage)
            .with_timer(FrameTimer::new(config.frame_history));
        let mut scheduler = RedrawScheduler::new(window.clone());
        controller.start(&mut scheduler);

        tracing::info!(
            preset = %config.preset,
            rig = controller.stage().rig.name(),
            "stage running"
        );

        Ok(Self {
            window,
            host,
            scheduler,
            controller,
            hub,
            clicks: DoubleClickDetector::default(),
            dragging: false,
            last_cursor: None,
            egui_ctx,
            egui_winit,
            egui_renderer,
        })
    }

    fn dispatch(&mut self, event: HostEvent) {
        self.hub
            .dispatch(&event, self.controller.stage_mut(), &mut self.host);
    }

    fn window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.dispatch(HostEvent::Resized);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
                if self.dragging {
                    let (x, y) = self.last_cursor.unwrap_or_default();
                    let now = self.controller.clock().elapsed();
                    if self.clicks.press(now, x, y) {
                        self.dispatch(HostEvent::DoubleClick);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(self.window.scale_factor());
                let (x, y) = (logical.x, logical.y);
                self.dispatch(HostEvent::CursorMoved { x, y });
                if let (true, Some((lx, ly))) = (self.dragging, self.last_cursor) {
                    self.dispatch(HostEvent::PointerDrag {
                        dx: x - lx,
                        dy: y - ly,
                    });
                }
                self.last_cursor = Some((x, y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y as f64,
                    MouseScrollDelta::PixelDelta(p) => p.y / 100.0,
                };
                // Scrolling up moves toward the scene.
                self.dispatch(HostEvent::Wheel { delta: -steps });
            }
            _ => {}
        }
    }

    /// Run one frame. Returns false once the loop has failed.
    fn redraw(&mut self) -> bool {
        let Some(handle) = self.scheduler.take_pending() else {
            return true;
        };
        match self.controller.on_frame(handle, &mut self.scheduler) {
            Ok(Some(report)) => {
                if let Some(frame) = report.output {
                    self.draw_overlay(&frame);
                    frame.present();
                }
                true
            }
            Ok(None) => true,
            Err(e) => {
                tracing::error!(error = %e, "frame loop aborted");
                false
            }
        }
    }

    fn draw_overlay(&mut self, frame: &SurfaceFrame) {
        let now = self.controller.elapsed();
        let stats = self.controller.stats();
        // Draw egui at the renderer's capped ratio, not the display's.
        let ratio = self.controller.stage().renderer.target().pixel_ratio();
        self.egui_ctx
            .set_zoom_factor(overlay_zoom(ratio, self.window.scale_factor()));
        let raw_input = self.egui_winit.take_egui_input(&self.window);

        let stage = self.controller.stage_mut();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::Window::new("scenekit")
                .default_width(260.0)
                .show(ctx, |ui| {
                    ui.label(format!(
                        "{:.0} fps  ({:.2} ms avg)",
                        stats.fps, stats.average_ms
                    ));
                    ui.label(format!("Rig: {}", stage.rig.name()));
                    if !stage.panel.is_empty() {
                        ui.separator();
                        egui::CollapsingHeader::new(stage.panel.title().to_owned())
                            .default_open(!stage.panel.is_collapsed())
                            .show(ui, |ui| panel_ui(ui, &stage.panel, &mut stage.scene, now));
                    }
                    ui.separator();
                    ui.small("Double-click: fullscreen | Drag: orbit | Wheel: zoom");
                });
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let renderer = &self.controller.stage().renderer;
        let (device, queue) = (renderer.device(), renderer.queue());
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: {
                let (width, height) = renderer.buffer_size();
                [width, height]
            },
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        self.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// One widget per panel control. Changes go back through the panel so they
/// are validated and quantized.
/// Zoom that makes egui's points-to-pixels factor equal `pixel_ratio`.
fn overlay_zoom(pixel_ratio: f64, scale_factor: f64) -> f32 {
    if scale_factor > 0.0 && pixel_ratio > 0.0 {
        (pixel_ratio / scale_factor) as f32
    } else {
        1.0
    }
}

fn panel_ui(ui: &mut egui::Ui, panel: &DebugPanel, scene: &mut Scene, now: f64) {
    for (index, control) in panel.controls().iter().enumerate() {
        let label = control.label.as_str();
        let current = match panel.read(index, scene) {
            Ok(value) => value,
            Err(e) => {
                ui.label(format!("{label}: {e}"));
                continue;
            }
        };

        let changed = match (control.kind, current) {
            (ControlKind::Slider { min, max, step }, PanelValue::Number(mut v)) => ui
                .add(
                    egui::Slider::new(&mut v, min..=max)
                        .step_by(step as f64)
                        .text(label),
                )
                .changed()
                .then_some(PanelValue::Number(v)),
            (ControlKind::Toggle, PanelValue::Bool(mut on)) => ui
                .checkbox(&mut on, label)
                .changed()
                .then_some(PanelValue::Bool(on)),
            (ControlKind::ColorPicker, PanelValue::Color(color)) => {
                let mut rgb = [color.r, color.g, color.b];
                ui.horizontal(|ui| {
                    let response = ui.color_edit_button_rgb(&mut rgb);
                    ui.label(label);
                    response.changed()
                })
                .inner
                .then_some(PanelValue::Color(Color {
                    r: rgb[0],
                    g: rgb[1],
                    b: rgb[2],
                }))
            }
            (ControlKind::Button, _) => ui.button(label).clicked().then_some(PanelValue::Trigger),
            _ => None,
        };

        if let Some(value) = changed {
            if let Err(e) = panel.apply(index, value, scene, now) {
                tracing::warn!(control = label, error = %e, "panel change rejected");
            }
        }
    }
}

struct App {
    config: StageConfig,
    running: Option<Running>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match Running::new(event_loop, &self.config) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!("failed to start: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_winit.on_window_event(&running.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                running.controller.stop(&mut running.scheduler);
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if !running.redraw() {
                    event_loop.exit();
                }
            }
            // Size changes always reach the stage, even when egui saw them.
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                running.window_event(event);
            }
            _ if response.consumed => {}
            other => running.window_event(other),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = match &cli.config {
        Some(path) => StageConfig::load(path)?,
        None => StageConfig::default(),
    };
    if let Some(preset) = cli.scene {
        config.preset = preset;
    }

    tracing::info!(preset = %config.preset, "scenekit-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        config,
        running: None,
    };
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_zoom_follows_capped_ratio() {
        // A 3x display capped at 2 shrinks egui by a third.
        let zoom = overlay_zoom(2.0, 3.0);
        assert!((zoom * 3.0 - 2.0).abs() < 1e-6);
        assert_eq!(overlay_zoom(2.0, 2.0), 1.0);
        assert_eq!(overlay_zoom(1.0, 0.0), 1.0);
    }
}
