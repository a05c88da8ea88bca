use scenekit_common::{MAX_PIXEL_RATIO, ViewportSize, clamp_pixel_ratio};
use scenekit_render::Renderer;

use crate::events::{EventHub, EventKind, Subscription};
use crate::stage::Stage;

/// Route to the host's fullscreen API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenPath {
    Standard,
    /// Vendor-prefixed fallback.
    Prefixed,
}

impl FullscreenPath {
    const ORDER: [Self; 2] = [Self::Standard, Self::Prefixed];
}

/// Window-system facts and fullscreen controls the viewport needs.
pub trait DisplayHost {
    /// Current inner size in logical pixels.
    fn inner_size(&self) -> (f64, f64);
    fn device_pixel_ratio(&self) -> f64;
    fn is_fullscreen(&self) -> bool;
    fn can_request_fullscreen(&self, path: FullscreenPath) -> bool;
    fn can_exit_fullscreen(&self, path: FullscreenPath) -> bool;
    fn request_fullscreen(&mut self, path: FullscreenPath);
    fn exit_fullscreen(&mut self, path: FullscreenPath);
}

/// Result of a fullscreen toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenToggle {
    Entered(FullscreenPath),
    Exited(FullscreenPath),
    /// Neither path is available; nothing happened.
    Unsupported,
}

/// Applied state after a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutcome {
    pub size: ViewportSize,
    pub aspect: f32,
    pub pixel_ratio: f64,
}

/// Keeps camera projection and renderer output in step with the host window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSync {
    max_pixel_ratio: f64,
}

impl Default for ViewportSync {
    fn default() -> Self {
        Self {
            max_pixel_ratio: MAX_PIXEL_RATIO,
        }
    }
}

impl ViewportSync {
    pub fn new(max_pixel_ratio: f64) -> Self {
        if max_pixel_ratio.is_finite() && max_pixel_ratio > 0.0 {
            Self { max_pixel_ratio }
        } else {
            Self::default()
        }
    }

    pub fn max_pixel_ratio(&self) -> f64 {
        self.max_pixel_ratio
    }

    /// Reread the host size into the stage, rebuild the camera projection and
    /// resize the renderer.
    pub fn on_resize<R: Renderer>(&self, stage: &mut Stage<R>, host: &dyn DisplayHost) -> ResizeOutcome {
        let (width, height) = host.inner_size();
        let size = ViewportSize::from_logical(width, height);
        stage.viewport = size;

        let aspect = size.aspect_ratio();
        stage.camera.set_aspect(aspect);
        stage.camera.update_projection();

        stage.renderer.set_size(size);
        let ratio = clamp_pixel_ratio(host.device_pixel_ratio(), self.max_pixel_ratio);
        let pixel_ratio = stage.renderer.set_pixel_ratio(ratio);

        tracing::debug!(%size, aspect, pixel_ratio, "viewport resized");
        ResizeOutcome {
            size,
            aspect,
            pixel_ratio,
        }
    }

    /// Enter fullscreen if the host is windowed, otherwise leave it. Tries
    /// the standard path first, then the prefixed one.
    pub fn toggle_fullscreen(&self, host: &mut dyn DisplayHost) -> FullscreenToggle {
        if host.is_fullscreen() {
            match FullscreenPath::ORDER
                .into_iter()
                .find(|p| host.can_exit_fullscreen(*p))
            {
                Some(path) => {
                    host.exit_fullscreen(path);
                    tracing::debug!(?path, "exited fullscreen");
                    FullscreenToggle::Exited(path)
                }
                None => FullscreenToggle::Unsupported,
            }
        } else {
            match FullscreenPath::ORDER
                .into_iter()
                .find(|p| host.can_request_fullscreen(*p))
            {
                Some(path) => {
                    host.request_fullscreen(path);
                    tracing::debug!(?path, "entered fullscreen");
                    FullscreenToggle::Entered(path)
                }
                None => FullscreenToggle::Unsupported,
            }
        }
    }

    /// Subscribe to resize and double-click events.
    pub fn attach<R: Renderer + 'static>(self, hub: &mut EventHub<R>) -> ViewportBinding {
        let resize = hub.subscribe(EventKind::Resized, move |_, stage, host| {
            self.on_resize(stage, host);
        });
        let fullscreen = hub.subscribe(EventKind::DoubleClick, move |_, _, host| {
            self.toggle_fullscreen(host);
        });
        ViewportBinding { resize, fullscreen }
    }
}

/// Subscriptions held by an attached [`ViewportSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportBinding {
    pub resize: Subscription,
    pub fullscreen: Subscription,
}

impl ViewportBinding {
    pub fn detach<R>(self, hub: &mut EventHub<R>) {
        hub.unsubscribe(self.resize);
        hub.unsubscribe(self.fullscreen);
    }
}

/// In-memory host for headless runs and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualHost {
    pub size: (f64, f64),
    pub device_pixel_ratio: f64,
    pub standard_fullscreen: bool,
    pub prefixed_fullscreen: bool,
    fullscreen: Option<FullscreenPath>,
}

impl VirtualHost {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            size: (width, height),
            device_pixel_ratio,
            standard_fullscreen: true,
            prefixed_fullscreen: true,
            fullscreen: None,
        }
    }

    pub fn fullscreen_path(&self) -> Option<FullscreenPath> {
        self.fullscreen
    }

    fn supports(&self, path: FullscreenPath) -> bool {
        match path {
            FullscreenPath::Standard => self.standard_fullscreen,
            FullscreenPath::Prefixed => self.prefixed_fullscreen,
        }
    }
}

impl DisplayHost for VirtualHost {
    fn inner_size(&self) -> (f64, f64) {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_some()
    }

    fn can_request_fullscreen(&self, path: FullscreenPath) -> bool {
        self.supports(path)
    }

    fn can_exit_fullscreen(&self, path: FullscreenPath) -> bool {
        self.supports(path)
    }

    fn request_fullscreen(&mut self, path: FullscreenPath) {
        self.fullscreen = Some(path);
    }

    fn exit_fullscreen(&mut self, _path: FullscreenPath) {
        self.fullscreen = None;
    }
}
