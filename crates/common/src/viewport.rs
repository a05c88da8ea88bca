use serde::{Deserialize, Serialize};

/// Default ceiling for the applied device pixel ratio.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Output size in device-independent pixels.
///
/// Both dimensions are clamped to at least 1 so the aspect ratio is always
/// finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawViewportSize")]
pub struct ViewportSize {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct RawViewportSize {
    width: u32,
    height: u32,
}

impl From<RawViewportSize> for ViewportSize {
    fn from(raw: RawViewportSize) -> Self {
        Self::new(raw.width, raw.height)
    }
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Build from fractional logical pixels as reported by a windowing host.
    pub fn from_logical(width: f64, height: f64) -> Self {
        let to_px = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v.round().min(u32::MAX as f64) as u32
            } else {
                0
            }
        };
        Self::new(to_px(width), to_px(height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Physical drawing-buffer size at the given pixel ratio.
    pub fn scaled(&self, pixel_ratio: f64) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * pixel_ratio).floor() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl std::fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Clamp a host-reported device pixel ratio to `max`.
///
/// NaN or non-positive ratios fall back to 1.0.
pub fn clamp_pixel_ratio(device_pixel_ratio: f64, max: f64) -> f64 {
    if !(device_pixel_ratio > 0.0) {
        return 1.0_f64.min(max);
    }
    device_pixel_ratio.min(max)
}
