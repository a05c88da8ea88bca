use scenekit_common::{MAX_PIXEL_RATIO, ViewportSize, clamp_pixel_ratio};

/// A drawable surface's logical size plus its pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    size: ViewportSize,
    pixel_ratio: f64,
    max_pixel_ratio: f64,
}

impl RenderTarget {
    pub fn new(size: ViewportSize, max_pixel_ratio: f64) -> Self {
        let max_pixel_ratio = if max_pixel_ratio.is_finite() && max_pixel_ratio > 0.0 {
            max_pixel_ratio
        } else {
            MAX_PIXEL_RATIO
        };
        Self {
            size,
            pixel_ratio: 1.0_f64.min(max_pixel_ratio),
            max_pixel_ratio,
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn set_size(&mut self, size: ViewportSize) {
        self.size = size;
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn max_pixel_ratio(&self) -> f64 {
        self.max_pixel_ratio
    }

    /// Store `min(ratio, max)` and return the applied value.
    pub fn set_pixel_ratio(&mut self, ratio: f64) -> f64 {
        self.pixel_ratio = clamp_pixel_ratio(ratio, self.max_pixel_ratio);
        self.pixel_ratio
    }

    /// Physical size of the backing buffer.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size.scaled(self.pixel_ratio)
    }
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self::new(ViewportSize::default(), MAX_PIXEL_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped_to_max() {
        let mut target = RenderTarget::default();
        assert_eq!(target.set_pixel_ratio(3.0), 2.0);
        assert_eq!(target.pixel_ratio(), 2.0);
        assert_eq!(target.set_pixel_ratio(1.25), 1.25);
    }

    #[test]
    fn drawing_buffer_tracks_size_and_ratio() {
        let mut target = RenderTarget::new(ViewportSize::new(800, 600), 2.0);
        target.set_pixel_ratio(2.0);
        target.set_size(ViewportSize::new(1920, 1080));
        assert_eq!(target.drawing_buffer_size(), (3840, 2160));
    }

    #[test]
    fn bad_max_falls_back_to_default() {
        let target = RenderTarget::new(ViewportSize::default(), -1.0);
        assert_eq!(target.max_pixel_ratio(), MAX_PIXEL_RATIO);
    }
}
