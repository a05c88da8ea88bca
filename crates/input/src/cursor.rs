use scenekit_common::ViewportSize;

/// Pointer position normalized to the viewport: x and y in `[-0.5, 0.5]`,
/// with y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorPosition {
    pub x: f32,
    pub y: f32,
}

impl CursorPosition {
    pub fn from_client(client_x: f64, client_y: f64, viewport: ViewportSize) -> Self {
        Self {
            x: (client_x / viewport.width() as f64 - 0.5) as f32,
            y: -(client_y / viewport.height() as f64 - 0.5) as f32,
        }
    }
}

/// Turns a stream of primary-button presses into double-click events.
#[derive(Debug, Clone)]
pub struct DoubleClickDetector {
    pub max_interval: f64,
    pub max_distance: f64,
    last: Option<(f64, f64, f64)>,
}

impl Default for DoubleClickDetector {
    fn default() -> Self {
        Self {
            max_interval: 0.3,
            max_distance: 4.0,
            last: None,
        }
    }
}

impl DoubleClickDetector {
    /// Record a press at time `t` (seconds) and position `(x, y)`.
    /// Returns true when it completes a double click.
    pub fn press(&mut self, t: f64, x: f64, y: f64) -> bool {
        if let Some((lt, lx, ly)) = self.last {
            let close = (x - lx).hypot(y - ly) <= self.max_distance;
            if t >= lt && t - lt <= self.max_interval && close {
                self.last = None;
                return true;
            }
        }
        self.last = Some((t, x, y));
        false
    }
}
