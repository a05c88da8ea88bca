//! Shared types for the scenekit workspace.

mod types;
mod viewport;

pub use types::{Color, NodeId, Transform};
pub use viewport::{MAX_PIXEL_RATIO, ViewportSize, clamp_pixel_ratio};
