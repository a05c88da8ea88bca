//! Rendering interface: renderer-agnostic trait, camera, render target.
//!
//! # Invariants
//! - Renderers never mutate the scene or the camera.
//! - A camera whose cached projection lags its aspect ratio must not be drawn.

mod camera;
mod renderer;
mod target;

pub use camera::{Camera, Projection};
pub use renderer::{DebugTextRenderer, RenderError, Renderer};
pub use target::RenderTarget;
