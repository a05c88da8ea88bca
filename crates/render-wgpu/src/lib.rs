//! wgpu render backend.
//!
//! Draws every visible mesh as a shaded box fitted to its geometry bounds,
//! wireframe materials and axes helpers as lines, over the scene background.
//!
//! # Invariants
//! - Renderer never mutates the scene or the camera.
//! - Surface size always equals the target's drawing-buffer size.

mod scene_pass;
mod shaders;
mod surface;

pub use scene_pass::ScenePass;
pub use surface::{GpuError, SurfaceFrame, SurfaceRenderer};
