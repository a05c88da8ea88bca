//! Pointer-driven camera rigs.
//!
//! # Invariants
//! - Damping factors live in `[0, 1)`; pending orbit velocity only decays.
//! - Rigs touch the camera pose only, never the projection.

pub mod cursor;
pub mod orbit;
pub mod rig;

pub use cursor::{CursorPosition, DoubleClickDetector};
pub use orbit::{DEFAULT_DAMPING, OrbitControls};
pub use rig::CameraRig;

/// Errors from input configuration.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("damping factor must be in [0, 1), got {0}")]
    InvalidDamping(f32),
}
