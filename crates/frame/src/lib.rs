//! Frame-loop and viewport-sync controller.
//!
//! A [`FrameLoopController`] owns a [`Stage`] and drives it one display
//! callback at a time: read the clock, animate, advance the camera rig,
//! render, re-arm. [`ViewportSync`] keeps camera projection and renderer size
//! in step with the host window between frames.
//!
//! # Invariants
//! - Elapsed time never decreases and per-frame delta is never negative.
//! - The camera projection matches the viewport aspect before every render.
//! - Applied pixel ratio never exceeds the configured maximum.
//! - At most one frame callback is pending; stale callbacks are ignored.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod frame_loop;
pub mod presets;
pub mod scheduler;
pub mod stage;
pub mod timing;
pub mod viewport;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{CameraConfig, RigConfig, StageConfig, WindowConfig};
pub use error::{ConfigError, FrameError};
pub use events::{EventHub, EventKind, HostEvent, PointerBinding, Subscription};
pub use frame_loop::{FrameLoopController, FrameReport};
pub use presets::{SceneSetup, ScenePreset};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use stage::Stage;
pub use timing::{FrameStats, FrameTimer};
pub use viewport::{
    DisplayHost, FullscreenPath, FullscreenToggle, ResizeOutcome, ViewportBinding, ViewportSync,
    VirtualHost,
};
