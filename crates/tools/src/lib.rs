//! Developer tooling: a debug panel of live controls bound to scene properties.
//!
//! # Invariants
//! - Slider writes are clamped to the control's range and snapped to its step.
//! - Controls never hold scene references; they address nodes by id.

pub mod panel;

pub use panel::{Control, ControlKind, DebugPanel, PanelError, PanelValue, Property, SPIN_DURATION};
