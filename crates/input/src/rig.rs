use glam::Vec3;
use std::f32::consts::TAU;

use crate::cursor::CursorPosition;
use crate::orbit::OrbitControls;

/// How the camera moves each frame. Picked once at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraRig {
    /// Camera stays where it was placed.
    Fixed,
    /// Damped orbit around a target, driven by drag and wheel.
    Orbit(OrbitControls),
    /// Camera x/y follow the cursor, scaled by `amplitude`; z is kept.
    CursorPan { amplitude: f32 },
    /// Cursor x sweeps a full turn around the target at `radius`; cursor y
    /// sets the height, scaled by `height`.
    CursorOrbit { radius: f32, height: f32 },
    /// Camera x/y trace the unit circle over time; z is kept.
    Circle,
}

impl CameraRig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Orbit(_) => "orbit",
            Self::CursorPan { .. } => "cursor_pan",
            Self::CursorOrbit { .. } => "cursor_orbit",
            Self::Circle => "circle",
        }
    }

    pub fn orbit_mut(&mut self) -> Option<&mut OrbitControls> {
        match self {
            Self::Orbit(controls) => Some(controls),
            _ => None,
        }
    }

    /// Advance the rig one frame. Returns whether the camera moved.
    pub fn update(
        &mut self,
        position: &mut Vec3,
        target: &mut Vec3,
        cursor: CursorPosition,
        elapsed: f64,
    ) -> bool {
        let before = *position;
        match self {
            Self::Fixed => return false,
            Self::Orbit(controls) => {
                *target = controls.target;
                return controls.update(position);
            }
            Self::CursorPan { amplitude } => {
                position.x = cursor.x * *amplitude;
                position.y = cursor.y * *amplitude;
            }
            Self::CursorOrbit { radius, height } => {
                let angle = cursor.x * TAU;
                *position = *target
                    + Vec3::new(
                        angle.sin() * *radius,
                        cursor.y * *height,
                        angle.cos() * *radius,
                    );
            }
            Self::Circle => {
                let t = elapsed.max(0.0) as f32;
                position.x = t.cos();
                position.y = t.sin();
            }
        }
        *position != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rig_never_moves() {
        let mut rig = CameraRig::Fixed;
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        let mut target = Vec3::ZERO;
        let cursor = CursorPosition { x: 0.4, y: -0.2 };
        assert!(!rig.update(&mut pos, &mut target, cursor, 10.0));
        assert_eq!(pos, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn cursor_pan_scales_and_keeps_depth() {
        let mut rig = CameraRig::CursorPan { amplitude: 4.0 };
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        let mut target = Vec3::ZERO;
        let cursor = CursorPosition { x: 0.25, y: -0.5 };
        assert!(rig.update(&mut pos, &mut target, cursor, 0.0));
        assert_eq!(pos, Vec3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn cursor_orbit_quarter_turn() {
        let mut rig = CameraRig::CursorOrbit {
            radius: 2.0,
            height: 3.0,
        };
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        let mut target = Vec3::ZERO;
        let cursor = CursorPosition { x: 0.25, y: 0.5 };
        rig.update(&mut pos, &mut target, cursor, 0.0);
        assert!((pos - Vec3::new(2.0, 1.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn circle_is_a_function_of_time() {
        let mut rig = CameraRig::Circle;
        let mut target = Vec3::ZERO;
        let mut a = Vec3::new(0.0, 0.0, 3.0);
        let mut b = Vec3::new(5.0, 5.0, 3.0);
        rig.update(&mut a, &mut target, CursorPosition::default(), 1.5);
        rig.update(&mut b, &mut target, CursorPosition::default(), 1.5);
        assert_eq!(a, b);
    }

    #[test]
    fn orbit_rig_syncs_camera_target() {
        let controls = OrbitControls::new(Vec3::new(0.0, 1.0, 0.0));
        let mut rig = CameraRig::Orbit(controls);
        let mut pos = Vec3::new(0.0, 1.0, 3.0);
        let mut target = Vec3::ZERO;
        rig.update(&mut pos, &mut target, CursorPosition::default(), 0.0);
        assert_eq!(target, Vec3::new(0.0, 1.0, 0.0));
        assert!(rig.orbit_mut().is_some());
        assert!(CameraRig::Fixed.orbit_mut().is_none());
    }
}
