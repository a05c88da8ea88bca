use glam::Vec3;
use std::f32::consts::{PI, TAU};

use crate::InputError;

const POLE_EPSILON: f32 = 1e-6;

/// Default damping factor for orbit controls.
pub const DEFAULT_DAMPING: f32 = 0.05;

/// Orbit controls around a target point with optional velocity damping.
///
/// Pointer drags and wheel steps accumulate into a pending spherical delta.
/// Each [`OrbitControls::update`] applies it to the camera position. With
/// damping enabled only `damping_factor` of the pending delta is applied and
/// the remainder decays by `1 - damping_factor`, so motion coasts to a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    damping_factor: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            damping_factor: DEFAULT_DAMPING,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Enable damping with `factor` in `[0, 1)`.
    pub fn with_damping(mut self, factor: f32) -> Result<Self, InputError> {
        self.set_damping_factor(factor)?;
        self.enable_damping = true;
        tracing::debug!(factor, "orbit damping enabled");
        Ok(self)
    }

    pub fn damping_factor(&self) -> f32 {
        self.damping_factor
    }

    pub fn set_damping_factor(&mut self, factor: f32) -> Result<(), InputError> {
        if !(0.0..1.0).contains(&factor) {
            return Err(InputError::InvalidDamping(factor));
        }
        self.damping_factor = factor;
        Ok(())
    }

    /// Pending angular velocity `(theta, phi)` in radians.
    pub fn velocity(&self) -> (f32, f32) {
        (self.delta_theta, self.delta_phi)
    }

    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < POLE_EPSILON
            && self.delta_phi.abs() < POLE_EPSILON
            && (self.scale - 1.0).abs() < POLE_EPSILON
    }

    /// Queue a rotation from a pointer drag of `(dx, dy)` pixels.
    /// A drag across the full viewport height is one full turn.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        let h = viewport_height.max(1) as f32;
        self.delta_theta -= TAU * dx / h * self.rotate_speed;
        self.delta_phi -= TAU * dy / h * self.rotate_speed;
    }

    /// Queue a dolly step. Negative `wheel_delta` moves toward the target.
    pub fn dolly(&mut self, wheel_delta: f32) {
        let step = 0.95_f32.powf(self.zoom_speed);
        if wheel_delta < 0.0 {
            self.scale *= step;
        } else if wheel_delta > 0.0 {
            self.scale /= step;
        }
    }

    /// Apply pending motion to `position`. Returns whether it moved.
    pub fn update(&mut self, position: &mut Vec3) -> bool {
        let offset = *position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        if self.enable_damping {
            theta += self.delta_theta * self.damping_factor;
            phi += self.delta_phi * self.damping_factor;
        } else {
            theta += self.delta_theta;
            phi += self.delta_phi;
        }

        // Upper limits win over inverted ones; NaN limits are skipped.
        phi = phi
            .max(self.min_polar_angle)
            .min(self.max_polar_angle)
            .max(POLE_EPSILON)
            .min(PI - POLE_EPSILON);
        radius = (radius * self.scale)
            .max(self.min_distance)
            .min(self.max_distance);

        let next = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        let moved = next.distance_squared(*position) > POLE_EPSILON * POLE_EPSILON;
        *position = next;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_damping_is_rejected() {
        assert!(OrbitControls::default().with_damping(1.0).is_err());
        assert!(OrbitControls::default().with_damping(-0.1).is_err());
        let controls = OrbitControls::default().with_damping(0.0).unwrap();
        assert!(controls.enable_damping);
    }

    #[test]
    fn idle_controls_keep_position() {
        let mut controls = OrbitControls::new(Vec3::ZERO).with_damping(0.05).unwrap();
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        let moved = controls.update(&mut pos);
        assert!(!moved);
        assert!((pos - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn damped_velocity_decays_toward_zero() {
        let mut controls = OrbitControls::new(Vec3::ZERO).with_damping(0.05).unwrap();
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        controls.rotate_by_pixels(100.0, 0.0, 600);

        let mut last = controls.velocity().0.abs();
        for _ in 0..200 {
            controls.update(&mut pos);
            let v = controls.velocity().0.abs();
            assert!(v < last);
            last = v;
        }
        assert!(last < 1e-4);
        // Distance to the target is preserved while orbiting.
        assert!((pos.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn undamped_rotation_applies_in_one_step() {
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        // Quarter of the viewport height is a quarter turn.
        controls.rotate_by_pixels(-150.0, 0.0, 600);
        assert!(controls.update(&mut pos));
        assert!((pos - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);
        assert!(controls.is_settled());
    }

    #[test]
    fn polar_angle_is_clamped_off_the_pole() {
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        controls.rotate_by_pixels(0.0, 10_000.0, 600);
        controls.update(&mut pos);
        assert!(pos.is_finite());
        // Pinned just below the top pole, still 3 units out.
        assert!(pos.y > 2.99 && pos.y <= 3.0);
        assert!((pos.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn dolly_respects_distance_limits() {
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.min_distance = 2.0;
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        for _ in 0..100 {
            controls.dolly(-1.0);
            controls.update(&mut pos);
        }
        assert!((pos.length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn inverted_or_nan_limits_do_not_panic() {
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.min_distance = 5.0;
        controls.max_distance = 1.0;
        controls.min_polar_angle = f32::NAN;
        controls.max_polar_angle = f32::NAN;
        let mut pos = Vec3::new(0.0, 0.0, 3.0);
        controls.rotate_by_pixels(40.0, 40.0, 600);
        controls.dolly(1.0);
        controls.update(&mut pos);
        assert!(pos.is_finite());
        // The upper distance limit wins.
        assert!((pos.length() - 1.0).abs() < 1e-4);
    }
}
