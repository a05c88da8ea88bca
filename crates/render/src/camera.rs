use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Projection model, chosen when the camera is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    Perspective {
        fov_degrees: f32,
        near: f32,
        far: f32,
    },
    /// Vertical half-extent; the horizontal extent is scaled by aspect.
    Orthographic { half_height: f32, near: f32, far: f32 },
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_degrees,
                near,
                far,
            } => Mat4::perspective_rh(fov_degrees.to_radians(), aspect, near, far),
            Self::Orthographic {
                half_height,
                near,
                far,
            } => Mat4::orthographic_rh(
                -half_height * aspect,
                half_height * aspect,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }
}

/// Camera state: projection parameters, aspect ratio and a look-at pose.
///
/// The projection matrix is cached. Changing the aspect ratio does not touch
/// the cache until [`Camera::update_projection`] runs.
#[derive(Debug, Clone)]
pub struct Camera {
    pub projection: Projection,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    aspect: f32,
    projection_matrix: Mat4,
    projection_aspect: f32,
}

impl Camera {
    pub fn new(projection: Projection, aspect: f32) -> Self {
        let aspect = sanitize_aspect(aspect);
        Self {
            projection,
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            projection_matrix: projection.matrix(aspect),
            projection_aspect: aspect,
        }
    }

    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(
            Projection::Perspective {
                fov_degrees,
                near,
                far,
            },
            aspect,
        )
    }

    pub fn orthographic(half_height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(
            Projection::Orthographic {
                half_height,
                near,
                far,
            },
            aspect,
        )
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    /// Regenerate the cached projection matrix from the current parameters.
    pub fn update_projection(&mut self) {
        self.projection_matrix = self.projection.matrix(self.aspect);
        self.projection_aspect = self.aspect;
    }

    /// Aspect ratio baked into the cached projection matrix.
    pub fn projection_aspect(&self) -> f32 {
        self.projection_aspect
    }

    pub fn is_projection_current(&self) -> bool {
        self.projection_aspect == self.aspect
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        // look_at_rh is degenerate when the eye sits on the target.
        let target = if self.position.distance_squared(self.target) < f32::EPSILON {
            self.position + Vec3::NEG_Z
        } else {
            self.target
        };
        Mat4::look_at_rh(self.position, target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_perspective_is_valid() {
        let cam = Camera::perspective(75.0, 800.0 / 600.0, 0.1, 100.0);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
        assert!(cam.is_projection_current());
    }

    #[test]
    fn aspect_change_needs_projection_update() {
        let mut cam = Camera::perspective(75.0, 800.0 / 600.0, 0.1, 100.0);
        let before = cam.projection_matrix();
        cam.set_aspect(1920.0 / 1080.0);
        assert!(!cam.is_projection_current());
        assert_eq!(cam.projection_matrix(), before);

        cam.update_projection();
        assert!(cam.is_projection_current());
        assert!((cam.projection_aspect() - 1.778).abs() < 1e-3);
        assert_ne!(cam.projection_matrix(), before);
    }

    #[test]
    fn orthographic_scales_horizontal_extent() {
        let cam = Camera::orthographic(1.0, 2.0, 0.1, 100.0);
        let m = cam.projection_matrix();
        // x in [-2, 2] maps to clip [-1, 1]
        let clip = m.project_point3(Vec3::new(2.0, 1.0, -1.0));
        assert!((clip.x - 1.0).abs() < 1e-5);
        assert!((clip.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn invalid_aspect_falls_back() {
        let mut cam = Camera::perspective(50.0, f32::NAN, 0.1, 100.0);
        assert_eq!(cam.aspect(), 1.0);
        cam.set_aspect(0.0);
        assert_eq!(cam.aspect(), 1.0);
    }

    #[test]
    fn eye_on_target_still_yields_finite_view() {
        let cam = Camera::perspective(75.0, 1.0, 0.1, 100.0).with_position(Vec3::ZERO);
        assert!(cam.view_matrix().is_finite());
    }
}
