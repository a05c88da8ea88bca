use scenekit_common::ViewportSize;
use scenekit_scene::{NodeKind, Scene};
use std::fmt::Write as _;

use crate::camera::Camera;
use crate::target::RenderTarget;

/// Errors raised by renderers in this crate.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(
        "camera projection is stale: aspect {aspect:.4} but projection built for {projection_aspect:.4}"
    )]
    StaleProjection { aspect: f32, projection_aspect: f32 },
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera, then produces output. It never
/// mutates either.
pub trait Renderer {
    /// What one frame produces.
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn target(&self) -> &RenderTarget;

    /// Resize the output to `size` logical pixels.
    fn set_size(&mut self, size: ViewportSize);

    /// Apply a pixel density, clamped to the target's maximum. Returns the applied value.
    fn set_pixel_ratio(&mut self, ratio: f64) -> f64;

    /// Render one frame.
    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<Self::Output, Self::Error>;
}

/// Text renderer for headless runs and tests.
///
/// Produces a human-readable description of what would be drawn and refuses
/// to render through a stale projection.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    target: RenderTarget,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new(target: RenderTarget) -> Self {
        Self { target, frames: 0 }
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;
    type Error = RenderError;

    fn target(&self) -> &RenderTarget {
        &self.target
    }

    fn set_size(&mut self, size: ViewportSize) {
        self.target.set_size(size);
    }

    fn set_pixel_ratio(&mut self, ratio: f64) -> f64 {
        self.target.set_pixel_ratio(ratio)
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<String, RenderError> {
        if !camera.is_projection_current() {
            return Err(RenderError::StaleProjection {
                aspect: camera.aspect(),
                projection_aspect: camera.projection_aspect(),
            });
        }
        self.frames += 1;

        let (bw, bh) = self.target.drawing_buffer_size();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({} @{}x, buffer {}x{}) ===",
            self.frames,
            self.target.size(),
            self.target.pixel_ratio(),
            bw,
            bh
        );
        if let Some(bg) = scene.background() {
            let _ = writeln!(out, "Background: #{:06x}", bg.to_hex());
        }
        let p = camera.position;
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) aspect={:.3}",
            p.x,
            p.y,
            p.z,
            camera.aspect()
        );
        let _ = writeln!(out, "Nodes: {}", scene.node_count());

        for mesh in scene.visible_meshes() {
            let (_, rotation, translation) = mesh.world.to_scale_rotation_translation();
            let (rx, ry, rz) = rotation.to_euler(glam::EulerRot::XYZ);
            let _ = writeln!(
                out,
                "  [{}] {} {}/{} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
                mesh.id.short(),
                mesh.name,
                mesh.geometry.name(),
                mesh.material.name(),
                translation.x,
                translation.y,
                translation.z,
                rx,
                ry,
                rz
            );
        }
        for node in scene.nodes().values() {
            match &node.kind {
                NodeKind::AmbientLight { intensity, .. } => {
                    let _ = writeln!(out, "  light {} ambient {:.2}", node.name, intensity);
                }
                NodeKind::PointLight { intensity, .. } => {
                    let _ = writeln!(out, "  light {} point {:.2}", node.name, intensity);
                }
                _ => {}
            }
        }

        tracing::trace!(frame = self.frames, "text frame rendered");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use scenekit_common::{Color, Transform};
    use scenekit_scene::{Geometry, Material, Node};

    fn camera() -> Camera {
        Camera::perspective(75.0, 800.0 / 600.0, 0.1, 100.0)
    }

    #[test]
    fn renders_empty_scene() {
        let mut renderer = DebugTextRenderer::default();
        let output = renderer.render(&Scene::new(), &camera()).unwrap();
        assert!(output.contains("Frame 1"));
        assert!(output.contains("Nodes: 0"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn renders_meshes_and_background() {
        let mut scene = Scene::with_background(Color::from_hex(0x315b39));
        scene.add(
            Node::mesh("cube", Geometry::cube(1.0), Material::basic(Color::WHITE))
                .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
        );
        let mut renderer = DebugTextRenderer::default();
        let output = renderer.render(&scene, &camera()).unwrap();
        assert!(output.contains("#315b39"));
        assert!(output.contains("cube box/basic pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn stale_projection_is_rejected() {
        let mut cam = camera();
        cam.set_aspect(2.0);
        let mut renderer = DebugTextRenderer::default();
        let err = renderer.render(&Scene::new(), &cam).unwrap_err();
        assert!(matches!(err, RenderError::StaleProjection { .. }));
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn size_and_ratio_are_applied() {
        let mut renderer = DebugTextRenderer::default();
        renderer.set_size(ViewportSize::new(1920, 1080));
        assert_eq!(renderer.set_pixel_ratio(3.0), 2.0);
        assert_eq!(renderer.target().size(), ViewportSize::new(1920, 1080));
        let output = renderer.render(&Scene::new(), &camera()).unwrap();
        assert!(output.contains("1920x1080 @2x, buffer 3840x2160"));
    }
}
