use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use scenekit_common::{Color, Transform};
use scenekit_input::{CameraRig, OrbitControls};
use scenekit_render::Camera;
use scenekit_scene::{
    CubeTextureRef, Filter, Geometry, Material, Motion, Node, NodeKind, Scene, SceneError,
    Surface, TextureRef,
};
use scenekit_tools::{DebugPanel, Property};

use crate::error::ConfigError;

/// Background shared by every built-in scene.
pub const BACKGROUND: Color = Color::from_hex(0x315b39);
/// Default mesh color.
pub const MESH_COLOR: Color = Color::from_hex(0x71a5e3);
/// Initial value of the textures scene's color picker.
pub const PICKER_COLOR: Color = Color::from_hex(0xeab41f);

const TRIANGLE_SEED: u64 = 42;

/// Scene contents plus the camera, rig and panel that go with them.
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub scene: Scene,
    pub camera: Camera,
    pub rig: CameraRig,
    pub panel: DebugPanel,
}

/// Built-in scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenePreset {
    /// A single scaled, rotated cube inside a squashed group; fixed camera.
    #[default]
    TransformObjects,
    /// The grouped cube again, with damped orbit controls.
    Cameras,
    /// Random triangle soup drawn as wireframe.
    Geometries,
    /// Textured cube with elevation, visibility, wireframe, color and spin controls.
    Textures,
    /// Three spinning PBR meshes lit by ambient and point lights.
    Materials,
}

impl ScenePreset {
    pub const ALL: [Self; 5] = [
        Self::TransformObjects,
        Self::Cameras,
        Self::Geometries,
        Self::Textures,
        Self::Materials,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TransformObjects => "transform-objects",
            Self::Cameras => "cameras",
            Self::Geometries => "geometries",
            Self::Textures => "textures",
            Self::Materials => "materials",
        }
    }

    /// Build the scene for a viewport of the given aspect ratio.
    pub fn build(&self, aspect: f32) -> Result<SceneSetup, SceneError> {
        let setup = match self {
            Self::TransformObjects => transform_objects(aspect)?,
            Self::Cameras => grouped_cube(
                aspect,
                Geometry::cube(1.0),
                Material::basic(MESH_COLOR),
            )?,
            Self::Geometries => {
                let mut material = Material::basic(MESH_COLOR);
                material.surface_mut().wireframe = true;
                grouped_cube(
                    aspect,
                    Geometry::random_triangles(50, 4.0, TRIANGLE_SEED),
                    material,
                )?
            }
            Self::Textures => textures(aspect)?,
            Self::Materials => materials(aspect),
        };
        tracing::info!(
            preset = self.name(),
            nodes = setup.scene.node_count(),
            rig = setup.rig.name(),
            "scene built"
        );
        Ok(setup)
    }
}

impl fmt::Display for ScenePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenePreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

fn damped_orbit(target: Vec3) -> CameraRig {
    let mut controls = OrbitControls::new(target);
    controls.enable_damping = true;
    CameraRig::Orbit(controls)
}

fn transform_objects(aspect: f32) -> Result<SceneSetup, SceneError> {
    let mut scene = Scene::with_background(BACKGROUND);
    let group = scene.add(Node::group("group").with_transform(Transform {
        scale: Vec3::new(1.0, 0.5, 1.0),
        ..Transform::default()
    }));
    let cube_pose = Transform {
        position: Vec3::new(0.75, 0.25, 0.5),
        rotation: Vec3::new(0.0, PI * 0.25, 0.0),
        scale: Vec3::new(1.0, 2.0, 1.0),
    };
    scene.add_child(
        group,
        Node::mesh("cube", Geometry::cube(1.0), Material::basic(MESH_COLOR))
            .with_transform(cube_pose),
    )?;
    scene.add(Node::axes_helper(5.0));

    let mut camera = Camera::perspective(75.0, aspect, 0.1, 2000.0);
    camera.look_at(cube_pose.position);

    Ok(SceneSetup {
        scene,
        camera,
        rig: CameraRig::Fixed,
        panel: DebugPanel::new("debug"),
    })
}

fn grouped_cube(aspect: f32, geometry: Geometry, material: Material) -> Result<SceneSetup, SceneError> {
    let mut scene = Scene::with_background(BACKGROUND);
    let group = scene.add(Node::group("group").with_transform(Transform {
        scale: Vec3::new(1.0, 0.5, 1.0),
        ..Transform::default()
    }));
    scene.add_child(
        group,
        Node::mesh("mesh", geometry, material).with_transform(Transform {
            scale: Vec3::new(1.0, 2.0, 1.0),
            ..Transform::default()
        }),
    )?;
    scene.add(Node::axes_helper(5.0));

    Ok(SceneSetup {
        scene,
        camera: Camera::perspective(75.0, aspect, 1.0, 100.0),
        rig: damped_orbit(Vec3::ZERO),
        panel: DebugPanel::new("debug"),
    })
}

fn textures(aspect: f32) -> Result<SceneSetup, SceneError> {
    let mut scene = Scene::with_background(BACKGROUND);
    let material = Material::Basic {
        surface: Surface {
            map: Some(TextureRef::new("/textures/door/color.jpg").with_mag_filter(Filter::Nearest)),
            ..Surface::default()
        },
    };
    let cube = scene.add(Node::mesh(
        "cube",
        Geometry::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            segments: [2, 2, 2],
        },
        material,
    ));
    scene.add(Node::axes_helper(5.0));

    let panel = DebugPanel::new("debug")
        .slider("elevation", Property::Elevation, &[cube], -3.0, 3.0, 0.1)
        .toggle("visible", Property::Visible, &[cube])
        .toggle("wireframe", Property::Wireframe, &[cube])
        .color("color", &[cube])
        .button("spin", Property::Spin, &[cube]);

    Ok(SceneSetup {
        scene,
        camera: Camera::perspective(75.0, aspect, 0.1, 100.0),
        rig: damped_orbit(Vec3::ZERO),
        panel,
    })
}

fn materials(aspect: f32) -> SceneSetup {
    let mut scene = Scene::with_background(BACKGROUND);
    let material = Material::Standard {
        surface: Surface::default(),
        roughness: 0.05,
        metalness: 0.95,
        env_map: Some(CubeTextureRef::from_dir("/textures/environmentMaps/0")),
    };
    let spin = Motion::Spin {
        rates: Vec3::new(0.15, 0.1, 0.0),
    };

    scene.add(Node::new(
        "ambient",
        NodeKind::AmbientLight {
            color: Color::WHITE,
            intensity: 0.5,
        },
    ));
    scene.add(
        Node::new(
            "point",
            NodeKind::PointLight {
                color: Color::WHITE,
                intensity: 0.5,
            },
        )
        .with_transform(Transform::from_position(Vec3::new(2.0, 3.0, 4.0))),
    );

    let meshes = [
        (
            "sphere",
            Geometry::Sphere {
                radius: 0.5,
                width_segments: 64,
                height_segments: 64,
            },
            -1.5,
        ),
        (
            "plane",
            Geometry::Plane {
                width: 1.0,
                height: 1.0,
                segments: [100, 100],
            },
            0.0,
        ),
        (
            "torus",
            Geometry::Torus {
                radius: 0.3,
                tube: 0.2,
                radial_segments: 64,
                tubular_segments: 128,
            },
            1.5,
        ),
    ];
    let ids: Vec<_> = meshes
        .into_iter()
        .map(|(name, geometry, x)| {
            scene.add(
                Node::mesh(name, geometry, material.clone())
                    .with_transform(Transform::from_position(Vec3::new(x, 0.0, 0.0)))
                    .with_motion(spin),
            )
        })
        .collect();
    scene.add(Node::axes_helper(5.0));

    let panel = DebugPanel::new("debug")
        .slider("metalness", Property::Metalness, &ids, 0.0, 1.0, 0.01)
        .slider("roughness", Property::Roughness, &ids, 0.0, 1.0, 0.01)
        .collapsed(true);

    SceneSetup {
        scene,
        camera: Camera::perspective(50.0, aspect, 0.1, 100.0),
        rig: damped_orbit(Vec3::ZERO),
        panel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_render::Projection;
    use scenekit_tools::PanelValue;

    #[test]
    fn names_round_trip_through_from_str() {
        for preset in ScenePreset::ALL {
            assert_eq!(preset.name().parse::<ScenePreset>().unwrap(), preset);
            assert_eq!(preset.to_string(), preset.name());
        }
        assert!(matches!(
            "nope".parse::<ScenePreset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn every_preset_builds_with_background() {
        for preset in ScenePreset::ALL {
            let setup = preset.build(4.0 / 3.0).unwrap();
            assert_eq!(setup.scene.background(), Some(BACKGROUND));
            assert!(!setup.scene.visible_meshes().is_empty());
        }
    }

    #[test]
    fn transform_objects_composes_group_scale() {
        let setup = ScenePreset::TransformObjects.build(4.0 / 3.0).unwrap();
        let cube = setup.scene.find_by_name("cube").unwrap();
        let world = setup.scene.world_matrix(cube).unwrap();
        let (scale, _, translation) = world.to_scale_rotation_translation();
        assert!((scale - Vec3::ONE).length() < 1e-5);
        assert!((translation - Vec3::new(0.75, 0.125, 0.5)).length() < 1e-5);
        assert_eq!(setup.camera.target, Vec3::new(0.75, 0.25, 0.5));
        assert_eq!(setup.rig, CameraRig::Fixed);
    }

    #[test]
    fn orbit_presets_enable_damping() {
        for preset in [ScenePreset::Cameras, ScenePreset::Textures, ScenePreset::Materials] {
            let mut setup = preset.build(1.0).unwrap();
            let orbit = setup.rig.orbit_mut().unwrap();
            assert!(orbit.enable_damping);
            assert_eq!(orbit.damping_factor(), scenekit_input::DEFAULT_DAMPING);
        }
    }

    #[test]
    fn geometries_soup_is_deterministic_wireframe() {
        let a = ScenePreset::Geometries.build(1.0).unwrap();
        let b = ScenePreset::Geometries.build(1.0).unwrap();
        let mesh_a = a.scene.get(a.scene.find_by_name("mesh").unwrap()).unwrap();
        let mesh_b = b.scene.get(b.scene.find_by_name("mesh").unwrap()).unwrap();
        assert_eq!(mesh_a.kind, mesh_b.kind);
        assert!(mesh_a.material().unwrap().surface().wireframe);
    }

    #[test]
    fn textures_panel_controls() {
        let setup = ScenePreset::Textures.build(1.0).unwrap();
        let labels: Vec<_> = setup.panel.controls().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["elevation", "visible", "wireframe", "color", "spin"]);
        assert!(!setup.panel.is_collapsed());
        assert_eq!(
            setup.panel.read(0, &setup.scene).unwrap(),
            PanelValue::Number(0.0)
        );
    }

    #[test]
    fn materials_scene_is_lit_and_collapsed() {
        let setup = ScenePreset::Materials.build(1.0).unwrap();
        assert!(setup.panel.is_collapsed());
        assert_eq!(setup.scene.visible_meshes().len(), 3);
        assert!(matches!(
            setup.camera.projection,
            Projection::Perspective { fov_degrees, .. } if fov_degrees == 50.0
        ));
        let lights = setup
            .scene
            .nodes()
            .values()
            .filter(|n| matches!(n.kind, NodeKind::AmbientLight { .. } | NodeKind::PointLight { .. }))
            .count();
        assert_eq!(lights, 2);
    }

    #[test]
    fn preset_serializes_kebab_case() {
        let json = serde_json::to_string(&ScenePreset::TransformObjects).unwrap();
        assert_eq!(json, "\"transform-objects\"");
    }
}
