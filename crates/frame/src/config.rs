use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use scenekit_common::{MAX_PIXEL_RATIO, ViewportSize};
use scenekit_input::{CameraRig, DEFAULT_DAMPING, OrbitControls};
use scenekit_render::{Camera, Projection};

use crate::error::ConfigError;
use crate::presets::{SceneSetup, ScenePreset};
use crate::timing::DEFAULT_HISTORY;

/// Camera override. Replaces the preset's projection; position is optional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    pub projection: Projection,
    #[serde(default)]
    pub position: Option<Vec3>,
}

/// Camera rig override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RigConfig {
    Fixed,
    Orbit {
        #[serde(default = "default_damping")]
        damping: f32,
    },
    CursorPan {
        amplitude: f32,
    },
    CursorOrbit {
        radius: f32,
        height: f32,
    },
    Circle,
}

fn default_damping() -> f32 {
    DEFAULT_DAMPING
}

impl RigConfig {
    pub fn build(&self, target: Vec3) -> Result<CameraRig, ConfigError> {
        let rig = match *self {
            Self::Fixed => CameraRig::Fixed,
            Self::Orbit { damping } => CameraRig::Orbit(
                OrbitControls::new(target)
                    .with_damping(damping)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            ),
            Self::CursorPan { amplitude } => CameraRig::CursorPan { amplitude },
            Self::CursorOrbit { radius, height } => CameraRig::CursorOrbit { radius, height },
            Self::Circle => CameraRig::Circle,
        };
        Ok(rig)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "scenekit".into(),
        }
    }
}

impl WindowConfig {
    pub fn size(&self) -> ViewportSize {
        ViewportSize::new(self.width, self.height)
    }
}

/// Everything needed to stand up a stage, loadable from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    pub preset: ScenePreset,
    pub camera: Option<CameraConfig>,
    pub rig: Option<RigConfig>,
    pub max_pixel_ratio: f64,
    pub window: WindowConfig,
    /// Frame deltas kept for statistics.
    pub frame_history: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            preset: ScenePreset::default(),
            camera: None,
            rig: None,
            max_pixel_ratio: MAX_PIXEL_RATIO,
            window: WindowConfig::default(),
            frame_history: DEFAULT_HISTORY,
        }
    }
}

impl StageConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let parse: fn(&str) -> Result<Self, ConfigError> = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&text)?;
        tracing::info!(path = %path.display(), preset = %config.preset, "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_pixel_ratio.is_finite() && self.max_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_pixel_ratio must be positive, got {}",
                self.max_pixel_ratio
            )));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be at least 1x1".into()));
        }
        if self.frame_history == 0 {
            return Err(ConfigError::Invalid("frame_history must be at least 1".into()));
        }
        if let Some(camera) = &self.camera {
            let (near, far) = match camera.projection {
                Projection::Perspective {
                    fov_degrees,
                    near,
                    far,
                } => {
                    if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
                        return Err(ConfigError::Invalid(format!(
                            "fov_degrees must be in (0, 180), got {fov_degrees}"
                        )));
                    }
                    (near, far)
                }
                Projection::Orthographic {
                    half_height,
                    near,
                    far,
                } => {
                    if !(half_height > 0.0 && half_height.is_finite()) {
                        return Err(ConfigError::Invalid(format!(
                            "half_height must be positive, got {half_height}"
                        )));
                    }
                    (near, far)
                }
            };
            if !(near > 0.0 && far > near) {
                return Err(ConfigError::Invalid(format!(
                    "clip planes must satisfy 0 < near < far, got near={near} far={far}"
                )));
            }
        }
        match self.rig {
            Some(RigConfig::Orbit { damping }) if !(0.0..1.0).contains(&damping) => {
                return Err(ConfigError::Invalid(format!(
                    "orbit damping must be in [0, 1), got {damping}"
                )));
            }
            Some(RigConfig::CursorPan { amplitude }) if !amplitude.is_finite() => {
                return Err(ConfigError::Invalid(format!(
                    "cursor pan amplitude must be finite, got {amplitude}"
                )));
            }
            Some(RigConfig::CursorOrbit { radius, height })
                if !(radius.is_finite() && height.is_finite()) =>
            {
                return Err(ConfigError::Invalid(format!(
                    "cursor orbit radius and height must be finite, got {radius} and {height}"
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Build the preset, then apply camera and rig overrides.
    pub fn build_setup(&self) -> Result<SceneSetup, ConfigError> {
        let aspect = self.window.size().aspect_ratio();
        let mut setup = self
            .preset
            .build(aspect)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(camera) = &self.camera {
            let mut next = Camera::new(camera.projection, aspect);
            next.position = camera.position.unwrap_or(setup.camera.position);
            next.target = setup.camera.target;
            setup.camera = next;
        }
        if let Some(rig) = &self.rig {
            setup.rig = rig.build(setup.camera.target)?;
        }
        Ok(setup)
    }
}
