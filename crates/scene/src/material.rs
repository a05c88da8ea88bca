use scenekit_common::Color;
use serde::{Deserialize, Serialize};

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

/// Reference to an image on disk. Never decoded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRef {
    pub path: String,
    #[serde(default)]
    pub mag_filter: Filter,
    #[serde(default)]
    pub min_filter: Filter,
    #[serde(default = "default_true")]
    pub generate_mipmaps: bool,
}

fn default_true() -> bool {
    true
}

impl TextureRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            generate_mipmaps: true,
        }
    }

    pub fn with_mag_filter(mut self, filter: Filter) -> Self {
        self.mag_filter = filter;
        self
    }
}

/// Six-face environment map in +x, -x, +y, -y, +z, -z order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeTextureRef {
    pub faces: [String; 6],
}

impl CubeTextureRef {
    /// Faces named `px.jpg`, `nx.jpg`, ... under `dir`.
    pub fn from_dir(dir: &str) -> Self {
        let face = |name: &str| format!("{}/{name}.jpg", dir.trim_end_matches('/'));
        Self {
            faces: [
                face("px"),
                face("nx"),
                face("py"),
                face("ny"),
                face("pz"),
                face("nz"),
            ],
        }
    }
}

/// Surface parameters shared by every material kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub color: Color,
    pub wireframe: bool,
    pub transparent: bool,
    pub opacity: f32,
    pub map: Option<TextureRef>,
    pub alpha_map: Option<TextureRef>,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            wireframe: false,
            transparent: false,
            opacity: 1.0,
            map: None,
            alpha_map: None,
        }
    }
}

impl Surface {
    pub fn colored(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

/// Material descriptor, one variant per shading model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    Basic {
        surface: Surface,
    },
    Normal {
        surface: Surface,
        flat_shading: bool,
    },
    Matcap {
        surface: Surface,
        matcap: Option<TextureRef>,
    },
    Depth {
        surface: Surface,
    },
    Lambert {
        surface: Surface,
    },
    Phong {
        surface: Surface,
        shininess: f32,
        specular: Color,
    },
    Toon {
        surface: Surface,
        gradient_map: Option<TextureRef>,
    },
    Standard {
        surface: Surface,
        roughness: f32,
        metalness: f32,
        env_map: Option<CubeTextureRef>,
    },
}

impl Material {
    pub fn basic(color: Color) -> Self {
        Self::Basic {
            surface: Surface::colored(color),
        }
    }

    pub fn standard(roughness: f32, metalness: f32) -> Self {
        Self::Standard {
            surface: Surface::default(),
            roughness,
            metalness,
            env_map: None,
        }
    }

    pub fn surface(&self) -> &Surface {
        match self {
            Self::Basic { surface }
            | Self::Normal { surface, .. }
            | Self::Matcap { surface, .. }
            | Self::Depth { surface }
            | Self::Lambert { surface }
            | Self::Phong { surface, .. }
            | Self::Toon { surface, .. }
            | Self::Standard { surface, .. } => surface,
        }
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        match self {
            Self::Basic { surface }
            | Self::Normal { surface, .. }
            | Self::Matcap { surface, .. }
            | Self::Depth { surface }
            | Self::Lambert { surface }
            | Self::Phong { surface, .. }
            | Self::Toon { surface, .. }
            | Self::Standard { surface, .. } => surface,
        }
    }

    /// Whether the shading model reacts to scene lights.
    pub fn is_lit(&self) -> bool {
        matches!(
            self,
            Self::Lambert { .. } | Self::Phong { .. } | Self::Toon { .. } | Self::Standard { .. }
        )
    }

    pub fn roughness_mut(&mut self) -> Option<&mut f32> {
        match self {
            Self::Standard { roughness, .. } => Some(roughness),
            _ => None,
        }
    }

    pub fn metalness_mut(&mut self) -> Option<&mut f32> {
        match self {
            Self::Standard { metalness, .. } => Some(metalness),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Normal { .. } => "normal",
            Self::Matcap { .. } => "matcap",
            Self::Depth { .. } => "depth",
            Self::Lambert { .. } => "lambert",
            Self::Phong { .. } => "phong",
            Self::Toon { .. } => "toon",
            Self::Standard { .. } => "standard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_accessors_cover_all_variants() {
        let mut m = Material::Phong {
            surface: Surface::default(),
            shininess: 100.0,
            specular: Color::from_hex(0x1188ff),
        };
        m.surface_mut().wireframe = true;
        assert!(m.surface().wireframe);
        assert!(m.is_lit());
        assert!(!Material::basic(Color::WHITE).is_lit());
    }

    #[test]
    fn only_standard_has_pbr_parameters() {
        let mut standard = Material::standard(0.05, 0.95);
        *standard.metalness_mut().unwrap() = 0.5;
        assert_eq!(standard.metalness_mut().copied(), Some(0.5));
        assert!(Material::basic(Color::BLACK).roughness_mut().is_none());
    }

    #[test]
    fn cube_texture_face_order() {
        let env = CubeTextureRef::from_dir("/textures/environmentMaps/0/");
        assert_eq!(env.faces[0], "/textures/environmentMaps/0/px.jpg");
        assert_eq!(env.faces[5], "/textures/environmentMaps/0/nz.jpg");
    }
}
