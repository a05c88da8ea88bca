use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Geometry descriptor. Tessellation belongs to the rendering backend; the
/// scene only records parameters and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
        segments: [u32; 3],
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
        segments: [u32; 2],
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    /// Explicit triangle soup, three vertices per triangle.
    Triangles { positions: Vec<[f32; 3]> },
}

impl Geometry {
    pub fn cube(size: f32) -> Self {
        Self::Box {
            width: size,
            height: size,
            depth: size,
            segments: [1, 1, 1],
        }
    }

    /// `count` triangles with every coordinate in `[-extent / 2, extent / 2)`.
    /// The same seed always yields the same buffer.
    pub fn random_triangles(count: usize, extent: f32, seed: u64) -> Self {
        let mut state = seed;
        let positions = (0..count * 3)
            .map(|_| {
                let mut coord = || {
                    state = splitmix64(state);
                    // Top 24 bits give a uniform float in [0, 1).
                    let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
                    (unit - 0.5) * extent
                };
                [coord(), coord(), coord()]
            })
            .collect();
        Self::Triangles { positions }
    }

    /// Axis-aligned bounds in local space as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        match self {
            Self::Box {
                width,
                height,
                depth,
                ..
            } => {
                let half = Vec3::new(*width, *height, *depth) * 0.5;
                (-half, half)
            }
            Self::Sphere { radius, .. } => (Vec3::splat(-radius), Vec3::splat(*radius)),
            Self::Plane { width, height, .. } => {
                let half = Vec3::new(width * 0.5, height * 0.5, 0.0);
                (-half, half)
            }
            Self::Torus { radius, tube, .. } => {
                let outer = radius + tube;
                (
                    Vec3::new(-outer, -outer, -tube),
                    Vec3::new(outer, outer, *tube),
                )
            }
            Self::Triangles { positions } => {
                if positions.is_empty() {
                    return (Vec3::ZERO, Vec3::ZERO);
                }
                positions.iter().fold(
                    (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
                    |(min, max), p| {
                        let p = Vec3::from_array(*p);
                        (min.min(p), max.max(p))
                    },
                )
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Plane { .. } => "plane",
            Self::Torus { .. } => "torus",
            Self::Triangles { .. } => "triangles",
        }
    }
}

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_triangles_are_reproducible() {
        let a = Geometry::random_triangles(50, 4.0, 7);
        let b = Geometry::random_triangles(50, 4.0, 7);
        assert_eq!(a, b);
        let Geometry::Triangles { positions } = a else {
            panic!("expected triangles");
        };
        assert_eq!(positions.len(), 150);
        assert!(
            positions
                .iter()
                .flatten()
                .all(|c| (-2.0..2.0).contains(c))
        );
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(
            Geometry::random_triangles(3, 4.0, 1),
            Geometry::random_triangles(3, 4.0, 2)
        );
    }

    #[test]
    fn box_bounds_are_centered() {
        let (min, max) = Geometry::cube(1.0).bounds();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn torus_bounds_include_tube() {
        let torus = Geometry::Torus {
            radius: 0.3,
            tube: 0.2,
            radial_segments: 64,
            tubular_segments: 128,
        };
        let (min, max) = torus.bounds();
        assert!((max.x - 0.5).abs() < 1e-6);
        assert!((min.z + 0.2).abs() < 1e-6);
    }

    #[test]
    fn empty_triangles_have_zero_bounds() {
        let g = Geometry::Triangles { positions: vec![] };
        assert_eq!(g.bounds(), (Vec3::ZERO, Vec3::ZERO));
    }
}
