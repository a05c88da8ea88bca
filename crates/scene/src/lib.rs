//! Scene graph: nodes, geometry and material descriptors, time-driven motion.
//!
//! # Invariants
//! - Motion is a pure function of elapsed time and the authored pose.
//! - Renderers read the scene; only `animate` and explicit operations mutate it.

pub mod geometry;
pub mod material;
pub mod motion;
pub mod scene;

pub use geometry::Geometry;
pub use material::{CubeTextureRef, Filter, Material, Surface, TextureRef};
pub use motion::{Motion, Tween, TweenProperty};
pub use scene::{MeshInstance, Node, NodeKind, Scene, SceneError};
