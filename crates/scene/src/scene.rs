use glam::Mat4;
use scenekit_common::{Color, NodeId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::Geometry;
use crate::material::Material;
use crate::motion::{Motion, Tween};

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has no material")]
    NoMaterial(NodeId),
}

/// What a node draws or contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Group,
    Mesh { geometry: Geometry, material: Material },
    AxesHelper { size: f32 },
    AmbientLight { color: Color, intensity: f32 },
    PointLight { color: Color, intensity: f32 },
}

/// A node in the scene graph.
///
/// `transform` is the authored pose. `animated` is what the renderer sees:
/// the authored pose with motion layered on top, refreshed by
/// [`Scene::animate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub visible: bool,
    pub motion: Option<Motion>,
    transform: Transform,
    animated: Transform,
    parent: Option<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: true,
            motion: None,
            transform: Transform::default(),
            animated: Transform::default(),
            parent: None,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn axes_helper(size: f32) -> Self {
        Self::new("axes", NodeKind::AxesHelper { size })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self.animated = transform;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn animated(&self) -> &Transform {
        &self.animated
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }
}

/// A visible mesh with its world matrix, as handed to renderers.
#[derive(Debug, Clone, Copy)]
pub struct MeshInstance<'a> {
    pub id: NodeId,
    pub name: &'a str,
    pub geometry: &'a Geometry,
    pub material: &'a Material,
    pub world: Mat4,
}

/// The scene graph container.
///
/// Nodes live in a BTreeMap so iteration order is stable across runs.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    background: Option<Color>,
    tweens: Vec<Tween>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(color: Color) -> Self {
        Self {
            background: Some(color),
            ..Self::default()
        }
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.background = color;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    /// Add a root-level node. Returns its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId::new();
        tracing::debug!(id = %id.short(), name = %node.name, "node added");
        self.nodes.insert(id, Node { parent: None, ..node });
        id
    }

    /// Add a node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let id = self.add(node);
        if let Some(child) = self.nodes.get_mut(&id) {
            child.parent = Some(parent);
        }
        Ok(id)
    }

    /// Remove a node and all of its descendants. Returns the removed node.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let removed = self.nodes.remove(&id)?;
        for child in self.children(id) {
            self.remove(child);
        }
        self.tweens.retain(|t| t.node != id);
        tracing::debug!(id = %id.short(), name = %removed.name, "node removed");
        Some(removed)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| *id)
    }

    /// Direct children of `id`, in id order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Replace the authored transform. The animated pose follows immediately.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(SceneError::NodeNotFound(id))?;
        node.transform = transform;
        node.animated = transform;
        Ok(())
    }

    /// Compose the animated local transforms from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let local = node.animated.matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// A node is drawn only if it and every ancestor are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(node) if node.visible => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Every visible mesh with its world matrix.
    pub fn visible_meshes(&self) -> Vec<MeshInstance<'_>> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| match &node.kind {
                NodeKind::Mesh { geometry, material } if self.is_visible(*id) => {
                    Some(MeshInstance {
                        id: *id,
                        name: &node.name,
                        geometry,
                        material,
                        world: self.world_matrix(*id)?,
                    })
                }
                _ => None,
            })
            .collect()
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Queue a tween. A running tween on the same node and property is replaced.
    pub fn add_tween(&mut self, tween: Tween) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&tween.node) {
            return Err(SceneError::NodeNotFound(tween.node));
        }
        self.tweens
            .retain(|t| !(t.node == tween.node && t.property == tween.property));
        self.tweens.push(tween);
        Ok(())
    }

    /// Advance every time-driven mutation to elapsed time `t`.
    ///
    /// Tweens write into the authored pose; motion is then layered on top.
    /// Finished tweens are dropped after their final value is written.
    pub fn animate(&mut self, t: f64) {
        for tween in &self.tweens {
            if let Some(node) = self.nodes.get_mut(&tween.node) {
                tween
                    .property
                    .write(&mut node.transform, tween.value_at(t));
            }
        }
        self.tweens.retain(|tween| !tween.is_finished(t));

        for node in self.nodes.values_mut() {
            node.animated = match &node.motion {
                Some(motion) => motion.sample(&node.transform, t),
                None => node.transform,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::TweenProperty;
    use glam::Vec3;

    fn cube() -> Node {
        Node::mesh(
            "cube",
            Geometry::cube(1.0),
            Material::basic(Color::from_hex(0x71a5e3)),
        )
    }

    #[test]
    fn scene_starts_empty() {
        let s = Scene::new();
        assert_eq!(s.node_count(), 0);
        assert!(s.background().is_none());
    }

    #[test]
    fn add_and_remove() {
        let mut s = Scene::new();
        let id = s.add(cube());
        assert_eq!(s.node_count(), 1);
        assert!(s.get(id).is_some());

        let node = s.remove(id);
        assert!(node.is_some());
        assert_eq!(s.node_count(), 0);
        assert!(s.remove(id).is_none());
    }

    #[test]
    fn removing_group_removes_descendants() {
        let mut s = Scene::new();
        let group = s.add(Node::group("group"));
        let inner = s.add_child(group, Node::group("inner")).unwrap();
        s.add_child(inner, cube()).unwrap();
        s.add(Node::axes_helper(5.0));
        assert_eq!(s.node_count(), 4);

        s.remove(group);
        assert_eq!(s.node_count(), 1);
    }

    #[test]
    fn add_child_to_missing_parent_fails() {
        let mut s = Scene::new();
        let err = s.add_child(NodeId::new(), cube()).unwrap_err();
        assert!(matches!(err, SceneError::NodeNotFound(_)));
        assert_eq!(s.node_count(), 0);
    }

    #[test]
    fn world_matrix_composes_group_scale() {
        let mut s = Scene::new();
        let group = s.add(Node::group("group").with_transform(Transform {
            scale: Vec3::new(1.0, 0.5, 1.0),
            ..Transform::default()
        }));
        let mesh = s
            .add_child(
                group,
                cube().with_transform(Transform {
                    position: Vec3::new(0.0, 2.0, 0.0),
                    scale: Vec3::new(1.0, 2.0, 1.0),
                    ..Transform::default()
                }),
            )
            .unwrap();

        let world = s.world_matrix(mesh).unwrap();
        let top = world.transform_point3(Vec3::new(0.0, 0.5, 0.0));
        // local y: 0.5 * 2 + 2 = 3, then group halves it.
        assert!((top.y - 1.5).abs() < 1e-6);
    }

    #[test]
    fn hidden_ancestor_hides_mesh() {
        let mut s = Scene::new();
        let group = s.add(Node::group("group"));
        s.add_child(group, cube()).unwrap();
        assert_eq!(s.visible_meshes().len(), 1);

        s.get_mut(group).unwrap().visible = false;
        assert!(s.visible_meshes().is_empty());
    }

    #[test]
    fn animate_applies_motion_from_authored_pose() {
        let mut s = Scene::new();
        let id = s.add(cube().with_motion(Motion::spin_y(0.1)));
        s.animate(2.0);
        assert!((s.get(id).unwrap().animated().rotation.y - 0.2).abs() < 1e-6);
        // Authored pose is untouched, so re-sampling is reproducible.
        assert_eq!(s.get(id).unwrap().transform().rotation.y, 0.0);
        s.animate(2.0);
        assert!((s.get(id).unwrap().animated().rotation.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn tween_runs_then_is_dropped() {
        let mut s = Scene::new();
        let id = s.add(cube());
        s.add_tween(Tween {
            node: id,
            property: TweenProperty::RotationY,
            from: 0.0,
            to: std::f32::consts::TAU,
            start: 0.0,
            duration: 1.0,
        })
        .unwrap();

        s.animate(0.5);
        let mid = s.get(id).unwrap().animated().rotation.y;
        assert!(mid > 0.0 && mid < std::f32::consts::TAU);
        assert_eq!(s.tweens().len(), 1);

        s.animate(1.0);
        assert!((s.get(id).unwrap().animated().rotation.y - std::f32::consts::TAU).abs() < 1e-5);
        assert!(s.tweens().is_empty());
    }

    #[test]
    fn replacing_tween_on_same_property() {
        let mut s = Scene::new();
        let id = s.add(cube());
        let tween = Tween {
            node: id,
            property: TweenProperty::RotationY,
            from: 0.0,
            to: 1.0,
            start: 0.0,
            duration: 1.0,
        };
        s.add_tween(tween).unwrap();
        s.add_tween(Tween { to: 2.0, ..tween }).unwrap();
        assert_eq!(s.tweens().len(), 1);
        assert_eq!(s.tweens()[0].to, 2.0);
    }

    #[test]
    fn btreemap_gives_deterministic_iteration() {
        let mut s = Scene::new();
        for _ in 0..50 {
            s.add(Node::group("g"));
        }
        let keys: Vec<NodeId> = s.nodes().keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
