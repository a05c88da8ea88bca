use scenekit_common::{Color, NodeId};
use scenekit_scene::{Material, Node, Scene, SceneError, Tween, TweenProperty};

/// Seconds a spin button takes to complete its full turn.
pub const SPIN_DURATION: f64 = 1.0;

/// Errors from panel operations.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("no control at index {0}")]
    NoSuchControl(usize),
    #[error("control '{0}' has no target nodes")]
    Unbound(String),
    #[error("control '{label}' expects a {expected} value")]
    TypeMismatch {
        label: String,
        expected: &'static str,
    },
    #[error("control '{0}' is bound to a property the node does not have")]
    Unsupported(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// The scene property a control reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Authored `position.y`.
    Elevation,
    Visible,
    Wireframe,
    Color,
    Metalness,
    Roughness,
    /// One full turn around Y, tweened.
    Spin,
}

impl Property {
    fn expected(&self) -> &'static str {
        match self {
            Self::Elevation | Self::Metalness | Self::Roughness => "number",
            Self::Visible | Self::Wireframe => "bool",
            Self::Color => "color",
            Self::Spin => "trigger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Slider { min: f32, max: f32, step: f32 },
    Toggle,
    ColorPicker,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelValue {
    Number(f32),
    Bool(bool),
    Color(Color),
    Trigger,
}

/// One labelled control. Writes go to every target; reads come from the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub label: String,
    pub property: Property,
    pub targets: Vec<NodeId>,
    pub kind: ControlKind,
}

impl Control {
    /// Clamp to the slider range and snap to the nearest step.
    pub fn quantize(&self, value: f32) -> f32 {
        match self.kind {
            ControlKind::Slider { min, max, step } => {
                let snapped = if step > 0.0 {
                    min + ((value - min) / step).round() * step
                } else {
                    value
                };
                snapped.max(min).min(max)
            }
            _ => value,
        }
    }

    fn unsupported(&self) -> PanelError {
        PanelError::Unsupported(self.label.clone())
    }
}

/// A list of live controls over scene properties.
#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    title: String,
    controls: Vec<Control>,
    collapsed: bool,
}

impl DebugPanel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn slider(
        mut self,
        label: impl Into<String>,
        property: Property,
        targets: &[NodeId],
        min: f32,
        max: f32,
        step: f32,
    ) -> Self {
        self.push(label, property, targets, ControlKind::Slider { min, max, step });
        self
    }

    pub fn toggle(mut self, label: impl Into<String>, property: Property, targets: &[NodeId]) -> Self {
        self.push(label, property, targets, ControlKind::Toggle);
        self
    }

    pub fn color(mut self, label: impl Into<String>, targets: &[NodeId]) -> Self {
        self.push(label, Property::Color, targets, ControlKind::ColorPicker);
        self
    }

    pub fn button(mut self, label: impl Into<String>, property: Property, targets: &[NodeId]) -> Self {
        self.push(label, property, targets, ControlKind::Button);
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    fn push(
        &mut self,
        label: impl Into<String>,
        property: Property,
        targets: &[NodeId],
        kind: ControlKind,
    ) {
        self.controls.push(Control {
            label: label.into(),
            property,
            targets: targets.to_vec(),
            kind,
        });
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    fn control(&self, index: usize) -> Result<&Control, PanelError> {
        self.controls
            .get(index)
            .ok_or(PanelError::NoSuchControl(index))
    }

    /// Current value of the bound property, read from the first target.
    pub fn read(&self, index: usize, scene: &Scene) -> Result<PanelValue, PanelError> {
        let control = self.control(index)?;
        let id = *control
            .targets
            .first()
            .ok_or_else(|| PanelError::Unbound(control.label.clone()))?;
        let node = scene.get(id).ok_or(SceneError::NodeNotFound(id))?;

        let value = match control.property {
            Property::Elevation => PanelValue::Number(node.transform().position.y),
            Property::Visible => PanelValue::Bool(node.visible),
            Property::Wireframe => PanelValue::Bool(material(node, id)?.surface().wireframe),
            Property::Color => PanelValue::Color(material(node, id)?.surface().color),
            Property::Metalness => {
                let mut m = material(node, id)?.clone();
                PanelValue::Number(*m.metalness_mut().ok_or_else(|| control.unsupported())?)
            }
            Property::Roughness => {
                let mut m = material(node, id)?.clone();
                PanelValue::Number(*m.roughness_mut().ok_or_else(|| control.unsupported())?)
            }
            Property::Spin => PanelValue::Trigger,
        };
        Ok(value)
    }

    /// Write `value` through control `index` to every target. `now` is the
    /// loop's elapsed time, used to start tweens. Returns the value applied.
    pub fn apply(
        &self,
        index: usize,
        value: PanelValue,
        scene: &mut Scene,
        now: f64,
    ) -> Result<PanelValue, PanelError> {
        let control = self.control(index)?;
        if control.targets.is_empty() {
            return Err(PanelError::Unbound(control.label.clone()));
        }

        let applied = match (control.property, value) {
            (Property::Elevation | Property::Metalness | Property::Roughness, PanelValue::Number(v)) => {
                PanelValue::Number(control.quantize(v))
            }
            (Property::Visible | Property::Wireframe, PanelValue::Bool(_))
            | (Property::Color, PanelValue::Color(_))
            | (Property::Spin, PanelValue::Trigger) => value,
            (property, _) => {
                return Err(PanelError::TypeMismatch {
                    label: control.label.clone(),
                    expected: property.expected(),
                });
            }
        };

        for &id in &control.targets {
            write(control, id, applied, scene, now)?;
        }

        tracing::debug!(control = %control.label, ?applied, "panel value applied");
        Ok(applied)
    }
}

fn material(node: &Node, id: NodeId) -> Result<&Material, SceneError> {
    node.material().ok_or(SceneError::NoMaterial(id))
}

fn material_mut(scene: &mut Scene, id: NodeId) -> Result<&mut Material, SceneError> {
    scene
        .get_mut(id)
        .ok_or(SceneError::NodeNotFound(id))?
        .material_mut()
        .ok_or(SceneError::NoMaterial(id))
}

fn write(
    control: &Control,
    id: NodeId,
    value: PanelValue,
    scene: &mut Scene,
    now: f64,
) -> Result<(), PanelError> {
    match (control.property, value) {
        (Property::Elevation, PanelValue::Number(v)) => {
            let node = scene.get(id).ok_or(SceneError::NodeNotFound(id))?;
            let mut transform = *node.transform();
            transform.position.y = v;
            scene.set_transform(id, transform)?;
        }
        (Property::Visible, PanelValue::Bool(b)) => {
            scene.get_mut(id).ok_or(SceneError::NodeNotFound(id))?.visible = b;
        }
        (Property::Wireframe, PanelValue::Bool(b)) => {
            material_mut(scene, id)?.surface_mut().wireframe = b;
        }
        (Property::Color, PanelValue::Color(c)) => {
            material_mut(scene, id)?.surface_mut().color = c;
        }
        (Property::Metalness, PanelValue::Number(v)) => {
            *material_mut(scene, id)?
                .metalness_mut()
                .ok_or_else(|| control.unsupported())? = v;
        }
        (Property::Roughness, PanelValue::Number(v)) => {
            *material_mut(scene, id)?
                .roughness_mut()
                .ok_or_else(|| control.unsupported())? = v;
        }
        (Property::Spin, PanelValue::Trigger) => {
            let node = scene.get(id).ok_or(SceneError::NodeNotFound(id))?;
            let from = node.transform().rotation.y;
            scene.add_tween(Tween {
                node: id,
                property: TweenProperty::RotationY,
                from,
                to: from + std::f32::consts::TAU,
                start: now,
                duration: SPIN_DURATION,
            })?;
        }
        (property, _) => {
            return Err(PanelError::TypeMismatch {
                label: control.label.clone(),
                expected: property.expected(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_scene::Geometry;

    fn scene_with_cube() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let id = scene.add(Node::mesh(
            "cube",
            Geometry::cube(1.0),
            Material::standard(0.05, 0.95),
        ));
        (scene, id)
    }

    #[test]
    fn slider_clamps_and_snaps() {
        let (mut scene, id) = scene_with_cube();
        let panel =
            DebugPanel::new("debug").slider("elevation", Property::Elevation, &[id], -3.0, 3.0, 0.1);

        let applied = panel
            .apply(0, PanelValue::Number(1.234), &mut scene, 0.0)
            .unwrap();
        let PanelValue::Number(v) = applied else {
            panic!("expected number");
        };
        assert!((v - 1.2).abs() < 1e-5);
        assert!((scene.get(id).unwrap().transform().position.y - 1.2).abs() < 1e-5);

        panel
            .apply(0, PanelValue::Number(10.0), &mut scene, 0.0)
            .unwrap();
        assert_eq!(panel.read(0, &scene).unwrap(), PanelValue::Number(3.0));
    }

    #[test]
    fn inverted_slider_range_does_not_panic() {
        let (mut scene, id) = scene_with_cube();
        let panel =
            DebugPanel::new("debug").slider("elevation", Property::Elevation, &[id], 3.0, -3.0, 0.5);
        let applied = panel
            .apply(0, PanelValue::Number(1.0), &mut scene, 0.0)
            .unwrap();
        assert_eq!(applied, PanelValue::Number(-3.0));
    }

    #[test]
    fn toggles_and_color() {
        let (mut scene, id) = scene_with_cube();
        let panel = DebugPanel::new("debug")
            .toggle("visible", Property::Visible, &[id])
            .toggle("wireframe", Property::Wireframe, &[id])
            .color("color", &[id]);

        panel.apply(0, PanelValue::Bool(false), &mut scene, 0.0).unwrap();
        panel.apply(1, PanelValue::Bool(true), &mut scene, 0.0).unwrap();
        let gold = Color::from_hex(0xeab41f);
        panel.apply(2, PanelValue::Color(gold), &mut scene, 0.0).unwrap();

        assert_eq!(panel.read(0, &scene).unwrap(), PanelValue::Bool(false));
        assert_eq!(panel.read(1, &scene).unwrap(), PanelValue::Bool(true));
        assert_eq!(panel.read(2, &scene).unwrap(), PanelValue::Color(gold));
    }

    #[test]
    fn shared_slider_writes_every_target() {
        let mut scene = Scene::new();
        let ids: Vec<NodeId> = (0..3)
            .map(|i| {
                scene.add(Node::mesh(
                    format!("mesh{i}"),
                    Geometry::cube(1.0),
                    Material::standard(0.05, 0.95),
                ))
            })
            .collect();
        let panel = DebugPanel::new("debug")
            .slider("metalness", Property::Metalness, &ids, 0.0, 1.0, 0.01)
            .slider("roughness", Property::Roughness, &ids, 0.0, 1.0, 0.01);
        assert_eq!(panel.read(0, &scene).unwrap(), PanelValue::Number(0.95));

        panel.apply(1, PanelValue::Number(0.5), &mut scene, 0.0).unwrap();
        for id in &ids {
            let mut m = scene.get(*id).unwrap().material().unwrap().clone();
            assert_eq!(m.roughness_mut().copied(), Some(0.5));
        }
    }

    #[test]
    fn pbr_slider_on_basic_material_is_unsupported() {
        let mut scene = Scene::new();
        let id = scene.add(Node::mesh(
            "cube",
            Geometry::cube(1.0),
            Material::basic(Color::WHITE),
        ));
        let panel =
            DebugPanel::new("debug").slider("metalness", Property::Metalness, &[id], 0.0, 1.0, 0.01);
        let err = panel
            .apply(0, PanelValue::Number(0.5), &mut scene, 0.0)
            .unwrap_err();
        assert!(matches!(err, PanelError::Unsupported(_)));
    }

    #[test]
    fn spin_button_queues_full_turn() {
        let (mut scene, id) = scene_with_cube();
        let panel = DebugPanel::new("debug").button("spin", Property::Spin, &[id]);
        panel.apply(0, PanelValue::Trigger, &mut scene, 4.0).unwrap();
        assert_eq!(scene.tweens().len(), 1);

        scene.animate(4.0 + SPIN_DURATION);
        let y = scene.get(id).unwrap().animated().rotation.y;
        assert!((y - std::f32::consts::TAU).abs() < 1e-5);
        assert!(scene.tweens().is_empty());
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let (mut scene, id) = scene_with_cube();
        let panel = DebugPanel::new("debug").toggle("visible", Property::Visible, &[id]);
        let err = panel
            .apply(0, PanelValue::Number(1.0), &mut scene, 0.0)
            .unwrap_err();
        assert!(matches!(err, PanelError::TypeMismatch { expected: "bool", .. }));
        assert!(matches!(
            panel.read(3, &scene),
            Err(PanelError::NoSuchControl(3))
        ));
    }

    #[test]
    fn unbound_control_is_an_error() {
        let (mut scene, _) = scene_with_cube();
        let panel = DebugPanel::new("debug").toggle("visible", Property::Visible, &[]);
        assert!(matches!(
            panel.apply(0, PanelValue::Bool(true), &mut scene, 0.0),
            Err(PanelError::Unbound(_))
        ));
    }

    #[test]
    fn collapsed_flag() {
        let mut panel = DebugPanel::new("debug").collapsed(true);
        assert!(panel.is_collapsed());
        assert!(panel.is_empty());
        panel.set_collapsed(false);
        assert!(!panel.is_collapsed());
        assert_eq!(panel.title(), "debug");
    }
}
