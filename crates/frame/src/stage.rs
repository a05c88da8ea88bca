use scenekit_common::ViewportSize;
use scenekit_input::{CameraRig, CursorPosition};
use scenekit_render::{Camera, Renderer};
use scenekit_scene::Scene;
use scenekit_tools::DebugPanel;

use crate::presets::SceneSetup;

/// Everything one running scene owns.
///
/// The frame loop owns the stage and lends it to event handlers between frames.
pub struct Stage<R> {
    pub scene: Scene,
    pub camera: Camera,
    pub rig: CameraRig,
    pub panel: DebugPanel,
    pub viewport: ViewportSize,
    pub cursor: CursorPosition,
    pub renderer: R,
}

impl<R: Renderer> Stage<R> {
    /// Assemble a stage sized to the renderer's current target.
    pub fn new(setup: SceneSetup, renderer: R) -> Self {
        let viewport = renderer.target().size();
        let mut stage = Self {
            scene: setup.scene,
            camera: setup.camera,
            rig: setup.rig,
            panel: setup.panel,
            viewport,
            cursor: CursorPosition::default(),
            renderer,
        };
        stage.sync_projection();
        stage
    }

    /// Bring the camera's aspect and cached projection in line with the
    /// viewport. Returns whether anything changed.
    pub fn sync_projection(&mut self) -> bool {
        let aspect = self.viewport.aspect_ratio();
        if self.camera.aspect() == aspect && self.camera.is_projection_current() {
            return false;
        }
        self.camera.set_aspect(aspect);
        self.camera.update_projection();
        true
    }

    /// Advance the camera rig. Returns whether the camera moved.
    pub fn update_rig(&mut self, elapsed: f64) -> bool {
        let Self {
            camera, rig, cursor, ..
        } = self;
        rig.update(&mut camera.position, &mut camera.target, *cursor, elapsed)
    }

    /// Record a pointer position in window coordinates.
    pub fn set_cursor_client(&mut self, x: f64, y: f64) {
        self.cursor = CursorPosition::from_client(x, y, self.viewport);
    }
}
