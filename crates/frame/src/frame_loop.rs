use scenekit_render::Renderer;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::FrameError;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::stage::Stage;
use crate::timing::{FrameStats, FrameTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Stopped,
    Running { pending: FrameHandle },
}

/// What one frame callback did.
#[derive(Debug)]
pub struct FrameReport<O> {
    /// 1-based index of the rendered frame.
    pub frame: u64,
    pub elapsed: f64,
    /// Seconds since the previous frame's reading. Zero on the first frame.
    pub delta: f64,
    pub camera_moved: bool,
    pub output: O,
}

/// Owns the render cycle: clock, stage and the pending display callback.
///
/// Each accepted callback reads the clock, animates the scene, advances the
/// camera rig, renders once and re-arms itself with the scheduler.
pub struct FrameLoopController<C, R> {
    clock: C,
    stage: Stage<R>,
    state: LoopState,
    last_elapsed: f64,
    frames: u64,
    timer: FrameTimer,
}

impl<C: Clock, R: Renderer> FrameLoopController<C, R> {
    pub fn new(clock: C, stage: Stage<R>) -> Self {
        Self {
            clock,
            stage,
            state: LoopState::Stopped,
            last_elapsed: 0.0,
            frames: 0,
            timer: FrameTimer::default(),
        }
    }

    pub fn with_timer(mut self, timer: FrameTimer) -> Self {
        self.timer = timer;
        self
    }

    /// Request the first frame. Returns false if already running.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.is_running() {
            return false;
        }
        let pending = scheduler.request_frame();
        self.state = LoopState::Running { pending };
        tracing::info!(?pending, "frame loop started");
        true
    }

    /// Cancel the pending callback. Safe to call repeatedly; returns whether
    /// the loop was running.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        match self.state {
            LoopState::Running { pending } => {
                scheduler.cancel_frame(pending);
                self.state = LoopState::Stopped;
                tracing::info!(frames = self.frames, "frame loop stopped");
                true
            }
            LoopState::Stopped => false,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        match self.state {
            LoopState::Running { pending } => Some(pending),
            LoopState::Stopped => None,
        }
    }

    /// Last elapsed reading used by a frame.
    pub fn elapsed(&self) -> f64 {
        self.last_elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stats(&self) -> FrameStats {
        self.timer.stats(self.frames, self.last_elapsed)
    }

    pub fn stage(&self) -> &Stage<R> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage<R> {
        &mut self.stage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Handle a display-refresh callback.
    ///
    /// Returns `Ok(None)` for a stale handle or while stopped. A render error
    /// stops the loop, leaves nothing scheduled and is returned.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<Option<FrameReport<R::Output>>, FrameError> {
        let LoopState::Running { pending } = self.state else {
            tracing::trace!(?handle, "frame callback while stopped; ignored");
            return Ok(None);
        };
        if handle != pending {
            tracing::trace!(?handle, ?pending, "stale frame callback; ignored");
            return Ok(None);
        }

        let frame = self.frames + 1;
        let _span = tracing::trace_span!("frame", frame).entered();

        let elapsed = self.clock.elapsed().max(self.last_elapsed);
        let delta = elapsed - self.last_elapsed;
        self.last_elapsed = elapsed;

        self.stage.scene.animate(elapsed);
        let camera_moved = self.stage.update_rig(elapsed);
        if self.stage.sync_projection() {
            tracing::warn!(frame, "camera projection out of date; rebuilt before render");
        }

        let output = match self.stage.renderer.render(&self.stage.scene, &self.stage.camera) {
            Ok(output) => output,
            Err(e) => {
                self.state = LoopState::Stopped;
                tracing::error!(frame, error = %e, "render failed; frame loop stopped");
                return Err(FrameError::Render {
                    frame,
                    source: Box::new(e),
                });
            }
        };

        self.frames = frame;
        self.timer
            .record(Duration::try_from_secs_f64(delta).unwrap_or(Duration::MAX));
        let next = scheduler.request_frame();
        self.state = LoopState::Running { pending: next };
        tracing::trace!(elapsed, delta, camera_moved, "frame rendered");

        Ok(Some(FrameReport {
            frame,
            elapsed,
            delta,
            camera_moved,
            output,
        }))
    }

    /// Stop the loop and hand back the stage.
    pub fn dispose(mut self, scheduler: &mut dyn FrameScheduler) -> Stage<R> {
        self.stop(scheduler);
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::presets::{SceneSetup, ScenePreset};
    use crate::scheduler::ManualScheduler;
    use scenekit_common::ViewportSize;
    use scenekit_render::{Camera, DebugTextRenderer, RenderTarget};

    type TextLoop = FrameLoopController<ManualClock, DebugTextRenderer>;

    fn controller(preset: ScenePreset) -> TextLoop {
        let setup = preset.build(800.0 / 600.0).unwrap();
        FrameLoopController::new(ManualClock::new(), Stage::new(setup, DebugTextRenderer::default()))
    }

    fn pump(ctl: &mut TextLoop, sched: &mut ManualScheduler, dt: f64) -> FrameReport<String> {
        ctl.clock_mut().advance(dt);
        let handle = sched.take_pending().expect("a pending frame");
        ctl.on_frame(handle, sched).unwrap().expect("frame rendered")
    }

    #[test]
    fn each_frame_renders_once_and_reschedules() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::Materials);
        assert!(ctl.start(&mut sched));
        assert!(!ctl.start(&mut sched));
        assert_eq!(sched.pending_count(), 1);

        for i in 1..=3 {
            let report = pump(&mut ctl, &mut sched, 0.5);
            assert_eq!(report.frame, i);
            assert_eq!(sched.pending_count(), 1);
        }
        assert_eq!(ctl.stage().renderer.frames(), 3);
        assert_eq!(ctl.frames(), 3);
        assert_eq!(ctl.stats().samples, 3);
    }

    #[test]
    fn scene_motion_follows_elapsed_time() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::Materials);
        ctl.start(&mut sched);
        let report = pump(&mut ctl, &mut sched, 2.0);
        assert_eq!(report.elapsed, 2.0);

        let sphere = ctl.stage().scene.find_by_name("sphere").unwrap();
        let rot = ctl.stage().scene.get(sphere).unwrap().animated().rotation;
        assert!((rot.y - 0.2).abs() < 1e-6);
        assert!((rot.x - 0.3).abs() < 1e-6);
    }

    #[test]
    fn delta_is_difference_of_readings() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::TransformObjects);
        ctl.start(&mut sched);
        assert_eq!(pump(&mut ctl, &mut sched, 0.25).delta, 0.25);
        assert_eq!(pump(&mut ctl, &mut sched, 0.0).delta, 0.0);
        assert_eq!(pump(&mut ctl, &mut sched, 0.5).delta, 0.5);
    }

    #[test]
    fn huge_clock_jump_is_recorded_and_rescheduled() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::TransformObjects);
        ctl.start(&mut sched);
        pump(&mut ctl, &mut sched, 0.5);

        let report = pump(&mut ctl, &mut sched, 1e20);
        assert_eq!(report.frame, 2);
        assert!(report.delta > 1e19);
        assert_eq!(ctl.frames(), 2);
        assert_eq!(sched.pending_count(), 1);

        pump(&mut ctl, &mut sched, 0.5);
        let stats = ctl.stats();
        assert_eq!(stats.samples, 3);
        assert!(stats.max_ms.is_finite());
    }

    #[test]
    fn stop_is_idempotent_and_cancels() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::Cameras);
        ctl.start(&mut sched);
        let pending = ctl.pending().unwrap();

        assert!(ctl.stop(&mut sched));
        assert!(!ctl.stop(&mut sched));
        assert_eq!(sched.pending_count(), 0);
        assert!(!ctl.is_running());

        // The host delivered the cancelled callback anyway.
        assert!(ctl.on_frame(pending, &mut sched).unwrap().is_none());
        assert_eq!(ctl.stage().renderer.frames(), 0);
    }

    #[test]
    fn duplicate_wakeup_is_ignored() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::Cameras);
        ctl.start(&mut sched);
        let first = sched.take_pending().unwrap();
        assert!(ctl.on_frame(first, &mut sched).unwrap().is_some());
        assert!(ctl.on_frame(first, &mut sched).unwrap().is_none());
        assert_eq!(ctl.frames(), 1);
        assert_eq!(sched.pending_count(), 1);
    }

    #[test]
    fn stale_projection_is_rebuilt_before_render() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::Cameras);
        ctl.start(&mut sched);
        ctl.stage_mut().viewport = ViewportSize::new(1920, 1080);
        let report = pump(&mut ctl, &mut sched, 0.016);
        assert!(report.output.contains("Frame 1"));
        let camera = &ctl.stage().camera;
        assert!((camera.projection_aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    }

    struct FailingRenderer {
        target: RenderTarget,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("device lost")]
    struct DeviceLost;

    impl Renderer for FailingRenderer {
        type Output = ();
        type Error = DeviceLost;

        fn target(&self) -> &RenderTarget {
            &self.target
        }

        fn set_size(&mut self, size: ViewportSize) {
            self.target.set_size(size);
        }

        fn set_pixel_ratio(&mut self, ratio: f64) -> f64 {
            self.target.set_pixel_ratio(ratio)
        }

        fn render(
            &mut self,
            _scene: &scenekit_scene::Scene,
            _camera: &Camera,
        ) -> Result<(), DeviceLost> {
            Err(DeviceLost)
        }
    }

    #[test]
    fn render_error_aborts_the_chain() {
        let mut sched = ManualScheduler::new();
        let setup: SceneSetup = ScenePreset::Textures.build(1.0).unwrap();
        let renderer = FailingRenderer {
            target: RenderTarget::default(),
        };
        let mut ctl = FrameLoopController::new(ManualClock::new(), Stage::new(setup, renderer));
        ctl.start(&mut sched);
        let handle = sched.take_pending().unwrap();

        let err = ctl.on_frame(handle, &mut sched).unwrap_err();
        assert!(matches!(err, FrameError::Render { frame: 1, .. }));
        assert!(!ctl.is_running());
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(ctl.frames(), 0);
    }

    #[test]
    fn dispose_returns_stage_and_cancels() {
        let mut sched = ManualScheduler::new();
        let mut ctl = controller(ScenePreset::Geometries);
        ctl.start(&mut sched);
        let stage = ctl.dispose(&mut sched);
        assert_eq!(sched.pending_count(), 0);
        assert!(stage.scene.node_count() > 0);
    }
}
