use scenekit_render::Renderer;

use crate::stage::Stage;
use crate::viewport::DisplayHost;

/// Input and window notifications delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resized,
    DoubleClick,
    /// Pointer position in window coordinates (logical pixels).
    CursorMoved { x: f64, y: f64 },
    /// Primary-button drag, in logical pixels since the last event.
    PointerDrag { dx: f64, dy: f64 },
    /// Wheel steps; negative scrolls toward the scene.
    Wheel { delta: f64 },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Resized => EventKind::Resized,
            Self::DoubleClick => EventKind::DoubleClick,
            Self::CursorMoved { .. } => EventKind::CursorMoved,
            Self::PointerDrag { .. } => EventKind::PointerDrag,
            Self::Wheel { .. } => EventKind::Wheel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Resized,
    DoubleClick,
    CursorMoved,
    PointerDrag,
    Wheel,
}

/// Token returned by [`EventHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

type Handler<R> = Box<dyn FnMut(&HostEvent, &mut Stage<R>, &mut dyn DisplayHost)>;

/// Registry of host-event handlers. Handlers borrow the stage only for the
/// duration of one dispatch.
pub struct EventHub<R> {
    next_id: u64,
    handlers: Vec<(Subscription, Handler<R>)>,
}

impl<R> Default for EventHub<R> {
    fn default() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }
}

impl<R> EventHub<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&HostEvent, &mut Stage<R>, &mut dyn DisplayHost) + 'static,
    {
        self.next_id += 1;
        let sub = Subscription {
            id: self.next_id,
            kind,
        };
        self.handlers.push((sub, Box::new(handler)));
        tracing::debug!(?kind, id = sub.id, "handler subscribed");
        sub
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(s, _)| *s != sub);
        self.handlers.len() < before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler subscribed to the event's kind, in subscription
    /// order. Returns how many ran.
    pub fn dispatch(
        &mut self,
        event: &HostEvent,
        stage: &mut Stage<R>,
        host: &mut dyn DisplayHost,
    ) -> usize {
        let kind = event.kind();
        let mut ran = 0;
        for (sub, handler) in &mut self.handlers {
            if sub.kind == kind {
                handler(event, &mut *stage, &mut *host);
                ran += 1;
            }
        }
        tracing::trace!(?kind, ran, "event dispatched");
        ran
    }
}

/// Routes pointer events to the stage cursor and orbit controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerBinding {
    subscriptions: [Subscription; 3],
}

impl PointerBinding {
    pub fn attach<R: Renderer + 'static>(hub: &mut EventHub<R>) -> Self {
        let cursor = hub.subscribe(EventKind::CursorMoved, |event, stage, _| {
            if let HostEvent::CursorMoved { x, y } = *event {
                stage.set_cursor_client(x, y);
            }
        });
        let drag = hub.subscribe(EventKind::PointerDrag, |event, stage, _| {
            if let HostEvent::PointerDrag { dx, dy } = *event {
                let height = stage.viewport.height();
                if let Some(orbit) = stage.rig.orbit_mut() {
                    orbit.rotate_by_pixels(dx as f32, dy as f32, height);
                }
            }
        });
        let wheel = hub.subscribe(EventKind::Wheel, |event, stage, _| {
            if let HostEvent::Wheel { delta } = *event {
                if let Some(orbit) = stage.rig.orbit_mut() {
                    orbit.dolly(delta as f32);
                }
            }
        });
        Self {
            subscriptions: [cursor, drag, wheel],
        }
    }

    pub fn detach<R>(self, hub: &mut EventHub<R>) {
        for sub in self.subscriptions {
            hub.unsubscribe(sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ScenePreset;
    use crate::viewport::{ViewportSync, VirtualHost};
    use scenekit_common::ViewportSize;
    use scenekit_input::CursorPosition;
    use scenekit_render::DebugTextRenderer;
    use std::cell::Cell;
    use std::rc::Rc;

    fn stage(preset: ScenePreset) -> Stage<DebugTextRenderer> {
        Stage::new(preset.build(800.0 / 600.0).unwrap(), DebugTextRenderer::default())
    }

    #[test]
    fn dispatch_reaches_only_matching_kind() {
        let mut hub = EventHub::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        hub.subscribe(EventKind::Wheel, move |_, _, _| h.set(h.get() + 1));

        let mut stage = stage(ScenePreset::TransformObjects);
        let mut host = VirtualHost::new(800.0, 600.0, 1.0);
        assert_eq!(hub.dispatch(&HostEvent::Resized, &mut stage, &mut host), 0);
        assert_eq!(hub.dispatch(&HostEvent::Wheel { delta: 1.0 }, &mut stage, &mut host), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut hub: EventHub<DebugTextRenderer> = EventHub::new();
        let sub = hub.subscribe(EventKind::Resized, |_, _, _| {});
        assert_eq!(sub.kind(), EventKind::Resized);
        assert!(hub.unsubscribe(sub));
        assert!(!hub.unsubscribe(sub));
        assert!(hub.is_empty());
    }

    #[test]
    fn viewport_binding_handles_resize_and_double_click() {
        let mut hub = EventHub::new();
        let binding = ViewportSync::default().attach(&mut hub);
        let mut stage = stage(ScenePreset::Geometries);
        let mut host = VirtualHost::new(1920.0, 1080.0, 3.0);

        hub.dispatch(&HostEvent::Resized, &mut stage, &mut host);
        assert_eq!(stage.viewport, ViewportSize::new(1920, 1080));
        assert_eq!(stage.renderer.target().pixel_ratio(), 2.0);

        hub.dispatch(&HostEvent::DoubleClick, &mut stage, &mut host);
        assert!(host.fullscreen_path().is_some());

        binding.detach(&mut hub);
        assert!(hub.is_empty());
        hub.dispatch(&HostEvent::DoubleClick, &mut stage, &mut host);
        assert!(host.fullscreen_path().is_some());
    }

    #[test]
    fn pointer_binding_feeds_cursor_and_orbit() {
        let mut hub = EventHub::new();
        let binding = PointerBinding::attach(&mut hub);
        let mut stage = stage(ScenePreset::Cameras);
        let mut host = VirtualHost::new(800.0, 600.0, 1.0);

        hub.dispatch(&HostEvent::CursorMoved { x: 0.0, y: 0.0 }, &mut stage, &mut host);
        assert_eq!(stage.cursor, CursorPosition { x: -0.5, y: 0.5 });

        hub.dispatch(&HostEvent::PointerDrag { dx: 60.0, dy: 0.0 }, &mut stage, &mut host);
        let orbit = stage.rig.orbit_mut().unwrap();
        assert!(orbit.velocity().0 != 0.0);

        binding.detach(&mut hub);
        assert!(hub.is_empty());
    }
}
