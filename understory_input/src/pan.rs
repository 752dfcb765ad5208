// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Panning the camera view, with edge-triggered auto-pan.
//!
//! While dragging, the view follows the pointer as long as the pointer stays
//! inside the camera's view bounds. Once the pointer leaves the camera, every
//! tick of the drag activity pans the view towards the crossed edges, faster
//! the further the pointer is past the edge, clamped between the minimum and
//! maximum auto-pan speeds.

use kurbo::Vec2;

use crate::drag_sequence::{DragPolicy, DragSequenceHandler, DragSession};
use crate::event::{InputEvent, Modifiers};
use crate::filter::EventFilter;
use crate::handler::HandlerContext;

/// Default lower bound of the auto-pan speed, in pixels per second.
pub const DEFAULT_MIN_AUTOPAN_SPEED: f64 = 250.0;

/// Default upper bound of the auto-pan speed, in pixels per second.
pub const DEFAULT_MAX_AUTOPAN_SPEED: f64 = 750.0;

/// A handler that pans the camera view.
pub type PanHandler = DragSequenceHandler<Pan>;

/// Drag policy panning the camera under the pointer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pan {
    autopan: bool,
    min_autopan_speed: f64,
    max_autopan_speed: f64,
}

impl Default for Pan {
    fn default() -> Self {
        Self {
            autopan: true,
            min_autopan_speed: DEFAULT_MIN_AUTOPAN_SPEED,
            max_autopan_speed: DEFAULT_MAX_AUTOPAN_SPEED,
        }
    }
}

impl Pan {
    /// Panning with auto-pan at the default speeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the view pans on its own while the pointer is outside the camera.
    pub fn autopan(&self) -> bool {
        self.autopan
    }

    /// Enable or disable auto-pan.
    pub fn set_autopan(&mut self, autopan: bool) {
        self.autopan = autopan;
    }

    /// Lower bound of the auto-pan speed, in pixels per second.
    pub fn min_autopan_speed(&self) -> f64 {
        self.min_autopan_speed
    }

    /// Set the lower bound of the auto-pan speed.
    pub fn set_min_autopan_speed(&mut self, speed: f64) {
        self.min_autopan_speed = speed;
    }

    /// Upper bound of the auto-pan speed, in pixels per second.
    pub fn max_autopan_speed(&self) -> f64 {
        self.max_autopan_speed
    }

    /// Set the upper bound of the auto-pan speed.
    pub fn set_max_autopan_speed(&mut self, speed: f64) {
        self.max_autopan_speed = speed;
    }

    /// Clamp a per-step pan distance to the configured speeds.
    ///
    /// The speeds are converted to per-step distances using `step_rate`
    /// (milliseconds per step). The result keeps the sign of `delta`, with zero
    /// counting as positive; its magnitude lies in
    /// `[min_autopan_speed / steps_per_second, max_autopan_speed / steps_per_second]`
    /// (the upper bound wins if the two cross).
    pub fn validate_panning_speed(&self, delta: f64, step_rate: u64) -> f64 {
        let steps_per_second = 1000.0 / step_rate.max(1) as f64;
        let min_delta = self.min_autopan_speed / steps_per_second;
        let max_delta = self.max_autopan_speed / steps_per_second;
        let magnitude = delta.abs().max(min_delta).min(max_delta);
        if delta < 0.0 { -magnitude } else { magnitude }
    }
}

impl DragPolicy for Pan {
    fn default_filter(&self) -> EventFilter {
        EventFilter::with_and_mask(Modifiers::BUTTON1)
    }

    fn drag(&mut self, cx: &mut HandlerContext<'_>, event: &InputEvent) {
        let Some(camera) = event.camera() else {
            return;
        };
        let scene = cx.scene();
        let (Some(position), Some(view_bounds), Some(delta)) = (
            event.position(scene),
            scene.view_bounds(camera),
            event.delta(scene),
        ) else {
            return;
        };
        if view_bounds.contains(position) {
            cx.scene_mut().translate_view(camera, delta.x, delta.y);
        }
    }

    fn activity_step(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &InputEvent,
        session: &DragSession,
    ) {
        if !self.autopan {
            return;
        }
        let Some(camera) = event.camera() else {
            return;
        };
        let scene = cx.scene();
        let (Some(local), Some(bounds)) = (
            event.position_relative_to(scene, camera),
            scene.local_bounds(camera),
        ) else {
            return;
        };
        // Read the rate from the live activity on every step; it may be retargeted mid-drag.
        let step_rate = session
            .activity()
            .and_then(|id| cx.activity_step_rate(id))
            .unwrap_or(session.step_rate());

        let speed = |d: f64| self.validate_panning_speed(d, step_rate);
        let mut delta = Vec2::ZERO;
        if local.y < bounds.y0 {
            delta.y = speed(-1.0 - 0.5 * (local.y - bounds.y0).abs());
        } else if local.y > bounds.y1 {
            delta.y = speed(1.0 + 0.5 * (local.y - bounds.y1).abs());
        }
        if local.x > bounds.x1 {
            delta.x = speed(1.0 + 0.5 * (local.x - bounds.x1).abs());
        } else if local.x < bounds.x0 {
            delta.x = speed(-1.0 - 0.5 * (local.x - bounds.x0).abs());
        }

        let Some(delta) = scene.local_to_view_vec(camera, delta) else {
            return;
        };
        if delta != Vec2::ZERO {
            tracing::trace!(dx = delta.x, dy = delta.y, "autopan");
            cx.scene_mut().translate_view(camera, delta.x, delta.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MouseButton, PointerEvent, RawEvent};
    use crate::handler::{HandlerId, InputEventHandler};
    use crate::kind::EventKind;
    use alloc::rc::Rc;
    use kurbo::{Affine, Point, Rect};
    use understory_scene::activity::ActivityScheduler;
    use understory_scene::{LocalNode, NodeId, PickPath, Scene};

    #[test]
    fn panning_speed_is_clamped_and_keeps_its_sign() {
        let pan = Pan::default();
        // 20 ms steps: 50 steps per second, so 5..=15 pixels per step.
        let inputs = [
            -1.0e9, -100.0, -15.0, -14.9, -5.0, -1.0, -1.0e-12, 0.0, 1.0e-12, 1.0, 5.0, 9.0, 15.0,
            16.0, 1.0e9,
        ];
        for d in inputs {
            let v = pan.validate_panning_speed(d, 20);
            assert!((5.0..=15.0).contains(&v.abs()), "{d} -> {v}");
            assert_eq!(v < 0.0, d < 0.0, "{d} -> {v}");
        }
        assert_eq!(pan.validate_panning_speed(9.0, 20), 9.0);
        assert_eq!(pan.validate_panning_speed(-100.0, 20), -15.0);
        assert_eq!(pan.validate_panning_speed(0.0, 20), 5.0);
        assert_eq!(pan.validate_panning_speed(-1.0, 20), -5.0);
        // Slower steps cover more ground each.
        assert_eq!(pan.validate_panning_speed(100.0, 40), 30.0);
    }

    #[test]
    fn crossed_speed_bounds_settle_on_the_maximum() {
        let mut pan = Pan::default();
        pan.set_min_autopan_speed(900.0);
        pan.set_max_autopan_speed(300.0);
        assert_eq!(pan.validate_panning_speed(1.0, 20), 6.0);
        assert_eq!(pan.validate_panning_speed(-100.0, 20), -6.0);
        assert_eq!(pan.validate_panning_speed(0.0, 20), 6.0);
    }

    struct Fixture {
        scene: Scene,
        activities: ActivityScheduler<HandlerId>,
        interacting: u32,
        camera: NodeId,
        path: Rc<PickPath>,
        handler: PanHandler,
    }

    impl Fixture {
        fn new(view: Affine) -> Self {
            let mut scene = Scene::new();
            let root = scene.insert(None, LocalNode::default());
            let layer = scene.insert(Some(root), LocalNode::default());
            let camera = scene.insert_camera(
                Some(root),
                LocalNode::with_bounds(Rect::new(0.0, 0.0, 400.0, 300.0)),
            );
            scene.add_layer(camera, layer);
            scene.set_view_transform(camera, view);
            let path = Rc::new(scene.pick(camera, Point::new(100.0, 100.0)).unwrap());
            Self {
                scene,
                activities: ActivityScheduler::new(),
                interacting: 0,
                camera,
                path,
                handler: PanHandler::default(),
            }
        }

        fn send(&mut self, kind: EventKind, at: Point, delta: Vec2) {
            let mut p = PointerEvent::at(at);
            p.modifiers = Modifiers::BUTTON1;
            if kind != EventKind::MouseDragged {
                p.button = Some(MouseButton::Primary);
            }
            let mut event = InputEvent::new(RawEvent::Pointer(p), Some(self.path.clone()))
                .with_canvas_delta(delta);
            let mut cx = HandlerContext::new(
                &mut self.scene,
                &mut self.activities,
                &mut self.interacting,
                HandlerId::from_raw(1),
                0,
            );
            self.handler.handle(&mut cx, &mut event, kind);
        }

        fn tick(&mut self, now: u64) {
            for step in self.activities.process(now) {
                let mut cx = HandlerContext::new(
                    &mut self.scene,
                    &mut self.activities,
                    &mut self.interacting,
                    step.owner,
                    now,
                );
                self.handler.activity_step(&mut cx, &step);
            }
        }

        fn view_offset(&self) -> Vec2 {
            self.scene.view_transform(self.camera).unwrap().translation()
        }
    }

    #[test]
    fn drag_inside_the_camera_follows_the_pointer() {
        let mut fx = Fixture::new(Affine::scale(2.0));
        fx.send(EventKind::MousePressed, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.send(EventKind::MouseDragged, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.send(EventKind::MouseDragged, Point::new(110.0, 106.0), Vec2::new(10.0, 6.0));
        // A canvas delta of (10, 6) is (5, 3) in view space; the view scale turns it back into (10, 6).
        assert_eq!(fx.view_offset(), Vec2::new(10.0, 6.0));
    }

    #[test]
    fn drag_outside_the_view_bounds_does_not_translate() {
        let mut fx = Fixture::new(Affine::IDENTITY);
        fx.handler.policy_mut().set_autopan(false);
        fx.send(EventKind::MousePressed, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.send(EventKind::MouseDragged, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.send(EventKind::MouseDragged, Point::new(450.0, 100.0), Vec2::new(350.0, 0.0));
        fx.tick(0);
        fx.tick(20);
        assert_eq!(fx.view_offset(), Vec2::ZERO);
    }

    #[test]
    fn autopan_is_edge_triggered() {
        let mut fx = Fixture::new(Affine::IDENTITY);
        fx.send(EventKind::MousePressed, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.tick(0);
        fx.tick(20);
        assert_eq!(fx.view_offset(), Vec2::ZERO, "no edge crossed, no motion");

        // Past the right edge by 50 and above the top edge by 4.
        fx.send(EventKind::MouseDragged, Point::new(450.0, -4.0), Vec2::new(350.0, -104.0));
        let after_drag = fx.view_offset();
        assert_eq!(after_drag, Vec2::ZERO, "pointer outside the view bounds");

        fx.tick(40);
        // x: 1 + 25 clamps to 15; y: -(1 + 2) = -3 clamps to -5.
        assert_eq!(fx.view_offset(), Vec2::new(15.0, -5.0));
        fx.tick(60);
        assert_eq!(fx.view_offset(), Vec2::new(30.0, -10.0));

        fx.send(EventKind::MouseReleased, Point::new(450.0, -4.0), Vec2::ZERO);
        fx.tick(80);
        assert_eq!(fx.view_offset(), Vec2::new(30.0, -10.0));
        assert_eq!(fx.interacting, 0);
    }

    #[test]
    fn autopan_follows_a_retargeted_step_rate() {
        let mut fx = Fixture::new(Affine::IDENTITY);
        fx.send(EventKind::MousePressed, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.send(EventKind::MouseDragged, Point::new(-200.0, 100.0), Vec2::new(-300.0, 0.0));
        let id = fx.handler.session().activity().unwrap();
        fx.activities.set_step_rate(id, 40);
        fx.tick(0);
        // 40 ms steps allow up to 30 pixels per step.
        assert_eq!(fx.view_offset(), Vec2::new(-30.0, 0.0));
    }

    #[test]
    fn autopan_delta_is_mapped_into_view_space() {
        let mut fx = Fixture::new(Affine::scale(2.0));
        fx.send(EventKind::MousePressed, Point::new(100.0, 100.0), Vec2::ZERO);
        fx.send(EventKind::MouseDragged, Point::new(100.0, 400.0), Vec2::new(0.0, 300.0));
        fx.tick(0);
        // 15 camera pixels are 7.5 view units, scaled back by 2 on screen.
        assert_eq!(fx.view_offset(), Vec2::new(0.0, 15.0));
    }
}
