// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Continuous zoom about the press point.
//!
//! The first tick of the drag activity records the view-space point under the
//! press. Every later tick scales the view about that point by a factor derived
//! from the horizontal distance between the pointer and the press, so zooming
//! continues while the pointer rests. Moving right zooms in, moving left zooms out.

use kurbo::Point;

use crate::drag_sequence::{DragPolicy, DragSequenceHandler, DragSession};
use crate::event::{InputEvent, MouseButton};
use crate::filter::EventFilter;
use crate::handler::HandlerContext;

/// Scale change per canvas pixel of horizontal displacement, per tick.
pub const ZOOM_SENSITIVITY: f64 = 0.001;

/// A handler that zooms the camera view.
pub type ZoomHandler = DragSequenceHandler<Zoom>;

/// Drag policy zooming the camera about the press point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Zoom {
    min_scale: f64,
    max_scale: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    view_zoom_point: Option<Point>,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            min_scale: 0.0,
            max_scale: f64::MAX,
            view_zoom_point: None,
        }
    }
}

impl Zoom {
    /// Unbounded zoom.
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest view scale zooming may reach.
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    /// Set the smallest view scale.
    pub fn set_min_scale(&mut self, scale: f64) {
        self.min_scale = scale;
    }

    /// Largest view scale zooming may reach. Zero or less means unbounded.
    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    /// Set the largest view scale.
    pub fn set_max_scale(&mut self, scale: f64) {
        self.max_scale = scale;
    }

    /// The view-space anchor of the current zoom.
    pub fn view_zoom_point(&self) -> Option<Point> {
        self.view_zoom_point
    }

    /// The factor to scale a view at `current_scale` by, for a horizontal
    /// displacement `dx` from the press.
    ///
    /// The resulting scale is clamped to `[min_scale, max_scale]` by choosing
    /// the factor that lands on the bound. Returns `None` when no positive
    /// factor exists, which would collapse the view.
    pub fn scale_factor(&self, current_scale: f64, dx: f64) -> Option<f64> {
        if current_scale.is_nan() || current_scale <= 0.0 {
            return None;
        }
        let mut factor = 1.0 + ZOOM_SENSITIVITY * dx;
        let new_scale = current_scale * factor;
        if new_scale < self.min_scale {
            factor = self.min_scale / current_scale;
        }
        if self.max_scale > 0.0 && new_scale > self.max_scale {
            factor = self.max_scale / current_scale;
        }
        (factor > 0.0).then_some(factor)
    }
}

impl DragPolicy for Zoom {
    fn default_filter(&self) -> EventFilter {
        EventFilter::with_and_mask(MouseButton::Secondary.mask())
    }

    fn end_drag(&mut self, _cx: &mut HandlerContext<'_>, _event: &InputEvent) {
        self.view_zoom_point = None;
    }

    fn cancel_drag(&mut self, _cx: &mut HandlerContext<'_>) {
        self.view_zoom_point = None;
    }

    fn activity_first_step(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &InputEvent,
        _session: &DragSession,
    ) {
        self.view_zoom_point = event.position(cx.scene());
    }

    fn activity_step(
        &mut self,
        cx: &mut HandlerContext<'_>,
        event: &InputEvent,
        session: &DragSession,
    ) {
        let (Some(camera), Some(anchor), Some(position)) = (
            event.camera(),
            self.view_zoom_point,
            event.canvas_position(),
        ) else {
            return;
        };
        let Some(current) = cx.scene().view_scale(camera) else {
            return;
        };
        let dx = position.x - session.press_canvas_point().x;
        if let Some(factor) = self.scale_factor(current, dx) {
            tracing::trace!(factor, "zoom step");
            cx.scene_mut().scale_view_about_point(camera, factor, anchor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Modifiers, PointerEvent, RawEvent};
    use crate::handler::{HandlerId, InputEventHandler};
    use crate::kind::EventKind;
    use alloc::rc::Rc;
    use kurbo::{Affine, Rect};
    use understory_scene::activity::ActivityScheduler;
    use understory_scene::{LocalNode, NodeId, PickPath, Scene};

    #[test]
    fn factor_follows_horizontal_displacement() {
        let zoom = Zoom::default();
        assert_eq!(zoom.scale_factor(1.0, 0.0), Some(1.0));
        assert_eq!(zoom.scale_factor(1.0, 1000.0), Some(2.0));
        assert_eq!(zoom.scale_factor(1.0, -500.0), Some(0.5));
        assert_eq!(zoom.scale_factor(0.0, 10.0), None);
        // Past -1000 pixels the factor would flip the view; the minimum of 0 cannot be reached.
        assert_eq!(zoom.scale_factor(1.0, -2000.0), None);
    }

    #[test]
    fn factor_lands_on_the_bounds() {
        let mut zoom = Zoom::default();
        zoom.set_min_scale(0.5);
        zoom.set_max_scale(4.0);
        for dx in [-1.0e6, -900.0, -10.0, 0.0, 10.0, 2500.0, 1.0e6] {
            for current in [0.5, 1.0, 3.0, 4.0] {
                let factor = zoom.scale_factor(current, dx).unwrap();
                let scale = current * factor;
                assert!(
                    (0.5 - 1e-12..=4.0 + 1e-12).contains(&scale),
                    "dx {dx} current {current} -> {scale}"
                );
            }
        }
        assert_eq!(zoom.scale_factor(2.0, 1.0e6), Some(2.0));
        assert_eq!(zoom.scale_factor(2.0, -1.0e6), Some(0.25));
    }

    #[test]
    fn non_positive_max_is_unbounded() {
        let mut zoom = Zoom::default();
        zoom.set_max_scale(0.0);
        assert_eq!(zoom.scale_factor(100.0, 1000.0), Some(2.0));
    }

    struct Fixture {
        scene: Scene,
        activities: ActivityScheduler<HandlerId>,
        interacting: u32,
        camera: NodeId,
        path: Rc<PickPath>,
        handler: ZoomHandler,
    }

    impl Fixture {
        fn new(press: Point) -> Self {
            let mut scene = Scene::new();
            let root = scene.insert(None, LocalNode::default());
            let layer = scene.insert(Some(root), LocalNode::default());
            let camera = scene.insert_camera(
                Some(root),
                LocalNode::with_bounds(Rect::new(0.0, 0.0, 400.0, 300.0)),
            );
            scene.add_layer(camera, layer);
            scene.set_view_transform(camera, Affine::translate((-30.0, 12.0)));
            let path = Rc::new(scene.pick(camera, press).unwrap());
            Self {
                scene,
                activities: ActivityScheduler::new(),
                interacting: 0,
                camera,
                path,
                handler: ZoomHandler::default(),
            }
        }

        fn send(&mut self, kind: EventKind, at: Point) {
            let mut p = PointerEvent::at(at);
            p.modifiers = Modifiers::BUTTON3;
            if kind != EventKind::MouseDragged {
                p.button = Some(MouseButton::Secondary);
            }
            let mut event = InputEvent::new(RawEvent::Pointer(p), Some(self.path.clone()));
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

        fn scale(&self) -> f64 {
            self.scene.view_scale(self.camera).unwrap()
        }

        fn on_canvas(&self, view_point: Point) -> Point {
            self.scene.view_transform(self.camera).unwrap() * view_point
        }
    }

    #[test]
    fn primary_button_does_not_zoom() {
        let mut fx = Fixture::new(Point::new(100.0, 100.0));
        let mut p = PointerEvent::at(Point::new(100.0, 100.0));
        p.modifiers = Modifiers::BUTTON1;
        p.button = Some(MouseButton::Primary);
        let mut event = InputEvent::new(RawEvent::Pointer(p), Some(fx.path.clone()));
        let mut cx = HandlerContext::new(
            &mut fx.scene,
            &mut fx.activities,
            &mut fx.interacting,
            HandlerId::from_raw(1),
            0,
        );
        fx.handler.handle(&mut cx, &mut event, EventKind::MousePressed);
        assert!(!fx.handler.is_dragging());
    }

    #[test]
    fn zoom_keeps_the_anchor_in_place() {
        let press = Point::new(100.0, 80.0);
        let mut fx = Fixture::new(press);
        fx.send(EventKind::MousePressed, press);
        fx.tick(0);
        let anchor = fx.handler.policy().view_zoom_point().unwrap();
        assert_eq!(anchor, Point::new(130.0, 68.0));
        assert_eq!(fx.on_canvas(anchor), press);

        fx.send(EventKind::MouseDragged, Point::new(300.0, 80.0));
        for now in [20, 40, 60] {
            let before = fx.scale();
            fx.tick(now);
            assert!((fx.scale() / before - 1.2).abs() < 1e-9);
            let drift = fx.on_canvas(anchor) - press;
            assert!(drift.hypot() < 1e-9, "anchor drifted by {drift:?}");
        }

        fx.send(EventKind::MouseReleased, Point::new(300.0, 80.0));
        assert_eq!(fx.handler.policy().view_zoom_point(), None);
        assert_eq!(fx.interacting, 0);
    }

    #[test]
    fn zoom_stays_within_bounds_for_large_displacements() {
        let press = Point::new(200.0, 150.0);
        for (target_x, bound) in [(1.0e7, 3.0), (-1.0e7, 0.25)] {
            let mut fx = Fixture::new(press);
            fx.handler.policy_mut().set_min_scale(0.25);
            fx.handler.policy_mut().set_max_scale(3.0);
            fx.send(EventKind::MousePressed, press);
            fx.send(EventKind::MouseDragged, Point::new(target_x, 150.0));
            for now in (0..200).step_by(20) {
                fx.tick(now);
                let scale = fx.scale();
                assert!((0.25 - 1e-9..=3.0 + 1e-9).contains(&scale), "scale {scale}");
            }
            assert!((fx.scale() - bound).abs() < 1e-9);
        }
    }
}
