// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dragging nodes around with the primary button.

use understory_scene::NodeId;

use crate::drag_sequence::{DragPolicy, DragSequenceHandler};
use crate::event::{InputEvent, Modifiers};
use crate::filter::EventFilter;
use crate::handler::HandlerContext;

/// A handler that moves the picked node with the pointer.
pub type DragHandler = DragSequenceHandler<DragNode>;

/// Drag policy moving the node under the press.
///
/// Presses on the top camera itself (empty canvas) never start a drag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DragNode {
    raise_to_top_on_press: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    dragged_node: Option<NodeId>,
}

impl DragNode {
    /// A policy that leaves paint order alone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the dragged node is raised above its siblings when the drag starts.
    pub fn raise_to_top_on_press(&self) -> bool {
        self.raise_to_top_on_press
    }

    /// Set whether the dragged node is raised above its siblings when the drag starts.
    pub fn set_raise_to_top_on_press(&mut self, raise: bool) {
        self.raise_to_top_on_press = raise;
    }

    /// The node being dragged.
    pub fn dragged_node(&self) -> Option<NodeId> {
        self.dragged_node
    }
}

impl DragPolicy for DragNode {
    fn default_filter(&self) -> EventFilter {
        EventFilter::with_and_mask(Modifiers::BUTTON1)
    }

    fn should_start_drag(&self, _cx: &HandlerContext<'_>, event: &InputEvent) -> bool {
        let picked = event.picked_node();
        picked.is_some() && picked != event.top_camera()
    }

    fn start_drag(&mut self, cx: &mut HandlerContext<'_>, event: &InputEvent) {
        self.dragged_node = event.picked_node();
        if self.raise_to_top_on_press
            && let Some(node) = self.dragged_node
        {
            cx.scene_mut().raise_to_top(node);
        }
    }

    fn drag(&mut self, cx: &mut HandlerContext<'_>, event: &InputEvent) {
        let Some(node) = self.dragged_node else {
            return;
        };
        let scene = cx.scene();
        let Some(delta) = event
            .delta_relative_to(scene, node)
            .and_then(|d| scene.local_to_parent_vec(node, d))
        else {
            return;
        };
        cx.scene_mut().offset(node, delta.x, delta.y);
    }

    fn end_drag(&mut self, _cx: &mut HandlerContext<'_>, _event: &InputEvent) {
        self.dragged_node = None;
    }

    fn cancel_drag(&mut self, _cx: &mut HandlerContext<'_>) {
        self.dragged_node = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MouseButton, PointerEvent, RawEvent};
    use crate::handler::{HandlerId, InputEventHandler};
    use crate::kind::EventKind;
    use alloc::rc::Rc;
    use kurbo::{Affine, Point, Rect, Vec2};
    use understory_scene::activity::ActivityScheduler;
    use understory_scene::{LocalNode, PickPath, Scene};

    struct Fixture {
        scene: Scene,
        activities: ActivityScheduler<HandlerId>,
        interacting: u32,
        camera: NodeId,
        layer: NodeId,
        handler: DragHandler,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = Scene::new();
            let root = scene.insert(None, LocalNode::default());
            let layer = scene.insert(Some(root), LocalNode::default());
            let camera = scene.insert_camera(
                Some(root),
                LocalNode::with_bounds(Rect::new(0.0, 0.0, 400.0, 300.0)),
            );
            scene.add_layer(camera, layer);
            Self {
                scene,
                activities: ActivityScheduler::new(),
                interacting: 0,
                camera,
                layer,
                handler: DragHandler::default(),
            }
        }

        fn send(
            &mut self,
            kind: EventKind,
            path: &Rc<PickPath>,
            at: Point,
            delta: Vec2,
            modifiers: Modifiers,
        ) {
            let mut p = PointerEvent::at(at);
            p.modifiers = modifiers;
            if kind != EventKind::MouseDragged {
                p.button = Some(MouseButton::Primary);
            }
            let mut event =
                InputEvent::new(RawEvent::Pointer(p), Some(path.clone())).with_canvas_delta(delta);
            let mut cx = HandlerContext::new(
                &mut self.scene,
                &mut self.activities,
                &mut self.interacting,
                HandlerId::from_raw(1),
                0,
            );
            self.handler.handle(&mut cx, &mut event, kind);
        }

        fn drag_sequence(&mut self, from: Point, to: Point) {
            let path = Rc::new(self.scene.pick(self.camera, from).unwrap());
            self.send(EventKind::MousePressed, &path, from, Vec2::ZERO, Modifiers::BUTTON1);
            self.send(EventKind::MouseDragged, &path, to, to - from, Modifiers::BUTTON1);
            self.send(EventKind::MouseReleased, &path, to, Vec2::ZERO, Modifiers::BUTTON1);
        }
    }

    #[test]
    fn drags_the_picked_node_through_a_zoomed_view() {
        let mut fx = Fixture::new();
        let node = fx.scene.insert(
            Some(fx.layer),
            LocalNode::with_bounds(Rect::new(0.0, 0.0, 20.0, 20.0)),
        );
        // Scaled node in a zoomed, panned view.
        fx.scene
            .set_local_transform(node, Affine::translate((10.0, 10.0)) * Affine::scale(0.5));
        fx.scene
            .set_view_transform(fx.camera, Affine::scale(2.0) * Affine::translate((5.0, 0.0)));

        let press = Point::new(40.0, 30.0);
        let canvas_before = (fx.scene.view_transform(fx.camera).unwrap()
            * fx.scene.world_transform(node).unwrap())
            * Point::ZERO;

        fx.drag_sequence(press, Point::new(52.0, 22.0));

        let canvas_after = (fx.scene.view_transform(fx.camera).unwrap()
            * fx.scene.world_transform(node).unwrap())
            * Point::ZERO;
        let moved = canvas_after - canvas_before;
        assert!((moved.x - 12.0).abs() < 1e-9, "moved {moved:?}");
        assert!((moved.y + 8.0).abs() < 1e-9, "moved {moved:?}");
        assert_eq!(fx.handler.policy().dragged_node(), None);
        assert!(!fx.handler.is_dragging());
    }

    #[test]
    fn presses_on_the_camera_do_not_drag() {
        let mut fx = Fixture::new();
        let before = fx.scene.view_transform(fx.camera);
        fx.drag_sequence(Point::new(100.0, 100.0), Point::new(150.0, 100.0));
        assert_eq!(fx.handler.policy().dragged_node(), None);
        assert_eq!(fx.interacting, 0);
        assert_eq!(fx.scene.view_transform(fx.camera), before);
    }

    #[test]
    fn only_the_primary_button_drags() {
        let mut fx = Fixture::new();
        let node = fx.scene.insert(
            Some(fx.layer),
            LocalNode::with_bounds(Rect::new(0.0, 0.0, 20.0, 20.0)),
        );
        let path = Rc::new(fx.scene.pick(fx.camera, Point::new(5.0, 5.0)).unwrap());
        fx.send(
            EventKind::MousePressed,
            &path,
            Point::new(5.0, 5.0),
            Vec2::ZERO,
            Modifiers::BUTTON3,
        );
        assert!(!fx.handler.is_dragging());
        assert_eq!(fx.scene.local_transform(node), Some(Affine::IDENTITY));
    }

    #[test]
    fn raise_to_top_on_press() {
        let mut fx = Fixture::new();
        let bottom = fx.scene.insert(
            Some(fx.layer),
            LocalNode::with_bounds(Rect::new(0.0, 0.0, 20.0, 20.0)),
        );
        let top = fx.scene.insert(
            Some(fx.layer),
            LocalNode::with_bounds(Rect::new(50.0, 50.0, 70.0, 70.0)),
        );
        fx.handler.policy_mut().set_raise_to_top_on_press(true);
        fx.drag_sequence(Point::new(5.0, 5.0), Point::new(6.0, 5.0));
        assert_eq!(fx.scene.children_of(fx.layer), &[top, bottom]);
    }
}
