// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The input manager: host input in, handler calls out.
//!
//! A [`Canvas`] owns a [`Scene`] with a root, one layer and a top camera
//! looking at it, plus everything routing needs: the handler registry, the
//! activity scheduler, the interaction count, and pointer and keyboard focus.
//!
//! ## Routing
//!
//! - A press picks under the pointer. The first press of a gesture captures the
//!   path as the *mouse focus*; drags, the release and the synthesized click go
//!   to it even when the pointer has left the pressed node.
//! - Moves go to the path under the pointer (the *mouse over*). Whenever the
//!   node under the pointer changes, the old path gets `MouseExited` and the new
//!   one `MouseEntered`, before the event that caused the change.
//! - Wheel events go to the path under the pointer.
//! - Key and keyboard focus events go to the single handler holding keyboard
//!   focus, carrying the mouse-over path for coordinate queries.
//!
//! Along a path, handlers run on the picked node first and then on each
//! ancestor up to the top camera; on one node, in registration order. Marking
//! an event handled never stops delivery.
//!
//! Pointer events carry the host's keyboard modifiers. Presses, releases and
//! clicks add only their own button; moves, drags, crossings and wheel events
//! add every button currently held.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::Any;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;
use understory_scene::activity::{ActivityScheduler, StepPhase};
use understory_scene::{Damage, LocalNode, NodeId, PickPath, Scene};

use crate::click::{ClickResult, ClickTracker};
use crate::drag_sequence::DragSequenceHandler;
use crate::error::InputError;
use crate::event::{
    InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent, RawEvent, ScrollKind, WheelEvent,
};
use crate::handler::{HandlerContext, HandlerId, InputEventHandler};
use crate::kind::EventKind;
use crate::pan::Pan;
use crate::zoom::Zoom;

/// How the host should render, given the interaction state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderQuality {
    /// Nothing is being manipulated.
    High,
    /// Some drag is in progress; favor speed.
    Low,
}

struct Registered {
    node: NodeId,
    handler: Box<dyn InputEventHandler>,
}

/// Scene, handlers, and input state of one drawing surface.
pub struct Canvas {
    scene: Scene,
    root: NodeId,
    layer: NodeId,
    camera: NodeId,
    activities: ActivityScheduler<HandlerId>,
    handlers: HashMap<HandlerId, Registered>,
    listeners: HashMap<NodeId, SmallVec<[HandlerId; 2]>>,
    next_handler: u32,
    interacting: u32,
    now: u64,
    buttons_down: Modifiers,
    last_canvas_position: Option<Point>,
    mouse_over: Option<Rc<PickPath>>,
    mouse_focus: Option<Rc<PickPath>>,
    keyboard_focus: Option<HandlerId>,
    click: ClickTracker<NodeId>,
    pan_handler: Option<HandlerId>,
    zoom_handler: Option<HandlerId>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("camera", &self.camera)
            .field("handlers", &self.handlers.len())
            .field("activities", &self.activities.len())
            .field("interacting", &self.interacting)
            .field("buttons_down", &self.buttons_down)
            .field("keyboard_focus", &self.keyboard_focus)
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// A canvas whose camera covers `viewport`, with the default pan (primary
    /// button) and zoom (secondary button) handlers on the camera.
    pub fn new(viewport: Rect) -> Self {
        let mut canvas = Self::empty(viewport);
        let camera = canvas.camera;
        canvas.pan_handler =
            Some(canvas.add_input_handler(camera, DragSequenceHandler::new(Pan::default())));
        canvas.zoom_handler =
            Some(canvas.add_input_handler(camera, DragSequenceHandler::new(Zoom::default())));
        canvas
    }

    /// A canvas whose camera covers `viewport`, with no handlers.
    pub fn empty(viewport: Rect) -> Self {
        let mut scene = Scene::new();
        let root = scene.insert(None, LocalNode::default());
        let layer = scene.insert(Some(root), LocalNode::default());
        let camera = scene.insert_camera(Some(root), LocalNode::with_bounds(viewport));
        scene.add_layer(camera, layer);
        Self {
            scene,
            root,
            layer,
            camera,
            activities: ActivityScheduler::new(),
            handlers: HashMap::new(),
            listeners: HashMap::new(),
            next_handler: 1,
            interacting: 0,
            now: 0,
            buttons_down: Modifiers::empty(),
            last_canvas_position: None,
            mouse_over: None,
            mouse_focus: None,
            keyboard_focus: None,
            click: ClickTracker::new(),
            pan_handler: None,
            zoom_handler: None,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The root node; the layer and the camera are its children.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The layer the camera views. Put content here.
    pub fn layer(&self) -> NodeId {
        self.layer
    }

    /// The top camera. Its parent space is canvas space.
    pub fn camera(&self) -> NodeId {
        self.camera
    }

    /// The default pan handler, if this canvas has one.
    pub fn pan_handler(&self) -> Option<HandlerId> {
        self.pan_handler
    }

    /// The default zoom handler, if this canvas has one.
    pub fn zoom_handler(&self) -> Option<HandlerId> {
        self.zoom_handler
    }

    /// Returns true while any drag holds the interaction count.
    pub fn is_interacting(&self) -> bool {
        self.interacting > 0
    }

    /// Number of interaction holds outstanding.
    pub fn interaction_count(&self) -> u32 {
        self.interacting
    }

    /// Render quality suited to the interaction state.
    pub fn render_quality(&self) -> RenderQuality {
        if self.is_interacting() {
            RenderQuality::Low
        } else {
            RenderQuality::High
        }
    }

    /// Damage accumulated in the scene since the previous call.
    pub fn take_damage(&mut self) -> Damage {
        self.scene.take_damage()
    }

    /// The click tracker, for tuning its thresholds.
    pub fn click_tracker_mut(&mut self) -> &mut ClickTracker<NodeId> {
        &mut self.click
    }

    /// The path under the pointer.
    pub fn mouse_over(&self) -> Option<&PickPath> {
        self.mouse_over.as_deref()
    }

    /// The path captured by the current press gesture.
    pub fn mouse_focus(&self) -> Option<&PickPath> {
        self.mouse_focus.as_deref()
    }

    // --- handler registry ---

    /// Attach a handler to `node`. Handlers on one node run in the order they were added.
    pub fn add_input_handler(&mut self, node: NodeId, handler: impl InputEventHandler) -> HandlerId {
        self.add_boxed_input_handler(node, Box::new(handler))
    }

    /// Attach an already boxed handler to `node`.
    pub fn add_boxed_input_handler(
        &mut self,
        node: NodeId,
        handler: Box<dyn InputEventHandler>,
    ) -> HandlerId {
        let id = HandlerId::from_raw(self.next_handler);
        self.next_handler += 1;
        self.handlers.insert(id, Registered { node, handler });
        self.listeners.entry(node).or_default().push(id);
        tracing::debug!(handler = id.get(), ?node, "added input handler");
        id
    }

    /// Detach a handler and hand it back.
    ///
    /// The handler is cancelled first, so a drag in progress releases its
    /// interaction hold; activities it still owns are then terminated.
    pub fn remove_input_handler(&mut self, id: HandlerId) -> Option<Box<dyn InputEventHandler>> {
        let mut registered = self.handlers.remove(&id)?;
        if let Some(ids) = self.listeners.get_mut(&registered.node) {
            ids.retain(|h| *h != id);
            if ids.is_empty() {
                self.listeners.remove(&registered.node);
            }
        }
        {
            let mut cx = HandlerContext::new(
                &mut self.scene,
                &mut self.activities,
                &mut self.interacting,
                id,
                self.now,
            );
            registered.handler.cancel(&mut cx);
        }
        let _ = self.activities.terminate_owned_by(id);
        if self.keyboard_focus == Some(id) {
            self.keyboard_focus = None;
        }
        if self.pan_handler == Some(id) {
            self.pan_handler = None;
        }
        if self.zoom_handler == Some(id) {
            self.zoom_handler = None;
        }
        tracing::debug!(handler = id.get(), "removed input handler");
        Some(registered.handler)
    }

    /// Remove a node and its subtree from the scene, detaching every handler on them.
    pub fn remove_node(&mut self, node: NodeId) {
        self.scene.remove(node);
        let dead: SmallVec<[HandlerId; 4]> = self
            .handlers
            .iter()
            .filter(|(_, r)| !self.scene.is_alive(r.node))
            .map(|(id, _)| *id)
            .collect();
        for id in dead {
            let _ = self.remove_input_handler(id);
        }
    }

    /// Handlers attached to `node`, in delivery order.
    pub fn handlers_on(&self, node: NodeId) -> &[HandlerId] {
        self.listeners.get(&node).map_or(&[], |ids| ids.as_slice())
    }

    /// The node a handler is attached to.
    pub fn handler_node(&self, id: HandlerId) -> Option<NodeId> {
        self.handlers.get(&id).map(|r| r.node)
    }

    /// A handler, if it is registered and of type `H`.
    pub fn handler<H: InputEventHandler>(&self, id: HandlerId) -> Option<&H> {
        let handler: &dyn Any = &*self.handlers.get(&id)?.handler;
        handler.downcast_ref::<H>()
    }

    /// A handler, mutably, if it is registered and of type `H`.
    pub fn handler_mut<H: InputEventHandler>(&mut self, id: HandlerId) -> Option<&mut H> {
        let handler: &mut dyn Any = &mut *self.handlers.get_mut(&id)?.handler;
        handler.downcast_mut::<H>()
    }

    /// The handler holding keyboard focus.
    pub fn keyboard_focus(&self) -> Option<HandlerId> {
        self.keyboard_focus
    }

    /// Move keyboard focus, sending `KeyboardFocusLost` to the previous holder
    /// and then `KeyboardFocusGained` to the new one.
    pub fn set_keyboard_focus(&mut self, focus: Option<HandlerId>, now: u64) {
        if focus == self.keyboard_focus {
            return;
        }
        self.now = now;
        let previous = core::mem::replace(&mut self.keyboard_focus, focus);
        tracing::debug!(
            from = previous.map(HandlerId::get),
            to = focus.map(HandlerId::get),
            "keyboard focus moved"
        );
        if let Some(previous) = previous {
            self.deliver_to_handler(previous, RawEvent::Focus, EventKind::KeyboardFocusLost);
        }
        if let Some(focus) = focus {
            self.deliver_to_handler(focus, RawEvent::Focus, EventKind::KeyboardFocusGained);
        }
    }

    // --- host entry points ---

    /// A button went down at canvas `position`.
    pub fn pointer_pressed(
        &mut self,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        now: u64,
    ) {
        self.now = now;
        self.on_pointer(pointer(position, Some(button), modifiers), EventKind::MousePressed);
    }

    /// The pointer moved to canvas `position`. Reported as a drag while any button is held.
    pub fn pointer_moved(&mut self, position: Point, modifiers: Modifiers, now: u64) {
        self.now = now;
        let kind = if self.buttons_down.is_empty() {
            EventKind::MouseMoved
        } else {
            EventKind::MouseDragged
        };
        self.on_pointer(pointer(position, None, modifiers), kind);
    }

    /// A button went up at canvas `position`.
    pub fn pointer_released(
        &mut self,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        now: u64,
    ) {
        self.now = now;
        self.on_pointer(pointer(position, Some(button), modifiers), EventKind::MouseReleased);
    }

    /// The pointer left the canvas.
    pub fn pointer_exited(&mut self, now: u64) {
        self.now = now;
        let position = self.last_canvas_position.unwrap_or(Point::ZERO);
        self.on_pointer(pointer(position, None, Modifiers::empty()), EventKind::MouseExited);
    }

    /// The wheel rotated with the pointer at canvas `position`.
    pub fn wheel(
        &mut self,
        position: Point,
        scroll: ScrollKind,
        rotation: i32,
        modifiers: Modifiers,
        now: u64,
    ) {
        self.now = now;
        let kind = match scroll {
            ScrollKind::Unit => EventKind::MouseWheelRotated,
            ScrollKind::Block => EventKind::MouseWheelRotatedByBlock,
        };
        let wheel = WheelEvent {
            pointer: pointer(position, None, modifiers),
            scroll,
            rotation,
        };
        self.on_wheel(wheel, kind);
    }

    /// A key went down.
    pub fn key_pressed(&mut self, key_code: u32, modifiers: Modifiers, now: u64) {
        self.now = now;
        let key = KeyEvent {
            key_code,
            key_char: None,
            modifiers,
        };
        self.on_key(key, EventKind::KeyPressed);
    }

    /// A key went up.
    pub fn key_released(&mut self, key_code: u32, modifiers: Modifiers, now: u64) {
        self.now = now;
        let key = KeyEvent {
            key_code,
            key_char: None,
            modifiers,
        };
        self.on_key(key, EventKind::KeyReleased);
    }

    /// A character was typed.
    pub fn key_typed(&mut self, key_char: char, modifiers: Modifiers, now: u64) {
        self.now = now;
        let key = KeyEvent {
            key_code: 0,
            key_char: Some(key_char),
            modifiers,
        };
        self.on_key(key, EventKind::KeyTyped);
    }

    /// The host surface gained keyboard focus. Forwarded to the focused handler.
    pub fn focus_gained(&mut self, now: u64) {
        self.now = now;
        self.on_focus(EventKind::KeyboardFocusGained);
    }

    /// The host surface lost keyboard focus. Forwarded to the focused handler.
    pub fn focus_lost(&mut self, now: u64) {
        self.now = now;
        self.on_focus(EventKind::KeyboardFocusLost);
    }

    /// Route a raw host event delivered as `kind`.
    ///
    /// Pointer kinds take [`RawEvent::Pointer`], wheel kinds [`RawEvent::Wheel`],
    /// key kinds [`RawEvent::Key`], and focus kinds [`RawEvent::Focus`]. A
    /// `MouseClicked` handed over by the host goes to the path under the pointer.
    pub fn process_input(
        &mut self,
        raw: RawEvent,
        kind: EventKind,
        now: u64,
    ) -> Result<(), InputError> {
        match raw {
            RawEvent::Pointer(p) if kind.is_mouse() && !kind.is_wheel() => {
                self.now = now;
                self.on_pointer(p, kind);
            }
            RawEvent::Wheel(w) if kind.is_wheel() => {
                self.now = now;
                self.on_wheel(w, kind);
            }
            RawEvent::Key(k) if kind.is_key() => {
                self.now = now;
                self.on_key(k, kind);
            }
            RawEvent::Focus if kind.is_focus() => {
                self.now = now;
                self.on_focus(kind);
            }
            _ => return Err(InputError::KindMismatch(kind)),
        }
        Ok(())
    }

    /// Run the activity steps due at `now`.
    ///
    /// Steps of activities terminated by an earlier step of the same tick are dropped.
    pub fn tick(&mut self, now: u64) {
        self.now = now;
        let steps = self.activities.process(now);
        for step in steps {
            if step.phase != StepPhase::Final && !self.activities.is_live(step.id) {
                continue;
            }
            let Self {
                scene,
                activities,
                interacting,
                handlers,
                ..
            } = self;
            let Some(registered) = handlers.get_mut(&step.owner) else {
                continue;
            };
            tracing::trace!(handler = step.owner.get(), phase = ?step.phase, "activity step");
            let mut cx = HandlerContext::new(scene, activities, interacting, step.owner, now);
            registered.handler.activity_step(&mut cx, &step);
        }
    }

    // --- routing ---

    fn on_pointer(&mut self, mut p: PointerEvent, kind: EventKind) {
        let delta = self
            .last_canvas_position
            .map_or(Vec2::ZERO, |last| p.position - last);
        self.last_canvas_position = Some(p.position);

        match kind {
            EventKind::MousePressed => {
                let Some(button) = p.button else {
                    return;
                };
                let first_of_gesture = self.buttons_down.is_empty();
                self.buttons_down |= button.mask();
                p.modifiers |= button.mask();
                let path = self.update_mouse_over(&p, delta);
                p.click_count = match path.as_deref() {
                    Some(path) => {
                        self.click
                            .on_down(button, path.picked_node(), p.position, self.now)
                    }
                    None => {
                        self.click.cancel();
                        1
                    }
                };
                if first_of_gesture {
                    self.mouse_focus = path;
                }
                self.deliver_along(self.mouse_focus.clone(), RawEvent::Pointer(p), kind, delta);
            }
            EventKind::MouseMoved | EventKind::MouseDragged => {
                p.modifiers |= self.buttons_down;
                let _ = self.click.on_move(p.position);
                let over = self.update_mouse_over(&p, delta);
                let target = if kind == EventKind::MouseDragged {
                    self.mouse_focus.clone().or(over)
                } else {
                    over
                };
                self.deliver_along(target, RawEvent::Pointer(p), kind, delta);
            }
            EventKind::MouseReleased => {
                let Some(button) = p.button else {
                    return;
                };
                p.modifiers |= button.mask();
                p.click_count = self.click.click_count();
                self.buttons_down.remove(button.mask());
                let over = self.update_mouse_over(&p, delta);
                let focus = self.mouse_focus.clone().or_else(|| over.clone());
                self.deliver_along(focus.clone(), RawEvent::Pointer(p), kind, delta);

                let clicked = match over.as_deref() {
                    Some(path) => self.click.on_up(button, &path.picked_node(), p.position),
                    None => {
                        self.click.cancel();
                        ClickResult::Suppressed(None)
                    }
                };
                if let ClickResult::Click(node, count) = clicked {
                    tracing::trace!(?node, count, "synthesized click");
                    let mut click = p;
                    click.click_count = count;
                    let raw = RawEvent::Pointer(click);
                    self.deliver_along(focus, raw, EventKind::MouseClicked, Vec2::ZERO);
                }
                if self.buttons_down.is_empty() {
                    self.mouse_focus = None;
                }
            }
            EventKind::MouseClicked => {
                p.modifiers |= p.button.map_or(Modifiers::empty(), MouseButton::mask);
                let over = self.update_mouse_over(&p, delta);
                self.deliver_along(over, RawEvent::Pointer(p), kind, delta);
            }
            EventKind::MouseEntered => {
                p.modifiers |= self.buttons_down;
                let _ = self.update_mouse_over(&p, delta);
            }
            EventKind::MouseExited => {
                p.modifiers |= self.buttons_down;
                let old = self.mouse_over.take();
                self.deliver_along(old, RawEvent::Pointer(p), kind, delta);
            }
            _ => {}
        }
    }

    fn on_wheel(&mut self, mut w: WheelEvent, kind: EventKind) {
        let delta = self
            .last_canvas_position
            .map_or(Vec2::ZERO, |last| w.pointer.position - last);
        self.last_canvas_position = Some(w.pointer.position);
        w.pointer.modifiers |= self.buttons_down;
        let over = self.update_mouse_over(&w.pointer, delta);
        self.deliver_along(over, RawEvent::Wheel(w), kind, delta);
    }

    fn on_key(&mut self, key: KeyEvent, kind: EventKind) {
        if let Some(focus) = self.keyboard_focus {
            self.deliver_to_handler(focus, RawEvent::Key(key), kind);
        }
    }

    fn on_focus(&mut self, kind: EventKind) {
        if let Some(focus) = self.keyboard_focus {
            self.deliver_to_handler(focus, RawEvent::Focus, kind);
        }
    }

    /// Pick under `p`, make it the mouse-over path, and emit exit/enter if the
    /// picked node changed.
    fn update_mouse_over(&mut self, p: &PointerEvent, delta: Vec2) -> Option<Rc<PickPath>> {
        let path = self.scene.pick(self.camera, p.position).map(Rc::new);
        let old_node = self.mouse_over.as_deref().map(PickPath::picked_node);
        let new_node = path.as_deref().map(PickPath::picked_node);
        let old = core::mem::replace(&mut self.mouse_over, path.clone());
        if old_node != new_node {
            let mut crossing = PointerEvent::at(p.position);
            crossing.modifiers = p.modifiers | self.buttons_down;
            self.deliver_along(old, RawEvent::Pointer(crossing), EventKind::MouseExited, delta);
            self.deliver_along(
                path.clone(),
                RawEvent::Pointer(crossing),
                EventKind::MouseEntered,
                delta,
            );
        }
        path
    }

    fn deliver_along(
        &mut self,
        path: Option<Rc<PickPath>>,
        raw: RawEvent,
        kind: EventKind,
        canvas_delta: Vec2,
    ) {
        let Some(path) = path else {
            return;
        };
        let targets: SmallVec<[HandlerId; 8]> = path
            .nodes()
            .rev()
            .flat_map(|node| self.handlers_on(node).iter().copied())
            .collect();
        if targets.is_empty() {
            return;
        }
        tracing::trace!(?kind, handlers = targets.len(), "dispatching");
        let mut event = InputEvent::new(raw, Some(path)).with_canvas_delta(canvas_delta);
        for id in targets {
            self.run_handler(id, &mut event, kind);
        }
    }

    fn deliver_to_handler(&mut self, id: HandlerId, raw: RawEvent, kind: EventKind) {
        let mut event = InputEvent::new(raw, self.mouse_over.clone());
        tracing::trace!(?kind, handler = id.get(), "dispatching to focus");
        self.run_handler(id, &mut event, kind);
    }

    fn run_handler(&mut self, id: HandlerId, event: &mut InputEvent, kind: EventKind) {
        let Self {
            scene,
            activities,
            interacting,
            handlers,
            now,
            ..
        } = self;
        let Some(registered) = handlers.get_mut(&id) else {
            return;
        };
        let mut cx = HandlerContext::new(scene, activities, interacting, id, *now);
        registered.handler.handle(&mut cx, event, kind);
    }
}

fn pointer(position: Point, button: Option<MouseButton>, modifiers: Modifiers) -> PointerEvent {
    PointerEvent {
        position,
        button,
        modifiers,
        click_count: 0,
    }
}
