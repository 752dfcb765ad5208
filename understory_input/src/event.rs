// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input event payloads.
//!
//! A host-level event is one of four shapes ([`RawEvent`]). The [`InputEvent`]
//! handed to handlers wraps it together with the [`PickPath`] it was routed
//! along, the canvas-space motion since the previous pointer event, and the
//! advisory `handled` flag.
//!
//! Pointer queries return `Option`: asking for the position of a focus event
//! is answered with `None` rather than a runtime failure. Callers that treat
//! such a query as a bug can use [`InputEvent::expect_pointer`].

use alloc::rc::Rc;

use kurbo::{Point, Vec2};
use understory_scene::{NodeId, PickPath, Scene};

use crate::error::InputError;

bitflags::bitflags! {
    /// Keyboard modifiers and held mouse buttons.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u16 {
        /// Shift key.
        const SHIFT     = 1 << 0;
        /// Control key.
        const CONTROL   = 1 << 1;
        /// Meta (command / super) key.
        const META      = 1 << 2;
        /// Alt (option) key.
        const ALT       = 1 << 3;
        /// `AltGr` key.
        const ALT_GRAPH = 1 << 4;
        /// Primary mouse button.
        const BUTTON1   = 1 << 5;
        /// Middle mouse button.
        const BUTTON2   = 1 << 6;
        /// Secondary mouse button.
        const BUTTON3   = 1 << 7;
    }
}

impl Modifiers {
    /// All mouse button bits.
    pub const BUTTONS: Self = Self::BUTTON1.union(Self::BUTTON2).union(Self::BUTTON3);
}

/// A mouse button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MouseButton {
    /// Usually the left button. Maps to [`Modifiers::BUTTON1`].
    Primary,
    /// Usually the wheel button. Maps to [`Modifiers::BUTTON2`].
    Middle,
    /// Usually the right button. Maps to [`Modifiers::BUTTON3`].
    Secondary,
}

impl MouseButton {
    /// The modifier bit set while this button is held.
    pub const fn mask(self) -> Modifiers {
        match self {
            Self::Primary => Modifiers::BUTTON1,
            Self::Middle => Modifiers::BUTTON2,
            Self::Secondary => Modifiers::BUTTON3,
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = InputError;

    /// Converts the conventional 1-based button numbers.
    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Primary),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Secondary),
            _ => Err(InputError::UnknownButton(n)),
        }
    }
}

/// Pointer data shared by mouse and wheel events.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Position in canvas space.
    pub position: Point,
    /// The button that changed state, for presses, releases and clicks.
    pub button: Option<MouseButton>,
    /// Keyboard modifiers plus the event's own button for presses, releases and clicks,
    /// or every held button for other pointer events.
    pub modifiers: Modifiers,
    /// Consecutive click count; zero for moves, drags and crossings.
    pub click_count: u32,
}

impl PointerEvent {
    /// A pointer event at `position` with no button and no modifiers.
    pub fn at(position: Point) -> Self {
        Self {
            position,
            button: None,
            modifiers: Modifiers::empty(),
            click_count: 0,
        }
    }
}

/// How a wheel scrolled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScrollKind {
    /// Line-by-line scrolling.
    Unit,
    /// Page-by-page scrolling.
    Block,
}

/// Wheel rotation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WheelEvent {
    /// Pointer data at the time of rotation.
    pub pointer: PointerEvent,
    /// Scroll granularity.
    pub scroll: ScrollKind,
    /// Notches rotated; negative is away from the user.
    pub rotation: i32,
}

/// Keyboard data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Host key code.
    pub key_code: u32,
    /// Character produced, for typed events.
    pub key_char: Option<char>,
    /// Keyboard modifiers.
    pub modifiers: Modifiers,
}

/// The host event wrapped by an [`InputEvent`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RawEvent {
    /// Press, release, click, move, drag, enter or exit.
    Pointer(PointerEvent),
    /// Wheel rotation.
    Wheel(WheelEvent),
    /// Key press, release or typed.
    Key(KeyEvent),
    /// Keyboard focus change; carries no data.
    Focus,
}

/// An event as seen by handlers.
#[derive(Clone, Debug)]
pub struct InputEvent {
    raw: RawEvent,
    path: Option<Rc<PickPath>>,
    canvas_delta: Vec2,
    handled: bool,
}

impl InputEvent {
    /// Wrap a raw event routed along `path`.
    pub fn new(raw: RawEvent, path: Option<Rc<PickPath>>) -> Self {
        Self {
            raw,
            path,
            canvas_delta: Vec2::ZERO,
            handled: false,
        }
    }

    /// Set the canvas-space motion since the previous pointer event.
    pub fn with_canvas_delta(mut self, delta: Vec2) -> Self {
        self.canvas_delta = delta;
        self
    }

    /// The wrapped host event.
    pub fn raw(&self) -> &RawEvent {
        &self.raw
    }

    /// The path this event is routed along.
    pub fn pick_path(&self) -> Option<&PickPath> {
        self.path.as_deref()
    }

    /// Whether some handler marked the event as handled. Advisory only.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Mark or unmark the event as handled.
    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    /// Pointer or wheel event.
    pub fn is_mouse_event(&self) -> bool {
        matches!(self.raw, RawEvent::Pointer(_) | RawEvent::Wheel(_))
    }

    /// Wheel event.
    pub fn is_wheel_event(&self) -> bool {
        matches!(self.raw, RawEvent::Wheel(_))
    }

    /// Key event.
    pub fn is_key_event(&self) -> bool {
        matches!(self.raw, RawEvent::Key(_))
    }

    /// Keyboard focus event.
    pub fn is_focus_event(&self) -> bool {
        matches!(self.raw, RawEvent::Focus)
    }

    /// Pointer data of a mouse or wheel event.
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match &self.raw {
            RawEvent::Pointer(p) => Some(p),
            RawEvent::Wheel(w) => Some(&w.pointer),
            RawEvent::Key(_) | RawEvent::Focus => None,
        }
    }

    /// Pointer data, for callers that consider a non-pointer event a bug.
    ///
    /// # Panics
    ///
    /// Panics if this is a key or focus event.
    pub fn expect_pointer(&self) -> &PointerEvent {
        match self.pointer() {
            Some(p) => p,
            None => panic!("pointer data queried on a {:?} event", self.raw),
        }
    }

    /// Wheel data.
    pub fn wheel(&self) -> Option<&WheelEvent> {
        match &self.raw {
            RawEvent::Wheel(w) => Some(w),
            _ => None,
        }
    }

    /// Key data.
    pub fn key(&self) -> Option<&KeyEvent> {
        match &self.raw {
            RawEvent::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Modifiers of any event but a focus event.
    pub fn modifiers(&self) -> Option<Modifiers> {
        match &self.raw {
            RawEvent::Pointer(p) => Some(p.modifiers),
            RawEvent::Wheel(w) => Some(w.pointer.modifiers),
            RawEvent::Key(k) => Some(k.modifiers),
            RawEvent::Focus => None,
        }
    }

    fn modifier_down(&self, m: Modifiers) -> bool {
        self.modifiers().is_some_and(|mods| mods.contains(m))
    }

    /// Shift held.
    pub fn is_shift_down(&self) -> bool {
        self.modifier_down(Modifiers::SHIFT)
    }

    /// Control held.
    pub fn is_control_down(&self) -> bool {
        self.modifier_down(Modifiers::CONTROL)
    }

    /// Alt held.
    pub fn is_alt_down(&self) -> bool {
        self.modifier_down(Modifiers::ALT)
    }

    /// Meta held.
    pub fn is_meta_down(&self) -> bool {
        self.modifier_down(Modifiers::META)
    }

    /// The button that changed state.
    pub fn button(&self) -> Option<MouseButton> {
        self.pointer().and_then(|p| p.button)
    }

    /// Click count of a mouse event.
    pub fn click_count(&self) -> Option<u32> {
        self.pointer().map(|p| p.click_count)
    }

    /// Position in canvas space.
    pub fn canvas_position(&self) -> Option<Point> {
        self.pointer().map(|p| p.position)
    }

    /// Canvas-space motion since the previous pointer event.
    pub fn canvas_delta(&self) -> Vec2 {
        self.canvas_delta
    }

    /// The deepest node on the path.
    pub fn picked_node(&self) -> Option<NodeId> {
        self.pick_path().map(PickPath::picked_node)
    }

    /// The camera attached to the canvas.
    pub fn top_camera(&self) -> Option<NodeId> {
        self.pick_path().and_then(PickPath::top_camera)
    }

    /// The innermost camera on the path, the one whose view the picked node is seen through.
    pub fn camera(&self) -> Option<NodeId> {
        self.pick_path().and_then(PickPath::bottom_camera)
    }

    /// Position in the view space of [`InputEvent::camera`].
    pub fn position(&self, scene: &Scene) -> Option<Point> {
        let path = self.pick_path()?;
        path.canvas_to_view(scene, self.canvas_position()?, path.bottom_camera()?)
    }

    /// Canvas delta expressed in the view space of [`InputEvent::camera`].
    pub fn delta(&self, scene: &Scene) -> Option<Vec2> {
        let path = self.pick_path()?;
        path.canvas_to_view_vec(scene, self.canvas_delta, path.bottom_camera()?)
    }

    /// Position in the local space of `node`, which must lie on the path.
    pub fn position_relative_to(&self, scene: &Scene, node: NodeId) -> Option<Point> {
        self.pick_path()?
            .canvas_to_local(scene, self.canvas_position()?, node)
    }

    /// Canvas delta expressed in the local space of `node`, which must lie on the path.
    pub fn delta_relative_to(&self, scene: &Scene, node: NodeId) -> Option<Vec2> {
        self.pick_path()?
            .canvas_to_local_vec(scene, self.canvas_delta, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use understory_scene::LocalNode;

    fn key_event() -> InputEvent {
        InputEvent::new(
            RawEvent::Key(KeyEvent {
                key_code: 65,
                key_char: Some('a'),
                modifiers: Modifiers::SHIFT,
            }),
            None,
        )
    }

    #[test]
    fn classification_follows_the_variant() {
        let focus = InputEvent::new(RawEvent::Focus, None);
        assert!(focus.is_focus_event());
        assert!(!focus.is_mouse_event());
        assert_eq!(focus.modifiers(), None);
        assert_eq!(focus.canvas_position(), None);
        assert!(!focus.is_shift_down());

        let key = key_event();
        assert!(key.is_key_event());
        assert!(key.is_shift_down());
        assert_eq!(key.click_count(), None);

        let wheel = InputEvent::new(
            RawEvent::Wheel(WheelEvent {
                pointer: PointerEvent::at(Point::new(1.0, 2.0)),
                scroll: ScrollKind::Unit,
                rotation: -1,
            }),
            None,
        );
        assert!(wheel.is_mouse_event());
        assert!(wheel.is_wheel_event());
        assert_eq!(wheel.canvas_position(), Some(Point::new(1.0, 2.0)));
        assert_eq!(wheel.click_count(), Some(0));
    }

    #[test]
    #[should_panic(expected = "pointer data queried")]
    fn expect_pointer_rejects_focus_events() {
        let focus = InputEvent::new(RawEvent::Focus, None);
        let _ = focus.expect_pointer();
    }

    #[test]
    fn button_conversion() {
        assert_eq!(MouseButton::try_from(3), Ok(MouseButton::Secondary));
        assert_eq!(MouseButton::try_from(4), Err(InputError::UnknownButton(4)));
        assert_eq!(MouseButton::Middle.mask(), Modifiers::BUTTON2);
        assert!(Modifiers::BUTTONS.contains(Modifiers::BUTTON3));
    }

    #[test]
    fn positions_are_translated_along_the_path() {
        let mut scene = Scene::new();
        let root = scene.insert(None, LocalNode::default());
        let layer = scene.insert(Some(root), LocalNode::default());
        let camera =
            scene.insert_camera(Some(root), LocalNode::with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)));
        scene.add_layer(camera, layer);
        let node = scene.insert(Some(layer), LocalNode::with_bounds(Rect::new(0.0, 0.0, 40.0, 40.0)));
        scene.scale_view_about_point(camera, 2.0, Point::ZERO);
        scene.offset(node, 5.0, 0.0);

        let at = Point::new(30.0, 20.0);
        let path = scene.pick(camera, at).unwrap();
        let event = InputEvent::new(RawEvent::Pointer(PointerEvent::at(at)), Some(Rc::new(path)))
            .with_canvas_delta(Vec2::new(4.0, 2.0));

        assert_eq!(event.picked_node(), Some(node));
        assert_eq!(event.camera(), Some(camera));
        assert_eq!(event.top_camera(), Some(camera));
        assert_eq!(event.position(&scene), Some(Point::new(15.0, 10.0)));
        assert_eq!(event.delta(&scene), Some(Vec2::new(2.0, 1.0)));
        assert_eq!(
            event.position_relative_to(&scene, node),
            Some(Point::new(10.0, 10.0))
        );
        assert_eq!(
            event.delta_relative_to(&scene, node),
            Some(Vec2::new(2.0, 1.0))
        );
        assert_eq!(event.position_relative_to(&scene, camera), Some(at));
    }
}
