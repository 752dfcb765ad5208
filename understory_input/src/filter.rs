// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event filter: decides whether a handler sees an event.
//!
//! ## Acceptance rules
//!
//! Evaluated in order, stopping at the first rejection:
//!
//! 1. Handled events are rejected unless [`EventFilter::accepts_already_handled_events`] is set.
//! 2. If the event carries a non-empty modifier set `m` (every event but focus changes):
//!    `m` must contain the and-mask, must not intersect the not-mask, and, unless the
//!    or-mask is [`Modifiers::all()`], must intersect the or-mask. Events with no
//!    modifiers at all skip this step.
//! 3. Mouse events must match the configured click count, if any.
//! 4. The per-kind flag for the event kind must be set.
//!
//! An accepted event is marked handled if [`EventFilter::marks_accepted_events_as_handled`] is set.
//!
//! ```
//! use kurbo::Point;
//! use understory_input::{EventFilter, EventKind, InputEvent, Modifiers, PointerEvent, RawEvent};
//!
//! let filter = EventFilter::with_and_mask(Modifiers::BUTTON1);
//! let mut pointer = PointerEvent::at(Point::ZERO);
//! pointer.modifiers = Modifiers::BUTTON1 | Modifiers::SHIFT;
//! let mut event = InputEvent::new(RawEvent::Pointer(pointer), None);
//! assert!(filter.accepts(&mut event, EventKind::MouseDragged));
//!
//! pointer.modifiers = Modifiers::BUTTON2;
//! let mut event = InputEvent::new(RawEvent::Pointer(pointer), None);
//! assert!(!filter.accepts(&mut event, EventKind::MouseDragged));
//! ```

use crate::event::{InputEvent, Modifiers};
use crate::kind::EventKind;

/// Configuration deciding which events a handler receives.
///
/// Filters are plain values; share one between handlers by cloning it, or by
/// wrapping it in shared ownership at the call site.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventFilter {
    and_mask: Modifiers,
    or_mask: Modifiers,
    not_mask: Modifiers,
    click_count: Option<u32>,
    marks_accepted_events_as_handled: bool,
    accepts_already_handled_events: bool,
    accepts_key_pressed: bool,
    accepts_key_released: bool,
    accepts_key_typed: bool,
    accepts_mouse_clicked: bool,
    accepts_mouse_dragged: bool,
    accepts_mouse_entered: bool,
    accepts_mouse_exited: bool,
    accepts_mouse_moved: bool,
    accepts_mouse_pressed: bool,
    accepts_mouse_released: bool,
    accepts_mouse_wheel_rotated: bool,
    accepts_focus_events: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFilter {
    /// The or-mask value meaning "any modifier combination".
    pub const ALL_MODIFIERS: Modifiers = Modifiers::all();

    /// A filter accepting every kind, any modifiers, any click count, unhandled events only.
    pub fn new() -> Self {
        Self {
            and_mask: Modifiers::empty(),
            or_mask: Self::ALL_MODIFIERS,
            not_mask: Modifiers::empty(),
            click_count: None,
            marks_accepted_events_as_handled: false,
            accepts_already_handled_events: false,
            accepts_key_pressed: true,
            accepts_key_released: true,
            accepts_key_typed: true,
            accepts_mouse_clicked: true,
            accepts_mouse_dragged: true,
            accepts_mouse_entered: true,
            accepts_mouse_exited: true,
            accepts_mouse_moved: true,
            accepts_mouse_pressed: true,
            accepts_mouse_released: true,
            accepts_mouse_wheel_rotated: true,
            accepts_focus_events: true,
        }
    }

    /// Accept everything, but require every modifier in `and_mask`.
    pub fn with_and_mask(and_mask: Modifiers) -> Self {
        Self {
            and_mask,
            ..Self::new()
        }
    }

    /// Accept everything, requiring `and_mask` and forbidding `not_mask`.
    pub fn with_and_not_masks(and_mask: Modifiers, not_mask: Modifiers) -> Self {
        Self {
            and_mask,
            not_mask,
            ..Self::new()
        }
    }

    /// Decide whether `event`, delivered as `kind`, passes this filter.
    ///
    /// May mark the event handled; see [`EventFilter::set_marks_accepted_events_as_handled`].
    pub fn accepts(&self, event: &mut InputEvent, kind: EventKind) -> bool {
        if event.is_handled() && !self.accepts_already_handled_events {
            return false;
        }

        if let Some(modifiers) = event.modifiers()
            && !modifiers.is_empty()
        {
            if !modifiers.contains(self.and_mask) || modifiers.intersects(self.not_mask) {
                return false;
            }
            if self.or_mask != Self::ALL_MODIFIERS && !modifiers.intersects(self.or_mask) {
                return false;
            }
        }

        if event.is_mouse_event()
            && let Some(required) = self.click_count
            && event.click_count() != Some(required)
        {
            return false;
        }

        let accepted = self.accepts_kind(kind);

        if accepted && self.marks_accepted_events_as_handled {
            event.set_handled(true);
        }
        accepted
    }

    /// Turn every per-kind flag on.
    pub fn accept_all_event_kinds(&mut self) {
        self.set_all_kinds(true);
    }

    /// Turn every per-kind flag off.
    pub fn reject_all_event_kinds(&mut self) {
        self.set_all_kinds(false);
    }

    fn set_all_kinds(&mut self, accept: bool) {
        self.set_accepts_key_events(accept);
        self.set_accepts_mouse_events(accept);
        self.accepts_focus_events = accept;
    }

    /// Accept any click count.
    pub fn accept_all_click_counts(&mut self) {
        self.click_count = None;
    }

    /// Set all key flags at once.
    pub fn set_accepts_key_events(&mut self, accept: bool) {
        self.accepts_key_pressed = accept;
        self.accepts_key_released = accept;
        self.accepts_key_typed = accept;
    }

    /// Set all mouse flags (wheel included) at once.
    pub fn set_accepts_mouse_events(&mut self, accept: bool) {
        self.accepts_mouse_clicked = accept;
        self.accepts_mouse_dragged = accept;
        self.accepts_mouse_entered = accept;
        self.accepts_mouse_exited = accept;
        self.accepts_mouse_moved = accept;
        self.accepts_mouse_pressed = accept;
        self.accepts_mouse_released = accept;
        self.accepts_mouse_wheel_rotated = accept;
    }

    /// Set both focus flags at once.
    pub fn set_accepts_focus_events(&mut self, accept: bool) {
        self.accepts_focus_events = accept;
    }

    /// Modifiers that must all be present.
    pub fn and_mask(&self) -> Modifiers {
        self.and_mask
    }

    /// Set the modifiers that must all be present.
    pub fn set_and_mask(&mut self, mask: Modifiers) {
        self.and_mask = mask;
    }

    /// Modifiers of which at least one must be present, or [`EventFilter::ALL_MODIFIERS`].
    pub fn or_mask(&self) -> Modifiers {
        self.or_mask
    }

    /// Set the or-mask.
    pub fn set_or_mask(&mut self, mask: Modifiers) {
        self.or_mask = mask;
    }

    /// Modifiers that must all be absent.
    pub fn not_mask(&self) -> Modifiers {
        self.not_mask
    }

    /// Set the not-mask.
    pub fn set_not_mask(&mut self, mask: Modifiers) {
        self.not_mask = mask;
    }

    /// Required click count of mouse events, if any.
    pub fn click_count(&self) -> Option<u32> {
        self.click_count
    }

    /// Require an exact click count of mouse events.
    pub fn set_click_count(&mut self, count: Option<u32>) {
        self.click_count = count;
    }

    /// Whether accepting an event marks it handled.
    pub fn marks_accepted_events_as_handled(&self) -> bool {
        self.marks_accepted_events_as_handled
    }

    /// Set whether accepting an event marks it handled.
    pub fn set_marks_accepted_events_as_handled(&mut self, marks: bool) {
        self.marks_accepted_events_as_handled = marks;
    }

    /// Whether handled events can still be accepted.
    pub fn accepts_already_handled_events(&self) -> bool {
        self.accepts_already_handled_events
    }

    /// Set whether handled events can still be accepted.
    pub fn set_accepts_already_handled_events(&mut self, accepts: bool) {
        self.accepts_already_handled_events = accepts;
    }

    /// The per-kind flag for `kind`. Both wheel kinds share a flag, as do both focus kinds.
    pub fn accepts_kind(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::KeyPressed => self.accepts_key_pressed,
            EventKind::KeyReleased => self.accepts_key_released,
            EventKind::KeyTyped => self.accepts_key_typed,
            EventKind::MouseClicked => self.accepts_mouse_clicked,
            EventKind::MouseDragged => self.accepts_mouse_dragged,
            EventKind::MouseEntered => self.accepts_mouse_entered,
            EventKind::MouseExited => self.accepts_mouse_exited,
            EventKind::MouseMoved => self.accepts_mouse_moved,
            EventKind::MousePressed => self.accepts_mouse_pressed,
            EventKind::MouseReleased => self.accepts_mouse_released,
            EventKind::MouseWheelRotated | EventKind::MouseWheelRotatedByBlock => {
                self.accepts_mouse_wheel_rotated
            }
            EventKind::KeyboardFocusGained | EventKind::KeyboardFocusLost => {
                self.accepts_focus_events
            }
        }
    }

    /// Set the per-kind flag for `kind`.
    pub fn set_accepts_kind(&mut self, kind: EventKind, accept: bool) {
        let flag = match kind {
            EventKind::KeyPressed => &mut self.accepts_key_pressed,
            EventKind::KeyReleased => &mut self.accepts_key_released,
            EventKind::KeyTyped => &mut self.accepts_key_typed,
            EventKind::MouseClicked => &mut self.accepts_mouse_clicked,
            EventKind::MouseDragged => &mut self.accepts_mouse_dragged,
            EventKind::MouseEntered => &mut self.accepts_mouse_entered,
            EventKind::MouseExited => &mut self.accepts_mouse_exited,
            EventKind::MouseMoved => &mut self.accepts_mouse_moved,
            EventKind::MousePressed => &mut self.accepts_mouse_pressed,
            EventKind::MouseReleased => &mut self.accepts_mouse_released,
            EventKind::MouseWheelRotated | EventKind::MouseWheelRotatedByBlock => {
                &mut self.accepts_mouse_wheel_rotated
            }
            EventKind::KeyboardFocusGained | EventKind::KeyboardFocusLost => {
                &mut self.accepts_focus_events
            }
        };
        *flag = accept;
    }
}
