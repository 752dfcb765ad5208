// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handler contract and the context handlers run in.
//!
//! An [`InputEventHandler`] owns an [`EventFilter`]. Its provided
//! [`InputEventHandler::handle`] method consults the filter and routes an
//! accepted event to one of fourteen per-kind hooks, all of which default to
//! doing nothing. Implementors override the hooks they care about.
//!
//! Hooks receive a [`HandlerContext`]: mutable access to the scene, to the
//! activities the handler owns, and to the canvas-wide interaction counter.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use understory_scene::Scene;
use understory_scene::activity::{ActivityDuration, ActivityId, ActivityScheduler, ActivityStep};

use crate::event::InputEvent;
use crate::filter::EventFilter;
use crate::kind::EventKind;

/// Identifier of a handler registered on a [`Canvas`](crate::Canvas).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u32);

impl HandlerId {
    /// Build an id from its raw value. Ids handed out by a canvas start at 1.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// What a handler may touch while handling an event or an activity step.
pub struct HandlerContext<'a> {
    scene: &'a mut Scene,
    activities: &'a mut ActivityScheduler<HandlerId>,
    interacting: &'a mut u32,
    handler: HandlerId,
    now: u64,
}

impl fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("handler", &self.handler)
            .field("now", &self.now)
            .field("interacting", &*self.interacting)
            .finish_non_exhaustive()
    }
}

impl<'a> HandlerContext<'a> {
    /// Build a context for `handler` at time `now` (milliseconds).
    ///
    /// [`Canvas`](crate::Canvas) builds these during dispatch; direct use is for
    /// hosts with their own routing, and for tests.
    pub fn new(
        scene: &'a mut Scene,
        activities: &'a mut ActivityScheduler<HandlerId>,
        interacting: &'a mut u32,
        handler: HandlerId,
        now: u64,
    ) -> Self {
        Self {
            scene,
            activities,
            interacting,
            handler,
            now,
        }
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }

    /// Current time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// The handler being run.
    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }

    /// Schedule an activity owned by the current handler, starting now.
    ///
    /// Its steps come back through [`InputEventHandler::activity_step`].
    pub fn schedule_activity(&mut self, step_rate: u64, duration: ActivityDuration) -> ActivityId {
        self.activities
            .schedule(self.handler, self.now, step_rate, duration)
    }

    /// Terminate an activity.
    ///
    /// Returns true if its first step had already run; the caller then owes
    /// the final step, which the scheduler will not deliver.
    pub fn terminate_activity(&mut self, id: ActivityId) -> bool {
        self.activities.terminate(id)
    }

    /// Returns true while the activity is live.
    pub fn is_activity_live(&self, id: ActivityId) -> bool {
        self.activities.is_live(id)
    }

    /// Step rate (milliseconds) of a live activity.
    pub fn activity_step_rate(&self, id: ActivityId) -> Option<u64> {
        self.activities.step_rate(id)
    }

    /// Retarget the step rate of a live activity.
    pub fn set_activity_step_rate(&mut self, id: ActivityId, step_rate: u64) {
        self.activities.set_step_rate(id, step_rate);
    }

    /// Take (`true`) or release (`false`) one hold on the canvas interaction count.
    ///
    /// Each take must be paired with one release. Releasing with no holds
    /// outstanding is ignored.
    pub fn set_interacting(&mut self, interacting: bool) {
        if interacting {
            *self.interacting += 1;
        } else {
            *self.interacting = self.interacting.saturating_sub(1);
        }
    }

    /// Returns true while any handler holds the interaction count.
    pub fn is_interacting(&self) -> bool {
        *self.interacting > 0
    }
}

/// A participant in event dispatch.
///
/// Only the filter accessors are required. Every hook receives the event
/// mutably so it can mark it handled; marking is advisory and never stops
/// delivery to later handlers.
pub trait InputEventHandler: Any {
    /// The filter deciding which events reach the hooks.
    fn filter(&self) -> &EventFilter;

    /// The filter, mutably.
    fn filter_mut(&mut self) -> &mut EventFilter;

    /// Replace the filter.
    fn set_filter(&mut self, filter: EventFilter) {
        *self.filter_mut() = filter;
    }

    /// Whether [`InputEventHandler::handle`] would run a hook for this event.
    ///
    /// Has the same side effect as the filter: may mark the event handled.
    fn accepts_event(&self, event: &mut InputEvent, kind: EventKind) -> bool {
        self.filter().accepts(event, kind)
    }

    /// Filter the event, then run the hook for `kind`.
    fn handle(&mut self, cx: &mut HandlerContext<'_>, event: &mut InputEvent, kind: EventKind) {
        if !self.accepts_event(event, kind) {
            return;
        }
        match kind {
            EventKind::KeyPressed => self.key_pressed(cx, event),
            EventKind::KeyReleased => self.key_released(cx, event),
            EventKind::KeyTyped => self.key_typed(cx, event),
            EventKind::MouseClicked => self.mouse_clicked(cx, event),
            EventKind::MouseDragged => self.mouse_dragged(cx, event),
            EventKind::MouseEntered => self.mouse_entered(cx, event),
            EventKind::MouseExited => self.mouse_exited(cx, event),
            EventKind::MouseMoved => self.mouse_moved(cx, event),
            EventKind::MousePressed => self.mouse_pressed(cx, event),
            EventKind::MouseReleased => self.mouse_released(cx, event),
            EventKind::MouseWheelRotated => self.mouse_wheel_rotated(cx, event),
            EventKind::MouseWheelRotatedByBlock => self.mouse_wheel_rotated_by_block(cx, event),
            EventKind::KeyboardFocusGained => self.keyboard_focus_gained(cx, event),
            EventKind::KeyboardFocusLost => self.keyboard_focus_lost(cx, event),
        }
    }

    /// A key went down.
    fn key_pressed(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// A key went up.
    fn key_released(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// A character was typed.
    fn key_typed(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// A press and release landed on the same node.
    fn mouse_clicked(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// The pointer moved with a button held.
    fn mouse_dragged(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// The pointer entered the node.
    fn mouse_entered(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// The pointer left the node.
    fn mouse_exited(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// The pointer moved with no button held.
    fn mouse_moved(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// A button went down.
    fn mouse_pressed(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// A button went up.
    fn mouse_released(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// The wheel scrolled by units.
    fn mouse_wheel_rotated(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// The wheel scrolled by blocks.
    fn mouse_wheel_rotated_by_block(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &mut InputEvent,
    ) {
    }
    /// This handler received keyboard focus.
    fn keyboard_focus_gained(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}
    /// This handler lost keyboard focus.
    fn keyboard_focus_lost(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {}

    /// A step of an activity this handler scheduled. Not filtered.
    fn activity_step(&mut self, _cx: &mut HandlerContext<'_>, _step: &ActivityStep<HandlerId>) {}

    /// The handler is being removed from its canvas; release anything it holds.
    ///
    /// Activities still owned by the handler afterwards are terminated without
    /// final steps.
    fn cancel(&mut self, _cx: &mut HandlerContext<'_>) {}
}

type HandlerFn = dyn FnMut(&mut HandlerContext<'_>, &mut InputEvent, EventKind);

/// A handler built from a filter and a closure.
///
/// The closure sees every accepted event together with its kind.
///
/// ```
/// use understory_input::{BasicEventHandler, EventFilter, EventKind, Modifiers};
///
/// let mut filter = EventFilter::with_and_mask(Modifiers::BUTTON1);
/// filter.set_accepts_key_events(false);
/// let handler = BasicEventHandler::new(filter, |_cx, event, kind| {
///     if kind == EventKind::MouseClicked {
///         event.set_handled(true);
///     }
/// });
/// # let _ = handler;
/// ```
pub struct BasicEventHandler {
    filter: EventFilter,
    on_event: Box<HandlerFn>,
}

impl BasicEventHandler {
    /// Wrap a closure.
    pub fn new(
        filter: EventFilter,
        on_event: impl FnMut(&mut HandlerContext<'_>, &mut InputEvent, EventKind) + 'static,
    ) -> Self {
        Self {
            filter,
            on_event: Box::new(on_event),
        }
    }
}

impl fmt::Debug for BasicEventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicEventHandler")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl InputEventHandler for BasicEventHandler {
    fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut EventFilter {
        &mut self.filter
    }

    fn handle(&mut self, cx: &mut HandlerContext<'_>, event: &mut InputEvent, kind: EventKind) {
        if self.filter.accepts(event, kind) {
            (self.on_event)(cx, event, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Modifiers, PointerEvent, RawEvent};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use kurbo::Point;

    #[derive(Default)]
    struct Recorder {
        filter: EventFilter,
        seen: Vec<&'static str>,
    }

    impl InputEventHandler for Recorder {
        fn filter(&self) -> &EventFilter {
            &self.filter
        }
        fn filter_mut(&mut self) -> &mut EventFilter {
            &mut self.filter
        }
        fn mouse_pressed(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {
            self.seen.push("pressed");
        }
        fn mouse_wheel_rotated_by_block(
            &mut self,
            _cx: &mut HandlerContext<'_>,
            _event: &mut InputEvent,
        ) {
            self.seen.push("block");
        }
        fn keyboard_focus_lost(&mut self, _cx: &mut HandlerContext<'_>, _event: &mut InputEvent) {
            self.seen.push("focus lost");
        }
    }

    struct Fixture {
        scene: Scene,
        activities: ActivityScheduler<HandlerId>,
        interacting: u32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                activities: ActivityScheduler::new(),
                interacting: 0,
            }
        }

        fn cx(&mut self) -> HandlerContext<'_> {
            HandlerContext::new(
                &mut self.scene,
                &mut self.activities,
                &mut self.interacting,
                HandlerId::from_raw(1),
                100,
            )
        }
    }

    fn pointer(modifiers: Modifiers) -> InputEvent {
        let mut p = PointerEvent::at(Point::ZERO);
        p.modifiers = modifiers;
        InputEvent::new(RawEvent::Pointer(p), None)
    }

    #[test]
    fn hooks_are_routed_by_kind() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mut h = Recorder::default();
        h.handle(&mut cx, &mut pointer(Modifiers::BUTTON1), EventKind::MousePressed);
        h.handle(&mut cx, &mut pointer(Modifiers::empty()), EventKind::MouseWheelRotatedByBlock);
        h.handle(&mut cx, &mut InputEvent::new(RawEvent::Focus, None), EventKind::KeyboardFocusLost);
        // Unimplemented hooks are no-ops.
        h.handle(&mut cx, &mut pointer(Modifiers::empty()), EventKind::MouseMoved);
        assert_eq!(h.seen, ["pressed", "block", "focus lost"]);
    }

    #[test]
    fn rejected_events_run_no_hook() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let mut h = Recorder {
            filter: EventFilter::with_and_mask(Modifiers::BUTTON3),
            ..Recorder::default()
        };
        let mut event = pointer(Modifiers::BUTTON1);
        assert!(!h.accepts_event(&mut event, EventKind::MousePressed));
        h.handle(&mut cx, &mut event, EventKind::MousePressed);
        assert!(h.seen.is_empty());
    }

    #[test]
    fn basic_handler_sees_accepted_kinds() {
        let mut fx = Fixture::new();
        let mut cx = fx.cx();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut filter = EventFilter::new();
        filter.set_accepts_kind(EventKind::MouseMoved, false);
        filter.set_marks_accepted_events_as_handled(true);
        let mut h = BasicEventHandler::new(filter, move |_cx, _event, kind| {
            sink.borrow_mut().push(kind);
        });

        let mut moved = pointer(Modifiers::empty());
        h.handle(&mut cx, &mut moved, EventKind::MouseMoved);
        assert!(!moved.is_handled());

        let mut clicked = pointer(Modifiers::BUTTON1);
        h.handle(&mut cx, &mut clicked, EventKind::MouseClicked);
        assert!(clicked.is_handled());
        // Already handled: rejected by the default filter.
        h.handle(&mut cx, &mut clicked, EventKind::MouseClicked);

        assert_eq!(*seen.borrow(), [EventKind::MouseClicked]);
    }

    #[test]
    fn interaction_is_reference_counted() {
        let mut fx = Fixture::new();
        {
            let mut cx = fx.cx();
            cx.set_interacting(true);
            cx.set_interacting(true);
            cx.set_interacting(false);
            assert!(cx.is_interacting());
            cx.set_interacting(false);
            assert!(!cx.is_interacting());
            cx.set_interacting(false);
        }
        assert_eq!(fx.interacting, 0);
    }

    #[test]
    fn activities_are_owned_by_the_running_handler() {
        let mut fx = Fixture::new();
        let id = {
            let mut cx = fx.cx();
            let id = cx.schedule_activity(20, ActivityDuration::Forever);
            assert_eq!(cx.activity_step_rate(id), Some(20));
            cx.set_activity_step_rate(id, 40);
            assert_eq!(cx.activity_step_rate(id), Some(40));
            id
        };
        assert_eq!(fx.activities.owner(id), Some(HandlerId::from_raw(1)));
        let steps = fx.activities.process(100);
        assert_eq!(steps.len(), 2);
        let mut cx = fx.cx();
        assert!(cx.terminate_activity(id));
        assert!(!cx.is_activity_live(id));
    }
}
