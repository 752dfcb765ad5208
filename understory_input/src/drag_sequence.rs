// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Press, drag, release: the state machine behind every drag interaction.
//!
//! A [`DragSequenceHandler`] tracks one button sequence at a time:
//!
//! - **Idle**: no button of interest is down.
//! - **Armed**: the initiating button is down, but the drag has not started.
//! - **Dragging**: the drag started; a recurring *drag activity* runs until release.
//!
//! A press while Idle arms the sequence and records the press point. The drag
//! starts as soon as [`DragSequenceHandler::should_start_drag_interaction`]
//! holds, on the press itself or on any later drag event. Only the release of
//! the initiating button ends the sequence; presses and releases of other
//! buttons are ignored meanwhile.
//!
//! What a drag *does* is left to a [`DragPolicy`]. The drag activity forwards
//! the most recently recorded event to the policy on every tick, so a policy
//! can keep working while the pointer rests (auto-pan, continuous zoom).
//!
//! In every phase the sequence updates its own state before calling the policy:
//!
//! | Phase | Sequence | Then |
//! |---|---|---|
//! | start | record event, schedule activity, set dragging, take interaction hold | [`DragPolicy::start_drag`] |
//! | drag | record event | [`DragPolicy::drag`] |
//! | end | terminate activity (final step if it had started), clear event, release hold, clear dragging | [`DragPolicy::end_drag`] |

use kurbo::Point;
use understory_scene::activity::{
    ActivityDuration, ActivityId, ActivityStep, DEFAULT_STEP_RATE, StepPhase,
};

use crate::event::{InputEvent, MouseButton};
use crate::filter::EventFilter;
use crate::handler::{HandlerContext, HandlerId, InputEventHandler};

/// Per-handler drag session state.
#[derive(Clone, Debug)]
pub struct DragSession {
    is_dragging: bool,
    press_canvas_point: Point,
    sequence_button: Option<MouseButton>,
    activity: Option<ActivityId>,
    last_event: Option<InputEvent>,
    min_drag_start_distance: f64,
    step_rate: u64,
}

impl Default for DragSession {
    fn default() -> Self {
        Self {
            is_dragging: false,
            press_canvas_point: Point::ZERO,
            sequence_button: None,
            activity: None,
            last_event: None,
            min_drag_start_distance: 0.0,
            step_rate: DEFAULT_STEP_RATE,
        }
    }
}

impl DragSession {
    /// Returns true between start and end of a drag.
    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Canvas position of the press that armed the current sequence.
    pub fn press_canvas_point(&self) -> Point {
        self.press_canvas_point
    }

    /// The button that armed the current sequence; `None` while Idle.
    pub fn sequence_button(&self) -> Option<MouseButton> {
        self.sequence_button
    }

    /// The running drag activity.
    pub fn activity(&self) -> Option<ActivityId> {
        self.activity
    }

    /// The most recently recorded drag event.
    pub fn last_event(&self) -> Option<&InputEvent> {
        self.last_event.as_ref()
    }

    /// Canvas distance the pointer must travel from the press before a drag starts.
    pub fn min_drag_start_distance(&self) -> f64 {
        self.min_drag_start_distance
    }

    /// Step rate (milliseconds) given to the next drag activity.
    pub fn step_rate(&self) -> u64 {
        self.step_rate
    }
}

/// What a drag does. All hooks default to doing nothing.
///
/// Hooks run after the sequence has updated its own state; see the
/// [module docs](self).
pub trait DragPolicy: 'static {
    /// The filter a new [`DragSequenceHandler`] starts with.
    fn default_filter(&self) -> EventFilter {
        EventFilter::new()
    }

    /// Extra condition for starting a drag, checked after the distance threshold.
    fn should_start_drag(&self, _cx: &HandlerContext<'_>, _event: &InputEvent) -> bool {
        true
    }

    /// The drag started.
    fn start_drag(&mut self, _cx: &mut HandlerContext<'_>, _event: &InputEvent) {}

    /// The pointer moved during a drag.
    fn drag(&mut self, _cx: &mut HandlerContext<'_>, _event: &InputEvent) {}

    /// The drag ended with a release of the initiating button.
    fn end_drag(&mut self, _cx: &mut HandlerContext<'_>, _event: &InputEvent) {}

    /// The drag was abandoned because the handler is being removed.
    fn cancel_drag(&mut self, _cx: &mut HandlerContext<'_>) {}

    /// First tick of the drag activity.
    fn activity_first_step(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &InputEvent,
        _session: &DragSession,
    ) {
    }

    /// Regular tick of the drag activity.
    fn activity_step(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &InputEvent,
        _session: &DragSession,
    ) {
    }

    /// Last tick of the drag activity, run when the drag ends.
    fn activity_final_step(
        &mut self,
        _cx: &mut HandlerContext<'_>,
        _event: &InputEvent,
        _session: &DragSession,
    ) {
    }
}

/// A handler running the press/drag/release state machine for a [`DragPolicy`].
#[derive(Clone, Debug)]
pub struct DragSequenceHandler<P> {
    filter: EventFilter,
    session: DragSession,
    policy: P,
}

impl<P: DragPolicy + Default> Default for DragSequenceHandler<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: DragPolicy> DragSequenceHandler<P> {
    /// A handler for `policy`, with the policy's default filter.
    pub fn new(policy: P) -> Self {
        Self {
            filter: policy.default_filter(),
            session: DragSession::default(),
            policy,
        }
    }

    /// The policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The policy, mutably.
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// The session state.
    pub fn session(&self) -> &DragSession {
        &self.session
    }

    /// Returns true between start and end of a drag.
    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging
    }

    /// Canvas distance the pointer must travel from the press before a drag starts.
    pub fn min_drag_start_distance(&self) -> f64 {
        self.session.min_drag_start_distance
    }

    /// Set the start distance. Zero starts drags on press.
    pub fn set_min_drag_start_distance(&mut self, distance: f64) {
        self.session.min_drag_start_distance = distance;
    }

    /// Step rate (milliseconds) of drag activities.
    pub fn step_rate(&self) -> u64 {
        self.session.step_rate
    }

    /// Set the step rate of future drag activities.
    ///
    /// A running activity keeps its rate; retarget it with
    /// [`HandlerContext::set_activity_step_rate`].
    pub fn set_step_rate(&mut self, step_rate: u64) {
        self.session.step_rate = step_rate;
    }

    /// Whether `event` may start the drag: the pointer is at least
    /// [`min_drag_start_distance`](Self::min_drag_start_distance) from the press
    /// (inclusive) and the policy agrees.
    pub fn should_start_drag_interaction(&self, cx: &HandlerContext<'_>, event: &InputEvent) -> bool {
        let Some(position) = event.canvas_position() else {
            return false;
        };
        position.distance(self.session.press_canvas_point) >= self.session.min_drag_start_distance
            && self.policy.should_start_drag(cx, event)
    }

    fn start_drag(&mut self, cx: &mut HandlerContext<'_>, event: &InputEvent) {
        self.session.last_event = Some(event.clone());
        self.session.activity =
            Some(cx.schedule_activity(self.session.step_rate, ActivityDuration::Forever));
        self.session.is_dragging = true;
        cx.set_interacting(true);
        tracing::debug!(handler = cx.handler_id().get(), "drag started");
        self.policy.start_drag(cx, event);
    }

    fn drag(&mut self, cx: &mut HandlerContext<'_>, event: &InputEvent) {
        self.session.last_event = Some(event.clone());
        self.policy.drag(cx, event);
    }

    fn end_drag(&mut self, cx: &mut HandlerContext<'_>, event: &InputEvent) {
        self.stop_drag_activity(cx);
        self.session.last_event = None;
        cx.set_interacting(false);
        self.session.is_dragging = false;
        tracing::debug!(handler = cx.handler_id().get(), "drag ended");
        self.policy.end_drag(cx, event);
    }

    fn stop_drag_activity(&mut self, cx: &mut HandlerContext<'_>) {
        let Some(id) = self.session.activity.take() else {
            return;
        };
        if cx.terminate_activity(id)
            && let Some(last) = &self.session.last_event
        {
            self.policy.activity_final_step(cx, last, &self.session);
        }
    }
}

impl<P: DragPolicy> InputEventHandler for DragSequenceHandler<P> {
    fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut EventFilter {
        &mut self.filter
    }

    fn mouse_pressed(&mut self, cx: &mut HandlerContext<'_>, event: &mut InputEvent) {
        if self.session.sequence_button.is_some() {
            return;
        }
        let (Some(button), Some(position)) = (event.button(), event.canvas_position()) else {
            return;
        };
        self.session.sequence_button = Some(button);
        self.session.press_canvas_point = position;
        tracing::trace!(handler = cx.handler_id().get(), ?button, "drag sequence armed");
        if !self.session.is_dragging && self.should_start_drag_interaction(cx, event) {
            self.start_drag(cx, event);
        }
    }

    fn mouse_dragged(&mut self, cx: &mut HandlerContext<'_>, event: &mut InputEvent) {
        if self.session.sequence_button.is_none() {
            return;
        }
        if !self.session.is_dragging {
            if self.should_start_drag_interaction(cx, event) {
                self.start_drag(cx, event);
            }
            return;
        }
        self.drag(cx, event);
    }

    fn mouse_released(&mut self, cx: &mut HandlerContext<'_>, event: &mut InputEvent) {
        if self.session.sequence_button.is_none() || event.button() != self.session.sequence_button
        {
            return;
        }
        if self.session.is_dragging {
            self.end_drag(cx, event);
        }
        self.session.sequence_button = None;
    }

    fn activity_step(&mut self, cx: &mut HandlerContext<'_>, step: &ActivityStep<HandlerId>) {
        if self.session.activity != Some(step.id) {
            return;
        }
        if step.phase == StepPhase::Final {
            self.session.activity = None;
        }
        let Some(last) = &self.session.last_event else {
            return;
        };
        match step.phase {
            StepPhase::First => self.policy.activity_first_step(cx, last, &self.session),
            StepPhase::Step => self.policy.activity_step(cx, last, &self.session),
            StepPhase::Final => self.policy.activity_final_step(cx, last, &self.session),
        }
    }

    fn cancel(&mut self, cx: &mut HandlerContext<'_>) {
        if self.session.is_dragging {
            self.stop_drag_activity(cx);
            self.session.last_event = None;
            cx.set_interacting(false);
            self.session.is_dragging = false;
            self.policy.cancel_drag(cx);
        }
        self.session.sequence_button = None;
    }
}
