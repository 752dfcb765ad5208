// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative scheduler for recurring activities.
//!
//! An activity is a timed task identified by an [`ActivityId`] and tagged with
//! an owner key. The scheduler never calls user code: the host calls
//! [`ActivityScheduler::process`] with the current time (milliseconds) and
//! receives the steps that are due, which it then delivers to the owners.
//!
//! ```
//! use understory_scene::activity::{ActivityDuration, ActivityScheduler, StepPhase};
//!
//! let mut scheduler: ActivityScheduler<u32> = ActivityScheduler::new();
//! let id = scheduler.schedule(7, 1000, 20, ActivityDuration::Forever);
//!
//! let steps = scheduler.process(1000);
//! assert_eq!(steps[0].phase, StepPhase::First);
//! assert_eq!(steps[1].phase, StepPhase::Step);
//!
//! // Not due yet.
//! assert!(scheduler.process(1010).is_empty());
//! assert_eq!(scheduler.process(1020).len(), 1);
//!
//! // The caller owes the owner a final step when a started activity is terminated.
//! assert!(scheduler.terminate(id));
//! assert!(!scheduler.is_live(id));
//! ```

use alloc::vec::Vec;
use smallvec::SmallVec;

/// Default step rate in milliseconds (50 steps per second).
pub const DEFAULT_STEP_RATE: u64 = 20;

/// Identifier of a scheduled activity. Never reused by a scheduler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(u64);

/// How long an activity runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActivityDuration {
    /// Runs until terminated.
    Forever,
    /// Runs for the given number of milliseconds after its start time.
    Millis(u64),
}

/// Which callback a step corresponds to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepPhase {
    /// The activity started. Always immediately followed by a `Step`, unless the activity
    /// already reached its stop time, in which case it is followed by `Final`.
    First,
    /// A regular step.
    Step,
    /// The activity finished on its own.
    Final,
}

/// A due step returned by [`ActivityScheduler::process`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActivityStep<O> {
    /// The activity.
    pub id: ActivityId,
    /// The owner key given at scheduling time.
    pub owner: O,
    /// Which callback to run.
    pub phase: StepPhase,
    /// Milliseconds since the activity's start time.
    pub elapsed: u64,
}

#[derive(Clone, Debug)]
struct Activity<O> {
    id: ActivityId,
    owner: O,
    start_time: u64,
    step_rate: u64,
    duration: ActivityDuration,
    next_step_time: u64,
    started: bool,
}

/// Holds live activities and computes which steps are due.
#[derive(Clone, Debug)]
pub struct ActivityScheduler<O> {
    activities: Vec<Activity<O>>,
    next_id: u64,
}

impl<O: Copy> Default for ActivityScheduler<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Copy> ActivityScheduler<O> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            activities: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedule an activity starting at `start_time`, stepping every `step_rate` milliseconds.
    ///
    /// A zero step rate is treated as one millisecond.
    pub fn schedule(
        &mut self,
        owner: O,
        start_time: u64,
        step_rate: u64,
        duration: ActivityDuration,
    ) -> ActivityId {
        let id = ActivityId(self.next_id);
        self.next_id += 1;
        self.activities.push(Activity {
            id,
            owner,
            start_time,
            step_rate: step_rate.max(1),
            duration,
            next_step_time: start_time,
            started: false,
        });
        tracing::trace!(activity = id.0, step_rate, "scheduled activity");
        id
    }

    /// Returns true while the activity has been neither terminated nor finished.
    pub fn is_live(&self, id: ActivityId) -> bool {
        self.find(id).is_some()
    }

    /// The step rate (milliseconds) of a live activity.
    pub fn step_rate(&self, id: ActivityId) -> Option<u64> {
        self.find(id).map(|a| a.step_rate)
    }

    /// Change the step rate of a live activity. Takes effect after the next step.
    pub fn set_step_rate(&mut self, id: ActivityId, step_rate: u64) {
        if let Some(a) = self.activities.iter_mut().find(|a| a.id == id) {
            a.step_rate = step_rate.max(1);
        }
    }

    /// The owner of a live activity.
    pub fn owner(&self, id: ActivityId) -> Option<O> {
        self.find(id).map(|a| a.owner)
    }

    /// Terminate an activity.
    ///
    /// Returns true if the activity was live and had already delivered its first
    /// step; the caller is then responsible for running the owner's final step.
    pub fn terminate(&mut self, id: ActivityId) -> bool {
        let Some(pos) = self.activities.iter().position(|a| a.id == id) else {
            return false;
        };
        let activity = self.activities.remove(pos);
        tracing::trace!(activity = id.0, "terminated activity");
        activity.started
    }

    /// Terminate every activity belonging to `owner`, returning the ids that had started.
    pub fn terminate_owned_by(&mut self, owner: O) -> SmallVec<[ActivityId; 2]>
    where
        O: PartialEq,
    {
        let mut started = SmallVec::new();
        self.activities.retain(|a| {
            if a.owner != owner {
                return true;
            }
            if a.started {
                started.push(a.id);
            }
            false
        });
        started
    }

    /// Collect the steps due at `now`, in scheduling order.
    ///
    /// Finite activities that reach their stop time are removed after yielding `Final`.
    pub fn process(&mut self, now: u64) -> SmallVec<[ActivityStep<O>; 4]> {
        let mut steps = SmallVec::new();
        self.activities.retain_mut(|a| {
            if now < a.next_step_time {
                return true;
            }
            let elapsed = now - a.start_time;
            if !a.started {
                a.started = true;
                steps.push(ActivityStep {
                    id: a.id,
                    owner: a.owner,
                    phase: StepPhase::First,
                    elapsed,
                });
            }
            if let ActivityDuration::Millis(duration) = a.duration
                && elapsed >= duration
            {
                steps.push(ActivityStep {
                    id: a.id,
                    owner: a.owner,
                    phase: StepPhase::Final,
                    elapsed,
                });
                return false;
            }
            steps.push(ActivityStep {
                id: a.id,
                owner: a.owner,
                phase: StepPhase::Step,
                elapsed,
            });
            a.next_step_time = now + a.step_rate;
            true
        });
        steps
    }

    /// Number of live activities.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Returns true if no activity is live.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    fn find(&self, id: ActivityId) -> Option<&Activity<O>> {
        self.activities.iter().find(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn phases<O: Copy>(steps: &[ActivityStep<O>]) -> Vec<StepPhase> {
        steps.iter().map(|s| s.phase).collect()
    }

    #[test]
    fn nothing_happens_before_start_time() {
        let mut s = ActivityScheduler::new();
        s.schedule(1_u8, 100, 20, ActivityDuration::Forever);
        assert!(s.process(99).is_empty());
        assert_eq!(phases(&s.process(100)), vec![StepPhase::First, StepPhase::Step]);
    }

    #[test]
    fn forever_activity_steps_at_its_rate() {
        let mut s = ActivityScheduler::new();
        let id = s.schedule('a', 0, 20, ActivityDuration::Forever);
        let _ = s.process(0);
        assert!(s.process(19).is_empty());
        let steps = s.process(25);
        assert_eq!(phases(&steps), vec![StepPhase::Step]);
        assert_eq!(steps[0].elapsed, 25);
        assert_eq!(steps[0].owner, 'a');
        // The next step is scheduled relative to when this one ran.
        assert!(s.process(44).is_empty());
        assert_eq!(s.process(45).len(), 1);
        assert!(s.is_live(id));
    }

    #[test]
    fn finite_activity_finishes_once() {
        let mut s = ActivityScheduler::new();
        let id = s.schedule(0_u8, 0, 10, ActivityDuration::Millis(30));
        let _ = s.process(0);
        let _ = s.process(10);
        let _ = s.process(20);
        assert_eq!(phases(&s.process(30)), vec![StepPhase::Final]);
        assert!(!s.is_live(id));
        assert!(s.process(40).is_empty());
    }

    #[test]
    fn late_first_processing_of_an_expired_activity() {
        let mut s = ActivityScheduler::new();
        s.schedule(0_u8, 0, 10, ActivityDuration::Millis(5));
        assert_eq!(
            phases(&s.process(50)),
            vec![StepPhase::First, StepPhase::Final]
        );
        assert!(s.is_empty());
    }

    #[test]
    fn terminate_reports_whether_started() {
        let mut s = ActivityScheduler::new();
        let pending = s.schedule(0_u8, 100, 10, ActivityDuration::Forever);
        let running = s.schedule(0_u8, 0, 10, ActivityDuration::Forever);
        let _ = s.process(0);
        assert!(!s.terminate(pending));
        assert!(s.terminate(running));
        assert!(!s.terminate(running), "terminating twice is a no-op");
        assert!(s.is_empty());
    }

    #[test]
    fn step_rate_is_adjustable() {
        let mut s = ActivityScheduler::new();
        let id = s.schedule(0_u8, 0, 10, ActivityDuration::Forever);
        assert_eq!(s.step_rate(id), Some(10));
        s.set_step_rate(id, 40);
        assert_eq!(s.step_rate(id), Some(40));
        s.set_step_rate(id, 0);
        assert_eq!(s.step_rate(id), Some(1));
    }

    #[test]
    fn terminate_owned_by_only_touches_that_owner() {
        let mut s = ActivityScheduler::new();
        let a = s.schedule(1_u8, 0, 10, ActivityDuration::Forever);
        let b = s.schedule(2_u8, 0, 10, ActivityDuration::Forever);
        let c = s.schedule(1_u8, 500, 10, ActivityDuration::Forever);
        let _ = s.process(0);
        let started = s.terminate_owned_by(1);
        assert_eq!(started.as_slice(), &[a]);
        assert!(!s.is_live(c));
        assert!(s.is_live(b));
        assert_eq!(s.owner(b), Some(2));
    }
}
