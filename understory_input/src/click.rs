// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click counting and click synthesis.
//!
//! Hosts report presses and releases; [`ClickTracker`] answers two questions:
//!
//! - **How many clicks is this press?** A press continues a multi-click run when
//!   it uses the same button as the previous press, arrives within
//!   [`ClickTracker::multi_click_interval`] milliseconds of it, and lands within
//!   [`ClickTracker::multi_click_slop`] pixels of it. Otherwise the count restarts at 1.
//! - **Does this release produce a click?** Only when it ends the tracked press
//!   (same button), hits the same target the press hit, and the pointer never
//!   strayed further than the slop from the press position in between.
//!
//! ```
//! use kurbo::Point;
//! use understory_input::click::{ClickResult, ClickTracker};
//! use understory_input::MouseButton;
//!
//! let mut clicks: ClickTracker<u32> = ClickTracker::new();
//!
//! assert_eq!(clicks.on_down(MouseButton::Primary, 7, Point::new(10.0, 10.0), 1000), 1);
//! assert_eq!(
//!     clicks.on_up(MouseButton::Primary, &7, Point::new(11.0, 10.0)),
//!     ClickResult::Click(7, 1)
//! );
//!
//! // A quick second press nearby is a double click.
//! assert_eq!(clicks.on_down(MouseButton::Primary, 7, Point::new(12.0, 11.0), 1200), 2);
//! ```

use kurbo::Point;

use crate::event::MouseButton;

/// Default maximum delay between presses of a multi-click, in milliseconds.
pub const DEFAULT_MULTI_CLICK_INTERVAL: u64 = 500;

/// Default distance the pointer may travel while still counting as a click, in pixels.
pub const DEFAULT_MULTI_CLICK_SLOP: f64 = 4.0;

/// Click counting and click synthesis for a single pointer.
#[derive(Clone, Debug)]
pub struct ClickTracker<K> {
    /// Maximum delay between presses of a multi-click, in milliseconds.
    pub multi_click_interval: u64,
    /// Maximum pointer travel for multi-clicks and for a release to still click.
    pub multi_click_slop: f64,
    press: Option<Press<K>>,
    previous: Option<PressRecord>,
}

/// An active press.
#[derive(Clone, Debug, PartialEq)]
pub struct Press<K> {
    /// What the press hit.
    pub target: K,
    /// The pressed button.
    pub button: MouseButton,
    /// Pointer position at press time.
    pub position: Point,
    /// Press time, in milliseconds.
    pub time: u64,
    /// Click count assigned to the press.
    pub click_count: u32,
    /// True once the pointer strayed beyond the slop.
    pub distance_exceeded: bool,
}

#[derive(Clone, Copy, Debug)]
struct PressRecord {
    button: MouseButton,
    position: Point,
    time: u64,
    click_count: u32,
}

/// Outcome of a release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickResult<K> {
    /// Synthesize a click on the target with the given click count.
    Click(K, u32),
    /// No click; carries the press target if the release ended a press.
    Suppressed(Option<K>),
}

impl<K: PartialEq + Clone> Default for ClickTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq + Clone> ClickTracker<K> {
    /// A tracker with the default interval and slop.
    pub fn new() -> Self {
        Self::with_thresholds(DEFAULT_MULTI_CLICK_INTERVAL, DEFAULT_MULTI_CLICK_SLOP)
    }

    /// A tracker with a custom interval (milliseconds) and slop (pixels).
    pub fn with_thresholds(multi_click_interval: u64, multi_click_slop: f64) -> Self {
        Self {
            multi_click_interval,
            multi_click_slop,
            press: None,
            previous: None,
        }
    }

    /// Record a press and return its click count.
    ///
    /// A new press replaces any press still being tracked.
    pub fn on_down(&mut self, button: MouseButton, target: K, position: Point, now: u64) -> u32 {
        let click_count = match self.previous {
            Some(prev)
                if prev.button == button
                    && now.saturating_sub(prev.time) <= self.multi_click_interval
                    && prev.position.distance(position) <= self.multi_click_slop =>
            {
                prev.click_count.saturating_add(1)
            }
            _ => 1,
        };
        self.previous = Some(PressRecord {
            button,
            position,
            time: now,
            click_count,
        });
        self.press = Some(Press {
            target,
            button,
            position,
            time: now,
            click_count,
            distance_exceeded: false,
        });
        click_count
    }

    /// Track pointer motion during a press.
    ///
    /// Returns true when the pointer leaves the slop for the first time; the
    /// current press can then no longer click.
    pub fn on_move(&mut self, position: Point) -> bool {
        let slop = self.multi_click_slop;
        match &mut self.press {
            Some(press) if !press.distance_exceeded && press.position.distance(position) > slop => {
                press.distance_exceeded = true;
                true
            }
            _ => false,
        }
    }

    /// Record a release over `current_target`.
    pub fn on_up(&mut self, button: MouseButton, current_target: &K, position: Point) -> ClickResult<K> {
        let Some(press) = self.press.take_if(|p| p.button == button) else {
            return ClickResult::Suppressed(None);
        };
        let within_slop =
            !press.distance_exceeded && press.position.distance(position) <= self.multi_click_slop;
        if within_slop && press.target == *current_target {
            ClickResult::Click(press.target, press.click_count)
        } else {
            ClickResult::Suppressed(Some(press.target))
        }
    }

    /// The press being tracked.
    pub fn press(&self) -> Option<&Press<K>> {
        self.press.as_ref()
    }

    /// Click count of the press being tracked, or zero.
    pub fn click_count(&self) -> u32 {
        self.press.as_ref().map_or(0, |p| p.click_count)
    }

    /// Forget the tracked press. Returns true if there was one.
    pub fn cancel(&mut self) -> bool {
        self.press.take().is_some()
    }

    /// Forget the press and the multi-click history.
    pub fn clear(&mut self) {
        self.press = None;
        self.previous = None;
    }
}
