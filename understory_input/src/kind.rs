// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of event kinds a handler can receive.

use crate::error::InputError;

/// Kind of an input event, as seen by handlers.
///
/// The same [`InputEvent`](crate::InputEvent) payload can be delivered under
/// different kinds (for example the pointer data of a release is reused for the
/// synthesized click), so the kind travels next to the event rather than in it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A key went down.
    KeyPressed,
    /// A key went up.
    KeyReleased,
    /// A character was typed.
    KeyTyped,
    /// A button was pressed and released on the same node.
    MouseClicked,
    /// The pointer moved with a button held.
    MouseDragged,
    /// The pointer entered a node.
    MouseEntered,
    /// The pointer left a node.
    MouseExited,
    /// The pointer moved with no button held.
    MouseMoved,
    /// A button went down.
    MousePressed,
    /// A button went up.
    MouseReleased,
    /// The wheel scrolled by units (lines).
    MouseWheelRotated,
    /// The wheel scrolled by blocks (pages).
    MouseWheelRotatedByBlock,
    /// Keyboard focus arrived.
    KeyboardFocusGained,
    /// Keyboard focus left.
    KeyboardFocusLost,
}

impl EventKind {
    /// Every kind, ordered by [`EventKind::code`].
    pub const ALL: [Self; 14] = [
        Self::KeyPressed,
        Self::KeyReleased,
        Self::KeyTyped,
        Self::MouseClicked,
        Self::MouseDragged,
        Self::MouseEntered,
        Self::MouseExited,
        Self::MouseMoved,
        Self::MousePressed,
        Self::MouseReleased,
        Self::MouseWheelRotated,
        Self::MouseWheelRotatedByBlock,
        Self::KeyboardFocusGained,
        Self::KeyboardFocusLost,
    ];

    /// Stable numeric code of the kind, in `0..14`.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns true for the key kinds.
    pub const fn is_key(self) -> bool {
        matches!(self, Self::KeyPressed | Self::KeyReleased | Self::KeyTyped)
    }

    /// Returns true for pointer kinds, wheel included.
    pub const fn is_mouse(self) -> bool {
        matches!(
            self,
            Self::MouseClicked
                | Self::MouseDragged
                | Self::MouseEntered
                | Self::MouseExited
                | Self::MouseMoved
                | Self::MousePressed
                | Self::MouseReleased
                | Self::MouseWheelRotated
                | Self::MouseWheelRotatedByBlock
        )
    }

    /// Returns true for the two wheel kinds.
    pub const fn is_wheel(self) -> bool {
        matches!(self, Self::MouseWheelRotated | Self::MouseWheelRotatedByBlock)
    }

    /// Returns true for the two keyboard focus kinds.
    pub const fn is_focus(self) -> bool {
        matches!(self, Self::KeyboardFocusGained | Self::KeyboardFocusLost)
    }
}

impl TryFrom<u32> for EventKind {
    type Error = InputError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(InputError::UnknownEventKind(code))
    }
}

impl From<EventKind> for u32 {
    fn from(kind: EventKind) -> Self {
        kind.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_and_are_dense() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.code() as usize, i);
            assert_eq!(EventKind::try_from(kind.code()), Ok(*kind));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(
            EventKind::try_from(14),
            Err(InputError::UnknownEventKind(14))
        );
        assert_eq!(
            EventKind::try_from(u32::MAX),
            Err(InputError::UnknownEventKind(u32::MAX))
        );
    }

    #[test]
    fn classification_partitions_kinds() {
        for kind in EventKind::ALL {
            let classes = [kind.is_key(), kind.is_mouse(), kind.is_focus()];
            assert_eq!(
                classes.iter().filter(|c| **c).count(),
                1,
                "{kind:?} must be exactly one of key/mouse/focus"
            );
            if kind.is_wheel() {
                assert!(kind.is_mouse());
            }
        }
    }
}
