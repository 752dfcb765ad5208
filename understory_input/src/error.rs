// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced at the crate boundary.

use crate::kind::EventKind;

/// Errors produced when converting host data into input types.
///
/// Everything past this boundary is statically typed, so these only arise when
/// a host hands over raw numeric codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// A numeric event code outside the closed set of [`EventKind`](crate::EventKind)s.
    #[error("unknown input event kind code {0}")]
    UnknownEventKind(u32),
    /// A numeric button outside the supported mouse buttons.
    #[error("unknown mouse button {0}")]
    UnknownButton(u8),
    /// A raw event handed over with a kind it cannot carry, such as key data for a mouse press.
    #[error("raw event cannot be delivered as {0:?}")]
    KindMismatch(EventKind),
}
