// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_input --heading-base-level=0

//! Understory Input: input events, filters, and interaction handlers for an Understory scene.
//!
//! This crate turns host input into handler calls. A [`Canvas`] owns an
//! [`understory_scene::Scene`], picks under the pointer, and delivers typed
//! events to the [`InputEventHandler`]s attached to nodes along the pick path.
//!
//! - [`EventFilter`] decides, per handler, which events it sees: by kind, by
//!   modifier masks, by click count, and by whether the event was already handled.
//! - [`InputEvent`] wraps the raw host event with its pick path, and answers
//!   coordinate questions (canvas, view, any node's local space).
//! - [`DragSequenceHandler`] runs the press/drag/release state machine, with a
//!   minimum start distance, an interaction hold, and a recurring activity that
//!   keeps ticking while the pointer rests. What a drag *does* is a [`DragPolicy`]:
//!   - [`DragNode`] moves the picked node by pointer deltas.
//!   - [`Pan`] translates the camera view, and autopans when the pointer leaves the camera.
//!   - [`Zoom`] scales the view about the press point at a rate set by horizontal displacement.
//! - [`click::ClickTracker`] counts multi-clicks and decides when a release is a click.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Affine, Point, Rect};
//! use understory_input::{
//!     Canvas, DragHandler, DragNode, InputEventHandler, Modifiers, MouseButton,
//! };
//! use understory_scene::LocalNode;
//!
//! // The default canvas pans with the primary button and zooms with the secondary one.
//! let mut canvas = Canvas::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let layer = canvas.layer();
//! let node = canvas
//!     .scene_mut()
//!     .insert(Some(layer), LocalNode::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)));
//!
//! // Mark what the node's handler accepts, so the pan handler on the camera skips it.
//! let mut drag = DragHandler::new(DragNode::new());
//! drag.filter_mut().set_marks_accepted_events_as_handled(true);
//! canvas.add_input_handler(node, drag);
//!
//! let none = Modifiers::empty();
//! canvas.pointer_pressed(Point::new(10.0, 10.0), MouseButton::Primary, none, 0);
//! canvas.pointer_moved(Point::new(30.0, 15.0), none, 16);
//! canvas.pointer_released(Point::new(30.0, 15.0), MouseButton::Primary, none, 32);
//!
//! assert_eq!(
//!     canvas.scene().local_transform(node),
//!     Some(Affine::translate((20.0, 5.0)))
//! );
//! assert_eq!(
//!     canvas.scene().view_transform(canvas.camera()),
//!     Some(Affine::IDENTITY)
//! );
//! ```
//!
//! ## Delivery
//!
//! Along a pick path, handlers on the picked node run first, then those on each
//! ancestor up to the top camera. Handlers on one node run in registration
//! order. Marking an event handled does not stop delivery; later handlers skip
//! it unless their filter accepts already-handled events.
//!
//! ## Time
//!
//! Every entry point takes the host's clock in milliseconds. Drag activities
//! step when the host calls [`Canvas::tick`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod canvas;
pub mod click;
mod drag;
mod drag_sequence;
mod error;
mod event;
mod filter;
mod handler;
mod kind;
mod pan;
mod zoom;

pub use canvas::{Canvas, RenderQuality};
pub use drag::{DragHandler, DragNode};
pub use drag_sequence::{DragPolicy, DragSequenceHandler, DragSession};
pub use error::InputError;
pub use event::{
    InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent, RawEvent, ScrollKind, WheelEvent,
};
pub use filter::EventFilter;
pub use handler::{BasicEventHandler, HandlerContext, HandlerId, InputEventHandler};
pub use kind::EventKind;
pub use pan::{DEFAULT_MAX_AUTOPAN_SPEED, DEFAULT_MIN_AUTOPAN_SPEED, Pan, PanHandler};
pub use zoom::{ZOOM_SENSITIVITY, Zoom, ZoomHandler};
