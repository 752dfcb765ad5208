// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene --heading-base-level=0

//! Understory Scene: a Kurbo-native scene graph with cameras and pick paths.
//!
//! This crate is the substrate an input layer routes events through. It is
//! deliberately small: a tree of nodes, cameras that look at layers, picking,
//! coarse damage, and a cooperative activity scheduler.
//!
//! - Represents a hierarchy of nodes with local bounds, local transforms, and flags.
//! - Any node may be a camera: a camera has a *view transform* and an ordered
//!   list of layers it views. Cameras may be nested (a camera placed inside a
//!   layer viewed by another camera).
//! - [`Scene::pick`] resolves a canvas point into a [`PickPath`]: the chain from
//!   the top camera down to the picked node. Coordinate conversions on the path
//!   read transforms from the scene each time, so they stay valid while the
//!   nodes on the path move.
//! - Mutations record damage in root space, drained with [`Scene::take_damage`].
//! - [`activity::ActivityScheduler`] computes due steps of recurring tasks; the
//!   host decides how to deliver them.
//!
//! ## Coordinate spaces
//!
//! - *Local*: a node's own space; [`LocalNode::local_transform`] maps it into its parent's space.
//! - *Global*: the space of the tree root(s); layers live here.
//! - *View*: the global space as seen by a camera; the view transform maps it into the camera's local space.
//! - *Canvas*: the parent space of the top camera, usually device pixels.
//!
//! ## API overview
//!
//! - [`Scene`]: container managing nodes, cameras, and damage.
//! - [`LocalNode`] / [`NodeFlags`] / [`NodeId`]: per-node data and handles.
//! - [`PickPath`] / [`PathEntry`] / [`PathStep`]: results of picking.
//! - [`Damage`]: rectangles to repaint.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod activity;
mod damage;
mod pick;
mod scene;
mod types;
mod util;

pub use damage::Damage;
pub use pick::{PathEntry, PathStep, PickPath};
pub use scene::Scene;
pub use types::{LocalNode, NodeFlags, NodeId};
pub use util::transform_vec;
