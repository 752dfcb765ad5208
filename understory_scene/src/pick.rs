// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking: resolve a canvas point into the chain of nodes and cameras under it.
//!
//! A [`PickPath`] records *which* nodes were traversed and *how* each one was
//! entered (through its parent, or through a camera's view). The transforms
//! themselves are read from the [`Scene`] every time a coordinate conversion is
//! requested, so a path captured on press stays accurate while a drag moves the
//! nodes or the camera view.

use kurbo::{Affine, Point, Vec2};
use smallvec::SmallVec;

use crate::scene::Scene;
use crate::types::{NodeFlags, NodeId};
use crate::util::transform_vec;

/// How a path entry relates to the entry before it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathStep {
    /// Entered through the node's own local transform, from its parent's space
    /// (or from canvas space for the first entry).
    Local,
    /// Entered through `camera`'s view: a layer seen by the camera.
    Viewed {
        /// The camera whose view transform bridges into this entry.
        camera: NodeId,
    },
}

/// One node on a pick path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PathEntry {
    /// The node.
    pub node: NodeId,
    /// How the node was entered.
    pub step: PathStep,
    /// Whether the node is a camera.
    pub is_camera: bool,
}

/// Ordered chain of nodes from the top camera (first) to the picked node (last).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PickPath {
    entries: SmallVec<[PathEntry; 8]>,
}

impl PickPath {
    /// Build a path from explicit entries, top camera first.
    pub fn from_entries(entries: impl IntoIterator<Item = PathEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// All entries, top camera first.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// Nodes on the path, top camera first.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.node)
    }

    /// Returns true if `node` lies on the path.
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.iter().any(|e| e.node == node)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the path has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The deepest node on the path.
    ///
    /// # Panics
    ///
    /// Panics if the path is empty; paths returned by [`Scene::pick`] never are.
    pub fn picked_node(&self) -> NodeId {
        self.entries.last().expect("empty pick path").node
    }

    /// The outermost camera (the one attached to the canvas).
    pub fn top_camera(&self) -> Option<NodeId> {
        self.entries.iter().find(|e| e.is_camera).map(|e| e.node)
    }

    /// The innermost camera, whose view the picked node is seen through.
    pub fn bottom_camera(&self) -> Option<NodeId> {
        self.entries.iter().rev().find(|e| e.is_camera).map(|e| e.node)
    }

    /// The transform mapping `node`'s local space into canvas space, computed
    /// from the scene's current state. `None` if `node` is not on the path.
    pub fn path_transform_to(&self, scene: &Scene, node: NodeId) -> Option<Affine> {
        let end = self.entries.iter().position(|e| e.node == node)?;
        let mut tf = Affine::IDENTITY;
        for entry in &self.entries[..=end] {
            let step = match entry.step {
                PathStep::Local => scene.local_transform(entry.node)?,
                PathStep::Viewed { camera } => {
                    scene.view_transform(camera)? * scene.world_transform(entry.node)?
                }
            };
            tf = tf * step;
        }
        Some(tf)
    }

    /// Map a canvas point into `node`'s local space.
    pub fn canvas_to_local(&self, scene: &Scene, point: Point, node: NodeId) -> Option<Point> {
        Some(self.path_transform_to(scene, node)?.inverse() * point)
    }

    /// Map a canvas displacement into `node`'s local space.
    pub fn canvas_to_local_vec(&self, scene: &Scene, v: Vec2, node: NodeId) -> Option<Vec2> {
        Some(transform_vec(
            self.path_transform_to(scene, node)?.inverse(),
            v,
        ))
    }

    /// Map a canvas point into the view space of `camera`.
    pub fn canvas_to_view(&self, scene: &Scene, point: Point, camera: NodeId) -> Option<Point> {
        Some(self.view_transform_to(scene, camera)?.inverse() * point)
    }

    /// Map a canvas displacement into the view space of `camera`.
    pub fn canvas_to_view_vec(&self, scene: &Scene, v: Vec2, camera: NodeId) -> Option<Vec2> {
        Some(transform_vec(
            self.view_transform_to(scene, camera)?.inverse(),
            v,
        ))
    }

    fn view_transform_to(&self, scene: &Scene, camera: NodeId) -> Option<Affine> {
        Some(self.path_transform_to(scene, camera)? * scene.view_transform(camera)?)
    }
}

impl Scene {
    /// Pick the top-most node under `canvas_point`, looking through `camera`.
    ///
    /// `canvas_point` is expressed in the camera's parent space. Returns `None`
    /// if `camera` is not a live camera or the point misses it entirely.
    ///
    /// Order of preference:
    /// - the camera's own children, top-most first, in camera space;
    /// - the camera's layers, top-most first, seen through the view transform;
    /// - the camera itself, if the point lies within its bounds.
    ///
    /// Plain nodes end the path when they are pickable and their (non-empty)
    /// bounds contain the point; their children are tried first.
    pub fn pick(&self, camera: NodeId, canvas_point: Point) -> Option<PickPath> {
        if !self.is_camera(camera) {
            return None;
        }
        let mut path = PickPath::default();
        if self.pick_node(camera, canvas_point, PathStep::Local, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    /// Try to pick `id`, where `point` is expressed in the space `step` enters from.
    fn pick_node(&self, id: NodeId, point: Point, step: PathStep, path: &mut PickPath) -> bool {
        let Some(node) = self.node_opt(id) else {
            return false;
        };
        if !node.local.flags.contains(NodeFlags::VISIBLE) {
            return false;
        }
        let to_local = match step {
            PathStep::Local => node.local.local_transform,
            PathStep::Viewed { .. } => match self.world_transform(id) {
                Some(tf) => tf,
                None => return false,
            },
        };
        let local = to_local.inverse() * point;
        path.entries.push(PathEntry {
            node: id,
            step,
            is_camera: node.camera.is_some(),
        });

        for child in node.children.iter().rev() {
            if self.pick_node(*child, local, PathStep::Local, path) {
                return true;
            }
        }

        let bounds = node.local.local_bounds;
        if let Some(camera) = &node.camera {
            if bounds.contains(local) {
                let view_point = camera.view_transform.inverse() * local;
                for layer in camera.layers.iter().rev() {
                    if self.pick_node(*layer, view_point, PathStep::Viewed { camera: id }, path) {
                        return true;
                    }
                }
                return true;
            }
        } else if node.local.flags.contains(NodeFlags::PICKABLE)
            && !bounds.is_zero_area()
            && bounds.contains(local)
        {
            return true;
        }

        path.entries.pop();
        false
    }
}
