// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, geometry, cameras.

use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect, Vec2};

use crate::damage::Damage;
use crate::types::{LocalNode, NodeFlags, NodeId};
use crate::util::{transform_rect_bbox, transform_vec};

/// A retained tree of nodes with local transforms, plus cameras that view layers.
///
/// Unlike a batched box tree, changes take effect immediately: world transforms
/// are derived on demand by walking the parent chain, which keeps pick paths
/// valid while a drag is mutating the nodes on them. Every mutation that changes
/// what is drawn records a dirty rectangle, collected with [`Scene::take_damage`].
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use understory_scene::{LocalNode, Scene};
///
/// let mut scene = Scene::new();
/// let root = scene.insert(None, LocalNode::default());
/// let layer = scene.insert(Some(root), LocalNode::default());
/// let camera = scene.insert_camera(Some(root), LocalNode::with_bounds(Rect::new(0.0, 0.0, 400.0, 300.0)));
/// scene.add_layer(camera, layer);
/// let node = scene.insert(Some(layer), LocalNode::with_bounds(Rect::new(0.0, 0.0, 50.0, 50.0)));
///
/// scene.translate_view(camera, 100.0, 0.0);
/// let path = scene.pick(camera, Point::new(120.0, 10.0)).unwrap();
/// assert_eq!(path.picked_node(), node);
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    damage: Damage,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("pending_damage", &self.damage.dirty_rects.len())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CameraData {
    /// Maps view (global) space into the camera's local space.
    pub(crate) view_transform: Affine,
    /// Viewed layers, bottom-most first.
    pub(crate) layers: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) local: LocalNode,
    pub(crate) camera: Option<CameraData>,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            camera: None,
        }
    }
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            damage: Damage::default(),
        }
    }

    /// Insert a new node as the top-most child of `parent` (or as a root if `None`).
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent {
            self.link_parent(id, p);
        }
        self.invalidate(id);
        id
    }

    /// Insert a camera node with an identity view transform and no layers.
    ///
    /// When the camera is used as the top camera of a canvas, its parent space is
    /// the canvas (device) space.
    pub fn insert_camera(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let id = self.insert(parent, local);
        self.node_mut(id).camera = Some(CameraData {
            view_transform: Affine::IDENTITY,
            layers: Vec::new(),
        });
        id
    }

    /// Remove a node and its subtree. Cameras stop viewing removed layers.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.invalidate(id);
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        self.remove_subtree(id);
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let children = self.node(id).children.clone();
        for child in children {
            self.remove_subtree(child);
        }
        for cam in self.nodes.iter_mut().flatten() {
            if let Some(camera) = cam.camera.as_mut() {
                camera.layers.retain(|l| *l != id);
            }
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Reparent `id` under `new_parent`, as its top-most child.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.is_alive(id) {
            return;
        }
        self.invalidate(id);
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
        self.invalidate(id);
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Returns true if `id` is a live camera.
    pub fn is_camera(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.camera.is_some())
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Get the children of a node in paint order (last is top-most), or an empty slice if stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Returns the flags of a node if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.local.flags)
    }

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id)
            && n.local.flags != flags
        {
            n.local.flags = flags;
            self.invalidate(id);
        }
    }

    /// Local bounds of a live node.
    pub fn local_bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.local.local_bounds)
    }

    /// Update local bounds.
    pub fn set_local_bounds(&mut self, id: NodeId, bounds: Rect) {
        if self.local_bounds(id).is_some_and(|b| b != bounds) {
            self.invalidate(id);
            self.node_mut(id).local.local_bounds = bounds;
            self.invalidate(id);
        }
    }

    /// Local transform (local → parent) of a live node.
    pub fn local_transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.local.local_transform)
    }

    /// Update local transform.
    pub fn set_local_transform(&mut self, id: NodeId, tf: Affine) {
        if self.local_transform(id).is_some_and(|t| t != tf) {
            self.invalidate(id);
            self.node_mut(id).local.local_transform = tf;
            self.invalidate(id);
        }
    }

    /// Translate a node by `(dx, dy)` expressed in its parent's coordinate space.
    pub fn offset(&mut self, id: NodeId, dx: f64, dy: f64) {
        if let Some(tf) = self.local_transform(id) {
            self.set_local_transform(id, Affine::translate((dx, dy)) * tf);
        }
    }

    /// Move a node to the top of its parent's paint order.
    pub fn raise_to_top(&mut self, id: NodeId) {
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        let siblings = &mut self.node_mut(parent).children;
        if siblings.last() == Some(&id) {
            return;
        }
        siblings.retain(|c| *c != id);
        siblings.push(id);
        self.invalidate(id);
    }

    /// Return the transform mapping a node's local space into the global (root) space.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        let mut node = self.node_opt(id)?;
        let mut tf = node.local.local_transform;
        while let Some(parent) = node.parent {
            node = self.node_opt(parent)?;
            tf = node.local.local_transform * tf;
        }
        Some(tf)
    }

    /// Return the global-space axis-aligned bounding box of a node's own bounds.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        let tf = self.world_transform(id)?;
        Some(transform_rect_bbox(tf, self.node(id).local.local_bounds))
    }

    /// Map a point from a node's local space into global space.
    pub fn local_to_global(&self, id: NodeId, point: Point) -> Option<Point> {
        Some(self.world_transform(id)? * point)
    }

    /// Map a global-space point into a node's local space.
    pub fn global_to_local(&self, id: NodeId, point: Point) -> Option<Point> {
        Some(self.world_transform(id)?.inverse() * point)
    }

    /// Map a displacement from a node's local space into its parent's space.
    pub fn local_to_parent_vec(&self, id: NodeId, v: Vec2) -> Option<Vec2> {
        Some(transform_vec(self.local_transform(id)?, v))
    }

    // --- cameras ---

    /// Add `layer` as the top-most layer viewed by `camera`.
    ///
    /// Returns false if `camera` is not a camera, `layer` is stale, or it is already viewed.
    pub fn add_layer(&mut self, camera: NodeId, layer: NodeId) -> bool {
        if !self.is_alive(layer) {
            return false;
        }
        let Some(cam) = self.camera_mut(camera) else {
            return false;
        };
        if cam.layers.contains(&layer) {
            return false;
        }
        cam.layers.push(layer);
        self.invalidate(camera);
        true
    }

    /// Stop viewing `layer` through `camera`. Returns true if it was viewed.
    pub fn remove_layer(&mut self, camera: NodeId, layer: NodeId) -> bool {
        let Some(cam) = self.camera_mut(camera) else {
            return false;
        };
        let before = cam.layers.len();
        cam.layers.retain(|l| *l != layer);
        let removed = cam.layers.len() != before;
        if removed {
            self.invalidate(camera);
        }
        removed
    }

    /// Layers viewed by `camera`, bottom-most first.
    pub fn layers_of(&self, camera: NodeId) -> &[NodeId] {
        match self.camera(camera) {
            Some(c) => &c.layers,
            None => &[],
        }
    }

    /// The view transform of a camera (view space → camera local space).
    pub fn view_transform(&self, camera: NodeId) -> Option<Affine> {
        self.camera(camera).map(|c| c.view_transform)
    }

    /// Replace the view transform of a camera.
    pub fn set_view_transform(&mut self, camera: NodeId, tf: Affine) {
        if let Some(cam) = self.camera_mut(camera)
            && cam.view_transform != tf
        {
            cam.view_transform = tf;
            self.invalidate(camera);
        }
    }

    /// Translate the view by `(dx, dy)` expressed in view space.
    pub fn translate_view(&mut self, camera: NodeId, dx: f64, dy: f64) {
        if let Some(tf) = self.view_transform(camera) {
            self.set_view_transform(camera, tf * Affine::translate((dx, dy)));
        }
    }

    /// Scale the view by `scale` keeping the view-space point `about` fixed on screen.
    pub fn scale_view_about_point(&mut self, camera: NodeId, scale: f64, about: Point) {
        if let Some(tf) = self.view_transform(camera) {
            let about = about.to_vec2();
            let scaled =
                tf * Affine::translate(about) * Affine::scale(scale) * Affine::translate(-about);
            self.set_view_transform(camera, scaled);
        }
    }

    /// The uniform scale of the view transform (length of the transformed x unit vector).
    pub fn view_scale(&self, camera: NodeId) -> Option<f64> {
        let [a, b, ..] = self.view_transform(camera)?.as_coeffs();
        Some(Vec2::new(a, b).hypot())
    }

    /// The camera's bounds expressed in view space.
    pub fn view_bounds(&self, camera: NodeId) -> Option<Rect> {
        let tf = self.view_transform(camera)?;
        Some(transform_rect_bbox(
            tf.inverse(),
            self.node(camera).local.local_bounds,
        ))
    }

    /// Map a displacement from camera local space into view space.
    pub fn local_to_view_vec(&self, camera: NodeId, v: Vec2) -> Option<Vec2> {
        Some(transform_vec(self.view_transform(camera)?.inverse(), v))
    }

    // --- damage ---

    /// Record the current global bounds of a node's subtree as needing repaint.
    pub fn invalidate(&mut self, id: NodeId) {
        if let Some(bounds) = self.full_world_bounds(id) {
            self.damage.push(bounds);
        }
    }

    /// Take the damage accumulated since the previous call.
    pub fn take_damage(&mut self) -> Damage {
        core::mem::take(&mut self.damage)
    }

    /// Union of the global bounds of a node and all of its descendants.
    pub fn full_world_bounds(&self, id: NodeId) -> Option<Rect> {
        let mut acc = self.world_bounds(id).filter(|r| !r.is_zero_area());
        for child in self.children_of(id) {
            if let Some(r) = self.full_world_bounds(*child) {
                acc = Some(acc.map_or(r, |a| a.union(r)));
            }
        }
        acc
    }

    // --- internals ---

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes[id.idx()].as_ref()
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes[id.idx()].as_mut()
    }

    fn camera(&self, id: NodeId) -> Option<&CameraData> {
        self.node_opt(id).and_then(|n| n.camera.as_ref())
    }

    fn camera_mut(&mut self, id: NodeId) -> Option<&mut CameraData> {
        self.node_opt_mut(id).and_then(|n| n.camera.as_mut())
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        if !self.is_alive(parent) {
            return;
        }
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children.push(id);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if self.is_alive(parent) {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
        self.node_mut(id).parent = None;
    }
}
