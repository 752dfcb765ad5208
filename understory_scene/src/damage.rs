// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage summary types returned from [`crate::Scene::take_damage`].

use alloc::vec::Vec;
use kurbo::Rect;

/// Regions invalidated by scene mutations since the last [`crate::Scene::take_damage`].
#[derive(Clone, Debug, Default)]
pub struct Damage {
    /// Rectangles in the scene's root coordinate space that should be repainted.
    pub dirty_rects: Vec<Rect>,
}

impl Damage {
    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Returns true if nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    pub(crate) fn push(&mut self, rect: Rect) {
        if rect.is_zero_area() {
            return;
        }
        self.dirty_rects.push(rect);
    }
}
