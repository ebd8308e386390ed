// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **TRANSFORM**: drain dirty indices, recompute each layer's
//!    `world_transform` as `parent_world * local_transform` and
//!    `effective_hidden` as `parent_effective_hidden || !visible`.
//! 2. **ALPHA**: drain dirty indices, recompute each layer's
//!    `effective_alpha` as `parent_effective * alpha`.
//! 3. **CONTENT**: drain dirty indices (no recomputation; renderers read the
//!    current variant data from the store).
//! 4. **TOPOLOGY**: drain; a non-empty drain sets
//!    [`FrameChanges::topology_changed`].
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than [`LayerId`]
//! handles so that renderers can index directly into the store's arrays via
//! the `*_at()` accessors without paying for generation checks.
//!
//! [`LayerId`]: super::LayerId

use alloc::vec::Vec;

use super::id::INVALID;
use super::store::LayerStore;
use crate::dirty;
use crate::transform::Transform2d;

/// The set of changes produced by a single [`LayerStore::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Layers whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Layers whose effective alpha was recomputed.
    pub alphas: Vec<u32>,
    /// Layers whose image, renderer, or surface content changed.
    pub content: Vec<u32>,
    /// Layers that transitioned from visible to effectively hidden.
    pub hidden: Vec<u32>,
    /// Layers that transitioned from effectively hidden to visible.
    pub unhidden: Vec<u32>,
    /// Layers created since the last evaluate.
    pub added: Vec<u32>,
    /// Layers destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.alphas.clear();
        self.content.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.alphas.is_empty()
            && self.content.is_empty()
            && self.hidden.is_empty()
            && self.unhidden.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Evaluates the layer tree, recomputing dirty properties and returning
    /// the set of changes.
    ///
    /// World transforms and effective alphas are recomputed in
    /// parent-before-child order.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        let dirty_transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_transforms {
            let i = idx as usize;
            let parent_idx = self.parent[i];
            let (parent_world, parent_hidden) = if parent_idx != INVALID {
                (
                    self.world_transform[parent_idx as usize],
                    self.effective_hidden[parent_idx as usize],
                )
            } else {
                (Transform2d::IDENTITY, false)
            };
            self.world_transform[i] = parent_world * self.local_transform[i];

            let new_hidden = parent_hidden || !self.visible[i];
            if new_hidden != self.effective_hidden[i] {
                if new_hidden {
                    changes.hidden.push(idx);
                } else {
                    changes.unhidden.push(idx);
                }
                self.effective_hidden[i] = new_hidden;
            }
        }
        changes.transforms = dirty_transforms;

        let dirty_alphas: Vec<u32> = self
            .dirty
            .drain(dirty::ALPHA)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_alphas {
            let parent_alpha = match self.parent[idx as usize] {
                INVALID => 1.0,
                p => self.effective_alpha[p as usize],
            };
            self.effective_alpha[idx as usize] = parent_alpha * self.alpha[idx as usize];
        }
        changes.alphas = dirty_alphas;

        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }
}

#[cfg(test)]
mod tests {
    use crate::layer::{LayerId, LayerKind};

    use super::*;

    fn group(store: &mut LayerStore) -> LayerId {
        store.create_layer(LayerKind::Group { clip: None })
    }

    #[test]
    fn evaluate_computes_world_transforms() {
        let mut store = LayerStore::new();
        let parent = group(&mut store);
        let child = group(&mut store);

        let parent_xf = Transform2d::from_translation(10.0, 20.0);
        let child_xf = Transform2d::from_translation(5.0, 5.0);

        store.set_transform(parent, parent_xf);
        store.set_transform(child, child_xf);
        store.add_child(parent, child).unwrap();

        let _changes = store.evaluate();

        assert_eq!(store.world_transform(parent), parent_xf);
        assert_eq!(store.world_transform(child), parent_xf * child_xf);
        let t = store.world_transform(child).translation();
        assert_eq!((t.x, t.y), (15.0, 25.0));
    }

    #[test]
    fn evaluate_computes_effective_alpha() {
        let mut store = LayerStore::new();
        let parent = group(&mut store);
        let child = group(&mut store);

        store.set_alpha(parent, 0.5);
        store.set_alpha(child, 0.8);
        store.add_child(parent, child).unwrap();

        let _changes = store.evaluate();

        let eps = 1e-6;
        assert!((store.effective_alpha(parent) - 0.5).abs() < eps);
        assert!((store.effective_alpha(child) - 0.4).abs() < eps);
    }

    #[test]
    fn no_change_evaluate_returns_empty() {
        let mut store = LayerStore::new();
        let _root = group(&mut store);

        let first = store.evaluate();
        assert!(first.topology_changed);
        assert_eq!(first.added.len(), 1);

        let changes = store.evaluate();
        assert!(changes.is_empty());
    }

    #[test]
    fn hiding_propagates_to_descendants() {
        let mut store = LayerStore::new();
        let a = group(&mut store);
        let b = group(&mut store);
        let c = group(&mut store);
        store.add_child(a, b).unwrap();
        store.add_child(b, c).unwrap();
        let _ = store.evaluate();

        store.set_visible(b, false);
        let changes = store.evaluate();
        assert!(!store.effective_hidden(a));
        assert!(store.effective_hidden(b));
        assert!(store.effective_hidden(c));
        assert!(changes.hidden.contains(&b.idx));
        assert!(changes.hidden.contains(&c.idx));

        store.set_visible(b, true);
        let changes = store.evaluate();
        assert!(!store.effective_hidden(c));
        assert!(changes.unhidden.contains(&c.idx));
    }

    #[test]
    fn detaching_resets_inherited_state() {
        let mut store = LayerStore::new();
        let parent = group(&mut store);
        let child = group(&mut store);
        store.set_transform(parent, Transform2d::from_translation(3.0, 0.0));
        store.set_alpha(parent, 0.5);
        store.add_child(parent, child).unwrap();
        let _ = store.evaluate();

        store.remove_from_parent(child);
        let changes = store.evaluate();
        assert!(changes.topology_changed);
        assert_eq!(store.world_transform(child), Transform2d::IDENTITY);
        assert_eq!(store.effective_alpha(child), 1.0);
    }

    #[test]
    fn destroy_reports_removed() {
        let mut store = LayerStore::new();
        let id = group(&mut store);
        let _ = store.evaluate();
        store.destroy_layer(id);
        let changes = store.evaluate();
        assert_eq!(changes.removed, [id.idx]);
    }

    #[test]
    fn world_transform_at_matches_handle_accessor() {
        let mut store = LayerStore::new();
        let a = group(&mut store);
        store.set_transform(a, Transform2d::from_scale(2.0, 3.0));
        let _ = store.evaluate();
        assert_eq!(store.world_transform_at(a.idx), store.world_transform(a));
        assert_eq!(store.effective_alpha_at(a.idx), 1.0);
    }
}
