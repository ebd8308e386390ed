// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, and property management.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::error::GraphicsError;
use crate::image::{CanvasImage, Image};
use crate::transform::Transform2d;

use super::id::{INVALID, LayerId};
use super::kind::{ImmediateRenderer, LayerKind, LayerKindTag};
use super::traverse::{Ancestors, Children};
use crate::dirty;

/// Struct-of-arrays storage for all layers.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer occupies
/// a slot in parallel arrays. Destroyed layers are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Siblings are kept in paint order: the first child is painted first and
/// ends up at the bottom. Attaching a child keeps siblings sorted by
/// [`depth`](Self::set_depth), placing a new child after any sibling of equal
/// depth, so with uniform depths insertion order is paint order.
///
/// The store is owned by [`Graphics`](crate::Graphics). Layers are created,
/// attached, detached and destroyed through it, so the clip nesting policy
/// and the root guard always apply; the store itself hands out reads and
/// property setters.
#[derive(Debug)]
pub struct LayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) local_transform: Vec<Transform2d>,
    pub(crate) alpha: Vec<f32>,
    pub(crate) visible: Vec<bool>,
    pub(crate) depth: Vec<f32>,
    pub(crate) kind: Vec<LayerKind>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_transform: Vec<Transform2d>,
    pub(crate) effective_alpha: Vec<f32>,
    pub(crate) effective_hidden: Vec<bool>,

    // -- Diagnostics --
    pub(crate) clip_nesting_warned: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl LayerStore {
    /// Creates an empty layer store.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local_transform: Vec::new(),
            alpha: Vec::new(),
            visible: Vec::new(),
            depth: Vec::new(),
            kind: Vec::new(),
            world_transform: Vec::new(),
            effective_alpha: Vec::new(),
            effective_hidden: Vec::new(),
            clip_nesting_warned: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new detached layer of the given kind and returns its handle.
    ///
    /// The layer starts with an identity transform, full alpha, visible,
    /// depth zero, and no parent.
    pub(crate) fn create_layer(&mut self, kind: LayerKind) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.local_transform[i] = Transform2d::IDENTITY;
            self.alpha[i] = 1.0;
            self.visible[i] = true;
            self.depth[i] = 0.0;
            self.kind[i] = kind;
            self.world_transform[i] = Transform2d::IDENTITY;
            self.effective_alpha[i] = 1.0;
            self.effective_hidden[i] = false;
            self.clip_nesting_warned[i] = false;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local_transform.push(Transform2d::IDENTITY);
            self.alpha.push(1.0);
            self.visible.push(true);
            self.depth.push(0.0);
            self.kind.push(kind);
            self.world_transform.push(Transform2d::IDENTITY);
            self.effective_alpha.push(1.0);
            self.effective_hidden.push(false);
            self.clip_nesting_warned.push(false);
            self.generation.push(0);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// The layer is detached from its parent. Its children are detached too:
    /// they stay alive, become parentless, and are not painted until attached
    /// somewhere else. Variant data (images, renderers, surfaces) is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;

        while self.first_child[idx as usize] != INVALID {
            let child = self.first_child[idx as usize];
            self.detach(child);
        }
        if self.parent[idx as usize] != INVALID {
            self.detach(idx);
        }

        // Remove dirty tracking dependencies.
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.kind[idx as usize] = LayerKind::Group { clip: None };

        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Attaches `child` under `parent`, in depth order.
    ///
    /// If `child` already has a parent it is detached from it first, so a
    /// layer is never listed under two parents. Re-adding a child to its
    /// current parent moves it to the end of its depth run.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::NotAGroup`] if `parent` is not a group layer.
    /// - [`GraphicsError::CyclicGraph`] if `parent` is `child` or one of its
    ///   descendants.
    ///
    /// On error the tree is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub(crate) fn add_child(&mut self, parent: LayerId, child: LayerId) -> Result<(), GraphicsError> {
        self.check_attach(parent, child)?;
        let (p, c) = (parent.idx, child.idx);
        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }
        let before = self.depth_insertion_point(p, self.depth[c as usize]);
        self.link(p, c, before);
        Ok(())
    }

    /// Attaches `child` under `parent` at sibling position `index`,
    /// regardless of depth. An index past the end appends.
    ///
    /// # Errors
    ///
    /// As [`add_child`](Self::add_child).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub(crate) fn insert_child(
        &mut self,
        parent: LayerId,
        index: usize,
        child: LayerId,
    ) -> Result<(), GraphicsError> {
        self.check_attach(parent, child)?;
        let (p, c) = (parent.idx, child.idx);
        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }
        let before = Children::new(self, self.first_child[p as usize])
            .nth(index)
            .map_or(INVALID, |s| s.idx);
        self.link(p, c, before);
        Ok(())
    }

    /// Detaches `child` from its parent and returns the former parent.
    ///
    /// Returns `None`, and does nothing, if the layer has no parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn remove_from_parent(&mut self, child: LayerId) -> Option<LayerId> {
        let parent = self.parent(child)?;
        self.detach(child.idx);
        Some(parent)
    }

    /// Detaches every child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn remove_all(&mut self, parent: LayerId) {
        self.validate(parent);
        while self.first_child[parent.idx as usize] != INVALID {
            let child = self.first_child[parent.idx as usize];
            self.detach(child);
        }
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a layer, in paint order.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the ancestors of a layer, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: LayerId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, self.parent[id.idx as usize])
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self, id: LayerId) -> usize {
        self.children(id).count()
    }

    /// Returns whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: LayerId, id: LayerId) -> bool {
        self.validate(ancestor);
        ancestor == id || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Returns the live layers that have no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .filter_map(|idx| self.handle(idx))
            .collect()
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local transform of a layer.
    #[must_use]
    pub fn transform(&self, id: LayerId) -> Transform2d {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local alpha of a layer.
    #[must_use]
    pub fn alpha(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.alpha[id.idx as usize]
    }

    /// Returns whether the layer itself is visible.
    #[must_use]
    pub fn visible(&self, id: LayerId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the depth of a layer.
    #[must_use]
    pub fn depth(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    /// Returns the variant data of a layer.
    #[must_use]
    pub fn kind(&self, id: LayerId) -> &LayerKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the variant tag of a layer.
    #[must_use]
    pub fn kind_tag(&self, id: LayerId) -> LayerKindTag {
        self.kind(id).tag()
    }

    /// Returns the layer's own clip rectangle in local space, if any.
    #[must_use]
    pub fn clip(&self, id: LayerId) -> Option<Rect> {
        self.kind(id).clip_rect()
    }

    /// Returns the image drawn by an image layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not an image layer.
    #[must_use]
    pub fn image(&self, id: LayerId) -> Option<&Image> {
        match self.kind(id) {
            LayerKind::Image { image } => image.as_ref(),
            other => panic!("{id:?} is a {} layer, not an image layer", other.tag().name()),
        }
    }

    /// Returns the backing canvas of a surface layer.
    ///
    /// Draw on it with [`CanvasImage::canvas`]; the content persists across
    /// frames until drawn over.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a surface layer.
    #[must_use]
    pub fn surface(&self, id: LayerId) -> &CanvasImage {
        match self.kind(id) {
            LayerKind::Surface { surface } => surface,
            other => panic!("{id:?} is a {} layer, not a surface layer", other.tag().name()),
        }
    }

    /// Returns the computed world transform of a layer.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: LayerId) -> Transform2d {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    /// Returns the computed effective alpha of a layer.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_alpha(&self, id: LayerId) -> f32 {
        self.validate(id);
        self.effective_alpha[id.idx as usize]
    }

    /// Returns whether the layer is effectively hidden (including by an
    /// ancestor being invisible).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_hidden(&self, id: LayerId) -> bool {
        self.validate(id);
        self.effective_hidden[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform of a layer.
    ///
    /// Marks the TRANSFORM channel dirty with eager propagation to descendants.
    pub fn set_transform(&mut self, id: LayerId, transform: Transform2d) {
        self.validate(id);
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the translation component of the local transform.
    pub fn set_translation(&mut self, id: LayerId, x: f64, y: f64) {
        let t = self.transform(id).with_translation(x, y);
        self.set_transform(id, t);
    }

    /// Sets the local alpha of a layer, clamped to `[0, 1]`.
    ///
    /// Marks the ALPHA channel dirty with eager propagation to descendants.
    pub fn set_alpha(&mut self, id: LayerId, alpha: f32) {
        self.validate(id);
        self.alpha[id.idx as usize] = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
        self.dirty.mark_with(id.idx, dirty::ALPHA, &EagerPolicy);
    }

    /// Shows or hides a layer together with its subtree.
    ///
    /// Hidden layers stay attached and keep their properties; they are
    /// skipped during compositing.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        self.validate(id);
        self.visible[id.idx as usize] = visible;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the depth of a layer and re-sorts it among its siblings.
    ///
    /// The layer is placed after any sibling of equal depth.
    pub fn set_depth(&mut self, id: LayerId, depth: f32) {
        self.validate(id);
        let c = id.idx;
        self.depth[c as usize] = depth;
        let p = self.parent[c as usize];
        if p != INVALID {
            self.unlink_from_parent(c);
            let before = self.depth_insertion_point(p, depth);
            self.splice(p, c, before);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }
    }

    /// Replaces the image of an image layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not an image layer.
    pub fn set_image(&mut self, id: LayerId, image: Option<Image>) {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            LayerKind::Image { image: slot } => *slot = image,
            other => panic!("{id:?} is a {} layer, not an image layer", other.tag().name()),
        }
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Replaces the renderer of an immediate layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not an immediate layer.
    pub fn set_renderer(&mut self, id: LayerId, renderer: Box<dyn ImmediateRenderer>) {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            LayerKind::Immediate { renderer: slot, .. } => *slot = renderer,
            other => panic!(
                "{id:?} is a {} layer, not an immediate layer",
                other.tag().name()
            ),
        }
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Records that the content of a surface layer was redrawn.
    pub fn mark_content_changed(&mut self, id: LayerId) {
        self.validate(id);
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    // -- Raw-index accessors for renderers --
    //
    // These accept raw slot indices (as found in `FrameChanges`) rather than
    // `LayerId` handles, skipping generation validation.

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Transform2d {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_transform[idx as usize]
    }

    /// Returns the computed effective alpha at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn effective_alpha_at(&self, idx: u32) -> f32 {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.effective_alpha[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn handle(&self, idx: u32) -> Option<LayerId> {
        (idx != INVALID).then(|| LayerId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    fn check_attach(&self, parent: LayerId, child: LayerId) -> Result<(), GraphicsError> {
        self.validate(parent);
        self.validate(child);
        if !self.kind[parent.idx as usize].is_group() {
            return Err(GraphicsError::NotAGroup);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(GraphicsError::CyclicGraph);
        }
        Ok(())
    }

    /// First child of `p` whose depth is greater than `depth`, or [`INVALID`].
    fn depth_insertion_point(&self, p: u32, depth: f32) -> u32 {
        let mut s = self.first_child[p as usize];
        while s != INVALID && self.depth[s as usize] <= depth {
            s = self.next_sibling[s as usize];
        }
        s
    }

    /// Attaches detached `c` under `p` before sibling `before` (or last).
    fn link(&mut self, p: u32, c: u32, before: u32) {
        self.splice(p, c, before);

        // Child depends on parent for inherited channels.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::ALPHA);

        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Detaches `c` from its parent, updating dirty state.
    fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::ALPHA);

        self.mark_subtree_inherited_dirty(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `c` into `p`'s sibling list before `before` without touching
    /// dirty state.
    fn splice(&mut self, p: u32, c: u32, before: u32) {
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = before;

        let prev = if before == INVALID {
            // Append: walk to the last child.
            let mut last = self.first_child[p as usize];
            if last != INVALID {
                while self.next_sibling[last as usize] != INVALID {
                    last = self.next_sibling[last as usize];
                }
            }
            last
        } else {
            let prev = self.prev_sibling[before as usize];
            self.prev_sibling[before as usize] = c;
            prev
        };

        self.prev_sibling[c as usize] = prev;
        if prev == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    ///
    /// `TRANSFORM` also carries effective hidden propagation.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::ALPHA, &EagerPolicy);
    }
}
