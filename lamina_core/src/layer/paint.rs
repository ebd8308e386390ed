// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing traversal.
//!
//! [`LayerStore::paint`] walks the tree under a root in pre-order, children
//! in paint order, and drives a [`DrawContext`]. For each visible layer it
//! binds a [`DrawState`] made from the evaluated world transform and
//! effective alpha plus the active clip, then emits the layer's content:
//!
//! | Kind      | Emitted                                              |
//! |-----------|------------------------------------------------------|
//! | Group     | nothing of its own; children follow                  |
//! | Image     | `draw_image(image, (0, 0, w, h))`, if an image is set |
//! | Immediate | the renderer callback                                |
//! | Surface   | `draw_image(surface, (0, 0, w, h))`                   |
//!
//! An invisible layer is skipped with its whole subtree.
//!
//! # Clips
//!
//! Clip-bearing layers (clipped groups and clipped immediate layers) clip
//! themselves and their descendants to `[0, w) x [0, h)` in their local
//! space. Clips do not intersect: when a clip-bearing layer sits under
//! another, the inner clip replaces the outer one for the inner subtree
//! (innermost wins). Each such conflict is counted, traced, and logged once
//! per layer at `warn` level.

use kurbo::Rect;

use super::id::{INVALID, LayerId};
use super::kind::LayerKind;
use super::store::LayerStore;
use crate::backend::{ClipRect, DrawContext, DrawState};
use crate::trace::{ClipConflictEvent, FrameSummary, Tracer};

/// Clip in effect during traversal, with the slot that declared it.
#[derive(Clone, Copy)]
struct ActiveClip {
    clip: ClipRect,
    owner: u32,
}

impl LayerStore {
    /// Composites the subtree under `root` into `ctx`.
    ///
    /// Reads the computed properties, so [`evaluate`](Self::evaluate) must
    /// run first. Returns per-frame totals; `frame_index` is copied into the
    /// summary and into trace events.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub(crate) fn paint(
        &mut self,
        root: LayerId,
        ctx: &mut dyn DrawContext,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) -> FrameSummary {
        self.validate(root);
        let mut summary = FrameSummary {
            frame_index,
            ..FrameSummary::default()
        };
        self.paint_layer(root.idx, None, ctx, &mut summary, tracer);
        summary
    }

    /// Whether attaching `child` under `parent` would put one clip-bearing
    /// layer inside another.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn would_nest_clip(&self, parent: LayerId, child: LayerId) -> bool {
        let clipped_above = self.clip(parent).is_some()
            || self.ancestors(parent).any(|a| self.clip(a).is_some());
        clipped_above && self.subtree_has_clip(child.idx)
    }

    fn subtree_has_clip(&self, idx: u32) -> bool {
        if self.kind[idx as usize].clip_rect().is_some() {
            return true;
        }
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            if self.subtree_has_clip(child) {
                return true;
            }
            child = self.next_sibling[child as usize];
        }
        false
    }

    fn paint_layer(
        &mut self,
        idx: u32,
        inherited: Option<ActiveClip>,
        ctx: &mut dyn DrawContext,
        summary: &mut FrameSummary,
        tracer: &mut Tracer<'_>,
    ) {
        let i = idx as usize;
        if !self.visible[i] {
            summary.hidden_skipped += 1;
            return;
        }
        summary.layers_painted += 1;

        let transform = self.world_transform[i];
        let alpha = self.effective_alpha[i];
        let active = match self.kind[i].clip_rect() {
            Some(rect) => {
                if let Some(outer) = inherited {
                    self.report_clip_conflict(idx, outer.owner, summary, tracer);
                }
                Some(ActiveClip {
                    clip: ClipRect { transform, rect },
                    owner: idx,
                })
            }
            None => inherited,
        };

        ctx.begin_layer(LayerId {
            idx,
            generation: self.generation[i],
        });
        ctx.set_state(DrawState {
            transform,
            alpha,
            clip: active.map(|a| a.clip),
        });

        #[cfg(feature = "trace-rich")]
        tracer.layer_painted(&crate::trace::LayerPaintEvent {
            frame_index: summary.frame_index,
            layer_index: idx,
            kind: self.kind[i].tag(),
            alpha,
        });

        match &mut self.kind[i] {
            LayerKind::Group { .. } => {}
            LayerKind::Image { image } => {
                if let Some(image) = image {
                    let dest = Rect::new(0.0, 0.0, image.width(), image.height());
                    ctx.draw_image(image, dest);
                }
            }
            LayerKind::Immediate { renderer, .. } => {
                renderer.render(&mut *ctx);
                summary.immediate_calls += 1;
            }
            LayerKind::Surface { surface } => {
                let dest = Rect::new(0.0, 0.0, surface.width(), surface.height());
                ctx.draw_image(surface.image(), dest);
            }
        }

        let mut child = self.first_child[i];
        while child != INVALID {
            self.paint_layer(child, active, ctx, summary, tracer);
            child = self.next_sibling[child as usize];
        }
    }

    fn report_clip_conflict(
        &mut self,
        idx: u32,
        overridden: u32,
        summary: &mut FrameSummary,
        tracer: &mut Tracer<'_>,
    ) {
        summary.clip_conflicts += 1;
        tracer.clip_conflict(&ClipConflictEvent {
            frame_index: summary.frame_index,
            layer_index: idx,
            overridden_index: overridden,
        });
        let warned = &mut self.clip_nesting_warned[idx as usize];
        if !*warned {
            *warned = true;
            log::warn!(
                "clip-bearing layer {idx} is nested under clip-bearing layer {overridden}; \
                 the inner clip replaces the outer one"
            );
        }
    }
}
