// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one frame.

use alloc::vec::Vec;

use kurbo::{BezPath, Rect};
use lamina_core::backend::{ClipRect, DrawContext, DrawState};
use lamina_core::image::Image;
use lamina_core::layer::LayerId;
use lamina_core::raster::Paint;
use lamina_core::transform::Transform2d;

/// One recorded primitive, in the local space of its [`RenderItem`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// The `src` region of `image` (logical units) drawn into `dest`.
    Image {
        /// Source image. Holds the live pixels, not a copy.
        image: Image,
        /// Source region in the image's logical units.
        src: Rect,
        /// Destination rectangle.
        dest: Rect,
    },
    /// A filled rectangle.
    FillRect {
        /// Rectangle to fill.
        rect: Rect,
        /// Fill.
        paint: Paint,
    },
    /// A filled path, non-zero winding.
    FillPath {
        /// Path to fill.
        path: BezPath,
        /// Fill.
        paint: Paint,
    },
}

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order, matching the layer tree's
/// paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The layer that was being painted, or `None` for primitives issued
    /// before any layer began.
    pub layer_id: Option<LayerId>,
    /// What to draw.
    pub op: DrawOp,
    /// Local-to-root transform (logical units).
    pub transform: Transform2d,
    /// Effective alpha.
    pub alpha: f32,
    /// Active clip, if any.
    pub clip: Option<ClipRect>,
}

/// An ordered list of draw commands for a single frame.
///
/// `RenderPlan` is a [`DrawContext`]: pass it to
/// [`Graphics::paint`](lamina_core::Graphics::paint) to record a frame.
/// Backends translate the items into native draw calls, or
/// [`replay`](Self::replay) them into another context.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
    state: DrawState,
    layer: Option<LayerId>,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
        self.state = DrawState::default();
        self.layer = None;
    }

    /// Number of recorded items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Images referenced by the plan, in draw order. An image drawn more
    /// than once appears more than once.
    pub fn images(&self) -> impl Iterator<Item = &Image> + '_ {
        self.items.iter().filter_map(|item| match &item.op {
            DrawOp::Image { image, .. } => Some(image),
            _ => None,
        })
    }

    /// Items recorded while painting `layer`.
    pub fn items_for(&self, layer: LayerId) -> impl Iterator<Item = &RenderItem> + '_ {
        self.items
            .iter()
            .filter(move |item| item.layer_id == Some(layer))
    }

    /// Re-issues every item into `ctx`, binding each item's state first.
    ///
    /// The previously bound state of `ctx` is restored afterwards.
    pub fn replay(&self, ctx: &mut dyn DrawContext) {
        let saved = ctx.state();
        let mut layer = None;
        for item in &self.items {
            if item.layer_id != layer {
                layer = item.layer_id;
                if let Some(id) = layer {
                    ctx.begin_layer(id);
                }
            }
            ctx.set_state(DrawState {
                transform: item.transform,
                alpha: item.alpha,
                clip: item.clip,
            });
            match &item.op {
                DrawOp::Image { image, src, dest } => ctx.draw_image_region(image, *src, *dest),
                DrawOp::FillRect { rect, paint } => ctx.fill_rect(*rect, paint),
                DrawOp::FillPath { path, paint } => ctx.fill_path(path, paint),
            }
        }
        ctx.set_state(saved);
    }

    fn push(&mut self, op: DrawOp) {
        self.items.push(RenderItem {
            layer_id: self.layer,
            op,
            transform: self.state.transform,
            alpha: self.state.alpha,
            clip: self.state.clip,
        });
    }
}

impl DrawContext for RenderPlan {
    fn state(&self) -> DrawState {
        self.state
    }

    fn set_state(&mut self, state: DrawState) {
        self.state = state;
    }

    fn begin_layer(&mut self, layer: LayerId) {
        self.layer = Some(layer);
    }

    fn draw_image_region(&mut self, image: &Image, src: Rect, dest: Rect) {
        self.push(DrawOp::Image {
            image: image.clone(),
            src,
            dest,
        });
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.push(DrawOp::FillRect {
            rect,
            paint: paint.clone(),
        });
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        self.push(DrawOp::FillPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use lamina_core::{Color, Graphics, GraphicsConfig};

    use super::*;

    fn graphics() -> Graphics {
        Graphics::new(GraphicsConfig::desktop()).unwrap()
    }

    #[test]
    fn records_layers_in_paint_order() {
        let mut g = graphics();
        let root = g.root_layer();
        let a = g.create_image(4.0, 4.0).unwrap();
        let b = g.create_image(4.0, 4.0).unwrap();
        let la = g.create_image_layer_with(a.image().clone());
        let lb = g.create_image_layer_with(b.image().clone());
        g.add_child(root, la).unwrap();
        g.add_child(root, lb).unwrap();

        let mut plan = RenderPlan::new();
        g.paint(&mut plan);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.items[0].layer_id, Some(la));
        assert_eq!(plan.items[1].layer_id, Some(lb));
        let images: Vec<_> = plan.images().map(Image::id).collect();
        assert_eq!(images, [a.image().id(), b.image().id()]);
    }

    #[test]
    fn immediate_primitives_carry_layer_state() {
        let mut g = graphics();
        let root = g.root_layer();
        let clip = g.create_clipped_group_layer(100.0, 50.0).unwrap();
        let imm = g.create_immediate_layer(|ctx: &mut dyn DrawContext| {
            ctx.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Color::WHITE.into());
        });
        g.layers_mut()
            .set_transform(clip, Transform2d::from_translation(3.0, 4.0));
        g.layers_mut().set_alpha(imm, 0.5);
        g.add_child(root, clip).unwrap();
        g.add_child(clip, imm).unwrap();

        let mut plan = RenderPlan::new();
        g.paint(&mut plan);

        let items: Vec<_> = plan.items_for(imm).collect();
        assert_eq!(items.len(), 1);
        let item = items[0];
        assert!(matches!(item.op, DrawOp::FillRect { .. }));
        assert_eq!(item.alpha, 0.5);
        let t = item.transform.translation();
        assert_eq!((t.x, t.y), (3.0, 4.0));
        assert_eq!(
            item.clip.map(|c| c.rect),
            Some(Rect::new(0.0, 0.0, 100.0, 50.0))
        );
    }

    #[test]
    fn replay_reproduces_items() {
        let mut g = graphics();
        let root = g.root_layer();
        let img = g.create_image(2.0, 2.0).unwrap();
        let layer = g.create_image_layer_with(img.image().clone());
        g.layers_mut()
            .set_transform(layer, Transform2d::from_scale(2.0, 2.0));
        g.add_child(root, layer).unwrap();

        let mut first = RenderPlan::new();
        g.paint(&mut first);
        let mut second = RenderPlan::new();
        first.replay(&mut second);
        assert_eq!(first.items, second.items);
        assert_eq!(second.state(), DrawState::default());
    }

    #[test]
    fn clear_resets_plan() {
        let mut plan = RenderPlan::new();
        plan.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &Color::BLACK.into());
        assert_eq!(plan.items[0].layer_id, None);
        plan.clear();
        assert!(plan.is_empty());
    }

    #[test]
    fn image_items_share_live_pixels() {
        let mut g = graphics();
        let root = g.root_layer();
        let canvas = g.create_image(1.0, 1.0).unwrap();
        let layer = g.create_image_layer_with(canvas.image().clone());
        g.add_child(root, layer).unwrap();

        let mut plan = RenderPlan::new();
        g.paint(&mut plan);
        canvas
            .canvas()
            .set_fill_color(Color::WHITE)
            .fill_rect(0.0, 0.0, 1.0, 1.0);
        let DrawOp::Image { image, .. } = &plan.items[0].op else {
            panic!("expected an image item");
        };
        assert_eq!(image.pixels().color_at(0, 0), Color::WHITE);
    }
}
