// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of layer variants.

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Rect, Size};

use crate::backend::DrawContext;
use crate::image::{CanvasImage, Image};

/// Per-frame drawing callback of an immediate layer.
///
/// Invoked synchronously during compositing with the layer's composed
/// transform, alpha and clip already bound on `ctx`. The callback only sees
/// the draw context, so it cannot reach the layer tree while it runs.
pub trait ImmediateRenderer {
    /// Draws this frame's content.
    fn render(&mut self, ctx: &mut dyn DrawContext);
}

impl<F> ImmediateRenderer for F
where
    F: FnMut(&mut dyn DrawContext),
{
    fn render(&mut self, ctx: &mut dyn DrawContext) {
        self(ctx);
    }
}

/// Variant data carried by a layer.
pub enum LayerKind {
    /// A container compositing its children in order.
    Group {
        /// Fixed clip `[0, w) x [0, h)` in local space, for clipped groups.
        clip: Option<Size>,
    },
    /// Draws an image at `(0, 0, image.width, image.height)` every frame.
    Image {
        /// The image; `None` draws nothing.
        image: Option<Image>,
    },
    /// Calls a renderer every frame instead of drawing retained content.
    Immediate {
        /// The callback.
        renderer: Box<dyn ImmediateRenderer>,
        /// Optional fixed clip in local space.
        clip: Option<Size>,
    },
    /// Owns an offscreen canvas whose content persists between frames.
    Surface {
        /// The backing canvas; fixed size.
        surface: CanvasImage,
    },
}

impl LayerKind {
    /// The tag for this variant.
    #[must_use]
    pub fn tag(&self) -> LayerKindTag {
        match self {
            Self::Group { clip: None } => LayerKindTag::Group,
            Self::Group { clip: Some(_) } => LayerKindTag::ClippedGroup,
            Self::Image { .. } => LayerKindTag::Image,
            Self::Immediate { clip: None, .. } => LayerKindTag::Immediate,
            Self::Immediate { clip: Some(_), .. } => LayerKindTag::ClippedImmediate,
            Self::Surface { .. } => LayerKindTag::Surface,
        }
    }

    /// Whether children may be attached to this layer.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    /// The layer's own clip rectangle in local space, if it carries one.
    #[must_use]
    pub fn clip_rect(&self) -> Option<Rect> {
        match self {
            Self::Group { clip } | Self::Immediate { clip, .. } => {
                clip.map(|size| size.to_rect())
            }
            Self::Image { .. } | Self::Surface { .. } => None,
        }
    }
}

impl fmt::Debug for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group { clip } => f.debug_struct("Group").field("clip", clip).finish(),
            Self::Image { image } => f.debug_struct("Image").field("image", image).finish(),
            Self::Immediate { clip, .. } => f
                .debug_struct("Immediate")
                .field("clip", clip)
                .finish_non_exhaustive(),
            Self::Surface { surface } => {
                f.debug_struct("Surface").field("surface", surface).finish()
            }
        }
    }
}

/// Field-less mirror of [`LayerKind`], for diagnostics and tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKindTag {
    /// Unclipped group.
    Group,
    /// Group with a fixed clip.
    ClippedGroup,
    /// Image layer.
    Image,
    /// Unclipped immediate layer.
    Immediate,
    /// Immediate layer with a fixed clip.
    ClippedImmediate,
    /// Surface layer.
    Surface,
}

impl LayerKindTag {
    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::ClippedGroup => "clipped-group",
            Self::Image => "image",
            Self::Immediate => "immediate",
            Self::ClippedImmediate => "clipped-immediate",
            Self::Surface => "surface",
        }
    }
}
