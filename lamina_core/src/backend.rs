// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for rasterization targets.
//!
//! Lamina splits rendering into the layer tree (this crate) and a *draw
//! context* that realizes primitives on some target. The compositing
//! traversal in [`Graphics::paint`](crate::Graphics::paint) binds the
//! composed state for each layer with [`DrawContext::set_state`] and then
//! either emits retained content (an image blit) or hands the context to an
//! immediate renderer.
//!
//! Implementations in `lamina_render`:
//!
//! - **`RenderPlan`**: records every primitive with its bound state. Useful
//!   for tests, for feeding a GPU backend, and for texture preparation.
//! - **`SoftwareRenderer`**: rasterizes into a CPU framebuffer.
//!
//! A GPU integration implements [`DrawContext`] on top of its own handles and
//! reports them through [`DrawContext::gl_context`]. The core never
//! interprets those handles.
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! fn on_frame(graphics: &mut Graphics, renderer: &mut SoftwareRenderer) {
//!     // Animate: mutate layer properties.
//!     graphics.layers_mut().set_transform(sprite, next_transform());
//!
//!     // Paint: evaluate the tree and composite it into the context.
//!     renderer.clear(Color::BLACK);
//!     let summary = graphics.paint(renderer);
//!     log::trace!("painted {} layers", summary.layers_painted);
//! }
//! ```

use core::fmt;

use kurbo::{BezPath, Rect};

use crate::image::Image;
use crate::layer::LayerId;
use crate::raster::Paint;
use crate::transform::Transform2d;

/// An opaque GL 2.0 function-table handle owned by the platform.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gl20Handle(pub u64);

impl fmt::Debug for Gl20Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gl20Handle({:#x})", self.0)
    }
}

/// An opaque GL context handle owned by the platform.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlContextHandle(pub u64);

impl fmt::Debug for GlContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlContextHandle({:#x})", self.0)
    }
}

/// Which kind of rasterization backend the platform provides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Backend {
    /// CPU rasterization; no GPU handles are available.
    #[default]
    Software,
    /// A GL backend with handles supplied by the platform.
    Gl {
        /// GL 2.0 entry points.
        gl20: Gl20Handle,
        /// Current context.
        context: GlContextHandle,
    },
}

impl Backend {
    /// Returns the GL handles, if this is a GL backend.
    #[must_use]
    pub fn gl_handles(self) -> Option<(Gl20Handle, GlContextHandle)> {
        match self {
            Self::Software => None,
            Self::Gl { gl20, context } => Some((gl20, context)),
        }
    }
}

/// A clip rectangle together with the transform that places it.
///
/// The rectangle is in the local space of the layer that declared it; the
/// transform maps that space to the root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRect {
    /// Local-to-root transform of the clip-bearing layer.
    pub transform: Transform2d,
    /// Clip rectangle in that layer's local space.
    pub rect: Rect,
}

impl ClipRect {
    /// Whether the clip admits nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.rect.width() > 0.0 && self.rect.height() > 0.0) || self.transform.determinant() == 0.0
    }
}

/// Drawing state bound by the compositor before each primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    /// Local-to-root transform in logical units.
    pub transform: Transform2d,
    /// Effective alpha, already multiplied through ancestors.
    pub alpha: f32,
    /// Active clip, if any.
    pub clip: Option<ClipRect>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform2d::IDENTITY,
            alpha: 1.0,
            clip: None,
        }
    }
}

/// A rasterization target.
///
/// All geometry is in the local space of the bound [`DrawState`]. A
/// zero-area clip makes every primitive a no-op; it is never an error.
pub trait DrawContext {
    /// Currently bound state.
    fn state(&self) -> DrawState;

    /// Replaces the bound state.
    fn set_state(&mut self, state: DrawState);

    /// Called by the compositor before emitting a layer's primitives.
    fn begin_layer(&mut self, layer: LayerId) {
        _ = layer;
    }

    /// Draws the whole of `image` into the local rectangle `dest`.
    fn draw_image(&mut self, image: &Image, dest: Rect) {
        let src = Rect::new(0.0, 0.0, image.width(), image.height());
        self.draw_image_region(image, src, dest);
    }

    /// Draws the `src` region of `image` (in the image's logical units) into
    /// the local rectangle `dest`.
    fn draw_image_region(&mut self, image: &Image, src: Rect, dest: Rect);

    /// Fills a local rectangle.
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);

    /// Fills a local path with the non-zero rule.
    fn fill_path(&mut self, path: &BezPath, paint: &Paint);

    /// GL context backing this target, if any.
    fn gl_context(&self) -> Option<GlContextHandle> {
        None
    }
}

impl<T: DrawContext + ?Sized> DrawContext for &mut T {
    fn state(&self) -> DrawState {
        (**self).state()
    }

    fn set_state(&mut self, state: DrawState) {
        (**self).set_state(state);
    }

    fn begin_layer(&mut self, layer: LayerId) {
        (**self).begin_layer(layer);
    }

    fn draw_image(&mut self, image: &Image, dest: Rect) {
        (**self).draw_image(image, dest);
    }

    fn draw_image_region(&mut self, image: &Image, src: Rect, dest: Rect) {
        (**self).draw_image_region(image, src, dest);
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        (**self).fill_rect(rect, paint);
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        (**self).fill_path(path, paint);
    }

    fn gl_context(&self) -> Option<GlContextHandle> {
        (**self).gl_context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_has_no_gl_handles() {
        assert_eq!(Backend::Software.gl_handles(), None);
        let gl = Backend::Gl {
            gl20: Gl20Handle(1),
            context: GlContextHandle(2),
        };
        assert_eq!(
            gl.gl_handles(),
            Some((Gl20Handle(1), GlContextHandle(2)))
        );
    }

    #[test]
    fn empty_clip_detection() {
        let clip = ClipRect {
            transform: Transform2d::IDENTITY,
            rect: Rect::new(0.0, 0.0, 0.0, 10.0),
        };
        assert!(clip.is_empty());
        let squashed = ClipRect {
            transform: Transform2d::from_scale(0.0, 1.0),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        assert!(squashed.is_empty());
        let ok = ClipRect {
            transform: Transform2d::IDENTITY,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        assert!(!ok.is_empty());
    }
}
