// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU framebuffer compositing.

use kurbo::{BezPath, Rect, Shape};
use lamina_core::backend::{ClipRect, DrawContext, DrawState};
use lamina_core::color::Color;
use lamina_core::error::GraphicsError;
use lamina_core::image::{Image, Pixmap, physical_extent};
use lamina_core::raster::{self, ClipMask, ClipRegion, Paint};
use lamina_core::transform::Transform2d;
use lamina_core::Graphics;

/// Flattening tolerance for rectangles turned into paths.
const TOLERANCE: f64 = 0.1;

/// A [`DrawContext`] that rasterizes straight into an owned framebuffer.
///
/// Geometry arrives in logical units; the renderer applies its scale factor
/// so the framebuffer is in physical pixels. The mask for the bound clip is
/// built once when the clip changes and reused by every draw under it.
#[derive(Clone, Debug)]
pub struct SoftwareRenderer {
    framebuffer: Pixmap,
    scale: f64,
    state: DrawState,
    clip: ClipMask,
}

impl SoftwareRenderer {
    /// Creates a transparent framebuffer for a `width x height` logical
    /// surface at `scale` physical pixels per unit.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] if the framebuffer cannot be
    /// allocated at that size.
    pub fn new(width: u32, height: u32, scale: f64) -> Result<Self, GraphicsError> {
        Ok(Self {
            framebuffer: framebuffer(width, height, scale)?,
            scale,
            state: DrawState::default(),
            clip: ClipMask::Unclipped,
        })
    }

    /// Creates a framebuffer matching the surface of `graphics`.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn for_graphics(graphics: &Graphics) -> Result<Self, GraphicsError> {
        Self::new(graphics.width(), graphics.height(), graphics.scale_factor())
    }

    /// Reallocates the framebuffer for a new logical size. Contents are lost.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new); the old framebuffer is kept on failure.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        let pw = physical_extent(f64::from(width), self.scale);
        let ph = physical_extent(f64::from(height), self.scale);
        if (pw, ph) != (self.framebuffer.width(), self.framebuffer.height()) {
            self.framebuffer = framebuffer(width, height, self.scale)?;
            self.clip = self.build_clip(self.state.clip);
            log::debug!("software framebuffer resized to {pw}x{ph}");
        }
        Ok(())
    }

    /// Fills the whole framebuffer with `color`, ignoring the bound state.
    pub fn clear(&mut self, color: Color) {
        self.framebuffer.fill(color);
    }

    /// The composited pixels.
    #[must_use]
    pub fn framebuffer(&self) -> &Pixmap {
        &self.framebuffer
    }

    /// Consumes the renderer and returns the framebuffer.
    #[must_use]
    pub fn into_framebuffer(self) -> Pixmap {
        self.framebuffer
    }

    /// Physical pixels per logical unit.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn device(&self) -> Transform2d {
        Transform2d::from_scale(self.scale, self.scale)
    }

    fn device_transform(&self) -> Transform2d {
        self.device() * self.state.transform
    }

    fn build_clip(&self, clip: Option<ClipRect>) -> ClipMask {
        match clip {
            None => ClipMask::Unclipped,
            Some(c) => ClipMask::build(
                self.framebuffer.width(),
                self.framebuffer.height(),
                &[ClipRegion::new(self.device() * c.transform, c.rect)],
            ),
        }
    }
}

fn framebuffer(width: u32, height: u32, scale: f64) -> Result<Pixmap, GraphicsError> {
    Pixmap::new(
        physical_extent(f64::from(width), scale),
        physical_extent(f64::from(height), scale),
    )
    .ok_or(GraphicsError::InvalidDimensions {
        width: f64::from(width),
        height: f64::from(height),
    })
}

impl DrawContext for SoftwareRenderer {
    fn state(&self) -> DrawState {
        self.state
    }

    fn set_state(&mut self, state: DrawState) {
        if state.clip != self.state.clip {
            self.clip = self.build_clip(state.clip);
        }
        self.state = state;
    }

    fn draw_image_region(&mut self, image: &Image, src: Rect, dest: Rect) {
        let s = image.scale();
        let src_px = Rect::new(src.x0 * s, src.y0 * s, src.x1 * s, src.y1 * s);
        let transform = self.device_transform();
        let pixels = image.pixels();
        raster::blit(
            &mut self.framebuffer,
            &pixels,
            src_px,
            dest,
            transform,
            self.state.alpha,
            &self.clip,
        );
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let path = rect.abs().to_path(TOLERANCE);
        self.fill_path(&path, paint);
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        let transform = self.device_transform();
        raster::fill_path(
            &mut self.framebuffer,
            path,
            transform,
            paint,
            self.state.alpha,
            &self.clip,
        );
    }
}
