// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immediate drawing onto a [`CanvasImage`](crate::image::CanvasImage).
//!
//! A [`Canvas`] keeps a stack of drawing states (transform, alpha, fill,
//! stroke, clip). Coordinates are logical; the image's scale factor is applied
//! underneath the user transform so HiDPI images are drawn with the same
//! numbers as standard ones. Every operation that touches pixels bumps the
//! image's content version.
//!
//! Canvas clips intersect: each [`clip_rect`](Canvas::clip_rect) narrows the
//! drawable region until the state that added it is restored. The
//! intersection is kept as a single anti-aliased mask per state.

use alloc::vec::Vec;

use kurbo::{BezPath, Cap, Circle, Join, Line, Rect, Shape, Stroke};

use crate::color::Color;
use crate::gradient::Gradient;
use crate::image::{Image, Pixmap};
use crate::raster::{self, ClipMask, ClipRegion, Paint};
use crate::text::TextLayout;
use crate::transform::Transform2d;

/// Flattening tolerance for curves, in logical units.
const TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug)]
struct CanvasState {
    transform: Transform2d,
    alpha: f32,
    fill: Paint,
    stroke: Color,
    stroke_width: f64,
    clip: ClipMask,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Transform2d::IDENTITY,
            alpha: 1.0,
            fill: Paint::Solid(Color::BLACK),
            stroke: Color::BLACK,
            stroke_width: 1.0,
            clip: ClipMask::Unclipped,
        }
    }
}

/// A drawing surface onto an image's pixels.
///
/// Obtained from [`CanvasImage::canvas`](crate::image::CanvasImage::canvas).
/// Methods return `&mut Self` so calls can be chained.
#[derive(Debug)]
pub struct Canvas<'a> {
    image: &'a Image,
    base: Transform2d,
    state: CanvasState,
    saved: Vec<CanvasState>,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(image: &'a Image) -> Self {
        let scale = image.scale();
        Self {
            image,
            base: Transform2d::from_scale(scale, scale),
            state: CanvasState::default(),
            saved: Vec::new(),
        }
    }

    /// Logical width of the target.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.image.width()
    }

    /// Logical height of the target.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.image.height()
    }

    /// Current user transform.
    #[must_use]
    pub fn transform_matrix(&self) -> Transform2d {
        self.state.transform
    }

    // -- State stack --

    /// Pushes a copy of the current state.
    pub fn save(&mut self) -> &mut Self {
        self.saved.push(self.state.clone());
        self
    }

    /// Pops the most recently saved state. Unbalanced calls are ignored.
    pub fn restore(&mut self) -> &mut Self {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
        self
    }

    /// Prepends a translation to the current transform.
    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.transform(Transform2d::from_translation(x, y))
    }

    /// Prepends a scale to the current transform.
    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.transform(Transform2d::from_scale(x, y))
    }

    /// Prepends a rotation (radians) to the current transform.
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        self.transform(Transform2d::from_rotation(angle))
    }

    /// Prepends an arbitrary transform to the current transform.
    pub fn transform(&mut self, t: Transform2d) -> &mut Self {
        self.state.transform = self.state.transform * t;
        self
    }

    /// Replaces the current transform.
    pub fn set_transform(&mut self, t: Transform2d) -> &mut Self {
        self.state.transform = t;
        self
    }

    /// Sets the global alpha, clamped to `[0, 1]`.
    pub fn set_alpha(&mut self, alpha: f32) -> &mut Self {
        self.state.alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        self
    }

    /// Sets a solid fill color.
    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.state.fill = Paint::Solid(color);
        self
    }

    /// Sets a gradient fill, evaluated in the user space current at fill time.
    pub fn set_fill_gradient(&mut self, gradient: Gradient) -> &mut Self {
        self.state.fill = Paint::Gradient(gradient);
        self
    }

    /// Sets the stroke color.
    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        self.state.stroke = color;
        self
    }

    /// Sets the stroke width in user units.
    pub fn set_stroke_width(&mut self, width: f64) -> &mut Self {
        self.state.stroke_width = width;
        self
    }

    /// Intersects the clip with a rectangle in user space.
    pub fn clip_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let region = ClipRegion::new(self.device_transform(), rect(x, y, width, height));
        let (pw, ph) = (self.image.pixel_width(), self.image.pixel_height());
        self.state.clip.intersect(pw, ph, &region);
        self
    }

    // -- Pixel operations --

    /// Sets every pixel to transparent, ignoring transform and clip.
    pub fn clear(&mut self) -> &mut Self {
        self.image.pixels_mut().fill(Color::TRANSPARENT);
        self.image.touch();
        self
    }

    /// Sets the pixels covered by a user-space rectangle to transparent.
    pub fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let path = rect(x, y, width, height).to_path(TOLERANCE);
        let transform = self.device_transform();
        raster::clear_path(&mut self.image.pixels_mut(), &path, transform, &self.state.clip);
        self.image.touch();
        self
    }

    /// Fills a rectangle with the current fill.
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let path = rect(x, y, width, height).to_path(TOLERANCE);
        self.fill_with_current(&path)
    }

    /// Outlines a rectangle with the current stroke.
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let path = rect(x, y, width, height).to_path(TOLERANCE);
        self.stroke_shape(&path, Join::Miter)
    }

    /// Fills a circle with the current fill.
    pub fn fill_circle(&mut self, x: f64, y: f64, radius: f64) -> &mut Self {
        let path = Circle::new((x, y), radius.max(0.0)).to_path(TOLERANCE);
        self.fill_with_current(&path)
    }

    /// Outlines a circle with the current stroke.
    pub fn stroke_circle(&mut self, x: f64, y: f64, radius: f64) -> &mut Self {
        let path = Circle::new((x, y), radius.max(0.0)).to_path(TOLERANCE);
        self.stroke_shape(&path, Join::Round)
    }

    /// Strokes a straight line with the current stroke.
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> &mut Self {
        let path = Line::new((x0, y0), (x1, y1)).to_path(TOLERANCE);
        self.stroke_shape(&path, Join::Miter)
    }

    /// Fills an arbitrary path with the current fill.
    pub fn fill_path(&mut self, path: &BezPath) -> &mut Self {
        self.fill_with_current(path)
    }

    /// Strokes an arbitrary path with the current stroke.
    pub fn stroke_path(&mut self, path: &BezPath) -> &mut Self {
        self.stroke_shape(path, Join::Miter)
    }

    /// Draws `image` at its natural size with its top-left at `(x, y)`.
    pub fn draw_image(&mut self, image: &Image, x: f64, y: f64) -> &mut Self {
        let (w, h) = (image.width(), image.height());
        self.draw_image_region(image, 0.0, 0.0, w, h, x, y, w, h)
    }

    /// Draws the whole of `image` stretched to `width x height`.
    pub fn draw_image_scaled(
        &mut self,
        image: &Image,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> &mut Self {
        let (w, h) = (image.width(), image.height());
        self.draw_image_region(image, 0.0, 0.0, w, h, x, y, width, height)
    }

    /// Draws a logical sub-rectangle of `image` into a user-space rectangle.
    pub fn draw_image_region(
        &mut self,
        image: &Image,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> &mut Self {
        let s = image.scale();
        let src_rect = Rect::new(sx * s, sy * s, (sx + sw) * s, (sy + sh) * s);
        let dest = rect(dx, dy, dw, dh);
        let transform = self.device_transform();
        // Drawing an image onto itself reads from a copy taken first.
        let copy: Option<Pixmap> = image.ptr_eq(self.image).then(|| image.pixels().clone());
        {
            let mut dst = self.image.pixels_mut();
            match &copy {
                Some(src) => raster::blit(
                    &mut dst,
                    src,
                    src_rect,
                    dest,
                    transform,
                    self.state.alpha,
                    &self.state.clip,
                ),
                None => raster::blit(
                    &mut dst,
                    &image.pixels(),
                    src_rect,
                    dest,
                    transform,
                    self.state.alpha,
                    &self.state.clip,
                ),
            }
        }
        self.image.touch();
        self
    }

    /// Fills the glyphs of `layout` with the current fill, with the top-left
    /// of the layout box at `(x, y)`.
    pub fn fill_text(&mut self, layout: &TextLayout, x: f64, y: f64) -> &mut Self {
        let base = self.device_transform();
        {
            let mut dst = self.image.pixels_mut();
            for line in layout.lines() {
                for glyph in &line.glyphs {
                    let Some(outline) = &glyph.outline else {
                        continue;
                    };
                    let origin = Transform2d::from_translation(
                        x + line.x + glyph.x,
                        y + line.baseline,
                    );
                    raster::fill_path(
                        &mut dst,
                        outline,
                        base * origin,
                        &self.state.fill,
                        self.state.alpha,
                        &self.state.clip,
                    );
                }
            }
        }
        self.image.touch();
        self
    }

    // -- Internals --

    fn device_transform(&self) -> Transform2d {
        self.base * self.state.transform
    }

    fn fill_with_current(&mut self, path: &BezPath) -> &mut Self {
        let transform = self.device_transform();
        raster::fill_path(
            &mut self.image.pixels_mut(),
            path,
            transform,
            &self.state.fill,
            self.state.alpha,
            &self.state.clip,
        );
        self.image.touch();
        self
    }

    fn stroke_shape(&mut self, path: &BezPath, join: Join) -> &mut Self {
        let width = self.state.stroke_width;
        if !(width.is_finite() && width > 0.0) {
            return self;
        }
        let style = Stroke::new(width).with_join(join).with_caps(Cap::Butt);
        let transform = self.device_transform();
        raster::stroke_path(
            &mut self.image.pixels_mut(),
            path,
            transform,
            &style,
            &Paint::Solid(self.state.stroke),
            self.state.alpha,
            &self.state.clip,
        );
        self.image.touch();
        self
    }
}

/// Builds a rectangle from an origin and a size, normalizing negative sizes.
fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::CanvasImage;
    use crate::text::{FallbackFonts, Font, FontStyle, TextFormat, layout_text};

    const RED: Color = Color::rgb(255, 0, 0);

    fn painted(img: &CanvasImage) -> usize {
        img.image().pixels().pixels().iter().filter(|px| px.alpha() != 0).count()
    }

    #[test]
    fn fill_rect_covers_exact_pixels() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        img.canvas().set_fill_color(RED).fill_rect(2.0, 3.0, 4.0, 5.0);
        assert_eq!(painted(&img), 20);
        assert_eq!(img.image().pixels().color_at(2, 3), RED);
        assert_eq!(img.image().pixels().color_at(6, 3), Color::TRANSPARENT);
    }

    #[test]
    fn translate_and_restore() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        let mut canvas = img.canvas();
        canvas.set_fill_color(RED);
        canvas.save().translate(5.0, 5.0).fill_rect(0.0, 0.0, 1.0, 1.0);
        canvas.restore().fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(img.image().pixels().color_at(5, 5), RED);
        assert_eq!(img.image().pixels().color_at(0, 0), RED);
        assert_eq!(painted(&img), 2);
    }

    #[test]
    fn hidpi_canvas_uses_logical_units() {
        let img = CanvasImage::new(4.0, 4.0, 2.0).unwrap();
        img.canvas().set_fill_color(RED).fill_rect(0.0, 0.0, 1.0, 1.0);
        // One logical unit is a 2x2 block of physical pixels.
        assert_eq!(painted(&img), 4);
    }

    #[test]
    fn clip_rects_intersect() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        img.canvas()
            .clip_rect(0.0, 0.0, 6.0, 6.0)
            .clip_rect(4.0, 4.0, 6.0, 6.0)
            .set_fill_color(RED)
            .fill_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(painted(&img), 4);
    }

    #[test]
    fn restore_drops_clip() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        let mut canvas = img.canvas();
        canvas.save().clip_rect(0.0, 0.0, 2.0, 2.0).restore();
        canvas.set_fill_color(RED).fill_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(painted(&img), 100);
    }

    #[test]
    fn rotated_clip_is_honored() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        img.canvas()
            .translate(5.0, 0.0)
            .rotate(core::f64::consts::FRAC_PI_2)
            .clip_rect(0.0, 0.0, 10.0, 5.0)
            .set_transform(Transform2d::IDENTITY)
            .set_fill_color(RED)
            .fill_rect(0.0, 0.0, 10.0, 10.0);
        // The rotated clip covers device x in [0, 5).
        assert_eq!(img.image().pixels().color_at(2, 5), RED);
        assert_eq!(img.image().pixels().color_at(7, 5), Color::TRANSPARENT);
    }

    #[test]
    fn clear_rect_erases() {
        let img = CanvasImage::new(4.0, 4.0, 1.0).unwrap();
        img.canvas()
            .set_fill_color(RED)
            .fill_rect(0.0, 0.0, 4.0, 4.0)
            .clear_rect(0.0, 0.0, 2.0, 4.0);
        assert_eq!(painted(&img), 8);
        img.canvas().clear();
        assert_eq!(painted(&img), 0);
    }

    #[test]
    fn stroke_rect_leaves_interior() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        img.canvas()
            .set_stroke_color(RED)
            .set_stroke_width(2.0)
            .stroke_rect(2.0, 2.0, 6.0, 6.0);
        let pixels = img.image().pixels();
        assert_eq!(pixels.color_at(2, 5), RED);
        assert_eq!(pixels.color_at(5, 5), Color::TRANSPARENT);
    }

    #[test]
    fn zero_width_stroke_draws_nothing() {
        let img = CanvasImage::new(10.0, 10.0, 1.0).unwrap();
        img.canvas().set_stroke_width(0.0).draw_line(0.0, 5.0, 10.0, 5.0);
        assert_eq!(painted(&img), 0);
    }

    #[test]
    fn draw_image_copies_pixels() {
        let src = CanvasImage::new(2.0, 2.0, 1.0).unwrap();
        src.canvas().set_fill_color(RED).fill_rect(0.0, 0.0, 2.0, 2.0);
        let dst = CanvasImage::new(8.0, 8.0, 1.0).unwrap();
        dst.canvas().draw_image(src.image(), 3.0, 3.0);
        assert_eq!(painted(&dst), 4);
        assert_eq!(dst.image().pixels().color_at(4, 4), RED);
    }

    #[test]
    fn draw_image_onto_itself() {
        let img = CanvasImage::new(4.0, 2.0, 1.0).unwrap();
        img.canvas().set_fill_color(RED).fill_rect(0.0, 0.0, 2.0, 2.0);
        let view = img.image().clone();
        img.canvas().draw_image_region(&view, 0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 2.0, 2.0);
        assert_eq!(painted(&img), 8);
    }

    #[test]
    fn fill_text_paints_glyph_boxes() {
        let font = Font::resolve(&FallbackFonts, "monospace", FontStyle::Plain, 10.0);
        let layout = layout_text(&FallbackFonts, "ab", &TextFormat::new(font));
        let img = CanvasImage::new(20.0, 20.0, 1.0).unwrap();
        let before = img.image().version();
        img.canvas().set_fill_color(RED).fill_text(&layout, 0.0, 0.0);
        assert!(painted(&img) > 0);
        assert!(img.image().version() > before);
    }

    #[test]
    fn alpha_scales_fill() {
        let img = CanvasImage::new(1.0, 1.0, 1.0).unwrap();
        img.canvas()
            .set_alpha(0.5)
            .set_fill_color(Color::WHITE)
            .fill_rect(0.0, 0.0, 1.0, 1.0);
        let px = img.image().pixels().color_at(0, 0);
        assert!((120..=135).contains(&px.alpha()));
    }
}
