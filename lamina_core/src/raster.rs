// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterization into a [`Pixmap`], backed by tiny-skia.
//!
//! Geometry stays in kurbo and [`Transform2d`] until it reaches this module,
//! where paths, transforms and paints are converted to tiny-skia's `f32`
//! types. Fills are anti-aliased with non-zero winding and blend
//! premultiplied source-over. Clips are rectangles placed by their own
//! transform; a stack of them intersects into a single [`ClipMask`].
//!
//! These routines back [`Canvas`](crate::canvas::Canvas) drawing and the
//! software compositor. They never fail: empty shapes, zero-area clips and
//! singular transforms draw nothing.

use kurbo::{BezPath, Cap, Join, PathEl, Rect, Shape, Stroke};
use tiny_skia::{BlendMode, FillRule, FilterQuality, Mask, PathBuilder, Pattern, Shader, SpreadMode};

use crate::color::Color;
use crate::gradient::Gradient;
use crate::image::Pixmap;
use crate::transform::Transform2d;

/// Flattening tolerance used when converting clip rectangles to paths.
const TOLERANCE: f64 = 0.1;

/// What to fill a shape with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// A single color.
    Solid(Color),
    /// A gradient evaluated in the shape's local coordinate space.
    Gradient(Gradient),
}

impl Paint {
    /// Converts to a tiny-skia paint with its alpha multiplied by `alpha`.
    ///
    /// The shader lives in the shape's local space; tiny-skia applies the
    /// fill transform to it together with the path.
    #[must_use]
    pub fn to_skia(&self, alpha: f32) -> Option<tiny_skia::Paint<'static>> {
        let shader = match self {
            Self::Solid(color) => {
                let mut color = tiny_skia::Color::from(*color);
                color.apply_opacity(alpha);
                Shader::SolidColor(color)
            }
            Self::Gradient(gradient) => gradient.to_shader(alpha)?,
        };
        Some(tiny_skia::Paint {
            shader,
            anti_alias: true,
            ..tiny_skia::Paint::default()
        })
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

impl From<Gradient> for Paint {
    fn from(gradient: Gradient) -> Self {
        Self::Gradient(gradient)
    }
}

/// A rectangle in some local space, clipping in device space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRegion {
    transform: Transform2d,
    rect: Rect,
}

impl ClipRegion {
    /// Creates a clip from a local rectangle and the transform mapping that
    /// local space to device pixels.
    #[must_use]
    pub fn new(transform: Transform2d, rect: Rect) -> Self {
        Self { transform, rect }
    }

    /// Whether the clip admits no pixels at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transform.inverse().is_none() || self.rect.area() <= 0.0
    }
}

/// The combined coverage of zero or more [`ClipRegion`]s on one target.
#[derive(Clone, Debug, Default)]
pub enum ClipMask {
    /// Nothing is clipped.
    #[default]
    Unclipped,
    /// Pixels are kept in proportion to the mask coverage.
    Mask(Mask),
    /// No pixel can be drawn.
    Empty,
}

impl ClipMask {
    /// Intersects `clips` into a mask for a `width x height` target.
    #[must_use]
    pub fn build(width: u32, height: u32, clips: &[ClipRegion]) -> Self {
        let mut mask = Self::Unclipped;
        for clip in clips {
            mask.intersect(width, height, clip);
        }
        mask
    }

    /// Narrows this mask to `clip`.
    pub fn intersect(&mut self, width: u32, height: u32, clip: &ClipRegion) {
        if clip.is_empty() {
            *self = Self::Empty;
            return;
        }
        let Some(path) = to_skia_path(&clip.rect.to_path(TOLERANCE)) else {
            *self = Self::Empty;
            return;
        };
        let transform = to_skia_transform(clip.transform);
        match self {
            Self::Unclipped => {
                *self = match Mask::new(width, height) {
                    Some(mut mask) => {
                        mask.fill_path(&path, FillRule::Winding, true, transform);
                        Self::Mask(mask)
                    }
                    None => Self::Empty,
                };
            }
            Self::Mask(mask) => mask.intersect_path(&path, FillRule::Winding, true, transform),
            Self::Empty => {}
        }
    }

    /// Whether no pixel can be drawn through this mask.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The mask to hand to tiny-skia, or `None` when drawing is pointless.
    fn coverage(&self) -> Option<Option<&Mask>> {
        match self {
            Self::Unclipped => Some(None),
            Self::Mask(mask) => Some(Some(mask)),
            Self::Empty => None,
        }
    }
}

/// Converts a kurbo path to a tiny-skia path.
///
/// Returns `None` for paths tiny-skia considers empty.
#[must_use]
pub fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(narrow(p.x), narrow(p.y)),
            PathEl::LineTo(p) => pb.line_to(narrow(p.x), narrow(p.y)),
            PathEl::QuadTo(p1, p) => {
                pb.quad_to(narrow(p1.x), narrow(p1.y), narrow(p.x), narrow(p.y));
            }
            PathEl::CurveTo(p1, p2, p) => pb.cubic_to(
                narrow(p1.x),
                narrow(p1.y),
                narrow(p2.x),
                narrow(p2.y),
                narrow(p.x),
                narrow(p.y),
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Converts an affine transform to tiny-skia's row form.
#[must_use]
pub fn to_skia_transform(t: Transform2d) -> tiny_skia::Transform {
    let [a, b, c, d, e, f] = t.to_affine().as_coeffs();
    tiny_skia::Transform::from_row(
        narrow(a),
        narrow(b),
        narrow(c),
        narrow(d),
        narrow(e),
        narrow(f),
    )
}

/// Fills `path` (in local space) mapped through `transform`.
pub fn fill_path(
    dst: &mut Pixmap,
    path: &BezPath,
    transform: Transform2d,
    paint: &Paint,
    alpha: f32,
    clip: &ClipMask,
) {
    if alpha <= 0.0 || transform.inverse().is_none() {
        return;
    }
    let Some(mask) = clip.coverage() else {
        return;
    };
    let (Some(path), Some(paint)) = (to_skia_path(path), paint.to_skia(alpha)) else {
        return;
    };
    dst.as_skia_mut().fill_path(
        &path,
        &paint,
        FillRule::Winding,
        to_skia_transform(transform),
        mask,
    );
}

/// Strokes `path` (in local space) mapped through `transform`.
///
/// The stroke width is in local units, so it scales with the transform.
pub fn stroke_path(
    dst: &mut Pixmap,
    path: &BezPath,
    transform: Transform2d,
    style: &Stroke,
    paint: &Paint,
    alpha: f32,
    clip: &ClipMask,
) {
    if alpha <= 0.0 || !(style.width.is_finite() && style.width > 0.0) {
        return;
    }
    if transform.inverse().is_none() {
        return;
    }
    let Some(mask) = clip.coverage() else {
        return;
    };
    let (Some(path), Some(paint)) = (to_skia_path(path), paint.to_skia(alpha)) else {
        return;
    };
    let stroke = tiny_skia::Stroke {
        width: narrow(style.width),
        miter_limit: narrow(style.miter_limit),
        line_cap: match style.start_cap {
            Cap::Butt => tiny_skia::LineCap::Butt,
            Cap::Square => tiny_skia::LineCap::Square,
            Cap::Round => tiny_skia::LineCap::Round,
        },
        line_join: match style.join {
            Join::Bevel => tiny_skia::LineJoin::Bevel,
            Join::Miter => tiny_skia::LineJoin::Miter,
            Join::Round => tiny_skia::LineJoin::Round,
        },
        ..tiny_skia::Stroke::default()
    };
    dst.as_skia_mut()
        .stroke_path(&path, &paint, &stroke, to_skia_transform(transform), mask);
}

/// Sets every covered pixel of `path` to transparent.
pub fn clear_path(dst: &mut Pixmap, path: &BezPath, transform: Transform2d, clip: &ClipMask) {
    if transform.inverse().is_none() {
        return;
    }
    let Some(mask) = clip.coverage() else {
        return;
    };
    let Some(path) = to_skia_path(path) else {
        return;
    };
    let paint = tiny_skia::Paint {
        blend_mode: BlendMode::Clear,
        anti_alias: true,
        ..tiny_skia::Paint::default()
    };
    dst.as_skia_mut().fill_path(
        &path,
        &paint,
        FillRule::Winding,
        to_skia_transform(transform),
        mask,
    );
}

/// Copies the `src_rect` region of `src` (in source pixels) onto the local
/// rectangle `dest`, mapped through `transform`, with nearest-neighbour
/// sampling.
///
/// The part of `src_rect` outside `src` is not drawn; `dest` shrinks with it.
pub fn blit(
    dst: &mut Pixmap,
    src: &Pixmap,
    src_rect: Rect,
    dest: Rect,
    transform: Transform2d,
    alpha: f32,
    clip: &ClipMask,
) {
    if alpha <= 0.0 || dest.area() <= 0.0 || src_rect.area() <= 0.0 {
        return;
    }
    if transform.inverse().is_none() {
        return;
    }
    let Some(mask) = clip.coverage() else {
        return;
    };
    let bounds = Rect::new(0.0, 0.0, f64::from(src.width()), f64::from(src.height()));
    let visible = src_rect.intersect(bounds);
    if visible.area() <= 0.0 {
        return;
    }
    let sx = dest.width() / src_rect.width();
    let sy = dest.height() / src_rect.height();
    let target = Rect::new(
        dest.x0 + (visible.x0 - src_rect.x0) * sx,
        dest.y0 + (visible.y0 - src_rect.y0) * sy,
        dest.x0 + (visible.x1 - src_rect.x0) * sx,
        dest.y0 + (visible.y1 - src_rect.y0) * sy,
    );
    let Some(path) = to_skia_path(&target.to_path(TOLERANCE)) else {
        return;
    };
    // Maps source pixels onto the local destination rectangle.
    let placement = Transform2d::from_translation(dest.x0, dest.y0)
        * Transform2d::from_scale(sx, sy)
        * Transform2d::from_translation(-src_rect.x0, -src_rect.y0);
    let paint = tiny_skia::Paint {
        shader: Pattern::new(
            src.as_skia().as_ref(),
            SpreadMode::Pad,
            FilterQuality::Nearest,
            alpha.min(1.0),
            to_skia_transform(placement),
        ),
        anti_alias: true,
        ..tiny_skia::Paint::default()
    };
    dst.as_skia_mut().fill_path(
        &path,
        &paint,
        FillRule::Winding,
        to_skia_transform(transform),
        mask,
    );
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "tiny-skia works in f32 device units"
)]
#[inline]
fn narrow(v: f64) -> f32 {
    v as f32
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
        Rect::new(x0, y0, x1, y1).to_path(0.1)
    }

    fn pixmap(width: u32, height: u32) -> Pixmap {
        Pixmap::new(width, height).unwrap()
    }

    fn count_painted(pm: &Pixmap) -> usize {
        pm.pixels().iter().filter(|px| px.alpha() != 0).count()
    }

    fn clip(rect: Rect) -> ClipMask {
        ClipMask::build(10, 10, &[ClipRegion::new(Transform2d::IDENTITY, rect)])
    }

    #[test]
    fn fills_exact_pixel_rect() {
        let mut pm = pixmap(10, 10);
        let red = Paint::Solid(Color::rgb(255, 0, 0));
        fill_path(
            &mut pm,
            &rect_path(2.0, 3.0, 6.0, 5.0),
            Transform2d::IDENTITY,
            &red,
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(count_painted(&pm), 8);
        assert_eq!(pm.color_at(2, 3), Color::rgb(255, 0, 0));
        assert_eq!(pm.color_at(6, 3), Color::TRANSPARENT);
    }

    #[test]
    fn transform_moves_fill() {
        let mut pm = pixmap(10, 10);
        let t = Transform2d::from_translation(5.0, 5.0);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 1.0, 1.0),
            t,
            &Color::WHITE.into(),
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(pm.color_at(5, 5), Color::WHITE);
        assert_eq!(count_painted(&pm), 1);
    }

    #[test]
    fn fractional_edges_are_anti_aliased() {
        let mut pm = pixmap(4, 1);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 1.5, 1.0),
            Transform2d::IDENTITY,
            &Color::WHITE.into(),
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(pm.color_at(0, 0), Color::WHITE);
        let edge = pm.color_at(1, 0).alpha();
        assert!((100..=160).contains(&edge), "edge alpha {edge}");
        assert_eq!(pm.color_at(2, 0), Color::TRANSPARENT);
    }

    #[test]
    fn clip_limits_fill() {
        let mut pm = pixmap(10, 10);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 10.0, 10.0),
            Transform2d::IDENTITY,
            &Color::WHITE.into(),
            1.0,
            &clip(Rect::new(0.0, 0.0, 3.0, 2.0)),
        );
        assert_eq!(count_painted(&pm), 6);
    }

    #[test]
    fn clips_intersect_into_one_mask() {
        let clips = [
            ClipRegion::new(Transform2d::IDENTITY, Rect::new(0.0, 0.0, 6.0, 6.0)),
            ClipRegion::new(Transform2d::from_translation(4.0, 4.0), Rect::new(0.0, 0.0, 6.0, 6.0)),
        ];
        let mut pm = pixmap(10, 10);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 10.0, 10.0),
            Transform2d::IDENTITY,
            &Color::WHITE.into(),
            1.0,
            &ClipMask::build(10, 10, &clips),
        );
        assert_eq!(count_painted(&pm), 4);
        assert_eq!(pm.color_at(5, 5), Color::WHITE);
    }

    #[test]
    fn zero_area_clip_is_noop() {
        let mask = clip(Rect::new(1.0, 1.0, 1.0, 3.0));
        assert!(mask.is_empty());
        let mut pm = pixmap(4, 4);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 4.0, 4.0),
            Transform2d::IDENTITY,
            &Color::WHITE.into(),
            1.0,
            &mask,
        );
        assert_eq!(count_painted(&pm), 0);
    }

    #[test]
    fn half_alpha_blends_over_black() {
        let mut pm = pixmap(1, 1);
        pm.fill(Color::BLACK);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 1.0, 1.0),
            Transform2d::IDENTITY,
            &Color::WHITE.into(),
            0.5,
            &ClipMask::Unclipped,
        );
        let c = pm.color_at(0, 0);
        assert_eq!(c.alpha(), 255);
        assert!((126..=130).contains(&c.red()), "got {c:?}");
    }

    #[test]
    fn gradient_paint_follows_transform() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let g = Gradient::linear(0.0, 0.0, 10.0, 0.0, &[red, blue], &[0.0, 1.0]).unwrap();
        let mut pm = pixmap(20, 1);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 10.0, 1.0),
            Transform2d::from_scale(2.0, 1.0),
            &g.into(),
            1.0,
            &ClipMask::Unclipped,
        );
        let left = pm.color_at(0, 0);
        let right = pm.color_at(19, 0);
        assert!(left.red() > 230 && left.blue() < 25, "got {left:?}");
        assert!(right.blue() > 230 && right.red() < 25, "got {right:?}");
    }

    #[test]
    fn stroke_follows_outline() {
        let mut pm = pixmap(10, 10);
        stroke_path(
            &mut pm,
            &rect_path(2.0, 2.0, 8.0, 8.0),
            Transform2d::IDENTITY,
            &Stroke::new(2.0),
            &Color::WHITE.into(),
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(pm.color_at(1, 5), Color::WHITE);
        assert_eq!(pm.color_at(2, 5), Color::WHITE);
        assert_eq!(pm.color_at(5, 5), Color::TRANSPARENT);
    }

    #[test]
    fn blit_scales_source() {
        // Premultiplied RGBA: opaque red then opaque blue.
        let src = Pixmap::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let mut dst = pixmap(4, 2);
        blit(
            &mut dst,
            &src,
            Rect::new(0.0, 0.0, 2.0, 1.0),
            Rect::new(0.0, 0.0, 4.0, 2.0),
            Transform2d::IDENTITY,
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(dst.color_at(0, 0), Color::rgb(255, 0, 0));
        assert_eq!(dst.color_at(1, 1), Color::rgb(255, 0, 0));
        assert_eq!(dst.color_at(2, 0), Color::rgb(0, 0, 255));
        assert_eq!(dst.color_at(3, 1), Color::rgb(0, 0, 255));
    }

    #[test]
    fn blit_sub_region() {
        let mut src = pixmap(2, 2);
        src.fill(Color::rgb(255, 0, 0));
        fill_path(
            &mut src,
            &rect_path(1.0, 1.0, 2.0, 2.0),
            Transform2d::IDENTITY,
            &Color::rgb(0, 255, 0).into(),
            1.0,
            &ClipMask::Unclipped,
        );
        let mut dst = pixmap(3, 3);
        blit(
            &mut dst,
            &src,
            Rect::new(1.0, 1.0, 2.0, 2.0),
            Rect::new(0.0, 0.0, 3.0, 3.0),
            Transform2d::IDENTITY,
            1.0,
            &ClipMask::Unclipped,
        );
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(dst.color_at(x, y), Color::rgb(0, 255, 0), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn blit_skips_source_outside_bounds() {
        let mut src = pixmap(2, 2);
        src.fill(Color::WHITE);
        let mut dst = pixmap(4, 4);
        blit(
            &mut dst,
            &src,
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Transform2d::IDENTITY,
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(count_painted(&dst), 4);
        assert_eq!(dst.color_at(2, 2), Color::TRANSPARENT);
    }

    #[test]
    fn singular_transform_draws_nothing() {
        let mut pm = pixmap(4, 4);
        fill_path(
            &mut pm,
            &rect_path(0.0, 0.0, 4.0, 4.0),
            Transform2d::from_scale(0.0, 1.0),
            &Color::WHITE.into(),
            1.0,
            &ClipMask::Unclipped,
        );
        assert_eq!(count_painted(&pm), 0);
    }

    #[test]
    fn clear_path_erases() {
        let mut pm = pixmap(4, 4);
        pm.fill(Color::WHITE);
        clear_path(
            &mut pm,
            &rect_path(0.0, 0.0, 2.0, 4.0),
            Transform2d::IDENTITY,
            &ClipMask::Unclipped,
        );
        assert_eq!(count_painted(&pm), 8);
    }
}
