// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2-D affine transform attached to every layer.
//!
//! The matrix is stored as six coefficients `[a, b, c, d, e, f]` describing
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! which is the same layout as [`kurbo::Affine`], so conversion is free.
//! Composition is `parent * child`: the child's transform is applied first.

use core::ops::Mul;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect, Vec2};

/// A 2-D affine transform (scale, rotation, skew, translation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2d {
    /// Coefficients `[a, b, c, d, e, f]` in column order.
    pub coeffs: [f64; 6],
}

impl Transform2d {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        coeffs: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Creates a transform from raw coefficients.
    #[inline]
    #[must_use]
    pub const fn new(coeffs: [f64; 6]) -> Self {
        Self { coeffs }
    }

    /// Creates a pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(tx: f64, ty: f64) -> Self {
        Self {
            coeffs: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    /// Creates a non-uniform scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64) -> Self {
        Self {
            coeffs: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Creates a rotation (radians, clockwise in y-down screen space).
    #[inline]
    #[must_use]
    pub fn from_rotation(radians: f64) -> Self {
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            coeffs: [c, s, -s, c, 0.0, 0.0],
        }
    }

    /// Creates a shear with the given x and y skew factors.
    #[inline]
    #[must_use]
    pub const fn from_skew(kx: f64, ky: f64) -> Self {
        Self {
            coeffs: [1.0, ky, kx, 1.0, 0.0, 0.0],
        }
    }

    /// Returns this transform followed by a translation.
    #[inline]
    #[must_use]
    pub fn then_translate(self, tx: f64, ty: f64) -> Self {
        Self::from_translation(tx, ty) * self
    }

    /// Returns the translation component `(e, f)`.
    #[inline]
    #[must_use]
    pub const fn translation(self) -> Vec2 {
        Vec2::new(self.coeffs[4], self.coeffs[5])
    }

    /// Replaces the translation component.
    #[inline]
    #[must_use]
    pub const fn with_translation(mut self, tx: f64, ty: f64) -> Self {
        self.coeffs[4] = tx;
        self.coeffs[5] = ty;
        self
    }

    /// Horizontal scale: the length of the transformed x basis vector.
    #[must_use]
    pub fn scale_x(self) -> f64 {
        self.coeffs[0].hypot(self.coeffs[1])
    }

    /// Vertical scale, signed so that reflections are preserved.
    #[must_use]
    pub fn scale_y(self) -> f64 {
        let sx = self.scale_x();
        if sx == 0.0 {
            return self.coeffs[2].hypot(self.coeffs[3]);
        }
        self.determinant() / sx
    }

    /// Rotation of the x basis vector, in radians.
    #[must_use]
    pub fn rotation(self) -> f64 {
        self.coeffs[1].atan2(self.coeffs[0])
    }

    /// Shear factor remaining after removing rotation and scale.
    #[must_use]
    pub fn skew(self) -> f64 {
        let [a, b, c, d, ..] = self.coeffs;
        let sx = self.scale_x();
        let sy = self.scale_y();
        if sx == 0.0 || sy == 0.0 {
            return 0.0;
        }
        (a * c + b * d) / (sx * sy)
    }

    /// The determinant of the linear part.
    #[inline]
    #[must_use]
    pub fn determinant(self) -> f64 {
        self.coeffs[0] * self.coeffs[3] - self.coeffs[1] * self.coeffs[2]
    }

    /// Returns the inverse transform, or `None` if the transform is singular.
    #[must_use]
    pub fn inverse(self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [a, b, c, d, e, f] = self.coeffs;
        let inv = 1.0 / det;
        Some(Self {
            coeffs: [
                d * inv,
                -b * inv,
                -c * inv,
                a * inv,
                (c * f - d * e) * inv,
                (b * e - a * f) * inv,
            ],
        })
    }

    /// Maps a point through this transform.
    #[inline]
    #[must_use]
    pub fn transform_point(self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.coeffs;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Returns the axis-aligned bounding box of a transformed rectangle.
    #[must_use]
    pub fn transform_rect_bbox(self, rect: Rect) -> Rect {
        self.to_affine().transform_rect_bbox(rect)
    }

    /// Whether the transform keeps axis-aligned rectangles axis-aligned.
    #[inline]
    #[must_use]
    pub fn is_axis_aligned(self) -> bool {
        (self.coeffs[1] == 0.0 && self.coeffs[2] == 0.0)
            || (self.coeffs[0] == 0.0 && self.coeffs[3] == 0.0)
    }

    /// Converts to a [`kurbo::Affine`].
    #[inline]
    #[must_use]
    pub const fn to_affine(self) -> Affine {
        Affine::new(self.coeffs)
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        let c = &self.coeffs;
        c[0].is_finite()
            && c[1].is_finite()
            && c[2].is_finite()
            && c[3].is_finite()
            && c[4].is_finite()
            && c[5].is_finite()
    }

    /// Is this transform [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[inline]
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        let c = &self.coeffs;
        c[0].is_nan() || c[1].is_nan() || c[2].is_nan() || c[3].is_nan() || c[4].is_nan() || c[5].is_nan()
    }
}

impl Default for Transform2d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Transform2d {
    #[inline]
    fn from(affine: Affine) -> Self {
        Self {
            coeffs: affine.as_coeffs(),
        }
    }
}

impl From<Transform2d> for Affine {
    #[inline]
    fn from(t: Transform2d) -> Self {
        t.to_affine()
    }
}

impl Mul for Transform2d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let [a0, b0, c0, d0, e0, f0] = self.coeffs;
        let [a1, b1, c1, d1, e1, f1] = rhs.coeffs;
        Self {
            coeffs: [
                a0 * a1 + c0 * b1,
                b0 * a1 + d0 * b1,
                a0 * c1 + c0 * d1,
                b0 * c1 + d0 * d1,
                a0 * e1 + c0 * f1 + e0,
                b0 * e1 + d0 * f1 + f0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: Transform2d, b: Transform2d) -> bool {
        a.coeffs
            .iter()
            .zip(b.coeffs.iter())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform2d::default(), Transform2d::IDENTITY);
    }

    #[test]
    fn identity_multiply() {
        let t = Transform2d::from_translation(1.0, 2.0) * Transform2d::from_rotation(0.3);
        assert_eq!(Transform2d::IDENTITY * t, t);
        assert_eq!(t * Transform2d::IDENTITY, t);
    }

    #[test]
    fn translation_composition() {
        let parent = Transform2d::from_translation(10.0, 20.0);
        let child = Transform2d::from_translation(5.0, 5.0);
        assert_eq!((parent * child).translation(), Vec2::new(15.0, 25.0));
    }

    #[test]
    fn composition_is_associative() {
        let a = Transform2d::from_translation(3.0, -1.0);
        let b = Transform2d::from_rotation(0.7);
        let c = Transform2d::from_scale(2.0, 0.5);
        assert!(approx((a * b) * c, a * (b * c)));
    }

    #[test]
    fn scale_then_translate() {
        let combined = Transform2d::from_translation(3.0, 4.0) * Transform2d::from_scale(2.0, 2.0);
        let p = combined.transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(5.0, 6.0));
    }

    #[test]
    fn decomposition_recovers_parts() {
        let t = Transform2d::from_translation(7.0, 8.0)
            * Transform2d::from_rotation(0.5)
            * Transform2d::from_scale(2.0, 3.0);
        assert!((t.scale_x() - 2.0).abs() < EPS);
        assert!((t.scale_y() - 3.0).abs() < EPS);
        assert!((t.rotation() - 0.5).abs() < EPS);
        assert!(t.skew().abs() < EPS);
        assert_eq!(t.translation(), Vec2::new(7.0, 8.0));
    }

    #[test]
    fn inverse_round_trips_points() {
        let t = Transform2d::from_translation(4.0, -2.0) * Transform2d::from_rotation(1.1);
        let inv = t.inverse().unwrap();
        let p = Point::new(3.0, 9.0);
        let q = inv.transform_point(t.transform_point(p));
        assert!((q - p).hypot() < EPS);
    }

    #[test]
    fn singular_has_no_inverse() {
        assert!(Transform2d::from_scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn matches_kurbo_composition() {
        let a = Transform2d::from_rotation(0.25) * Transform2d::from_skew(0.1, 0.0);
        let b = Transform2d::from_translation(2.0, 3.0);
        let ours = (a * b).to_affine();
        let theirs = a.to_affine() * b.to_affine();
        assert!(approx(ours.into(), theirs.into()));
    }

    #[test]
    fn axis_alignment() {
        assert!(Transform2d::from_scale(2.0, 3.0).is_axis_aligned());
        assert!(!Transform2d::from_rotation(0.2).is_axis_aligned());
    }

    #[test]
    fn nan_detected() {
        let mut t = Transform2d::IDENTITY;
        t.coeffs[4] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
    }
}
