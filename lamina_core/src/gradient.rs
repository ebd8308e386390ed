// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear and radial gradient fills.
//!
//! Stop positions are normalized at construction: each position is clamped
//! to `[0, 1]` and then raised to at least its predecessor, so the sequence
//! is non-decreasing. Colors are never reordered; each stays paired with the
//! position it was given. Sampling before the first stop returns the first
//! color and sampling past the last stop returns the last color.
//! A first stop above `0` or a last stop below `1` is therefore handled by
//! extending the end colors to the edges, never by rescaling the stops.
//!
//! Rasterization goes through [`Gradient::to_shader`], which hands the same
//! geometry and stops to tiny-skia.

use alloc::vec::Vec;

use kurbo::Point;
use tiny_skia::{GradientStop, LinearGradient, RadialGradient, Shader, SpreadMode};

use crate::color::Color;
use crate::error::GraphicsError;

/// Gradient geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    /// Varies along the segment from `start` to `end`.
    Linear {
        /// Position of stop `0.0`.
        start: Point,
        /// Position of stop `1.0`.
        end: Point,
    },
    /// Varies with distance from `center`, reaching stop `1.0` at `radius`.
    Radial {
        /// Center of the gradient circle.
        center: Point,
        /// Radius of the gradient circle.
        radius: f64,
    },
}

/// A color at a normalized position along a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    /// Stop color.
    pub color: Color,
    /// Position in `[0, 1]`.
    pub position: f32,
}

/// An immutable gradient fill pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    kind: GradientKind,
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Creates a linear gradient from `(x0, y0)` to `(x1, y1)`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::MismatchedStopCount`] if `colors` and `positions`
    /// differ in length, [`GraphicsError::EmptyGradient`] if both are empty.
    pub fn linear(
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        colors: &[Color],
        positions: &[f32],
    ) -> Result<Self, GraphicsError> {
        let kind = GradientKind::Linear {
            start: Point::new(x0, y0),
            end: Point::new(x1, y1),
        };
        Self::build(kind, colors, positions)
    }

    /// Creates a radial gradient covering the circle at `(x, y)` with radius `r`.
    ///
    /// # Errors
    ///
    /// As [`linear`](Self::linear), plus [`GraphicsError::InvalidDimensions`]
    /// if `r` is not positive and finite.
    pub fn radial(
        x: f64,
        y: f64,
        r: f64,
        colors: &[Color],
        positions: &[f32],
    ) -> Result<Self, GraphicsError> {
        if !(r.is_finite() && r > 0.0) {
            return Err(GraphicsError::InvalidDimensions {
                width: r,
                height: r,
            });
        }
        let kind = GradientKind::Radial {
            center: Point::new(x, y),
            radius: r,
        };
        Self::build(kind, colors, positions)
    }

    fn build(kind: GradientKind, colors: &[Color], positions: &[f32]) -> Result<Self, GraphicsError> {
        if colors.len() != positions.len() {
            return Err(GraphicsError::MismatchedStopCount {
                colors: colors.len(),
                positions: positions.len(),
            });
        }
        if colors.is_empty() {
            return Err(GraphicsError::EmptyGradient);
        }

        let mut stops = Vec::with_capacity(colors.len());
        let mut floor = 0.0_f32;
        let mut adjusted = false;
        for (&color, &requested) in colors.iter().zip(positions) {
            let position = if requested.is_nan() {
                floor
            } else {
                requested.clamp(0.0, 1.0).max(floor)
            };
            adjusted |= position != requested;
            floor = position;
            stops.push(ColorStop { color, position });
        }
        if adjusted {
            log::debug!("gradient stop positions {positions:?} clamped to be non-decreasing in [0, 1]");
        }

        Ok(Self { kind, stops })
    }

    /// Gradient geometry.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> GradientKind {
        self.kind
    }

    /// Normalized color stops, in the order they were given.
    #[inline]
    #[must_use]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at a point in the gradient's coordinate space.
    #[must_use]
    pub fn color_at(&self, p: Point) -> Color {
        let t = match self.kind {
            GradientKind::Linear { start, end } => {
                let d = end - start;
                let len2 = d.hypot2();
                // A zero-length axis paints the first stop everywhere.
                if len2 == 0.0 {
                    0.0
                } else {
                    (p - start).dot(d) / len2
                }
            }
            GradientKind::Radial { center, radius } => (p - center).hypot() / radius,
        };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "gradient parameter is clamped to 0..=1 before narrowing"
        )]
        let t = t.clamp(0.0, 1.0) as f32;
        self.sample(t)
    }

    /// Color at gradient parameter `t`.
    #[must_use]
    pub fn sample(&self, t: f32) -> Color {
        let first = self.stops[0];
        if t <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.position {
                let span = b.position - a.position;
                if span <= 0.0 {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.position) / span);
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// Converts to a tiny-skia shader in the gradient's own coordinate space,
    /// with every stop's alpha multiplied by `alpha`.
    ///
    /// Returns `None` only if tiny-skia rejects the geometry.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "tiny-skia works in f32 device units"
    )]
    #[must_use]
    pub fn to_shader(&self, alpha: f32) -> Option<Shader<'static>> {
        let color = |c: Color| {
            let mut c = tiny_skia::Color::from(c);
            c.apply_opacity(alpha);
            c
        };
        let point = |p: Point| tiny_skia::Point::from_xy(p.x as f32, p.y as f32);
        let stops: Vec<GradientStop> = self
            .stops
            .iter()
            .map(|s| GradientStop::new(s.position, color(s.color)))
            .collect();
        match self.kind {
            GradientKind::Linear { start, end } if start == end => {
                Some(Shader::SolidColor(color(self.stops[0].color)))
            }
            GradientKind::Linear { start, end } => LinearGradient::new(
                point(start),
                point(end),
                stops,
                SpreadMode::Pad,
                tiny_skia::Transform::identity(),
            ),
            GradientKind::Radial { center, radius } => RadialGradient::new(
                point(center),
                point(center),
                radius as f32,
                stops,
                SpreadMode::Pad,
                tiny_skia::Transform::identity(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const GREEN: Color = Color::rgb(0, 255, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn mismatched_lengths_rejected() {
        let err = Gradient::linear(0.0, 0.0, 1.0, 0.0, &[RED, BLUE], &[0.0]).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::MismatchedStopCount {
                colors: 2,
                positions: 1
            }
        );
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(
            Gradient::linear(0.0, 0.0, 1.0, 0.0, &[], &[]).unwrap_err(),
            GraphicsError::EmptyGradient
        );
    }

    #[test]
    fn valid_stops_preserved_in_order() {
        let g = Gradient::linear(0.0, 0.0, 10.0, 0.0, &[RED, GREEN, BLUE], &[0.0, 0.5, 1.0])
            .unwrap();
        let positions: Vec<f32> = g.stops().iter().map(|s| s.position).collect();
        let colors: Vec<Color> = g.stops().iter().map(|s| s.color).collect();
        assert_eq!(positions, [0.0, 0.5, 1.0]);
        assert_eq!(colors, [RED, GREEN, BLUE]);
    }

    #[test]
    fn decreasing_positions_are_clamped_not_reordered() {
        let g = Gradient::linear(0.0, 0.0, 1.0, 0.0, &[RED, GREEN, BLUE], &[0.6, 0.2, 1.5])
            .unwrap();
        let positions: Vec<f32> = g.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, [0.6, 0.6, 1.0]);
        assert_eq!(g.stops()[1].color, GREEN);
    }

    #[test]
    fn linear_sampling() {
        let g = Gradient::linear(0.0, 0.0, 10.0, 0.0, &[RED, BLUE], &[0.0, 1.0]).unwrap();
        assert_eq!(g.color_at(Point::new(-5.0, 0.0)), RED);
        assert_eq!(g.color_at(Point::new(20.0, 3.0)), BLUE);
        assert_eq!(g.color_at(Point::new(5.0, 7.0)), Color::rgb(128, 0, 128));
    }

    #[test]
    fn radial_sampling() {
        let g = Gradient::radial(0.0, 0.0, 10.0, &[RED, BLUE], &[0.0, 1.0]).unwrap();
        assert_eq!(g.color_at(Point::new(0.0, 0.0)), RED);
        assert_eq!(g.color_at(Point::new(0.0, 10.0)), BLUE);
    }

    #[test]
    fn radial_needs_positive_radius() {
        assert!(Gradient::radial(0.0, 0.0, 0.0, &[RED], &[0.0]).is_err());
    }

    #[test]
    fn before_first_and_after_last_stop() {
        let g = Gradient::linear(0.0, 0.0, 1.0, 0.0, &[RED, BLUE], &[0.25, 0.75]).unwrap();
        assert_eq!(g.sample(0.0), RED);
        assert_eq!(g.sample(1.0), BLUE);
    }

    #[test]
    fn inner_stops_extend_end_colors() {
        let g = Gradient::linear(0.0, 0.0, 10.0, 0.0, &[RED, BLUE], &[0.2, 0.8]).unwrap();
        let positions: Vec<f32> = g.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, [0.2, 0.8]);
        assert_eq!(g.sample(0.1), RED);
        assert_eq!(g.sample(0.9), BLUE);
        assert_eq!(g.color_at(Point::new(1.0, 0.0)), RED);
        assert_eq!(g.color_at(Point::new(9.0, 0.0)), BLUE);
    }

    #[test]
    fn degenerate_axis_shades_first_stop() {
        let g = Gradient::linear(3.0, 3.0, 3.0, 3.0, &[RED, BLUE], &[0.0, 1.0]).unwrap();
        assert_eq!(g.color_at(Point::new(50.0, 0.0)), RED);
        match g.to_shader(1.0) {
            Some(Shader::SolidColor(c)) => assert_eq!(Color::from(c.to_color_u8()), RED),
            other => panic!("expected a solid shader, got {other:?}"),
        }
    }
}
