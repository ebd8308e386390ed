// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed ARGB colors.

use core::fmt;

/// A non-premultiplied color packed as `0xAARRGGBB`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    /// Creates a color from alpha, red, green and blue components.
    #[inline]
    #[must_use]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xFF, r, g, b)
    }

    /// Alpha component.
    #[inline]
    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracts one byte")]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracts one byte")]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracts one byte")]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Returns this color with its alpha multiplied by `factor` (clamped to `0..=1`).
    #[must_use]
    pub fn scale_alpha(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "product of a u8 and a factor in 0..=1 fits in u8"
        )]
        let a = (f32::from(self.alpha()) * factor + 0.5) as u8;
        Self((self.0 & 0x00FF_FFFF) | (u32::from(a) << 24))
    }

    /// Linear interpolation between two colors, component-wise.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| -> u8 {
            let v = f32::from(x) + (f32::from(y) - f32::from(x)) * t;
            #[expect(
                clippy::cast_possible_truncation,
                reason = "interpolation between two u8 values stays in range"
            )]
            let out = (v + 0.5) as u8;
            out
        };
        Self::argb(
            mix(self.alpha(), other.alpha()),
            mix(self.red(), other.red()),
            mix(self.green(), other.green()),
            mix(self.blue(), other.blue()),
        )
    }
}

impl From<Color> for tiny_skia::Color {
    fn from(c: Color) -> Self {
        Self::from_rgba8(c.red(), c.green(), c.blue(), c.alpha())
    }
}

impl From<tiny_skia::ColorU8> for Color {
    fn from(c: tiny_skia::ColorU8) -> Self {
        Self::argb(c.alpha(), c.red(), c.green(), c.blue())
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08X})", self.0)
    }
}
