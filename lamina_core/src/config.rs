// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Startup configuration for [`Graphics`](crate::Graphics).

use crate::backend::Backend;
use crate::error::GraphicsError;

/// How attaching one clip-bearing layer under another is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClipNesting {
    /// Allow it; at paint time the inner clip replaces the outer one and a
    /// warning is logged once per layer.
    #[default]
    InnermostWins,
    /// Refuse the attach with [`GraphicsError::UnsupportedNesting`].
    Reject,
}

/// Values the platform supplies when creating a [`Graphics`](crate::Graphics).
///
/// Sizes are in logical units. `scale_factor` maps logical units to physical
/// pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphicsConfig {
    /// Width of the whole display.
    pub screen_width: u32,
    /// Height of the whole display.
    pub screen_height: u32,
    /// Initial width of the drawable surface.
    pub width: u32,
    /// Initial height of the drawable surface.
    pub height: u32,
    /// Physical pixels per logical unit.
    pub scale_factor: f64,
    /// Rasterization backend.
    pub backend: Backend,
    /// Clip nesting policy.
    pub clip_nesting: ClipNesting,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

impl GraphicsConfig {
    /// A 1920x1080 display with a 1280x720 window at scale 1.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            width: 1280,
            height: 720,
            scale_factor: 1.0,
            backend: Backend::Software,
            clip_nesting: ClipNesting::InnermostWins,
        }
    }

    /// A 1440x900 logical display at scale 2, with a full-screen surface.
    #[must_use]
    pub const fn hidpi() -> Self {
        Self {
            screen_width: 1440,
            screen_height: 900,
            width: 1440,
            height: 900,
            scale_factor: 2.0,
            backend: Backend::Software,
            clip_nesting: ClipNesting::InnermostWins,
        }
    }

    /// Sets the surface size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the display size.
    #[must_use]
    pub const fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Sets the scale factor.
    #[must_use]
    pub const fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Sets the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the clip nesting policy.
    #[must_use]
    pub const fn with_clip_nesting(mut self, policy: ClipNesting) -> Self {
        self.clip_nesting = policy;
        self
    }

    /// Checks that every size is non-zero and the scale factor is positive.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] naming the offending pair.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        for (w, h) in [
            (self.screen_width, self.screen_height),
            (self.width, self.height),
        ] {
            if w == 0 || h == 0 {
                return Err(GraphicsError::InvalidDimensions {
                    width: f64::from(w),
                    height: f64::from(h),
                });
            }
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(GraphicsError::InvalidDimensions {
                width: self.scale_factor,
                height: self.scale_factor,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(GraphicsConfig::desktop().validate().is_ok());
        assert!(GraphicsConfig::hidpi().validate().is_ok());
        assert_eq!(GraphicsConfig::default(), GraphicsConfig::desktop());
    }

    #[test]
    fn zero_size_rejected() {
        let err = GraphicsConfig::desktop().with_size(0, 10).validate();
        assert_eq!(
            err,
            Err(GraphicsError::InvalidDimensions {
                width: 0.0,
                height: 10.0
            })
        );
    }

    #[test]
    fn bad_scale_rejected() {
        assert!(GraphicsConfig::desktop().with_scale_factor(0.0).validate().is_err());
        assert!(GraphicsConfig::desktop().with_scale_factor(f64::NAN).validate().is_err());
    }
}
