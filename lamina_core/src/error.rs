// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for structural failures reported by factories and tree mutation.

/// Errors reported synchronously by the call that caused them.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum GraphicsError {
    /// A factory or resize was given a non-positive or non-finite size.
    #[error("invalid dimensions {width}x{height}: both must be positive and finite")]
    InvalidDimensions {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },
    /// Gradient colors and stop positions have different lengths.
    #[error("gradient has {colors} colors but {positions} stop positions")]
    MismatchedStopCount {
        /// Number of colors supplied.
        colors: usize,
        /// Number of positions supplied.
        positions: usize,
    },
    /// A gradient was requested with no color stops.
    #[error("gradient needs at least one color stop")]
    EmptyGradient,
    /// Attaching the layer would make it its own descendant.
    #[error("attaching layer would create a cycle in the layer tree")]
    CyclicGraph,
    /// Children can only be attached to group layers.
    #[error("layer is not a group and cannot hold children")]
    NotAGroup,
    /// A clip-bearing layer would end up inside another clip-bearing layer
    /// while the strict nesting policy is active.
    #[error("clipped layers do not nest")]
    UnsupportedNesting,
    /// Font data could not be parsed as an OpenType font or collection.
    #[error("font data is not a readable OpenType font")]
    InvalidFont,
    /// The running backend has no GPU context.
    #[error("no GPU context is available on this backend")]
    BackendUnavailable,
}
