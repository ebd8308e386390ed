// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for frame compositing.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! compositing traversal calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`LayerPaintEvent`] and the
//!   corresponding `TraceSink` method.

#[cfg(feature = "trace-rich")]
use crate::layer::LayerKindTag;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after the layer tree has been evaluated and before painting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Layers whose world transform or visibility was recomputed.
    pub transforms_changed: u32,
    /// Layers whose effective alpha was recomputed.
    pub alphas_changed: u32,
    /// Layers whose retained content changed.
    pub content_changed: u32,
    /// Whether the tree topology changed since the previous frame.
    pub topology_changed: bool,
}

/// Emitted for every layer the traversal composites.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerPaintEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Slot index of the layer.
    pub layer_index: u32,
    /// Which kind of layer was painted.
    pub kind: LayerKindTag,
    /// Effective alpha the layer was painted with.
    pub alpha: f32,
}

/// Emitted when a clip-bearing layer sits inside another clip-bearing layer.
///
/// The inner clip replaces the outer one for the inner subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipConflictEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Slot index of the inner clip-bearing layer (the one that wins).
    pub layer_index: u32,
    /// Slot index of the ancestor whose clip was overridden.
    pub overridden_index: u32,
}

/// Per-frame totals, returned by [`Graphics::paint`](crate::Graphics::paint)
/// and passed to [`TraceSink::on_frame_summary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Visible layers visited (groups included).
    pub layers_painted: u32,
    /// Hidden layers skipped together with their subtree.
    pub hidden_skipped: u32,
    /// Immediate renderer callbacks invoked.
    pub immediate_calls: u32,
    /// Clip nesting conflicts resolved innermost-wins.
    pub clip_conflicts: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the compositing traversal.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called once per frame before any layer is painted.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called for each painted layer (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_layer_painted(&mut self, e: &LayerPaintEvent) {
        _ = e;
    }

    /// Called when nested clips are resolved.
    fn on_clip_conflict(&mut self, e: &ClipConflictEvent) {
        _ = e;
    }

    /// Called once per frame after the traversal completes.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayerPaintEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn layer_painted(&mut self, e: &LayerPaintEvent) {
        if let Some(s) = &mut self.sink {
            s.on_layer_painted(e);
        }
    }

    /// Emits a [`ClipConflictEvent`].
    #[inline]
    pub fn clip_conflict(&mut self, e: &ClipConflictEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_clip_conflict(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
