// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`ChromeTraceSink`] accumulates events as they arrive and
//! [`export`](ChromeTraceSink::export) writes them as
//! [Chrome Trace Event Format][format] JSON.
//!
//! Compositing events carry no wall-clock time, so timestamps are synthetic:
//! each frame occupies a [`FRAME_SPACING_US`] slot and events inside a frame
//! are placed one microsecond apart in arrival order.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use lamina_core::trace::{
    ClipConflictEvent, FrameBeginEvent, FrameSummary, LayerPaintEvent, TraceSink,
};

/// Width of one frame on the exported timeline, in microseconds.
pub const FRAME_SPACING_US: u64 = 16_667;

/// A [`TraceSink`] that buffers Chrome trace events in memory.
#[derive(Debug, Default)]
pub struct ChromeTraceSink {
    events: Vec<Value>,
    frame_index: u64,
    offset: u64,
}

impl ChromeTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered trace event objects.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Exports the buffered events as a JSON array.
    ///
    /// The output is suitable for loading into `chrome://tracing` or
    /// [Perfetto](https://ui.perfetto.dev/).
    pub fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn enter_frame(&mut self, frame_index: u64) {
        if frame_index != self.frame_index {
            self.frame_index = frame_index;
            self.offset = 0;
        }
    }

    fn next_ts(&mut self) -> u64 {
        let ts = self.frame_index * FRAME_SPACING_US + self.offset;
        self.offset = (self.offset + 1).min(FRAME_SPACING_US - 1);
        ts
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.enter_frame(e.frame_index);
        let ts = self.next_ts();
        self.events.push(json!({
            "ph": "B",
            "name": "Frame",
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": e.frame_index,
                "transforms_changed": e.transforms_changed,
                "alphas_changed": e.alphas_changed,
                "content_changed": e.content_changed,
                "topology_changed": e.topology_changed,
            }
        }));
    }

    fn on_layer_painted(&mut self, e: &LayerPaintEvent) {
        self.enter_frame(e.frame_index);
        let ts = self.next_ts();
        self.events.push(json!({
            "ph": "i",
            "name": e.kind.name(),
            "cat": "Rich",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "frame_index": e.frame_index,
                "layer_index": e.layer_index,
                "alpha": e.alpha,
            }
        }));
    }

    fn on_clip_conflict(&mut self, e: &ClipConflictEvent) {
        self.enter_frame(e.frame_index);
        let ts = self.next_ts();
        self.events.push(json!({
            "ph": "i",
            "name": "ClipConflict",
            "cat": "Paint",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "frame_index": e.frame_index,
                "layer_index": e.layer_index,
                "overridden_index": e.overridden_index,
            }
        }));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.enter_frame(s.frame_index);
        let ts = self.next_ts();
        self.events.push(json!({
            "ph": "E",
            "name": "Frame",
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": s.frame_index,
                "layers_painted": s.layers_painted,
                "hidden_skipped": s.hidden_skipped,
                "immediate_calls": s.immediate_calls,
                "clip_conflicts": s.clip_conflicts,
            }
        }));
    }
}
