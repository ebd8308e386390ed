// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use lamina_core::trace::{
    ClipConflictEvent, FrameBeginEvent, FrameSummary, LayerPaintEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    layers: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-layer paint lines are off; see [`with_layers`](Self::with_layers).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            layers: false,
        }
    }

    /// Also prints one line per painted layer.
    #[must_use]
    pub fn with_layers(mut self, layers: bool) -> Self {
        self.layers = layers;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let topology = if e.topology_changed { " topology" } else { "" };
        let _ = writeln!(
            self.writer,
            "[begin] frame={} transforms={} alphas={} content={}{topology}",
            e.frame_index, e.transforms_changed, e.alphas_changed, e.content_changed,
        );
    }

    fn on_layer_painted(&mut self, e: &LayerPaintEvent) {
        if !self.layers {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[layer] frame={} #{} {} alpha={:.2}",
            e.frame_index,
            e.layer_index,
            e.kind.name(),
            e.alpha,
        );
    }

    fn on_clip_conflict(&mut self, e: &ClipConflictEvent) {
        let _ = writeln!(
            self.writer,
            "[clip] frame={} #{} overrides #{}",
            e.frame_index, e.layer_index, e.overridden_index,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} painted={} hidden={} immediate={} clip_conflicts={}",
            s.frame_index, s.layers_painted, s.hidden_skipped, s.immediate_calls, s.clip_conflicts,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::layer::LayerKindTag;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_frame() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            transforms_changed: 2,
            alphas_changed: 0,
            content_changed: 1,
            topology_changed: true,
        });
        sink.on_frame_summary(&FrameSummary {
            frame_index: 1,
            layers_painted: 4,
            ..FrameSummary::default()
        });
        let output = output(sink);
        assert!(output.contains("[begin] frame=1"), "got: {output}");
        assert!(output.contains("topology"), "got: {output}");
        assert!(output.contains("painted=4"), "got: {output}");
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn layer_lines_are_opt_in() {
        let event = LayerPaintEvent {
            frame_index: 0,
            layer_index: 3,
            kind: LayerKindTag::ClippedGroup,
            alpha: 0.5,
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_layer_painted(&event);
        assert!(output(quiet).is_empty());

        let mut loud = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_layers(true);
        loud.on_layer_painted(&event);
        let output = output(loud);
        assert!(output.contains("#3"), "got: {output}");
        assert!(output.contains(LayerKindTag::ClippedGroup.name()), "got: {output}");
    }

    #[test]
    fn clip_conflict_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_clip_conflict(&ClipConflictEvent {
            frame_index: 9,
            layer_index: 2,
            overridden_index: 1,
        });
        assert_eq!(output(sink), "[clip] frame=9 #2 overrides #1\n");
    }
}
