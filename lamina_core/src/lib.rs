// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained 2D layer tree and canvas drawing for application UIs.
//!
//! `lamina_core` lets application code build a tree of compositing layers,
//! draw into offscreen canvas images, and composite the tree into a
//! backend-agnostic [`DrawContext`](backend::DrawContext) every frame. It is
//! `no_std` compatible (with `alloc`) and stores layers in struct-of-arrays
//! form with generational index handles.
//!
//! # Architecture
//!
//! ```text
//!   GraphicsConfig ──► Graphics::new()
//!                          │
//!         create_*_layer / add_child / set_transform ...
//!                          │
//!                          ▼
//!   LayerStore::evaluate() ──► FrameChanges
//!                          │
//!                          ▼
//!   LayerStore::paint() ──► DrawContext (render plan, software, GPU)
//! ```
//!
//! **[`graphics`]**: the per-surface [`Graphics`] orchestrator. It owns the
//! root layer and is the factory for layers, images, gradients, and fonts.
//!
//! **[`layer`]**: struct-of-arrays layer tree with generational handles.
//! Local transform, alpha, visibility, and depth are set by the caller;
//! world transforms and effective alphas are computed by evaluation.
//!
//! **[`dirty`]**: dirty channels tracked with `understory_dirty`.
//!
//! **[`image`]** and **[`canvas`]**: CPU-side pixel storage and the
//! immediate-mode drawing surface that writes into it.
//!
//! **[`raster`]**: tiny-skia fills, strokes, blits and clip masks shared by
//! canvas drawing and software compositing.
//!
//! **[`text`]**: font resolution and deterministic text layout.
//!
//! **[`backend`]**: the [`DrawContext`](backend::DrawContext) trait and
//! opaque GL handles.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and event types for
//! frame instrumentation, with a zero-overhead [`Tracer`](trace::Tracer).
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   paint events.
//! - `skrifa` (disabled by default, implies `std`): `SkrifaFonts`, a
//!   [`FontResolver`](text::FontResolver) reading OpenType outlines and
//!   metrics through skrifa.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod canvas;
pub mod color;
pub mod config;
pub mod dirty;
pub mod error;
pub mod gradient;
pub mod graphics;
pub mod image;
pub mod layer;
pub mod raster;
pub mod text;
pub mod trace;
pub mod transform;

pub use color::Color;
pub use config::{ClipNesting, GraphicsConfig};
pub use error::GraphicsError;
pub use graphics::{Graphics, GraphicsEvent, GraphicsListener};
