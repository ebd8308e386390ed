// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans, software compositing, and texture caching for lamina.
//!
//! This crate provides the [`DrawContext`](lamina_core::backend::DrawContext)
//! implementations that sit between [`lamina_core`]'s layer tree and a
//! concrete backend:
//!
//! - [`RenderPlan`]: records every primitive of a frame as a [`RenderItem`]
//!   for GPU backends to translate or for tests to inspect.
//! - [`SoftwareRenderer`]: composites straight into a CPU framebuffer.
//! - [`TextureCache`]: mirrors the images a plan references into backend
//!   textures, re-uploading when an image's content version changes.
//! - [`ResourceKey`]: opaque handle for backend-managed resources.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod plan;
mod resource;
mod software;
mod texture;

pub use plan::{DrawOp, RenderItem, RenderPlan};
pub use resource::ResourceKey;
pub use software::SoftwareRenderer;
pub use texture::{PrepareStats, TextureBackend, TextureCache};
