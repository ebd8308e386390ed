// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in a retained compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//!   Parent links are plain indices and never own anything.
//! - A variant ([`LayerKind`]): group (optionally clipped), image, immediate
//!   (optionally clipped), or surface.
//! - **Local properties** set by the caller:
//!   [`transform`](LayerStore::set_transform),
//!   [`alpha`](LayerStore::set_alpha), [`visible`](LayerStore::set_visible),
//!   and [`depth`](LayerStore::set_depth).
//! - **Computed properties** produced by [`evaluate`](LayerStore::evaluate):
//!   `world_transform` (product of ancestor local transforms),
//!   `effective_alpha` (product of ancestor alphas), and `effective_hidden`.
//!
//! Layers are stored in struct-of-arrays layout with index-based handles.
//! [`Graphics::paint`](crate::Graphics::paint) composites the tree into a
//! [`DrawContext`](crate::backend::DrawContext).
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)):
//!
//! - **TRANSFORM** / **ALPHA**: propagate to all descendants. Visibility
//!   rides on TRANSFORM.
//! - **CONTENT**: local-only; image, renderer, and surface changes.
//! - **TOPOLOGY**: attach, detach, reorder, create, destroy.

mod evaluate;
mod id;
mod kind;
mod paint;
mod store;
mod traverse;

pub use evaluate::FrameChanges;
pub use id::{INVALID, LayerId};
pub use kind::{ImmediateRenderer, LayerKind, LayerKindTag};
pub use store::LayerStore;
pub use traverse::{Ancestors, Children};
