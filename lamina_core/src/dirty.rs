// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Lamina uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! propagate invalidation through the layer tree. Each channel represents an
//! independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`] and [`ALPHA`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. Marking a parent dirty marks all
//!   descendants, because world transforms, effective alpha, and effective
//!   visibility are inherited. Visibility changes are routed through
//!   [`TRANSFORM`] so one drain pass recomputes both.
//!
//! - **Local-only**: [`CONTENT`] is marked with the default policy when a
//!   layer's image, renderer, or depth-sorted position changes.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on attach, detach, create and
//!   destroy.
//!
//! Callers never query dirty state directly. Each
//! [`LayerStore::evaluate`](crate::layer::LayerStore::evaluate) call drains
//! all channels and reports them as
//! [`FrameChanges`](crate::layer::FrameChanges).

use understory_dirty::Channel;

/// Transform or visibility changed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Alpha changed.
pub const ALPHA: Channel = Channel::new(1);

/// Retained content changed.
pub const CONTENT: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
