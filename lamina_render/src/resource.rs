// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque resource keys for backend-managed textures.

use core::fmt;

/// An opaque handle to a backend texture.
///
/// Keys are minted by a [`TextureBackend`](crate::TextureBackend) and stored
/// by the [`TextureCache`](crate::TextureCache) without interpretation. A key
/// is meaningless once the GPU context that produced it is lost.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}
