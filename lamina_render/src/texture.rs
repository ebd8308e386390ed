// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU texture mirroring of CPU-side images.
//!
//! Image pixels live on the CPU and are the source of truth. A
//! [`TextureCache`] keeps one backend texture per [`ImageId`] together with
//! the content version that was uploaded; when an image's version moves on,
//! the texture is updated in place. Losing the GPU context drops every entry
//! and the next [`prepare`](TextureCache::prepare) re-uploads from the
//! retained pixels.

use alloc::collections::BTreeMap;

use lamina_core::image::{Image, ImageId};

use crate::plan::RenderPlan;
use crate::resource::ResourceKey;

/// Backend operations the cache needs.
pub trait TextureBackend {
    /// Uploads `image` into a new texture.
    fn create_texture(&mut self, image: &Image) -> ResourceKey;

    /// Replaces the contents of an existing texture with `image`.
    fn update_texture(&mut self, key: ResourceKey, image: &Image);

    /// Frees a texture.
    fn destroy_texture(&mut self, key: ResourceKey);
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    key: ResourceKey,
    version: u64,
    last_used: u64,
}

/// Counts from one [`TextureCache::prepare`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrepareStats {
    /// Textures created.
    pub created: u32,
    /// Textures re-uploaded because the image changed.
    pub updated: u32,
    /// Image references served by an up-to-date texture.
    pub reused: u32,
}

/// Maps image identity to backend textures.
#[derive(Clone, Debug, Default)]
pub struct TextureCache {
    entries: BTreeMap<ImageId, Entry>,
    frame: u64,
}

impl TextureCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no textures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Texture currently mirroring `id`, if any.
    #[must_use]
    pub fn get(&self, id: ImageId) -> Option<ResourceKey> {
        self.entries.get(&id).map(|e| e.key)
    }

    /// Number of [`prepare`](Self::prepare) calls so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Makes sure every image `plan` references has an up-to-date texture.
    ///
    /// Advances the cache's frame counter; entries touched here count as
    /// used in this frame for [`evict_unused`](Self::evict_unused).
    pub fn prepare(&mut self, plan: &RenderPlan, backend: &mut dyn TextureBackend) -> PrepareStats {
        self.frame += 1;
        let mut stats = PrepareStats::default();
        for image in plan.images() {
            self.upload(image, backend, &mut stats);
        }
        stats
    }

    /// Makes sure `image` has an up-to-date texture and returns its key.
    pub fn texture_for(&mut self, image: &Image, backend: &mut dyn TextureBackend) -> ResourceKey {
        self.upload(image, backend, &mut PrepareStats::default())
    }

    fn upload(
        &mut self,
        image: &Image,
        backend: &mut dyn TextureBackend,
        stats: &mut PrepareStats,
    ) -> ResourceKey {
        let version = image.version();
        let frame = self.frame;
        match self.entries.get_mut(&image.id()) {
            Some(entry) => {
                if entry.version != version {
                    backend.update_texture(entry.key, image);
                    entry.version = version;
                    stats.updated += 1;
                } else {
                    stats.reused += 1;
                }
                entry.last_used = frame;
                entry.key
            }
            None => {
                let key = backend.create_texture(image);
                self.entries.insert(
                    image.id(),
                    Entry {
                        key,
                        version,
                        last_used: frame,
                    },
                );
                stats.created += 1;
                key
            }
        }
    }

    /// Destroys textures not used in the last `max_age` frames. Returns how
    /// many were destroyed.
    pub fn evict_unused(&mut self, max_age: u64, backend: &mut dyn TextureBackend) -> usize {
        let frame = self.frame;
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            let keep = frame.saturating_sub(entry.last_used) <= max_age;
            if !keep {
                backend.destroy_texture(entry.key);
            }
            keep
        });
        before - self.entries.len()
    }

    /// Forgets every texture without calling the backend, whose resources
    /// are already gone.
    pub fn context_lost(&mut self) {
        if !self.entries.is_empty() {
            log::warn!(
                "dropping {} textures after context loss",
                self.entries.len()
            );
        }
        self.entries.clear();
    }

    /// Destroys every texture.
    pub fn clear(&mut self, backend: &mut dyn TextureBackend) {
        for entry in self.entries.values() {
            backend.destroy_texture(entry.key);
        }
        self.entries.clear();
    }
}
