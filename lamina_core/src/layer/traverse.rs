// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sibling and ancestor iteration.

use super::id::LayerId;
use super::store::LayerStore;

/// An iterator over the direct children of a layer, in paint order.
///
/// Created by [`LayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a LayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a LayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        let id = self.store.handle(self.current)?;
        self.current = self.store.next_sibling[id.idx as usize];
        Some(id)
    }
}

/// An iterator from a layer's parent up to its root.
///
/// Created by [`LayerStore::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    store: &'a LayerStore,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(store: &'a LayerStore, parent: u32) -> Self {
        Self {
            store,
            current: parent,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        let id = self.store.handle(self.current)?;
        self.current = self.store.parent[id.idx as usize];
        Some(id)
    }
}
