// SPDX-FileCopyrightText: 2025 rupica contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Address-range-keyed cache of GPU-side resources.
//!
//! Backends keep one cache per resource class (colour targets,
//! depth/stencil targets, textures), all with the same semantics:
//! exact-key lookup, address-range lookup for operations that only
//! know an address, FIFO eviction at capacity, and full reset on
//! context teardown.

use std::collections::VecDeque;

/// A cacheable GPU-side resource.
pub trait CachedSurface {
    /// Guest base address of the resource.
    fn location(&self) -> u32;

    /// Size of the resource's address range in bytes.
    fn size_bytes(&self) -> u32;

    /// Exact descriptor match: address, format, width, height.
    fn matches(&self, other: &Self) -> bool;

    /// Release the backend-native resource. Called on eviction and
    /// cache reset.
    fn release(&mut self) {}
}

/// Fixed-capacity surface cache. Insertion order is eviction order.
pub struct SurfaceCache<S: CachedSurface, const CAPACITY: usize> {
    entries: VecDeque<S>,
}

impl<S: CachedSurface, const CAPACITY: usize> SurfaceCache<S, CAPACITY> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(CAPACITY),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry exactly matching `probe`'s descriptor.
    pub fn find(&self, probe: &S) -> Option<&S> {
        self.entries.iter().find(|e| e.matches(probe))
    }

    /// Find an entry whose address range `[location, location+size)`
    /// contains `addr`, regardless of the other descriptor fields.
    pub fn find_from_address(&self, addr: u32) -> Option<&S> {
        self.entries
            .iter()
            .find(|e| Self::contains(e, addr))
    }

    /// Mutable variant of [`find_from_address`](Self::find_from_address).
    pub fn find_from_address_mut(&mut self, addr: u32) -> Option<&mut S> {
        self.entries
            .iter_mut()
            .find(|e| Self::contains(e, addr))
    }

    /// Insert a new resource, evicting the oldest entry first if the
    /// cache is at capacity. Returns the inserted entry.
    pub fn add(&mut self, surface: S) -> &mut S {
        if self.entries.len() >= CAPACITY {
            if let Some(mut evicted) = self.entries.pop_front() {
                log::debug!(
                    "surface cache: evicting surface at 0x{:08X}",
                    evicted.location()
                );
                evicted.release();
            }
        }
        self.entries.push_back(surface);
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Release every entry; subsequent lookups miss.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.release();
        }
        self.entries.clear();
    }

    fn contains(entry: &S, addr: u32) -> bool {
        let base = entry.location();
        addr.wrapping_sub(base) < entry.size_bytes()
    }
}

impl<S: CachedSurface, const CAPACITY: usize> Default for SurfaceCache<S, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
