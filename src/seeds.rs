//! Seed registry: a bounded, append-only list of seed point indices.
//!
//! Capacity is fixed before seed finding starts; tasks then append
//! concurrently through a [`SeedPusher`]. A seed's position in the registry
//! is its cluster id.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::error::{ClueError, Result};
use crate::executor::atomic::as_atomic_u32;

#[derive(Debug, Clone, Default)]
pub struct SeedRegistry {
    slots: Vec<u32>,
    len: usize,
    capacity: usize,
}

/// Concurrent append handle over a registry's slots.
pub struct SeedPusher<'a> {
    slots: &'a [AtomicU32],
    count: AtomicUsize,
}

impl SeedPusher<'_> {
    /// Append `point`. Fails once the registry is full; the count keeps
    /// advancing so the overflow is also reported when collection ends.
    #[inline]
    pub fn push(&self, point: u32) -> Result<()> {
        let slot = self.count.fetch_add(1, Ordering::Relaxed);
        match self.slots.get(slot) {
            Some(cell) => {
                cell.store(point, Ordering::Relaxed);
                Ok(())
            }
            None => Err(ClueError::SeedRegistryOverflow {
                capacity: self.slots.len(),
            }),
        }
    }
}

impl SeedRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut registry = Self::default();
        registry.reset(capacity);
        registry
    }

    /// Empty the registry and bound it to `capacity` seeds, growing storage if needed.
    pub fn reset(&mut self, capacity: usize) {
        if self.slots.len() < capacity {
            self.slots.resize(capacity, 0);
        }
        self.capacity = capacity;
        self.len = 0;
    }

    /// Replace the contents with whatever `f` pushes.
    ///
    /// `f` runs with a pusher bounded by the current capacity; on return the
    /// registry holds every accepted seed. Overflow is an error even if `f`
    /// swallowed it.
    pub fn collect<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&SeedPusher<'_>) -> Result<()>,
    {
        let capacity = self.capacity;
        let pusher = SeedPusher {
            slots: as_atomic_u32(&mut self.slots[..capacity]),
            count: AtomicUsize::new(0),
        };
        let result = f(&pusher);
        let count = pusher.count.into_inner();
        self.len = count.min(capacity);
        result?;
        if count > capacity {
            return Err(ClueError::SeedRegistryOverflow { capacity });
        }
        Ok(())
    }

    /// Order seeds by point index.
    pub fn sort(&mut self) {
        self.slots[..self.len].sort_unstable();
    }

    /// Number of seeds.
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.slots[..self.len]
    }

    /// Point index of the seed with cluster id `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<u32> {
        self.as_slice().get(slot).copied()
    }
}
