//! Compressed-sparse-row multi-map from small integer keys to element indices.
//!
//! Layout: `offsets` has `bins + 1` entries and `indexes[offsets[k]..offsets[k + 1]]`
//! holds every element whose key is `k`. Elements whose key is [`NO_KEY`] are
//! left out, so `offsets[bins]` counts only elements with a valid key.
//!
//! A build always runs four passes in order, each a full dispatch:
//! key assignment, per-bin histogram, inclusive scan, atomic scatter.

use std::ops::Range;
use std::sync::atomic::Ordering;

use crate::error::{ClueError, Result};
use crate::executor::atomic::as_atomic_u32;
use crate::executor::{Executor, Launch};

/// Key of an element that belongs to no bin.
pub const NO_KEY: i32 = -1;

/// Logical sizes of an [`AssociationMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extents {
    /// Number of bins (distinct keys).
    pub keys: usize,
    /// Number of elements the map was built over.
    pub values: usize,
}

#[derive(Debug, Clone)]
pub struct AssociationMap {
    /// Start of each bin in `indexes`, plus final length. Length >= `bins + 1`.
    offsets: Vec<u32>,
    /// Element indices grouped by bin. Length >= `elements`.
    indexes: Vec<u32>,
    /// Key of each element from the last build. Length >= `elements`.
    keys: Vec<i32>,
    /// Per-bin scatter cursors (scratch).
    cursors: Vec<u32>,
    bins: usize,
    elements: usize,
}

impl Default for AssociationMap {
    /// An empty map with no bins. It can be queried but not filled.
    fn default() -> Self {
        Self {
            offsets: vec![0],
            indexes: Vec::new(),
            keys: Vec::new(),
            cursors: Vec::new(),
            bins: 0,
            elements: 0,
        }
    }
}

impl AssociationMap {
    /// Allocate a map for `elements` elements over `bins` bins.
    pub fn new(elements: usize, bins: usize) -> Result<Self> {
        check_extents(elements, bins)?;
        Ok(Self {
            offsets: vec![0; bins + 1],
            indexes: vec![0; elements],
            keys: vec![NO_KEY; elements],
            cursors: vec![0; bins],
            bins,
            elements,
        })
    }

    /// Build a map from a precomputed key per element.
    pub fn from_keys<E: Executor>(exec: &E, keys: &[i32], bins: usize) -> Result<Self> {
        let mut map = Self::new(keys.len(), bins)?;
        map.fill_from_keys(exec, Launch::DEFAULT_BLOCK_SIZE, keys)?;
        Ok(map)
    }

    /// Allocated extents (may exceed the logical ones after a shrinking reset).
    pub fn capacity(&self) -> Extents {
        Extents {
            keys: self.offsets.len() - 1,
            values: self.indexes.len(),
        }
    }

    /// Whether the current buffers can hold `elements` over `bins` without growing.
    pub fn fits(&self, elements: usize, bins: usize) -> bool {
        let cap = self.capacity();
        cap.values >= elements && cap.keys >= bins
    }

    /// Re-target the map to new extents, growing buffers only when needed.
    ///
    /// Contents are cleared: every bin is empty afterwards.
    pub fn reset(&mut self, elements: usize, bins: usize) -> Result<()> {
        check_extents(elements, bins)?;
        if self.offsets.len() < bins + 1 {
            self.offsets.resize(bins + 1, 0);
        }
        if self.cursors.len() < bins {
            self.cursors.resize(bins, 0);
        }
        if self.indexes.len() < elements {
            self.indexes.resize(elements, 0);
            self.keys.resize(elements, NO_KEY);
        }
        self.offsets[..=bins].fill(0);
        self.bins = bins;
        self.elements = elements;
        Ok(())
    }

    /// Rebuild from a key-assignment function evaluated for each of `elements` elements.
    pub fn fill_with<E, F>(
        &mut self,
        exec: &E,
        block_size: usize,
        elements: usize,
        key_of: F,
    ) -> Result<()>
    where
        E: Executor,
        F: Fn(usize) -> i32 + Send + Sync,
    {
        self.reset(elements, self.bins)?;
        exec.for_each_mut(
            Launch::new(elements, block_size),
            &mut self.keys[..elements],
            |i, k| *k = key_of(i),
        );
        self.build(exec, block_size)
    }

    /// Rebuild from a precomputed key per element. The element count becomes `keys.len()`.
    pub fn fill_from_keys<E: Executor>(
        &mut self,
        exec: &E,
        block_size: usize,
        keys: &[i32],
    ) -> Result<()> {
        self.reset(keys.len(), self.bins)?;
        exec.for_each_mut(
            Launch::new(keys.len(), block_size),
            &mut self.keys[..keys.len()],
            |i, k| *k = keys[i],
        );
        self.build(exec, block_size)
    }

    fn build<E: Executor>(&mut self, exec: &E, block_size: usize) -> Result<()> {
        let bins = self.bins;
        let n = self.elements;
        let launch = Launch::new(n, block_size);
        let Self {
            offsets,
            indexes,
            keys,
            cursors,
            ..
        } = self;
        let keys = &keys[..n];

        // Reject keys outside [0, bins) before touching any counter.
        exec.try_for_each(launch, |i| {
            let k = keys[i];
            if k == NO_KEY || (k >= 0 && (k as usize) < bins) {
                Ok(())
            } else {
                Err(ClueError::KeyOutOfRange {
                    key: k as i64,
                    bins,
                })
            }
        })?;

        // Histogram into offsets[1..=bins].
        offsets[..=bins].fill(0);
        {
            let counts = as_atomic_u32(&mut offsets[1..=bins]);
            exec.for_each(launch, |i| {
                let k = keys[i];
                if k != NO_KEY {
                    counts[k as usize].fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        exec.inclusive_scan(&mut offsets[1..=bins]);

        // Scatter with per-bin cursors starting at each bin's offset.
        cursors[..bins].copy_from_slice(&offsets[..bins]);
        {
            let cursors = as_atomic_u32(&mut cursors[..bins]);
            let slots = as_atomic_u32(&mut indexes[..n]);
            exec.for_each(launch, |i| {
                let k = keys[i];
                if k != NO_KEY {
                    let slot = cursors[k as usize].fetch_add(1, Ordering::Relaxed);
                    slots[slot as usize].store(i as u32, Ordering::Relaxed);
                }
            });
        }
        exec.wait();
        Ok(())
    }

    /// Number of bins.
    #[inline]
    pub fn size(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn extents(&self) -> Extents {
        Extents {
            keys: self.bins,
            values: self.elements,
        }
    }

    /// Number of associated elements (those with a valid key).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets[self.bins] as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements of bin `key`.
    ///
    /// # Panics
    /// If `key >= self.size()`.
    #[inline]
    pub fn bin(&self, key: usize) -> &[u32] {
        assert!(key < self.bins, "bin {} out of range ({} bins)", key, self.bins);
        let start = self.offsets[key] as usize;
        let end = self.offsets[key + 1] as usize;
        &self.indexes[start..end]
    }

    /// Elements of bin `key`, failing on out-of-range keys.
    pub fn get(&self, key: i32) -> Result<&[u32]> {
        let range = self.equal_range(key)?;
        Ok(&self.indexes[range])
    }

    pub fn count(&self, key: i32) -> Result<usize> {
        Ok(self.equal_range(key)?.len())
    }

    pub fn contains(&self, key: i32) -> Result<bool> {
        Ok(!self.equal_range(key)?.is_empty())
    }

    /// Position in [`indexes`](Self::indexes) of the first element with `key`.
    pub fn lower_bound(&self, key: i32) -> Result<usize> {
        let k = self.check_key(key)?;
        Ok(self.offsets[k] as usize)
    }

    /// Position in [`indexes`](Self::indexes) one past the last element with `key`.
    pub fn upper_bound(&self, key: i32) -> Result<usize> {
        let k = self.check_key(key)?;
        Ok(self.offsets[k + 1] as usize)
    }

    pub fn equal_range(&self, key: i32) -> Result<Range<usize>> {
        let k = self.check_key(key)?;
        Ok(self.offsets[k] as usize..self.offsets[k + 1] as usize)
    }

    /// Flat element buffer, grouped by bin.
    #[inline]
    pub fn indexes(&self) -> &[u32] {
        &self.indexes[..self.len()]
    }

    /// Bin offsets (`size() + 1` entries).
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets[..=self.bins]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u32> {
        self.indexes().iter()
    }

    /// Iterate `(key, elements)` over all bins, empty ones included.
    pub fn iter_bins(&self) -> impl Iterator<Item = (usize, &[u32])> + '_ {
        (0..self.bins).map(move |k| (k, self.bin(k)))
    }

    /// Verify the CSR invariants against the keys of the last build.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let offsets = self.offsets();
        if offsets[0] != 0 {
            return Err(format!("offsets[0] = {}", offsets[0]));
        }
        if let Some(k) = offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(format!("offsets decrease at bin {}", k));
        }
        let keys = &self.keys[..self.elements];
        let valid = keys.iter().filter(|&&k| k != NO_KEY).count();
        if self.len() != valid {
            return Err(format!(
                "offsets[bins] = {} but {} elements have a valid key",
                self.len(),
                valid
            ));
        }
        for (k, members) in self.iter_bins() {
            if let Some(&i) = members.iter().find(|&&i| keys[i as usize] != k as i32) {
                return Err(format!(
                    "element {} stored in bin {} but has key {}",
                    i, k, keys[i as usize]
                ));
            }
        }
        Ok(())
    }

    #[inline]
    fn check_key(&self, key: i32) -> Result<usize> {
        if key >= 0 && (key as usize) < self.bins {
            Ok(key as usize)
        } else {
            Err(ClueError::KeyOutOfRange {
                key: key as i64,
                bins: self.bins,
            })
        }
    }
}

fn check_extents(elements: usize, bins: usize) -> Result<()> {
    if elements == 0 {
        return Err(ClueError::InvalidArgument(
            "associative index needs at least one element".into(),
        ));
    }
    if bins == 0 {
        return Err(ClueError::InvalidArgument(
            "associative index needs at least one bin".into(),
        ));
    }
    Ok(())
}
