//! Follower graph: for each point, the points whose nearest-higher link names it.
//!
//! Stored as an [`AssociationMap`] with one bin per point, keyed by the
//! `nearest_higher` column. Points without a link ([`NONE`](crate::points::NONE))
//! follow nobody and are left out.

use crate::association::{AssociationMap, Extents};
use crate::error::{ClueError, Result};
use crate::executor::Executor;

#[derive(Debug, Clone)]
pub struct Followers {
    map: AssociationMap,
}

impl Followers {
    /// Storage for a graph over `n_points` points.
    pub fn new(n_points: usize) -> Result<Self> {
        Ok(Self {
            map: AssociationMap::new(n_points, n_points)?,
        })
    }

    /// Re-target to `n_points` points, growing storage only when it does not fit.
    pub fn ensure_capacity(&mut self, n_points: usize) -> Result<()> {
        self.map.reset(n_points, n_points)
    }

    /// Rebuild from a nearest-higher column; its length must match the current size.
    pub fn fill<E: Executor>(
        &mut self,
        exec: &E,
        block_size: usize,
        nearest_higher: &[i32],
    ) -> Result<()> {
        if nearest_higher.len() != self.map.size() {
            return Err(ClueError::SizeMismatch {
                what: "nearest-higher column",
                expected: self.map.size(),
                found: nearest_higher.len(),
            });
        }
        self.map.fill_from_keys(exec, block_size, nearest_higher)
    }

    /// Points whose nearest higher is `point`.
    #[inline]
    pub fn followers_of(&self, point: usize) -> &[u32] {
        self.map.bin(point)
    }

    #[inline]
    pub fn extents(&self) -> Extents {
        self.map.extents()
    }

    /// Number of follower links (non-root points).
    #[inline]
    pub fn num_links(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn as_map(&self) -> &AssociationMap {
        &self.map
    }
}
