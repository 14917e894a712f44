//! Search-box queries over the tile grid.

use super::{TileGrid, Tiles};
use crate::association::AssociationMap;

/// Inclusive per-axis tile range around a query point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBox<const N: usize> {
    lo: [usize; N],
    hi: [usize; N],
    n_per_dim: usize,
}

impl<const N: usize> SearchBox<N> {
    /// Per-axis `(first, last)` tile, both inclusive.
    pub fn ranges(&self) -> [(usize, usize); N] {
        std::array::from_fn(|d| (self.lo[d], self.hi[d]))
    }

    /// Number of tiles covered.
    pub fn num_tiles(&self) -> usize {
        self.lo
            .iter()
            .zip(&self.hi)
            .map(|(lo, hi)| hi - lo + 1)
            .product()
    }

    /// Whether the tile with per-axis coordinates `bins` lies inside.
    pub fn contains(&self, bins: &[usize; N]) -> bool {
        (0..N).all(|d| self.lo[d] <= bins[d] && bins[d] <= self.hi[d])
    }

    /// Global ids of the covered tiles, lexicographic over tile coordinates.
    pub fn iter(&self) -> SearchBoxIter<N> {
        SearchBoxIter {
            bx: *self,
            cur: self.lo,
            done: N == 0,
        }
    }
}

impl<'a, const N: usize> IntoIterator for &'a SearchBox<N> {
    type Item = usize;
    type IntoIter = SearchBoxIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the global tile ids of a [`SearchBox`].
#[derive(Debug, Clone)]
pub struct SearchBoxIter<const N: usize> {
    bx: SearchBox<N>,
    cur: [usize; N],
    done: bool,
}

impl<const N: usize> Iterator for SearchBoxIter<N> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let n = self.bx.n_per_dim;
        let global = self.cur.iter().fold(0usize, |acc, &b| acc * n + b);

        // Odometer step: last axis varies fastest.
        self.done = true;
        for d in (0..N).rev() {
            if self.cur[d] < self.bx.hi[d] {
                self.cur[d] += 1;
                self.done = false;
                break;
            }
            self.cur[d] = self.bx.lo[d];
        }
        Some(global)
    }
}

impl<const N: usize> TileGrid<N> {
    /// Tiles that may hold a point within `radius` of `coords`.
    ///
    /// On a wrapped axis whose query interval reaches `min` or `max`, the box
    /// spans the whole axis.
    pub fn search_box(&self, coords: &[f32; N], radius: f32) -> SearchBox<N> {
        let last = self.n_per_dim - 1;
        let mut lo = [0usize; N];
        let mut hi = [last; N];
        for d in 0..N {
            let a = coords[d] - radius;
            let b = coords[d] + radius;
            if self.wrapped[d] && (a <= self.min[d] || b >= self.max[d]) {
                continue;
            }
            lo[d] = self.axis_bin(a, d);
            hi[d] = self.axis_bin(b, d);
        }
        SearchBox {
            lo,
            hi,
            n_per_dim: self.n_per_dim,
        }
    }
}

impl<const N: usize> Tiles<N> {
    #[inline]
    pub fn grid(&self) -> &TileGrid<N> {
        &self.grid
    }

    /// Underlying tile → points index.
    #[inline]
    pub fn assoc(&self) -> &AssociationMap {
        &self.assoc
    }

    #[inline]
    pub fn n_tiles(&self) -> usize {
        self.assoc.size()
    }

    #[inline]
    pub fn n_per_dim(&self) -> usize {
        self.grid.n_per_dim()
    }

    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Points in tile `id`.
    #[inline]
    pub fn tile(&self, id: usize) -> &[u32] {
        self.assoc.bin(id)
    }

    /// Global tile id of a coordinate.
    #[inline]
    pub fn global_bin(&self, coords: &[f32; N]) -> usize {
        self.grid.global_bin(coords)
    }

    #[inline]
    pub fn search_box(&self, coords: &[f32; N], radius: f32) -> SearchBox<N> {
        self.grid.search_box(coords, radius)
    }

    /// Every point stored in the tiles of `bx`, tile by tile.
    pub fn candidates<'a>(&'a self, bx: &SearchBox<N>) -> impl Iterator<Item = usize> + 'a {
        bx.iter()
            .flat_map(move |t| self.tile(t).iter().map(|&j| j as usize))
    }
}
