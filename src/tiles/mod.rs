//! Regular N-dimensional tile grid for bounded neighbour search.
//!
//! The bounding box of the points is cut into `n_per_dim` tiles along every
//! axis. Each point lands in exactly one tile; tiles are numbered row-major
//! with dimension 0 most significant. The point lists per tile live in an
//! [`AssociationMap`] keyed by that global tile id.
//!
//! A neighbourhood query (`search_box`) turns a coordinate and a radius into
//! an inclusive tile range per axis. Axes marked as wrapped treat the two
//! boundary tiles as adjacent: a query that crosses the boundary scans the
//! full range of that axis.

mod build;
mod query;

pub use query::{SearchBox, SearchBoxIter};

use crate::association::AssociationMap;

/// Tile geometry: where each tile starts and how wide it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid<const N: usize> {
    min: [f32; N],
    max: [f32; N],
    tile_sizes: [f32; N],
    wrapped: [bool; N],
    n_per_dim: usize,
}

impl<const N: usize> TileGrid<N> {
    /// Grid over the box `[min, max]` with `n_per_dim` tiles per axis.
    pub fn new(min: [f32; N], max: [f32; N], n_per_dim: usize, wrapped: [bool; N]) -> Self {
        let n_per_dim = n_per_dim.max(1);
        let tile_sizes = std::array::from_fn(|d| (max[d] - min[d]) / n_per_dim as f32);
        Self {
            min,
            max,
            tile_sizes,
            wrapped,
            n_per_dim,
        }
    }

    #[inline]
    pub fn n_per_dim(&self) -> usize {
        self.n_per_dim
    }

    /// Total number of tiles (`n_per_dim^N`).
    #[inline]
    pub fn n_tiles(&self) -> usize {
        self.n_per_dim.saturating_pow(N as u32)
    }

    #[inline]
    pub fn tile_sizes(&self) -> &[f32; N] {
        &self.tile_sizes
    }

    /// Per-axis `(min, max)` of the box the grid covers.
    pub fn extremes(&self) -> [(f32, f32); N] {
        std::array::from_fn(|d| (self.min[d], self.max[d]))
    }

    #[inline]
    pub fn wrapped(&self) -> &[bool; N] {
        &self.wrapped
    }

    /// Tile index along axis `dim`, clamped to the grid.
    ///
    /// A degenerate axis (zero width) or a NaN coordinate maps to tile 0.
    #[inline]
    pub fn axis_bin(&self, coord: f32, dim: usize) -> usize {
        let size = self.tile_sizes[dim];
        if !(size > 0.0) {
            return 0;
        }
        let bin = ((coord - self.min[dim]) / size).floor();
        // `as` saturates; NaN becomes 0.
        (bin as isize).clamp(0, self.n_per_dim as isize - 1) as usize
    }

    /// Per-axis tile coordinates of a point.
    #[inline]
    pub fn bin_coords(&self, coords: &[f32; N]) -> [usize; N] {
        std::array::from_fn(|d| self.axis_bin(coords[d], d))
    }

    /// Global tile id from per-axis tile coordinates.
    #[inline]
    pub fn global_bin_by_bin(&self, bins: &[usize; N]) -> usize {
        bins.iter()
            .fold(0usize, |acc, &b| acc * self.n_per_dim + b)
    }

    /// Global tile id of a point.
    #[inline]
    pub fn global_bin(&self, coords: &[f32; N]) -> usize {
        self.global_bin_by_bin(&self.bin_coords(coords))
    }

    /// Inverse of [`global_bin_by_bin`](Self::global_bin_by_bin).
    pub fn unflatten(&self, mut global: usize) -> [usize; N] {
        let mut bins = [0usize; N];
        for d in (0..N).rev() {
            bins[d] = global % self.n_per_dim;
            global /= self.n_per_dim;
        }
        bins
    }
}

/// Tile count and tiles-per-axis for `n_points` at `points_per_tile`.
///
/// Returns the smallest `k` with `k^N >= ceil(n_points / points_per_tile)`,
/// together with `k^N`.
pub fn tile_layout<const N: usize>(n_points: usize, points_per_tile: usize) -> (usize, usize) {
    let wanted = n_points.div_ceil(points_per_tile.max(1)).max(1);
    let pow = |k: usize| k.saturating_pow(N as u32);

    let mut k = ((wanted as f64).powf(1.0 / N as f64).round() as usize).max(1);
    while pow(k) < wanted {
        k += 1;
    }
    while k > 1 && pow(k - 1) >= wanted {
        k -= 1;
    }
    (pow(k), k)
}

/// Spatial tile index over a point store.
#[derive(Debug, Clone)]
pub struct Tiles<const N: usize> {
    assoc: AssociationMap,
    grid: TileGrid<N>,
    n_points: usize,
}
