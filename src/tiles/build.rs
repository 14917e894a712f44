//! Tile index construction and reuse.

use tracing::trace;

use super::{tile_layout, TileGrid, Tiles};
use crate::association::AssociationMap;
use crate::error::{ClueError, Result};
use crate::executor::Executor;
use crate::points::PointsDevice;

impl<const N: usize> Tiles<N> {
    /// Allocate an index for `n_points` points at roughly `points_per_tile` per tile.
    ///
    /// The grid geometry is unset until [`fill`](Self::fill) runs.
    pub fn new(n_points: usize, points_per_tile: usize) -> Result<Self> {
        let (n_tiles, n_per_dim) = tile_layout::<N>(n_points, points_per_tile);
        Ok(Self {
            assoc: AssociationMap::new(n_points, n_tiles)?,
            grid: TileGrid::new([0.0; N], [0.0; N], n_per_dim, [false; N]),
            n_points,
        })
    }

    /// Re-target to `n_points` points, reallocating only if the layout no longer fits.
    pub fn reset(&mut self, n_points: usize, points_per_tile: usize) -> Result<()> {
        let (n_tiles, n_per_dim) = tile_layout::<N>(n_points, points_per_tile);
        if !self.assoc.fits(n_points, n_tiles) {
            trace!(n_points, n_tiles, "growing tile index");
        }
        self.assoc.reset(n_points, n_tiles)?;
        self.grid = TileGrid::new([0.0; N], [0.0; N], n_per_dim, self.grid.wrapped);
        self.n_points = n_points;
        Ok(())
    }

    /// Whether the current buffers hold a layout for `n_points` without growing.
    pub fn fits(&self, n_points: usize, points_per_tile: usize) -> bool {
        let (n_tiles, _) = tile_layout::<N>(n_points, points_per_tile);
        self.assoc.fits(n_points, n_tiles)
    }

    /// Bin every point of `points` into its tile.
    ///
    /// Computes the bounding box with a reduction per coordinate column, then
    /// rebuilds the point lists. `wrapped` marks periodic axes.
    pub fn fill<E: Executor>(
        &mut self,
        exec: &E,
        block_size: usize,
        points: &PointsDevice<N>,
        wrapped: [bool; N],
    ) -> Result<()> {
        if points.size() != self.n_points {
            return Err(ClueError::SizeMismatch {
                what: "tile index points",
                expected: self.n_points,
                found: points.size(),
            });
        }

        let mut min = [0.0f32; N];
        let mut max = [0.0f32; N];
        for dim in 0..N {
            let (lo, hi) = exec.min_max(points.coords(dim)?).ok_or_else(|| {
                ClueError::InvalidArgument(format!(
                    "coordinate column {} has no numeric value",
                    dim
                ))
            })?;
            min[dim] = lo;
            max[dim] = hi;
        }

        let grid = TileGrid::new(min, max, self.grid.n_per_dim(), wrapped);
        self.grid = grid;
        trace!(n_per_dim = grid.n_per_dim(), ?min, ?max, "tile grid");

        let cols = &points.cols.coords;
        self.assoc
            .fill_with(exec, block_size, self.n_points, |i| {
                let p: [f32; N] = std::array::from_fn(|d| cols[d][i]);
                grid.global_bin(&p) as i32
            })
    }
}
