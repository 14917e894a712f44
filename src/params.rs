//! Clustering parameters and per-run tuning.

use crate::error::{ClueError, Result};
use crate::executor::Launch;

/// Density and distance cut-offs for one clustering configuration.
///
/// `dm` and `seed_dc` default to `dc` when not set explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringParams {
    /// Density bandwidth: neighbours within `dc` contribute to `rho`.
    pub dc: f32,
    /// Minimum density for a seed.
    pub rhoc: f32,
    /// Search radius for the nearest denser neighbour.
    pub dm: f32,
    /// Minimum distance to the nearest denser neighbour for a seed.
    pub seed_dc: f32,
    /// Target point count per tile.
    pub points_per_tile: usize,
}

impl ClusteringParams {
    pub const DEFAULT_POINTS_PER_TILE: usize = 128;

    /// Parameters with `dm = seed_dc = dc` and the default tile occupancy.
    pub fn new(dc: f32, rhoc: f32) -> Result<Self> {
        let params = Self {
            dc,
            rhoc,
            dm: dc,
            seed_dc: dc,
            points_per_tile: Self::DEFAULT_POINTS_PER_TILE,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_dm(mut self, dm: f32) -> Result<Self> {
        self.dm = dm;
        self.validate()?;
        Ok(self)
    }

    pub fn with_seed_dc(mut self, seed_dc: f32) -> Result<Self> {
        self.seed_dc = seed_dc;
        self.validate()?;
        Ok(self)
    }

    pub fn with_points_per_tile(mut self, points_per_tile: usize) -> Result<Self> {
        self.points_per_tile = points_per_tile;
        self.validate()?;
        Ok(self)
    }

    /// Check every field; the first violation is reported.
    pub fn validate(&self) -> Result<()> {
        positive("dc", self.dc)?;
        if !(self.rhoc >= 0.0 && self.rhoc.is_finite()) {
            return Err(ClueError::InvalidParameter {
                name: "rhoc",
                value: self.rhoc as f64,
                reason: "must be finite and non-negative",
            });
        }
        positive("dm", self.dm)?;
        positive("seed_dc", self.seed_dc)?;
        if self.points_per_tile == 0 {
            return Err(ClueError::InvalidParameter {
                name: "points_per_tile",
                value: 0.0,
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ClueError::InvalidParameter {
            name,
            value: value as f64,
            reason: "must be finite and positive",
        })
    }
}

/// Capacity policy for the per-seed traversal stack in cluster assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StackLimit {
    /// The stack grows as needed.
    #[default]
    Unbounded,
    /// Fail with [`ClueError::TraversalStackOverflow`] past this many entries.
    Bounded(usize),
}

/// Tuning knobs that do not change the clustering result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Task-group size for every dispatch.
    pub block_size: usize,
    pub stack_limit: StackLimit,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            block_size: Launch::DEFAULT_BLOCK_SIZE,
            stack_limit: StackLimit::Unbounded,
        }
    }
}

impl RunOptions {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn with_stack_limit(mut self, stack_limit: StackLimit) -> Self {
        self.stack_limit = stack_limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_dc() {
        let p = ClusteringParams::new(1.5, 2.0).unwrap();
        assert_eq!(p.dm, 1.5);
        assert_eq!(p.seed_dc, 1.5);
        assert_eq!(p.points_per_tile, 128);
        let p = p.with_dm(3.0).unwrap().with_seed_dc(2.0).unwrap();
        assert_eq!((p.dc, p.dm, p.seed_dc), (1.5, 3.0, 2.0));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        for (dc, rhoc) in [(0.0, 1.0), (-1.0, 1.0), (f32::NAN, 1.0), (1.0, -0.5)] {
            assert!(
                ClusteringParams::new(dc, rhoc).is_err(),
                "dc={} rhoc={} accepted",
                dc,
                rhoc
            );
        }
        let p = ClusteringParams::new(1.0, 0.0).unwrap();
        assert!(matches!(
            p.with_dm(0.0),
            Err(ClueError::InvalidParameter { name: "dm", .. })
        ));
        assert!(matches!(
            p.with_seed_dc(-2.0),
            Err(ClueError::InvalidParameter { name: "seed_dc", .. })
        ));
        assert!(p.with_points_per_tile(0).is_err());
    }

    #[test]
    fn test_run_options() {
        let o = RunOptions::default();
        assert_eq!(o.block_size, 256);
        assert_eq!(o.stack_limit, StackLimit::Unbounded);
        let o = o.with_block_size(0).with_stack_limit(StackLimit::Bounded(8));
        assert_eq!(o.block_size, 1);
        assert_eq!(o.stack_limit, StackLimit::Bounded(8));
    }
}
