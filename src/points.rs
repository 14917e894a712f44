//! Structure-of-arrays point stores.
//!
//! [`PointsHost`] is the caller-facing store; [`PointsDevice`] is the store the
//! pipeline kernels read and write. Both own one typed buffer per column and
//! are synchronised only through [`copy_to_device`] and [`copy_to_host`].

use std::sync::OnceLock;

use crate::error::{ClueError, Result};

/// `nearest_higher` value of a point with no denser neighbour in range.
pub const NONE: i32 = -1;
/// `cluster_index` value of a point that belongs to no cluster.
pub const UNASSIGNED: i32 = -1;

/// Column buffers shared by both store variants.
#[derive(Debug, Clone)]
pub(crate) struct Columns<const N: usize> {
    pub coords: [Vec<f32>; N],
    pub weight: Vec<f32>,
    pub rho: Vec<f32>,
    pub nearest_higher: Vec<i32>,
    pub is_seed: Vec<bool>,
    pub cluster_index: Vec<i32>,
    pub clustered: bool,
}

impl<const N: usize> Columns<N> {
    fn zeroed(n: usize) -> Self {
        Self {
            coords: std::array::from_fn(|_| vec![0.0; n]),
            weight: vec![0.0; n],
            rho: vec![0.0; n],
            nearest_higher: vec![NONE; n],
            is_seed: vec![false; n],
            cluster_index: vec![UNASSIGNED; n],
            clustered: false,
        }
    }

    fn from_inputs(coords: [Vec<f32>; N], weight: Vec<f32>) -> Result<Self> {
        if N == 0 {
            return Err(ClueError::InvalidArgument(
                "points need at least one dimension".into(),
            ));
        }
        let n = weight.len();
        for column in &coords {
            if column.len() != n {
                return Err(ClueError::SizeMismatch {
                    what: "coordinate column",
                    expected: n,
                    found: column.len(),
                });
            }
        }
        Ok(Self {
            coords,
            weight,
            rho: vec![0.0; n],
            nearest_higher: vec![NONE; n],
            is_seed: vec![false; n],
            cluster_index: vec![UNASSIGNED; n],
            clustered: false,
        })
    }

    fn resize(&mut self, n: usize) {
        for column in &mut self.coords {
            column.resize(n, 0.0);
        }
        self.weight.resize(n, 0.0);
        self.rho.resize(n, 0.0);
        self.nearest_higher.resize(n, NONE);
        self.is_seed.resize(n, false);
        self.cluster_index.resize(n, UNASSIGNED);
        self.clustered = false;
    }

    #[inline]
    fn len(&self) -> usize {
        self.weight.len()
    }
}

/// Read accessors common to both stores.
macro_rules! impl_point_accessors {
    ($store:ident) => {
        impl<const N: usize> $store<N> {
            /// Number of points.
            #[inline]
            pub fn size(&self) -> usize {
                self.cols.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.cols.len() == 0
            }

            /// Coordinate column for dimension `dim`.
            pub fn coords(&self, dim: usize) -> Result<&[f32]> {
                self.cols
                    .coords
                    .get(dim)
                    .map(Vec::as_slice)
                    .ok_or(ClueError::DimensionOutOfRange { dim, ndim: N })
            }

            /// Coordinates of point `i` gathered across columns.
            #[inline]
            pub fn point(&self, i: usize) -> [f32; N] {
                std::array::from_fn(|d| self.cols.coords[d][i])
            }

            #[inline]
            pub fn weights(&self) -> &[f32] {
                &self.cols.weight
            }

            /// Local densities from the last run.
            #[inline]
            pub fn rho(&self) -> &[f32] {
                &self.cols.rho
            }

            /// Nearest-higher links from the last run ([`NONE`] for seeds and maxima).
            #[inline]
            pub fn nearest_higher(&self) -> &[i32] {
                &self.cols.nearest_higher
            }

            #[inline]
            pub fn is_seed(&self) -> &[bool] {
                &self.cols.is_seed
            }

            pub fn n_seeds(&self) -> usize {
                self.cols.is_seed.iter().filter(|&&s| s).count()
            }

            /// Cluster id per point ([`UNASSIGNED`] for noise).
            ///
            /// Fails with [`ClueError::NotClustered`] before the pipeline has run.
            pub fn cluster_indexes(&self) -> Result<&[i32]> {
                if self.cols.clustered {
                    Ok(&self.cols.cluster_index)
                } else {
                    Err(ClueError::NotClustered)
                }
            }

            #[inline]
            pub fn clustered(&self) -> bool {
                self.cols.clustered
            }
        }
    };
}

/// Host-resident point store.
#[derive(Debug, Clone)]
pub struct PointsHost<const N: usize> {
    pub(crate) cols: Columns<N>,
    n_clusters: OnceLock<usize>,
}

impl_point_accessors!(PointsHost);

impl<const N: usize> PointsHost<N> {
    /// Build from one coordinate column per dimension plus a weight column.
    pub fn new(coords: [Vec<f32>; N], weights: Vec<f32>) -> Result<Self> {
        Ok(Self {
            cols: Columns::from_inputs(coords, weights)?,
            n_clusters: OnceLock::new(),
        })
    }

    /// Build from row-major coordinates.
    pub fn from_rows(rows: &[[f32; N]], weights: &[f32]) -> Result<Self> {
        if rows.len() != weights.len() {
            return Err(ClueError::SizeMismatch {
                what: "weight column",
                expected: rows.len(),
                found: weights.len(),
            });
        }
        let coords = std::array::from_fn(|d| rows.iter().map(|r| r[d]).collect());
        Self::new(coords, weights.to_vec())
    }

    /// `n` points at the origin with zero weight.
    pub fn zeroed(n: usize) -> Self {
        Self {
            cols: Columns::zeroed(n),
            n_clusters: OnceLock::new(),
        }
    }

    /// Mutable coordinate column. Editing inputs invalidates previous results.
    pub fn coords_mut(&mut self, dim: usize) -> Result<&mut [f32]> {
        self.invalidate();
        self.cols
            .coords
            .get_mut(dim)
            .map(Vec::as_mut_slice)
            .ok_or(ClueError::DimensionOutOfRange { dim, ndim: N })
    }

    /// Mutable weight column. Editing inputs invalidates previous results.
    pub fn weights_mut(&mut self) -> &mut [f32] {
        self.invalidate();
        &mut self.cols.weight
    }

    /// Number of clusters found by the last run. Cached until the next device→host copy.
    pub fn n_clusters(&self) -> Result<usize> {
        let labels = self.cluster_indexes()?;
        Ok(*self.n_clusters.get_or_init(|| {
            labels
                .iter()
                .copied()
                .max()
                .map_or(0, |m| (m + 1).max(0) as usize)
        }))
    }

    fn invalidate(&mut self) {
        self.cols.clustered = false;
        self.n_clusters = OnceLock::new();
    }
}

/// Point store the pipeline kernels operate on.
#[derive(Debug, Clone)]
pub struct PointsDevice<const N: usize> {
    pub(crate) cols: Columns<N>,
}

impl_point_accessors!(PointsDevice);

impl<const N: usize> PointsDevice<N> {
    /// Allocate `n` zeroed points.
    pub fn new(n: usize) -> Self {
        Self {
            cols: Columns::zeroed(n),
        }
    }

    /// Allocate and fill from a host store.
    pub fn from_host(host: &PointsHost<N>) -> Self {
        let mut device = Self::new(host.size());
        device.load_inputs(host);
        device
    }

    /// Re-bind to `n` points, keeping allocations where possible. Results are cleared.
    pub fn resize(&mut self, n: usize) {
        self.cols.resize(n);
    }

    #[inline]
    pub(crate) fn mark_clustered(&mut self) {
        self.cols.clustered = true;
    }

    #[inline]
    pub(crate) fn clear_clustered(&mut self) {
        self.cols.clustered = false;
    }

    fn load_inputs(&mut self, host: &PointsHost<N>) {
        for (dst, src) in self.cols.coords.iter_mut().zip(&host.cols.coords) {
            dst.copy_from_slice(src);
        }
        self.cols.weight.copy_from_slice(&host.cols.weight);
        self.cols.clustered = false;
    }
}

/// Copy coordinates and weights from host to device.
///
/// Fails before moving any data if the point counts differ.
pub fn copy_to_device<const N: usize>(
    host: &PointsHost<N>,
    device: &mut PointsDevice<N>,
) -> Result<()> {
    check_sizes(host.size(), device.size())?;
    device.load_inputs(host);
    Ok(())
}

/// Copy clustering results from device to host.
///
/// Fails before moving any data if the point counts differ. Invalidates the
/// host's cached cluster count.
pub fn copy_to_host<const N: usize>(
    host: &mut PointsHost<N>,
    device: &PointsDevice<N>,
) -> Result<()> {
    check_sizes(host.size(), device.size())?;
    let (dst, src) = (&mut host.cols, &device.cols);
    dst.rho.copy_from_slice(&src.rho);
    dst.nearest_higher.copy_from_slice(&src.nearest_higher);
    dst.is_seed.copy_from_slice(&src.is_seed);
    dst.cluster_index.copy_from_slice(&src.cluster_index);
    dst.clustered = src.clustered;
    host.n_clusters = OnceLock::new();
    Ok(())
}

fn check_sizes(host: usize, device: usize) -> Result<()> {
    if host != device {
        return Err(ClueError::SizeMismatch {
            what: "host/device points",
            expected: host,
            found: device,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PointsHost<2> {
        PointsHost::from_rows(&[[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]], &[1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn test_columns_and_accessors() {
        let points = sample();
        assert_eq!(points.size(), 3);
        assert_eq!(points.coords(0).unwrap(), &[0.0, 2.0, 4.0]);
        assert_eq!(points.coords(1).unwrap(), &[1.0, 3.0, 5.0]);
        assert_eq!(points.point(1), [2.0, 3.0]);
        assert_eq!(points.weights(), &[1.0, 2.0, 3.0]);
        assert_eq!(
            points.coords(2),
            Err(ClueError::DimensionOutOfRange { dim: 2, ndim: 2 })
        );
        assert_eq!(points.cluster_indexes(), Err(ClueError::NotClustered));
        assert!(points.n_clusters().is_err());
    }

    #[test]
    fn test_mismatched_columns_rejected() {
        let err = PointsHost::<2>::new([vec![0.0; 3], vec![0.0; 2]], vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, ClueError::SizeMismatch { found: 2, .. }));
        assert!(PointsHost::<1>::from_rows(&[[0.0]], &[]).is_err());
    }

    #[test]
    fn test_copies_check_sizes() {
        let mut host = sample();
        let mut device = PointsDevice::<2>::new(4);
        assert!(matches!(
            copy_to_device(&host, &mut device),
            Err(ClueError::SizeMismatch { expected: 3, found: 4, .. })
        ));
        assert!(copy_to_host(&mut host, &device).is_err());

        device.resize(3);
        copy_to_device(&host, &mut device).unwrap();
        assert_eq!(device.coords(1).unwrap(), host.coords(1).unwrap());
        assert_eq!(device.weights(), host.weights());
    }

    #[test]
    fn test_copy_to_host_invalidates_cluster_count() {
        let mut host = sample();
        let mut device = PointsDevice::from_host(&host);

        device.cols.cluster_index = vec![0, 0, 1];
        device.mark_clustered();
        copy_to_host(&mut host, &device).unwrap();
        assert_eq!(host.n_clusters(), Ok(2));

        device.cols.cluster_index = vec![0, 1, 2];
        copy_to_host(&mut host, &device).unwrap();
        assert_eq!(host.n_clusters(), Ok(3));
        assert_eq!(host.cluster_indexes().unwrap(), &[0, 1, 2]);
    }

    #[test]
    fn test_editing_inputs_clears_clustered_flag() {
        let mut host = sample();
        host.cols.clustered = true;
        assert!(host.clustered());
        host.weights_mut()[0] = 5.0;
        assert!(!host.clustered());
        host.cols.clustered = true;
        host.coords_mut(0).unwrap()[1] = -1.0;
        assert!(!host.clustered());
        assert!(host.coords_mut(3).is_err());
    }
}
