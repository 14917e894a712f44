//! Tiled density clustering (CLUE) for N-dimensional weighted points.
//!
//! Points are binned into a regular tile grid, each point's local density is
//! accumulated from its neighbours within `dc`, and every point is linked to
//! its nearest denser neighbour within `dm`. Dense points with no denser
//! neighbour nearby become seeds; every point whose chain of links reaches a
//! seed joins that seed's cluster. Everything else is noise.
//!
//! # Example
//!
//! ```
//! use clue_tiles::{Clusterer, PointsHost};
//!
//! // Two tight groups of 25 points, far apart.
//! let rows: Vec<[f32; 2]> = (0..50)
//!     .map(|i| {
//!         let t = (i % 25) as f32 * 0.01;
//!         let offset = if i < 25 { 0.0 } else { 10.0 };
//!         [offset + t, offset + t]
//!     })
//!     .collect();
//! let mut points = PointsHost::from_rows(&rows, &vec![1.0; rows.len()])?;
//!
//! let mut clusterer = Clusterer::<2>::new(0.5, 2.0)?;
//! clusterer.run(&mut points)?;
//!
//! let clusters = clusterer.clusters(&points)?;
//! assert_eq!(clusters.size(), 2);
//! assert_eq!(clusters.bin(0).len(), 25);
//! # Ok::<(), clue_tiles::ClueError>(())
//! ```
//!
//! # Features
//!
//! - `parallel` (default): multicore execution through [`RayonExecutor`].
//! - `timing`: per-phase wall-clock timings, reported through `tracing`.

pub mod association;
mod clusterer;
mod error;
pub mod executor;
mod followers;
pub mod kernel;
pub mod metric;
mod params;
mod phases;
mod points;
mod seeds;
pub mod tiles;
pub mod timing;
pub mod validation;

pub use association::{AssociationMap, Extents, NO_KEY};
pub use clusterer::{get_clusters, get_device_clusters, Clusterer};
pub use error::{ClueError, Result};
#[cfg(feature = "parallel")]
pub use executor::RayonExecutor;
pub use executor::{DefaultExecutor, Executor, Launch, SerialExecutor};
pub use followers::Followers;
pub use kernel::{ConvolutionalKernel, ExponentialKernel, FlatKernel, GaussianKernel};
pub use metric::{
    ChebyshevMetric, DistanceMetric, EuclideanMetric, ManhattanMetric, WeightedEuclideanMetric,
};
pub use params::{ClusteringParams, RunOptions, StackLimit};
pub use points::{copy_to_device, copy_to_host, PointsDevice, PointsHost, NONE, UNASSIGNED};
pub use seeds::{SeedPusher, SeedRegistry};
pub use tiles::{SearchBox, TileGrid, Tiles};
pub use validation::{validate_clustering, ClusteringReport};

/// Cluster `points` in place with `params` on the default executor.
///
/// Uses the Euclidean metric and the default flat kernel. For repeated runs,
/// keep a [`Clusterer`] instead so its buffers are reused.
pub fn cluster<const N: usize>(points: &mut PointsHost<N>, params: ClusteringParams) -> Result<()> {
    Clusterer::<N>::with_params(params, DefaultExecutor::default())?.run(points)
}
