//! The clustering orchestrator.
//!
//! [`Clusterer`] owns every auxiliary structure the pipeline needs (tile
//! index, follower graph, seed registry, and a device point store for
//! host-only runs) and reuses them across calls, growing them only when a
//! larger point set arrives.
//!
//! A run executes five phases in order, each finished before the next starts:
//!
//! 1. setup: host → device copy, tile index and follower storage
//! 2. local density
//! 3. nearest higher, counting unlinked points
//! 4. seed selection into a registry sized from that count
//! 5. cluster assignment by depth-first walks from every seed
//!
//! followed by the device → host copy when a host store is involved.

use tracing::{debug, debug_span};

use crate::association::AssociationMap;
use crate::error::{ClueError, Result};
use crate::executor::{DefaultExecutor, Executor};
use crate::followers::Followers;
use crate::kernel::{ConvolutionalKernel, FlatKernel};
use crate::metric::{DistanceMetric, EuclideanMetric};
use crate::params::{ClusteringParams, RunOptions};
use crate::phases;
use crate::points::{copy_to_device, copy_to_host, PointsDevice, PointsHost};
use crate::seeds::SeedRegistry;
use crate::tiles::Tiles;
use crate::timing::{Phase, PhaseTimings, TimingBuilder};

/// Density-based clusterer over `N`-dimensional points.
///
/// Concurrent runs on one instance are impossible by construction: every run
/// takes `&mut self`.
#[derive(Debug)]
pub struct Clusterer<const N: usize, E: Executor = DefaultExecutor> {
    params: ClusteringParams,
    wrapped: [bool; N],
    executor: E,
    tiles: Option<Tiles<N>>,
    followers: Option<Followers>,
    seeds: SeedRegistry,
    device: Option<PointsDevice<N>>,
    timings: PhaseTimings,
}

impl<const N: usize> Clusterer<N, DefaultExecutor> {
    /// Clusterer on the default executor with `dm = seed_dc = dc`.
    pub fn new(dc: f32, rhoc: f32) -> Result<Self> {
        Self::with_params(ClusteringParams::new(dc, rhoc)?, DefaultExecutor::default())
    }
}

impl<const N: usize, E: Executor> Clusterer<N, E> {
    pub fn with_params(params: ClusteringParams, executor: E) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            wrapped: [false; N],
            executor,
            tiles: None,
            followers: None,
            seeds: SeedRegistry::default(),
            device: None,
            timings: PhaseTimings::default(),
        })
    }

    /// Replace the parameters. Nothing changes if `params` is invalid.
    pub fn set_parameters(&mut self, params: ClusteringParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    #[inline]
    pub fn params(&self) -> &ClusteringParams {
        &self.params
    }

    #[inline]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Mark periodic axes. Their boundary tiles count as adjacent.
    ///
    /// Distances only wrap if the metric is periodic too; see
    /// [`EuclideanMetric::periodic`].
    pub fn set_wrapped_coordinates(&mut self, wrapped: [bool; N]) {
        self.wrapped = wrapped;
    }

    /// Byte-flag form of [`set_wrapped_coordinates`](Self::set_wrapped_coordinates):
    /// one entry per axis, non-zero meaning wrapped.
    pub fn set_wrapped_coordinates_bytes(&mut self, flags: &[u8]) -> Result<()> {
        if flags.len() != N {
            return Err(ClueError::InvalidArgument(format!(
                "expected {} wrap flags, got {}",
                N,
                flags.len()
            )));
        }
        self.wrapped = std::array::from_fn(|d| flags[d] != 0);
        Ok(())
    }

    #[inline]
    pub fn wrapped_coordinates(&self) -> &[bool; N] {
        &self.wrapped
    }

    /// Timings of the last run (all zero without the `timing` feature).
    #[inline]
    pub fn last_timings(&self) -> &PhaseTimings {
        &self.timings
    }

    /// Point indices of the seeds found by the last run, by cluster id.
    #[inline]
    pub fn seeds(&self) -> &[u32] {
        self.seeds.as_slice()
    }

    /// Cluster `host` with the Euclidean metric, the default flat kernel and default options.
    pub fn run(&mut self, host: &mut PointsHost<N>) -> Result<()> {
        self.run_with(
            host,
            &EuclideanMetric::new(),
            &FlatKernel::default(),
            &RunOptions::default(),
        )
    }

    /// Cluster `host` using a device store kept inside the clusterer.
    pub fn run_with<M, K>(
        &mut self,
        host: &mut PointsHost<N>,
        metric: &M,
        kernel: &K,
        options: &RunOptions,
    ) -> Result<()>
    where
        M: DistanceMetric<N>,
        K: ConvolutionalKernel,
    {
        let mut device = match self.device.take() {
            Some(mut device) => {
                device.resize(host.size());
                device
            }
            None => PointsDevice::new(host.size()),
        };
        let result = self.run_with_device(host, &mut device, metric, kernel, options);
        self.device = Some(device);
        result
    }

    /// Cluster `host` through a caller-provided device store of the same size.
    pub fn run_with_device<M, K>(
        &mut self,
        host: &mut PointsHost<N>,
        device: &mut PointsDevice<N>,
        metric: &M,
        kernel: &K,
        options: &RunOptions,
    ) -> Result<()>
    where
        M: DistanceMetric<N>,
        K: ConvolutionalKernel,
    {
        let mut timer = TimingBuilder::new();
        copy_to_device(host, device)?;
        self.pipeline(device, metric, kernel, options, &mut timer)?;
        copy_to_host(host, device)?;
        timer.mark(Phase::CopyBack);
        self.finish_timings(timer, host.size());
        Ok(())
    }

    /// Cluster points that already live in a device store. Results stay on the device.
    pub fn run_device<M, K>(
        &mut self,
        device: &mut PointsDevice<N>,
        metric: &M,
        kernel: &K,
        options: &RunOptions,
    ) -> Result<()>
    where
        M: DistanceMetric<N>,
        K: ConvolutionalKernel,
    {
        let mut timer = TimingBuilder::new();
        self.pipeline(device, metric, kernel, options, &mut timer)?;
        self.finish_timings(timer, device.size());
        Ok(())
    }

    /// Members of every cluster found in `host`, keyed by cluster id.
    pub fn clusters(&self, host: &PointsHost<N>) -> Result<AssociationMap> {
        get_clusters(&self.executor, host)
    }

    fn finish_timings(&mut self, timer: TimingBuilder, n: usize) {
        let timings = timer.finish();
        timings.report(n);
        self.timings = timings;
    }

    fn pipeline<M, K>(
        &mut self,
        device: &mut PointsDevice<N>,
        metric: &M,
        kernel: &K,
        options: &RunOptions,
        timer: &mut TimingBuilder,
    ) -> Result<()>
    where
        M: DistanceMetric<N>,
        K: ConvolutionalKernel,
    {
        // Results stay invalid until the last phase completes.
        device.clear_clustered();
        let n = device.size();
        if n == 0 {
            return Err(ClueError::InvalidArgument("no points to cluster".into()));
        }
        let ClusteringParams {
            dc,
            rhoc,
            dm,
            seed_dc,
            points_per_tile,
        } = self.params;
        let block = options.block_size;
        let exec = &self.executor;

        let span = debug_span!("clue", n_points = n, executor = exec.name());
        let _enter = span.enter();

        // Phase 1: setup.
        let tiles = match &mut self.tiles {
            Some(tiles) => {
                tiles.reset(n, points_per_tile)?;
                tiles
            }
            slot => slot.insert(Tiles::new(n, points_per_tile)?),
        };
        tiles.fill(exec, block, device, self.wrapped)?;
        let followers = match &mut self.followers {
            Some(followers) => {
                followers.ensure_capacity(n)?;
                followers
            }
            slot => slot.insert(Followers::new(n)?),
        };
        debug!(n_tiles = tiles.n_tiles(), n_per_dim = tiles.n_per_dim(), "tiles filled");
        timer.mark(Phase::Setup);

        // Phase 2: local density.
        phases::local_density(exec, block, tiles, &mut device.cols, metric, kernel, dc);
        timer.mark(Phase::LocalDensity);

        // Phase 3: nearest higher.
        let candidates = phases::nearest_higher(exec, block, tiles, &mut device.cols, metric, dm);
        debug!(seed_candidates = candidates, "nearest higher");
        timer.mark(Phase::NearestHigher);

        // Phase 4: seeds. With dm > seed_dc a linked point can still be a seed.
        let capacity = if dm > seed_dc { n } else { candidates };
        self.seeds.reset(capacity);
        phases::find_seeds(
            exec,
            block,
            &mut device.cols,
            &mut self.seeds,
            metric,
            seed_dc,
            rhoc,
        )?;
        debug!(seeds = self.seeds.size(), capacity, "seeds found");
        timer.mark(Phase::FindSeeds);

        // Phase 5: propagate cluster ids down the follower forest.
        followers.fill(exec, block, &device.cols.nearest_higher)?;
        phases::assign_clusters(
            exec,
            block,
            &self.seeds,
            followers,
            &mut device.cols.cluster_index,
            options.stack_limit,
        )?;
        device.mark_clustered();
        timer.mark(Phase::AssignClusters);
        Ok(())
    }
}

/// Members of every cluster in a clustered host store, keyed by cluster id.
///
/// Unassigned points are left out. With no clusters the map is empty and
/// has no bins.
pub fn get_clusters<E: Executor, const N: usize>(
    exec: &E,
    host: &PointsHost<N>,
) -> Result<AssociationMap> {
    let labels = host.cluster_indexes()?;
    clusters_from_labels(exec, labels, host.n_clusters()?)
}

/// Device-store form of [`get_clusters`].
pub fn get_device_clusters<E: Executor, const N: usize>(
    exec: &E,
    device: &PointsDevice<N>,
) -> Result<AssociationMap> {
    let labels = device.cluster_indexes()?;
    let n_clusters = labels
        .iter()
        .copied()
        .max()
        .map_or(0, |m| (m + 1).max(0) as usize);
    clusters_from_labels(exec, labels, n_clusters)
}

fn clusters_from_labels<E: Executor>(
    exec: &E,
    labels: &[i32],
    n_clusters: usize,
) -> Result<AssociationMap> {
    if n_clusters == 0 {
        return Ok(AssociationMap::default());
    }
    AssociationMap::from_keys(exec, labels, n_clusters)
}
