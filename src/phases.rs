//! Per-point and per-seed kernels of the clustering pipeline.
//!
//! Each function is one bulk dispatch (or a short fixed sequence of them)
//! over the device columns. Returning from a function is the barrier before
//! the next phase.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use crate::error::{ClueError, Result};
use crate::executor::atomic::as_atomic_i32;
use crate::executor::{Executor, Launch};
use crate::followers::Followers;
use crate::kernel::ConvolutionalKernel;
use crate::metric::DistanceMetric;
use crate::params::StackLimit;
use crate::points::{Columns, NONE, UNASSIGNED};
use crate::seeds::SeedRegistry;
use crate::tiles::Tiles;

#[inline]
fn gather<const N: usize>(coords: &[Vec<f32>; N], i: usize) -> [f32; N] {
    std::array::from_fn(|d| coords[d][i])
}

/// `rho[i] = Σ kernel(d(i, j), i, j) · weight[j]` over every `j` with `d(i, j) <= dc`.
pub(crate) fn local_density<const N: usize, E, M, K>(
    exec: &E,
    block_size: usize,
    tiles: &Tiles<N>,
    cols: &mut Columns<N>,
    metric: &M,
    kernel: &K,
    dc: f32,
) where
    E: Executor,
    M: DistanceMetric<N>,
    K: ConvolutionalKernel,
{
    let Columns {
        coords,
        weight,
        rho,
        ..
    } = cols;
    let (coords, weight) = (&*coords, &*weight);

    exec.for_each_mut(Launch::new(rho.len(), block_size), rho, |i, rho_i| {
        let p = gather(coords, i);
        let bx = tiles.search_box(&p, dc);
        let mut acc = 0.0f32;
        for j in tiles.candidates(&bx) {
            let d = metric.distance(&p, &gather(coords, j));
            if d <= dc {
                acc += kernel.weight(d, i, j) * weight[j];
            }
        }
        *rho_i = acc;
    });
}

/// Link every point to its closest denser neighbour within `dm`.
///
/// "Denser" is `rho[j] > rho[i]`, or equal positive density with `j > i`.
/// Equally distant candidates resolve to the lower index. Returns the number
/// of points left without a link.
pub(crate) fn nearest_higher<const N: usize, E, M>(
    exec: &E,
    block_size: usize,
    tiles: &Tiles<N>,
    cols: &mut Columns<N>,
    metric: &M,
    dm: f32,
) -> usize
where
    E: Executor,
    M: DistanceMetric<N>,
{
    let Columns {
        coords,
        rho,
        nearest_higher,
        ..
    } = cols;
    let (coords, rho) = (&*coords, &*rho);
    let candidates = AtomicUsize::new(0);

    let launch = Launch::new(nearest_higher.len(), block_size);
    exec.for_each_mut(launch, nearest_higher, |i, nh_i| {
        let p = gather(coords, i);
        let rho_i = rho[i];
        let mut delta = f32::MAX;
        let mut nh = NONE;

        let bx = tiles.search_box(&p, dm);
        for j in tiles.candidates(&bx) {
            let rho_j = rho[j];
            let higher = rho_j > rho_i || (rho_j == rho_i && rho_j > 0.0 && j > i);
            if !higher {
                continue;
            }
            let d = metric.distance(&p, &gather(coords, j));
            if d <= dm && (d < delta || (d == delta && (j as i32) < nh)) {
                delta = d;
                nh = j as i32;
            }
        }

        *nh_i = nh;
        if nh == NONE {
            candidates.fetch_add(1, Ordering::Relaxed);
        }
    });
    exec.wait();
    candidates.into_inner()
}

/// Promote isolated dense points to seeds and record them in `registry`.
///
/// A point is a seed when its distance to its nearest higher exceeds
/// `seed_dc` (infinite for unlinked points) and `rho >= rhoc`. Seeds lose
/// their link. Every cluster id is cleared. The registry ends up sorted by
/// point index.
pub(crate) fn find_seeds<const N: usize, E, M>(
    exec: &E,
    block_size: usize,
    cols: &mut Columns<N>,
    registry: &mut SeedRegistry,
    metric: &M,
    seed_dc: f32,
    rhoc: f32,
) -> Result<()>
where
    E: Executor,
    M: DistanceMetric<N>,
{
    let Columns {
        coords,
        rho,
        nearest_higher,
        is_seed,
        cluster_index,
        ..
    } = cols;
    let launch = Launch::new(is_seed.len(), block_size);

    {
        let (coords, rho, nh) = (&*coords, &*rho, &*nearest_higher);
        registry.collect(|pusher| {
            exec.for_each_mut(launch, is_seed, |i, seed| {
                let delta = match nh[i] {
                    NONE => f32::INFINITY,
                    j => metric.distance(&gather(coords, i), &gather(coords, j as usize)),
                };
                *seed = delta > seed_dc && rho[i] >= rhoc;
                if *seed {
                    // A full registry is reported by `collect`.
                    let _ = pusher.push(i as u32);
                }
            });
            Ok(())
        })?;
    }

    let is_seed = &*is_seed;
    exec.for_each_mut(launch, nearest_higher, |i, nh| {
        if is_seed[i] {
            *nh = NONE;
        }
    });
    exec.for_each_mut(launch, cluster_index, |_, c| *c = UNASSIGNED);
    exec.wait();

    registry.sort();
    Ok(())
}

/// Label every point reachable from a seed through the follower graph.
///
/// One task per seed walks its tree depth-first; the cluster id is the
/// seed's registry slot. Trees are disjoint, so tasks never write the same
/// label.
pub(crate) fn assign_clusters<E: Executor>(
    exec: &E,
    block_size: usize,
    seeds: &SeedRegistry,
    followers: &Followers,
    cluster_index: &mut [i32],
    stack_limit: StackLimit,
) -> Result<()> {
    let labels = as_atomic_i32(cluster_index);
    let seeds = seeds.as_slice();
    let capacity = match stack_limit {
        StackLimit::Unbounded => usize::MAX,
        StackLimit::Bounded(n) => n,
    };

    exec.try_for_each(Launch::new(seeds.len(), block_size), |cls| {
        let seed = seeds[cls];
        let overflow = || {
            warn!(seed, capacity, "cluster traversal stack overflow");
            ClueError::TraversalStackOverflow { seed, capacity }
        };

        labels[seed as usize].store(cls as i32, Ordering::Relaxed);
        if capacity == 0 {
            return Err(overflow());
        }
        let mut stack = vec![seed];
        while let Some(p) = stack.pop() {
            let label = labels[p as usize].load(Ordering::Relaxed);
            for &f in followers.followers_of(p as usize) {
                labels[f as usize].store(label, Ordering::Relaxed);
                if stack.len() >= capacity {
                    return Err(overflow());
                }
                stack.push(f);
            }
        }
        Ok(())
    })?;
    exec.wait();
    Ok(())
}
