//! Rayon-backed executor.

use rayon::prelude::*;

use super::{finish_min_max, fold_min_max, scan_in_place, Executor, Launch, MIN_MAX_IDENTITY};
use crate::error::{ClueError, Result};

/// Below this length the scan runs serially; above it, in chunks of this size.
const SCAN_CHUNK: usize = 1 << 14;
/// Minimum elements per task for the min/max reduction.
const REDUCE_MIN_LEN: usize = 4096;

/// Multicore backend on top of rayon.
///
/// Runs on the global rayon pool unless built with [`RayonExecutor::with_threads`],
/// in which case all dispatches are installed into a dedicated pool owned by
/// this executor.
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl RayonExecutor {
    /// Executor on the global rayon pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Executor with a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ClueError::InvalidArgument(format!("cannot build thread pool: {e}")))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Number of worker threads dispatches will use.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    #[inline]
    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Executor for RayonExecutor {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn for_each<F>(&self, launch: Launch, f: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        self.install(|| {
            (0..launch.len)
                .into_par_iter()
                .with_min_len(launch.block_size)
                .for_each(f)
        });
    }

    fn try_for_each<F>(&self, launch: Launch, f: F) -> Result<()>
    where
        F: Fn(usize) -> Result<()> + Send + Sync,
    {
        self.install(|| {
            (0..launch.len)
                .into_par_iter()
                .with_min_len(launch.block_size)
                .try_for_each(f)
        })
    }

    fn for_each_mut<T, F>(&self, launch: Launch, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        debug_assert_eq!(launch.len, data.len(), "launch/data length mismatch");
        self.install(|| {
            data.par_iter_mut()
                .enumerate()
                .with_min_len(launch.block_size)
                .for_each(|(i, x)| f(i, x))
        });
    }

    fn min_max(&self, data: &[f32]) -> Option<(f32, f32)> {
        let acc = self.install(|| {
            data.par_iter()
                .with_min_len(REDUCE_MIN_LEN)
                .fold(|| MIN_MAX_IDENTITY, |acc, &x| fold_min_max(acc, x))
                .reduce(
                    || MIN_MAX_IDENTITY,
                    |a, b| (a.0.min(b.0), a.1.max(b.1)),
                )
        });
        finish_min_max(acc)
    }

    fn inclusive_scan(&self, data: &mut [u32]) {
        if data.len() <= SCAN_CHUNK {
            scan_in_place(data);
            return;
        }

        self.install(|| {
            // Pass 1: scan each chunk independently, keep its total.
            let totals: Vec<u32> = data
                .par_chunks_mut(SCAN_CHUNK)
                .map(|chunk| {
                    scan_in_place(chunk);
                    chunk.last().copied().unwrap_or(0)
                })
                .collect();

            // Pass 2: exclusive scan of chunk totals.
            let mut carries = Vec::with_capacity(totals.len());
            let mut carry = 0u32;
            for t in totals {
                carries.push(carry);
                carry += t;
            }

            // Pass 3: add each chunk's carry.
            data.par_chunks_mut(SCAN_CHUNK)
                .zip(carries.par_iter())
                .skip(1)
                .for_each(|(chunk, &c)| {
                    for x in chunk.iter_mut() {
                        *x += c;
                    }
                });
        });
    }
}
