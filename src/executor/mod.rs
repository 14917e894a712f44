//! Parallel execution backends.
//!
//! The clustering pipeline is written once against [`Executor`]. A backend
//! provides bulk dispatch over a 1-D index range, the two collective
//! primitives the pipeline needs (min/max reduction and inclusive scan), and
//! an explicit barrier.
//!
//! Every dispatch method is blocking: when it returns, all tasks have run and
//! their writes are visible to the caller. That return is the inter-phase
//! barrier the pipeline relies on.

pub(crate) mod atomic;
#[cfg(feature = "parallel")]
mod pool;
mod serial;

#[cfg(feature = "parallel")]
pub use pool::RayonExecutor;
pub use serial::SerialExecutor;

use crate::error::Result;

/// Executor used when none is given explicitly.
#[cfg(feature = "parallel")]
pub type DefaultExecutor = RayonExecutor;
/// Executor used when none is given explicitly.
#[cfg(not(feature = "parallel"))]
pub type DefaultExecutor = SerialExecutor;

/// Shape of one bulk dispatch: `len` tasks grouped `block_size` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launch {
    pub len: usize,
    pub block_size: usize,
}

impl Launch {
    /// Task-group size used when the caller does not tune it.
    pub const DEFAULT_BLOCK_SIZE: usize = 256;

    /// A dispatch of `len` tasks. A zero block size is bumped to 1.
    #[inline]
    pub fn new(len: usize, block_size: usize) -> Self {
        Self {
            len,
            block_size: block_size.max(1),
        }
    }

    #[inline]
    pub fn over(len: usize) -> Self {
        Self::new(len, Self::DEFAULT_BLOCK_SIZE)
    }

    /// Number of task groups, rounding up.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.len.div_ceil(self.block_size)
    }
}

/// A data-parallel execution backend.
pub trait Executor: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Run `f(i)` for every `i` in `0..launch.len`.
    fn for_each<F>(&self, launch: Launch, f: F)
    where
        F: Fn(usize) + Send + Sync;

    /// Run fallible tasks; the first error observed is returned.
    ///
    /// Other tasks may or may not have run when an error is returned.
    fn try_for_each<F>(&self, launch: Launch, f: F) -> Result<()>
    where
        F: Fn(usize) -> Result<()> + Send + Sync;

    /// Run `f(i, &mut data[i])` for every element, each task owning its slot.
    ///
    /// `launch.len` must equal `data.len()`.
    fn for_each_mut<T, F>(&self, launch: Launch, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync;

    /// Minimum and maximum of a column, ignoring NaN. `None` if nothing remains.
    fn min_max(&self, data: &[f32]) -> Option<(f32, f32)>;

    /// In-place inclusive prefix sum.
    fn inclusive_scan(&self, data: &mut [u32]);

    /// Block until all previously dispatched work is complete.
    ///
    /// Dispatch is synchronous for the bundled backends, so this is a no-op
    /// for them; asynchronous backends must override it.
    #[inline]
    fn wait(&self) {}
}

/// Serial inclusive scan shared by the backends.
#[inline]
pub(crate) fn scan_in_place(data: &mut [u32]) {
    let mut sum = 0u32;
    for x in data.iter_mut() {
        sum += *x;
        *x = sum;
    }
}

/// Fold step shared by the min/max reductions.
#[inline]
pub(crate) fn fold_min_max(acc: (f32, f32), x: f32) -> (f32, f32) {
    if x.is_nan() {
        acc
    } else {
        (acc.0.min(x), acc.1.max(x))
    }
}

#[inline]
pub(crate) fn finish_min_max(acc: (f32, f32)) -> Option<(f32, f32)> {
    (acc.0 <= acc.1).then_some(acc)
}

pub(crate) const MIN_MAX_IDENTITY: (f32, f32) = (f32::INFINITY, f32::NEG_INFINITY);
