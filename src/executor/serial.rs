use super::{finish_min_max, fold_min_max, scan_in_place, Executor, Launch, MIN_MAX_IDENTITY};
use crate::error::Result;

/// Single-threaded backend. Tasks run in index order on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn name(&self) -> &'static str {
        "serial"
    }

    #[inline]
    fn for_each<F>(&self, launch: Launch, f: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        (0..launch.len).for_each(f);
    }

    #[inline]
    fn try_for_each<F>(&self, launch: Launch, f: F) -> Result<()>
    where
        F: Fn(usize) -> Result<()> + Send + Sync,
    {
        (0..launch.len).try_for_each(f)
    }

    #[inline]
    fn for_each_mut<T, F>(&self, launch: Launch, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        debug_assert_eq!(launch.len, data.len(), "launch/data length mismatch");
        for (i, x) in data.iter_mut().enumerate() {
            f(i, x);
        }
    }

    fn min_max(&self, data: &[f32]) -> Option<(f32, f32)> {
        finish_min_max(data.iter().copied().fold(MIN_MAX_IDENTITY, fold_min_max))
    }

    fn inclusive_scan(&self, data: &mut [u32]) {
        scan_in_place(data);
    }
}
