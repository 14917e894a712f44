use std::time::Duration;

use super::Phase;

/// Dummy phase timings when `timing` is disabled (zero-sized).
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings;

impl PhaseTimings {
    #[inline(always)]
    pub fn get(&self, _phase: Phase) -> Duration {
        Duration::ZERO
    }

    #[inline(always)]
    pub fn report(&self, _n: usize) {}
}

/// Dummy builder when `timing` is disabled.
#[derive(Default)]
pub struct TimingBuilder;

impl TimingBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub fn mark(&mut self, _phase: Phase) {}

    #[inline(always)]
    pub fn finish(self) -> PhaseTimings {
        PhaseTimings
    }
}
