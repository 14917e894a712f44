use std::time::{Duration, Instant};

use tracing::debug;

use super::Phase;

/// Timer for sequential phases: each `lap()` takes a single `Instant::now()`.
struct LapTimer(Instant);

impl LapTimer {
    #[inline]
    fn start() -> Self {
        Self(Instant::now())
    }

    #[inline]
    fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let d = now.duration_since(self.0);
        self.0 = now;
        d
    }
}

/// Phase durations of one clustering run.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    pub total: Duration,
    phases: [Duration; Phase::ALL.len()],
}

impl PhaseTimings {
    pub fn get(&self, phase: Phase) -> Duration {
        self.phases[phase as usize]
    }

    pub fn report(&self, n: usize) {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        let pct = |d: Duration| {
            if self.total.is_zero() {
                0.0
            } else {
                d.as_secs_f64() / self.total.as_secs_f64() * 100.0
            }
        };
        debug!(n_points = n, total_ms = ms(self.total), "clustering timings");
        for phase in Phase::ALL {
            let d = self.get(phase);
            debug!(
                phase = phase.name(),
                ms = ms(d),
                pct = pct(d),
                "phase timing"
            );
        }
    }
}

/// Accumulates phase durations for one run.
pub struct TimingBuilder {
    t_start: Instant,
    lap: LapTimer,
    phases: [Duration; Phase::ALL.len()],
}

impl TimingBuilder {
    pub fn new() -> Self {
        Self {
            t_start: Instant::now(),
            lap: LapTimer::start(),
            phases: [Duration::ZERO; Phase::ALL.len()],
        }
    }

    /// Charge the time since the previous mark to `phase`.
    pub fn mark(&mut self, phase: Phase) {
        self.phases[phase as usize] += self.lap.lap();
    }

    pub fn finish(self) -> PhaseTimings {
        PhaseTimings {
            total: self.t_start.elapsed(),
            phases: self.phases,
        }
    }
}

impl Default for TimingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
