//! Zero-cost per-phase timing for the clustering pipeline.
//!
//! With the `timing` feature, each run measures the wall-clock time of its
//! phases and reports them through `tracing` at debug level. Without it, all
//! types are zero-sized and every method compiles away.

/// Pipeline phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    LocalDensity,
    NearestHigher,
    FindSeeds,
    AssignClusters,
    CopyBack,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Setup,
        Phase::LocalDensity,
        Phase::NearestHigher,
        Phase::FindSeeds,
        Phase::AssignClusters,
        Phase::CopyBack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::LocalDensity => "local_density",
            Phase::NearestHigher => "nearest_higher",
            Phase::FindSeeds => "find_seeds",
            Phase::AssignClusters => "assign_clusters",
            Phase::CopyBack => "copy_back",
        }
    }
}

#[cfg(feature = "timing")]
mod real;
#[cfg(not(feature = "timing"))]
mod stub;

#[cfg(feature = "timing")]
pub use real::*;
#[cfg(not(feature = "timing"))]
pub use stub::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_marks_every_phase() {
        let mut builder = TimingBuilder::default();
        for phase in Phase::ALL {
            builder.mark(phase);
        }
        let timings = builder.finish();
        // Zero when disabled, some elapsed time otherwise; never panics.
        for phase in Phase::ALL {
            assert!(timings.get(phase) <= std::time::Duration::from_secs(60));
        }
    }

    #[test]
    fn test_phase_names_are_distinct() {
        let mut names: Vec<_> = Phase::ALL.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Phase::ALL.len());
    }
}
