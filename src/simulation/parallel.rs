//! Parallel simulation execution
//!
//! Uses Rayon to play shots concurrently. Each shot owns its own
//! `PenaltySim`, so jobs share nothing but the read-only tuning.

use rayon::prelude::*;

use crate::tuning::PenaltyTuning;

use super::config::SimConfig;
use super::metrics::ShotResult;
use super::runner::{ShotJob, run_shot};

/// Initialize the global Rayon pool with the given thread count.
/// Call this once at startup before running parallel simulations.
pub fn init_parallel(threads: usize) {
    if threads > 0
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        // Already initialized: keep the existing pool
        eprintln!("Warning: Failed to initialize Rayon thread pool: {}", e);
    }
}

/// Run shots in parallel.
/// Returns results in the same order as `jobs`.
pub fn run_shots_parallel(jobs: &[ShotJob], tuning: &PenaltyTuning, config: &SimConfig) -> Vec<ShotResult> {
    jobs.par_iter().map(|job| run_shot(job, tuning, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::runner::plan_shots;
    use crate::simulation::SimMode;

    #[test]
    fn test_parallel_matches_sequential() {
        let mut tuning = PenaltyTuning::default();
        tuning.shot.max_spin = 0.0;
        let config = SimConfig {
            mode: SimMode::Batch { shots: 8 },
            quiet: true,
            ..Default::default()
        };
        let jobs = plan_shots(&config, 21);

        let parallel = run_shots_parallel(&jobs, &tuning, &config);
        assert_eq!(parallel.len(), jobs.len());
        for (job, result) in jobs.iter().zip(&parallel) {
            assert_eq!(result.index, job.index);
            let sequential = run_shot(job, &tuning, &config);
            assert_eq!(result.outcome, sequential.outcome);
            assert_eq!(result.ticks, sequential.ticks);
        }
    }
}
