//! SA execution loop.

use super::config::SaConfig;
use crate::cost::evaluate;
use crate::model::BlockModel;
use crate::pack::pack;
use crate::perturb::perturb;
use crate::tree::FloorTree;
use rand::Rng;
use std::time::{Duration, Instant};

/// Wall-clock budget established at search entry and polled
/// cooperatively: once per temperature level inside a run, once per
/// outer iteration in the orchestration strategies.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    /// Starts the clock now with the given budget.
    pub fn start(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds since the clock started; convergence events are stamped
    /// with this.
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Result of a single annealing run.
#[derive(Debug, Clone)]
pub struct SaOutcome {
    /// The best solution seen during the run, packed and evaluated.
    pub best: FloorTree,

    /// Moves attempted.
    pub moves_total: u64,

    /// Moves accepted by the Metropolis test (improvements included).
    pub moves_accepted: u64,
}

/// Executes a single-threaded annealing run.
pub struct SaRunner;

impl SaRunner {
    /// Anneals from `initial` until the temperature floor or the
    /// deadline is reached, whichever comes first.
    ///
    /// Each step clones the current solution, applies one random move,
    /// packs and evaluates it, and accepts by the Metropolis criterion
    /// with a fresh uniform draw. The best solution never regresses.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call
    /// [`SaConfig::validate`] first to get a descriptive error).
    pub fn run<R: Rng>(
        model: &BlockModel,
        initial: FloorTree,
        config: &SaConfig,
        rng: &mut R,
        deadline: &Deadline,
    ) -> SaOutcome {
        config.validate().expect("invalid SaConfig");

        let mut current = initial;
        pack(&mut current);
        evaluate(&mut current, model);
        let mut best = current.clone();

        let steps_per_temp = (config.steps_per_temp_factor * model.len() as f64) as usize;
        let mut t = config.t_start;
        let mut moves_total = 0u64;
        let mut moves_accepted = 0u64;

        while t > config.t_min && !deadline.expired() {
            for _ in 0..steps_per_temp {
                moves_total += 1;
                let mut candidate = current.clone();
                perturb(&mut candidate, model, rng);
                pack(&mut candidate);
                evaluate(&mut candidate, model);

                let delta = candidate.cost - current.cost;
                if delta < 0.0 || (-delta / t).exp() > rng.random_range(0.0..1.0) {
                    moves_accepted += 1;
                    current = candidate;
                    if current.cost < best.cost {
                        best = current.clone();
                    }
                }
            }
            t *= config.cooling_rate;
        }

        SaOutcome {
            best,
            moves_total,
            moves_accepted,
        }
    }
}
