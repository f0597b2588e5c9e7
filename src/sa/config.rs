//! Annealing hyperparameters.

use crate::search::Strategy;

/// Configuration for one simulated-annealing run.
///
/// The per-strategy constructors carry the tuned defaults: the greedy
/// parallel-moves step needs a much slower cooling with fewer steps per
/// temperature than the independent searches.
///
/// # Examples
///
/// ```
/// use parafloor::sa::SaConfig;
///
/// let config = SaConfig::multi_start().with_cooling_rate(0.95);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SaConfig {
    /// Initial temperature. Higher values accept more uphill moves.
    pub t_start: f64,

    /// Stop temperature: the run ends when T drops to or below this.
    pub t_min: f64,

    /// Geometric cooling factor in (0, 1), applied once per
    /// temperature level.
    pub cooling_rate: f64,

    /// Moves per temperature level, as a multiple of the module count.
    pub steps_per_temp_factor: f64,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self::multi_start()
    }
}

impl SaConfig {
    /// Defaults for independent restart searches (multi-start).
    pub fn multi_start() -> Self {
        Self {
            t_start: 1e5,
            t_min: 1e-2,
            cooling_rate: 0.98,
            steps_per_temp_factor: 2.0,
        }
    }

    /// Defaults for replica exchange. `t_start` / `t_min` bound the
    /// temperature ladder; the step factor sets the exchange period.
    pub fn parallel_tempering() -> Self {
        Self::multi_start()
    }

    /// Defaults for parallel move generation. Each step is greedier
    /// (best of a whole candidate batch), so cooling is much slower
    /// and each temperature level shorter.
    pub fn parallel_moves() -> Self {
        Self {
            t_start: 1e6,
            t_min: 1e-2,
            cooling_rate: 0.995,
            steps_per_temp_factor: 0.5,
        }
    }

    /// The tuned defaults for a search strategy.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::MultiStart => Self::multi_start(),
            Strategy::ParallelTempering => Self::parallel_tempering(),
            Strategy::ParallelMoves => Self::parallel_moves(),
        }
    }

    pub fn with_t_start(mut self, t: f64) -> Self {
        self.t_start = t;
        self
    }

    pub fn with_t_min(mut self, t: f64) -> Self {
        self.t_min = t;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_steps_per_temp_factor(mut self, factor: f64) -> Self {
        self.steps_per_temp_factor = factor;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.t_start <= 0.0 {
            return Err("t_start must be positive".into());
        }
        if self.t_min <= 0.0 {
            return Err("t_min must be positive".into());
        }
        if self.t_min >= self.t_start {
            return Err("t_min must be less than t_start".into());
        }
        if self.cooling_rate <= 0.0 || self.cooling_rate >= 1.0 {
            return Err(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            ));
        }
        if self.steps_per_temp_factor <= 0.0 {
            return Err("steps_per_temp_factor must be positive".into());
        }
        Ok(())
    }
}
