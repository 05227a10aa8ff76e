//! Search configuration.

use crate::constants::{
    ENDING_EXPLORATION_CONST, MIDDLE_EXPLORATION_CONST, N_TRIAL_PER_SIM,
    OPENING_EXPLORATION_CONST, RAVE_RATIO_DECAY_RATE, TOTAL_DISTANCE_THRES1,
    TOTAL_DISTANCE_THRES2,
};
use crate::mcts::MctsError;

/// One step of the exploration schedule: while the root's remaining distance
/// is strictly above `above`, selection uses `constant`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationTier {
    pub above: u32,
    pub constant: f64,
}

impl ExplorationTier {
    pub const fn new(above: u32, constant: f64) -> Self {
        Self { above, constant }
    }
}

/// What [`best_ply`](crate::mcts::Mcts::best_ply) does when the time budget
/// runs out before a single batch of playouts has been folded into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetFallback {
    /// Answer with a uniformly random legal move drawn from the search RNG.
    #[default]
    RandomMove,
    /// Fail with [`MctsError::InsufficientBudget`].
    Fail,
}

/// Configuration for the RAVE tree search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Random playouts per child of every expanded node.
    pub trials_per_sim: u32,

    /// Decay rate of the AMAF blend weight. Larger values hand control to the
    /// direct statistics sooner. Zero keeps the classic
    /// `amaf / (amaf + direct)` weighting.
    pub rave_decay_rate: f64,

    /// Exploration schedule, highest threshold first. The first tier whose
    /// threshold the root distance exceeds wins; the last tier covers the
    /// rest of the game.
    pub exploration_tiers: Vec<ExplorationTier>,

    /// Worker threads for playouts. 0 uses rayon's global pool.
    pub threads: usize,

    /// Seed for the search RNG. `None` seeds from the OS.
    pub seed: Option<u64>,

    /// Stop after this many select/expand/simulate iterations even if time
    /// remains. Mostly useful for reproducible runs.
    pub max_iterations: Option<u64>,

    pub fallback: BudgetFallback,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials_per_sim: N_TRIAL_PER_SIM,
            rave_decay_rate: RAVE_RATIO_DECAY_RATE,
            exploration_tiers: vec![
                ExplorationTier::new(TOTAL_DISTANCE_THRES1, OPENING_EXPLORATION_CONST),
                ExplorationTier::new(TOTAL_DISTANCE_THRES2, MIDDLE_EXPLORATION_CONST),
                ExplorationTier::new(0, ENDING_EXPLORATION_CONST),
            ],
            threads: 0,
            seed: None,
            max_iterations: None,
            fallback: BudgetFallback::RandomMove,
        }
    }
}

impl SearchConfig {
    /// Small, seeded, single-threaded config for tests.
    pub fn for_testing() -> Self {
        Self {
            trials_per_sim: 8,
            threads: 1,
            seed: Some(42),
            ..Self::default()
        }
    }

    /// Builder pattern: set playouts per child.
    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials_per_sim = trials;
        self
    }

    /// Builder pattern: set the AMAF decay rate.
    pub fn with_rave_decay_rate(mut self, rate: f64) -> Self {
        self.rave_decay_rate = rate;
        self
    }

    /// Builder pattern: replace the exploration schedule.
    pub fn with_exploration_tiers(mut self, tiers: Vec<ExplorationTier>) -> Self {
        self.exploration_tiers = tiers;
        self
    }

    /// Builder pattern: set the playout thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Builder pattern: set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder pattern: cap the number of iterations per search.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Builder pattern: set the out-of-time policy.
    pub fn with_fallback(mut self, fallback: BudgetFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Check the config before a controller is built from it.
    pub fn validate(&self) -> Result<(), MctsError> {
        if self.trials_per_sim == 0 {
            return Err(MctsError::InvalidArgument(
                "trials_per_sim must be positive".into(),
            ));
        }
        if !self.rave_decay_rate.is_finite() || self.rave_decay_rate < 0.0 {
            return Err(MctsError::InvalidArgument(format!(
                "rave_decay_rate must be a non-negative number, got {}",
                self.rave_decay_rate
            )));
        }
        if self.max_iterations == Some(0) {
            return Err(MctsError::InvalidArgument(
                "max_iterations must be positive when set".into(),
            ));
        }
        if self.exploration_tiers.is_empty() {
            return Err(MctsError::InvalidArgument(
                "at least one exploration tier is required".into(),
            ));
        }
        if let Some(tier) = self
            .exploration_tiers
            .iter()
            .find(|t| !t.constant.is_finite() || t.constant < 0.0)
        {
            return Err(MctsError::InvalidArgument(format!(
                "exploration constant must be a non-negative number, got {}",
                tier.constant
            )));
        }
        for pair in self.exploration_tiers.windows(2) {
            if pair[1].above >= pair[0].above {
                return Err(MctsError::InvalidArgument(
                    "exploration tier thresholds must be strictly decreasing".into(),
                ));
            }
            if pair[1].constant > pair[0].constant {
                return Err(MctsError::InvalidArgument(
                    "exploration constants must not grow toward the end of the game".into(),
                ));
            }
        }
        Ok(())
    }
}
