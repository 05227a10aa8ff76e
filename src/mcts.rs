//! Monte Carlo Tree Search controller with RAVE.
//!
//! The controller owns the tree and repeats, until its time budget is spent:
//!
//! 1. **Selection**: from the root, follow the child with the largest
//!    UCB-RAVE score until reaching a node without children.
//! 2. **Expansion + simulation**: expand that node and run a batch of random
//!    playouts from every new child. A finished game is scored directly.
//! 3. **Backpropagation**: add the batch to the direct statistics of every
//!    node on the path and to the AMAF statistics of every child, along the
//!    path, whose move the same side played later in the trajectory.
//!
//! The answer is the root child with the best direct average score. After a
//! move is committed, [`Mcts::advance`] keeps the subtree under that move and
//! releases the rest.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::{BudgetFallback, SearchConfig};
use crate::game::GameState;
use crate::node::{Node, SimBatch};
use crate::ucb::{exploration_constant, ScoreParams};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum MctsError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("time budget of {budget:?} is too small to finish a single playout batch")]
    InsufficientBudget { budget: Duration },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("failed to build playout thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Shape of the current tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub total_leaf_depth: u64,
    pub max_depth: u32,
}

impl TreeStats {
    pub fn avg_leaf_depth(&self) -> f64 {
        if self.leaf_count == 0 {
            return 0.0;
        }
        self.total_leaf_depth as f64 / self.leaf_count as f64
    }
}

/// Summary of the most recent [`Mcts::best_ply`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub iterations: u64,
    pub rollouts: u64,
    pub elapsed: Duration,
    /// The answer came from the out-of-time fallback, not the tree.
    pub fallback: bool,
}

/// Anytime MCTS-RAVE search over a [`GameState`].
pub struct Mcts<G: GameState> {
    root: Node<G>,
    config: SearchConfig,
    params: ScoreParams,
    rng: fastrand::Rng,
    pool: Option<rayon::ThreadPool>,
    last_search: SearchStats,
}

impl<G: GameState> Mcts<G> {
    /// Build a controller with a single root node for `board`.
    pub fn new(board: G, config: SearchConfig) -> Result<Self, MctsError> {
        config.validate()?;

        let pool = if config.threads > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.threads)
                    .build()?,
            )
        } else {
            None
        };
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let params = ScoreParams {
            exploration: exploration_constant(&config.exploration_tiers, board.distance_remaining()),
            rave_decay_rate: config.rave_decay_rate,
        };

        Ok(Self {
            root: Node::new_root(board),
            config,
            params,
            rng,
            pool,
            last_search: SearchStats::default(),
        })
    }

    pub fn root(&self) -> &Node<G> {
        &self.root
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Exploration constant chosen for the current root.
    pub fn exploration_constant(&self) -> f64 {
        self.params.exploration
    }

    pub fn last_search(&self) -> &SearchStats {
        &self.last_search
    }

    /// [`best_ply`](Self::best_ply) with the budget in seconds.
    pub fn best_ply_secs(&mut self, time_limit_in_sec: f64) -> Result<G::Move, MctsError> {
        let invalid = || {
            MctsError::InvalidArgument(format!(
                "time limit must be a positive number of seconds, got {time_limit_in_sec}"
            ))
        };
        if !time_limit_in_sec.is_finite() || time_limit_in_sec <= 0.0 {
            return Err(invalid());
        }
        let time_limit = Duration::try_from_secs_f64(time_limit_in_sec).map_err(|_| invalid())?;
        self.best_ply(time_limit)
    }

    /// Search until `time_limit` has elapsed and return the root move with the
    /// best direct average score.
    ///
    /// A batch that has started always finishes, so the call may overrun the
    /// budget by one batch. If no batch finished and the tree holds nothing to
    /// choose from, the configured [`BudgetFallback`] decides the answer.
    pub fn best_ply(&mut self, time_limit: Duration) -> Result<G::Move, MctsError> {
        if time_limit.is_zero() {
            return Err(MctsError::InvalidArgument(
                "time limit must be positive".into(),
            ));
        }
        if self.root.is_terminal() {
            return Err(MctsError::NoLegalMoves);
        }

        let start = Instant::now();
        let mut stats = SearchStats::default();
        while start.elapsed() < time_limit {
            if self
                .config
                .max_iterations
                .is_some_and(|max| stats.iterations >= max)
            {
                break;
            }
            stats.rollouts += self.run_iteration()?;
            stats.iterations += 1;
        }
        stats.elapsed = start.elapsed();

        let result = if self.root.is_expanded() {
            let idx = self.root.child_with_best_avg_score()?;
            self.root.children()[idx]
                .ply()
                .ok_or_else(|| MctsError::InvalidState("root child without a move".into()))
        } else {
            stats.fallback = true;
            self.fallback_ply(time_limit)
        };

        let tree = self.stats();
        debug!(
            iterations = stats.iterations,
            rollouts = stats.rollouts,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            nodes = tree.node_count,
            leaves = tree.leaf_count,
            avg_leaf_depth = tree.avg_leaf_depth(),
            max_depth = tree.max_depth,
            "search finished"
        );
        self.dump_children();
        self.last_search = stats;
        result
    }

    fn fallback_ply(&mut self, budget: Duration) -> Result<G::Move, MctsError> {
        match self.config.fallback {
            BudgetFallback::RandomMove => {
                let moves = self.root.board().legal_moves();
                if moves.is_empty() {
                    return Err(MctsError::NoLegalMoves);
                }
                warn!(?budget, "no playout batch finished in time, answering with a random move");
                Ok(moves[self.rng.usize(..moves.len())])
            }
            BudgetFallback::Fail => Err(MctsError::InsufficientBudget { budget }),
        }
    }

    /// One select/expand/simulate/backpropagate round. Returns the number of
    /// playouts it accounted for.
    fn run_iteration(&mut self) -> Result<u64, MctsError> {
        let path = self.select_pv()?;
        let trials = self.config.trials_per_sim;

        let rng = &mut self.rng;
        let leaf = self
            .root
            .descendant_mut(&path)
            .ok_or_else(|| MctsError::InvalidState("selected path left the tree".into()))?;

        let batch = if leaf.is_terminal() {
            SimBatch::terminal(leaf.board().winner(), u64::from(trials))
        } else {
            match &self.pool {
                Some(pool) => pool.install(|| leaf.expand_and_run_sim(trials, rng))?,
                None => leaf.expand_and_run_sim(trials, rng)?,
            }
        };
        trace!(depth = path.len(), rollouts = batch.tally().sims, "iteration");

        let rollouts = batch.tally().sims;
        self.backpropagate(&path, batch)?;
        Ok(rollouts)
    }

    /// Walk down from the root along the largest UCB until a node without
    /// children. Returns the child indices taken.
    fn select_pv(&self) -> Result<Vec<usize>, MctsError> {
        let mut path = Vec::new();
        let mut node = &self.root;
        while node.is_expanded() {
            let idx = node.child_with_largest_ucb(self.params)?;
            path.push(idx);
            node = &node.children()[idx];
        }
        Ok(path)
    }

    /// Fold a batch produced at the end of `path` into the nodes above it.
    ///
    /// The leaf already credited its own children. Here every node on the
    /// path gets the batch in its direct counters, and each ancestor's
    /// children are checked for AMAF matches once the path moves below that
    /// ancestor have been added to the trajectories.
    fn backpropagate(&mut self, path: &[usize], mut batch: SimBatch<G::Move>) -> Result<(), MctsError> {
        let lost = || MctsError::InvalidState("backpropagation path left the tree".into());

        for depth in 0..=path.len() {
            let node = self.root.descendant_mut(&path[..depth]).ok_or_else(lost)?;
            node.add_actual_sim_res(batch.tally());
            node.update_composite_stat();
        }

        for depth in (0..path.len()).rev() {
            let below = self.root.descendant(&path[..=depth]).ok_or_else(lost)?;
            if let Some(mv) = below.ply() {
                batch.note_played(below.mover(), mv);
            }
            let node = self.root.descendant_mut(&path[..depth]).ok_or_else(lost)?;
            node.amaf_update(&batch.trajectories);
        }
        Ok(())
    }

    /// Commit `ply`: its subtree becomes the new tree, statistics intact, and
    /// every other subtree is released.
    ///
    /// Works for either side's moves. If the root was never expanded, `ply`
    /// is checked against the legal moves and a fresh root is built.
    pub fn advance(&mut self, ply: &G::Move) -> Result<(), MctsError> {
        if self.root.is_expanded() {
            let idx = self
                .root
                .children()
                .iter()
                .position(|child| child.ply() == Some(*ply))
                .ok_or_else(|| MctsError::IllegalMove(ply.to_string()))?;
            let mut child = self
                .root
                .take_child(idx)
                .ok_or_else(|| MctsError::InvalidState("child vanished while re-rooting".into()))?;
            child.make_root();
            self.root = child;
        } else {
            if !self.root.board().legal_moves().contains(ply) {
                return Err(MctsError::IllegalMove(ply.to_string()));
            }
            let board = self.root.board().apply(ply);
            self.root = Node::new_root(board);
        }

        self.params.exploration = exploration_constant(
            &self.config.exploration_tiers,
            self.root.board().distance_remaining(),
        );
        debug!(
            %ply,
            kept_sims = self.root.sim_cnt(),
            exploration = self.params.exploration,
            "advanced root"
        );
        Ok(())
    }

    /// Throw the tree away and start over from `board`.
    pub fn reset(&mut self, board: G) {
        self.params.exploration =
            exploration_constant(&self.config.exploration_tiers, board.distance_remaining());
        self.root = Node::new_root(board);
    }

    /// Count nodes, leaves and depths of the current tree.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(node.depth());
            if node.is_expanded() {
                stack.extend(node.children());
            } else {
                stats.leaf_count += 1;
                stats.total_leaf_depth += node.depth() as u64;
            }
        }
        stats
    }

    /// Log the statistics of every root child.
    pub fn dump_children(&self) {
        for child in self.root.children() {
            debug!("{child}");
        }
    }
}
