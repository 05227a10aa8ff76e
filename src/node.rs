//! Search tree nodes.
//!
//! Each node owns the position reached by its move and the children created
//! when it is expanded. Two statistic tracks are kept side by side:
//!
//! - **direct**: playouts that started at this node or below it
//! - **AMAF**: playouts started elsewhere under an ancestor that happened to
//!   play this node's move, by the same side, somewhere along the way
//!
//! Wins and losses are counted for the side that played the node's move
//! (its *mover*), so a parent simply maximizes over its children. Draws only
//! increase the sample counts.
//!
//! Nodes do not point back at their parent. The controller walks the tree
//! with a path of child indices from the root, which plays the role of the
//! parent chain and never keeps a node alive.

use std::collections::HashSet;
use std::fmt;

use rayon::prelude::*;

use crate::game::{Color, GameState, Rollout};
use crate::mcts::MctsError;
use crate::ucb::{average_score, rave_beta, sqrt_log, ScoreParams};

/// Playout outcomes by winning side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub sims: u64,
    pub red_wins: u64,
    pub blue_wins: u64,
}

impl Tally {
    /// Count `count` playouts won by `winner` (`None` for draws).
    pub fn record(&mut self, winner: Option<Color>, count: u64) {
        self.sims += count;
        match winner {
            Some(Color::Red) => self.red_wins += count,
            Some(Color::Blue) => self.blue_wins += count,
            None => {}
        }
    }

    #[inline]
    pub fn wins_for(&self, color: Color) -> u64 {
        match color {
            Color::Red => self.red_wins,
            Color::Blue => self.blue_wins,
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        self.sims += other.sims;
        self.red_wins += other.red_wins;
        self.blue_wins += other.blue_wins;
    }
}

/// The moves seen after some tree node on the way to one playout result.
#[derive(Debug, Clone)]
pub(crate) struct Trajectory<M> {
    pub(crate) winner: Option<Color>,
    /// Number of identical outcomes this trajectory stands for.
    pub(crate) weight: u64,
    pub(crate) played: HashSet<(Color, M)>,
}

/// Everything one expand-and-simulate step produced.
///
/// The controller folds the tally into every ancestor's direct statistics
/// and replays the trajectories against the ancestors' children for AMAF.
#[derive(Debug, Clone)]
pub struct SimBatch<M> {
    tally: Tally,
    pub(crate) trajectories: Vec<Trajectory<M>>,
}

impl<M> Default for SimBatch<M> {
    fn default() -> Self {
        Self {
            tally: Tally::default(),
            trajectories: Vec::new(),
        }
    }
}

impl<M: Copy + Eq + std::hash::Hash> SimBatch<M> {
    /// A batch standing for `count` visits of a finished game.
    pub(crate) fn terminal(winner: Option<Color>, count: u64) -> Self {
        let mut tally = Tally::default();
        tally.record(winner, count);
        Self {
            tally,
            trajectories: vec![Trajectory {
                winner,
                weight: count,
                played: HashSet::new(),
            }],
        }
    }

    /// Extend every trajectory with a tree move played above the batch's origin.
    pub(crate) fn note_played(&mut self, color: Color, mv: M) {
        for trajectory in &mut self.trajectories {
            trajectory.played.insert((color, mv));
        }
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn is_empty(&self) -> bool {
        self.tally.sims == 0
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node<G: GameState> {
    board: G,
    ply: Option<G::Move>,
    mover: Color,
    depth: u32,
    children: Vec<Node<G>>,

    sim_cnt: u64,
    win_cnt: u64,
    lose_cnt: u64,
    amaf_sim_cnt: u64,
    amaf_win_cnt: u64,
    amaf_lose_cnt: u64,

    // Derived from the counters by `update_composite_stat`.
    avg_score: f64,
    sqrt_sim_cnt: f64,
    sqrt_log_sim_cnt: f64,
    amaf_avg_score: f64,
}

impl<G: GameState> Node<G> {
    /// Root node for `board`. Its mover is the side that is not to move.
    pub fn new_root(board: G) -> Self {
        let mover = board.to_move().opponent();
        Self::with_parts(board, None, mover, 0)
    }

    /// Child of `parent` reached by `ply`; `board` is the resulting position.
    pub fn new_child(board: G, ply: G::Move, parent: &Node<G>) -> Self {
        Self::with_parts(board, Some(ply), parent.board.to_move(), parent.depth + 1)
    }

    fn with_parts(board: G, ply: Option<G::Move>, mover: Color, depth: u32) -> Self {
        Self {
            board,
            ply,
            mover,
            depth,
            children: Vec::new(),
            sim_cnt: 0,
            win_cnt: 0,
            lose_cnt: 0,
            amaf_sim_cnt: 0,
            amaf_win_cnt: 0,
            amaf_lose_cnt: 0,
            avg_score: 0.0,
            sqrt_sim_cnt: 0.0,
            sqrt_log_sim_cnt: 0.0,
            amaf_avg_score: 0.0,
        }
    }

    pub fn board(&self) -> &G {
        &self.board
    }

    /// The move that produced this node; `None` for a root built from a board.
    pub fn ply(&self) -> Option<G::Move> {
        self.ply
    }

    /// Side that played [`ply`](Self::ply).
    pub fn mover(&self) -> Color {
        self.mover
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn children(&self) -> &[Node<G>] {
        &self.children
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    pub fn sim_cnt(&self) -> u64 {
        self.sim_cnt
    }

    pub fn win_cnt(&self) -> u64 {
        self.win_cnt
    }

    pub fn lose_cnt(&self) -> u64 {
        self.lose_cnt
    }

    pub fn amaf_sim_cnt(&self) -> u64 {
        self.amaf_sim_cnt
    }

    pub fn amaf_win_cnt(&self) -> u64 {
        self.amaf_win_cnt
    }

    pub fn amaf_lose_cnt(&self) -> u64 {
        self.amaf_lose_cnt
    }

    /// Direct average score for the mover, in `[-1, 1]`.
    pub fn avg_score(&self) -> f64 {
        self.avg_score
    }

    /// AMAF average score for the mover, in `[-1, 1]`.
    pub fn amaf_avg_score(&self) -> f64 {
        self.amaf_avg_score
    }

    /// `sqrt(ln(sim_cnt))`, shared by all children's exploration terms.
    pub fn sqrt_log_sim_cnt(&self) -> f64 {
        self.sqrt_log_sim_cnt
    }

    /// Follow a path of child indices from this node.
    pub fn descendant(&self, path: &[usize]) -> Option<&Node<G>> {
        path.iter().try_fold(self, |node, &idx| node.children.get(idx))
    }

    pub(crate) fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node<G>> {
        path.iter()
            .try_fold(self, |node, &idx| node.children.get_mut(idx))
    }

    /// UCB-RAVE score of this node under a parent whose cached
    /// `sqrt(ln(sim_cnt))` is `parent_sqrt_log_sim_cnt`.
    ///
    /// Unvisited nodes score `+inf`, so every sibling is tried once before
    /// any is revisited.
    pub fn ucb(&self, parent_sqrt_log_sim_cnt: f64, params: ScoreParams) -> f64 {
        if self.sim_cnt == 0 {
            return f64::INFINITY;
        }
        let beta = rave_beta(self.sim_cnt, self.amaf_sim_cnt, params.rave_decay_rate);
        (1.0 - beta) * self.avg_score
            + beta * self.amaf_avg_score
            + params.exploration * parent_sqrt_log_sim_cnt / self.sqrt_sim_cnt
    }

    /// Create one child per legal move, in generation order.
    ///
    /// Does nothing on a terminal position or a node that already has children.
    pub fn expand_children(&mut self) {
        if self.is_expanded() {
            return;
        }
        let moves = self.board.legal_moves();
        let mut children = Vec::with_capacity(moves.len());
        for mv in moves {
            let board = self.board.apply(&mv);
            children.push(Node::new_child(board, mv, self));
        }
        self.children = children;
    }

    /// Run `trial_count` random playouts from every child.
    ///
    /// Each outcome is added to the child's direct statistics and, for every
    /// child whose move the same side played during that playout, to the
    /// AMAF statistics. The returned batch carries the outcomes up the tree.
    ///
    /// Playouts run on the current rayon pool. Every playout gets its own
    /// generator seeded from `rng`, and counters are only touched once the
    /// whole batch is back.
    pub fn run_sim_on_children(
        &mut self,
        trial_count: u32,
        rng: &mut fastrand::Rng,
    ) -> Result<SimBatch<G::Move>, MctsError> {
        if trial_count == 0 {
            return Err(MctsError::InvalidArgument(
                "trial count must be positive".into(),
            ));
        }

        let mut jobs = Vec::with_capacity(self.children.len() * trial_count as usize);
        for idx in 0..self.children.len() {
            for _ in 0..trial_count {
                jobs.push((idx, rng.u64(..)));
            }
        }

        let children = &self.children;
        let rollouts: Vec<(usize, Rollout<G::Move>)> = jobs
            .into_par_iter()
            .map(|(idx, seed)| {
                let mut rng = fastrand::Rng::with_seed(seed);
                (idx, children[idx].board.random_rollout(&mut rng))
            })
            .collect();

        let mut batch = SimBatch::default();
        for (idx, rollout) in rollouts {
            let child = &mut self.children[idx];
            let mut played: HashSet<(Color, G::Move)> = rollout.plies.into_iter().collect();
            if let Some(mv) = child.ply {
                played.insert((child.mover, mv));
            }

            let mut tally = Tally::default();
            tally.record(rollout.winner, 1);
            child.add_actual_sim_res(&tally);
            batch.tally.merge(&tally);
            batch.trajectories.push(Trajectory {
                winner: rollout.winner,
                weight: 1,
                played,
            });
        }

        for child in &mut self.children {
            child.update_composite_stat();
        }
        self.amaf_update(&batch.trajectories);
        Ok(batch)
    }

    /// Expand, then simulate every new child. No-op on a node that already
    /// has children.
    pub fn expand_and_run_sim(
        &mut self,
        trial_count: u32,
        rng: &mut fastrand::Rng,
    ) -> Result<SimBatch<G::Move>, MctsError> {
        if trial_count == 0 {
            return Err(MctsError::InvalidArgument(
                "trial count must be positive".into(),
            ));
        }
        if self.is_expanded() {
            return Ok(SimBatch::default());
        }
        self.expand_children();
        self.run_sim_on_children(trial_count, rng)
    }

    /// Index of the child with the largest UCB score. Ties go to the child
    /// generated first.
    pub fn child_with_largest_ucb(&self, params: ScoreParams) -> Result<usize, MctsError> {
        self.argmax_child(|child| child.ucb(self.sqrt_log_sim_cnt, params))
    }

    /// Index of the child with the best direct average score. Ties go to the
    /// child generated first.
    pub fn child_with_best_avg_score(&self) -> Result<usize, MctsError> {
        self.argmax_child(|child| child.avg_score)
    }

    fn argmax_child(&self, score: impl Fn(&Node<G>) -> f64) -> Result<usize, MctsError> {
        if self.children.is_empty() {
            return Err(MctsError::InvalidState(
                "node has no children to choose from".into(),
            ));
        }
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, child) in self.children.iter().enumerate() {
            let s = score(child);
            if s > best_score {
                best = idx;
                best_score = s;
            }
        }
        Ok(best)
    }

    /// Drop the whole subtree below this node.
    pub fn delete_children(&mut self) {
        self.children = Vec::new();
    }

    /// Detach child `idx`, dropping its siblings.
    pub(crate) fn take_child(&mut self, idx: usize) -> Option<Node<G>> {
        let mut children = std::mem::take(&mut self.children);
        (idx < children.len()).then(|| children.swap_remove(idx))
    }

    /// Renumber depths so this node sits at depth 0.
    pub(crate) fn make_root(&mut self) {
        let offset = self.depth;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.depth -= offset;
            stack.extend(node.children.iter_mut());
        }
    }

    /// Fold playouts rooted at (or below) this node into the direct counters.
    pub(crate) fn add_actual_sim_res(&mut self, tally: &Tally) {
        self.sim_cnt += tally.sims;
        self.win_cnt += tally.wins_for(self.mover);
        self.lose_cnt += tally.wins_for(self.mover.opponent());
    }

    /// Fold `weight` AMAF samples won by `winner` into the AMAF counters.
    pub(crate) fn add_virtual_sim_res(&mut self, weight: u64, winner: Option<Color>) {
        self.amaf_sim_cnt += weight;
        match winner {
            Some(color) if color == self.mover => self.amaf_win_cnt += weight,
            Some(_) => self.amaf_lose_cnt += weight,
            None => {}
        }
    }

    /// Credit every child whose move shows up, for the child's mover, in a trajectory.
    pub(crate) fn amaf_update(&mut self, trajectories: &[Trajectory<G::Move>]) {
        for child in &mut self.children {
            let Some(mv) = child.ply else { continue };
            let key = (child.mover, mv);
            for trajectory in trajectories {
                if trajectory.played.contains(&key) {
                    child.add_virtual_sim_res(trajectory.weight, trajectory.winner);
                }
            }
            child.update_composite_stat();
        }
    }

    /// Recompute the cached scores from the raw counters.
    pub(crate) fn update_composite_stat(&mut self) {
        self.avg_score = average_score(self.sim_cnt, self.win_cnt, self.lose_cnt);
        self.sqrt_sim_cnt = (self.sim_cnt as f64).sqrt();
        self.sqrt_log_sim_cnt = sqrt_log(self.sim_cnt);
        self.amaf_avg_score = average_score(self.amaf_sim_cnt, self.amaf_win_cnt, self.amaf_lose_cnt);
    }
}

impl<G: GameState> fmt::Display for Node<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ply {
            Some(ply) => write!(f, "{ply}")?,
            None => write!(f, "root")?,
        }
        write!(
            f,
            " depth={} sims={} wins={} loses={} avg={:.3} amaf={}/{}/{} amaf_avg={:.3}",
            self.depth,
            self.sim_cnt,
            self.win_cnt,
            self.lose_cnt,
            self.avg_score,
            self.amaf_sim_cnt,
            self.amaf_win_cnt,
            self.amaf_lose_cnt,
            self.amaf_avg_score,
        )
    }
}
