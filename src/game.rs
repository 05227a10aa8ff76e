//! The game collaborator consumed by the search.
//!
//! The tree search never looks inside a position or a move. Everything it
//! needs (successors, legal moves, terminal detection, the winner, random
//! playouts and a progress measure) comes through [`GameState`].

use std::fmt;
use std::hash::Hash;

use crate::playout::play_random_till_end;

/// One of the two sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Blue => write!(f, "blue"),
        }
    }
}

/// Outcome of one random playout together with the trajectory that led to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rollout<M> {
    /// Winning side, `None` for a draw.
    pub winner: Option<Color>,
    /// Every move played during the playout, tagged with the side that played it.
    pub plies: Vec<(Color, M)>,
}

/// A two-player, perfect-information game position.
///
/// Implementations must be cheap to clone: every tree node stores its own
/// snapshot and every playout works on a private copy.
pub trait GameState: Clone + Send + Sync {
    /// A candidate action. Moves are compared by value, so the same move
    /// reached through different tree paths is one AMAF key.
    type Move: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync;

    /// Side to play next.
    fn to_move(&self) -> Color;

    /// Successor position. The turn indicator is flipped.
    ///
    /// `mv` must come from [`legal_moves`](Self::legal_moves) of `self`.
    fn apply(&self, mv: &Self::Move) -> Self;

    /// Legal moves in a fixed generation order. Empty iff the position is terminal.
    fn legal_moves(&self) -> Vec<Self::Move>;

    fn is_terminal(&self) -> bool;

    /// Winner of a terminal position, `None` for a draw.
    fn winner(&self) -> Option<Color>;

    /// Monotone measure of how far the game is from being over. Used to pick
    /// the exploration constant.
    fn distance_remaining(&self) -> u32;

    /// Play uniformly random moves until the game ends.
    ///
    /// Only `rng` is consumed; no process-wide random state is touched.
    fn random_rollout(&self, rng: &mut fastrand::Rng) -> Rollout<Self::Move> {
        play_random_till_end(self, rng)
    }
}
