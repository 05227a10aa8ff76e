//! Constants for board geometry, search parameters and protocol defaults.
//!
//! Everything here is a compile-time default. The search reads its tunables
//! through [`SearchConfig`](crate::config::SearchConfig), which starts from
//! these values and can be overridden per controller (scaled-down test
//! configurations, CLI flags).

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of board rows.
pub const N_ROW: usize = 6;

/// Number of board columns.
pub const N_COL: usize = 7;

/// Cubes per side at the start of a game (numbered `0..N_CUBES`).
pub const N_CUBES: u8 = 6;

/// Corner Red is racing toward.
pub const RED_GOAL: (usize, usize) = (N_ROW - 1, N_COL - 1);

/// Corner Blue is racing toward.
pub const BLUE_GOAL: (usize, usize) = (0, 0);

/// Upper bound on the length of a random playout. A playout that reaches it
/// is scored as a draw.
pub const MAX_ROLLOUT_PLIES: usize = 1000;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Exploration constant while the total distance is above [`TOTAL_DISTANCE_THRES1`].
pub const OPENING_EXPLORATION_CONST: f64 = 5.0;

/// Exploration constant while the total distance is above [`TOTAL_DISTANCE_THRES2`].
pub const MIDDLE_EXPLORATION_CONST: f64 = 0.5;

/// Exploration constant for the rest of the game.
pub const ENDING_EXPLORATION_CONST: f64 = 0.1;

/// Opening/middle game boundary on the total distance metric.
pub const TOTAL_DISTANCE_THRES1: u32 = 105;

/// Middle/end game boundary on the total distance metric.
pub const TOTAL_DISTANCE_THRES2: u32 = 80;

/// Controls how fast AMAF influence fades as direct samples accumulate.
pub const RAVE_RATIO_DECAY_RATE: f64 = 0.0001;

/// Random playouts run for every child of a freshly expanded node.
pub const N_TRIAL_PER_SIM: u32 = 100;

// =============================================================================
// Agent Defaults
// =============================================================================

/// Thinking time per move when none is given.
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 1.0;
