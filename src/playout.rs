//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves until the game ends and
//! reports the winner together with every move played on the way, which the
//! tree uses for its AMAF statistics.
//!
//! Each playout draws from the `fastrand::Rng` it is handed. The search gives
//! every playout its own generator seeded up front, so concurrent playouts
//! never share random state and a seeded search replays identically.

use crate::constants::MAX_ROLLOUT_PLIES;
use crate::game::{GameState, Rollout};

/// Perform a random playout from `state`.
///
/// Stops at a terminal position or after [`MAX_ROLLOUT_PLIES`] moves; the
/// latter is reported as a draw.
pub fn play_random_till_end<G: GameState>(state: &G, rng: &mut fastrand::Rng) -> Rollout<G::Move> {
    let mut pos = state.clone();
    let mut plies = Vec::new();

    while !pos.is_terminal() {
        if plies.len() >= MAX_ROLLOUT_PLIES {
            return Rollout {
                winner: None,
                plies,
            };
        }

        let moves = pos.legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.usize(..moves.len())];
        plies.push((pos.to_move(), mv));
        pos = pos.apply(&mv);
    }

    Rollout {
        winner: pos.winner(),
        plies,
    }
}
