//! Scoring formulas shared by selection and the final move choice.
//!
//! A node's UCB-RAVE score blends its direct average with its AMAF average
//! and adds the usual UCB1 exploration bonus:
//!
//! ```text
//! ucb = (1 - β) · avg + β · amaf_avg + c · sqrt(ln(parent_sims) / sims)
//! β   = amaf_sims / (amaf_sims + sims + k · sims · amaf_sims)
//! ```
//!
//! `k` is the RAVE decay rate. β falls toward zero as direct samples
//! accumulate, and is zero while a node has no AMAF samples.

use crate::config::ExplorationTier;

/// Parameters of the score that do not live in the node itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    pub exploration: f64,
    pub rave_decay_rate: f64,
}

/// Pick the exploration constant for a root at `distance` from the end.
///
/// Tiers are tried in order; the last one is used when none matches.
pub fn exploration_constant(tiers: &[ExplorationTier], distance: u32) -> f64 {
    tiers
        .iter()
        .find(|tier| distance > tier.above)
        .or(tiers.last())
        .map_or(0.0, |tier| tier.constant)
}

/// `(wins - losses) / sims`, or 0 without samples.
#[inline]
pub fn average_score(sims: u64, wins: u64, losses: u64) -> f64 {
    if sims == 0 {
        return 0.0;
    }
    (wins as f64 - losses as f64) / sims as f64
}

/// Weight of the AMAF average in the blended score.
#[inline]
pub fn rave_beta(sims: u64, amaf_sims: u64, decay_rate: f64) -> f64 {
    if amaf_sims == 0 {
        return 0.0;
    }
    let n = sims as f64;
    let a = amaf_sims as f64;
    a / (a + n + decay_rate * n * a)
}

/// `sqrt(ln(sims))`, cached on a parent so children can share it.
#[inline]
pub fn sqrt_log(sims: u64) -> f64 {
    if sims == 0 {
        return 0.0;
    }
    (sims as f64).ln().sqrt()
}
