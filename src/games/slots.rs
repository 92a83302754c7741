//! Slot machine model
//!
//! Two-tier payout table where the small-win probability is derived
//! from the configured target return, never stored.

use serde::Serialize;

use crate::config::SlotsConfig;
use crate::rng::Dice;

/// Which payout tier a spin landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinTier {
    Big,
    Small,
    Miss,
}

/// Result of a single spin.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    pub tier: SpinTier,
    pub payout: u64,
}

/// Probability of the small win, solved from the target return:
///
///   rtp * cost = p_big * big_payout + p_small * small_payout
///
/// The result is clamped into [0, 1 - big_probability] so degenerate
/// payout tables still yield a playable machine.
pub fn derived_small_probability(config: &SlotsConfig) -> f64 {
    let expected_return = config.cost as f64 * config.rtp;
    let big_share = config.big_payout as f64 * config.big_probability;
    let raw = (expected_return - big_share) / config.small_payout as f64;
    clamp_probability(raw, 1.0 - config.big_probability)
}

/// Clamp a raw probability into [0, ceiling].
fn clamp_probability(p: f64, ceiling: f64) -> f64 {
    p.max(0.0).min(ceiling)
}

/// Spin the machine. A single uniform draw picks the tier: the lowest
/// band is the big win, the next band the small win, the rest a miss.
pub fn spin(config: &SlotsConfig, dice: &mut impl Dice) -> SpinOutcome {
    let p_big = config.big_probability;
    let p_small = derived_small_probability(config);

    let roll = dice.uniform();
    let (tier, payout) = if roll < p_big {
        (SpinTier::Big, config.big_payout)
    } else if roll < p_big + p_small {
        (SpinTier::Small, config.small_payout)
    } else {
        (SpinTier::Miss, 0)
    };

    SpinOutcome { tier, payout }
}
