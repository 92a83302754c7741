//! Roulette model
//!
//! Single-zero wheel with color bets only. The draw picks a wheel slot
//! uniformly, so every number is equally likely regardless of where it
//! sits on the physical layout.

use serde::Serialize;

use crate::config::RouletteConfig;
use crate::rng::Dice;

/// European wheel, clockwise from the zero pocket.
pub const WHEEL_LAYOUT: [u8; 37] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

/// The eighteen red numbers of the standard layout.
const RED_NUMBERS: [u8; 18] = [
    32, 19, 21, 25, 34, 27, 36, 30, 23, 5, 16, 1, 14, 9, 18, 7, 12, 3,
];

/// Bettable pocket colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Black => "black",
            Color::Green => "green",
        };
        write!(f, "{}", name)
    }
}

/// Color of a pocket number.
pub fn color_of(number: u8) -> Color {
    if number == 0 {
        Color::Green
    } else if RED_NUMBERS.contains(&number) {
        Color::Red
    } else {
        Color::Black
    }
}

/// Parse a player's color pick. Anything that is not exactly "black"
/// or "green" plays as red.
pub fn parse_pick(raw: &str) -> Color {
    match raw {
        "black" => Color::Black,
        "green" => Color::Green,
        _ => Color::Red,
    }
}

/// Result of a single wheel spin.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouletteOutcome {
    /// Index into the wheel layout the ball landed on.
    pub slot: u8,
    /// Pocket number at that slot.
    pub number: u8,
    pub color: Color,
    pub payout: u64,
}

/// Spin the wheel against a color pick.
pub fn spin(config: &RouletteConfig, pick: Color, dice: &mut impl Dice) -> RouletteOutcome {
    let slot = dice.uniform_int(WHEEL_LAYOUT.len() as u32) as u8;
    let number = WHEEL_LAYOUT[slot as usize];
    let color = color_of(number);

    let payout = if color == pick {
        match color {
            Color::Green => config.green_payout,
            Color::Red | Color::Black => config.color_payout,
        }
    } else {
        0
    };

    RouletteOutcome {
        slot,
        number,
        color,
        payout,
    }
}
