//! Blackjack model
//!
//! Single-deck, single-hand blackjack against a dealer who stands on
//! 17. Aces count 11 until the hand would bust, then drop to 1 one at
//! a time.

use serde::{Serialize, Serializer};

use crate::rng::Dice;

const RANKS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];
const SUITS: [char; 4] = ['♠', '♥', '♦', '♣'];

pub const DECK_SIZE: usize = 52;

/// A playing card, packed as suit * 13 + rank with rank 0 the ace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card(pub u8);

impl Card {
    pub fn rank(self) -> u8 {
        self.0 % 13
    }

    pub fn suit(self) -> u8 {
        self.0 / 13
    }

    pub fn is_ace(self) -> bool {
        self.rank() == 0
    }

    /// Blackjack value with the ace high; [`hand_value`] demotes aces.
    pub fn value(self) -> u8 {
        match self.rank() {
            0 => 11,
            r @ 1..=9 => r + 1,
            _ => 10,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            RANKS[self.rank() as usize],
            SUITS[self.suit() as usize]
        )
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The 52 cards in suit-major order.
pub fn fresh_deck() -> Vec<Card> {
    (0..DECK_SIZE as u8).map(Card).collect()
}

/// Best blackjack total for a hand: aces start at 11 and drop to 1
/// while the hand would bust.
pub fn hand_value(cards: &[Card]) -> u8 {
    let mut total: u32 = cards.iter().map(|c| c.value() as u32).sum();
    let mut aces = cards.iter().filter(|c| c.is_ace()).count();
    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }
    total as u8
}

/// One blackjack round for one player.
#[derive(Debug, Clone)]
pub struct BlackjackRound {
    deck: Vec<Card>,
    player: Vec<Card>,
    dealer: Vec<Card>,
    bet: u64,
    active: bool,
}

impl BlackjackRound {
    /// Shuffle a fresh deck and deal two cards each from the top of the
    /// stack. Both hands always start with exactly two cards.
    pub fn deal(bet: u64, dice: &mut impl Dice) -> Self {
        let mut deck = fresh_deck();
        dice.shuffle(&mut deck);

        let mut draw = || deck.pop().unwrap_or(Card(0));
        let player = vec![draw(), draw()];
        let dealer = vec![draw(), draw()];

        Self {
            deck,
            player,
            dealer,
            bet,
            active: true,
        }
    }

    /// Draw one card for the player. Returns the new total; a bust ends
    /// the round.
    pub fn hit(&mut self) -> u8 {
        // one round can never exhaust a 52-card deck
        if let Some(card) = self.deck.pop() {
            self.player.push(card);
        }
        let total = hand_value(&self.player);
        if total > 21 {
            self.active = false;
        }
        total
    }

    /// Player stands: the dealer draws to 17, then the round settles.
    /// Returns the payout owed for the bet.
    pub fn stand(&mut self) -> u64 {
        while hand_value(&self.dealer) < 17 {
            match self.deck.pop() {
                Some(card) => self.dealer.push(card),
                None => break,
            }
        }
        self.active = false;

        let player = hand_value(&self.player);
        let dealer = hand_value(&self.dealer);

        if player > 21 {
            0
        } else if dealer > 21 || player > dealer {
            self.bet * 2
        } else if player == dealer {
            self.bet
        } else {
            0
        }
    }

    pub fn player_hand(&self) -> &[Card] {
        &self.player
    }

    pub fn dealer_hand(&self) -> &[Card] {
        &self.dealer
    }

    /// The one dealer card shown while the round is live.
    pub fn dealer_upcard(&self) -> Card {
        self.dealer[0]
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Wire view of a round. While the round is live only the dealer's
/// first card is exposed; settlement shows the full dealer hand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackjackView {
    pub player_hand: Vec<Card>,
    pub player_total: u8,
    pub dealer_hand: Vec<Card>,
    pub dealer_total: u8,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<u64>,
}

impl BlackjackView {
    pub fn active(round: &BlackjackRound) -> Self {
        let upcard = round.dealer_upcard();
        Self {
            player_hand: round.player_hand().to_vec(),
            player_total: hand_value(round.player_hand()),
            dealer_hand: vec![upcard],
            dealer_total: upcard.value(),
            active: true,
            payout: None,
        }
    }

    pub fn settled(round: &BlackjackRound, payout: u64) -> Self {
        Self {
            player_hand: round.player_hand().to_vec(),
            player_total: hand_value(round.player_hand()),
            dealer_hand: round.dealer_hand().to_vec(),
            dealer_total: hand_value(round.dealer_hand()),
            active: false,
            payout: Some(payout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::HashDice;
    use std::collections::HashSet;

    fn card(name: &str) -> Card {
        // spade of the named rank, for readable hand fixtures
        let rank = RANKS
            .iter()
            .position(|r| *r == name)
            .expect("known rank") as u8;
        Card(rank)
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card(0).to_string(), "A♠");
        assert_eq!(Card(12).to_string(), "K♠");
        assert_eq!(Card(13).to_string(), "A♥");
        assert_eq!(Card(51).to_string(), "K♣");
    }

    #[test]
    fn test_card_serializes_as_display_string() {
        let json = serde_json::to_string(&Card(0)).expect("serialize");
        assert_eq!(json, "\"A♠\"");
    }

    #[test]
    fn test_hand_values() {
        assert_eq!(hand_value(&[card("A"), card("K")]), 21);
        assert_eq!(hand_value(&[card("A"), card("A")]), 12);
        assert_eq!(hand_value(&[card("A"), card("A"), card("9")]), 21);
        assert_eq!(hand_value(&[card("10"), card("J"), card("6")]), 26);
        assert_eq!(hand_value(&[card("A"), card("5"), card("9")]), 15);
        assert_eq!(hand_value(&[]), 0);
    }

    #[test]
    fn test_deal_draws_four_unique_cards() {
        let mut dice = HashDice::from_seed([21u8; 32]);
        let round = BlackjackRound::deal(200, &mut dice);

        assert_eq!(round.player_hand().len(), 2);
        assert_eq!(round.dealer_hand().len(), 2);
        assert!(round.is_active());

        let mut seen: HashSet<u8> = HashSet::new();
        for c in round.player_hand().iter().chain(round.dealer_hand()) {
            assert!(seen.insert(c.0), "duplicate card dealt");
        }
    }

    #[test]
    fn test_deal_is_deterministic_per_seed() {
        let mut a = HashDice::from_seed([22u8; 32]);
        let mut b = HashDice::from_seed([22u8; 32]);
        let first = BlackjackRound::deal(200, &mut a);
        let second = BlackjackRound::deal(200, &mut b);
        assert_eq!(first.player_hand(), second.player_hand());
        assert_eq!(first.dealer_hand(), second.dealer_hand());
    }

    #[test]
    fn test_hit_until_bust_ends_the_round() {
        let mut dice = HashDice::from_seed([23u8; 32]);
        let mut round = BlackjackRound::deal(200, &mut dice);

        let mut total = hand_value(round.player_hand());
        while total <= 21 {
            total = round.hit();
        }
        assert!(total > 21);
        assert!(!round.is_active());
        assert_eq!(round.stand(), 0, "a busted hand never pays");
    }

    #[test]
    fn test_stand_draws_dealer_to_seventeen() {
        for seed in 0..20u8 {
            let mut dice = HashDice::from_seed([seed; 32]);
            let mut round = BlackjackRound::deal(200, &mut dice);
            round.stand();
            assert!(hand_value(round.dealer_hand()) >= 17);
            assert!(!round.is_active());
        }
    }

    #[test]
    fn test_settlement_payout_branches() {
        // fabricate settled hands directly to pin the payout table
        let mut round = BlackjackRound {
            deck: Vec::new(),
            player: vec![card("K"), card("Q")],   // 20
            dealer: vec![card("10"), card("7")],  // 17
            bet: 200,
            active: true,
        };
        assert_eq!(round.stand(), 400, "win pays twice the bet");

        let mut round = BlackjackRound {
            deck: Vec::new(),
            player: vec![card("10"), card("7")],
            dealer: vec![card("K"), card("7")],
            bet: 200,
            active: true,
        };
        assert_eq!(round.stand(), 200, "push returns the bet");

        let mut round = BlackjackRound {
            deck: Vec::new(),
            player: vec![card("10"), card("7")],
            dealer: vec![card("K"), card("Q")],
            bet: 200,
            active: true,
        };
        assert_eq!(round.stand(), 0, "loss pays nothing");

        let mut round = BlackjackRound {
            deck: vec![card("9")],
            player: vec![card("10"), card("6")],  // 16
            dealer: vec![card("K"), card("6")],   // 16, must draw and bust
            bet: 200,
            active: true,
        };
        assert_eq!(round.stand(), 400, "dealer bust pays twice the bet");
    }

    #[test]
    fn test_active_view_hides_the_hole_card() {
        let mut dice = HashDice::from_seed([24u8; 32]);
        let round = BlackjackRound::deal(200, &mut dice);

        let view = BlackjackView::active(&round);
        assert_eq!(view.dealer_hand.len(), 1);
        assert_eq!(view.dealer_hand[0], round.dealer_upcard());
        assert_eq!(view.dealer_total, round.dealer_upcard().value());
        assert!(view.active);
        assert!(view.payout.is_none());
    }

    #[test]
    fn test_settled_view_discloses_everything() {
        let mut dice = HashDice::from_seed([25u8; 32]);
        let mut round = BlackjackRound::deal(200, &mut dice);
        let payout = round.stand();

        let view = BlackjackView::settled(&round, payout);
        assert_eq!(view.dealer_hand.len(), round.dealer_hand().len());
        assert!(view.dealer_hand.len() >= 2);
        assert!(!view.active);
        assert_eq!(view.payout, Some(payout));
    }
}
