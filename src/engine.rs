//! Action engine
//!
//! Single entry point for every wager. An action locks the player's
//! session, passes the burst guard, loads the balance from the ledger,
//! plays the game, and writes the new balance back before any round
//! state is committed. A failed action never moves money and never
//! mutates the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{LuckboxConfig, MinesConfig};
use crate::errors::{EngineError, EngineResult};
use crate::games::blackjack::{BlackjackRound, BlackjackView};
use crate::games::mines::{self, MinesRound, MinesView, RevealOutcome};
use crate::games::roulette::{self, RouletteOutcome};
use crate::games::slots::{self, SpinOutcome};
use crate::games::{GameError, GameKind};
use crate::ledger::{Ledger, Player};
use crate::metrics::EngineMetrics;
use crate::rng::HashDice;
use crate::session::{PlayerSession, SessionTable};

/// One action as it arrives on the wire. Numbers ride as signed values
/// so out-of-range input reaches validation instead of failing to
/// parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionRequest {
    pub player_name: String,
    pub game: String,
    pub action: String,
    pub pick: Option<String>,
    pub bet: Option<i64>,
    pub mine_count: Option<i64>,
    pub cell_index: Option<i64>,
}

/// Reply for a successful action: the post-action balance plus either
/// a settled result or an ongoing-round state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReply {
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GamePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<GamePayload>,
}

impl ActionReply {
    fn result(balance: u64, payload: GamePayload) -> Self {
        Self {
            balance,
            result: Some(payload),
            state: None,
        }
    }

    fn state(balance: u64, payload: GamePayload) -> Self {
        Self {
            balance,
            result: None,
            state: Some(payload),
        }
    }
}

/// Game-specific payload of a reply.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GamePayload {
    Slots(SpinOutcome),
    Roulette(RouletteOutcome),
    Blackjack(BlackjackView),
    Mines(MinesView),
}

/// The wagering engine. Shared across all request handlers.
pub struct GameEngine {
    config: LuckboxConfig,
    ledger: Arc<dyn Ledger>,
    sessions: SessionTable,
    metrics: Arc<EngineMetrics>,
}

impl GameEngine {
    pub fn new(config: LuckboxConfig, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            config,
            ledger,
            sessions: SessionTable::new(),
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn config(&self) -> &LuckboxConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Periodically drop sessions that have gone idle.
    pub fn spawn_session_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(engine.config.sessions.sweep_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = engine
                    .sessions
                    .evict_idle(engine.config.sessions.idle_timeout());
                if evicted > 0 {
                    info!(
                        "Session sweep evicted {} idle sessions ({} live)",
                        evicted,
                        engine.sessions.len()
                    );
                }
            }
        })
    }

    /// Play one action to completion.
    pub async fn handle_action(&self, request: &ActionRequest) -> EngineResult<ActionReply> {
        let started = Instant::now();
        let outcome = self.dispatch(request).await;

        match &outcome {
            Ok(reply) => {
                self.metrics.record_action(started.elapsed()).await;
                debug!(
                    "Action {} {} for {} settled at balance {}",
                    request.game, request.action, request.player_name, reply.balance
                );
            }
            Err(err) => {
                self.metrics.record_rejection();
                match err {
                    EngineError::RateLimited => self.metrics.record_rate_limited(),
                    EngineError::LedgerUnavailable(_) => {
                        self.metrics.record_ledger_failure();
                        error!(
                            "Action {} {} for {} failed at the ledger: {}",
                            request.game, request.action, request.player_name, err
                        );
                    }
                    _ => {}
                }
                debug!(
                    "Action {} {} for {} refused: {}",
                    request.game, request.action, request.player_name, err
                );
            }
        }

        outcome
    }

    async fn dispatch(&self, request: &ActionRequest) -> EngineResult<ActionReply> {
        let name = request.player_name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("playerName required".to_string()));
        }
        let game = GameKind::parse(&request.game)
            .ok_or_else(|| EngineError::Validation(format!("unknown game: {}", request.game)))?;

        let session = self.sessions.entry(name);
        let mut session = session.lock().await;
        session.touch();

        // the burst guard runs before any ledger traffic
        let sessions_cfg = &self.config.sessions;
        if !session
            .rate
            .allow(sessions_cfg.rate_window(), sessions_cfg.rate_max_actions)
        {
            return Err(EngineError::RateLimited);
        }

        let player = self.load_player(name).await?;

        match game {
            GameKind::Slots => self.play_slots(request, &player).await,
            GameKind::Roulette => self.play_roulette(request, &player).await,
            GameKind::Blackjack => self.play_blackjack(request, &player, &mut session).await,
            GameKind::Mines => self.play_mines(request, &player, &mut session).await,
        }
    }

    async fn load_player(&self, name: &str) -> EngineResult<Player> {
        if let Some(player) = self.ledger.find(name).await? {
            return Ok(player);
        }
        let initial = self.config.ledger.initial_balance;
        let player = self.ledger.create(name, initial).await?;
        info!(
            "Created ledger record for {} with starting balance {}",
            player.name, initial
        );
        Ok(player)
    }

    /// Check the stake against the balance and return the balance after
    /// the deduction.
    fn stake_checked(&self, player: &Player, stake: u64) -> EngineResult<u64> {
        if player.balance < stake {
            return Err(EngineError::InsufficientFunds {
                balance: player.balance,
                required: stake,
            });
        }
        Ok(player.balance - stake)
    }

    /// Write the new balance back, skipping the call when nothing
    /// moved. At most one write per action.
    async fn settle(&self, player: &Player, new_balance: u64) -> EngineResult<()> {
        if new_balance == player.balance {
            return Ok(());
        }
        self.ledger.update_balance(player, new_balance).await?;
        Ok(())
    }

    async fn play_slots(
        &self,
        request: &ActionRequest,
        player: &Player,
    ) -> EngineResult<ActionReply> {
        if request.action != "spin" {
            return Err(EngineError::Validation(format!(
                "unknown slots action: {}",
                request.action
            )));
        }
        let cfg = &self.config.games.slots;
        let after_stake = self.stake_checked(player, cfg.cost)?;

        let mut dice = HashDice::from_entropy();
        debug!("Slots spin for {} seeded {}", player.name, dice.seed_prefix());
        let outcome = slots::spin(cfg, &mut dice);

        let new_balance = after_stake + outcome.payout;
        self.settle(player, new_balance).await?;
        self.metrics.record_settlement(cfg.cost, outcome.payout);
        info!(
            "{} spun slots: {:?} pays {} (balance {})",
            player.name, outcome.tier, outcome.payout, new_balance
        );
        Ok(ActionReply::result(new_balance, GamePayload::Slots(outcome)))
    }

    async fn play_roulette(
        &self,
        request: &ActionRequest,
        player: &Player,
    ) -> EngineResult<ActionReply> {
        if request.action != "spin" {
            return Err(EngineError::Validation(format!(
                "unknown roulette action: {}",
                request.action
            )));
        }
        let cfg = &self.config.games.roulette;
        let after_stake = self.stake_checked(player, cfg.cost)?;

        let pick = roulette::parse_pick(request.pick.as_deref().unwrap_or(""));
        let mut dice = HashDice::from_entropy();
        debug!(
            "Roulette spin for {} seeded {}",
            player.name,
            dice.seed_prefix()
        );
        let outcome = roulette::spin(cfg, pick, &mut dice);

        let new_balance = after_stake + outcome.payout;
        self.settle(player, new_balance).await?;
        self.metrics.record_settlement(cfg.cost, outcome.payout);
        info!(
            "{} bet {} on roulette: {} {} pays {} (balance {})",
            player.name, pick, outcome.number, outcome.color, outcome.payout, new_balance
        );
        Ok(ActionReply::result(
            new_balance,
            GamePayload::Roulette(outcome),
        ))
    }

    async fn play_blackjack(
        &self,
        request: &ActionRequest,
        player: &Player,
        session: &mut PlayerSession,
    ) -> EngineResult<ActionReply> {
        let cfg = &self.config.games.blackjack;
        match request.action.as_str() {
            "start" => {
                let after_stake = self.stake_checked(player, cfg.bet)?;

                let mut dice = HashDice::from_entropy();
                debug!(
                    "Blackjack deal for {} seeded {}",
                    player.name,
                    dice.seed_prefix()
                );
                let round = BlackjackRound::deal(cfg.bet, &mut dice);

                self.settle(player, after_stake).await?;
                self.metrics.record_settlement(cfg.bet, 0);
                let view = BlackjackView::active(&round);
                // an abandoned earlier round stays forfeited; its stake was
                // taken when it started
                session.blackjack = Some(round);
                info!(
                    "{} started blackjack with bet {} (balance {})",
                    player.name, cfg.bet, after_stake
                );
                Ok(ActionReply::state(after_stake, GamePayload::Blackjack(view)))
            }
            "hit" => {
                let round = session
                    .blackjack
                    .as_ref()
                    .filter(|r| r.is_active())
                    .ok_or(GameError::RoundNotStarted)?;
                let mut next = round.clone();
                let total = next.hit();

                if total > 21 {
                    // bust pays nothing, so there is no write to wait for
                    let view = BlackjackView::settled(&next, 0);
                    session.blackjack = Some(next);
                    info!(
                        "{} busted at {} (balance {})",
                        player.name, total, player.balance
                    );
                    Ok(ActionReply::result(
                        player.balance,
                        GamePayload::Blackjack(view),
                    ))
                } else {
                    let view = BlackjackView::active(&next);
                    session.blackjack = Some(next);
                    Ok(ActionReply::state(
                        player.balance,
                        GamePayload::Blackjack(view),
                    ))
                }
            }
            "stand" => {
                let round = session
                    .blackjack
                    .as_ref()
                    .filter(|r| r.is_active())
                    .ok_or(GameError::RoundNotStarted)?;
                let mut next = round.clone();
                let payout = next.stand();

                let new_balance = player.balance + payout;
                self.settle(player, new_balance).await?;
                self.metrics.record_settlement(0, payout);
                let view = BlackjackView::settled(&next, payout);
                session.blackjack = Some(next);
                info!(
                    "{} stood on blackjack, payout {} (balance {})",
                    player.name, payout, new_balance
                );
                Ok(ActionReply::result(new_balance, GamePayload::Blackjack(view)))
            }
            other => Err(EngineError::Validation(format!(
                "unknown blackjack action: {}",
                other
            ))),
        }
    }

    async fn play_mines(
        &self,
        request: &ActionRequest,
        player: &Player,
        session: &mut PlayerSession,
    ) -> EngineResult<ActionReply> {
        let cfg = &self.config.games.mines;
        match request.action.as_str() {
            "start" => {
                let bet = positive_stake(request.bet)?;
                let mine_count = mine_count_in_bounds(request.mine_count, cfg)?;
                let after_stake = self.stake_checked(player, bet)?;

                let mut dice = HashDice::from_entropy();
                debug!(
                    "Mines deal for {} seeded {}",
                    player.name,
                    dice.seed_prefix()
                );
                let round = MinesRound::deal(bet, mine_count, &mut dice)?;

                self.settle(player, after_stake).await?;
                self.metrics.record_settlement(bet, 0);
                let view = MinesView::active(&round, cfg);
                session.mines = Some(round);
                info!(
                    "{} started mines with bet {} and {} mines (balance {})",
                    player.name, bet, mine_count, after_stake
                );
                Ok(ActionReply::state(after_stake, GamePayload::Mines(view)))
            }
            "reveal" => {
                let round = session
                    .mines
                    .as_ref()
                    .filter(|r| r.is_active())
                    .ok_or(GameError::RoundNotStarted)?;
                let cell = cell_in_grid(request.cell_index)?;

                let mut next = round.clone();
                match next.reveal(cfg, cell)? {
                    RevealOutcome::Safe { .. } => {
                        let view = MinesView::active(&next, cfg);
                        session.mines = Some(next);
                        Ok(ActionReply::state(player.balance, GamePayload::Mines(view)))
                    }
                    RevealOutcome::Cleared {
                        profit,
                        payout,
                        mines,
                    } => {
                        let new_balance = player.balance + payout;
                        self.settle(player, new_balance).await?;
                        self.metrics.record_settlement(0, payout);
                        let view = MinesView::disclosed(&next, profit, payout, mines);
                        session.mines = Some(next);
                        info!(
                            "{} cleared the mines board for {} (balance {})",
                            player.name, payout, new_balance
                        );
                        Ok(ActionReply::result(new_balance, GamePayload::Mines(view)))
                    }
                    RevealOutcome::Mine { cell: hit, mines } => {
                        let view = MinesView::disclosed(&next, 0, 0, mines);
                        session.mines = Some(next);
                        info!(
                            "{} hit a mine at cell {} (balance {})",
                            player.name, hit, player.balance
                        );
                        Ok(ActionReply::result(
                            player.balance,
                            GamePayload::Mines(view),
                        ))
                    }
                }
            }
            "cashout" => {
                let round = session
                    .mines
                    .as_ref()
                    .filter(|r| r.is_active())
                    .ok_or(GameError::RoundNotStarted)?;
                let mut next = round.clone();
                let outcome = next.cashout(cfg);

                let new_balance = player.balance + outcome.payout;
                self.settle(player, new_balance).await?;
                self.metrics.record_settlement(0, outcome.payout);
                let view = MinesView::hidden(&next, outcome.profit, outcome.payout);
                session.mines = Some(next);
                info!(
                    "{} cashed out mines for {} (balance {})",
                    player.name, outcome.payout, new_balance
                );
                Ok(ActionReply::result(new_balance, GamePayload::Mines(view)))
            }
            other => Err(EngineError::Validation(format!(
                "unknown mines action: {}",
                other
            ))),
        }
    }
}

fn positive_stake(raw: Option<i64>) -> EngineResult<u64> {
    match raw {
        Some(bet) if bet > 0 => Ok(bet as u64),
        Some(bet) => Err(EngineError::Validation(format!(
            "bet must be positive, got {}",
            bet
        ))),
        None => Err(EngineError::Validation("bet required".to_string())),
    }
}

fn mine_count_in_bounds(raw: Option<i64>, cfg: &MinesConfig) -> EngineResult<u8> {
    let count = raw.ok_or_else(|| EngineError::Validation("mineCount required".to_string()))?;
    if count < cfg.min_mines as i64 || count > cfg.max_mines as i64 {
        return Err(EngineError::Validation(format!(
            "mineCount must be between {} and {}, got {}",
            cfg.min_mines, cfg.max_mines, count
        )));
    }
    Ok(count as u8)
}

fn cell_in_grid(raw: Option<i64>) -> EngineResult<u8> {
    let cell = raw.ok_or_else(|| EngineError::Validation("cellIndex required".to_string()))?;
    if !(0..mines::GRID_CELLS as i64).contains(&cell) {
        return Err(EngineError::Validation(format!(
            "cellIndex must be between 0 and {}, got {}",
            mines::GRID_CELLS - 1,
            cell
        )));
    }
    Ok(cell as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::roulette::Color;
    use crate::games::slots::SpinTier;
    use crate::ledger::MemoryLedger;

    fn test_engine(initial_balance: u64) -> (Arc<GameEngine>, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let mut config = LuckboxConfig::default();
        config.ledger.initial_balance = initial_balance;
        let engine = Arc::new(GameEngine::new(config, ledger.clone()));
        (engine, ledger)
    }

    fn action(name: &str, game: &str, action: &str) -> ActionRequest {
        ActionRequest {
            player_name: name.to_string(),
            game: game.to_string(),
            action: action.to_string(),
            ..ActionRequest::default()
        }
    }

    async fn peek_mine_cells(engine: &GameEngine, name: &str) -> Vec<u8> {
        let session = engine.sessions().entry(name);
        let session = session.lock().await;
        session
            .mines
            .as_ref()
            .map(|round| round.mine_cells())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_unknown_game_is_rejected_before_the_ledger() {
        let (engine, ledger) = test_engine(1_000);
        let err = engine
            .handle_action(&action("alice", "poker", "deal"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(err.to_string().contains("unknown game"));
        assert_eq!(ledger.balance_of("alice"), None, "no record is created");
    }

    #[tokio::test]
    async fn test_blank_player_name_is_rejected() {
        let (engine, _ledger) = test_engine(1_000);
        let err = engine
            .handle_action(&action("   ", "slots", "spin"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected_without_moving_money() {
        let (engine, ledger) = test_engine(1_000);
        let err = engine
            .handle_action(&action("bob", "slots", "pull"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown slots action"));
        assert_eq!(ledger.balance_of("bob"), Some(1_000));
    }

    #[tokio::test]
    async fn test_slots_spin_conserves_money() {
        let (engine, ledger) = test_engine(1_000);
        let reply = engine
            .handle_action(&action("carol", "slots", "spin"))
            .await
            .expect("spin");

        let payout = match reply.result.as_ref().expect("result payload") {
            GamePayload::Slots(outcome) => {
                match outcome.tier {
                    SpinTier::Big => assert_eq!(outcome.payout, 800),
                    SpinTier::Small => assert_eq!(outcome.payout, 200),
                    SpinTier::Miss => assert_eq!(outcome.payout, 0),
                }
                outcome.payout
            }
            other => panic!("expected a slots payload, got {:?}", other),
        };
        assert_eq!(reply.balance, 1_000 - 100 + payout);
        assert_eq!(ledger.balance_of("carol"), Some(reply.balance));
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_the_balance_alone() {
        let (engine, ledger) = test_engine(1_000);
        ledger.create("poor", 50).await.expect("seed record");

        let err = engine
            .handle_action(&action("poor", "slots", "spin"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientFunds {
                balance: 50,
                required: 100
            }
        ));
        assert_eq!(ledger.balance_of("poor"), Some(50));
    }

    #[tokio::test]
    async fn test_roulette_junk_pick_plays_as_red() {
        let (engine, ledger) = test_engine(10_000);
        let mut request = action("dave", "roulette", "spin");
        request.pick = Some("banana".to_string());

        let reply = engine.handle_action(&request).await.expect("spin");
        match reply.result.as_ref().expect("result payload") {
            GamePayload::Roulette(outcome) => {
                let expected = if outcome.color == Color::Red { 300 } else { 0 };
                assert_eq!(outcome.payout, expected);
                assert_eq!(reply.balance, 10_000 - 150 + outcome.payout);
            }
            other => panic!("expected a roulette payload, got {:?}", other),
        }
        assert_eq!(ledger.balance_of("dave"), Some(reply.balance));
    }

    #[tokio::test]
    async fn test_blackjack_lifecycle() {
        let (engine, ledger) = test_engine(1_000);

        // acting before a round exists is a state error
        let err = engine
            .handle_action(&action("erin", "blackjack", "hit"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
        assert_eq!(err.to_string(), "round not started");

        let reply = engine
            .handle_action(&action("erin", "blackjack", "start"))
            .await
            .expect("start");
        assert_eq!(reply.balance, 800);
        match reply.state.as_ref().expect("state payload") {
            GamePayload::Blackjack(view) => {
                assert_eq!(view.player_hand.len(), 2);
                assert_eq!(view.dealer_hand.len(), 1, "hole card stays hidden");
                assert!(view.active);
            }
            other => panic!("expected a blackjack payload, got {:?}", other),
        }

        let reply = engine
            .handle_action(&action("erin", "blackjack", "stand"))
            .await
            .expect("stand");
        let payout = match reply.result.as_ref().expect("result payload") {
            GamePayload::Blackjack(view) => {
                assert!(!view.active);
                assert!(view.dealer_hand.len() >= 2);
                view.payout.expect("settled payout")
            }
            other => panic!("expected a blackjack payload, got {:?}", other),
        };
        assert!(payout == 0 || payout == 200 || payout == 400);
        assert_eq!(reply.balance, 800 + payout);
        assert_eq!(ledger.balance_of("erin"), Some(reply.balance));

        // the settled round does not accept further actions
        let err = engine
            .handle_action(&action("erin", "blackjack", "stand"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[tokio::test]
    async fn test_mines_reveal_and_cashout_follow_the_ladder() {
        let (engine, ledger) = test_engine(1_000);

        let mut request = action("finn", "mines", "start");
        request.bet = Some(100);
        request.mine_count = Some(5);
        let reply = engine.handle_action(&request).await.expect("start");
        assert_eq!(reply.balance, 900);

        let mine_cells = peek_mine_cells(&engine, "finn").await;
        let safe: Vec<u8> = (0..25u8).filter(|c| !mine_cells.contains(c)).collect();

        for cell in safe.iter().take(2) {
            let mut request = action("finn", "mines", "reveal");
            request.cell_index = Some(*cell as i64);
            let reply = engine.handle_action(&request).await.expect("reveal");
            assert_eq!(reply.balance, 900, "safe reveals move no money");
            match reply.state.as_ref().expect("state payload") {
                GamePayload::Mines(view) => {
                    assert!(view.active);
                    assert!(view.mine_positions.is_none());
                }
                other => panic!("expected a mines payload, got {:?}", other),
            }
        }

        let reply = engine
            .handle_action(&action("finn", "mines", "cashout"))
            .await
            .expect("cashout");
        // two safe reveals at five mines pay 144 on a 100 bet
        assert_eq!(reply.balance, 900 + 144);
        match reply.result.as_ref().expect("result payload") {
            GamePayload::Mines(view) => {
                assert_eq!(view.profit, 44);
                assert_eq!(view.payout, 144);
                assert!(!view.active);
                assert!(view.mine_positions.is_none(), "cashout never discloses");
            }
            other => panic!("expected a mines payload, got {:?}", other),
        }
        assert_eq!(ledger.balance_of("finn"), Some(1_044));
    }

    #[tokio::test]
    async fn test_mines_validation_messages() {
        let (engine, _ledger) = test_engine(1_000);

        let mut request = action("gus", "mines", "start");
        request.mine_count = Some(5);
        let err = engine.handle_action(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "bet required");

        request.bet = Some(-20);
        let err = engine.handle_action(&request).await.unwrap_err();
        assert!(err.to_string().contains("bet must be positive"));

        request.bet = Some(100);
        request.mine_count = Some(25);
        let err = engine.handle_action(&request).await.unwrap_err();
        assert!(err.to_string().contains("mineCount must be between 1 and 24"));

        request.mine_count = Some(5);
        engine.handle_action(&request).await.expect("start");

        let mut reveal = action("gus", "mines", "reveal");
        reveal.cell_index = Some(99);
        let err = engine.handle_action(&reveal).await.unwrap_err();
        assert!(err.to_string().contains("cellIndex must be between 0 and 24"));

        reveal.cell_index = None;
        let err = engine.handle_action(&reveal).await.unwrap_err();
        assert_eq!(err.to_string(), "cellIndex required");
    }

    #[tokio::test]
    async fn test_rate_guard_fires_before_the_funds_check() {
        let (engine, ledger) = test_engine(1_000);
        ledger.create("henry", 0).await.expect("seed record");

        for _ in 0..15 {
            let err = engine
                .handle_action(&action("henry", "slots", "spin"))
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        }

        // the 16th action inside the window trips the guard instead
        let err = engine
            .handle_action(&action("henry", "slots", "spin"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RateLimited));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_the_round_alive() {
        let (engine, ledger) = test_engine(1_000);

        let mut request = action("iris", "mines", "start");
        request.bet = Some(100);
        request.mine_count = Some(5);
        engine.handle_action(&request).await.expect("start");
        assert_eq!(ledger.balance_of("iris"), Some(900));

        ledger.fail_writes(true);
        let err = engine
            .handle_action(&action("iris", "mines", "cashout"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::LedgerUnavailable(_)));
        assert_eq!(ledger.balance_of("iris"), Some(900));

        // the round survived the outage and settles once the store is back
        ledger.fail_writes(false);
        let reply = engine
            .handle_action(&action("iris", "mines", "cashout"))
            .await
            .expect("cashout retry");
        assert_eq!(reply.balance, 1_000);
        assert_eq!(ledger.balance_of("iris"), Some(1_000));
    }

    #[tokio::test]
    async fn test_distinct_players_do_not_share_state() {
        let (engine, ledger) = test_engine(1_000);

        let mut handles = Vec::new();
        for i in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                let name = format!("player{}", i);
                engine
                    .handle_action(&action(&name, "slots", "spin"))
                    .await
                    .expect("spin")
            }));
        }
        for handle in handles {
            let reply = handle.await.expect("join");
            assert!(reply.balance >= 900);
        }
        assert_eq!(engine.sessions().len(), 8);
        assert!(ledger.balance_of("player0").is_some());
    }

    #[tokio::test]
    async fn test_reply_serialization_shape() {
        let reply = ActionReply::result(
            950,
            GamePayload::Slots(SpinOutcome {
                tier: SpinTier::Small,
                payout: 200,
            }),
        );
        let json = serde_json::to_value(&reply).expect("serialize");
        assert_eq!(json["balance"], 950);
        assert_eq!(json["result"]["tier"], "small");
        assert_eq!(json["result"]["payout"], 200);
        assert!(json.get("state").is_none());

        let request: ActionRequest = serde_json::from_str(
            r#"{"playerName":"alice","game":"mines","action":"start","bet":100,"mineCount":5}"#,
        )
        .expect("deserialize");
        assert_eq!(request.player_name, "alice");
        assert_eq!(request.bet, Some(100));
        assert_eq!(request.mine_count, Some(5));
        assert_eq!(request.cell_index, None);
    }
}
