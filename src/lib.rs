//! Luckbox - Server-Authoritative Wagering Engine
//!
//! Four house games (slots, roulette, blackjack, mines) behind one
//! HTTP action endpoint, with player balances held in an external
//! user-record store. All outcomes are drawn server-side.

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod rng;
pub mod session;

pub use config::LuckboxConfig;
pub use engine::{ActionReply, ActionRequest, GameEngine};
pub use errors::{EngineError, EngineResult};
pub use ledger::{HttpLedger, Ledger, MemoryLedger, Player};
