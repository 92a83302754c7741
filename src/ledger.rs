//! User-record store client
//!
//! Balances live in an external REST collection, one record per player.
//! The engine reads a record before every action and writes the full
//! record back when money moves. [`HttpLedger`] talks to the real
//! service; [`MemoryLedger`] backs tests.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;

use crate::config::LedgerConfig;

/// One player record as the store holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "de_balance")]
    pub balance: u64,
}

/// Hand-edited records sometimes hold the balance as a string; accept
/// both shapes.
fn de_balance<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Store access failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("ledger answered {0}")]
    Status(StatusCode),
    #[error("ledger temporarily unavailable")]
    Unavailable,
}

/// Balance storage seam. Engine code only sees this trait.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Look a player up by exact name.
    async fn find(&self, name: &str) -> Result<Option<Player>, LedgerError>;

    /// Create a player record with a starting balance.
    async fn create(&self, name: &str, balance: u64) -> Result<Player, LedgerError>;

    /// Overwrite a player's balance with the full new value.
    async fn update_balance(&self, player: &Player, balance: u64) -> Result<(), LedgerError>;
}

/// REST client for the hosted user collection.
pub struct HttpLedger {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLedger {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn keyed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn find(&self, name: &str) -> Result<Option<Player>, LedgerError> {
        let request = self.client.get(&self.base_url).query(&[("name", name)]);
        let response = self.keyed(request).send().await?;

        // the stock service answers 404 when the filter matches nothing
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LedgerError::Status(response.status()));
        }

        // the name filter is a substring match; insist on an exact hit
        let matches: Vec<Player> = response.json().await?;
        Ok(matches.into_iter().find(|p| p.name == name))
    }

    async fn create(&self, name: &str, balance: u64) -> Result<Player, LedgerError> {
        let request = self
            .client
            .post(&self.base_url)
            .json(&serde_json::json!({ "name": name, "balance": balance }));
        let response = self.keyed(request).send().await?;
        if !response.status().is_success() {
            return Err(LedgerError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn update_balance(&self, player: &Player, balance: u64) -> Result<(), LedgerError> {
        let url = format!("{}/{}", self.base_url, player.id);
        let request = self
            .client
            .put(&url)
            .json(&serde_json::json!({ "name": player.name, "balance": balance }));
        let response = self.keyed(request).send().await?;
        if !response.status().is_success() {
            return Err(LedgerError::Status(response.status()));
        }
        Ok(())
    }
}

/// In-process store for tests and local runs. `fail_writes` simulates
/// an outage at the write boundary.
#[derive(Default)]
pub struct MemoryLedger {
    records: DashMap<String, Player>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn balance_of(&self, name: &str) -> Option<u64> {
        self.records
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| entry.value().balance)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn find(&self, name: &str) -> Result<Option<Player>, LedgerError> {
        Ok(self
            .records
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| entry.value().clone()))
    }

    async fn create(&self, name: &str, balance: u64) -> Result<Player, LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable);
        }
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        let player = Player {
            id: id.clone(),
            name: name.to_string(),
            balance,
        };
        self.records.insert(id, player.clone());
        Ok(player)
    }

    async fn update_balance(&self, player: &Player, balance: u64) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable);
        }
        match self.records.get_mut(&player.id) {
            Some(mut record) => {
                record.balance = balance;
                Ok(())
            }
            None => Err(LedgerError::Unavailable),
        }
    }
}
