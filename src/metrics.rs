//! Engine metrics
//!
//! Counters for the action pipeline with a Prometheus text exposition.
//! Scrapers read /metrics; the status endpoint serves the same numbers
//! as JSON.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Rolling window of per-action latencies kept for percentile export.
const DURATION_WINDOW: usize = 1000;

/// Metrics registry shared across the engine and the API layer.
#[derive(Default)]
pub struct EngineMetrics {
    actions_total: AtomicU64,
    rejected_total: AtomicU64,
    rate_limited_total: AtomicU64,
    ledger_failures_total: AtomicU64,
    stakes_total: AtomicU64,
    payouts_total: AtomicU64,
    action_duration_seconds: RwLock<Vec<f64>>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed action and its latency.
    pub async fn record_action(&self, duration: Duration) {
        self.actions_total.fetch_add(1, Ordering::SeqCst);

        let mut durations = self.action_duration_seconds.write().await;
        durations.push(duration.as_secs_f64());
        if durations.len() > DURATION_WINDOW {
            let excess = durations.len() - DURATION_WINDOW;
            durations.drain(0..excess);
        }
    }

    /// Record one refused action.
    pub fn record_rejection(&self) {
        self.rejected_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_ledger_failure(&self) {
        self.ledger_failures_total.fetch_add(1, Ordering::SeqCst);
    }

    /// Record money movement: what the player staked and what the
    /// house paid back.
    pub fn record_settlement(&self, stake: u64, payout: u64) {
        self.stakes_total.fetch_add(stake, Ordering::SeqCst);
        self.payouts_total.fetch_add(payout, Ordering::SeqCst);
    }

    /// Current counters for JSON consumers.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let durations = self.action_duration_seconds.read().await;
        let avg_action_time_ms = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64 * 1000.0
        };

        MetricsSnapshot {
            actions_total: self.actions_total.load(Ordering::SeqCst),
            rejected_total: self.rejected_total.load(Ordering::SeqCst),
            rate_limited_total: self.rate_limited_total.load(Ordering::SeqCst),
            ledger_failures_total: self.ledger_failures_total.load(Ordering::SeqCst),
            stakes_total: self.stakes_total.load(Ordering::SeqCst),
            payouts_total: self.payouts_total.load(Ordering::SeqCst),
            avg_action_time_ms,
        }
    }

    /// Generate Prometheus metrics format
    pub async fn to_prometheus_format(&self, live_sessions: usize) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# HELP luckbox_actions_total Total number of settled actions\n\
             # TYPE luckbox_actions_total counter\n\
             luckbox_actions_total {}\n\n",
            self.actions_total.load(Ordering::SeqCst)
        ));

        output.push_str(&format!(
            "# HELP luckbox_rejected_total Total number of refused actions\n\
             # TYPE luckbox_rejected_total counter\n\
             luckbox_rejected_total {}\n\n",
            self.rejected_total.load(Ordering::SeqCst)
        ));

        output.push_str(&format!(
            "# HELP luckbox_rate_limited_total Actions refused by the burst guard\n\
             # TYPE luckbox_rate_limited_total counter\n\
             luckbox_rate_limited_total {}\n\n",
            self.rate_limited_total.load(Ordering::SeqCst)
        ));

        output.push_str(&format!(
            "# HELP luckbox_ledger_failures_total Actions refused because the ledger was unreachable\n\
             # TYPE luckbox_ledger_failures_total counter\n\
             luckbox_ledger_failures_total {}\n\n",
            self.ledger_failures_total.load(Ordering::SeqCst)
        ));

        output.push_str(&format!(
            "# HELP luckbox_stakes_total Sum of all stakes taken\n\
             # TYPE luckbox_stakes_total counter\n\
             luckbox_stakes_total {}\n\n",
            self.stakes_total.load(Ordering::SeqCst)
        ));

        output.push_str(&format!(
            "# HELP luckbox_payouts_total Sum of all payouts returned\n\
             # TYPE luckbox_payouts_total counter\n\
             luckbox_payouts_total {}\n\n",
            self.payouts_total.load(Ordering::SeqCst)
        ));

        output.push_str(&format!(
            "# HELP luckbox_sessions_live Player sessions currently in memory\n\
             # TYPE luckbox_sessions_live gauge\n\
             luckbox_sessions_live {}\n\n",
            live_sessions
        ));

        let durations = self.action_duration_seconds.read().await;
        if !durations.is_empty() {
            let mut sorted = durations.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let p50_idx = (sorted.len() as f64 * 0.50) as usize;
            let p95_idx = (sorted.len() as f64 * 0.95) as usize;
            let p99_idx = (sorted.len() as f64 * 0.99) as usize;

            output.push_str(&format!(
                "# HELP luckbox_action_duration_seconds Action duration percentiles\n\
                 # TYPE luckbox_action_duration_seconds gauge\n\
                 luckbox_action_duration_seconds{{quantile=\"0.50\"}} {}\n\
                 luckbox_action_duration_seconds{{quantile=\"0.95\"}} {}\n\
                 luckbox_action_duration_seconds{{quantile=\"0.99\"}} {}\n\n",
                sorted.get(p50_idx).unwrap_or(&0.0),
                sorted.get(p95_idx).unwrap_or(&0.0),
                sorted.get(p99_idx).unwrap_or(&0.0)
            ));
        }

        output
    }
}

/// Metrics snapshot for API responses
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub actions_total: u64,
    pub rejected_total: u64,
    pub rate_limited_total: u64,
    pub ledger_failures_total: u64,
    pub stakes_total: u64,
    pub payouts_total: u64,
    pub avg_action_time_ms: f64,
}
