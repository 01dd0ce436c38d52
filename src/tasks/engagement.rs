//! Scheduled on-chain interaction task.
//!
//! Submits at most one engagement transaction during each of two fixed daily
//! windows (12:00 and 18:00 UTC, first five minutes). Nonce and gas price are
//! fetched fresh for every submission; an in-memory cooldown keeps the same
//! window from re-firing. The cooldown is not durable, so
//! at-most-one-per-window is best-effort across restarts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Timelike, Utc};

use crate::chain::{ChainReader, TxRequest};
use crate::chain::wallet::Wallet;
use crate::config::{now_ts, Config};
use crate::logging::{json_log, obj, v_str, v_u64};
use crate::message::engagement_text;
use crate::scheduler::Task;

const TASK_NAME: &str = "on_chain_interaction";

/// Daily posting windows, UTC hours.
pub const POST_HOURS: [u32; 2] = [12, 18];
/// Minutes past the hour during which a window is open.
pub const WINDOW_MINUTES: u32 = 5;

/// True while a posting window is open.
pub fn in_post_window(hour: u32, minute: u32) -> bool {
    POST_HOURS.contains(&hour) && minute < WINDOW_MINUTES
}

pub struct EngagementTask {
    chain: Arc<dyn ChainReader>,
    wallet: Wallet,
    contract: String,
    gas_limit: u64,
    idle: Duration,
    error: Duration,
    cooldown: Duration,
    cooldown_until: u64,
}

impl EngagementTask {
    pub fn new(cfg: &Config, chain: Arc<dyn ChainReader>, wallet: Wallet) -> Self {
        json_log(TASK_NAME, "wallet_ready", obj(&[("address", v_str(wallet.address()))]));
        Self {
            chain,
            wallet,
            contract: cfg.contract_address.clone(),
            gas_limit: cfg.gas_limit,
            idle: Duration::from_secs(cfg.engage_check_secs),
            error: Duration::from_secs(cfg.engage_error_secs),
            cooldown: Duration::from_secs(cfg.engage_cooldown_secs),
            cooldown_until: 0,
        }
    }

    async fn submit_update(&mut self, day_of_month: u32) -> anyhow::Result<()> {
        let snap = self.chain.jackpot_snapshot().await?;
        let payload = engagement_text(day_of_month, &snap);

        // Both must be fresh at submission time; a cached nonce or gas price
        // gets the transaction rejected or underpriced.
        let nonce = self.chain.transaction_count(self.wallet.address()).await?;
        let gas_price = self.chain.gas_price().await?;

        let tx = TxRequest {
            from: self.wallet.address().to_string(),
            to: self.contract.clone(),
            nonce,
            gas_limit: self.gas_limit,
            gas_price,
            payload: payload.clone(),
        };
        let tx_id = self.chain.submit_transaction(self.wallet.sign(tx)?).await?;

        json_log(TASK_NAME, "game_update_sent", obj(&[
            ("tx_id", v_str(&tx_id)),
            ("nonce", v_u64(nonce)),
            ("gas_price", v_u64(gas_price)),
            ("payload", v_str(&payload)),
        ]));
        self.cooldown_until = now_ts() + self.cooldown.as_secs();
        Ok(())
    }
}

#[async_trait]
impl Task for EngagementTask {
    fn name(&self) -> &'static str {
        TASK_NAME
    }

    fn idle_delay(&self) -> Duration {
        self.idle
    }

    fn error_delay(&self) -> Duration {
        self.error
    }

    async fn run_once(&mut self) -> anyhow::Result<()> {
        if now_ts() < self.cooldown_until {
            return Ok(());
        }
        let now = Utc::now();
        if !in_post_window(now.hour(), now.minute()) {
            return Ok(());
        }
        self.submit_update(now.day()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{SignedTx, TxId};
    use crate::events::{Event, EventKind, JackpotSnapshot};
    use anyhow::Result;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct MockChain {
        nonce: AtomicU64,
        submitted: Mutex<Vec<SignedTx>>,
    }

    impl MockChain {
        fn new() -> Arc<Self> {
            Arc::new(Self { nonce: AtomicU64::new(5), submitted: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChainReader for MockChain {
        async fn latest_height(&self) -> Result<u64> {
            Ok(100)
        }
        async fn query_events(&self, _kind: EventKind, _from: u64, _to: u64) -> Result<Vec<Event>> {
            Ok(vec![])
        }
        async fn jackpot_snapshot(&self) -> Result<JackpotSnapshot> {
            Ok(JackpotSnapshot { jackpot_s: 42.0, total_guesses: 7, unique_players: 3 })
        }
        async fn transaction_count(&self, _address: &str) -> Result<u64> {
            // Advances per call, like a live account.
            Ok(self.nonce.fetch_add(1, Ordering::SeqCst))
        }
        async fn gas_price(&self) -> Result<u64> {
            Ok(1_000_000_000)
        }
        async fn submit_transaction(&self, tx: SignedTx) -> Result<TxId> {
            self.submitted.lock().unwrap().push(tx);
            Ok("0xfeed".to_string())
        }
    }

    fn task(chain: Arc<MockChain>) -> EngagementTask {
        let cfg = Config {
            rpc_url: "http://localhost".into(),
            contract_address: "0xcontract".into(),
            signing_key: "deadbeef".into(),
            notifier: crate::config::NotifierCredentials {
                api_key: "k".into(),
                api_secret: "s".into(),
                access_token: "t".into(),
                access_secret: "x".into(),
            },
            lookback_blocks: 1000,
            poll_secs: 30,
            poll_error_secs: 60,
            summary_secs: 86_400,
            summary_error_secs: 3_600,
            engage_check_secs: 900,
            engage_cooldown_secs: 10_800,
            engage_error_secs: 3_600,
            sample_seed: 0,
            sample_modulus: 5,
            min_guess_len: 5,
            gas_limit: 200_000,
            cursor_db: None,
            notify_webhook: None,
        };
        EngagementTask::new(&cfg, chain, Wallet::from_key_hex("deadbeef").unwrap())
    }

    #[tokio::test]
    async fn test_submit_uses_fresh_nonce_each_time() {
        let chain = MockChain::new();
        let mut t = task(chain.clone());
        t.submit_update(3).await.unwrap();
        t.cooldown_until = 0;
        t.submit_update(3).await.unwrap();

        let submitted = chain.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].tx.nonce, 5);
        assert_eq!(submitted[1].tx.nonce, 6);
        assert_eq!(submitted[0].tx.to, "0xcontract");
        assert!(submitted[0].tx.payload.contains("42.00 S"));
    }

    #[tokio::test]
    async fn test_submit_sets_cooldown() {
        let chain = MockChain::new();
        let mut t = task(chain);
        assert_eq!(t.cooldown_until, 0);
        t.submit_update(1).await.unwrap();
        assert!(t.cooldown_until > now_ts() + t.cooldown.as_secs() - 60);
        // While the cooldown holds, run_once is a no-op regardless of window.
        t.run_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_payload_follows_day_rotation() {
        let chain = MockChain::new();
        let mut t = task(chain.clone());
        for day in [3u32, 4, 5] {
            t.cooldown_until = 0;
            t.submit_update(day).await.unwrap();
        }
        let submitted = chain.submitted.lock().unwrap();
        let snap = JackpotSnapshot { jackpot_s: 42.0, total_guesses: 7, unique_players: 3 };
        for (i, day) in [3u32, 4, 5].iter().enumerate() {
            assert_eq!(submitted[i].tx.payload, engagement_text(*day, &snap));
        }
    }

    #[test]
    fn test_window_closed_everywhere_but_the_two_slots() {
        // Every minute of a simulated day.
        for hour in 0..24u32 {
            for minute in 0..60u32 {
                let open = in_post_window(hour, minute);
                let expected = (hour == 12 || hour == 18) && minute < 5;
                assert_eq!(open, expected, "hour={} minute={}", hour, minute);
            }
        }
    }

    #[test]
    fn test_window_edges() {
        assert!(in_post_window(12, 0));
        assert!(in_post_window(12, 4));
        assert!(!in_post_window(12, 5));
        assert!(in_post_window(18, 0));
        assert!(!in_post_window(17, 59));
        assert!(!in_post_window(19, 0));
    }
}
