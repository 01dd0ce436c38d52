//! Event monitoring task.
//!
//! Per cycle: for every tracked event kind, query the span between the kind's
//! cursor and the chain head, classify each event, and execute the resulting
//! intents. A cursor only advances once its whole batch has reached the
//! classifier; per-event failures are logged and skipped so one bad event
//! never blocks the rest of the batch. A transport failure fails the cycle
//! with every unadvanced cursor left untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::chain::ChainReader;
use crate::classify::{classify, GuessSampler, ReactionIntent};
use crate::config::Config;
use crate::events::{Event, EventKind, JackpotSnapshot};
use crate::logging::{json_log, obj, v_str, v_u64, warn_log};
use crate::notify::Notifier;
use crate::scheduler::Task;
use crate::storage::CursorStore;

const TASK_NAME: &str = "monitor_game_events";

pub struct MonitorTask {
    chain: Arc<dyn ChainReader>,
    notifier: Arc<dyn Notifier>,
    sampler: GuessSampler,
    lookback: u64,
    idle: Duration,
    error: Duration,
    cursors: HashMap<EventKind, u64>,
    // Mutex because the sqlite connection is Send but not Sync, and run_once
    // borrows self across await points.
    store: Option<Mutex<CursorStore>>,
}

impl MonitorTask {
    pub fn new(
        cfg: &Config,
        chain: Arc<dyn ChainReader>,
        notifier: Arc<dyn Notifier>,
        store: Option<CursorStore>,
    ) -> Self {
        Self {
            chain,
            notifier,
            sampler: GuessSampler::new(cfg.sample_seed, cfg.sample_modulus, cfg.min_guess_len),
            lookback: cfg.lookback_blocks,
            idle: Duration::from_secs(cfg.poll_secs),
            error: Duration::from_secs(cfg.poll_error_secs),
            cursors: HashMap::new(),
            store: store.map(Mutex::new),
        }
    }

    /// First activation: place each cursor either at its stored height or at
    /// a bounded replay window behind the head.
    fn init_cursors(&mut self, latest: u64) {
        let fallback = latest.saturating_sub(self.lookback);
        for kind in EventKind::ALL {
            let stored = self
                .store
                .as_ref()
                .and_then(|s| s.lock().ok())
                .and_then(|s| s.load(kind).ok().flatten());
            let start = stored.unwrap_or(fallback);
            self.cursors.insert(kind, start);
            json_log(TASK_NAME, "cursor_init", obj(&[
                ("kind", v_str(kind.as_str())),
                ("height", v_u64(start)),
                ("source", v_str(if stored.is_some() { "store" } else { "lookback" })),
            ]));
        }
    }

    /// Snapshot reads are per-event I/O; a failure here downgrades to a
    /// skipped reaction, not a failed cycle.
    async fn snapshot_for(&self, event: &Event) -> Option<JackpotSnapshot> {
        if event.kind != EventKind::GuessCommitted {
            return None;
        }
        match self.chain.jackpot_snapshot().await {
            Ok(snap) => Some(snap),
            Err(err) => {
                warn_log(TASK_NAME, "snapshot_failed", obj(&[
                    ("height", v_u64(event.block_height)),
                    ("error", v_str(&format!("{:#}", err))),
                ]));
                None
            }
        }
    }

    async fn handle_event(&self, event: &Event) {
        let snapshot = self.snapshot_for(event).await;
        if event.kind == EventKind::GuessCommitted && snapshot.is_none() {
            return;
        }
        let intents = match classify(event, snapshot.as_ref(), &self.sampler) {
            Ok(intents) => intents,
            Err(err) => {
                warn_log(TASK_NAME, "classification_skipped", obj(&[
                    ("kind", v_str(event.kind.as_str())),
                    ("height", v_u64(event.block_height)),
                    ("error", v_str(&err.to_string())),
                ]));
                return;
            }
        };
        for intent in intents {
            match intent {
                ReactionIntent::Publish(msg) => {
                    if let Err(err) = self.notifier.publish(&msg).await {
                        warn_log(TASK_NAME, "publish_failed", obj(&[
                            ("category", v_str(&msg.category)),
                            ("height", v_u64(event.block_height)),
                            ("error", v_str(&format!("{:#}", err))),
                        ]));
                    }
                }
                ReactionIntent::Observe { event: name, detail } => {
                    json_log(TASK_NAME, name, obj(&[
                        ("height", v_u64(event.block_height)),
                        ("detail", v_str(&detail)),
                    ]));
                }
            }
        }
    }
}

#[async_trait]
impl Task for MonitorTask {
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
        let latest = self.chain.latest_height().await?;
        if self.cursors.is_empty() {
            self.init_cursors(latest);
        }
        for kind in EventKind::ALL {
            let cursor = self.cursors[&kind];
            if cursor >= latest {
                continue;
            }
            let events = self.chain.query_events(kind, cursor + 1, latest).await?;
            for event in &events {
                self.handle_event(event).await;
            }
            self.cursors.insert(kind, latest);
            if let Some(store) = self.store.as_ref() {
                let persisted = store
                    .lock()
                    .map_err(|_| anyhow::anyhow!("cursor store poisoned"))
                    .and_then(|mut s| s.save(kind, latest));
                if let Err(err) = persisted {
                    warn_log(TASK_NAME, "cursor_persist_failed", obj(&[
                        ("kind", v_str(kind.as_str())),
                        ("error", v_str(&format!("{:#}", err))),
                    ]));
                }
            }
            if !events.is_empty() {
                json_log(TASK_NAME, "batch_done", obj(&[
                    ("kind", v_str(kind.as_str())),
                    ("events", v_u64(events.len() as u64)),
                    ("cursor", v_u64(latest)),
                ]));
            }
        }
        Ok(())
    }
}
