//! Daily jackpot summary task.
//!
//! One fresh snapshot, one fixed-template post, one full day of sleep. No
//! catch-up: a cycle missed while the process was down is never run
//! retroactively.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::chain::ChainReader;
use crate::config::Config;
use crate::logging::{json_log, obj, v_num, v_u64};
use crate::message::daily_summary_message;
use crate::notify::Notifier;
use crate::scheduler::Task;

const TASK_NAME: &str = "daily_jackpot_summary";

pub struct SummaryTask {
    chain: Arc<dyn ChainReader>,
    notifier: Arc<dyn Notifier>,
    idle: Duration,
    error: Duration,
}

impl SummaryTask {
    pub fn new(cfg: &Config, chain: Arc<dyn ChainReader>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            chain,
            notifier,
            idle: Duration::from_secs(cfg.summary_secs),
            error: Duration::from_secs(cfg.summary_error_secs),
        }
    }
}

#[async_trait]
impl Task for SummaryTask {
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
        let snap = self.chain.jackpot_snapshot().await?;
        self.notifier.publish(&daily_summary_message(&snap)).await?;
        json_log(TASK_NAME, "summary_posted", obj(&[
            ("jackpot_s", v_num(snap.jackpot_s)),
            ("total_guesses", v_u64(snap.total_guesses)),
            ("unique_players", v_u64(snap.unique_players)),
        ]));
        Ok(())
    }
}
