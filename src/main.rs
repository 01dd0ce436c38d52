use std::sync::Arc;

use anyhow::Result;

use jackpot_agent::chain::{build_chain, wallet::Wallet};
use jackpot_agent::config::Config;
use jackpot_agent::logging::{error_log, json_log, obj, v_str, v_u64};
use jackpot_agent::notify::NotifierKind;
use jackpot_agent::scheduler::Scheduler;
use jackpot_agent::storage::CursorStore;
use jackpot_agent::tasks::engagement::EngagementTask;
use jackpot_agent::tasks::monitor::MonitorTask;
use jackpot_agent::tasks::summary::SummaryTask;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration problems are fatal here, before any task is spawned.
    let cfg = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(err) => {
            error_log("startup", "config_invalid", obj(&[("error", v_str(&err.to_string()))]));
            return Err(err.into());
        }
    };

    let chain = build_chain(&cfg)?;
    let notifier = NotifierKind::from_env().build(&cfg)?;
    let wallet = Wallet::from_key_hex(&cfg.signing_key)?;

    let cursor_store = match cfg.cursor_db.as_deref() {
        Some(path) => {
            let mut store = CursorStore::new(path)?;
            store.init()?;
            Some(store)
        }
        None => None,
    };

    json_log("startup", "agent_start", obj(&[
        ("rpc_url", v_str(&cfg.rpc_url)),
        ("contract", v_str(&cfg.contract_address)),
        ("sender", v_str(wallet.address())),
        ("lookback_blocks", v_u64(cfg.lookback_blocks)),
        ("durable_cursors", v_str(if cursor_store.is_some() { "sqlite" } else { "memory" })),
    ]));

    let mut scheduler = Scheduler::new();
    scheduler.register(Box::new(MonitorTask::new(
        &cfg,
        chain.clone(),
        notifier.clone(),
        cursor_store,
    )));
    scheduler.register(Box::new(SummaryTask::new(&cfg, chain.clone(), notifier.clone())));
    scheduler.register(Box::new(EngagementTask::new(&cfg, chain, wallet)));

    let shutdown = scheduler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            json_log("startup", "shutdown_requested", obj(&[]));
            let _ = shutdown.send(true);
        }
    });

    scheduler.run_all().await;
    json_log("startup", "agent_stop", obj(&[]));
    Ok(())
}
