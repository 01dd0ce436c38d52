//! Task scheduler: N independent long-lived loops with per-task backoff.
//!
//! Each registered task gets its own tokio task running run_once forever.
//! An error is logged and answered with the task's error delay; it never
//! propagates to another task or terminates the process. Every sleep races
//! the shutdown signal, so shutdown latency is bounded by one delay.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::logging::{error_log, json_log, obj, v_str, v_u64};

#[async_trait]
pub trait Task: Send {
    fn name(&self) -> &'static str;

    /// Wait after a successful cycle.
    fn idle_delay(&self) -> Duration;

    /// Wait after a failed cycle. Expected to be >= idle_delay.
    fn error_delay(&self) -> Duration;

    /// One cycle of work. Errors are handled entirely at the loop boundary.
    async fn run_once(&mut self) -> anyhow::Result<()>;
}

pub struct Scheduler {
    tasks: Vec<Box<dyn Task>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { tasks: Vec::new(), shutdown_tx }
    }

    pub fn register(&mut self, task: Box<dyn Task>) {
        self.tasks.push(task);
    }

    /// Handle for requesting shutdown from outside the scheduler.
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Start every registered task concurrently and wait until all of them
    /// have observed shutdown and returned.
    pub async fn run_all(self) {
        let mut handles = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            let shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(run_task(task, shutdown_rx)));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// One task's unbounded loop. Returns only on shutdown.
async fn run_task(mut task: Box<dyn Task>, mut shutdown_rx: watch::Receiver<bool>) {
    let name = task.name();
    json_log(name, "task_start", obj(&[
        ("idle_secs", v_u64(task.idle_delay().as_secs())),
        ("error_secs", v_u64(task.error_delay().as_secs())),
    ]));
    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        let delay = match task.run_once().await {
            Ok(()) => task.idle_delay(),
            Err(err) => {
                error_log(name, "cycle_failed", obj(&[
                    ("error", v_str(&format!("{:#}", err))),
                    ("retry_secs", v_u64(task.error_delay().as_secs())),
                ]));
                task.error_delay()
            }
        };
        tokio::select! {
            _ = sleep(delay) => {}
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    json_log(name, "task_stop", obj(&[]));
}
