use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AgentError;
use crate::logging::{json_log, obj, v_str};
use crate::message::OutboundMessage;

/// Capability seam over the social posting mechanism. A publish failure is
/// reported back and never retried within the same cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, msg: &OutboundMessage) -> Result<()>;
}

#[derive(Clone, Copy, Debug)]
pub enum NotifierKind {
    Console,
    Webhook,
}

impl NotifierKind {
    pub fn from_env() -> Self {
        match std::env::var("NOTIFIER").unwrap_or_else(|_| "console".to_string()).as_str() {
            "webhook" => NotifierKind::Webhook,
            _ => NotifierKind::Console,
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Arc<dyn Notifier>> {
        match self {
            NotifierKind::Console => Ok(Arc::new(ConsoleNotifier)),
            NotifierKind::Webhook => {
                let url = cfg.notify_webhook.clone().ok_or_else(|| {
                    AgentError::Config("NOTIFIER=webhook requires NOTIFY_WEBHOOK".into())
                })?;
                Ok(Arc::new(WebhookNotifier { client: Client::new(), url }))
            }
        }
    }
}

/// Logs the would-be post. The default integration until real posting
/// credentials are wired to a delivery backend.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn publish(&self, msg: &OutboundMessage) -> Result<()> {
        json_log(
            "notifier",
            "post",
            obj(&[("category", v_str(&msg.category)), ("body", v_str(&msg.body))]),
        );
        Ok(())
    }
}

/// POSTs the message as JSON to a relay endpoint that owns the actual
/// social-media delivery.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, msg: &OutboundMessage) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "category": msg.category, "body": msg.body }))
            .send()
            .await
            .map_err(AgentError::from)?;
        if !resp.status().is_success() {
            return Err(AgentError::Transport(format!(
                "webhook returned {}",
                resp.status()
            ))
            .into());
        }
        Ok(())
    }
}
