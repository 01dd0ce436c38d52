use thiserror::Error;

/// Failure taxonomy for the agent. Every task loop maps whatever its
/// collaborators raise into one of these before the scheduler sees it.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Chain or notifier unreachable. Transient: retried on the next cycle
    /// after the task's error delay, never inside the failing call.
    #[error("transport: {0}")]
    Transport(String),

    /// Transaction rejected on-chain (bad nonce, underpriced, reverted).
    /// Logged; the next window attempts again with a fresh nonce.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Missing or malformed startup configuration. Fatal before any task runs.
    #[error("config: {0}")]
    Config(String),

    /// A single event could not be decoded or classified. Logged and skipped;
    /// never aborts the batch it arrived in.
    #[error("classification: {0}")]
    Classification(String),
}

impl AgentError {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Transport(_) => "transport",
            AgentError::Rejected(_) => "rejected",
            AgentError::Config(_) => "config",
            AgentError::Classification(_) => "classification",
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AgentError::Transport("x".into()).kind(), "transport");
        assert_eq!(AgentError::Rejected("x".into()).kind(), "rejected");
        assert_eq!(AgentError::Config("x".into()).kind(), "config");
        assert_eq!(AgentError::Classification("x".into()).kind(), "classification");
    }
}
