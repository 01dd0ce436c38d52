use crate::error::AgentError;

/// Credentials for the social posting collaborator. Held in memory only;
/// never logged (see logging::sanitize_fields).
#[derive(Clone)]
pub struct NotifierCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

/// Immutable startup configuration. Built once from the environment and shared
/// by Arc across every task; absence of a required value aborts startup.
#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    pub contract_address: String,
    pub signing_key: String,
    pub notifier: NotifierCredentials,

    /// Blocks scanned behind the head on first activation.
    pub lookback_blocks: u64,
    pub poll_secs: u64,
    pub poll_error_secs: u64,
    pub summary_secs: u64,
    pub summary_error_secs: u64,
    pub engage_check_secs: u64,
    pub engage_cooldown_secs: u64,
    pub engage_error_secs: u64,

    pub sample_seed: u64,
    pub sample_modulus: u64,
    pub min_guess_len: usize,

    pub gas_limit: u64,
    /// Optional sqlite path for durable cursors. None keeps cursors in memory
    /// and accepts lookback re-delivery after a restart.
    pub cursor_db: Option<String>,
    pub notify_webhook: Option<String>,
}

fn required(var: &str) -> Result<String, AgentError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AgentError::Config(format!("missing required env var {}", var)))
}

fn parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, AgentError> {
        Ok(Self {
            rpc_url: std::env::var("SONIC_RPC_URL")
                .unwrap_or_else(|_| "https://rpc.blaze.soniclabs.com".to_string()),
            contract_address: required("JACKPOT_GAME_ADDRESS")?,
            signing_key: required("PRIVATE_KEY")?,
            notifier: NotifierCredentials {
                api_key: required("TWITTER_API_KEY")?,
                api_secret: required("TWITTER_API_SECRET")?,
                access_token: required("TWITTER_ACCESS_TOKEN")?,
                access_secret: required("TWITTER_ACCESS_SECRET")?,
            },
            lookback_blocks: parsed("LOOKBACK_BLOCKS", 1000),
            poll_secs: parsed("POLL_SECS", 30),
            poll_error_secs: parsed("POLL_ERROR_SECS", 60),
            summary_secs: parsed("SUMMARY_SECS", 86_400),
            summary_error_secs: parsed("SUMMARY_ERROR_SECS", 3_600),
            engage_check_secs: parsed("ENGAGE_CHECK_SECS", 900),
            engage_cooldown_secs: parsed("ENGAGE_COOLDOWN_SECS", 10_800),
            engage_error_secs: parsed("ENGAGE_ERROR_SECS", 3_600),
            sample_seed: parsed("SAMPLE_SEED", 0),
            sample_modulus: parsed("SAMPLE_MODULUS", 5),
            min_guess_len: parsed("MIN_GUESS_LEN", 5),
            gas_limit: parsed("GAS_LIMIT", 200_000),
            cursor_db: std::env::var("CURSOR_DB").ok().filter(|v| !v.is_empty()),
            notify_webhook: std::env::var("NOTIFY_WEBHOOK").ok().filter(|v| !v.is_empty()),
        })
    }
}

pub fn now_ts() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing() {
        let err = required("JACKPOT_TEST_UNSET_VAR").unwrap_err();
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("JACKPOT_TEST_UNSET_VAR"));
    }

    #[test]
    fn test_parsed_falls_back() {
        assert_eq!(parsed("JACKPOT_TEST_UNSET_NUM", 42u64), 42);
    }
}
