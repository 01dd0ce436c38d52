//! Structured JSON line logging.
//!
//! One JSON object per line on stdout: ts, seq, lvl, task, event, data.
//! Level filtering via LOG_LEVEL; credentials are redacted before emission.

use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => Level::Debug,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// RFC3339 timestamp with milliseconds.
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["api_key", "api_secret", "access_token", "access_secret", "signing_key", "signature"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

/// Emit a structured log entry attributed to a task (or module).
pub fn log(level: Level, task: &str, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() {
        return;
    }
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("seq".to_string(), json!(LOG_SEQ.fetch_add(1, Ordering::SeqCst)));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("task".to_string(), json!(task));
    entry.insert("event".to_string(), json!(event));
    entry.insert("data".to_string(), Value::Object(sanitize_fields(fields)));
    println!("{}", Value::Object(entry));
}

pub fn json_log(task: &str, event: &str, fields: Map<String, Value>) {
    log(Level::Info, task, event, fields);
}

pub fn warn_log(task: &str, event: &str, fields: Map<String, Value>) {
    log(Level::Warn, task, event, fields);
}

pub fn error_log(task: &str, event: &str, fields: Map<String, Value>) {
    log(Level::Error, task, event, fields);
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

pub fn v_u64(n: u64) -> Value {
    json!(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_sanitize_redacts_credentials() {
        let fields = sanitize_fields(obj(&[
            ("api_secret", v_str("hunter2")),
            ("guess", v_str("elephant")),
        ]));
        assert_eq!(fields.get("api_secret").unwrap(), "[REDACTED]");
        assert_eq!(fields.get("guess").unwrap(), "elephant");
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }
}
