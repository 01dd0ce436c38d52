//! JSON-RPC chain client.
//!
//! Talks to the Sonic RPC endpoint with plain eth_* calls and decodes the
//! contract's logs from 32-byte ABI words. Transport failures and on-chain
//! rejections map to the corresponding AgentError variants so task loops can
//! tell them apart.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chain::{ChainReader, SignedTx, TxId};
use crate::error::AgentError;
use crate::events::{Event, EventKind, JackpotSnapshot};

// Event topics and view selectors, as published in the deployed JackpotGame ABI.
const TOPIC_SOCIAL_ANNOUNCEMENT: &str =
    "0x8f3e8d7c1a2b4e5f6a7b8c9d0e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b";
const TOPIC_GUESS_COMMITTED: &str =
    "0x1b9a8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9b";
const TOPIC_GUESS_REVEALED: &str =
    "0x2c8b7a6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8b";
const TOPIC_JACKPOT_WON: &str =
    "0x3d7c6b5a4e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b";

const SEL_JACKPOT_AMOUNT: &str = "0x1a39d8c2";
const SEL_TOTAL_GUESSES: &str = "0x7c3f9a1e";
const SEL_UNIQUE_PLAYERS: &str = "0x5e2d8b4f";

const WEI_PER_TOKEN: f64 = 1e18;

fn topic_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::SocialAnnouncement => TOPIC_SOCIAL_ANNOUNCEMENT,
        EventKind::GuessCommitted => TOPIC_GUESS_COMMITTED,
        EventKind::GuessRevealed => TOPIC_GUESS_REVEALED,
        EventKind::JackpotWon => TOPIC_JACKPOT_WON,
    }
}

pub struct RpcChain {
    client: Client,
    url: String,
    contract: String,
}

#[derive(Deserialize, Debug)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize, Debug)]
struct LogEntry {
    #[serde(rename = "blockNumber")]
    block_number: String,
    topics: Vec<String>,
    data: String,
}

impl RpcChain {
    pub fn new(url: &str, contract: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            url: url.to_string(),
            contract: contract.to_string(),
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp: RpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(AgentError::from)?
            .json()
            .await
            .map_err(AgentError::from)?;
        if let Some(err) = resp.error {
            // Node-side rejection of a submitted tx (bad nonce, underpriced)
            // is not transient; everything else on the error channel is.
            let agent_err = if method == "eth_sendRawTransaction" {
                AgentError::Rejected(format!("{} ({})", err.message, err.code))
            } else {
                AgentError::Transport(format!("{}: {} ({})", method, err.message, err.code))
            };
            return Err(agent_err.into());
        }
        resp.result
            .ok_or_else(|| AgentError::Transport(format!("{}: empty result", method)).into())
    }

    async fn call_view(&self, selector: &str) -> Result<Vec<u8>> {
        let result = self
            .rpc(
                "eth_call",
                json!([{ "to": self.contract, "data": selector }, "latest"]),
            )
            .await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| AgentError::Transport("eth_call: non-string result".into()))?;
        decode_hex(hex_str)
    }
}

#[async_trait]
impl ChainReader for RpcChain {
    async fn latest_height(&self) -> Result<u64> {
        let result = self.rpc("eth_blockNumber", json!([])).await?;
        parse_hex_u64(result.as_str().unwrap_or_default())
    }

    async fn query_events(&self, kind: EventKind, from: u64, to: u64) -> Result<Vec<Event>> {
        let result = self
            .rpc(
                "eth_getLogs",
                json!([{
                    "address": self.contract,
                    "fromBlock": format!("0x{:x}", from),
                    "toBlock": format!("0x{:x}", to),
                    "topics": [topic_for(kind)],
                }]),
            )
            .await?;
        let logs: Vec<LogEntry> = serde_json::from_value(result)
            .map_err(|e| AgentError::Transport(format!("eth_getLogs: {}", e)))?;
        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            events.push(decode_log(kind, &log)?);
        }
        Ok(events)
    }

    async fn jackpot_snapshot(&self) -> Result<JackpotSnapshot> {
        let jackpot_wei = decode_u128(&self.call_view(SEL_JACKPOT_AMOUNT).await?, 0)?;
        let total_guesses = decode_u64(&self.call_view(SEL_TOTAL_GUESSES).await?, 0)?;
        let unique_players = decode_u64(&self.call_view(SEL_UNIQUE_PLAYERS).await?, 0)?;
        Ok(JackpotSnapshot {
            jackpot_s: jackpot_wei as f64 / WEI_PER_TOKEN,
            total_guesses,
            unique_players,
        })
    }

    async fn transaction_count(&self, address: &str) -> Result<u64> {
        let result = self
            .rpc("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        parse_hex_u64(result.as_str().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u64> {
        let result = self.rpc("eth_gasPrice", json!([])).await?;
        parse_hex_u64(result.as_str().unwrap_or_default())
    }

    async fn submit_transaction(&self, tx: SignedTx) -> Result<TxId> {
        let raw = serde_json::to_vec(&tx)
            .map_err(|e| AgentError::Rejected(format!("tx encoding: {}", e)))?;
        let result = self
            .rpc("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))
            .await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AgentError::Transport("eth_sendRawTransaction: non-string result".into()).into())
    }
}

// ---------------------------------------------------------------------------
// ABI word decoding
// ---------------------------------------------------------------------------

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let trimmed = s.trim_start_matches("0x");
    hex::decode(trimmed).map_err(|e| AgentError::Transport(format!("bad hex: {}", e)).into())
}

fn parse_hex_u64(s: &str) -> Result<u64> {
    let trimmed = s.trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16)
        .map_err(|e| AgentError::Transport(format!("bad hex quantity {}: {}", s, e)).into())
}

fn word(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * 32;
    data.get(start..start + 32)
        .ok_or_else(|| AgentError::Classification(format!("data too short for word {}", index)).into())
}

fn decode_u64(data: &[u8], index: usize) -> Result<u64> {
    let w = word(data, index)?;
    Ok(u64::from_be_bytes(w[24..32].try_into().unwrap()))
}

fn decode_u128(data: &[u8], index: usize) -> Result<u128> {
    let w = word(data, index)?;
    Ok(u128::from_be_bytes(w[16..32].try_into().unwrap()))
}

fn decode_bool(data: &[u8], index: usize) -> Result<bool> {
    Ok(decode_u64(data, index)? != 0)
}

/// Dynamic string: head word at `index` holds the byte offset of the tail,
/// where a length word is followed by the UTF-8 bytes.
fn decode_string(data: &[u8], index: usize) -> Result<String> {
    let offset = decode_u64(data, index)? as usize;
    let len_word = data
        .get(offset..offset + 32)
        .ok_or_else(|| AgentError::Classification("string offset out of range".into()))?;
    let len = u64::from_be_bytes(len_word[24..32].try_into().unwrap()) as usize;
    let bytes = data
        .get(offset + 32..offset + 32 + len)
        .ok_or_else(|| AgentError::Classification("string length out of range".into()))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| AgentError::Classification(format!("non-utf8 string: {}", e)).into())
}

/// Indexed address topic: 32-byte word with the address in the low 20 bytes.
fn decode_address_topic(topics: &[String], index: usize) -> Result<String> {
    let topic = topics
        .get(index)
        .ok_or_else(|| AgentError::Classification(format!("missing topic {}", index)))?;
    let bytes = decode_hex(topic)?;
    if bytes.len() != 32 {
        return Err(AgentError::Classification(format!("topic {} is not 32 bytes", index)).into());
    }
    Ok(format!("0x{}", hex::encode(&bytes[12..])))
}

fn decode_log(kind: EventKind, log: &LogEntry) -> Result<Event> {
    let height = parse_hex_u64(&log.block_number)?;
    let data = decode_hex(&log.data)?;
    let event = match kind {
        EventKind::SocialAnnouncement => Event::new(kind, height)
            .with_field("announcementType", decode_string(&data, 0)?)
            .with_field("message", decode_string(&data, 1)?),
        EventKind::GuessCommitted => Event::new(kind, height)
            .with_field("player", decode_address_topic(&log.topics, 1)?),
        EventKind::GuessRevealed => Event::new(kind, height)
            .with_field("player", decode_address_topic(&log.topics, 1)?)
            .with_field("guess", decode_string(&data, 0)?)
            .with_field("won", if decode_bool(&data, 1)? { "true" } else { "false" }),
        EventKind::JackpotWon => Event::new(kind, height)
            .with_field("winner", decode_address_topic(&log.topics, 1)?)
            .with_field(
                "amount",
                format!("{:.2}", decode_u128(&data, 0)? as f64 / WEI_PER_TOKEN),
            )
            .with_field("guess", decode_string(&data, 1)?),
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word32(value: u64) -> Vec<u8> {
        let mut w = vec![0u8; 32];
        w[24..32].copy_from_slice(&value.to_be_bytes());
        w
    }

    fn abi_string_tail(s: &str) -> Vec<u8> {
        let mut out = word32(s.len() as u64);
        out.extend_from_slice(s.as_bytes());
        let pad = (32 - s.len() % 32) % 32;
        out.extend(std::iter::repeat(0).take(pad));
        out
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x1e").unwrap(), 30);
        assert_eq!(parse_hex_u64("ff").unwrap(), 255);
        assert!(parse_hex_u64("0xzz").is_err());
    }

    #[test]
    fn test_decode_dynamic_string() {
        // One head word pointing at offset 32, then the tail.
        let mut data = word32(32);
        data.extend(abi_string_tail("elephant"));
        assert_eq!(decode_string(&data, 0).unwrap(), "elephant");
    }

    #[test]
    fn test_decode_string_rejects_bad_offset() {
        let data = word32(4096);
        assert!(decode_string(&data, 0).is_err());
    }

    #[test]
    fn test_decode_guess_revealed_log() {
        // data: [offset guess][won][guess tail]
        let mut data = word32(64);
        data.extend(word32(0));
        data.extend(abi_string_tail("elephant"));
        let log = LogEntry {
            block_number: "0x64".to_string(),
            topics: vec![
                TOPIC_GUESS_REVEALED.to_string(),
                format!("0x{}{}", "00".repeat(12), "ab".repeat(20)),
            ],
            data: format!("0x{}", hex::encode(&data)),
        };
        let ev = decode_log(EventKind::GuessRevealed, &log).unwrap();
        assert_eq!(ev.block_height, 100);
        assert_eq!(ev.field("guess").unwrap(), "elephant");
        assert_eq!(ev.field("won").unwrap(), "false");
        assert_eq!(ev.field("player").unwrap(), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn test_decode_social_announcement_log() {
        // Two head words, then both tails.
        let mut data = word32(64);
        let tail_a = abi_string_tail("NEW_HINT");
        data.extend(word32(64 + tail_a.len() as u64));
        data.extend(&tail_a);
        data.extend(abi_string_tail("Hint #2 is live"));
        let log = LogEntry {
            block_number: "0x10".to_string(),
            topics: vec![TOPIC_SOCIAL_ANNOUNCEMENT.to_string()],
            data: format!("0x{}", hex::encode(&data)),
        };
        let ev = decode_log(EventKind::SocialAnnouncement, &log).unwrap();
        assert_eq!(ev.field("announcementType").unwrap(), "NEW_HINT");
        assert_eq!(ev.field("message").unwrap(), "Hint #2 is live");
    }

    #[test]
    fn test_decode_u128_reads_low_bytes() {
        let mut w = vec![0u8; 32];
        w[31] = 0x2a;
        assert_eq!(decode_u128(&w, 0).unwrap(), 42);
    }
}
