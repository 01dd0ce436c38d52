use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::events::{Event, EventKind, JackpotSnapshot};

pub mod rpc;
pub mod wallet;

/// An unsigned game-update transaction addressed at the contract's
/// emitGameUpdate entry point. Nonce and gas price are fetched fresh at
/// submission time, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRequest {
    pub from: String,
    pub to: String,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u64,
    /// UTF-8 message for emitGameUpdate.
    pub payload: String,
}

/// A transaction with its detached signature, ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTx {
    pub tx: TxRequest,
    pub signature: String,
}

pub type TxId = String;

/// Capability seam over the chain endpoint. Implementations must be safe for
/// concurrent independent calls from several tasks.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn latest_height(&self) -> Result<u64>;

    /// Events of one kind in the inclusive height range, ordered by ascending
    /// height (ties broken by emission order within a block).
    async fn query_events(&self, kind: EventKind, from: u64, to: u64) -> Result<Vec<Event>>;

    /// Fresh read of jackpotAmount / totalGuesses / uniquePlayers.
    async fn jackpot_snapshot(&self) -> Result<JackpotSnapshot>;

    async fn transaction_count(&self, address: &str) -> Result<u64>;

    async fn gas_price(&self) -> Result<u64>;

    async fn submit_transaction(&self, tx: SignedTx) -> Result<TxId>;
}

pub fn build_chain(cfg: &Config) -> Result<std::sync::Arc<dyn ChainReader>> {
    Ok(std::sync::Arc::new(rpc::RpcChain::new(
        &cfg.rpc_url,
        &cfg.contract_address,
    )?))
}
