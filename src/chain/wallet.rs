//! Sender identity and transaction signing.
//!
//! Key custody itself is out of scope; the wallet holds the raw key in memory
//! for the task's lifetime, derives the sender address once, and produces a
//! detached HMAC-SHA256 signature over the canonical payload bytes.

use anyhow::Result;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::chain::{SignedTx, TxRequest};
use crate::error::AgentError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug)]
pub struct Wallet {
    key: Vec<u8>,
    address: String,
}

impl Wallet {
    pub fn from_key_hex(key_hex: &str) -> Result<Self> {
        let key = hex::decode(key_hex.trim_start_matches("0x"))
            .map_err(|e| AgentError::Config(format!("PRIVATE_KEY is not hex: {}", e)))?;
        if key.is_empty() {
            return Err(AgentError::Config("PRIVATE_KEY is empty".into()).into());
        }
        let digest = Sha256::digest(&key);
        let address = format!("0x{}", hex::encode(&digest[12..]));
        Ok(Self { key, address })
    }

    /// Sender address, derived once at construction.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Canonical byte encoding of the request; the same bytes are signed and
    /// verified, so field order matters and is fixed here.
    fn canonical(tx: &TxRequest) -> Vec<u8> {
        format!(
            "{}|{}|{}|{}|{}|{}",
            tx.from, tx.to, tx.nonce, tx.gas_limit, tx.gas_price, tx.payload
        )
        .into_bytes()
    }

    pub fn sign(&self, tx: TxRequest) -> Result<SignedTx> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AgentError::Config(format!("signing key rejected: {}", e)))?;
        mac.update(&Self::canonical(&tx));
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(SignedTx { tx, signature })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> TxRequest {
        TxRequest {
            from: "0xsender".to_string(),
            to: "0xcontract".to_string(),
            nonce: 7,
            gas_limit: 200_000,
            gas_price: 1_000_000_000,
            payload: "It's game time!".to_string(),
        }
    }

    #[test]
    fn test_address_is_stable() {
        let a = Wallet::from_key_hex("0xdeadbeef").unwrap();
        let b = Wallet::from_key_hex("deadbeef").unwrap();
        assert_eq!(a.address(), b.address());
        assert!(a.address().starts_with("0x"));
        assert_eq!(a.address().len(), 42);
    }

    #[test]
    fn test_different_keys_different_addresses() {
        let a = Wallet::from_key_hex("deadbeef").unwrap();
        let b = Wallet::from_key_hex("cafebabe").unwrap();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_sign_is_deterministic_and_key_bound() {
        let w = Wallet::from_key_hex("deadbeef").unwrap();
        let s1 = w.sign(tx()).unwrap();
        let s2 = w.sign(tx()).unwrap();
        assert_eq!(s1.signature, s2.signature);
        assert_eq!(s1.signature.len(), 64);

        let other = Wallet::from_key_hex("cafebabe").unwrap();
        assert_ne!(other.sign(tx()).unwrap().signature, s1.signature);
    }

    #[test]
    fn test_signature_covers_nonce() {
        let w = Wallet::from_key_hex("deadbeef").unwrap();
        let mut later = tx();
        later.nonce = 8;
        assert_ne!(w.sign(tx()).unwrap().signature, w.sign(later).unwrap().signature);
    }

    #[test]
    fn test_rejects_non_hex_key() {
        let err = Wallet::from_key_hex("not-hex").unwrap_err();
        assert!(err.to_string().contains("PRIVATE_KEY"));
    }
}
