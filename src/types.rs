//! Common types for a single cross-chain transfer
//!
//! Everything here is immutable once built: a transfer is described up front
//! and each stage hands the next one a fresh value.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransferError;
use crate::hash::{bytes32_to_hex, message_hash};
use crate::registry::ChainEndpoint;

// ============================================================================
// CCTP Domain
// ============================================================================

/// CCTP domain identifier
///
/// Circle assigns each supported chain a `uint32` domain (Ethereum 0,
/// Avalanche 1, OP 2, Arbitrum 3, Base 6, ...). It is unrelated to the
/// native EVM chain ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainId(pub u32);

impl DomainId {
    /// Convert to u32
    pub fn to_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DomainId {
    fn from(id: u32) -> Self {
        DomainId(id)
    }
}

// ============================================================================
// Pipeline Stages
// ============================================================================

/// The five ordered stages of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Authorize,
    Burn,
    Extract,
    Attest,
    Mint,
}

impl Stage {
    /// Get the stage as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Authorize => "authorize",
            Stage::Burn => "burn",
            Stage::Extract => "extract",
            Stage::Attest => "attest",
            Stage::Mint => "mint",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Transfer Request
// ============================================================================

/// A validated request to move `amount` USDC from one endpoint to another
#[derive(Debug, Clone)]
pub struct TransferRequest {
    source: ChainEndpoint,
    destination: ChainEndpoint,
    recipient: Address,
    amount: u128,
}

impl TransferRequest {
    /// Build a request, enforcing `amount > 0` and distinct endpoints
    pub fn new(
        source: ChainEndpoint,
        destination: ChainEndpoint,
        recipient: Address,
        amount: u128,
    ) -> Result<Self, TransferError> {
        if amount == 0 {
            return Err(TransferError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }
        if source.domain == destination.domain || source.slug == destination.slug {
            return Err(TransferError::InvalidRequest(format!(
                "source and destination must differ (both are {} / domain {})",
                source.slug, source.domain
            )));
        }
        if recipient == Address::ZERO {
            return Err(TransferError::InvalidRequest(
                "recipient must not be the zero address".to_string(),
            ));
        }

        Ok(Self {
            source,
            destination,
            recipient,
            amount,
        })
    }

    pub fn source(&self) -> &ChainEndpoint {
        &self.source
    }

    pub fn destination(&self) -> &ChainEndpoint {
        &self.destination
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// Attestation service for this transfer (the burn side signs the message)
    pub fn attestation_api(&self) -> &str {
        &self.source.attestation_api
    }
}

// ============================================================================
// Chain Results
// ============================================================================

/// A transaction the chain has confirmed (receipt obtained, status success)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxConfirmation {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// A single log entry from a transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics, topic 0 is the event signature hash
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed data
    pub data: Bytes,
}

/// Source chain confirmation of a burn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    /// Logs in emission order
    pub logs: Vec<LogEntry>,
}

// ============================================================================
// Bridge Message
// ============================================================================

/// Message bytes emitted by the burn, plus the hash the attestation service indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    payload: Bytes,
    hash: B256,
}

impl BridgeMessage {
    /// Wrap a payload, computing its content hash
    pub fn new(payload: Bytes) -> Self {
        let hash = message_hash(&payload);
        Self { payload, hash }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Hash as 0x-prefixed lowercase hex (the attestation lookup key)
    pub fn hash_hex(&self) -> String {
        bytes32_to_hex(&self.hash.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ChainRegistry;

    fn recipient() -> Address {
        Address::from([0x11u8; 20])
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(DomainId(6).to_string(), "6");
        assert_eq!(DomainId::from(3).to_u32(), 3);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Authorize.to_string(), "authorize");
        assert_eq!(Stage::Mint.as_str(), "mint");
    }

    #[test]
    fn test_transfer_request_validation() {
        let registry = ChainRegistry::testnet().unwrap();
        let fuji = registry.get("avalanche-fuji").unwrap().clone();
        let sepolia = registry.get("sepolia").unwrap().clone();

        let request =
            TransferRequest::new(fuji.clone(), sepolia.clone(), recipient(), 100_000).unwrap();
        assert_eq!(request.amount(), 100_000);
        assert_eq!(request.source().domain, DomainId(1));
        assert_eq!(request.destination().domain, DomainId(0));

        // Zero amount
        assert!(TransferRequest::new(fuji.clone(), sepolia.clone(), recipient(), 0).is_err());

        // Same endpoint
        assert!(TransferRequest::new(fuji.clone(), fuji.clone(), recipient(), 1).is_err());

        // Zero recipient
        assert!(TransferRequest::new(fuji, sepolia, Address::ZERO, 1).is_err());
    }

    #[test]
    fn test_attestation_api_follows_source() {
        let registry = ChainRegistry::testnet().unwrap();
        let mut fuji = registry.get("avalanche-fuji").unwrap().clone();
        let mut sepolia = registry.get("sepolia").unwrap().clone();
        fuji.attestation_api = "http://127.0.0.1:3001".to_string();
        sepolia.attestation_api = "http://127.0.0.1:3002".to_string();

        let request = TransferRequest::new(fuji, sepolia, recipient(), 1).unwrap();
        assert_eq!(request.attestation_api(), "http://127.0.0.1:3001");
    }

    #[test]
    fn test_bridge_message_hash() {
        let payload = Bytes::from(vec![1u8, 2, 3]);
        let message = BridgeMessage::new(payload.clone());

        assert_eq!(message.payload(), &payload);
        assert_eq!(message.hash(), alloy::primitives::keccak256(&payload));
        assert!(message.hash_hex().starts_with("0x"));
        assert_eq!(message.hash_hex().len(), 66);
    }
}
