//! Stage 5: mint on the destination chain

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chain::DestinationChain;
use crate::error::{ChainError, TransferError};
use crate::message::MessageHeader;
use crate::types::{BridgeMessage, Stage, TransferRequest};

/// Default revert reason of a MessageTransmitter that already consumed the nonce
pub const NONCE_ALREADY_USED: &str = "Nonce already used";

/// How a mint ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintOutcome {
    /// receiveMessage confirmed in this run
    Minted { tx_hash: B256 },
    /// Message was consumed earlier; the funds are already on the destination
    AlreadyProcessed { reason: String },
}

impl MintOutcome {
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            MintOutcome::Minted { tx_hash } => Some(*tx_hash),
            MintOutcome::AlreadyProcessed { .. } => None,
        }
    }
}

/// Decides which mint rejections mean "already minted"
///
/// Matching is a case-insensitive substring test against the rejection
/// reason. Only plain rejections are considered; transport errors and mined
/// reverts are never treated as already processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRejectionPolicy {
    already_processed: Vec<String>,
}

impl Default for MintRejectionPolicy {
    fn default() -> Self {
        Self::new(vec![NONCE_ALREADY_USED.to_string()])
    }
}

impl MintRejectionPolicy {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            already_processed: patterns
                .into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.already_processed
    }

    pub fn is_already_processed(&self, error: &ChainError) -> bool {
        let ChainError::Rejected(reason) = error else {
            return false;
        };
        let reason = reason.to_lowercase();
        self.already_processed.iter().any(|p| reason.contains(p))
    }
}

/// `messageTransmitter.receiveMessage(message, attestation)` on the destination chain
///
/// Skips the submission when `usedNonces` already holds the message's
/// (source domain, nonce). A failed lookup falls through to the submission
/// and the rejection policy.
pub async fn mint<D: DestinationChain + ?Sized>(
    destination: &D,
    request: &TransferRequest,
    message: &BridgeMessage,
    header: &MessageHeader,
    attestation: &Bytes,
    policy: &MintRejectionPolicy,
) -> Result<MintOutcome, TransferError> {
    let endpoint = request.destination();

    match destination
        .is_nonce_used(endpoint.message_transmitter, header.source_domain, header.nonce)
        .await
    {
        Ok(true) => {
            let reason = format!(
                "nonce {} from domain {} already used",
                header.nonce, header.source_domain
            );
            warn!(
                stage = %Stage::Mint,
                chain = %endpoint.slug,
                message_hash = %message.hash_hex(),
                %reason,
                "Message already received on destination chain"
            );
            return Ok(MintOutcome::AlreadyProcessed { reason });
        }
        Ok(false) => {}
        Err(e) => {
            warn!(
                stage = %Stage::Mint,
                chain = %endpoint.slug,
                error = %e,
                "usedNonces lookup failed, submitting receiveMessage"
            );
        }
    }

    match destination
        .receive_message(endpoint.message_transmitter, message.payload(), attestation)
        .await
    {
        Ok(confirmation) => {
            info!(
                stage = %Stage::Mint,
                chain = %endpoint.slug,
                tx_hash = %confirmation.tx_hash,
                recipient = %request.recipient(),
                amount = request.amount(),
                "Minted USDC on destination chain"
            );
            Ok(MintOutcome::Minted {
                tx_hash: confirmation.tx_hash,
            })
        }
        Err(e) if policy.is_already_processed(&e) => {
            warn!(
                stage = %Stage::Mint,
                chain = %endpoint.slug,
                message_hash = %message.hash_hex(),
                reason = %e.reason(),
                "Message already received on destination chain"
            );
            Ok(MintOutcome::AlreadyProcessed { reason: e.reason() })
        }
        Err(e) => Err(TransferError::chain(Stage::Mint, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_nonce_reuse() {
        let policy = MintRejectionPolicy::default();
        assert!(policy.is_already_processed(&ChainError::Rejected(
            "server returned an error response: execution reverted: Nonce already used".into()
        )));
        assert!(!policy.is_already_processed(&ChainError::Rejected(
            "execution reverted: Invalid attestation length".into()
        )));
    }

    #[test]
    fn test_policy_ignores_non_rejections() {
        let policy = MintRejectionPolicy::default();
        assert!(!policy.is_already_processed(&ChainError::Rpc("Nonce already used".into())));
        assert!(!policy.is_already_processed(&ChainError::Reverted {
            tx_hash: B256::ZERO
        }));
    }

    #[test]
    fn test_custom_patterns_case_insensitive() {
        let policy = MintRejectionPolicy::new(vec![
            " Message Already Received ".into(),
            "".into(),
        ]);
        assert_eq!(policy.patterns(), &["message already received".to_string()]);
        assert!(policy.is_already_processed(&ChainError::Rejected(
            "reverted: message already received".into()
        )));
    }

    #[test]
    fn test_outcome_tx_hash() {
        let hash = B256::repeat_byte(0x42);
        assert_eq!(MintOutcome::Minted { tx_hash: hash }.tx_hash(), Some(hash));
        assert_eq!(
            MintOutcome::AlreadyProcessed {
                reason: "x".into()
            }
            .tx_hash(),
            None
        );
    }
}
