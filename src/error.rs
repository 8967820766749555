//! Error taxonomy for a transfer
//!
//! Every stage either returns a usable value or one of these errors, which
//! aborts the pipeline. Errors raised after the burn carry its transaction
//! hash so the operator can resume from the extraction stage.

use alloy::primitives::B256;
use thiserror::Error;

use crate::types::{DomainId, Stage};

/// Failure reported by a chain client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Signer cannot pay (no gas, no balance) or is not allowed to act
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Burn contract was not approved for the amount
    #[error("insufficient allowance: {0}")]
    InsufficientAllowance(String),

    /// Token balance below the burn amount
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Chain refused the call (revert, invalid params, paused contract)
    #[error("rejected by chain: {0}")]
    Rejected(String),

    /// Transaction was mined but its status is failure
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },

    /// Transaction was accepted by the node but its receipt could not be read
    #[error("transaction {tx_hash} submitted but not confirmed: {reason}")]
    Unconfirmed { tx_hash: B256, reason: String },

    /// Transaction hash unknown to the node
    #[error("transaction {0} not found")]
    NotFound(B256),

    /// RPC or transport failure
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// Hash of the failed transaction, when the node accepted it
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            ChainError::Reverted { tx_hash }
            | ChainError::Unconfirmed { tx_hash, .. }
            | ChainError::NotFound(tx_hash) => Some(*tx_hash),
            _ => None,
        }
    }

    /// Human-readable reason used for rejection classification
    pub fn reason(&self) -> String {
        match self {
            ChainError::PermissionDenied(r)
            | ChainError::InsufficientAllowance(r)
            | ChainError::InsufficientBalance(r)
            | ChainError::Rejected(r)
            | ChainError::Rpc(r)
            | ChainError::Unconfirmed { reason: r, .. } => r.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure talking to the attestation service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestationError {
    /// Worth polling again (network, 5xx, rate limit)
    #[error("transient attestation service error: {0}")]
    Transient(String),

    /// Request itself is wrong; retrying will not help
    #[error("attestation request rejected: {0}")]
    Rejected(String),
}

/// Pipeline-level error
#[derive(Debug, Error)]
pub enum TransferError {
    /// Missing or invalid configuration, raised before any chain action
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid transfer request: {0}")]
    InvalidRequest(String),

    /// Authorize, burn or mint call failed on chain
    #[error("{stage} stage failed{}: {source}", fmt_tx(.tx_hash))]
    Chain {
        stage: Stage,
        tx_hash: Option<B256>,
        #[source]
        source: ChainError,
    },

    /// Burn receipt has no `MessageSent` log
    #[error("MessageSent event not found in burn receipt {burn_tx} ({log_count} logs)")]
    MessageNotFound { burn_tx: B256, log_count: usize },

    /// Matching log found but its data does not decode
    #[error("malformed message in burn receipt {burn_tx}: {reason}")]
    MalformedMessage { burn_tx: B256, reason: String },

    /// Message header routes somewhere other than this transfer
    #[error(
        "message in burn {burn_tx} routes domain {actual_source} -> {actual_destination}, expected {expected_source} -> {expected_destination}"
    )]
    MessageMismatch {
        burn_tx: B256,
        expected_source: DomainId,
        expected_destination: DomainId,
        actual_source: DomainId,
        actual_destination: DomainId,
    },

    /// Attestation service reported a permanent failure for the message
    #[error("attestation failed for message {message_hash}: {reason}")]
    AttestationFailed { message_hash: B256, reason: String },

    /// Poll budget or deadline exhausted; resume later with the burn tx
    #[error("attestation for message {message_hash} not ready after {attempts} polls")]
    AttestationTimedOut { message_hash: B256, attempts: u32 },

    /// Caller cancelled while waiting for the attestation
    #[error("attestation wait for message {message_hash} cancelled after {attempts} polls")]
    AttestationCancelled { message_hash: B256, attempts: u32 },

    /// Cancelled before the burn was submitted; nothing irreversible happened
    #[error("transfer cancelled before {stage}")]
    Cancelled { stage: Stage },
}

fn fmt_tx(tx_hash: &Option<B256>) -> String {
    match tx_hash {
        Some(hash) => format!(" (tx {})", hash),
        None => String::new(),
    }
}

impl TransferError {
    /// Wrap a chain failure with the stage it happened in
    pub fn chain(stage: Stage, source: ChainError) -> Self {
        TransferError::Chain {
            stage,
            tx_hash: source.tx_hash(),
            source,
        }
    }

    /// Stage the error belongs to, `None` for pre-flight errors
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TransferError::Config(_) | TransferError::InvalidRequest(_) => None,
            TransferError::Chain { stage, .. } | TransferError::Cancelled { stage } => Some(*stage),
            TransferError::MessageNotFound { .. }
            | TransferError::MalformedMessage { .. }
            | TransferError::MessageMismatch { .. } => Some(Stage::Extract),
            TransferError::AttestationFailed { .. }
            | TransferError::AttestationTimedOut { .. }
            | TransferError::AttestationCancelled { .. } => Some(Stage::Attest),
        }
    }

    /// True when the burn already happened (or may still confirm) and stages
    /// 3-5 can be re-run
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            TransferError::AttestationTimedOut { .. }
                | TransferError::AttestationCancelled { .. }
                | TransferError::Chain {
                    stage: Stage::Mint,
                    ..
                }
                | TransferError::Chain {
                    stage: Stage::Burn,
                    source: ChainError::Unconfirmed { .. },
                    ..
                }
        )
    }

    /// Burn transaction to pass to `resume`, when this error leaves one behind
    pub fn resume_burn_tx(&self) -> Option<B256> {
        match self {
            TransferError::Chain {
                stage: Stage::Burn,
                source: ChainError::Unconfirmed { tx_hash, .. },
                ..
            } => Some(*tx_hash),
            _ => None,
        }
    }
}
