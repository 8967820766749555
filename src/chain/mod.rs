//! Chain access for the transfer pipeline
//!
//! The pipeline never talks to an RPC node directly. It goes through two
//! narrow traits, one per side of the transfer, so tests can swap in a fake
//! chain and production uses [`evm::EvmChainClient`].
//!
//! ## Submodules
//!
//! - `contracts` - CCTP contract bindings using alloy sol! macro
//! - `evm` - alloy-backed client implementing both traits

pub mod contracts;
pub mod evm;

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::error::ChainError;
use crate::types::{BurnReceipt, DomainId, Stage, TxConfirmation};

pub use evm::EvmChainClient;

/// Operations the pipeline needs on the source chain
///
/// Every submission returns only after the transaction is confirmed.
#[async_trait]
pub trait SourceChain: Send + Sync {
    /// `token.approve(spender, amount)`
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxConfirmation, ChainError>;

    /// `messenger.depositForBurn(amount, destinationDomain, mintRecipient, burnToken)`
    async fn deposit_for_burn(
        &self,
        messenger: Address,
        amount: U256,
        destination_domain: DomainId,
        mint_recipient: B256,
        burn_token: Address,
    ) -> Result<BurnReceipt, ChainError>;

    /// Fetch the receipt of an already confirmed burn
    async fn burn_receipt(&self, tx_hash: B256) -> Result<BurnReceipt, ChainError>;
}

/// Operations the pipeline needs on the destination chain
#[async_trait]
pub trait DestinationChain: Send + Sync {
    /// Whether `transmitter` already consumed `nonce` from `source_domain`
    async fn is_nonce_used(
        &self,
        transmitter: Address,
        source_domain: DomainId,
        nonce: u64,
    ) -> Result<bool, ChainError>;

    /// `transmitter.receiveMessage(message, attestation)`
    async fn receive_message(
        &self,
        transmitter: Address,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<TxConfirmation, ChainError>;
}

#[async_trait]
impl<T: SourceChain + ?Sized> SourceChain for Arc<T> {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxConfirmation, ChainError> {
        (**self).approve(token, spender, amount).await
    }

    async fn deposit_for_burn(
        &self,
        messenger: Address,
        amount: U256,
        destination_domain: DomainId,
        mint_recipient: B256,
        burn_token: Address,
    ) -> Result<BurnReceipt, ChainError> {
        (**self)
            .deposit_for_burn(messenger, amount, destination_domain, mint_recipient, burn_token)
            .await
    }

    async fn burn_receipt(&self, tx_hash: B256) -> Result<BurnReceipt, ChainError> {
        (**self).burn_receipt(tx_hash).await
    }
}

#[async_trait]
impl<T: DestinationChain + ?Sized> DestinationChain for Arc<T> {
    async fn is_nonce_used(
        &self,
        transmitter: Address,
        source_domain: DomainId,
        nonce: u64,
    ) -> Result<bool, ChainError> {
        (**self).is_nonce_used(transmitter, source_domain, nonce).await
    }

    async fn receive_message(
        &self,
        transmitter: Address,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<TxConfirmation, ChainError> {
        (**self).receive_message(transmitter, message, attestation).await
    }
}

// ============================================================================
// Rejection Classification
// ============================================================================

/// Map a raw provider error into the chain error taxonomy
///
/// Providers only surface revert reasons as text, so classification is by
/// substring, the same way transaction retry errors are classified.
pub fn classify_rejection(stage: Stage, error: &str) -> ChainError {
    let error_lower = error.to_lowercase();
    let reason = error.to_string();

    // Transport failures never reached the chain
    if error_lower.contains("timeout")
        || error_lower.contains("connection")
        || error_lower.contains("error sending request")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
    {
        return ChainError::Rpc(reason);
    }

    // Gas or native balance problems
    if error_lower.contains("insufficient funds")
        || error_lower.contains("gas required exceeds allowance")
        || error_lower.contains("caller is not")
        || error_lower.contains("unauthorized")
    {
        return ChainError::PermissionDenied(reason);
    }

    if stage == Stage::Burn {
        if error_lower.contains("exceeds allowance")
            || error_lower.contains("insufficient allowance")
        {
            return ChainError::InsufficientAllowance(reason);
        }
        if error_lower.contains("exceeds balance")
            || error_lower.contains("insufficient balance")
        {
            return ChainError::InsufficientBalance(reason);
        }
    }

    ChainError::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_transport_errors() {
        assert!(matches!(
            classify_rejection(Stage::Burn, "connection refused"),
            ChainError::Rpc(_)
        ));
        assert!(matches!(
            classify_rejection(Stage::Mint, "HTTP error 503"),
            ChainError::Rpc(_)
        ));
    }

    #[test]
    fn test_classify_permission_errors() {
        assert!(matches!(
            classify_rejection(Stage::Authorize, "insufficient funds for gas * price + value"),
            ChainError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_classify_burn_errors() {
        assert!(matches!(
            classify_rejection(Stage::Burn, "execution reverted: ERC20: transfer amount exceeds allowance"),
            ChainError::InsufficientAllowance(_)
        ));
        assert!(matches!(
            classify_rejection(Stage::Burn, "execution reverted: ERC20: transfer amount exceeds balance"),
            ChainError::InsufficientBalance(_)
        ));
        assert!(matches!(
            classify_rejection(Stage::Burn, "execution reverted: Burn amount exceeds per tx limit"),
            ChainError::Rejected(_)
        ));
    }

    #[test]
    fn test_classify_mint_rejection_keeps_reason() {
        let err = classify_rejection(Stage::Mint, "execution reverted: Nonce already used");
        assert_eq!(
            err,
            ChainError::Rejected("execution reverted: Nonce already used".to_string())
        );
    }
}
