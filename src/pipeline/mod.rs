//! Transfer pipeline
//!
//! Runs the five stages strictly in order:
//!
//! 1. `authorize` - approve the TokenMessenger for the amount
//! 2. `burn` - depositForBurn on the source chain
//! 3. `extract` - pull the MessageSent payload out of the burn receipt
//! 4. attest - poll the attestation service for Circle's signature
//! 5. `mint` - receiveMessage on the destination chain
//!
//! Any stage error aborts the run. Once the burn is submitted every failure
//! is logged with the burn transaction hash; [`TransferPipeline::resume`]
//! picks up again from stage 3 with that hash.

pub mod authorize;
pub mod burn;
pub mod extract;
pub mod mint;

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::attestation::{AttestationPoller, AttestationService};
use crate::chain::{DestinationChain, SourceChain};
use crate::error::TransferError;
use crate::types::{BridgeMessage, BurnReceipt, Stage, TransferRequest};

pub use mint::{MintOutcome, MintRejectionPolicy};

/// Everything a completed transfer produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Approve transaction, `None` when resumed from a burn
    pub approve_tx: Option<B256>,
    pub burn_tx: B256,
    pub message: BridgeMessage,
    pub attestation: Bytes,
    pub mint: MintOutcome,
}

/// Orchestrates one transfer over a source chain, a destination chain and an
/// attestation service
pub struct TransferPipeline<S, D, A> {
    source: S,
    destination: D,
    poller: AttestationPoller<A>,
    rejection_policy: MintRejectionPolicy,
}

impl<S, D, A> TransferPipeline<S, D, A>
where
    S: SourceChain,
    D: DestinationChain,
    A: AttestationService,
{
    pub fn new(source: S, destination: D, poller: AttestationPoller<A>) -> Self {
        Self {
            source,
            destination,
            poller,
            rejection_policy: MintRejectionPolicy::default(),
        }
    }

    /// Replace the policy deciding which mint rejections count as already minted
    pub fn with_rejection_policy(mut self, policy: MintRejectionPolicy) -> Self {
        self.rejection_policy = policy;
        self
    }

    /// Run all five stages
    ///
    /// Cancellation is honoured before the burn and while waiting for the
    /// attestation. A confirmed burn is never rolled back.
    pub async fn run(
        &self,
        request: &TransferRequest,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, TransferError> {
        info!(
            source = %request.source().slug,
            destination = %request.destination().slug,
            source_domain = request.source().domain.to_u32(),
            destination_domain = request.destination().domain.to_u32(),
            recipient = %request.recipient(),
            amount = request.amount(),
            "Starting transfer"
        );

        ensure_not_cancelled(cancel, Stage::Authorize)?;
        let approval = authorize::authorize(&self.source, request).await?;

        ensure_not_cancelled(cancel, Stage::Burn)?;
        let receipt = burn::burn(&self.source, request).await?;

        self.complete_from_burn(request, &receipt, Some(approval.tx_hash), cancel)
            .await
    }

    /// Re-run stages 3-5 for a burn that is already confirmed
    pub async fn resume(
        &self,
        request: &TransferRequest,
        burn_tx: B256,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, TransferError> {
        info!(
            %burn_tx,
            source = %request.source().slug,
            destination = %request.destination().slug,
            "Resuming transfer from burn"
        );

        let receipt = self
            .source
            .burn_receipt(burn_tx)
            .await
            .map_err(|e| TransferError::chain(Stage::Extract, e))?;

        self.complete_from_burn(request, &receipt, None, cancel)
            .await
    }

    async fn complete_from_burn(
        &self,
        request: &TransferRequest,
        receipt: &BurnReceipt,
        approve_tx: Option<B256>,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, TransferError> {
        let burn_tx = receipt.tx_hash;

        let result = self.post_burn(request, receipt, cancel).await;
        let (message, attestation, mint) = match result {
            Ok(done) => done,
            Err(e) => {
                error!(
                    %burn_tx,
                    stage = ?e.stage(),
                    resumable = e.is_resumable(),
                    error = %e,
                    "Transfer stopped after burn, resume from burn tx {}",
                    burn_tx
                );
                return Err(e);
            }
        };

        info!(
            ?approve_tx,
            %burn_tx,
            message_hash = %message.hash_hex(),
            mint_tx = ?mint.tx_hash(),
            "Transfer complete"
        );

        Ok(TransferOutcome {
            approve_tx,
            burn_tx,
            message,
            attestation,
            mint,
        })
    }

    async fn post_burn(
        &self,
        request: &TransferRequest,
        receipt: &BurnReceipt,
        cancel: &CancellationToken,
    ) -> Result<(BridgeMessage, Bytes, MintOutcome), TransferError> {
        let (message, header) = extract::extract(receipt, request)?;

        info!(
            stage = %Stage::Attest,
            message_hash = %message.hash_hex(),
            interval_ms = self.poller.config().interval.as_millis() as u64,
            "Waiting for attestation"
        );
        let attestation = self.poller.wait(message.hash(), cancel).await?;

        let mint = mint::mint(
            &self.destination,
            request,
            &message,
            &header,
            &attestation,
            &self.rejection_policy,
        )
        .await?;

        Ok((message, attestation, mint))
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken, stage: Stage) -> Result<(), TransferError> {
    if cancel.is_cancelled() {
        return Err(TransferError::Cancelled { stage });
    }
    Ok(())
}
