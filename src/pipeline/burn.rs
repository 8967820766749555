//! Stage 2: burn on the source chain

use alloy::primitives::U256;
use tracing::{error, info};

use crate::address_codec::address_to_bytes32;
use crate::chain::SourceChain;
use crate::error::TransferError;
use crate::types::{BurnReceipt, Stage, TransferRequest};

/// `tokenMessenger.depositForBurn(amount, destinationDomain, mintRecipient, usdc)`
///
/// Irreversible once this returns `Ok`.
pub async fn burn<S: SourceChain + ?Sized>(
    source: &S,
    request: &TransferRequest,
) -> Result<BurnReceipt, TransferError> {
    let endpoint = request.source();
    let destination_domain = request.destination().domain;
    let mint_recipient = address_to_bytes32(request.recipient());

    let receipt = source
        .deposit_for_burn(
            endpoint.token_messenger,
            U256::from(request.amount()),
            destination_domain,
            mint_recipient,
            endpoint.usdc,
        )
        .await
        .map_err(|e| {
            let err = TransferError::chain(Stage::Burn, e);
            if let Some(burn_tx) = err.resume_burn_tx() {
                error!(
                    %burn_tx,
                    error = %err,
                    "Burn submitted but not confirmed, resume from burn tx {} once it is mined",
                    burn_tx
                );
            }
            err
        })?;

    info!(
        stage = %Stage::Burn,
        chain = %endpoint.slug,
        tx_hash = %receipt.tx_hash,
        block = ?receipt.block_number,
        destination_domain = destination_domain.to_u32(),
        recipient = %request.recipient(),
        "Burned USDC on source chain"
    );

    Ok(receipt)
}
