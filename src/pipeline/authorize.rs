//! Stage 1: allow the TokenMessenger to pull the burn amount

use alloy::primitives::U256;
use tracing::info;

use crate::chain::SourceChain;
use crate::error::TransferError;
use crate::types::{Stage, TransferRequest, TxConfirmation};

/// `usdc.approve(tokenMessenger, amount)` on the source chain
///
/// Sets the allowance to exactly `amount`; running it twice does not add up.
pub async fn authorize<S: SourceChain + ?Sized>(
    source: &S,
    request: &TransferRequest,
) -> Result<TxConfirmation, TransferError> {
    let endpoint = request.source();

    let confirmation = source
        .approve(
            endpoint.usdc,
            endpoint.token_messenger,
            U256::from(request.amount()),
        )
        .await
        .map_err(|e| TransferError::chain(Stage::Authorize, e))?;

    info!(
        stage = %Stage::Authorize,
        chain = %endpoint.slug,
        tx_hash = %confirmation.tx_hash,
        amount = request.amount(),
        "Approved TokenMessenger to burn USDC"
    );

    Ok(confirmation)
}
