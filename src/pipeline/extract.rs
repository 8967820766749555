//! Stage 3: lift the bridge message out of the burn receipt

use tracing::info;

use crate::error::TransferError;
use crate::message::{extract_message, MessageHeader};
use crate::types::{BridgeMessage, BurnReceipt, Stage, TransferRequest};

/// Extract the message emitted by the source MessageTransmitter and check it
/// routes the way the request says
pub fn extract(
    receipt: &BurnReceipt,
    request: &TransferRequest,
) -> Result<(BridgeMessage, MessageHeader), TransferError> {
    let message = extract_message(receipt, request.source().message_transmitter)?;

    let header = MessageHeader::parse(message.payload()).map_err(|reason| {
        TransferError::MalformedMessage {
            burn_tx: receipt.tx_hash,
            reason,
        }
    })?;

    let expected_source = request.source().domain;
    let expected_destination = request.destination().domain;
    if header.source_domain != expected_source || header.destination_domain != expected_destination
    {
        return Err(TransferError::MessageMismatch {
            burn_tx: receipt.tx_hash,
            expected_source,
            expected_destination,
            actual_source: header.source_domain,
            actual_destination: header.destination_domain,
        });
    }

    info!(
        stage = %Stage::Extract,
        burn_tx = %receipt.tx_hash,
        message_hash = %message.hash_hex(),
        nonce = header.nonce,
        payload_len = message.payload().len(),
        "Extracted bridge message"
    );

    Ok((message, header))
}
