//! Message extraction from burn receipts
//!
//! The MessageTransmitter emits `MessageSent(bytes message)` during
//! `depositForBurn`. The message bytes are the unit the attestation service
//! signs and the destination chain verifies, so they are lifted out of the
//! receipt untouched.

use alloy::primitives::{Address, Bytes, B256};
use alloy::sol_types::SolEvent;
use tracing::{debug, warn};

use crate::chain::contracts::MessageTransmitter::MessageSent;
use crate::error::TransferError;
use crate::hash::{message_sent_topic, source_and_nonce_hash};
use crate::types::{BridgeMessage, BurnReceipt, DomainId};

/// Find the `MessageSent` log emitted by `transmitter` and decode its payload
///
/// Logs with the same signature from any other contract are ignored.
pub fn extract_message(
    receipt: &BurnReceipt,
    transmitter: Address,
) -> Result<BridgeMessage, TransferError> {
    let topic = message_sent_topic();

    let mut matches = receipt.logs.iter().filter(|log| {
        if log.topics.first() != Some(&topic) {
            return false;
        }
        if log.address != transmitter {
            debug!(burn_tx = %receipt.tx_hash, emitter = %log.address, "Skipping foreign MessageSent");
            return false;
        }
        true
    });

    let Some(log) = matches.next() else {
        debug!(receipt = ?receipt, "Burn receipt without MessageSent");
        return Err(TransferError::MessageNotFound {
            burn_tx: receipt.tx_hash,
            log_count: receipt.logs.len(),
        });
    };

    if matches.next().is_some() {
        warn!(
            burn_tx = %receipt.tx_hash,
            "Burn receipt holds more than one MessageSent log, using the first"
        );
    }

    let (payload,) = MessageSent::abi_decode_data(&log.data, true).map_err(|e| {
        TransferError::MalformedMessage {
            burn_tx: receipt.tx_hash,
            reason: e.to_string(),
        }
    })?;

    Ok(BridgeMessage::new(payload))
}

// ============================================================================
// Message Header
// ============================================================================

/// Fixed-size header at the front of every CCTP v1 message
///
/// ```text
/// | version u32 | sourceDomain u32 | destinationDomain u32 | nonce u64 |
/// | sender bytes32 | recipient bytes32 | destinationCaller bytes32 | body... |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u32,
    pub source_domain: DomainId,
    pub destination_domain: DomainId,
    pub nonce: u64,
    pub sender: B256,
    pub recipient: B256,
    pub destination_caller: B256,
}

impl MessageHeader {
    /// Header length in bytes
    pub const LEN: usize = 116;

    /// Parse the header from raw message bytes
    pub fn parse(payload: &[u8]) -> Result<Self, String> {
        if payload.len() < Self::LEN {
            return Err(format!(
                "message is {} bytes, header needs {}",
                payload.len(),
                Self::LEN
            ));
        }

        let u32_at = |offset: usize| {
            u32::from_be_bytes([
                payload[offset],
                payload[offset + 1],
                payload[offset + 2],
                payload[offset + 3],
            ])
        };

        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&payload[12..20]);

        Ok(Self {
            version: u32_at(0),
            source_domain: DomainId(u32_at(4)),
            destination_domain: DomainId(u32_at(8)),
            nonce: u64::from_be_bytes(nonce),
            sender: B256::from_slice(&payload[20..52]),
            recipient: B256::from_slice(&payload[52..84]),
            destination_caller: B256::from_slice(&payload[84..116]),
        })
    }

    /// Key of this message in the destination's `usedNonces` mapping
    pub fn source_and_nonce(&self) -> B256 {
        source_and_nonce_hash(self.source_domain.to_u32(), self.nonce)
    }

    /// Encode the header (used to build fixtures and replay checks)
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&self.source_domain.to_u32().to_be_bytes());
        out.extend_from_slice(&self.destination_domain.to_u32().to_be_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(self.sender.as_slice());
        out.extend_from_slice(self.recipient.as_slice());
        out.extend_from_slice(self.destination_caller.as_slice());
        out
    }

    /// Encode header followed by `body` into a full message
    pub fn with_body(&self, body: &[u8]) -> Bytes {
        let mut out = self.encode();
        out.extend_from_slice(body);
        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogEntry;

    const TRANSMITTER: Address = Address::repeat_byte(0xaa);

    fn header() -> MessageHeader {
        MessageHeader {
            version: 0,
            source_domain: DomainId(1),
            destination_domain: DomainId(0),
            nonce: 42,
            sender: B256::repeat_byte(0x01),
            recipient: B256::repeat_byte(0x02),
            destination_caller: B256::ZERO,
        }
    }

    fn message_log(payload: &Bytes) -> LogEntry {
        message_log_from(TRANSMITTER, payload)
    }

    fn message_log_from(address: Address, payload: &Bytes) -> LogEntry {
        LogEntry {
            address,
            topics: vec![MessageSent::SIGNATURE_HASH],
            data: Bytes::from(
                MessageSent {
                    message: payload.clone(),
                }
                .encode_data(),
            ),
        }
    }

    fn unrelated_log(tag: u8) -> LogEntry {
        LogEntry {
            address: Address::repeat_byte(tag),
            topics: vec![B256::repeat_byte(tag), B256::repeat_byte(tag + 1)],
            data: Bytes::from(vec![tag; 64]),
        }
    }

    #[test]
    fn test_extract_picks_message_sent_among_unrelated_logs() {
        let payload = header().with_body(&[0xde, 0xad]);
        let receipt = BurnReceipt {
            tx_hash: B256::repeat_byte(0x10),
            block_number: Some(7),
            logs: vec![unrelated_log(0x20), message_log(&payload), unrelated_log(0x30)],
        };

        let message = extract_message(&receipt, TRANSMITTER).unwrap();
        assert_eq!(message.payload(), &payload);
        assert_eq!(message.hash(), alloy::primitives::keccak256(&payload));
    }

    #[test]
    fn test_extract_fails_without_matching_topic() {
        let receipt = BurnReceipt {
            tx_hash: B256::repeat_byte(0x10),
            block_number: None,
            logs: vec![unrelated_log(0x20), unrelated_log(0x30)],
        };

        match extract_message(&receipt, TRANSMITTER) {
            Err(TransferError::MessageNotFound { burn_tx, log_count }) => {
                assert_eq!(burn_tx, B256::repeat_byte(0x10));
                assert_eq!(log_count, 2);
            }
            other => panic!("expected MessageNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_fails_on_empty_receipt() {
        let receipt = BurnReceipt {
            tx_hash: B256::ZERO,
            block_number: None,
            logs: vec![],
        };
        assert!(matches!(
            extract_message(&receipt, TRANSMITTER),
            Err(TransferError::MessageNotFound { log_count: 0, .. })
        ));
    }

    #[test]
    fn test_extract_rejects_undecodable_data() {
        let receipt = BurnReceipt {
            tx_hash: B256::ZERO,
            block_number: None,
            logs: vec![LogEntry {
                address: TRANSMITTER,
                topics: vec![MessageSent::SIGNATURE_HASH],
                data: Bytes::from(vec![0xff; 3]),
            }],
        };
        assert!(matches!(
            extract_message(&receipt, TRANSMITTER),
            Err(TransferError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_extract_ignores_message_sent_from_other_contract() {
        let forged = header().with_body(b"forged");
        let payload = header().with_body(&[0xde, 0xad]);
        let other = Address::repeat_byte(0xbb);

        let only_foreign = BurnReceipt {
            tx_hash: B256::repeat_byte(0x10),
            block_number: None,
            logs: vec![message_log_from(other, &forged)],
        };
        assert!(matches!(
            extract_message(&only_foreign, TRANSMITTER),
            Err(TransferError::MessageNotFound { log_count: 1, .. })
        ));

        let both = BurnReceipt {
            tx_hash: B256::repeat_byte(0x10),
            block_number: None,
            logs: vec![message_log_from(other, &forged), message_log(&payload)],
        };
        assert_eq!(extract_message(&both, TRANSMITTER).unwrap().payload(), &payload);
    }

    #[test]
    fn test_header_source_and_nonce_key() {
        assert_eq!(header().source_and_nonce(), source_and_nonce_hash(1, 42));
    }

    #[test]
    fn test_header_parse() {
        let payload = header().with_body(b"body");
        let parsed = MessageHeader::parse(&payload).unwrap();
        assert_eq!(parsed, header());
        assert_eq!(&payload[MessageHeader::LEN..], b"body");
    }

    #[test]
    fn test_header_parse_rejects_short_payload() {
        assert!(MessageHeader::parse(&[0u8; 115]).is_err());
    }
}
