//! Hash computation for CCTP messages
//!
//! The attestation service indexes burn messages by the keccak256 hash of the
//! raw message bytes emitted in the `MessageSent(bytes)` event. Everything in
//! this module must stay bit-for-bit compatible with that lookup key.

use alloy::primitives::B256;
use tiny_keccak::{Hasher, Keccak};

/// Event signature emitted by the MessageTransmitter for every outbound message
pub const MESSAGE_SENT_SIGNATURE: &str = "MessageSent(bytes)";

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Content hash of a message payload, as the attestation service expects it
pub fn message_hash(payload: &[u8]) -> B256 {
    B256::from(keccak256(payload))
}

/// Topic 0 of the `MessageSent(bytes)` event
pub fn message_sent_topic() -> B256 {
    B256::from(keccak256(MESSAGE_SENT_SIGNATURE.as_bytes()))
}

/// `usedNonces` key on the MessageTransmitter
///
/// `keccak256(abi.encodePacked(uint32 sourceDomain, uint64 nonce))`, 12 bytes
/// big-endian before hashing.
pub fn source_and_nonce_hash(source_domain: u32, nonce: u64) -> B256 {
    let mut packed = [0u8; 12];
    packed[..4].copy_from_slice(&source_domain.to_be_bytes());
    packed[4..].copy_from_slice(&nonce.to_be_bytes());
    B256::from(keccak256(&packed))
}

/// Convert bytes to hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
