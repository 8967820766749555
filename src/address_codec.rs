//! Canonical Cross-Chain Address Encoding
//!
//! CCTP contracts take the mint recipient as `bytes32`. For EVM chains the
//! canonical form is the 20-byte address left-padded with 12 zero bytes,
//! matching `Message.addressToBytes32` in the MessageTransmitter.
//!
//! ```text
//! | Zero padding (12 bytes) | Raw Address (20 bytes) |
//! ```

use alloy::primitives::{Address, B256};
use eyre::{eyre, Result};

/// Parse an EVM address from a 0x-prefixed hex string
pub fn parse_evm_address(addr: &str) -> Result<Address> {
    let hex_str = addr
        .strip_prefix("0x")
        .ok_or_else(|| eyre!("EVM address must start with 0x: {}", addr))?;

    if hex_str.len() != 40 {
        return Err(eyre!(
            "EVM address must be 40 hex chars after 0x, got {}",
            hex_str.len()
        ));
    }

    let bytes = hex::decode(hex_str).map_err(|e| eyre!("Invalid hex in EVM address: {}", e))?;
    Ok(Address::from_slice(&bytes))
}

/// Convert an EVM address to its canonical bytes32 form (left-padded with zeros)
pub fn address_to_bytes32(addr: Address) -> B256 {
    let mut result = [0u8; 32];
    result[12..32].copy_from_slice(addr.as_slice());
    B256::from(result)
}

/// Recover an EVM address from its canonical bytes32 form
///
/// Fails when the padding bytes are not zero, since such a value was never
/// produced by [`address_to_bytes32`].
pub fn bytes32_to_address(bytes: B256) -> Result<Address> {
    if bytes[..12].iter().any(|b| *b != 0) {
        return Err(eyre!(
            "bytes32 {} is not a left-padded EVM address",
            crate::hash::bytes32_to_hex(&bytes.0)
        ));
    }
    Ok(Address::from_slice(&bytes[12..32]))
}
