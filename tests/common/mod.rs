//! Shared fixtures: in-memory chains and a scripted attestation service
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use cctp_transfer::attestation::{AttestationRecord, AttestationService};
use cctp_transfer::chain::contracts::MessageTransmitter::MessageSent;
use cctp_transfer::chain::{DestinationChain, SourceChain};
use cctp_transfer::message::MessageHeader;
use cctp_transfer::{
    BurnReceipt, ChainError, ChainRegistry, DomainId, LogEntry, TransferRequest, TxConfirmation,
};
use cctp_transfer::AttestationError;

pub const APPROVE_TX: B256 = B256::repeat_byte(0xa1);
pub const BURN_TX: B256 = B256::repeat_byte(0xb1);
pub const MINT_TX: B256 = B256::repeat_byte(0xc1);

/// Nonce carried by every [`message_payload`]
pub const MESSAGE_NONCE: u64 = 271;

pub const NONCE_REUSED: &str = "server returned an error response: error code 3: execution reverted: Nonce already used";

pub fn recipient() -> Address {
    Address::repeat_byte(0x70)
}

/// avalanche-fuji (domain 1) -> sepolia (domain 0)
pub fn fuji_to_sepolia(amount: u128) -> TransferRequest {
    let registry = ChainRegistry::testnet().unwrap();
    TransferRequest::new(
        registry.get("avalanche-fuji").unwrap().clone(),
        registry.get("sepolia").unwrap().clone(),
        recipient(),
        amount,
    )
    .unwrap()
}

/// A CCTP message routed `source -> destination` with a short body
pub fn message_payload(source: u32, destination: u32) -> Bytes {
    MessageHeader {
        version: 0,
        source_domain: DomainId(source),
        destination_domain: DomainId(destination),
        nonce: MESSAGE_NONCE,
        sender: B256::repeat_byte(0x0e),
        recipient: B256::repeat_byte(0x0f),
        destination_caller: B256::ZERO,
    }
    .with_body(&[0x00, 0x00, 0x00, 0x00, 0x12, 0x34])
}

/// Source-side MessageTransmitter of [`fuji_to_sepolia`]
pub fn fuji_transmitter() -> Address {
    fuji_to_sepolia(1).source().message_transmitter
}

/// `MessageSent` emitted by the fuji MessageTransmitter
pub fn message_sent_log(payload: &Bytes) -> LogEntry {
    message_sent_log_from(fuji_transmitter(), payload)
}

pub fn message_sent_log_from(address: Address, payload: &Bytes) -> LogEntry {
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

/// Transfer / Approval style log that must be skipped
pub fn unrelated_log() -> LogEntry {
    LogEntry {
        address: Address::repeat_byte(0x55),
        topics: vec![
            B256::repeat_byte(0xdd),
            B256::left_padding_from(&[0x01]),
            B256::left_padding_from(&[0x02]),
        ],
        data: Bytes::from(U256::from(100_000u64).to_be_bytes::<32>().to_vec()),
    }
}

// ============================================================================
// Mock Chain
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    DepositForBurn {
        messenger: Address,
        amount: U256,
        destination_domain: DomainId,
        mint_recipient: B256,
        burn_token: Address,
    },
    BurnReceipt {
        tx_hash: B256,
    },
    IsNonceUsed {
        transmitter: Address,
        source_domain: DomainId,
        nonce: u64,
    },
    ReceiveMessage {
        transmitter: Address,
        message: Bytes,
        attestation: Bytes,
    },
}

/// In-memory chain serving both sides of a transfer
///
/// Tracks used (source domain, nonce) pairs like a MessageTransmitter and
/// rejects a second receive of the same message with the nonce reuse revert.
#[derive(Default)]
pub struct MockChain {
    calls: Mutex<Vec<ChainCall>>,
    burn_logs: Vec<LogEntry>,
    approve_error: Option<ChainError>,
    burn_error: Option<ChainError>,
    nonce_lookup_error: Option<ChainError>,
    mint_errors: Mutex<VecDeque<ChainError>>,
    used_nonces: Mutex<HashSet<(DomainId, u64)>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_burn_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.burn_logs = logs;
        self
    }

    pub fn with_approve_error(mut self, error: ChainError) -> Self {
        self.approve_error = Some(error);
        self
    }

    pub fn with_burn_error(mut self, error: ChainError) -> Self {
        self.burn_error = Some(error);
        self
    }

    /// Fail every `usedNonces` read with `error`
    pub fn with_nonce_lookup_error(mut self, error: ChainError) -> Self {
        self.nonce_lookup_error = Some(error);
        self
    }

    /// Mark a message as received before the test starts
    pub fn with_used_nonce(self, source_domain: u32, nonce: u64) -> Self {
        self.used_nonces
            .lock()
            .unwrap()
            .insert((DomainId(source_domain), nonce));
        self
    }

    /// Fail the next receive calls with these errors, in order
    pub fn with_mint_errors(self, errors: Vec<ChainError>) -> Self {
        *self.mint_errors.lock().unwrap() = errors.into();
        self
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ChainCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn burn_receipt_value(&self) -> BurnReceipt {
        BurnReceipt {
            tx_hash: BURN_TX,
            block_number: Some(1_000),
            logs: self.burn_logs.clone(),
        }
    }
}

#[async_trait]
impl SourceChain for MockChain {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxConfirmation, ChainError> {
        self.record(ChainCall::Approve {
            token,
            spender,
            amount,
        });
        if let Some(e) = &self.approve_error {
            return Err(e.clone());
        }
        Ok(TxConfirmation {
            tx_hash: APPROVE_TX,
            block_number: Some(999),
        })
    }

    async fn deposit_for_burn(
        &self,
        messenger: Address,
        amount: U256,
        destination_domain: DomainId,
        mint_recipient: B256,
        burn_token: Address,
    ) -> Result<BurnReceipt, ChainError> {
        self.record(ChainCall::DepositForBurn {
            messenger,
            amount,
            destination_domain,
            mint_recipient,
            burn_token,
        });
        if let Some(e) = &self.burn_error {
            return Err(e.clone());
        }
        Ok(self.burn_receipt_value())
    }

    async fn burn_receipt(&self, tx_hash: B256) -> Result<BurnReceipt, ChainError> {
        self.record(ChainCall::BurnReceipt { tx_hash });
        if tx_hash != BURN_TX {
            return Err(ChainError::NotFound(tx_hash));
        }
        Ok(self.burn_receipt_value())
    }
}

#[async_trait]
impl DestinationChain for MockChain {
    async fn is_nonce_used(
        &self,
        transmitter: Address,
        source_domain: DomainId,
        nonce: u64,
    ) -> Result<bool, ChainError> {
        self.record(ChainCall::IsNonceUsed {
            transmitter,
            source_domain,
            nonce,
        });
        if let Some(e) = &self.nonce_lookup_error {
            return Err(e.clone());
        }
        Ok(self
            .used_nonces
            .lock()
            .unwrap()
            .contains(&(source_domain, nonce)))
    }

    async fn receive_message(
        &self,
        transmitter: Address,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<TxConfirmation, ChainError> {
        self.record(ChainCall::ReceiveMessage {
            transmitter,
            message: message.clone(),
            attestation: attestation.clone(),
        });
        if let Some(e) = self.mint_errors.lock().unwrap().pop_front() {
            return Err(e);
        }
        let header = MessageHeader::parse(message)
            .map_err(|e| ChainError::Rejected(format!("execution reverted: {}", e)))?;
        if !self
            .used_nonces
            .lock()
            .unwrap()
            .insert((header.source_domain, header.nonce))
        {
            return Err(ChainError::Rejected(NONCE_REUSED.to_string()));
        }
        Ok(TxConfirmation {
            tx_hash: MINT_TX,
            block_number: Some(2_000),
        })
    }
}

// ============================================================================
// Scripted Attestation Service
// ============================================================================

/// Replays a script of lookups, repeating the last entry once exhausted
pub struct ScriptedAttestation {
    script: Mutex<VecDeque<Result<AttestationRecord, AttestationError>>>,
    calls: AtomicU32,
    requested: Mutex<Vec<B256>>,
}

impl ScriptedAttestation {
    pub fn new(script: Vec<Result<AttestationRecord, AttestationError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    /// `pending` `n` times, then complete with `signature`
    pub fn pending_then_complete(n: usize, signature: Bytes) -> Arc<Self> {
        let mut script = vec![Ok(AttestationRecord::Pending); n];
        script.push(Ok(AttestationRecord::Complete { signature }));
        Self::new(script)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<B256> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttestationService for ScriptedAttestation {
    async fn fetch(&self, message_hash: B256) -> Result<AttestationRecord, AttestationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(message_hash);

        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or(Ok(AttestationRecord::Pending))
        }
    }
}

pub fn deadbeef() -> Bytes {
    Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])
}
