//! CCTP Transfer - Library interface
//!
//! Moves USDC from one chain to another through Circle's Cross-Chain
//! Transfer Protocol: approve, burn, extract the emitted message, wait for
//! Circle's attestation, mint on the destination.
//!
//! The binary wires [`chain::EvmChainClient`] and
//! [`attestation::IrisAttestationClient`] into a
//! [`pipeline::TransferPipeline`]; integration tests use the same pipeline
//! with in-memory chains.

pub mod address_codec;
pub mod attestation;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod message;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use error::{AttestationError, ChainError, TransferError};
pub use pipeline::{MintOutcome, MintRejectionPolicy, TransferOutcome, TransferPipeline};
pub use registry::{ChainEndpoint, ChainRegistry};
pub use types::{BridgeMessage, BurnReceipt, DomainId, LogEntry, Stage, TransferRequest, TxConfirmation};
