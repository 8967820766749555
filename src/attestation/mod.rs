//! Attestation lookup and polling
//!
//! Circle signs every burn message off-chain. The signature is fetched by
//! message hash from an HTTP service and repeatedly polled until it is
//! ready.
//!
//! ## Submodules
//!
//! - `iris` - reqwest client for the Iris attestation API
//! - `poller` - fixed-interval, cancellable polling loop

pub mod iris;
pub mod poller;

use std::sync::Arc;

use alloy::primitives::{Bytes, B256};
use async_trait::async_trait;

use crate::error::AttestationError;

pub use iris::IrisAttestationClient;
pub use poller::{AttestationPoller, PollingConfig};

/// State of one attestation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationRecord {
    /// Not signed yet, or not yet known to the service
    Pending,
    /// Signed and ready for the destination chain
    Complete { signature: Bytes },
    /// Service reports the message as permanently invalid
    Failed { reason: String },
}

/// One lookup against an attestation service
#[async_trait]
pub trait AttestationService: Send + Sync {
    /// Look up the attestation for `message_hash`
    async fn fetch(&self, message_hash: B256) -> Result<AttestationRecord, AttestationError>;
}

#[async_trait]
impl<T: AttestationService + ?Sized> AttestationService for Arc<T> {
    async fn fetch(&self, message_hash: B256) -> Result<AttestationRecord, AttestationError> {
        (**self).fetch(message_hash).await
    }
}

