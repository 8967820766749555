//! Iris attestation API client
//!
//! `GET {base}/attestations/{0xhash}` returns
//! `{"status": "pending" | "pending_confirmations" | "complete", "attestation": "0x..."}`.
//! A 404 means the service has not indexed the message yet.

use std::fmt;
use std::time::Duration;

use alloy::primitives::{Bytes, B256};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::attestation::{AttestationRecord, AttestationService};
use crate::error::AttestationError;
use crate::hash::bytes32_to_hex;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Attestation response body
#[derive(Debug, Deserialize)]
struct AttestationResponse {
    status: String,
    #[serde(default)]
    attestation: Option<String>,
}

/// HTTP client for one attestation service base URL
#[derive(Clone)]
pub struct IrisAttestationClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl fmt::Debug for IrisAttestationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrisAttestationClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl IrisAttestationClient {
    /// Create a client for `base_url`
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, AttestationError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AttestationError::Rejected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Lookup URL for a message hash
    pub fn attestation_url(&self, message_hash: B256) -> String {
        format!(
            "{}/attestations/{}",
            self.base_url,
            bytes32_to_hex(&message_hash.0)
        )
    }
}

/// Map a response body to a record
fn parse_response(body: AttestationResponse) -> Result<AttestationRecord, AttestationError> {
    match body.status.as_str() {
        "pending" | "pending_confirmations" => Ok(AttestationRecord::Pending),
        "complete" => {
            let raw = body.attestation.ok_or_else(|| {
                AttestationError::Rejected("complete attestation without signature".to_string())
            })?;
            let signature = hex::decode(raw.trim_start_matches("0x")).map_err(|e| {
                AttestationError::Rejected(format!("attestation is not hex ({}): {}", raw, e))
            })?;
            if signature.is_empty() {
                return Err(AttestationError::Rejected(
                    "complete attestation with empty signature".to_string(),
                ));
            }
            Ok(AttestationRecord::Complete {
                signature: Bytes::from(signature),
            })
        }
        other => Ok(AttestationRecord::Failed {
            reason: format!("attestation status '{}'", other),
        }),
    }
}

#[async_trait]
impl AttestationService for IrisAttestationClient {
    async fn fetch(&self, message_hash: B256) -> Result<AttestationRecord, AttestationError> {
        let url = self.attestation_url(message_hash);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AttestationError::Transient(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "Attestation lookup");

        if status == StatusCode::NOT_FOUND {
            return Ok(AttestationRecord::Pending);
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttestationError::Transient(format!(
                "attestation service returned {}",
                status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AttestationError::Rejected(format!(
                "attestation service returned {}: {}",
                status, text
            )));
        }

        let body: AttestationResponse = response.json().await.map_err(|e| {
            AttestationError::Transient(format!("Failed to parse attestation response: {}", e))
        })?;

        parse_response(body)
    }
}
