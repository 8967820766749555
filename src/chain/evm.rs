//! EVM client for CCTP transactions
//!
//! Signs and submits approve / depositForBurn / receiveMessage on an EVM
//! chain and converts receipts into the pipeline's own types.
//!
//! # Transaction Building
//!
//! Uses Alloy's `ProviderBuilder::with_recommended_fillers()` to populate
//! nonce, gas limit and EIP-1559 fees. Submissions through one client are
//! serialized so nonces from the same signer are handed out in order.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chain::contracts::{MessageTransmitter, TokenMessenger, ERC20};
use crate::chain::{classify_rejection, DestinationChain, SourceChain};
use crate::error::ChainError;
use crate::hash::source_and_nonce_hash;
use crate::registry::ChainEndpoint;
use crate::types::{BurnReceipt, DomainId, LogEntry, Stage, TxConfirmation};

/// alloy-backed client for one chain and one signer
pub struct EvmChainClient<P> {
    provider: P,
    slug: String,
    chain_id: u64,
    signer_address: Address,
    submit_lock: Mutex<()>,
}

impl EvmChainClient<()> {
    /// Connect a signing client to `endpoint`
    pub fn connect(
        endpoint: &ChainEndpoint,
        private_key: &str,
    ) -> Result<EvmChainClient<impl Provider<Http<Client>>>> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| eyre!("Invalid private key for {}: {}", endpoint.slug, e))?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(
                endpoint
                    .rpc_url
                    .parse()
                    .wrap_err_with(|| format!("Invalid RPC URL: {}", endpoint.rpc_url))?,
            );

        info!(
            chain = %endpoint.slug,
            chain_id = endpoint.chain_id,
            address = %signer_address,
            "Created EVM client with signer"
        );

        Ok(EvmChainClient {
            provider,
            slug: endpoint.slug.clone(),
            chain_id: endpoint.chain_id,
            signer_address,
            submit_lock: Mutex::new(()),
        })
    }
}

impl<P: Provider<Http<Client>>> EvmChainClient<P> {
    /// Get the signer address
    pub fn address(&self) -> Address {
        self.signer_address
    }

    /// Check that the RPC serves the chain the registry says it does
    pub async fn verify_chain_id(&self) -> Result<()> {
        let actual = self
            .provider
            .get_chain_id()
            .await
            .wrap_err_with(|| format!("Failed to query chain id for {}", self.slug))?;

        if actual != self.chain_id {
            return Err(eyre!(
                "RPC for {} reports chain id {}, expected {}",
                self.slug,
                actual,
                self.chain_id
            ));
        }
        Ok(())
    }

    /// Check that `transmitter` is deployed for the expected CCTP domain
    pub async fn verify_local_domain(
        &self,
        transmitter: Address,
        expected: DomainId,
    ) -> Result<()> {
        let contract = MessageTransmitter::new(transmitter, &self.provider);
        let actual = contract
            .localDomain()
            .call()
            .await
            .map_err(|e| eyre!("Failed to query localDomain on {}: {}", self.slug, e))?
            ._0;

        if actual != expected.to_u32() {
            return Err(eyre!(
                "MessageTransmitter {} on {} reports domain {}, expected {}",
                transmitter,
                self.slug,
                actual,
                expected
            ));
        }
        Ok(())
    }

    /// Get the ERC20 token balance of the signer
    pub async fn token_balance(&self, token: Address) -> Result<U256> {
        let contract = ERC20::new(token, &self.provider);
        let balance = contract
            .balanceOf(self.signer_address)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get balance: {}", e))?;
        Ok(balance._0)
    }

    /// Get the ERC20 allowance granted by the signer to `spender`
    pub async fn token_allowance(&self, token: Address, spender: Address) -> Result<U256> {
        let contract = ERC20::new(token, &self.provider);
        let allowance = contract
            .allowance(self.signer_address, spender)
            .call()
            .await
            .map_err(|e| eyre!("Failed to get allowance: {}", e))?;
        Ok(allowance._0)
    }
}

/// Reject failed receipts, otherwise summarize as a confirmation
fn confirmed(receipt: &TransactionReceipt) -> Result<TxConfirmation, ChainError> {
    if !receipt.status() {
        return Err(ChainError::Reverted {
            tx_hash: receipt.transaction_hash,
        });
    }
    Ok(TxConfirmation {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
    })
}

/// Copy receipt logs into the pipeline's representation
fn burn_receipt_from(receipt: &TransactionReceipt) -> BurnReceipt {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| LogEntry {
            address: log.inner.address,
            topics: log.inner.data.topics().to_vec(),
            data: log.inner.data.data.clone(),
        })
        .collect();

    BurnReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        logs,
    }
}

#[async_trait]
impl<P: Provider<Http<Client>>> SourceChain for EvmChainClient<P> {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxConfirmation, ChainError> {
        let _guard = self.submit_lock.lock().await;
        let contract = ERC20::new(token, &self.provider);

        debug!(chain = %self.slug, %token, %spender, %amount, "Submitting approve");

        let pending_tx = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| classify_rejection(Stage::Authorize, &e.to_string()))?;
        let tx_hash = *pending_tx.tx_hash();
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| ChainError::Unconfirmed {
                tx_hash,
                reason: format!("Failed to get approve receipt: {}", e),
            })?;

        confirmed(&receipt)
    }

    async fn deposit_for_burn(
        &self,
        messenger: Address,
        amount: U256,
        destination_domain: DomainId,
        mint_recipient: B256,
        burn_token: Address,
    ) -> Result<BurnReceipt, ChainError> {
        let _guard = self.submit_lock.lock().await;
        let contract = TokenMessenger::new(messenger, &self.provider);

        debug!(
            chain = %self.slug,
            %messenger,
            %amount,
            destination_domain = destination_domain.to_u32(),
            %mint_recipient,
            "Submitting depositForBurn"
        );

        let pending_tx = contract
            .depositForBurn(amount, destination_domain.to_u32(), mint_recipient, burn_token)
            .send()
            .await
            .map_err(|e| classify_rejection(Stage::Burn, &e.to_string()))?;
        let tx_hash = *pending_tx.tx_hash();
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| ChainError::Unconfirmed {
                tx_hash,
                reason: format!("Failed to get burn receipt: {}", e),
            })?;

        confirmed(&receipt)?;
        Ok(burn_receipt_from(&receipt))
    }

    async fn burn_receipt(&self, tx_hash: B256) -> Result<BurnReceipt, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to get receipt: {}", e)))?
            .ok_or(ChainError::NotFound(tx_hash))?;

        confirmed(&receipt)?;
        Ok(burn_receipt_from(&receipt))
    }
}

#[async_trait]
impl<P: Provider<Http<Client>>> DestinationChain for EvmChainClient<P> {
    async fn is_nonce_used(
        &self,
        transmitter: Address,
        source_domain: DomainId,
        nonce: u64,
    ) -> Result<bool, ChainError> {
        let contract = MessageTransmitter::new(transmitter, &self.provider);
        let used = contract
            .usedNonces(source_and_nonce_hash(source_domain.to_u32(), nonce))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to read usedNonces: {}", e)))?;
        Ok(!used._0.is_zero())
    }

    async fn receive_message(
        &self,
        transmitter: Address,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<TxConfirmation, ChainError> {
        let _guard = self.submit_lock.lock().await;
        let contract = MessageTransmitter::new(transmitter, &self.provider);

        debug!(
            chain = %self.slug,
            %transmitter,
            message_len = message.len(),
            "Submitting receiveMessage"
        );

        let pending_tx = contract
            .receiveMessage(message.clone(), attestation.clone())
            .send()
            .await
            .map_err(|e| classify_rejection(Stage::Mint, &e.to_string()))?;
        let tx_hash = *pending_tx.tx_hash();
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| ChainError::Unconfirmed {
                tx_hash,
                reason: format!("Failed to get receive receipt: {}", e),
            })?;

        confirmed(&receipt)
    }
}
