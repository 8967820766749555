//! CCTP Chain Registry
//!
//! Static table of CCTP-enabled networks. The registry is an ordinary value:
//! build it once at startup ([`ChainRegistry::testnet`]), apply any RPC
//! overrides from configuration, and pass it by reference to whatever needs
//! to resolve a chain.
//!
//! Contract addresses are Circle's CCTP V1 testnet deployments.

use alloy::primitives::{address, Address};
use eyre::{eyre, Result};
use std::fmt;

use crate::types::DomainId;

/// Circle's sandbox attestation service (testnet messages)
pub const IRIS_SANDBOX_URL: &str = "https://iris-api-sandbox.circle.com";

// ============================================================================
// URL Validation
// ============================================================================

/// Validates that a URL uses http/https and has a host component.
pub fn validate_http_url(url_str: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url_str).map_err(|e| eyre!("{} must be a valid URL: {}", name, e))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(eyre!(
            "{} must use http:// or https:// scheme, got {}",
            name,
            scheme
        ));
    }

    if parsed.host_str().is_none() {
        return Err(eyre!("{} must have a host component", name));
    }

    if scheme == "http" {
        tracing::warn!(
            "{} uses unencrypted http://, use https:// in production",
            name
        );
    }

    Ok(())
}

// ============================================================================
// Chain Endpoint
// ============================================================================

/// Everything needed to reach CCTP on one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    /// Registry key (e.g., "avalanche-fuji")
    pub slug: String,
    /// Display name
    pub name: String,
    /// Native EVM chain ID
    pub chain_id: u64,
    /// CCTP domain
    pub domain: DomainId,
    /// TokenMessenger: burn entry point (`depositForBurn`)
    pub token_messenger: Address,
    /// MessageTransmitter: emits `MessageSent`, mints via `receiveMessage`
    pub message_transmitter: Address,
    /// USDC token contract
    pub usdc: Address,
    /// TokenMinter backing the messenger
    pub token_minter: Address,
    /// Default JSON-RPC endpoint
    pub rpc_url: String,
    /// Attestation service base URL (without `/attestations`)
    pub attestation_api: String,
}

impl ChainEndpoint {
    /// Validate the endpoint configuration
    pub fn validate(&self) -> Result<()> {
        if self.slug.is_empty() {
            return Err(eyre!("chain slug is empty"));
        }

        for (label, addr) in [
            ("token_messenger", self.token_messenger),
            ("message_transmitter", self.message_transmitter),
            ("usdc", self.usdc),
        ] {
            if addr == Address::ZERO {
                return Err(eyre!("{} address is zero for chain {}", label, self.slug));
            }
        }

        validate_http_url(&self.rpc_url, &format!("{} rpc_url", self.slug))?;
        validate_http_url(
            &self.attestation_api,
            &format!("{} attestation_api", self.slug),
        )?;

        Ok(())
    }
}

impl fmt::Display for ChainEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (domain {})", self.name, self.domain)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable lookup table of CCTP endpoints
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainEndpoint>,
}

impl ChainRegistry {
    /// Create a registry from a list of endpoints
    pub fn new(chains: Vec<ChainEndpoint>) -> Result<Self> {
        for (idx, chain) in chains.iter().enumerate() {
            chain.validate()?;
            if let Some(dup) = chains[..idx]
                .iter()
                .find(|c| c.slug == chain.slug || c.domain == chain.domain)
            {
                return Err(eyre!(
                    "duplicate chain registration: {} conflicts with {}",
                    chain.slug,
                    dup.slug
                ));
            }
        }
        Ok(Self { chains })
    }

    /// Circle's CCTP testnet deployments
    pub fn testnet() -> Result<Self> {
        let chains = vec![
            ChainEndpoint {
                slug: "sepolia".to_string(),
                name: "Sepolia".to_string(),
                chain_id: 11_155_111,
                domain: DomainId(0),
                token_messenger: address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5"),
                message_transmitter: address!("7865fAfC2db2093669d92c0F33AeEF291086BEFD"),
                usdc: address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
                token_minter: address!("E997d7d2F6E065a9A93Fa2175E878Fb9081F1f0A"),
                rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
                attestation_api: IRIS_SANDBOX_URL.to_string(),
            },
            ChainEndpoint {
                slug: "avalanche-fuji".to_string(),
                name: "Avalanche Fuji Testnet".to_string(),
                chain_id: 43_113,
                domain: DomainId(1),
                token_messenger: address!("eb08f243e5d3fcff26a9e38ae5520a669f4019d0"),
                message_transmitter: address!("a9fb1b3009dcb79e2fe346c16a604b8fa8ae0a79"),
                usdc: address!("5425890298aed601595a70AB815c96711a31Bc65"),
                token_minter: address!("4ed8867f9947a5fe140c9dc1c6f207f3489f501e"),
                rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
                attestation_api: IRIS_SANDBOX_URL.to_string(),
            },
            ChainEndpoint {
                slug: "op-sepolia-testnet".to_string(),
                name: "OP Sepolia Testnet".to_string(),
                chain_id: 11_155_420,
                domain: DomainId(2),
                token_messenger: address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5"),
                message_transmitter: address!("aCF1ceeF35caAc005e15888dDb8A3515C41B4872"),
                usdc: address!("5fd84259d66Cd46123540766Be93DFE6D43130D7"),
                token_minter: address!("E997d7d2F6E065a9A93Fa2175E878Fb9081F1f0A"),
                rpc_url: "https://sepolia.optimism.io".to_string(),
                attestation_api: IRIS_SANDBOX_URL.to_string(),
            },
            ChainEndpoint {
                slug: "arbitrum-sepolia".to_string(),
                name: "Arbitrum Sepolia".to_string(),
                chain_id: 421_614,
                domain: DomainId(3),
                token_messenger: address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5"),
                message_transmitter: address!("aCF1ceeF35caAc005e15888dDb8A3515C41B4872"),
                usdc: address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                token_minter: address!("E997d7d2F6E065a9A93Fa2175E878Fb9081F1f0A"),
                rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_string(),
                attestation_api: IRIS_SANDBOX_URL.to_string(),
            },
            ChainEndpoint {
                slug: "base-sepolia-testnet".to_string(),
                name: "Base Sepolia Testnet".to_string(),
                chain_id: 84_532,
                domain: DomainId(6),
                token_messenger: address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5"),
                message_transmitter: address!("7865fAfC2db2093669d92c0F33AeEF291086BEFD"),
                usdc: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
                token_minter: address!("E997d7d2F6E065a9A93Fa2175E878Fb9081F1f0A"),
                rpc_url: "https://sepolia.base.org".to_string(),
                attestation_api: IRIS_SANDBOX_URL.to_string(),
            },
        ];

        Self::new(chains)
    }

    /// Get an endpoint by slug
    pub fn get(&self, slug: &str) -> Result<&ChainEndpoint> {
        self.chains.iter().find(|c| c.slug == slug).ok_or_else(|| {
            eyre!(
                "unknown chain '{}', expected one of: {}",
                slug,
                self.slugs().join(", ")
            )
        })
    }

    /// Get an endpoint by CCTP domain
    pub fn get_by_domain(&self, domain: DomainId) -> Option<&ChainEndpoint> {
        self.chains.iter().find(|c| c.domain == domain)
    }

    /// All registered slugs, in registry order
    pub fn slugs(&self) -> Vec<&str> {
        self.chains.iter().map(|c| c.slug.as_str()).collect()
    }

    /// Iterate over all endpoints
    pub fn iter(&self) -> impl Iterator<Item = &ChainEndpoint> {
        self.chains.iter()
    }

    /// Number of registered chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Return a copy with one chain's RPC URL replaced
    pub fn with_rpc_override(mut self, slug: &str, rpc_url: &str) -> Result<Self> {
        validate_http_url(rpc_url, &format!("{} rpc_url", slug))?;
        let chain = self
            .chains
            .iter_mut()
            .find(|c| c.slug == slug)
            .ok_or_else(|| eyre!("cannot override RPC for unknown chain '{}'", slug))?;
        chain.rpc_url = rpc_url.to_string();
        Ok(self)
    }

    /// Return a copy with every chain's attestation base URL replaced
    pub fn with_attestation_api(mut self, base_url: &str) -> Result<Self> {
        validate_http_url(base_url, "attestation api url")?;
        for chain in &mut self.chains {
            chain.attestation_api = base_url.trim_end_matches('/').to_string();
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testnet_registry_is_valid() {
        let registry = ChainRegistry::testnet().unwrap();
        assert_eq!(registry.len(), 5);
        assert!(registry.iter().all(|c| c.validate().is_ok()));
    }

    #[test]
    fn test_empty_rpc_url_rejected_by_constructor() {
        let mut chains: Vec<_> = ChainRegistry::testnet().unwrap().iter().cloned().collect();
        chains[1].rpc_url = String::new();

        let err = ChainRegistry::new(chains).unwrap_err();
        assert!(err.to_string().contains("avalanche-fuji"));
    }

    #[test]
    fn test_lookup_by_slug_and_domain() {
        let registry = ChainRegistry::testnet().unwrap();

        let fuji = registry.get("avalanche-fuji").unwrap();
        assert_eq!(fuji.domain, DomainId(1));
        assert_eq!(fuji.chain_id, 43_113);

        let base = registry.get_by_domain(DomainId(6)).unwrap();
        assert_eq!(base.slug, "base-sepolia-testnet");

        assert!(registry.get_by_domain(DomainId(99)).is_none());
    }

    #[test]
    fn test_unknown_slug_lists_known_chains() {
        let registry = ChainRegistry::testnet().unwrap();
        let err = registry.get("goerli").unwrap_err().to_string();
        assert!(err.contains("goerli"));
        assert!(err.contains("sepolia"));
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let registry = ChainRegistry::testnet().unwrap();
        let mut dup = registry.get("sepolia").unwrap().clone();
        dup.slug = "sepolia-2".to_string();

        let mut chains: Vec<_> = registry.iter().cloned().collect();
        chains.push(dup);

        let err = ChainRegistry::new(chains).unwrap_err();
        assert!(err.to_string().contains("sepolia-2"));
    }

    #[test]
    fn test_rpc_override() {
        let registry = ChainRegistry::testnet().unwrap()
            .with_rpc_override("sepolia", "http://localhost:8545")
            .unwrap();
        assert_eq!(registry.get("sepolia").unwrap().rpc_url, "http://localhost:8545");

        assert!(ChainRegistry::testnet().unwrap()
            .with_rpc_override("nope", "http://localhost:8545")
            .is_err());
        assert!(ChainRegistry::testnet().unwrap()
            .with_rpc_override("sepolia", "ws://localhost:8545")
            .is_err());
    }

    #[test]
    fn test_attestation_api_override() {
        let registry = ChainRegistry::testnet().unwrap()
            .with_attestation_api("http://127.0.0.1:3000/")
            .unwrap();
        assert!(registry.iter().all(|c| c.attestation_api == "http://127.0.0.1:3000"));
    }

    #[test]
    fn test_zero_address_rejected() {
        let mut chain = ChainRegistry::testnet().unwrap().get("sepolia").unwrap().clone();
        chain.usdc = Address::ZERO;
        assert!(chain.validate().is_err());
    }
}
