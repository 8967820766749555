//! Process configuration
//!
//! Loaded once from environment variables (optionally seeded from a `.env`
//! file) before any chain action. Secrets are redacted from `Debug` output.

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};

use crate::address_codec::parse_evm_address;
use crate::attestation::PollingConfig;
use crate::pipeline::mint::NONCE_ALREADY_USED;
use crate::pipeline::MintRejectionPolicy;
use crate::registry::validate_http_url;

/// Main configuration for a transfer run
#[derive(Debug, Clone)]
pub struct Config {
    pub transfer: TransferConfig,
    pub signers: SignerConfig,
    pub rpc: RpcConfig,
    pub attestation: AttestationConfig,
    pub mint: MintConfig,
    pub logging: LoggingConfig,
}

/// What to move and where
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Registry slug of the source chain
    pub source_chain: String,
    /// Registry slug of the destination chain
    pub destination_chain: String,
    /// 0x address receiving the minted USDC
    pub recipient: String,
    /// Smallest token units (USDC has 6 decimals)
    pub amount: u128,
}

/// Signing keys for both sides
#[derive(Clone)]
pub struct SignerConfig {
    pub source_private_key: String,
    pub destination_private_key: String,
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("source_private_key", &"<redacted>")
            .field("destination_private_key", &"<redacted>")
            .finish()
    }
}

/// RPC overrides on top of the registry defaults
#[derive(Debug, Clone, Default)]
pub struct RpcConfig {
    pub source_rpc_url: Option<String>,
    pub destination_rpc_url: Option<String>,
}

/// Attestation service access and polling bounds
#[derive(Clone)]
pub struct AttestationConfig {
    /// Base URL override, otherwise the source endpoint's service is used
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub poll_interval_ms: u64,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for AttestationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_attempts", &self.max_attempts)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AttestationConfig {
    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Mint stage settings
#[derive(Debug, Clone)]
pub struct MintConfig {
    /// Revert-reason substrings meaning the message was already received
    pub already_processed_reasons: Vec<String>,
}

impl MintConfig {
    pub fn rejection_policy(&self) -> MintRejectionPolicy {
        MintRejectionPolicy::new(self.already_processed_reasons.clone())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(eyre!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other)),
        }
    }
}

/// Diagnostic output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. `info` or `cctp_transfer=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL` and `LOG_FORMAT`
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            level: var("LOG_LEVEL").unwrap_or_else(default_log_level),
            format: match var("LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => LogFormat::default(),
            },
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

/// Load a `.env` file into the process environment
///
/// An explicit path must exist; without one a `.env` in the working
/// directory is used when present.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .wrap_err_with(|| format!("Failed to load env file from {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

/// Read the process environment
pub fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    var(name).ok_or_else(|| eyre!("{} environment variable is required", name))
}

fn parsed<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .wrap_err_with(|| format!("{} has an invalid value: {}", name, v))
        })
        .transpose()
}

impl Config {
    /// Load from the process environment, after seeding it from `env_file`
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        load_env_file(env_file)?;
        Self::from_vars(env_var)
    }

    /// Build from a variable lookup and validate
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let transfer = TransferConfig {
            source_chain: required(&var, "SOURCE_CHAIN")?,
            destination_chain: required(&var, "DESTINATION_CHAIN")?,
            recipient: required(&var, "RECIPIENT_ADDRESS")?,
            amount: parsed(&var, "AMOUNT")?
                .ok_or_else(|| eyre!("AMOUNT environment variable is required"))?,
        };

        let fallback_key = var("PRIVATE_KEY");
        let signers = SignerConfig {
            source_private_key: var("SOURCE_PRIVATE_KEY")
                .or_else(|| fallback_key.clone())
                .ok_or_else(|| {
                    eyre!("SOURCE_PRIVATE_KEY (or PRIVATE_KEY) environment variable is required")
                })?,
            destination_private_key: var("DESTINATION_PRIVATE_KEY")
                .or(fallback_key)
                .ok_or_else(|| {
                    eyre!(
                        "DESTINATION_PRIVATE_KEY (or PRIVATE_KEY) environment variable is required"
                    )
                })?,
        };

        let rpc = RpcConfig {
            source_rpc_url: var("SOURCE_RPC_URL"),
            destination_rpc_url: var("DESTINATION_RPC_URL"),
        };

        let attestation = AttestationConfig {
            api_url: var("ATTESTATION_API_URL"),
            api_key: var("ATTESTATION_API_KEY"),
            poll_interval_ms: parsed(&var, "ATTESTATION_POLL_INTERVAL_MS")?
                .unwrap_or_else(default_poll_interval_ms),
            max_attempts: parsed(&var, "ATTESTATION_MAX_ATTEMPTS")?,
            timeout_secs: parsed(&var, "ATTESTATION_TIMEOUT_SECS")?,
        };

        let mint = MintConfig {
            already_processed_reasons: var("MINT_ALREADY_PROCESSED_REASONS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec![NONCE_ALREADY_USED.to_string()]),
        };

        let logging = LoggingConfig::from_vars(&var)?;

        let config = Config {
            transfer,
            signers,
            rpc,
            attestation,
            mint,
            logging,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.transfer.amount == 0 {
            return Err(eyre!("AMOUNT must be greater than zero"));
        }

        if self.transfer.source_chain == self.transfer.destination_chain {
            return Err(eyre!(
                "SOURCE_CHAIN and DESTINATION_CHAIN must differ (both are {})",
                self.transfer.source_chain
            ));
        }

        if self.transfer.recipient.len() != 42 || !self.transfer.recipient.starts_with("0x") {
            return Err(eyre!(
                "RECIPIENT_ADDRESS must be a valid hex address (42 chars with 0x prefix)"
            ));
        }
        parse_evm_address(&self.transfer.recipient).wrap_err("RECIPIENT_ADDRESS is invalid")?;

        validate_private_key(&self.signers.source_private_key, "SOURCE_PRIVATE_KEY")?;
        validate_private_key(&self.signers.destination_private_key, "DESTINATION_PRIVATE_KEY")?;

        if let Some(url) = &self.rpc.source_rpc_url {
            validate_http_url(url, "SOURCE_RPC_URL")?;
        }
        if let Some(url) = &self.rpc.destination_rpc_url {
            validate_http_url(url, "DESTINATION_RPC_URL")?;
        }
        if let Some(url) = &self.attestation.api_url {
            validate_http_url(url, "ATTESTATION_API_URL")?;
        }

        if self.attestation.poll_interval_ms == 0 {
            return Err(eyre!("ATTESTATION_POLL_INTERVAL_MS must be greater than zero"));
        }
        if self.attestation.max_attempts == Some(0) {
            return Err(eyre!("ATTESTATION_MAX_ATTEMPTS must be greater than zero"));
        }
        if self.attestation.timeout_secs == Some(0) {
            return Err(eyre!("ATTESTATION_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(())
    }
}

fn validate_private_key(key: &str, name: &str) -> Result<()> {
    if key.len() != 66 || !key.starts_with("0x") {
        return Err(eyre!("{} must be 66 chars (0x + 64 hex chars)", name));
    }
    if hex::decode(&key[2..]).is_err() {
        return Err(eyre!("{} must be hex encoded", name));
    }
    Ok(())
}
