//! CCTP Transfer
//!
//! Moves USDC between two CCTP-enabled testnets:
//! 1. Approve the source TokenMessenger for the amount
//! 2. depositForBurn on the source chain
//! 3. Extract the MessageSent payload from the burn receipt
//! 4. Poll Circle's attestation service until the message is signed
//! 5. receiveMessage on the destination chain
//!
//! If anything after the burn fails, `cctp-transfer resume --burn-tx <hash>`
//! finishes the transfer without burning again.

use alloy::primitives::{B256, U256};
use clap::Parser;
use eyre::{eyre, Result, WrapErr};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cctp_transfer::address_codec::parse_evm_address;
use cctp_transfer::attestation::{AttestationPoller, IrisAttestationClient};
use cctp_transfer::chain::EvmChainClient;
use cctp_transfer::cli::{Cli, Command};
use cctp_transfer::config::{self, Config, LogFormat, LoggingConfig};
use cctp_transfer::{ChainRegistry, MintOutcome, TransferOutcome, TransferPipeline, TransferRequest};

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let command = cli.command();

    if command == Command::Chains {
        config::load_env_file(cli.env_file.as_deref())?;
        let mut logging = LoggingConfig::from_vars(config::env_var)?;
        if let Some(level) = cli.log_level {
            logging.level = level;
        }
        init_logging(&logging)?;
        print_chains(&ChainRegistry::testnet()?);
        return Ok(());
    }

    let mut config = Config::load(cli.env_file.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;

    info!("Starting CCTP transfer");
    debug!(config = ?config, "Configuration loaded");

    let registry = build_registry(&config)?;
    let request = TransferRequest::new(
        registry.get(&config.transfer.source_chain)?.clone(),
        registry.get(&config.transfer.destination_chain)?.clone(),
        parse_evm_address(&config.transfer.recipient)?,
        config.transfer.amount,
    )?;

    let source = EvmChainClient::connect(request.source(), &config.signers.source_private_key)?;
    let destination = EvmChainClient::connect(
        request.destination(),
        &config.signers.destination_private_key,
    )?;
    source.verify_chain_id().await?;
    destination.verify_chain_id().await?;
    source
        .verify_local_domain(request.source().message_transmitter, request.source().domain)
        .await?;
    destination
        .verify_local_domain(
            request.destination().message_transmitter,
            request.destination().domain,
        )
        .await?;

    let attestation = IrisAttestationClient::new(
        request.attestation_api(),
        config.attestation.api_key.clone(),
    )?;
    let poller = AttestationPoller::new(attestation, config.attestation.polling());

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_cancel.cancel();
    });

    let outcome = match command {
        Command::Resume { burn_tx } => {
            let pipeline = TransferPipeline::new(source, destination, poller)
                .with_rejection_policy(config.mint.rejection_policy());
            pipeline.resume(&request, burn_tx, &cancel).await?
        }
        _ => {
            let balance = source.token_balance(request.source().usdc).await?;
            if balance < U256::from(request.amount()) {
                return Err(eyre!(
                    "Insufficient USDC on {}: {} has {}, transfer needs {}",
                    request.source().slug,
                    source.address(),
                    balance,
                    request.amount()
                ));
            }
            info!(
                chain = %request.source().slug,
                address = %source.address(),
                %balance,
                "Source USDC balance checked"
            );

            let pipeline = TransferPipeline::new(source, destination, poller)
                .with_rejection_policy(config.mint.rejection_policy());
            pipeline.run(&request, &cancel).await?
        }
    };

    print_summary(&outcome);
    Ok(())
}

/// Registry with RPC and attestation overrides from configuration applied
fn build_registry(config: &Config) -> Result<ChainRegistry> {
    let mut registry = ChainRegistry::testnet()?;

    if let Some(url) = &config.rpc.source_rpc_url {
        registry = registry.with_rpc_override(&config.transfer.source_chain, url)?;
    }
    if let Some(url) = &config.rpc.destination_rpc_url {
        registry = registry.with_rpc_override(&config.transfer.destination_chain, url)?;
    }
    if let Some(url) = &config.attestation.api_url {
        registry = registry.with_attestation_api(url)?;
    }

    Ok(registry)
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .wrap_err_with(|| format!("Invalid log level '{}'", config.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }

    Ok(())
}

fn print_chains(registry: &ChainRegistry) {
    println!(
        "{:<22} {:<24} {:>10} {:>6}  {:<42}  {:<42}",
        "SLUG", "NAME", "CHAIN ID", "DOMAIN", "TOKEN MESSENGER", "MESSAGE TRANSMITTER"
    );
    for chain in registry.iter() {
        println!(
            "{:<22} {:<24} {:>10} {:>6}  {:<42}  {:<42}",
            chain.slug,
            chain.name,
            chain.chain_id,
            chain.domain.to_u32(),
            chain.token_messenger.to_string(),
            chain.message_transmitter.to_string()
        );
    }
}

fn print_summary(outcome: &TransferOutcome) {
    let hash = |h: Option<B256>| h.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string());

    println!("Transfer complete");
    println!("  approve tx:   {}", hash(outcome.approve_tx));
    println!("  burn tx:      {}", outcome.burn_tx);
    println!("  message hash: {}", outcome.message.hash_hex());
    match &outcome.mint {
        MintOutcome::Minted { tx_hash } => println!("  mint tx:      {}", tx_hash),
        MintOutcome::AlreadyProcessed { reason } => {
            println!("  mint:         already processed ({})", reason)
        }
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling transfer");
        }
        _ = terminate => {
            info!("Received SIGTERM, cancelling transfer");
        }
    }
}
