//! Command-line interface

use std::path::PathBuf;

use alloy::primitives::B256;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cctp-transfer")]
#[command(about = "Move USDC between chains with Circle's CCTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Log filter directive, overrides LOG_LEVEL
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Approve, burn, wait for the attestation and mint (default)
    Transfer,

    /// Finish a transfer whose burn is already confirmed
    Resume {
        /// Burn transaction hash on the source chain
        #[arg(long)]
        burn_tx: B256,
    },

    /// List the supported chains
    Chains,
}

impl Cli {
    /// Subcommand to run, `transfer` when none is given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Transfer)
    }
}
