//! Definitions of CLI arguments and commands for the deploy scripts

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

use crate::{
    cache::AddressCache,
    client::EvmClient,
    commands::{advance, bond_history, deploy_testnet_usdc, epoch_prices, migrate, mint_usdc},
    constants::{
        DEFAULT_ADVANCE_TIMES, DEFAULT_ARTIFACTS_DIR, DEFAULT_CACHE_PATH, DEFAULT_MINT_AMOUNT,
        DEFAULT_OUTPUT_PATH, INFURA_ID_ENV_VAR, PRIVATE_KEY_ENV_VAR,
    },
    errors::ScriptError,
    types::Network,
};

/// Deploy, upgrade and inspect the dollar protocol contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Network to run against: mainnet, development, rinkeby or ropsten
    #[arg(short, long, env = "NETWORK")]
    pub network: String,

    /// Private key of the deployer
    #[arg(short, long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Infura project id, used to derive the RPC URL of public networks
    #[arg(long, env = INFURA_ID_ENV_VAR, hide_env_values = true)]
    pub infura_id: Option<String>,

    /// Network RPC URL, overrides the URL derived from the network
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Path to the address cache
    #[arg(long, default_value = DEFAULT_CACHE_PATH)]
    pub cache_path: PathBuf,

    /// Directory containing the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available scripts
#[derive(Subcommand)]
pub enum Command {
    /// Run the migration for the selected network
    Migrate(MigrateArgs),
    /// Deploy the testnet USDC token, unless already cached
    DeployTestnetUsdc(DeployTestnetUsdcArgs),
    /// Mint testnet USDC
    MintUsdc(MintUsdcArgs),
    /// Print the bond prices of a range of epochs
    EpochPrices(EpochPricesArgs),
    /// Print the bond totals and the full bond event history
    BondHistory(BondHistoryArgs),
    /// Advance the DAO's epoch repeatedly
    Advance(AdvanceArgs),
}

impl Command {
    /// Run the command against the given network
    pub async fn run(
        self,
        network: Network,
        client: EvmClient,
        cache: AddressCache,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Migrate(args) => migrate(args, network, client, cache).await,
            Command::DeployTestnetUsdc(args) => deploy_testnet_usdc(args, client, cache).await,
            Command::MintUsdc(args) => mint_usdc(args, &client, &cache).await,
            Command::EpochPrices(args) => epoch_prices(args, &client, &cache).await,
            Command::BondHistory(args) => bond_history(args, &client, &cache).await,
            Command::Advance(args) => advance(args, &client, &cache).await,
        }
    }
}

/// Run the migration for the selected network.
///
/// On `mainnet` and `development` this deploys every contract missing from
/// the address cache, upgrades the Root through Deployer1, Deployer2,
/// Deployer3 and finally Implementation, and writes the resolved protocol
/// addresses to the output file.
///
/// On `rinkeby` and `ropsten` it deploys a fresh Implementation and points
/// the Root at it.
#[derive(Args)]
pub struct MigrateArgs {
    /// Where to write the resolved protocol addresses
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Check that every cached address still has code before reusing it
    #[arg(long)]
    pub verify_cached: bool,

    /// Root to upgrade on testnets, defaults to the cached Root
    #[arg(long)]
    pub root: Option<Address>,

    /// Existing implementation to point the Root at on testnets,
    /// instead of deploying a new one
    #[arg(long)]
    pub implementation: Option<Address>,
}

/// Deploy the testnet USDC token
#[derive(Args)]
pub struct DeployTestnetUsdcArgs {
    /// Check that a cached token still has code before reusing it
    #[arg(long)]
    pub verify_cached: bool,
}

/// Mint testnet USDC
#[derive(Args)]
pub struct MintUsdcArgs {
    /// The token address, defaults to the cached TestnetUSDC
    #[arg(long)]
    pub usdc: Option<Address>,

    /// The recipient, defaults to the deployer
    #[arg(long)]
    pub to: Option<Address>,

    /// The amount to mint, in base units
    #[arg(long, default_value_t = DEFAULT_MINT_AMOUNT as u128)]
    pub amount: u128,
}

/// Print the bond prices of a range of epochs
#[derive(Args)]
pub struct EpochPricesArgs {
    /// The DAO address, defaults to the cached Root
    #[arg(long)]
    pub dao: Option<Address>,

    /// The first epoch to print
    #[arg(long)]
    pub from: u64,

    /// The epoch after the last one to print
    #[arg(long)]
    pub to: u64,
}

/// Print the bond totals and the full bond event history
#[derive(Args)]
pub struct BondHistoryArgs {
    /// The DAO address, defaults to the cached Root
    #[arg(long)]
    pub dao: Option<Address>,

    /// The account whose bond balance is printed
    #[arg(long)]
    pub account: Address,

    /// The epoch of the bond balance
    #[arg(long)]
    pub epoch: u64,
}

/// Advance the DAO's epoch repeatedly
#[derive(Args)]
pub struct AdvanceArgs {
    /// The DAO address, defaults to the cached Root
    #[arg(long)]
    pub dao: Option<Address>,

    /// The number of `advance` transactions to send
    #[arg(long, default_value_t = DEFAULT_ADVANCE_TIMES)]
    pub times: u64,
}
