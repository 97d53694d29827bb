//! Type definitions used throughout the scripts

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{constants::UPGRADE_CHAIN, errors::ScriptError};

/// The networks the scripts can target
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// A local development node
    Development,
    /// The Rinkeby testnet
    Rinkeby,
    /// The Ropsten testnet
    Ropsten,
}

/// What the `migrate` command does on a given network
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeployMode {
    /// Cache-backed deploy of every contract, then drive the upgrade chain
    /// to completion and resolve the protocol addresses
    FullSequence,
    /// Deploy a fresh implementation and point the Root at it
    PointUpgrade,
}

impl Network {
    /// The behavior of the `migrate` command on this network
    pub fn mode(&self) -> DeployMode {
        match self {
            Network::Mainnet | Network::Development => DeployMode::FullSequence,
            Network::Rinkeby | Network::Ropsten => DeployMode::PointUpgrade,
        }
    }
}

impl FromStr for Network {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "development" => Ok(Network::Development),
            "rinkeby" => Ok(Network::Rinkeby),
            "ropsten" => Ok(Network::Ropsten),
            other => Err(ScriptError::Config(format!(
                "unsupported network `{}`",
                other
            ))),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Development => write!(f, "development"),
            Network::Rinkeby => write!(f, "rinkeby"),
            Network::Ropsten => write!(f, "ropsten"),
        }
    }
}

/// The contracts the scripts deploy.
///
/// The display form is both the build artifact name and the address cache key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// The first migration step, also the Root's initial implementation
    Deployer1,
    /// The second migration step
    Deployer2,
    /// The third migration step
    Deployer3,
    /// The final protocol implementation
    Implementation,
    /// The upgradeable proxy every step is installed onto
    Root,
    /// A mintable USDC stand-in for test networks
    TestnetUsdc,
}

impl ContractKind {
    /// The name of the contract's build artifact, and its key in the address cache
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::Deployer1 => "Deployer1",
            ContractKind::Deployer2 => "Deployer2",
            ContractKind::Deployer3 => "Deployer3",
            ContractKind::Implementation => "Implementation",
            ContractKind::Root => "Root",
            ContractKind::TestnetUsdc => "TestnetUSDC",
        }
    }
}

impl Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The addresses of every contract in a full deployment
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeployedContracts {
    /// The first migration step
    pub deployer1: Address,
    /// The proxy, constructed pointing at `deployer1`
    pub root: Address,
    /// The second migration step
    pub deployer2: Address,
    /// The third migration step
    pub deployer3: Address,
    /// The final implementation
    pub implementation: Address,
}

impl DeployedContracts {
    /// The upgrade chain, pairing each role with its deployed address
    pub fn upgrade_chain(&self) -> Vec<(ContractKind, Address)> {
        UPGRADE_CHAIN
            .into_iter()
            .zip([
                self.deployer1,
                self.deployer2,
                self.deployer3,
                self.implementation,
            ])
            .collect()
    }
}

/// The protocol addresses read back from the upgraded Root
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddresses {
    /// The dollar token
    pub dollar_address: Address,
    /// The liquidity pool
    pub pool_address: Address,
    /// The trading pair the oracle observes
    pub pair_address: Address,
    /// The DAO, which is the Root itself
    pub dao_address: Address,
}
