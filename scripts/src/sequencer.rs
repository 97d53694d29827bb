//! The deploy sequence: cache-backed deployment of the upgrade chain, the
//! upgrade loop driving the Root to the final implementation, and resolution
//! of the protocol addresses.
//!
//! Every step reads chain state or the address cache before acting, so the
//! sequence can be re-run from the start after a failure at any point.

use std::path::Path;

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolValue,
};
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    cache::AddressCache,
    client::ChainClient,
    constants::MAX_UPGRADE_ATTEMPTS_PER_STEP,
    errors::ScriptError,
    types::{ContractKind, DeployedContracts, ResolvedAddresses},
    utils::{address_or_cached, write_json},
};

/// Everything the deploy sequence operates on
pub struct DeployContext<C> {
    /// The chain client deployments and upgrades are sent through
    pub client: C,
    /// The address cache, flushed after every deployment
    pub cache: AddressCache,
    /// Whether a cached address must still have code on chain to be reused
    pub verify_cached: bool,
}

impl<C: ChainClient> DeployContext<C> {
    /// Create a context that trusts cached addresses without checking them
    pub fn new(client: C, cache: AddressCache) -> Self {
        Self {
            client,
            cache,
            verify_cached: false,
        }
    }

    /// Set whether cached addresses are checked for code before reuse
    pub fn with_verify_cached(mut self, verify_cached: bool) -> Self {
        self.verify_cached = verify_cached;
        self
    }

    /// Return the cached address of `name`, or deploy `contract` and cache it.
    ///
    /// The cache is flushed to disk before this returns, so a later failure
    /// never causes this contract to be deployed again. A failed deployment
    /// leaves the cache untouched.
    pub async fn get_or_deploy(
        &mut self,
        name: &str,
        contract: ContractKind,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        if let Some(address) = self.cache.get(name) {
            if self.verify_cached && !self.client.has_code(address).await? {
                return Err(ScriptError::StaleCacheEntry(format!(
                    "`{}` is cached at {:#x} but has no code on chain",
                    name, address
                )));
            }

            info!("{} already deployed at {:#x}", name, address);
            return Ok(address);
        }

        info!("{} not deployed, deploying {}", name, contract);
        let address = self.client.deploy(contract, constructor_args).await?;
        self.cache.insert(name, address)?;
        info!(
            "updated address cache {}: {} -> {:#x}",
            self.cache.path().display(),
            name,
            address
        );

        Ok(address)
    }

    /// Deploy every contract of the upgrade chain, and the Root, that is not
    /// already cached
    pub async fn deploy_contracts(&mut self) -> Result<DeployedContracts, ScriptError> {
        let deployer1 = self.deploy_cached(ContractKind::Deployer1).await?;

        let root_args = Bytes::from(deployer1.abi_encode());
        let root = self
            .get_or_deploy(ContractKind::Root.name(), ContractKind::Root, root_args)
            .await?;

        let deployer2 = self.deploy_cached(ContractKind::Deployer2).await?;
        let deployer3 = self.deploy_cached(ContractKind::Deployer3).await?;
        let implementation = self.deploy_cached(ContractKind::Implementation).await?;

        Ok(DeployedContracts {
            deployer1,
            root,
            deployer2,
            deployer3,
            implementation,
        })
    }

    /// [`Self::get_or_deploy`] for a contract without constructor arguments,
    /// cached under its own name
    async fn deploy_cached(&mut self, contract: ContractKind) -> Result<Address, ScriptError> {
        self.get_or_deploy(contract.name(), contract, Bytes::new())
            .await
    }
}

/// The outcome of one pass over the upgrade chain
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpgradeStep {
    /// The Root already delegates to the last role of the chain
    AlreadyUpgraded,
    /// An `implement` transaction was sent moving the Root one role forward
    Upgraded {
        /// The role the Root delegated to before the pass
        from: ContractKind,
        /// The role installed by the pass
        to: ContractKind,
    },
    /// The Root delegated to an address outside the chain, e.g. a copy of a
    /// role whose deployment never made it into the cache, and an
    /// `implement` was sent re-attaching it to the second role of the chain
    Reattached {
        /// The implementation the Root delegated to before the pass
        observed: Address,
        /// The role installed by the pass
        to: ContractKind,
    },
}

/// Decide the `implement` transaction one pass over `chain` should send, if
/// any, along with the role called through and the address to install
async fn plan_upgrade(
    client: &impl ChainClient,
    root: Address,
    chain: &[(ContractKind, Address)],
) -> Result<Option<(UpgradeStep, ContractKind, Address)>, ScriptError> {
    let observed = client.implementation(root).await?;
    let position = chain.iter().position(|(_, address)| *address == observed);

    let Some(position) = position else {
        // Compare against the first step, as a fresh Root would be
        let (&(first, _), &(second, second_address)) = match chain {
            [first, second, ..] => (first, second),
            _ => {
                return Err(ScriptError::UpgradeChain(format!(
                    "Root {:#x} delegates to {:#x} and the upgrade chain has no step to install",
                    root, observed
                )))
            }
        };

        warn!(
            "Root delegates to {:#x}, which is not part of the upgrade chain, re-attaching it to {}",
            observed, second
        );
        let step = UpgradeStep::Reattached {
            observed,
            to: second,
        };
        return Ok(Some((step, first, second_address)));
    };

    let (current, _) = chain[position];
    let Some(&(next, next_address)) = chain.get(position + 1) else {
        info!("Root already upgraded to {}", current);
        return Ok(None);
    };

    info!("Root delegates to {}, upgrading to {}", current, next);
    let step = UpgradeStep::Upgraded {
        from: current,
        to: next,
    };
    Ok(Some((step, current, next_address)))
}

/// Run one pass over the upgrade chain.
///
/// Reads the Root's implementation pointer and, unless it is already the
/// last role of `chain`, sends a single `implement` moving it to the next
/// role. A pointer outside the chain is treated like the first role, so the
/// pass installs the second. Repeated passes advance monotonically and stop
/// sending transactions once the chain is complete.
pub async fn advance_upgrade_chain(
    client: &impl ChainClient,
    root: Address,
    chain: &[(ContractKind, Address)],
) -> Result<UpgradeStep, ScriptError> {
    match plan_upgrade(client, root, chain).await? {
        Some((step, current, next_address)) => {
            client.implement(root, current, next_address).await?;
            Ok(step)
        }
        None => Ok(UpgradeStep::AlreadyUpgraded),
    }
}

/// Run upgrade passes until the Root delegates to the last role of `chain`,
/// returning the number of `implement` transactions sent.
///
/// A step whose transaction did not take effect is sent again on the next
/// pass, up to [`MAX_UPGRADE_ATTEMPTS_PER_STEP`] times for each step.
pub async fn converge_upgrade_chain(
    client: &impl ChainClient,
    root: Address,
    chain: &[(ContractKind, Address)],
) -> Result<usize, ScriptError> {
    info!(
        "verifying upgrade chain {}",
        chain.iter().map(|(kind, _)| kind).join(" -> ")
    );

    let mut attempts: Vec<(UpgradeStep, usize)> = Vec::new();
    let mut writes = 0;
    while let Some((step, current, next_address)) = plan_upgrade(client, root, chain).await? {
        let index = match attempts.iter().position(|(seen, _)| *seen == step) {
            Some(index) => index,
            None => {
                attempts.push((step, 0));
                attempts.len() - 1
            }
        };
        let sent = &mut attempts[index].1;

        if *sent >= MAX_UPGRADE_ATTEMPTS_PER_STEP {
            warn!("upgrade chain stalled at {:?}", step);
            return Err(ScriptError::UpgradeChain(format!(
                "Root {:#x} did not take {:?} after {} attempts, re-run to resume",
                root, step, sent
            )));
        }

        *sent += 1;
        client.implement(root, current, next_address).await?;
        writes += 1;
    }

    Ok(writes)
}

/// Read the protocol addresses through the Root's final implementation
pub async fn resolve_addresses(
    client: &impl ChainClient,
    root: Address,
) -> Result<ResolvedAddresses, ScriptError> {
    let dollar_address = client.dollar(root).await?;
    let pool_address = client.pool(root).await?;
    let oracle_address = client.oracle(root).await?;
    let pair_address = client.pair(oracle_address).await?;

    Ok(ResolvedAddresses {
        dollar_address,
        pool_address,
        pair_address,
        dao_address: root,
    })
}

/// Run the whole sequence: deploy what is missing, drive the upgrade chain
/// to the final implementation, then resolve the protocol addresses and
/// write them to `output_path`
pub async fn run_full_sequence<C: ChainClient>(
    ctx: &mut DeployContext<C>,
    output_path: &Path,
) -> Result<ResolvedAddresses, ScriptError> {
    let deployed = ctx.deploy_contracts().await?;

    converge_upgrade_chain(&ctx.client, deployed.root, &deployed.upgrade_chain()).await?;

    let addresses = resolve_addresses(&ctx.client, deployed.root).await?;
    info!(
        "resolved addresses: dollar {:#x}, pool {:#x}, pair {:#x}, dao {:#x}",
        addresses.dollar_address,
        addresses.pool_address,
        addresses.pair_address,
        addresses.dao_address
    );

    write_json(output_path, &addresses)?;
    info!("wrote addresses to {}", output_path.display());

    Ok(addresses)
}

/// Point an already-upgraded Root at a new implementation.
///
/// Deploys a fresh, uncached `Implementation` unless `implementation` is
/// given. The Root defaults to the cached `Root` address, which must still
/// have code on chain when the context verifies cached entries. Returns the
/// installed implementation.
pub async fn run_point_upgrade<C: ChainClient>(
    ctx: &DeployContext<C>,
    root: Option<Address>,
    implementation: Option<Address>,
) -> Result<Address, ScriptError> {
    let from_cache = root.is_none();
    let root = address_or_cached(root, &ctx.cache, ContractKind::Root)?;
    if from_cache && ctx.verify_cached && !ctx.client.has_code(root).await? {
        return Err(ScriptError::StaleCacheEntry(format!(
            "`{}` is cached at {:#x} but has no code on chain",
            ContractKind::Root, root
        )));
    }

    let implementation = match implementation {
        Some(address) => address,
        None => {
            info!("deploying a new {}", ContractKind::Implementation);
            ctx.client
                .deploy(ContractKind::Implementation, Bytes::new())
                .await?
        }
    };

    ctx.client.upgrade_to(root, implementation).await?;
    info!("Root {:#x} upgraded to {:#x}", root, implementation);

    Ok(implementation)
}
