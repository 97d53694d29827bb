//! An in-memory chain for exercising the deploy sequence

#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use dollar_scripts::{
    cache::AddressCache, client::ChainClient, constants::UPGRADE_CHAIN, errors::ScriptError,
    sequencer::DeployContext, types::ContractKind,
};

/// The dollar token returned by the final implementation
pub const DOLLAR: Address = Address::repeat_byte(0xd0);
/// The pool returned by the final implementation
pub const POOL: Address = Address::repeat_byte(0xb0);
/// The oracle returned by the final implementation
pub const ORACLE: Address = Address::repeat_byte(0x0c);
/// The pair returned by the oracle
pub const PAIR: Address = Address::repeat_byte(0xa1);

/// The observable state of the mock chain
#[derive(Default)]
pub struct MockState {
    /// The number of contracts created so far
    nonce: u8,
    /// Every deployment, in order
    pub deploys: Vec<ContractKind>,
    /// The contract deployed at each address
    pub contracts: HashMap<Address, ContractKind>,
    /// The implementation pointer of each proxy
    pub implementations: HashMap<Address, Address>,
    /// Every `implement` transaction, as (role called through, new implementation)
    pub implement_calls: Vec<(ContractKind, Address)>,
    /// Every `upgradeToE` transaction, as (root, new implementation)
    pub upgrade_to_calls: Vec<(Address, Address)>,
    /// The number of `has_code` queries
    pub code_checks: usize,
    /// How many upcoming `implement` transactions are accepted but have no effect
    pub dropped_implements: usize,
    /// How many upcoming `implement` transactions installing each address
    /// are accepted but have no effect
    pub dropped_targets: HashMap<Address, usize>,
    /// A contract whose deployment reverts
    pub failing_deploy: Option<ContractKind>,
}

impl MockState {
    /// Allocate a fresh address for `contract`
    fn create(&mut self, contract: ContractKind) -> Address {
        self.nonce += 1;
        let address = Address::with_last_byte(self.nonce);
        self.contracts.insert(address, contract);
        address
    }

    /// Fail unless `dao` currently delegates to the final implementation
    fn require_dao(&self, dao: Address) -> Result<(), ScriptError> {
        let delegate = self
            .implementations
            .get(&dao)
            .and_then(|i| self.contracts.get(i));
        match delegate {
            Some(ContractKind::Implementation) => Ok(()),
            _ => Err(ScriptError::ContractInteraction(
                "execution reverted".to_string(),
            )),
        }
    }
}

/// A [`ChainClient`] over [`MockState`]
#[derive(Default)]
pub struct MockChain {
    /// The chain state
    state: Mutex<MockState>,
}

impl MockChain {
    /// Lock the chain state for inspection or setup
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Place a contract on chain without going through `deploy`
    pub fn register(&self, contract: ContractKind) -> Address {
        self.state().create(contract)
    }

    /// Set the implementation pointer of `root`
    pub fn set_implementation(&self, root: Address, implementation: Address) {
        self.state().implementations.insert(root, implementation);
    }

    /// The implementation pointer of `root`
    pub fn implementation_of(&self, root: Address) -> Option<Address> {
        self.state().implementations.get(&root).copied()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn deploy(
        &self,
        contract: ContractKind,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        let mut state = self.state();
        if state.failing_deploy == Some(contract) {
            return Err(ScriptError::ContractDeployment(
                "execution reverted".to_string(),
            ));
        }

        let address = state.create(contract);
        state.deploys.push(contract);
        if contract == ContractKind::Root {
            let initial = Address::from_slice(&constructor_args[12..32]);
            state.implementations.insert(address, initial);
        }

        Ok(address)
    }

    async fn has_code(&self, address: Address) -> Result<bool, ScriptError> {
        let mut state = self.state();
        state.code_checks += 1;
        Ok(state.contracts.contains_key(&address))
    }

    async fn implementation(&self, root: Address) -> Result<Address, ScriptError> {
        self.implementation_of(root)
            .ok_or_else(|| ScriptError::ContractInteraction(format!("no proxy at {root:#x}")))
    }

    async fn implement(
        &self,
        root: Address,
        current: ContractKind,
        next: Address,
    ) -> Result<(), ScriptError> {
        let mut state = self.state();
        state.implement_calls.push((current, next));
        if state.dropped_implements > 0 {
            state.dropped_implements -= 1;
            return Ok(());
        }
        if let Some(remaining) = state.dropped_targets.get_mut(&next).filter(|n| **n > 0) {
            *remaining -= 1;
            return Ok(());
        }

        state.implementations.insert(root, next);
        Ok(())
    }

    async fn upgrade_to(&self, root: Address, implementation: Address) -> Result<(), ScriptError> {
        let mut state = self.state();
        state.upgrade_to_calls.push((root, implementation));
        state.implementations.insert(root, implementation);
        Ok(())
    }

    async fn dollar(&self, dao: Address) -> Result<Address, ScriptError> {
        self.state().require_dao(dao).map(|_| DOLLAR)
    }

    async fn pool(&self, dao: Address) -> Result<Address, ScriptError> {
        self.state().require_dao(dao).map(|_| POOL)
    }

    async fn oracle(&self, dao: Address) -> Result<Address, ScriptError> {
        self.state().require_dao(dao).map(|_| ORACLE)
    }

    async fn pair(&self, oracle: Address) -> Result<Address, ScriptError> {
        if oracle == ORACLE {
            Ok(PAIR)
        } else {
            Err(ScriptError::ContractInteraction(format!(
                "no oracle at {oracle:#x}"
            )))
        }
    }
}

/// A deployed upgrade chain with the Root delegating to the role at `position`
pub struct ChainFixture {
    /// The proxy
    pub root: Address,
    /// Each role of the upgrade chain with its address
    pub chain: Vec<(ContractKind, Address)>,
}

impl ChainFixture {
    /// Place every role and a Root on `mock`, with the Root at `position`
    pub fn new(mock: &MockChain, position: usize) -> Self {
        let chain: Vec<_> = UPGRADE_CHAIN
            .into_iter()
            .map(|kind| (kind, mock.register(kind)))
            .collect();
        let root = mock.register(ContractKind::Root);
        mock.set_implementation(root, chain[position].1);

        Self { root, chain }
    }

    /// The address of `kind` in the chain
    pub fn address_of(&self, kind: ContractKind) -> Address {
        self.chain
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, address)| *address)
            .unwrap()
    }
}

/// A deploy context over a fresh mock chain, with its cache at `cache_path`
pub fn mock_context(cache_path: &Path) -> DeployContext<MockChain> {
    let cache = AddressCache::load(cache_path).unwrap();
    DeployContext::new(MockChain::default(), cache)
}
