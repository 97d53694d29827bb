//! The chain client used by the deploy sequence.
//!
//! The sequence only depends on the [`ChainClient`] capabilities; [`EvmClient`]
//! implements them against a JSON-RPC node with a local signer.

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use async_trait::async_trait;
use tracing::info;

use crate::{
    artifacts::ArtifactStore,
    errors::ScriptError,
    solidity::{IDao, IDeployer, IOracle},
    types::ContractKind,
};

/// The chain operations the deploy sequence relies on
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Deploy `contract` with the given ABI-encoded constructor arguments,
    /// waiting for the deployment to be mined
    async fn deploy(
        &self,
        contract: ContractKind,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError>;

    /// Whether any code is deployed at `address`
    async fn has_code(&self, address: Address) -> Result<bool, ScriptError>;

    /// The implementation the Root currently delegates to
    async fn implementation(&self, root: Address) -> Result<Address, ScriptError>;

    /// Install `next` as the Root's implementation, calling through the
    /// interface of the `current` role
    async fn implement(
        &self,
        root: Address,
        current: ContractKind,
        next: Address,
    ) -> Result<(), ScriptError>;

    /// Point an upgraded Root at a new implementation
    async fn upgrade_to(&self, root: Address, implementation: Address) -> Result<(), ScriptError>;

    /// The dollar token of the DAO
    async fn dollar(&self, dao: Address) -> Result<Address, ScriptError>;

    /// The liquidity pool of the DAO
    async fn pool(&self, dao: Address) -> Result<Address, ScriptError>;

    /// The price oracle of the DAO
    async fn oracle(&self, dao: Address) -> Result<Address, ScriptError>;

    /// The trading pair observed by the oracle
    async fn pair(&self, oracle: Address) -> Result<Address, ScriptError>;
}

/// A [`ChainClient`] backed by a signing JSON-RPC provider
#[derive(Clone)]
pub struct EvmClient {
    /// The signing provider
    provider: DynProvider,
    /// The address of the signer attached to the provider
    signer_address: Address,
    /// Where contract bytecode is read from
    artifacts: ArtifactStore,
}

impl EvmClient {
    /// Create a client from a signing provider
    pub fn new(provider: DynProvider, signer_address: Address, artifacts: ArtifactStore) -> Self {
        Self {
            provider,
            signer_address,
            artifacts,
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// The address transactions are sent from
    pub fn signer_address(&self) -> Address {
        self.signer_address
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    async fn deploy(
        &self,
        contract: ContractKind,
        constructor_args: Bytes,
    ) -> Result<Address, ScriptError> {
        let artifact = self.artifacts.load(contract)?;
        let mut code = artifact.bytecode.to_vec();
        code.extend_from_slice(&constructor_args);

        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_deploy_code(Bytes::from(code));

        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::ContractDeployment(format!(
                "{} deployment reverted in tx {:#x}",
                contract, receipt.transaction_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "no contract address in receipt of tx {:#x}",
                receipt.transaction_hash
            ))
        })?;
        info!("{} deployed at {:#x}", contract, address);

        Ok(address)
    }

    async fn has_code(&self, address: Address) -> Result<bool, ScriptError> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(!code.is_empty())
    }

    async fn implementation(&self, root: Address) -> Result<Address, ScriptError> {
        IDeployer::new(root, &self.provider)
            .implementation()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn implement(
        &self,
        root: Address,
        current: ContractKind,
        next: Address,
    ) -> Result<(), ScriptError> {
        // Every role shares the `implement` selector, so one binding serves
        // whichever role the Root currently delegates to
        let root_as_current = IDeployer::new(root, &self.provider);
        let receipt = send_tx(root_as_current.implement(next)).await?;
        info!(
            "{} implemented {:#x} in tx {:#x}",
            current, next, receipt.transaction_hash
        );

        Ok(())
    }

    async fn upgrade_to(&self, root: Address, implementation: Address) -> Result<(), ScriptError> {
        let dao = IDao::new(root, &self.provider);
        send_tx(dao.upgradeToE(implementation)).await?;
        Ok(())
    }

    async fn dollar(&self, dao: Address) -> Result<Address, ScriptError> {
        IDao::new(dao, &self.provider)
            .dollar()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn pool(&self, dao: Address) -> Result<Address, ScriptError> {
        IDao::new(dao, &self.provider)
            .pool()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn oracle(&self, dao: Address) -> Result<Address, ScriptError> {
        IDao::new(dao, &self.provider)
            .oracle()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn pair(&self, oracle: Address) -> Result<Address, ScriptError> {
        IOracle::new(oracle, &self.provider)
            .pair()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}

/// Send a contract call as a transaction and wait for it to be mined,
/// failing if it reverted
pub(crate) async fn send_tx<P, D>(
    tx: CallBuilder<P, D, Ethereum>,
) -> Result<TransactionReceipt, ScriptError>
where
    P: Provider<Ethereum>,
    D: CallDecoder,
{
    let receipt = tx
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }

    Ok(receipt)
}
