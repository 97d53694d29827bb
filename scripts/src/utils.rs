//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use serde::Serialize;
use tracing::info;

use crate::{
    artifacts::ArtifactStore,
    cache::AddressCache,
    client::EvmClient,
    constants::{DEVELOPMENT_RPC_URL, INFURA_HOST_SUFFIX, INFURA_ID_ENV_VAR, PRIVATE_KEY_ENV_VAR},
    errors::ScriptError,
    types::{ContractKind, Network},
};

/// Determine the RPC URL to use for `network`.
///
/// An explicit URL always wins. Otherwise the development network uses a
/// local node, and public networks go through Infura, which requires a
/// project id.
pub fn resolve_rpc_url(
    network: Network,
    rpc_url: Option<&str>,
    infura_id: Option<&str>,
) -> Result<String, ScriptError> {
    if let Some(url) = rpc_url.filter(|url| !url.is_empty()) {
        return Ok(url.to_string());
    }

    if network == Network::Development {
        return Ok(DEVELOPMENT_RPC_URL.to_string());
    }

    let infura_id = infura_id.filter(|id| !id.is_empty()).ok_or_else(|| {
        ScriptError::Config(format!(
            "no RPC URL given for {} and {} is not set",
            network, INFURA_ID_ENV_VAR
        ))
    })?;

    Ok(format!("https://{}.{}/{}", network, INFURA_HOST_SUFFIX, infura_id))
}

/// Sets up a signing client for the given RPC URL, failing fast if no
/// private key was provided or the node cannot be reached
pub async fn setup_client(
    priv_key: Option<&str>,
    rpc_url: &str,
    artifacts_dir: &Path,
) -> Result<EvmClient, ScriptError> {
    let priv_key = priv_key.filter(|key| !key.is_empty()).ok_or_else(|| {
        ScriptError::Config(format!(
            "no private key given, set {} or pass --priv-key",
            PRIVATE_KEY_ENV_VAR
        ))
    })?;

    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer_address = signer.address();

    let url = Url::parse(rpc_url)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
    let provider = DynProvider::new(provider);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!("connected to chain {} as {:#x}", chain_id, signer_address);

    Ok(EvmClient::new(
        provider,
        signer_address,
        ArtifactStore::new(artifacts_dir),
    ))
}

/// Use the given address, falling back to the one cached under `contract`
pub fn address_or_cached(
    address: Option<Address>,
    cache: &AddressCache,
    contract: ContractKind,
) -> Result<Address, ScriptError> {
    address
        .or_else(|| cache.get(contract.name()))
        .ok_or_else(|| {
            ScriptError::Config(format!(
                "no {} address given and none in {}",
                contract,
                cache.path().display()
            ))
        })
}

/// Write `value` to `path` as pretty-printed JSON, replacing any existing file
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ScriptError> {
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| ScriptError::WriteOutput(e.to_string()))?;

    fs::write(path, contents)
        .map_err(|e| ScriptError::WriteOutput(format!("{}: {}", path.display(), e)))
}
