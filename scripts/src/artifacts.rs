//! Loading of compiled contract artifacts.
//!
//! Artifacts are the JSON files emitted by the contracts build, one per contract,
//! named after the contract. Only the creation bytecode is used here.

use std::{fs, path::PathBuf};

use alloy::primitives::Bytes;
use serde::Deserialize;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError, types::ContractKind};

/// The parts of a build artifact the scripts need
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The name of the compiled contract
    pub contract_name: String,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

/// Parse an artifact from its JSON contents, rejecting artifacts without bytecode
/// (interfaces and abstract contracts)
pub fn parse_artifact(contents: &str) -> Result<ContractArtifact, ScriptError> {
    let artifact: ContractArtifact = serde_json::from_str(contents)
        .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    if artifact.bytecode.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "artifact for `{}` has no bytecode",
            artifact.contract_name
        )));
    }

    Ok(artifact)
}

/// A directory of build artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The directory holding one `<ContractName>.json` per contract
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store reading from the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the artifact of the given contract
    pub fn load(&self, contract: ContractKind) -> Result<ContractArtifact, ScriptError> {
        let path = self
            .dir
            .join(contract.name())
            .with_extension(ARTIFACT_EXTENSION);
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        parse_artifact(&contents)
    }
}
