//! Definitions of errors that can occur during the execution of the deploy and maintenance scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy and maintenance scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Invalid or missing configuration, raised before any chain interaction
    Config(String),
    /// Error reading the address cache file
    ReadCache(String),
    /// Error writing the address cache file
    WriteCache(String),
    /// Attempted to record a second address under an already-cached name
    CacheConflict(String),
    /// A cached address no longer answers on chain
    StaleCacheEntry(String),
    /// Error parsing a contract build artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The Root's implementation pointer is not where the upgrade chain expects it
    UpgradeChain(String),
    /// Error writing the resolved addresses file
    WriteOutput(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Config(s) => write!(f, "configuration error: {}", s),
            ScriptError::ReadCache(s) => write!(f, "error reading address cache: {}", s),
            ScriptError::WriteCache(s) => write!(f, "error writing address cache: {}", s),
            ScriptError::CacheConflict(s) => write!(f, "address cache conflict: {}", s),
            ScriptError::StaleCacheEntry(s) => write!(f, "stale address cache entry: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::UpgradeChain(s) => write!(f, "upgrade chain error: {}", s),
            ScriptError::WriteOutput(s) => write!(f, "error writing output file: {}", s),
        }
    }
}

impl Error for ScriptError {}
