//! Constants used in the deploy scripts

use crate::types::ContractKind;

/// The default path of the address cache, relative to the working directory
pub const DEFAULT_CACHE_PATH: &str = "contracts-cache.json";

/// The default directory holding the compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The default path to which the resolved address set is written
pub const DEFAULT_OUTPUT_PATH: &str = "addresses.json";

/// The environment variable holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "ESD_PRIVATE_KEY";

/// The environment variable holding the Infura project id
pub const INFURA_ID_ENV_VAR: &str = "ESD_INFURA_ID";

/// The RPC URL of a local development node
pub const DEVELOPMENT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The host suffix of the Infura RPC endpoints, prefixed by the network name
pub const INFURA_HOST_SUFFIX: &str = "infura.io/v3";

/// The extension of the contract build artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// The logic contracts installed onto the Root, in upgrade order
pub const UPGRADE_CHAIN: [ContractKind; 4] = [
    ContractKind::Deployer1,
    ContractKind::Deployer2,
    ContractKind::Deployer3,
    ContractKind::Implementation,
];

/// How many `implement` transactions the upgrade loop sends for any one step
/// of the chain before giving up. A step whose transaction is dropped is
/// sent again on the next pass.
pub const MAX_UPGRADE_ATTEMPTS_PER_STEP: usize = 2;

/// The default amount of test USDC minted, in base units (6 decimals)
pub const DEFAULT_MINT_AMOUNT: u64 = 100_000_000_000;

/// The default number of `advance` calls sent by the `advance` command
pub const DEFAULT_ADVANCE_TIMES: u64 = 100;
