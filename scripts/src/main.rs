use std::str::FromStr;

use clap::Parser;
use dollar_scripts::{
    cache::AddressCache,
    cli::Cli,
    errors::ScriptError,
    types::Network,
    utils::{resolve_rpc_url, setup_client},
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        network,
        priv_key,
        infura_id,
        rpc_url,
        cache_path,
        artifacts_dir,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    // Configuration errors surface before any chain interaction
    let network = Network::from_str(&network)?;
    let rpc_url = resolve_rpc_url(network, rpc_url.as_deref(), infura_id.as_deref())?;
    let cache = AddressCache::load(&cache_path)?;

    let client = setup_client(priv_key.as_deref(), &rpc_url, &artifacts_dir).await?;

    command.run(network, client, cache).await
}
