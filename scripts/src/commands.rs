//! Implementations of the various deploy and maintenance scripts

use alloy::{
    primitives::{utils::format_ether, Bytes, U256},
    rpc::types::BlockNumberOrTag,
};
use tracing::info;

use crate::{
    cache::AddressCache,
    cli::{
        AdvanceArgs, BondHistoryArgs, DeployTestnetUsdcArgs, EpochPricesArgs, MigrateArgs,
        MintUsdcArgs,
    },
    client::{send_tx, EvmClient},
    errors::ScriptError,
    sequencer::{run_full_sequence, run_point_upgrade, DeployContext},
    solidity::{IDao, ITestnetUsdc},
    types::{ContractKind, DeployMode, Network},
    utils::address_or_cached,
};

/// Deploy and upgrade the protocol contracts the way `network` calls for
pub async fn migrate(
    args: MigrateArgs,
    network: Network,
    client: EvmClient,
    cache: AddressCache,
) -> Result<(), ScriptError> {
    info!("running {:?} migration on {}", network.mode(), network);
    let mut ctx = DeployContext::new(client, cache).with_verify_cached(args.verify_cached);

    match network.mode() {
        DeployMode::FullSequence => {
            run_full_sequence(&mut ctx, &args.output).await?;
        }
        DeployMode::PointUpgrade => {
            run_point_upgrade(&ctx, args.root, args.implementation).await?;
        }
    }

    Ok(())
}

/// Deploy the test USDC token, unless it is already cached
pub async fn deploy_testnet_usdc(
    args: DeployTestnetUsdcArgs,
    client: EvmClient,
    cache: AddressCache,
) -> Result<(), ScriptError> {
    let mut ctx = DeployContext::new(client, cache).with_verify_cached(args.verify_cached);
    let contract = ContractKind::TestnetUsdc;
    let address = ctx
        .get_or_deploy(contract.name(), contract, Bytes::new())
        .await?;

    println!("{} at {:#x}", contract, address);
    Ok(())
}

/// Mint test USDC to the given account, or to the signer
pub async fn mint_usdc(
    args: MintUsdcArgs,
    client: &EvmClient,
    cache: &AddressCache,
) -> Result<(), ScriptError> {
    let usdc_address = address_or_cached(args.usdc, cache, ContractKind::TestnetUsdc)?;
    let to = args.to.unwrap_or(client.signer_address());

    info!("minting {} USDC base units to {:#x}", args.amount, to);
    let usdc = ITestnetUsdc::new(usdc_address, client.provider());
    let receipt = send_tx(usdc.mint(to, U256::from(args.amount))).await?;
    info!("mint done in tx {:#x}", receipt.transaction_hash);

    Ok(())
}

/// Print the bond totals and the prices of each epoch in the given range
pub async fn epoch_prices(
    args: EpochPricesArgs,
    client: &EvmClient,
    cache: &AddressCache,
) -> Result<(), ScriptError> {
    if args.from >= args.to {
        return Err(ScriptError::Config(format!(
            "empty epoch range {}..{}",
            args.from, args.to
        )));
    }

    let dao_address = address_or_cached(args.dao, cache, ContractKind::Root)?;
    let dao = IDao::new(dao_address, client.provider());

    let total_bonds = dao
        .totalBonds()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    println!("total bonds: {}", format_ether(total_bonds));

    for epoch in args.from..args.to {
        let epoch_arg = U256::from(epoch);
        let epoch_price = dao
            .epochPrice(epoch_arg)
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        let redeemable_price = dao
            .getRedeemablePrice(epoch_arg)
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        let bond_premium = dao
            .getBondPremium(epoch_arg)
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        println!(
            "epoch {}: price {}, redeemable price {}, bond premium {}",
            epoch,
            format_ether(epoch_price),
            format_ether(redeemable_price),
            format_ether(bond_premium)
        );
    }

    Ok(())
}

/// Print the bond totals and an account's bond balance, then replay the bond
/// purchase and redemption events
pub async fn bond_history(
    args: BondHistoryArgs,
    client: &EvmClient,
    cache: &AddressCache,
) -> Result<(), ScriptError> {
    let dao_address = address_or_cached(args.dao, cache, ContractKind::Root)?;
    let dao = IDao::new(dao_address, client.provider());

    let total_bonds = dao
        .totalBonds()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    let total_redeemable = dao
        .totalBondRedeemable()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    let balance = dao
        .balanceOfBonds(args.account, U256::from(args.epoch))
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    println!("total bonds: {}", format_ether(total_bonds));
    println!("total bond redeemable: {}", format_ether(total_redeemable));
    println!(
        "bonds of {:#x} at epoch {}: {}",
        args.account,
        args.epoch,
        format_ether(balance)
    );

    // The full range is queried in one request, which the node may reject on long histories
    let purchases = dao
        .BondPurchase_filter()
        .from_block(BlockNumberOrTag::Number(0))
        .to_block(BlockNumberOrTag::Latest)
        .query()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    for (event, _) in purchases {
        println!(
            "BondPurchase -- epoch: {}, account: {:#x}, dollarAmount: {}, bondAmount: {}",
            event.epoch,
            event.account,
            format_ether(event.dollarAmount),
            format_ether(event.bondAmount)
        );
    }

    let redemptions = dao
        .BondRedemption_filter()
        .from_block(BlockNumberOrTag::Number(0))
        .to_block(BlockNumberOrTag::Latest)
        .query()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    for (event, _) in redemptions {
        println!(
            "BondRedemption -- epoch: {}, account: {:#x}, dollarAmount: {}, bondAmount: {}",
            event.epoch,
            event.account,
            format_ether(event.dollarAmount),
            format_ether(event.bondAmount)
        );
    }

    Ok(())
}

/// Advance the DAO epoch the given number of times
pub async fn advance(
    args: AdvanceArgs,
    client: &EvmClient,
    cache: &AddressCache,
) -> Result<(), ScriptError> {
    let dao_address = address_or_cached(args.dao, cache, ContractKind::Root)?;
    let dao = IDao::new(dao_address, client.provider());

    for i in 1..=args.times {
        send_tx(dao.advance()).await?;
        info!("advance {}/{} ok", i, args.times);
    }

    Ok(())
}
