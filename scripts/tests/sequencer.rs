//! Tests of the cache-backed deploy sequence

mod common;

use std::fs;

use alloy::primitives::{Address, Bytes};
use common::{mock_context, MockChain, DOLLAR, PAIR, POOL};
use dollar_scripts::{
    cache::AddressCache,
    errors::ScriptError,
    sequencer::{run_full_sequence, run_point_upgrade, DeployContext},
    types::{ContractKind, ResolvedAddresses},
};
use eyre::Result;

#[tokio::test]
async fn test_cached_name_deploys_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut ctx = mock_context(&dir.path().join("cache.json"));

    let first = ctx
        .get_or_deploy("TestnetUSDC", ContractKind::TestnetUsdc, Bytes::new())
        .await?;
    let second = ctx
        .get_or_deploy("TestnetUSDC", ContractKind::TestnetUsdc, Bytes::new())
        .await?;

    assert_eq!(first, second);
    assert_eq!(ctx.client.state().deploys, vec![ContractKind::TestnetUsdc]);
    assert_eq!(ctx.cache.get("TestnetUSDC"), Some(first));
    Ok(())
}

#[tokio::test]
async fn test_full_sequence_from_empty_cache() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let output_path = dir.path().join("addresses.json");
    let mut ctx = mock_context(&cache_path);

    let addresses = run_full_sequence(&mut ctx, &output_path).await?;

    let state = ctx.client.state();
    assert_eq!(
        state.deploys,
        vec![
            ContractKind::Deployer1,
            ContractKind::Root,
            ContractKind::Deployer2,
            ContractKind::Deployer3,
            ContractKind::Implementation,
        ]
    );
    let called_through: Vec<_> = state
        .implement_calls
        .iter()
        .map(|(kind, _)| *kind)
        .collect();
    assert_eq!(
        called_through,
        vec![
            ContractKind::Deployer1,
            ContractKind::Deployer2,
            ContractKind::Deployer3,
        ]
    );

    // Every deployment is persisted
    let cache = AddressCache::load(&cache_path)?;
    assert_eq!(cache.len(), 5);
    let root = cache.get("Root").unwrap();
    assert_eq!(
        state.implementations.get(&root).copied(),
        cache.get("Implementation")
    );

    // The output file holds the addresses read through the final implementation
    let expected = ResolvedAddresses {
        dollar_address: DOLLAR,
        pool_address: POOL,
        pair_address: PAIR,
        dao_address: root,
    };
    assert_eq!(addresses, expected);
    let written: ResolvedAddresses = serde_json::from_str(&fs::read_to_string(&output_path)?)?;
    assert_eq!(written, expected);
    Ok(())
}

#[tokio::test]
async fn test_rerun_is_idempotent() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let output_path = dir.path().join("addresses.json");
    let mut ctx = mock_context(&cache_path);

    let first = run_full_sequence(&mut ctx, &output_path).await?;
    let (deploys, implements) = {
        let state = ctx.client.state();
        (state.deploys.len(), state.implement_calls.len())
    };

    // A second run against the reloaded cache sends nothing
    let mut ctx = DeployContext::new(ctx.client, AddressCache::load(&cache_path)?);
    let second = run_full_sequence(&mut ctx, &output_path).await?;

    let state = ctx.client.state();
    assert_eq!(state.deploys.len(), deploys);
    assert_eq!(state.implement_calls.len(), implements);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_partial_cache_deploys_remaining_in_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let mock = MockChain::default();

    // Deployer1, Root and Deployer2 made it on chain and into the cache
    let deployer1 = mock.register(ContractKind::Deployer1);
    let root = mock.register(ContractKind::Root);
    let deployer2 = mock.register(ContractKind::Deployer2);
    mock.set_implementation(root, deployer1);
    let mut cache = AddressCache::load(&cache_path)?;
    cache.insert("Deployer1", deployer1)?;
    cache.insert("Root", root)?;
    cache.insert("Deployer2", deployer2)?;

    let mut ctx = DeployContext::new(mock, cache);
    let deployed = ctx.deploy_contracts().await?;

    assert_eq!(
        ctx.client.state().deploys,
        vec![ContractKind::Deployer3, ContractKind::Implementation]
    );
    assert_eq!(deployed.deployer1, deployer1);
    assert_eq!(deployed.root, root);
    assert_eq!(deployed.deployer2, deployer2);
    assert_eq!(ctx.cache.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_failed_deploy_resumes_from_cache() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let output_path = dir.path().join("addresses.json");
    let mut ctx = mock_context(&cache_path);
    ctx.client.state().failing_deploy = Some(ContractKind::Deployer3);

    let res = run_full_sequence(&mut ctx, &output_path).await;
    assert!(matches!(res, Err(ScriptError::ContractDeployment(_))));
    assert!(!output_path.exists());

    // Only the completed deployments were persisted
    let cache = AddressCache::load(&cache_path)?;
    assert_eq!(cache.len(), 3);
    assert!(cache.contains("Deployer1"));
    assert!(cache.contains("Root"));
    assert!(cache.contains("Deployer2"));
    assert!(!cache.contains("Deployer3"));

    // Re-running picks up at the first uncached contract
    let client = ctx.client;
    client.state().failing_deploy = None;
    let mut ctx = DeployContext::new(client, cache);
    run_full_sequence(&mut ctx, &output_path).await?;

    assert_eq!(
        ctx.client.state().deploys,
        vec![
            ContractKind::Deployer1,
            ContractKind::Root,
            ContractKind::Deployer2,
            ContractKind::Deployer3,
            ContractKind::Implementation,
        ]
    );
    assert!(output_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_cache_trusted_without_verification() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut ctx = mock_context(&dir.path().join("cache.json"));
    let unknown = Address::repeat_byte(0xee);
    ctx.cache.insert("Deployer1", unknown)?;

    let address = ctx
        .get_or_deploy("Deployer1", ContractKind::Deployer1, Bytes::new())
        .await?;

    assert_eq!(address, unknown);
    let state = ctx.client.state();
    assert_eq!(state.code_checks, 0);
    assert!(state.deploys.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stale_cache_entry_detected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let mut ctx = mock_context(&cache_path).with_verify_cached(true);
    ctx.cache.insert("Deployer1", Address::repeat_byte(0xee))?;

    let res = ctx.deploy_contracts().await;

    assert!(matches!(res, Err(ScriptError::StaleCacheEntry(_))));
    assert!(ctx.client.state().deploys.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_verified_cache_entry_reused() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let mut ctx = mock_context(&cache_path).with_verify_cached(true);
    let deployer1 = ctx.client.register(ContractKind::Deployer1);
    ctx.cache.insert("Deployer1", deployer1)?;

    let address = ctx
        .get_or_deploy("Deployer1", ContractKind::Deployer1, Bytes::new())
        .await?;

    assert_eq!(address, deployer1);
    let state = ctx.client.state();
    assert_eq!(state.code_checks, 1);
    assert!(state.deploys.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_point_upgrade_deploys_uncached_implementation() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut ctx = mock_context(&dir.path().join("cache.json"));
    let root = ctx.client.register(ContractKind::Root);
    let old = ctx.client.register(ContractKind::Implementation);
    ctx.client.set_implementation(root, old);
    ctx.cache.insert("Root", root)?;

    let new = run_point_upgrade(&ctx, None, None).await?;

    assert_ne!(new, old);
    let state = ctx.client.state();
    assert_eq!(state.deploys, vec![ContractKind::Implementation]);
    assert_eq!(state.upgrade_to_calls, vec![(root, new)]);
    assert!(!ctx.cache.contains("Implementation"));
    Ok(())
}

#[tokio::test]
async fn test_point_upgrade_to_existing_implementation() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ctx = mock_context(&dir.path().join("cache.json"));
    let root = ctx.client.register(ContractKind::Root);
    let target = ctx.client.register(ContractKind::Implementation);

    let installed = run_point_upgrade(&ctx, Some(root), Some(target)).await?;

    assert_eq!(installed, target);
    let state = ctx.client.state();
    assert!(state.deploys.is_empty());
    assert_eq!(state.upgrade_to_calls, vec![(root, target)]);
    Ok(())
}

#[tokio::test]
async fn test_point_upgrade_requires_root() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ctx = mock_context(&dir.path().join("cache.json"));

    let res = run_point_upgrade(&ctx, None, None).await;

    assert!(matches!(res, Err(ScriptError::Config(_))));
    let state = ctx.client.state();
    assert!(state.deploys.is_empty());
    assert!(state.upgrade_to_calls.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_point_upgrade_verifies_cached_root() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_path = dir.path().join("cache.json");
    let mut ctx = mock_context(&cache_path).with_verify_cached(true);
    ctx.cache.insert("Root", Address::repeat_byte(0xee))?;

    let res = run_point_upgrade(&ctx, None, None).await;

    assert!(matches!(res, Err(ScriptError::StaleCacheEntry(_))));
    let state = ctx.client.state();
    assert_eq!(state.code_checks, 1);
    assert!(state.deploys.is_empty());
    assert!(state.upgrade_to_calls.is_empty());
    Ok(())
}
