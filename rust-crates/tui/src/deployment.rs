//! Which network to talk to and where the SuiVenture objects live on it.

use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use deployments::{
    DeploymentEnv,
    DeploymentIds,
    DeploymentRecord,
    DeploymentStore,
};
use std::fmt;
use suiventure::{
    ObjectId,
    config::ContractConfig,
};

pub const DEFAULT_DEVNET_RPC_URL: &str = "https://fullnode.devnet.sui.io:443";
pub const DEFAULT_TESTNET_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";
pub const DEFAULT_MAINNET_RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:9000";

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
    Local,
}

impl Network {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Devnet => DEFAULT_DEVNET_RPC_URL,
            Network::Testnet => DEFAULT_TESTNET_RPC_URL,
            Network::Mainnet => DEFAULT_MAINNET_RPC_URL,
            Network::Local => DEFAULT_LOCAL_RPC_URL,
        }
    }

    pub fn deployment_env(self) -> DeploymentEnv {
        match self {
            Network::Devnet => DeploymentEnv::Devnet,
            Network::Testnet => DeploymentEnv::Testnet,
            Network::Mainnet => DeploymentEnv::Mainnet,
            Network::Local => DeploymentEnv::Local,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.deployment_env())
    }
}

/// Contract ids given on the command line or through the environment.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct ContractIdArgs {
    /// Published SuiVenture package
    #[arg(long, env = "SUIVENTURE_PACKAGE_ID")]
    pub package_id: Option<String>,
    /// Shared mint authority used by gacha pulls and gear upgrades
    #[arg(long, env = "SUIVENTURE_NFT_MINT_AUTHORITY_ID")]
    pub nft_mint_authority_id: Option<String>,
    /// Random object, 0x8 unless overridden
    #[arg(long, env = "SUIVENTURE_RANDOM_ID")]
    pub random_id: Option<String>,
    #[arg(long, env = "SUIVENTURE_TRANSFER_POLICY_GEAR_ID")]
    pub transfer_policy_gear_id: Option<String>,
    #[arg(long, env = "SUIVENTURE_TRANSFER_POLICY_PET_ID")]
    pub transfer_policy_pet_id: Option<String>,
}

/// Flags and environment win over the stored deployment record.
pub fn resolve_contract_config(
    args: &ContractIdArgs,
    record: Option<&DeploymentRecord>,
) -> Result<ContractConfig> {
    let pick = |name: &str,
                given: &Option<String>,
                stored: Option<&String>|
     -> Result<Option<ObjectId>> {
        let Some(raw) = given.as_ref().or(stored) else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() || raw == "0x0" {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .wrap_err_with(|| format!("Invalid {name}"))
    };
    Ok(ContractConfig {
        package_id: pick(
            "package id",
            &args.package_id,
            record.map(|r| &r.package_id),
        )?,
        nft_mint_authority_id: pick(
            "NFT mint authority id",
            &args.nft_mint_authority_id,
            record.and_then(|r| r.nft_mint_authority_id.as_ref()),
        )?,
        random_id: pick(
            "random id",
            &args.random_id,
            record.and_then(|r| r.random_id.as_ref()),
        )?,
        transfer_policy_gear_id: pick(
            "gear transfer policy id",
            &args.transfer_policy_gear_id,
            record.and_then(|r| r.transfer_policy_gear_id.as_ref()),
        )?,
        transfer_policy_pet_id: pick(
            "pet transfer policy id",
            &args.transfer_policy_pet_id,
            record.and_then(|r| r.transfer_policy_pet_id.as_ref()),
        )?,
    })
}

pub fn load_record(store: &DeploymentStore) -> Result<Option<DeploymentRecord>> {
    store
        .load()
        .map_err(|e| eyre!("Reading {}: {e:#}", store.path().display()))
}

pub fn remember(
    store: &DeploymentStore,
    network_url: &str,
    config: &ContractConfig,
) -> Result<DeploymentRecord> {
    let package_id = config
        .package_id
        .ok_or_else(|| eyre!("Cannot remember a deployment without a package id"))?;
    let ids = DeploymentIds {
        package_id: package_id.to_string(),
        nft_mint_authority_id: config.nft_mint_authority_id.map(|id| id.to_string()),
        random_id: config.random_id.map(|id| id.to_string()),
        transfer_policy_gear_id: config.transfer_policy_gear_id.map(|id| id.to_string()),
        transfer_policy_pet_id: config.transfer_policy_pet_id.map(|id| id.to_string()),
    };
    deployments::record_deployment(store, network_url, ids).map_err(|e| eyre!("{e:#}"))
}

/// One line describing where the client is pointed.
pub fn format_deployment_summary(network: Network, url: &str, config: &ContractConfig) -> String {
    let package = config
        .package_id
        .map(|id| id.short())
        .unwrap_or_else(|| "not configured".to_string());
    format!("{network} ({url}) | package {package}")
}
