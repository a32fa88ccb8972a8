use anyhow::{
    Context,
    Result,
    anyhow,
};
use chrono::Utc;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Devnet,
    Testnet,
    Mainnet,
    Local,
}

impl DeploymentEnv {
    pub const ALL: [DeploymentEnv; 4] = [
        DeploymentEnv::Devnet,
        DeploymentEnv::Testnet,
        DeploymentEnv::Mainnet,
        DeploymentEnv::Local,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Devnet => "devnet",
            DeploymentEnv::Testnet => "testnet",
            DeploymentEnv::Mainnet => "mainnet",
            DeploymentEnv::Local => "local",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Devnet => "Devnet",
            DeploymentEnv::Testnet => "Testnet",
            DeploymentEnv::Mainnet => "Mainnet",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

/// Object ids of one published SuiVenture package, as hex strings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: String,
    pub package_id: String,
    pub network_url: String,
    #[serde(default)]
    pub nft_mint_authority_id: Option<String>,
    #[serde(default)]
    pub random_id: Option<String>,
    #[serde(default)]
    pub transfer_policy_gear_id: Option<String>,
    #[serde(default)]
    pub transfer_policy_pet_id: Option<String>,
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    /// The store for `env` under [`DEPLOYMENTS_ROOT`] in the working directory.
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        Self::in_root(DEPLOYMENTS_ROOT, env)
    }

    pub fn in_root(root: impl AsRef<Path>, env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(root.as_ref(), env)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        read_record(&self.path)
    }

    pub fn save(&self, record: DeploymentRecord) -> Result<()> {
        write_record(&self.path, &record)
    }
}

pub fn ensure_structure(root: impl AsRef<Path>) -> Result<()> {
    for env in DeploymentEnv::ALL {
        let _ = ensure_store(root.as_ref(), env)?;
    }
    Ok(())
}

fn ensure_store(root: &Path, env: DeploymentEnv) -> Result<PathBuf> {
    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).with_context(|| {
            format!("Failed to create deployments directory {}", env_dir.display())
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        fs::write(&file_path, b"").with_context(|| {
            format!(
                "Failed to create deployment record file for {} at {:?}",
                env, file_path
            )
        })?;
    }

    Ok(file_path)
}

fn read_record(path: impl AsRef<Path>) -> Result<Option<DeploymentRecord>> {
    let data = fs::read(path.as_ref()).context("Failed to read deployment records")?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    if let Ok(record) = serde_json::from_slice::<DeploymentRecord>(&data) {
        return Ok(Some(record));
    }
    if let Ok(mut records) = serde_json::from_slice::<Vec<DeploymentRecord>>(&data) {
        return Ok(records.pop());
    }
    Err(anyhow!(
        "Failed to parse deployment record JSON; expected a single deployment object"
    ))
}

fn write_record(path: impl AsRef<Path>, record: &DeploymentRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)
        .context("Failed to serialize deployment record")?;
    fs::write(path.as_ref(), json).context("Failed to write deployment record")?;
    Ok(())
}

/// Ids to remember for a network. `None` keeps whatever the stored record has.
#[derive(Clone, Debug, Default)]
pub struct DeploymentIds {
    pub package_id: String,
    pub nft_mint_authority_id: Option<String>,
    pub random_id: Option<String>,
    pub transfer_policy_gear_id: Option<String>,
    pub transfer_policy_pet_id: Option<String>,
}

pub fn record_deployment(
    store: &DeploymentStore,
    network_url: impl AsRef<str>,
    ids: DeploymentIds,
) -> Result<DeploymentRecord> {
    let previous = store.load()?.unwrap_or_default();
    let record = DeploymentRecord {
        deployed_at: Utc::now().to_rfc3339(),
        package_id: ids.package_id,
        network_url: network_url.as_ref().to_string(),
        nft_mint_authority_id: ids
            .nft_mint_authority_id
            .or(previous.nft_mint_authority_id),
        random_id: ids.random_id.or(previous.random_id),
        transfer_policy_gear_id: ids
            .transfer_policy_gear_id
            .or(previous.transfer_policy_gear_id),
        transfer_policy_pet_id: ids
            .transfer_policy_pet_id
            .or(previous.transfer_policy_pet_id),
    };
    store.save(record.clone())?;
    Ok(record)
}
