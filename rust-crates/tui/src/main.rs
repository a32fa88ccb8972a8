use clap::Parser;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use deployments::DeploymentStore;
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use suiventure::SuiAddress;
use suiventure_tui::{
    deployment::{
        self,
        ContractIdArgs,
        Network,
    },
    sui_cli::{
        DEFAULT_GAS_BUDGET,
        SuiCli,
    },
    wallets,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

/// Terminal client for the SuiVenture dice dungeon.
#[derive(Debug, Parser)]
#[command(name = "suiventure", version)]
struct Cli {
    /// Network to play on
    #[arg(long, value_enum, default_value_t = Network::Testnet)]
    network: Network,
    /// Override the full node RPC URL for the selected network
    #[arg(long)]
    rpc_url: Option<String>,
    /// Account to play as; defaults to the sui CLI's active address
    #[arg(long, env = "SUIVENTURE_ADDRESS")]
    address: Option<String>,
    /// sui binary used to sign and submit transactions
    #[arg(long, default_value = "sui")]
    sui_bin: PathBuf,
    /// sui client config; defaults to ~/.sui/sui_config/client.yaml
    #[arg(long)]
    client_config: Option<String>,
    /// Seconds between chain state polls
    #[arg(long, default_value_t = 4)]
    poll_secs: u64,
    #[arg(long, default_value_t = DEFAULT_GAS_BUDGET)]
    gas_budget: u64,
    /// Directory for the daily rolling log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
    /// Save the resolved contract ids to the network's deployment record
    #[arg(long)]
    remember: bool,
    #[command(flatten)]
    contracts: ContractIdArgs,
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("Creating log directory {}", log_dir.display()))?;
    let appender = rolling::daily(log_dir, "suiventure.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("tracing init failed: {e}"))?;
    Ok(guard)
}

async fn resolve_app_config(cli: Cli) -> Result<client::AppConfig> {
    let rpc_url = cli
        .rpc_url
        .clone()
        .unwrap_or_else(|| cli.network.default_rpc_url().to_string());

    deployments::ensure_structure(deployments::DEPLOYMENTS_ROOT)
        .map_err(|e| eyre!("{e:#}"))?;
    let store = DeploymentStore::new(cli.network.deployment_env())
        .map_err(|e| eyre!("{e:#}"))?;
    let record = deployment::load_record(&store)?;
    let contracts = deployment::resolve_contract_config(&cli.contracts, record.as_ref())?;
    if cli.remember {
        let saved = deployment::remember(&store, &rpc_url, &contracts)?;
        tracing::info!(
            "saved deployment of {} to {}",
            saved.package_id,
            store.path().display()
        );
    }

    let sui = SuiCli {
        bin: cli.sui_bin,
        client_config: Some(wallets::resolve_client_config(
            cli.client_config.as_deref(),
        )?),
    };
    let owner: SuiAddress = match cli.address {
        Some(raw) => raw
            .parse()
            .wrap_err_with(|| format!("Invalid --address {raw}"))?,
        None => wallets::active_address(&sui).await?,
    };

    Ok(client::AppConfig {
        network: cli.network,
        rpc_url,
        contracts,
        owner,
        cli: sui,
        gas_budget: cli.gas_budget,
        poll_interval: Duration::from_secs(cli.poll_secs.max(1)),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(&cli.log_dir)?;
    tracing::info!("starting suiventure client on {}", cli.network);
    let app_config = resolve_app_config(cli).await?;
    client::run_app(app_config).await
}
