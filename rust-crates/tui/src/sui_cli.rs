//! Submits Move calls through `sui client ptb`. The CLI owns the keystore, so
//! signing never happens in this process.

use crate::rpc_client::SuiRpcClient;
use serde::Deserialize;
use std::{
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use suiventure::{
    ChainError,
    Confirmation,
    MoveCall,
    TransactionExecutor,
    chain::{
        CallArg,
        TransactionDigest,
    },
};
use tokio::process::Command;

pub const DEFAULT_GAS_BUDGET: u64 = 100_000_000;
const PAYMENT_VAR: &str = "payment";
const CONFIRM_ATTEMPTS: u32 = 10;
const CONFIRM_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct SuiCli {
    pub bin: PathBuf,
    pub client_config: Option<PathBuf>,
}

impl SuiCli {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("client");
        if let Some(config) = &self.client_config {
            cmd.arg("--client.config").arg(config);
        }
        cmd.kill_on_drop(true);
        cmd
    }
}

pub struct SuiCliExecutor {
    cli: SuiCli,
    gas_budget: u64,
    rpc: Arc<SuiRpcClient>,
}

impl SuiCliExecutor {
    pub fn new(cli: SuiCli, gas_budget: u64, rpc: Arc<SuiRpcClient>) -> Self {
        Self {
            cli,
            gas_budget,
            rpc,
        }
    }
}

impl TransactionExecutor for SuiCliExecutor {
    async fn submit(&self, call: &MoveCall) -> Result<Confirmation, ChainError> {
        let args = ptb_args(call, self.gas_budget);
        tracing::debug!("sui client ptb {}", args.join(" "));
        let output = self
            .cli
            .command()
            .arg("ptb")
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                ChainError::Rejected(format!(
                    "could not run {}: {e}",
                    self.cli.bin.display()
                ))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let reason = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ChainError::Rejected(reason));
        }
        parse_ptb_output(&output.stdout)
    }

    async fn wait_for_confirmation(
        &self,
        confirmation: &Confirmation,
    ) -> Result<(), ChainError> {
        for _ in 0..CONFIRM_ATTEMPTS {
            if self
                .rpc
                .get_transaction_block(&confirmation.digest)
                .await?
                .is_some()
            {
                return Ok(());
            }
            tokio::time::sleep(CONFIRM_INTERVAL).await;
        }
        Err(ChainError::ConfirmationTimeout(confirmation.digest.clone()))
    }
}

/// Arguments following `sui client ptb`.
pub fn ptb_args(call: &MoveCall, gas_budget: u64) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(amount) = call.payment_mist {
        args.extend([
            "--split-coins".to_string(),
            "gas".to_string(),
            format!("[{amount}]"),
            "--assign".to_string(),
            PAYMENT_VAR.to_string(),
        ]);
    }
    args.push("--move-call".to_string());
    args.push(call.target());
    args.extend(call.arguments.iter().map(|arg| match arg {
        CallArg::Object(id) => format!("@{id}"),
        CallArg::U8(value) => format!("{value}u8"),
        CallArg::SplitCoin => format!("{PAYMENT_VAR}.0"),
    }));
    args.extend([
        "--gas-budget".to_string(),
        gas_budget.to_string(),
        "--json".to_string(),
    ]);
    args
}

#[derive(Deserialize)]
struct PtbOutput {
    digest: String,
    #[serde(default)]
    effects: Option<EffectsDto>,
}

#[derive(Deserialize)]
struct EffectsDto {
    status: StatusDto,
}

#[derive(Deserialize)]
struct StatusDto {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// A transaction that executed but aborted counts as rejected.
pub fn parse_ptb_output(stdout: &[u8]) -> Result<Confirmation, ChainError> {
    let output: PtbOutput = serde_json::from_slice(stdout)
        .map_err(|e| ChainError::Decode(format!("unreadable sui CLI output: {e}")))?;
    if let Some(EffectsDto { status }) = output.effects
        && status.status != "success"
    {
        return Err(ChainError::Rejected(
            status
                .error
                .unwrap_or_else(|| format!("transaction {} failed", output.digest)),
        ));
    }
    Ok(Confirmation {
        digest: TransactionDigest(output.digest),
    })
}
