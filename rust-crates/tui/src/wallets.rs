use crate::sui_cli::SuiCli;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::path::PathBuf;
use suiventure::SuiAddress;

pub fn default_client_config() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".sui")
        .join("sui_config")
        .join("client.yaml"))
}

pub fn resolve_client_config(path: Option<&str>) -> Result<PathBuf> {
    match path {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_client_config(),
    }
}

/// The address the `sui` CLI signs with.
pub async fn active_address(cli: &SuiCli) -> Result<SuiAddress> {
    let output = cli
        .command()
        .args(["active-address", "--json"])
        .output()
        .await
        .wrap_err_with(|| format!("Failed to run {}", cli.bin.display()))?;
    if !output.status.success() {
        return Err(eyre!(
            "sui client active-address failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    parse_active_address(&String::from_utf8_lossy(&output.stdout))
}

fn parse_active_address(stdout: &str) -> Result<SuiAddress> {
    let raw = stdout.trim().trim_matches('"');
    if raw.is_empty() || raw == "null" {
        return Err(eyre!(
            "The sui CLI has no active address; run `sui client new-address` first"
        ));
    }
    raw.parse()
        .wrap_err_with(|| format!("Unexpected active address '{raw}'"))
}
