pub mod deployment;
pub mod rpc_client;
pub mod sui_cli;
pub mod wallets;
