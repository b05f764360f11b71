pub mod clean;
pub mod config;
pub mod deploy;
pub mod sandbox;
pub mod token;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use near_primitives::types::AccountId;

use crate::account::{Account, Connection};
use crate::cli::{Cli, Network};
use crate::config::Config;
use crate::contract::Contract;
use crate::contracts::{NetworkAccounts, ACCOUNTS, TOKEN_METHODS};
use crate::keystore::FileKeyStore;
use crate::rpc::{RpcClient, TxOutcome};

/// The network to use: `--network` (or `NEAR_ENV`, which clap folds into
/// the flag), then the config file's `network.default`.
pub fn resolve_network(flag: Option<Network>, config: &Config) -> Result<Network> {
	match flag {
		Some(network) => Ok(network),
		None => Network::from_str(&config.network.default, true)
			.map_err(|e| anyhow!("bad network.default `{}` in config: {e}", config.network.default)),
	}
}

/// Resolve the RPC URL from CLI flag or config.
pub fn resolve_rpc(cli: &Cli, config: &Config, network: Network) -> String {
	cli.rpc_url
		.clone()
		.unwrap_or_else(|| config.rpc_url(network.as_str()).to_owned())
}

pub fn resolve_credentials_dir(cli: &Cli, config: &Config) -> PathBuf {
	cli.credentials_dir
		.clone()
		.unwrap_or_else(|| config.credentials_dir())
}

pub fn rpc_client(url: &str, config: &Config) -> Arc<RpcClient> {
	let timeout = Duration::from_secs(config.network.rpc_timeout_secs);
	Arc::new(RpcClient::new(url, timeout))
}

/// Connect to `network` with the on-disk keystore.
pub fn connect(cli: &Cli, config: &Config, network: Network) -> Arc<Connection> {
	let rpc_url = resolve_rpc(cli, config, network);
	let keystore = FileKeyStore::new(resolve_credentials_dir(cli, config));
	tracing::debug!(
		network = network.as_str(),
		rpc_url = %rpc_url,
		credentials = %keystore.root().display(),
		"connecting"
	);
	let rpc = rpc_client(&rpc_url, config);
	Connection::new(network.as_str(), rpc, Arc::new(keystore))
}

pub fn network_accounts(network: Network) -> &'static NetworkAccounts {
	ACCOUNTS.for_network(network.as_str())
}

/// The signing account: `--account` or the network's master account.
pub fn signer(cli: &Cli, network: Network, conn: &Arc<Connection>) -> Account {
	let id = cli
		.account
		.clone()
		.unwrap_or_else(|| network_accounts(network).master_id());
	conn.account(id)
}

/// The token contract: `--contract` or the network's token account.
pub fn token_contract_id(cli: &Cli, network: Network) -> AccountId {
	cli.contract
		.clone()
		.unwrap_or_else(|| network_accounts(network).token_id())
}

/// Token proxy signed by the resolved signer.
pub fn token_contract(cli: &Cli, network: Network, conn: &Arc<Connection>) -> Contract {
	Contract::new(signer(cli, network, conn), token_contract_id(cli, network), TOKEN_METHODS)
}

/// Print a committed transaction the way the commands report results.
pub fn print_outcome(outcome: &TxOutcome) -> Result<()> {
	println!("Transaction: {}", outcome.tx_hash);
	for log in &outcome.logs {
		println!("  log: {log}");
	}
	let value = outcome.json()?;
	if !value.is_null() {
		println!("Result: {}", serde_json::to_string_pretty(&value)?);
	}
	Ok(())
}
