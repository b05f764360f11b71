use std::path::Path;

use anyhow::{Context, Result};

use crate::account::Account;
use crate::cli::Cli;
use crate::commands::{connect, print_outcome, resolve_network, token_contract_id};
use crate::config::Config;
use crate::rpc::TxOutcome;

/// Deploy a binary to the token contract account, signed by that account.
pub async fn run(cli: &Cli, wasm: &Path) -> Result<()> {
	let config = Config::load()?;
	let network = resolve_network(cli.network, &config)?;
	let conn = connect(cli, &config, network);
	let contract = conn.account(token_contract_id(cli, network));

	let code = std::fs::read(wasm).with_context(|| format!("failed to read {}", wasm.display()))?;
	println!("Deploying {} ({} bytes) to {}...", wasm.display(), code.len(), contract.id());

	let outcome = deploy(&contract, code).await?;
	print_outcome(&outcome)
}

pub async fn deploy(contract: &Account, code: Vec<u8>) -> Result<TxOutcome> {
	if code.is_empty() {
		anyhow::bail!("refusing to deploy an empty binary to {}", contract.id());
	}
	contract
		.deploy_contract(code)
		.await
		.with_context(|| format!("deploy to {} failed", contract.id()))
}
