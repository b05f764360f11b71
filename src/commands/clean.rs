use anyhow::Result;
use serde_json::json;

use crate::cli::Cli;
use crate::commands::{connect, print_outcome, resolve_network, token_contract};
use crate::config::Config;
use crate::contract::{CallOptions, Contract};
use crate::contracts::CleanArgs;

/// Print every storage key of the token contract as `{"keys": [...]}`;
/// with `apply`, hand them back to the contract's `clean` method in
/// batches of `batch` keys.
pub async fn run(cli: &Cli, apply: bool, batch: u16) -> Result<()> {
	let config = Config::load()?;
	let network = resolve_network(cli.network, &config)?;
	let conn = connect(cli, &config, network);
	let token = token_contract(cli, network, &conn);

	let keys = list_keys(&token).await?;
	println!("{}", json!({ "keys": keys }));

	if apply {
		let opts = CallOptions {
			gas: cli.gas,
			..CallOptions::default()
		};
		clean_keys(&token, &keys, usize::from(batch), opts).await?;
	}
	Ok(())
}

async fn list_keys(token: &Contract) -> Result<Vec<String>> {
	let state = token
		.account()
		.connection()
		.rpc
		.view_state(token.id(), b"")
		.await?;
	tracing::info!(contract = %token.id(), entries = state.len(), "fetched contract state");
	Ok(state.into_iter().map(|item| item.key).collect())
}

async fn clean_keys(token: &Contract, keys: &[String], batch: usize, opts: CallOptions) -> Result<()> {
	for (i, chunk) in keys.chunks(batch.max(1)).enumerate() {
		tracing::info!(batch = i + 1, keys = chunk.len(), "removing storage keys");
		let outcome = token.call("clean", &CleanArgs { keys: chunk }, opts).await?;
		print_outcome(&outcome)?;
	}
	Ok(())
}
