use anyhow::Result;
use serde_json::{json, Value};

use crate::cli::{Cli, Command};
use crate::commands::{connect, network_accounts, print_outcome, resolve_network, token_contract};
use crate::config::Config;
use crate::contract::{CallOptions, Contract};
use crate::contracts::{
	BalanceOfArgs, MintArgs, NetworkAccounts, NewDefaultMetaArgs, SetBakeFeeArgs, StakeArgs,
	TransferArgs, UpdateVaultArgs,
};
use crate::rpc::TxOutcome;
use crate::units::ONE_YOCTO;

/// Token operations: one contract call per command.
pub async fn run(cli: &Cli, cmd: &Command) -> Result<()> {
	let config = Config::load()?;
	let network = resolve_network(cli.network, &config)?;
	let conn = connect(cli, &config, network);
	let token = token_contract(cli, network, &conn);
	let opts = CallOptions {
		gas: cli.gas,
		..CallOptions::default()
	};
	tracing::info!(
		network = network.as_str(),
		contract = %token.id(),
		signer = %token.account().id(),
		"token operation"
	);

	match execute(cmd, &token, network_accounts(network), opts).await? {
		Output::Tx(outcome) => print_outcome(&outcome),
		Output::Text(text) => {
			println!("{text}");
			Ok(())
		}
	}
}

/// What a token command produced.
#[derive(Debug)]
pub enum Output {
	Tx(TxOutcome),
	Text(String),
}

/// Map one command onto its contract call. `accounts` supplies the
/// vault and factory defaults for `init`.
pub async fn execute(
	cmd: &Command,
	token: &Contract,
	accounts: &NetworkAccounts,
	opts: CallOptions,
) -> Result<Output> {
	let outcome = match cmd {
		Command::Init {
			owner,
			vault,
			factory,
			fee_percent,
			cookie_reward_rate,
		} => {
			let args = NewDefaultMetaArgs {
				owner_id: owner.clone().unwrap_or_else(|| token.account().id().clone()),
				vault_id: vault.clone().unwrap_or_else(|| accounts.vault_id()),
				factory_id: factory.clone().unwrap_or_else(|| accounts.factory_id()),
				fee_percent: *fee_percent,
				cookie_reward_rate: *cookie_reward_rate,
			};
			token.call("new_default_meta", &args, opts).await?
		}
		Command::Metadata => {
			// Printed as returned; the contract may carry optional fields.
			let raw = token.view("ft_metadata", &json!({})).await?;
			return Ok(Output::Text(serde_json::to_string_pretty(&raw)?));
		}
		Command::Balance { account_id } => {
			let balance = token
				.view("ft_balance_of", &BalanceOfArgs { account_id })
				.await?;
			return Ok(Output::Text(format!("BALANCE: {}", plain(&balance))));
		}
		Command::Mint { to, amount } => {
			token
				.call("ft_mint", &MintArgs { to, amount: *amount }, opts)
				.await?
		}
		Command::UpdateVault { vault_id } => {
			token
				.call("update_vault", &UpdateVaultArgs { vault_id }, opts)
				.await?
		}
		Command::Stake { amount, deposit } => {
			token
				.call(
					"stake",
					&StakeArgs { amount: *amount },
					opts.with_deposit(*deposit),
				)
				.await?
		}
		Command::Transfer {
			receiver_id,
			amount,
			memo,
		} => {
			let args = TransferArgs {
				receiver_id,
				amount: amount.to_string(),
				memo: memo.as_deref(),
			};
			token
				.call("ft_transfer", &args, opts.with_deposit(ONE_YOCTO))
				.await?
		}
		Command::SetFee { rate } => {
			token
				.call("set_bake_fee", &SetBakeFeeArgs { rate: *rate }, opts)
				.await?
		}
		Command::FeeRate => {
			let rate: u8 = token.view_as("get_fee_rate", &json!({})).await?;
			return Ok(Output::Text(format!("Fee rate: {rate}%")));
		}
		Command::RewardRate => {
			let rate: u8 = token.view_as("get_reward_rate", &json!({})).await?;
			return Ok(Output::Text(format!("Reward rate: {rate}")));
		}
		Command::Deploy { .. } | Command::Clean { .. } | Command::Sandbox(_) | Command::Config { .. } => {
			anyhow::bail!("not a token operation")
		}
	};
	Ok(Output::Tx(outcome))
}

/// Strings without their JSON quotes, everything else as JSON.
fn plain(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
