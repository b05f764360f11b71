use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use near_primitives::types::{AccountId, Balance, Gas};

use crate::tx_builder::DEFAULT_FUNCTION_CALL_GAS;
use crate::units::{self, AmountError};

#[derive(Parser)]
#[command(
	name = "neko",
	about = "Deploy and operate the NEKO token contracts on NEAR.",
	version
)]
pub struct Cli {
	/// Network to connect to (falls back to the config file's default).
	#[arg(long, env = "NEAR_ENV", global = true)]
	pub network: Option<Network>,

	/// Override RPC endpoint URL.
	#[arg(long, global = true)]
	pub rpc_url: Option<String>,

	/// Account that signs transactions (defaults to the deployment master).
	#[arg(long, global = true)]
	pub account: Option<AccountId>,

	/// Token contract to operate on.
	#[arg(long, global = true)]
	pub contract: Option<AccountId>,

	/// Root of the on-disk credential store.
	#[arg(long, global = true)]
	pub credentials_dir: Option<PathBuf>,

	/// Prepaid gas for change calls.
	#[arg(long, default_value_t = DEFAULT_FUNCTION_CALL_GAS, global = true)]
	pub gas: Gas,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum Network {
	Testnet,
	#[value(alias = "local")]
	Sandbox,
}

impl Network {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Testnet => "testnet",
			Self::Sandbox => "sandbox",
		}
	}
}

#[derive(Subcommand)]
pub enum Command {
	/// Deploy the token binary to the contract account.
	Deploy {
		/// Path to the compiled contract.
		#[arg(long, default_value = "contracts/main.wasm")]
		wasm: PathBuf,
	},

	/// Initialise the token with default metadata.
	Init {
		/// Owner account (defaults to the signer).
		#[arg(long)]
		owner: Option<AccountId>,

		/// Vault account (defaults to the network's vault).
		#[arg(long)]
		vault: Option<AccountId>,

		/// Factory account (defaults to the network's factory).
		#[arg(long)]
		factory: Option<AccountId>,

		#[arg(long, default_value_t = 5)]
		fee_percent: u8,

		#[arg(long, default_value_t = 1)]
		cookie_reward_rate: u8,
	},

	/// Show the token metadata.
	Metadata,

	/// Show the token balance of an account.
	Balance {
		account_id: AccountId,
	},

	/// Mint tokens to an account.
	Mint {
		to: AccountId,
		amount: Balance,
	},

	/// Point the token at a new vault account.
	UpdateVault {
		vault_id: AccountId,
	},

	/// Stake tokens from the signer's balance.
	Stake {
		#[arg(long, default_value_t = 100)]
		amount: Balance,

		/// Attached deposit in yoctoNEAR.
		#[arg(long, default_value_t = 2)]
		deposit: Balance,
	},

	/// List the contract's storage keys, optionally deleting them.
	Clean {
		/// Call `clean` with the listed keys instead of only printing them.
		#[arg(long)]
		apply: bool,

		/// Keys per `clean` transaction.
		#[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u16).range(1..))]
		batch: u16,
	},

	/// Transfer tokens to another account (attaches 1 yoctoNEAR).
	Transfer {
		receiver_id: AccountId,
		amount: Balance,

		#[arg(long)]
		memo: Option<String>,
	},

	/// Set the staking fee percentage.
	SetFee {
		rate: u8,
	},

	/// Show the staking fee percentage.
	FeeRate,

	/// Show the cookie reward rate.
	RewardRate,

	/// Bootstrap a local sandbox: deploy both contracts, create test
	/// accounts, initialise and smoke-test the deployment.
	Sandbox(SandboxArgs),

	/// Inspect or create the config file.
	Config {
		#[command(subcommand)]
		command: ConfigCommand,
	},
}

#[derive(clap::Args)]
pub struct SandboxArgs {
	/// Validator key written by the sandbox node.
	#[arg(long)]
	pub key_path: Option<PathBuf>,

	/// Directory holding main.wasm and factory.wasm.
	#[arg(long, default_value = "contracts")]
	pub contracts_dir: PathBuf,

	/// NEAR given to every account created, e.g. `10` or `2.5`.
	#[arg(long, default_value = "10", value_parser = parse_near)]
	pub deposit: Balance,

	/// Fee rate the initialised token must report.
	#[arg(long, default_value_t = 10)]
	pub expected_fee: u8,

	/// Give each test account its own key instead of the master key.
	#[arg(long)]
	pub fresh_keys: bool,

	/// Also write every key to the on-disk credential store.
	#[arg(long)]
	pub save_keys: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
	/// Print the effective configuration.
	Show,

	/// Write the default configuration file.
	Init {
		/// Overwrite an existing file.
		#[arg(long)]
		force: bool,
	},
}

fn parse_near(s: &str) -> Result<Balance, AmountError> {
	units::parse_near_amount(s)
}
