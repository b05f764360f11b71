//! Local sandbox bootstrap.
//!
//! Deploys the token and factory contracts from the master account,
//! creates two funded test users, initialises both contracts as the first
//! user and checks that the token reports the configured fee rate.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use near_crypto::{KeyType, SecretKey};
use near_primitives::types::{AccountId, Balance};
use serde_json::{json, Value};

use crate::account::{Account, Connection};
use crate::cli::{Cli, SandboxArgs};
use crate::commands::{resolve_credentials_dir, rpc_client};
use crate::config::Config;
use crate::contract::{CallOptions, Contract};
use crate::contracts::{
	BalanceOfArgs, InitFactoryArgs, NetworkAccounts, NewDefaultMetaArgs, ACCOUNTS, FACTORY_METHODS,
	SANDBOX_TOKEN_METHODS,
};
use crate::keystore::{load_key_file, FileKeyStore, InMemoryKeyStore, KeyStore};
use crate::units;

const NETWORK: &str = "sandbox";

/// Prefixes of the derived test accounts, in creation order.
const TEST_USERS: [&str; 2] = ["alice", "bob"];

/// Prefixes of the contract accounts under the master account.
const TOKEN_PREFIX: &str = "neko";
const FACTORY_PREFIX: &str = "factory";
const VAULT_PREFIX: &str = "vault";

/// Everything the bootstrap needs besides the node connection.
pub struct Plan {
	pub master_id: AccountId,
	pub token_id: AccountId,
	pub factory_id: AccountId,
	pub vault_id: AccountId,
	pub token_code: Vec<u8>,
	pub factory_code: Vec<u8>,
	pub deposit: Balance,
	pub fee_percent: u8,
	pub cookie_reward_rate: u8,
	pub expected_fee: u8,
	pub fresh_keys: bool,
}

impl Plan {
	pub fn new(accounts: &NetworkAccounts, token_code: Vec<u8>, factory_code: Vec<u8>) -> Self {
		Self::with_accounts(
			[accounts.master_id(), accounts.token_id(), accounts.factory_id(), accounts.vault_id()],
			token_code,
			factory_code,
		)
	}

	/// A plan whose contract accounts all live under `master_id`, for a
	/// node whose validator is not the registry's master account.
	pub fn for_master(master_id: AccountId, token_code: Vec<u8>, factory_code: Vec<u8>) -> Result<Self> {
		let ids = [
			sub_account(&master_id, TOKEN_PREFIX)?,
			sub_account(&master_id, FACTORY_PREFIX)?,
			sub_account(&master_id, VAULT_PREFIX)?,
		];
		let [token_id, factory_id, vault_id] = ids;
		Ok(Self::with_accounts(
			[master_id, token_id, factory_id, vault_id],
			token_code,
			factory_code,
		))
	}

	fn with_accounts(ids: [AccountId; 4], token_code: Vec<u8>, factory_code: Vec<u8>) -> Self {
		let [master_id, token_id, factory_id, vault_id] = ids;
		Self {
			master_id,
			token_id,
			factory_id,
			vault_id,
			token_code,
			factory_code,
			deposit: 10u128.pow(25),
			fee_percent: 10,
			cookie_reward_rate: 10,
			expected_fee: 10,
			fresh_keys: false,
		}
	}
}

fn sub_account(parent: &AccountId, prefix: &str) -> Result<AccountId> {
	format!("{prefix}.{parent}")
		.parse()
		.with_context(|| format!("`{prefix}.{parent}` is not a valid account id"))
}

/// One derived test account with its proxies for both contracts.
pub struct TestUser {
	pub account: Account,
	pub key: SecretKey,
	pub token: Contract,
	pub factory: Contract,
}

pub struct Report {
	pub users: Vec<TestUser>,
	pub fee_rate: u8,
	pub factory_balance: Value,
}

pub async fn run(cli: &Cli, args: &SandboxArgs) -> Result<()> {
	let config = Config::load()?;
	let rpc_url = cli
		.rpc_url
		.clone()
		.unwrap_or_else(|| config.rpc_url(NETWORK).to_owned());

	// 1. Master key from the node's validator key file.
	let key_path = args
		.key_path
		.clone()
		.unwrap_or_else(|| config.keys.validator_key.clone());
	let (key_file, master_key) = load_key_file(&key_path)
		.with_context(|| format!("is the sandbox node running? could not load {}", key_path.display()))?;

	let accounts = ACCOUNTS.for_network(NETWORK);
	let token_code = read_wasm(&args.contracts_dir.join("main.wasm"))?;
	let factory_code = read_wasm(&args.contracts_dir.join("factory.wasm"))?;
	let mut plan = match key_file.account_id {
		Some(id) if id != accounts.master_id() => Plan::for_master(id, token_code, factory_code)?,
		_ => Plan::new(accounts, token_code, factory_code),
	};
	plan.deposit = args.deposit;
	plan.expected_fee = args.expected_fee;
	plan.fresh_keys = args.fresh_keys;

	// 2. In-memory keystore and node connection.
	let keystore = Arc::new(InMemoryKeyStore::new());
	keystore.set_key(NETWORK, &plan.master_id, &master_key)?;
	let conn = Connection::new(NETWORK, rpc_client(&rpc_url, &config), keystore);
	tracing::info!(
		rpc_url = %rpc_url,
		master = %plan.master_id,
		deposit_near = %units::format_near_amount(plan.deposit),
		"connected to sandbox"
	);

	let report = bootstrap(&conn, &master_key, &plan).await?;

	if args.save_keys {
		let store = FileKeyStore::new(resolve_credentials_dir(cli, &config));
		save_keys(&store, &plan, &master_key, &report)?;
		println!("Keys written to {}", store.root().join(NETWORK).display());
	}

	println!("Fee rate: {}", report.fee_rate);
	println!("Factory Balance: {}", report.factory_balance);
	Ok(())
}

/// Run the bootstrap sequence against `conn`, whose keystore must already
/// hold `master_key` for `plan.master_id`.
pub async fn bootstrap(conn: &Arc<Connection>, master_key: &SecretKey, plan: &Plan) -> Result<Report> {
	let master = conn.account(plan.master_id.clone());
	let master_pk = master_key.public_key();

	// 3. Both contracts, each on its own funded account.
	master
		.create_and_deploy_contract(&plan.token_id, master_pk.clone(), plan.token_code.clone(), plan.deposit)
		.await
		.with_context(|| format!("deploying {}", plan.token_id))?;
	master
		.create_and_deploy_contract(
			&plan.factory_id,
			master_pk,
			plan.factory_code.clone(),
			plan.deposit,
		)
		.await
		.with_context(|| format!("deploying {}", plan.factory_id))?;

	// 4. Test users with proxies for both contracts.
	let mut users = Vec::with_capacity(TEST_USERS.len());
	for prefix in TEST_USERS {
		users.push(create_test_user(conn, &master, master_key, prefix, plan).await?);
	}
	println!("Finished deploying contracts and creating test accounts");

	// 5. Initialise both contracts as the first user.
	let alice = &users[0];
	let owner_id = alice.account.id().clone();
	alice
		.token
		.call(
			"new_default_meta",
			&NewDefaultMetaArgs {
				owner_id: owner_id.clone(),
				vault_id: plan.vault_id.clone(),
				factory_id: plan.factory_id.clone(),
				fee_percent: plan.fee_percent,
				cookie_reward_rate: plan.cookie_reward_rate,
			},
			CallOptions::default(),
		)
		.await?;
	alice
		.factory
		.call(
			"init_factory",
			&InitFactoryArgs {
				owner_id: owner_id.clone(),
				neko_id: plan.token_id.clone(),
				vault_id: plan.vault_id.clone(),
			},
			CallOptions::default(),
		)
		.await?;

	// 6. Read back and check.
	let fee_rate: u8 = alice.token.view_as("get_fee_rate", &json!({})).await?;
	let factory_balance = alice
		.factory
		.view("ft_balance_of", &BalanceOfArgs { account_id: &owner_id })
		.await?;

	if fee_rate != plan.expected_fee {
		anyhow::bail!(
			"fee rate check failed: {} reports {fee_rate}, expected {}",
			plan.token_id,
			plan.expected_fee
		);
	}
	tracing::info!(fee_rate, factory_balance = %factory_balance, "sandbox deployment verified");

	Ok(Report {
		users,
		fee_rate,
		factory_balance,
	})
}

async fn create_test_user(
	conn: &Arc<Connection>,
	master: &Account,
	master_key: &SecretKey,
	prefix: &str,
	plan: &Plan,
) -> Result<TestUser> {
	let account_id = sub_account(master.id(), prefix)?;
	let key = if plan.fresh_keys {
		SecretKey::from_random(KeyType::ED25519)
	} else {
		master_key.clone()
	};

	master
		.create_account(&account_id, key.public_key(), plan.deposit)
		.await
		.with_context(|| format!("creating {account_id}"))?;
	conn.keystore.set_key(&conn.network, &account_id, &key)?;

	let account = conn.account(account_id);
	Ok(TestUser {
		token: Contract::new(account.clone(), plan.token_id.clone(), SANDBOX_TOKEN_METHODS),
		factory: Contract::new(account.clone(), plan.factory_id.clone(), FACTORY_METHODS),
		account,
		key,
	})
}

fn save_keys(store: &dyn KeyStore, plan: &Plan, master_key: &SecretKey, report: &Report) -> Result<()> {
	for id in [&plan.master_id, &plan.token_id, &plan.factory_id] {
		store.set_key(NETWORK, id, master_key)?;
	}
	for user in &report.users {
		store.set_key(NETWORK, user.account.id(), &user.key)?;
	}
	Ok(())
}

fn read_wasm(path: &Path) -> Result<Vec<u8>> {
	std::fs::read(path).with_context(|| format!("failed to read contract binary {}", path.display()))
}
