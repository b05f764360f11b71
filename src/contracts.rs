use near_primitives::types::{AccountId, Balance};
use serde::{Deserialize, Serialize};

use crate::contract::ContractMethods;

/// Accounts that make up one NEKO deployment.
pub struct NetworkAccounts {
	/// Funded account that owns the deployment and signs by default.
	pub master: &'static str,
	/// The NEKO fungible token contract.
	pub token: &'static str,
	pub factory: &'static str,
	pub vault: &'static str,
}

impl NetworkAccounts {
	pub fn master_id(&self) -> AccountId {
		static_id(self.master)
	}

	pub fn token_id(&self) -> AccountId {
		static_id(self.token)
	}

	pub fn factory_id(&self) -> AccountId {
		static_id(self.factory)
	}

	pub fn vault_id(&self) -> AccountId {
		static_id(self.vault)
	}
}

// Registry literals are checked by `registry_account_ids_are_valid`.
fn static_id(id: &'static str) -> AccountId {
	id.parse().expect("registry account ids are valid")
}

/// All known deployments, keyed by network.
pub struct Accounts {
	testnet: NetworkAccounts,
	sandbox: NetworkAccounts,
}

impl Accounts {
	pub fn for_network(&self, network: &str) -> &NetworkAccounts {
		match network {
			"sandbox" | "local" => &self.sandbox,
			_ => &self.testnet,
		}
	}
}

/// Global registry of deployment accounts.
pub static ACCOUNTS: Accounts = Accounts {
	testnet: NetworkAccounts {
		master: "nekocoin.testnet",
		token: "ft.nekocoin.testnet",
		factory: "factory.nekocoin.testnet",
		vault: "vault.nekocoin.testnet",
	},
	sandbox: NetworkAccounts {
		master: "test.near",
		token: "neko.test.near",
		factory: "factory.test.near",
		vault: "vault.test.near",
	},
};

// -- Method surfaces --

/// Token methods used by the operations commands.
pub const TOKEN_METHODS: ContractMethods = ContractMethods {
	view: &["ft_balance_of", "ft_metadata", "get_fee_rate", "get_reward_rate"],
	change: &[
		"new_default_meta",
		"ft_mint",
		"ft_transfer",
		"update_vault",
		"stake",
		"clean",
		"set_bake_fee",
	],
};

/// Token methods exercised by the sandbox bootstrap.
pub const SANDBOX_TOKEN_METHODS: ContractMethods = ContractMethods {
	view: &["get_fee_rate"],
	change: &["set_bake_fee", "new_default_meta"],
};

pub const FACTORY_METHODS: ContractMethods = ContractMethods {
	view: &["ft_balance_of"],
	change: &["init_factory", "ft_mint"],
};

// -- Call payloads --

/// Arguments of the token's `new_default_meta` initialiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDefaultMetaArgs {
	pub owner_id: AccountId,
	pub vault_id: AccountId,
	pub factory_id: AccountId,
	pub fee_percent: u8,
	pub cookie_reward_rate: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitFactoryArgs {
	pub owner_id: AccountId,
	pub neko_id: AccountId,
	pub vault_id: AccountId,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceOfArgs<'a> {
	pub account_id: &'a AccountId,
}

/// `ft_mint` takes a raw integer amount, not the string-wrapped U128 of
/// the NEP-141 methods.
#[derive(Debug, Clone, Serialize)]
pub struct MintArgs<'a> {
	pub to: &'a AccountId,
	pub amount: Balance,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateVaultArgs<'a> {
	pub vault_id: &'a AccountId,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeArgs {
	pub amount: Balance,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetBakeFeeArgs {
	pub rate: u8,
}

/// NEP-141 `ft_transfer`; `amount` is a decimal string.
#[derive(Debug, Clone, Serialize)]
pub struct TransferArgs<'a> {
	pub receiver_id: &'a AccountId,
	pub amount: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub memo: Option<&'a str>,
}

/// Base64 storage keys to delete.
#[derive(Debug, Clone, Serialize)]
pub struct CleanArgs<'a> {
	pub keys: &'a [String],
}

/// Fungible token metadata as returned by `ft_metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FungibleTokenMetadata {
	pub spec: String,
	pub name: String,
	pub symbol: String,
	pub icon: Option<String>,
	pub reference: Option<String>,
	pub reference_hash: Option<String>,
	pub decimals: u8,
}
