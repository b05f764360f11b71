use near_primitives::types::{AccountId, Balance, Gas};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::account::{Account, AccountError};
use crate::rpc::TxOutcome;
use crate::tx_builder::DEFAULT_FUNCTION_CALL_GAS;

#[derive(Debug, Error)]
pub enum ContractError {
	#[error("`{method}` is not a declared view method of {contract_id}")]
	UndeclaredView { method: String, contract_id: AccountId },

	#[error("`{method}` is not a declared change method of {contract_id}")]
	UndeclaredChange { method: String, contract_id: AccountId },

	#[error(transparent)]
	Account(#[from] AccountError),

	#[error("unexpected return value from `{method}`: {source}")]
	Decode {
		method: String,
		source: serde_json::Error,
	},
}

/// The methods a proxy may dispatch, split by whether they mutate state.
#[derive(Debug, Clone, Copy)]
pub struct ContractMethods {
	pub view: &'static [&'static str],
	pub change: &'static [&'static str],
}

/// Gas and attached deposit for a change call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallOptions {
	pub gas: Gas,
	pub deposit: Balance,
}

impl Default for CallOptions {
	fn default() -> Self {
		Self {
			gas: DEFAULT_FUNCTION_CALL_GAS,
			deposit: 0,
		}
	}
}

impl CallOptions {
	pub fn with_deposit(self, deposit: Balance) -> Self {
		Self { deposit, ..self }
	}
}

/// A contract as seen from one account: view calls go through the node's
/// query API, change calls are signed by that account.
pub struct Contract {
	account: Account,
	contract_id: AccountId,
	methods: ContractMethods,
}

impl Contract {
	pub fn new(account: Account, contract_id: AccountId, methods: ContractMethods) -> Self {
		Self {
			account,
			contract_id,
			methods,
		}
	}

	pub fn id(&self) -> &AccountId {
		&self.contract_id
	}

	pub fn account(&self) -> &Account {
		&self.account
	}

	pub async fn view<A: Serialize + ?Sized>(&self, method: &str, args: &A) -> Result<Value, ContractError> {
		if !self.methods.view.iter().any(|m| *m == method) {
			return Err(ContractError::UndeclaredView {
				method: method.to_owned(),
				contract_id: self.contract_id.clone(),
			});
		}
		Ok(self.account.view_function(&self.contract_id, method, args).await?)
	}

	/// [`Contract::view`] with the result decoded into `T`.
	pub async fn view_as<T: DeserializeOwned, A: Serialize + ?Sized>(
		&self,
		method: &str,
		args: &A,
	) -> Result<T, ContractError> {
		let value = self.view(method, args).await?;
		serde_json::from_value(value).map_err(|source| ContractError::Decode {
			method: method.to_owned(),
			source,
		})
	}

	pub async fn call<A: Serialize + ?Sized>(
		&self,
		method: &str,
		args: &A,
		opts: CallOptions,
	) -> Result<TxOutcome, ContractError> {
		if !self.methods.change.iter().any(|m| *m == method) {
			return Err(ContractError::UndeclaredChange {
				method: method.to_owned(),
				contract_id: self.contract_id.clone(),
			});
		}
		Ok(self
			.account
			.function_call(&self.contract_id, method, args, opts.gas, opts.deposit)
			.await?)
	}
}
