//! In-process stand-in for a NEAR node, used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use near_crypto::PublicKey;
use near_primitives::hash::CryptoHash;
use near_primitives::transaction::{Action, SignedTransaction};
use near_primitives::types::{AccountId, Balance, Gas, Nonce};
use serde_json::Value;

use crate::rpc::{AccessKeyView, NearRpc, RpcError, StateItem, TxOutcome};

/// A summary of one request the fake received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
	View {
		contract: String,
		method: String,
		args: Value,
	},
	Change {
		receiver: String,
		method: String,
		args: Value,
		gas: Gas,
		deposit: Balance,
	},
	CreateAccount {
		signer: String,
		account: String,
		deposit: Balance,
		deploys_code: bool,
	},
	Deploy {
		account: String,
		code_len: usize,
	},
}

#[derive(Default)]
struct Chain {
	nonce: Nonce,
	/// Nonce before the most recent commit, what a lagging view reports.
	previous_nonce: Nonce,
	lagging: bool,
}

#[derive(Default)]
pub struct FakeRpc {
	chain: Mutex<Chain>,
	views: Mutex<HashMap<String, Vec<u8>>>,
	state: Mutex<Vec<StateItem>>,
	log: Mutex<Vec<Sent>>,
	txs: Mutex<Vec<SignedTransaction>>,
}

impl FakeRpc {
	pub fn set_nonce(&self, nonce: Nonce) {
		let mut chain = self.chain.lock().unwrap();
		chain.nonce = nonce;
		chain.previous_nonce = nonce;
	}

	/// Make access key reads trail the last committed transaction, as a
	/// node answering from an older block does.
	pub fn lag_access_key_reads(&self, lagging: bool) {
		self.chain.lock().unwrap().lagging = lagging;
	}

	/// Canned raw result for a view method.
	pub fn set_view(&self, method: &str, result: &[u8]) {
		self.views
			.lock()
			.unwrap()
			.insert(method.to_owned(), result.to_vec());
	}

	pub fn set_state(&self, keys: &[&str]) {
		*self.state.lock().unwrap() = keys
			.iter()
			.map(|k| StateItem {
				key: (*k).to_owned(),
				value: String::new(),
			})
			.collect();
	}

	pub fn sent(&self) -> Vec<Sent> {
		self.log.lock().unwrap().clone()
	}

	pub fn transactions(&self) -> Vec<SignedTransaction> {
		self.txs.lock().unwrap().clone()
	}

	fn summarise(tx: &SignedTransaction) -> Vec<Sent> {
		let t = &tx.transaction;
		let receiver = t.receiver_id.to_string();
		if matches!(t.actions.first(), Some(Action::CreateAccount(_))) {
			let deposit = t
				.actions
				.iter()
				.find_map(|a| match a {
					Action::Transfer(tr) => Some(tr.deposit),
					_ => None,
				})
				.unwrap_or(0);
			return vec![Sent::CreateAccount {
				signer: t.signer_id.to_string(),
				account: receiver,
				deposit,
				deploys_code: t.actions.iter().any(|a| matches!(a, Action::DeployContract(_))),
			}];
		}

		t.actions
			.iter()
			.filter_map(|a| match a {
				Action::DeployContract(deploy) => Some(Sent::Deploy {
					account: receiver.clone(),
					code_len: deploy.code.len(),
				}),
				Action::FunctionCall(call) => Some(Sent::Change {
					receiver: receiver.clone(),
					method: call.method_name.clone(),
					args: serde_json::from_slice(&call.args).unwrap_or(Value::Null),
					gas: call.gas,
					deposit: call.deposit,
				}),
				_ => None,
			})
			.collect()
	}
}

#[async_trait::async_trait]
impl NearRpc for FakeRpc {
	async fn call_function(
		&self,
		contract_id: &AccountId,
		method_name: &str,
		args: &[u8],
	) -> Result<Vec<u8>, RpcError> {
		self.log.lock().unwrap().push(Sent::View {
			contract: contract_id.to_string(),
			method: method_name.to_owned(),
			args: serde_json::from_slice(args).unwrap_or(Value::Null),
		});
		self.views
			.lock()
			.unwrap()
			.get(method_name)
			.cloned()
			.ok_or_else(|| RpcError::Unexpected(format!("MethodNotFound: {method_name}")))
	}

	async fn view_access_key(
		&self,
		_account_id: &AccountId,
		_public_key: &PublicKey,
	) -> Result<AccessKeyView, RpcError> {
		let chain = self.chain.lock().unwrap();
		Ok(AccessKeyView {
			nonce: if chain.lagging {
				chain.previous_nonce
			} else {
				chain.nonce
			},
			block_hash: CryptoHash::default(),
		})
	}

	async fn view_state(&self, _account_id: &AccountId, _prefix: &[u8]) -> Result<Vec<StateItem>, RpcError> {
		Ok(self.state.lock().unwrap().clone())
	}

	/// Commits the transaction, rejecting a reused nonce like a real node.
	async fn broadcast_tx_commit(&self, tx: &SignedTransaction) -> Result<TxOutcome, RpcError> {
		let tx_hash = tx.get_hash();
		{
			let mut chain = self.chain.lock().unwrap();
			if tx.transaction.nonce <= chain.nonce {
				return Err(RpcError::TransactionFailed {
					tx_hash,
					failure: format!(
						"InvalidNonce {{ tx_nonce: {}, ak_nonce: {} }}",
						tx.transaction.nonce, chain.nonce
					),
				});
			}
			chain.previous_nonce = chain.nonce;
			chain.nonce = tx.transaction.nonce;
		}

		self.log.lock().unwrap().extend(Self::summarise(tx));
		self.txs.lock().unwrap().push(tx.clone());
		Ok(TxOutcome {
			tx_hash,
			success_value: Vec::new(),
			logs: Vec::new(),
		})
	}
}
