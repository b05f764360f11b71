use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use near_crypto::{InMemorySigner, PublicKey, SecretKey, Signer};
use near_primitives::transaction::Action;
use near_primitives::types::{AccountId, Balance, Gas, Nonce};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::keystore::{KeyStore, KeyStoreError};
use crate::rpc::{NearRpc, RpcError, TxOutcome};
use crate::tx_builder;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("no key for {account_id} on {network} in the keystore")]
	MissingKey { account_id: AccountId, network: String },

	#[error(transparent)]
	KeyStore(#[from] KeyStoreError),

	#[error(transparent)]
	Rpc(#[from] RpcError),

	#[error("failed to encode call arguments: {0}")]
	Args(#[from] serde_json::Error),
}

/// What every account handle shares: the network name the keystore is keyed
/// by, the node, the keystore, and the last nonce used per access key.
pub struct Connection {
	pub network: String,
	pub rpc: Arc<dyn NearRpc>,
	pub keystore: Arc<dyn KeyStore>,
	nonces: Mutex<HashMap<(AccountId, PublicKey), Nonce>>,
}

impl Connection {
	pub fn new(network: &str, rpc: Arc<dyn NearRpc>, keystore: Arc<dyn KeyStore>) -> Arc<Self> {
		Arc::new(Self {
			network: network.to_owned(),
			rpc,
			keystore,
			nonces: Mutex::new(HashMap::new()),
		})
	}

	/// A handle for `account_id`. Nothing is checked on-chain until the
	/// handle is used.
	pub fn account(self: &Arc<Self>, account_id: AccountId) -> Account {
		Account {
			account_id,
			conn: Arc::clone(self),
		}
	}

	/// Reserve the next nonce for a key. The node's view can trail the
	/// transactions this process already committed, so the result is
	/// never below the last nonce handed out here.
	fn next_nonce(&self, account_id: &AccountId, public_key: &PublicKey, chain_nonce: Nonce) -> Nonce {
		let mut nonces = self.nonces.lock().unwrap_or_else(|e| e.into_inner());
		let last = nonces
			.entry((account_id.clone(), public_key.clone()))
			.or_insert(chain_nonce);
		*last = (*last).max(chain_nonce) + 1;
		*last
	}
}

/// A signing account: every change goes out as a transaction signed with
/// the account's key from the keystore.
#[derive(Clone)]
pub struct Account {
	account_id: AccountId,
	conn: Arc<Connection>,
}

impl Account {
	pub fn id(&self) -> &AccountId {
		&self.account_id
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.conn
	}

	fn signing_key(&self) -> Result<SecretKey, AccountError> {
		self.conn
			.keystore
			.get_key(&self.conn.network, &self.account_id)?
			.ok_or_else(|| AccountError::MissingKey {
				account_id: self.account_id.clone(),
				network: self.conn.network.clone(),
			})
	}

	/// Build, sign and submit one transaction, waiting for its final outcome.
	pub async fn sign_and_send(
		&self,
		receiver_id: &AccountId,
		actions: Vec<Action>,
	) -> Result<TxOutcome, AccountError> {
		let signer = InMemorySigner::from_secret_key(self.account_id.clone(), self.signing_key()?);
		let public_key = signer.public_key();
		let access = self.conn.rpc.view_access_key(&self.account_id, &public_key).await?;
		let nonce = self.conn.next_nonce(&self.account_id, &public_key, access.nonce);

		let signed = tx_builder::build_signed(
			&signer,
			&self.account_id,
			receiver_id,
			nonce,
			access.block_hash,
			actions,
		);
		let outcome = self.conn.rpc.broadcast_tx_commit(&signed).await?;

		tracing::debug!(
			signer = %self.account_id,
			receiver = %receiver_id,
			nonce,
			tx_hash = %outcome.tx_hash,
			"transaction committed"
		);
		Ok(outcome)
	}

	/// Create `new_account_id` funded with `deposit` and controlled by
	/// `public_key`.
	pub async fn create_account(
		&self,
		new_account_id: &AccountId,
		public_key: PublicKey,
		deposit: Balance,
	) -> Result<TxOutcome, AccountError> {
		let outcome = self
			.sign_and_send(new_account_id, tx_builder::create_account_actions(public_key, deposit))
			.await?;
		tracing::info!(account = %new_account_id, deposit = %deposit, "account created");
		Ok(outcome)
	}

	/// Create `contract_id` and deploy `code` to it in a single transaction.
	pub async fn create_and_deploy_contract(
		&self,
		contract_id: &AccountId,
		public_key: PublicKey,
		code: Vec<u8>,
		deposit: Balance,
	) -> Result<TxOutcome, AccountError> {
		let code_len = code.len();
		let outcome = self
			.sign_and_send(
				contract_id,
				tx_builder::create_and_deploy_actions(public_key, code, deposit),
			)
			.await?;
		tracing::info!(contract = %contract_id, code_len, "contract account created and deployed");
		Ok(outcome)
	}

	/// Deploy `code` to this account.
	pub async fn deploy_contract(&self, code: Vec<u8>) -> Result<TxOutcome, AccountError> {
		let code_len = code.len();
		let outcome = self
			.sign_and_send(&self.account_id, vec![tx_builder::deploy_action(code)])
			.await?;
		tracing::info!(contract = %self.account_id, code_len, "contract deployed");
		Ok(outcome)
	}

	pub async fn function_call<A: Serialize + ?Sized>(
		&self,
		contract_id: &AccountId,
		method_name: &str,
		args: &A,
		gas: Gas,
		deposit: Balance,
	) -> Result<TxOutcome, AccountError> {
		let args = serde_json::to_vec(args)?;
		tracing::info!(contract = %contract_id, method = method_name, deposit = %deposit, "calling change method");
		let action = tx_builder::function_call_action(method_name, args, gas, deposit);
		self.sign_and_send(contract_id, vec![action]).await
	}

	/// Call a view method; an empty return value comes back as `Null`.
	pub async fn view_function<A: Serialize + ?Sized>(
		&self,
		contract_id: &AccountId,
		method_name: &str,
		args: &A,
	) -> Result<Value, AccountError> {
		let args = serde_json::to_vec(args)?;
		tracing::debug!(contract = %contract_id, method = method_name, "calling view method");
		let raw = self
			.conn
			.rpc
			.call_function(contract_id, method_name, &args)
			.await?;
		if raw.is_empty() {
			return Ok(Value::Null);
		}
		Ok(serde_json::from_slice(&raw)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::keystore::InMemoryKeyStore;
	use crate::testing::{FakeRpc, Sent};
	use near_crypto::KeyType;
	use near_primitives::account::AccessKeyPermission;
	use serde_json::json;

	fn setup() -> (Arc<FakeRpc>, Account, SecretKey) {
		let rpc = Arc::new(FakeRpc::default());
		let keystore = Arc::new(InMemoryKeyStore::new());
		let key = SecretKey::from_random(KeyType::ED25519);
		let master: AccountId = "test.near".parse().unwrap();
		keystore.set_key("sandbox", &master, &key).unwrap();

		let conn = Connection::new("sandbox", rpc.clone(), keystore);
		(rpc, conn.account(master), key)
	}

	#[tokio::test]
	async fn transactions_use_next_nonce_and_signer_key() {
		let (rpc, master, key) = setup();
		rpc.set_nonce(41);
		let alice: AccountId = "alice.test.near".parse().unwrap();

		master.create_account(&alice, key.public_key(), 5).await.unwrap();

		let sent = rpc.transactions();
		assert_eq!(sent.len(), 1);
		let tx = &sent[0].transaction;
		assert_eq!(tx.nonce, 42);
		assert_eq!(tx.signer_id.as_str(), "test.near");
		assert_eq!(tx.receiver_id, alice);
		assert_eq!(tx.public_key, key.public_key());
		assert_eq!(tx.actions.len(), 3);
		match &tx.actions[2] {
			Action::AddKey(add) => assert_eq!(add.access_key.permission, AccessKeyPermission::FullAccess),
			other => panic!("expected AddKey, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn nonces_keep_increasing_when_the_node_view_lags() {
		let (rpc, master, key) = setup();
		rpc.set_nonce(10);
		rpc.lag_access_key_reads(true);

		for prefix in ["alice", "bob", "carol"] {
			let id: AccountId = format!("{prefix}.test.near").parse().unwrap();
			master.create_account(&id, key.public_key(), 1).await.unwrap();
		}

		let nonces: Vec<Nonce> = rpc.transactions().iter().map(|tx| tx.transaction.nonce).collect();
		assert_eq!(nonces, vec![11, 12, 13]);
	}

	#[tokio::test]
	async fn missing_key_is_reported() {
		let (_, master, _) = setup();
		let stranger = master.connection().account("bob.test.near".parse().unwrap());

		let err = stranger.deploy_contract(vec![0]).await.unwrap_err();
		assert!(matches!(err, AccountError::MissingKey { .. }));
	}

	#[tokio::test]
	async fn deploy_targets_the_account_itself() {
		let (rpc, master, _) = setup();
		master.deploy_contract(vec![0x00, 0x61, 0x73, 0x6d]).await.unwrap();

		assert_eq!(
			rpc.sent(),
			vec![Sent::Deploy {
				account: "test.near".into(),
				code_len: 4,
			}]
		);
	}

	#[tokio::test]
	async fn function_call_serialises_json_args() {
		let (rpc, master, _) = setup();
		let token: AccountId = "neko.test.near".parse().unwrap();

		master
			.function_call(&token, "ft_mint", &json!({"to": "alice.test.near", "amount": 5}), 7, 1)
			.await
			.unwrap();

		match rpc.sent().as_slice() {
			[Sent::Change { receiver, method, args, gas, deposit }] => {
				assert_eq!(receiver, "neko.test.near");
				assert_eq!(method, "ft_mint");
				assert_eq!(args, &json!({"to": "alice.test.near", "amount": 5}));
				assert_eq!((*gas, *deposit), (7, 1));
			}
			other => panic!("unexpected calls {other:?}"),
		}
	}

	#[tokio::test]
	async fn view_function_parses_json_and_empty_results() {
		let (rpc, master, _) = setup();
		let token: AccountId = "neko.test.near".parse().unwrap();
		rpc.set_view("get_fee_rate", b"10");
		rpc.set_view("nothing", b"");

		assert_eq!(master.view_function(&token, "get_fee_rate", &json!({})).await.unwrap(), json!(10));
		assert_eq!(master.view_function(&token, "nothing", &json!({})).await.unwrap(), Value::Null);
	}
}
