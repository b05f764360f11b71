use std::future::Future;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use near_crypto::PublicKey;
use near_jsonrpc_client::errors::JsonRpcError;
use near_jsonrpc_client::{methods, JsonRpcClient};
use near_jsonrpc_primitives::types::query::{QueryResponseKind, RpcQueryError, RpcQueryResponse};
use near_jsonrpc_primitives::types::transactions::RpcTransactionError;
use near_primitives::hash::CryptoHash;
use near_primitives::transaction::SignedTransaction;
use near_primitives::types::{AccountId, BlockReference, Finality, FunctionArgs, Nonce, StoreKey};
use near_primitives::views::{FinalExecutionOutcomeView, FinalExecutionStatus, QueryRequest, StatusResponse};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
	#[error("query failed: {0}")]
	Query(#[from] JsonRpcError<RpcQueryError>),

	#[error("transaction rejected: {0}")]
	Broadcast(#[from] JsonRpcError<RpcTransactionError>),

	#[error("status request failed: {0}")]
	Status(String),

	#[error("no response from {url} within {timeout:?}")]
	Timeout { url: String, timeout: Duration },

	#[error("transaction {tx_hash} failed: {failure}")]
	TransactionFailed { tx_hash: CryptoHash, failure: String },

	#[error("unexpected RPC response: {0}")]
	Unexpected(String),
}

/// Nonce and reference block for building the next transaction of a key.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessKeyView {
	pub nonce: Nonce,
	pub block_hash: CryptoHash,
}

/// One contract storage entry, key and value base64-encoded as the
/// contract's `clean` method expects them.
#[derive(Debug, Clone, PartialEq)]
pub struct StateItem {
	pub key: String,
	pub value: String,
}

impl StateItem {
	pub fn from_raw(key: &[u8], value: &[u8]) -> Self {
		Self {
			key: BASE64.encode(key),
			value: BASE64.encode(value),
		}
	}
}

/// Final outcome of a committed transaction.
#[derive(Debug, Clone)]
pub struct TxOutcome {
	pub tx_hash: CryptoHash,
	/// Decoded `SuccessValue`; empty when the call returned nothing.
	pub success_value: Vec<u8>,
	/// Logs from the transaction and every receipt, in execution order.
	pub logs: Vec<String>,
}

impl TxOutcome {
	/// The return value parsed as JSON, or `Null` when there is none.
	pub fn json(&self) -> Result<Value, RpcError> {
		if self.success_value.is_empty() {
			return Ok(Value::Null);
		}
		serde_json::from_slice(&self.success_value)
			.map_err(|e| RpcError::Unexpected(format!("return value is not JSON: {e}")))
	}

	/// Fold the node's final execution view into an outcome, turning a
	/// failed status into an error.
	pub fn from_view(view: FinalExecutionOutcomeView) -> Result<Self, RpcError> {
		let tx_hash = view.transaction_outcome.id;
		let logs = std::iter::once(&view.transaction_outcome)
			.chain(view.receipts_outcome.iter())
			.flat_map(|o| o.outcome.logs.iter().cloned())
			.collect();
		Self::from_status(tx_hash, view.status, logs)
	}

	pub fn from_status(
		tx_hash: CryptoHash,
		status: FinalExecutionStatus,
		logs: Vec<String>,
	) -> Result<Self, RpcError> {
		match status {
			FinalExecutionStatus::SuccessValue(success_value) => Ok(Self {
				tx_hash,
				success_value,
				logs,
			}),
			FinalExecutionStatus::Failure(err) => Err(RpcError::TransactionFailed {
				tx_hash,
				failure: err.to_string(),
			}),
			other => Err(RpcError::Unexpected(format!(
				"transaction {tx_hash} has non-final status {other:?}"
			))),
		}
	}
}

/// The node operations this crate relies on. `RpcClient` talks to a real
/// node; tests substitute a recording fake.
#[async_trait::async_trait]
pub trait NearRpc: Send + Sync {
	/// Run a view method at final finality and return its raw result bytes.
	async fn call_function(
		&self,
		contract_id: &AccountId,
		method_name: &str,
		args: &[u8],
	) -> Result<Vec<u8>, RpcError>;

	/// Current nonce of an access key, read at optimistic finality so that
	/// a transaction committed a moment ago is already reflected.
	async fn view_access_key(
		&self,
		account_id: &AccountId,
		public_key: &PublicKey,
	) -> Result<AccessKeyView, RpcError>;

	/// List contract storage entries whose key starts with `prefix`.
	async fn view_state(&self, account_id: &AccountId, prefix: &[u8]) -> Result<Vec<StateItem>, RpcError>;

	/// Submit a signed transaction and wait for its final outcome.
	async fn broadcast_tx_commit(&self, tx: &SignedTransaction) -> Result<TxOutcome, RpcError>;
}

/// Thin wrapper around the NEAR JSON-RPC client.
///
/// Every request is bounded by the configured timeout.
pub struct RpcClient {
	sdk: JsonRpcClient,
	timeout: Duration,
}

impl RpcClient {
	pub fn new(url: &str, timeout: Duration) -> Self {
		Self {
			sdk: JsonRpcClient::connect(url),
			timeout,
		}
	}

	/// Node status (chain id, latest block, version).
	pub async fn status(&self) -> Result<StatusResponse, RpcError> {
		self.bounded(self.sdk.call(methods::status::RpcStatusRequest))
			.await?
			.map_err(|e| RpcError::Status(e.to_string()))
	}

	async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, RpcError> {
		tokio::time::timeout(self.timeout, fut)
			.await
			.map_err(|_| RpcError::Timeout {
				url: self.sdk.server_addr().to_owned(),
				timeout: self.timeout,
			})
	}

	async fn query(&self, block_reference: BlockReference, request: QueryRequest) -> Result<RpcQueryResponse, RpcError> {
		tracing::debug!(url = self.sdk.server_addr(), ?request, "rpc query");
		let req = methods::query::RpcQueryRequest {
			block_reference,
			request,
		};
		Ok(self.bounded(self.sdk.call(req)).await??)
	}
}

#[async_trait::async_trait]
impl NearRpc for RpcClient {
	async fn call_function(
		&self,
		contract_id: &AccountId,
		method_name: &str,
		args: &[u8],
	) -> Result<Vec<u8>, RpcError> {
		let resp = self
			.query(
				BlockReference::Finality(Finality::Final),
				QueryRequest::CallFunction {
					account_id: contract_id.clone(),
					method_name: method_name.to_owned(),
					args: FunctionArgs::from(args.to_vec()),
				},
			)
			.await?;
		match resp.kind {
			QueryResponseKind::CallResult(result) => Ok(result.result),
			other => Err(unexpected("call_function", &other)),
		}
	}

	async fn view_access_key(
		&self,
		account_id: &AccountId,
		public_key: &PublicKey,
	) -> Result<AccessKeyView, RpcError> {
		let resp = self
			.query(
				// `Finality::None` is "optimistic" on the wire.
				BlockReference::Finality(Finality::None),
				QueryRequest::ViewAccessKey {
					account_id: account_id.clone(),
					public_key: public_key.clone(),
				},
			)
			.await?;
		match resp.kind {
			QueryResponseKind::AccessKey(key) => Ok(AccessKeyView {
				nonce: key.nonce,
				block_hash: resp.block_hash,
			}),
			other => Err(unexpected("view_access_key", &other)),
		}
	}

	async fn view_state(&self, account_id: &AccountId, prefix: &[u8]) -> Result<Vec<StateItem>, RpcError> {
		let resp = self
			.query(
				BlockReference::Finality(Finality::Final),
				QueryRequest::ViewState {
					account_id: account_id.clone(),
					prefix: StoreKey::from(prefix.to_vec()),
					include_proof: false,
				},
			)
			.await?;
		match resp.kind {
			QueryResponseKind::ViewState(state) => Ok(state
				.values
				.iter()
				.map(|item| StateItem::from_raw(&item.key, &item.value))
				.collect()),
			other => Err(unexpected("view_state", &other)),
		}
	}

	async fn broadcast_tx_commit(&self, tx: &SignedTransaction) -> Result<TxOutcome, RpcError> {
		tracing::debug!(url = self.sdk.server_addr(), tx_hash = %tx.get_hash(), "broadcasting transaction");
		let req = methods::broadcast_tx_commit::RpcBroadcastTxCommitRequest {
			signed_transaction: tx.clone(),
		};
		let view = self.bounded(self.sdk.call(req)).await??;
		TxOutcome::from_view(view)
	}
}

fn unexpected(request: &str, kind: &QueryResponseKind) -> RpcError {
	RpcError::Unexpected(format!("{request} answered with {kind:?}"))
}
