use near_crypto::{PublicKey, Signer};
use near_primitives::account::AccessKey;
use near_primitives::hash::CryptoHash;
use near_primitives::transaction::{
	Action, AddKeyAction, CreateAccountAction, DeployContractAction, FunctionCallAction,
	SignedTransaction, TransferAction,
};
use near_primitives::types::{AccountId, Balance, Gas, Nonce};

/// 30 TGas, the default prepaid gas for function calls.
pub const DEFAULT_FUNCTION_CALL_GAS: Gas = 30_000_000_000_000;

/// Actions that create the receiver as a new account holding `deposit`
/// and controlled by `public_key`.
pub fn create_account_actions(public_key: PublicKey, deposit: Balance) -> Vec<Action> {
	vec![
		Action::CreateAccount(CreateAccountAction {}),
		Action::Transfer(TransferAction { deposit }),
		Action::AddKey(Box::new(AddKeyAction {
			public_key,
			access_key: AccessKey::full_access(),
		})),
	]
}

/// Same as [`create_account_actions`] followed by deploying `code` to the
/// new account in the same transaction.
pub fn create_and_deploy_actions(public_key: PublicKey, code: Vec<u8>, deposit: Balance) -> Vec<Action> {
	let mut actions = create_account_actions(public_key, deposit);
	actions.push(deploy_action(code));
	actions
}

pub fn deploy_action(code: Vec<u8>) -> Action {
	Action::DeployContract(DeployContractAction { code })
}

pub fn function_call_action(method_name: &str, args: Vec<u8>, gas: Gas, deposit: Balance) -> Action {
	Action::FunctionCall(Box::new(FunctionCallAction {
		method_name: method_name.to_owned(),
		args,
		gas,
		deposit,
	}))
}

/// Assemble and sign a transaction from `signer` to `receiver_id`.
pub fn build_signed(
	signer: &dyn Signer,
	signer_id: &AccountId,
	receiver_id: &AccountId,
	nonce: Nonce,
	block_hash: CryptoHash,
	actions: Vec<Action>,
) -> SignedTransaction {
	SignedTransaction::from_actions(
		nonce,
		signer_id.clone(),
		receiver_id.clone(),
		signer,
		actions,
		block_hash,
	)
}
