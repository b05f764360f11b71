use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use near_crypto::{ParseKeyError, SecretKey};
use near_primitives::types::AccountId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
	#[error("failed to access key file {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("malformed key file {path}: {source}")]
	Json {
		path: PathBuf,
		source: serde_json::Error,
	},

	#[error("key file {path} has neither `secret_key` nor `private_key`")]
	MissingSecret { path: PathBuf },

	#[error("bad key in {path}: {source}")]
	Key { path: PathBuf, source: ParseKeyError },
}

/// Stores and retrieves signing keys by (network, account).
pub trait KeyStore: Send + Sync {
	fn get_key(&self, network: &str, account_id: &AccountId) -> Result<Option<SecretKey>, KeyStoreError>;

	fn set_key(&self, network: &str, account_id: &AccountId, key: &SecretKey) -> Result<(), KeyStoreError>;
}

/// On-disk JSON layout shared by credential files and the sandbox
/// validator key. Node-written files name the secret `secret_key`, the
/// NEAR CLI writes `private_key`; either or both may be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub account_id: Option<AccountId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub private_key: Option<String>,
}

impl KeyFile {
	/// `secret_key` wins over `private_key` when both are set.
	pub fn secret(&self) -> Option<&str> {
		self.secret_key.as_deref().or(self.private_key.as_deref())
	}
}

/// Read a key file such as the sandbox `validator_key.json`.
pub fn load_key_file(path: &Path) -> Result<(KeyFile, SecretKey), KeyStoreError> {
	let content = fs::read_to_string(path).map_err(|source| KeyStoreError::Io {
		path: path.to_owned(),
		source,
	})?;
	let file: KeyFile = serde_json::from_str(&content).map_err(|source| KeyStoreError::Json {
		path: path.to_owned(),
		source,
	})?;
	let secret = file.secret().ok_or_else(|| KeyStoreError::MissingSecret {
		path: path.to_owned(),
	})?;
	let key = secret.parse::<SecretKey>().map_err(|source| KeyStoreError::Key {
		path: path.to_owned(),
		source,
	})?;
	Ok((file, key))
}

// -- In-memory --

#[derive(Default)]
pub struct InMemoryKeyStore {
	keys: Mutex<HashMap<(String, AccountId), SecretKey>>,
}

impl InMemoryKeyStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyStore for InMemoryKeyStore {
	fn get_key(&self, network: &str, account_id: &AccountId) -> Result<Option<SecretKey>, KeyStoreError> {
		let keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
		Ok(keys.get(&(network.to_owned(), account_id.clone())).cloned())
	}

	fn set_key(&self, network: &str, account_id: &AccountId, key: &SecretKey) -> Result<(), KeyStoreError> {
		let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
		keys.insert((network.to_owned(), account_id.clone()), key.clone());
		Ok(())
	}
}

// -- Unencrypted on-disk --

/// Credentials laid out as `<root>/<network>/<account_id>.json`, the same
/// layout the NEAR CLI writes under `~/.near-credentials`. Files are
/// owner-only (0600) inside owner-only directories (0700).
pub struct FileKeyStore {
	root: PathBuf,
}

impl FileKeyStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// `~/.near-credentials`, or `.near-credentials` relative to the working
	/// directory when no home directory is known.
	pub fn default_root() -> PathBuf {
		dirs::home_dir()
			.unwrap_or_default()
			.join(".near-credentials")
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn key_path(&self, network: &str, account_id: &AccountId) -> PathBuf {
		self.root.join(network).join(format!("{account_id}.json"))
	}

	fn ensure_dir(dir: &Path) -> std::io::Result<()> {
		if !dir.exists() {
			fs::create_dir_all(dir)?;

			#[cfg(unix)]
			fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
		}
		Ok(())
	}
}

impl KeyStore for FileKeyStore {
	fn get_key(&self, network: &str, account_id: &AccountId) -> Result<Option<SecretKey>, KeyStoreError> {
		let path = self.key_path(network, account_id);
		if !path.exists() {
			return Ok(None);
		}
		let (_, key) = load_key_file(&path)?;
		Ok(Some(key))
	}

	fn set_key(&self, network: &str, account_id: &AccountId, key: &SecretKey) -> Result<(), KeyStoreError> {
		let path = self.key_path(network, account_id);
		let io_err = |source| KeyStoreError::Io {
			path: path.clone(),
			source,
		};

		if let Some(parent) = path.parent() {
			Self::ensure_dir(parent).map_err(io_err)?;
		}
		let file = KeyFile {
			account_id: Some(account_id.clone()),
			public_key: Some(key.public_key().to_string()),
			secret_key: None,
			private_key: Some(key.to_string()),
		};
		let json = serde_json::to_string(&file).map_err(|source| KeyStoreError::Json {
			path: path.clone(),
			source,
		})?;

		// Write and restrict a temp file, then rename over the key.
		let temp_path = path.with_extension("json.tmp");
		{
			let mut out = fs::File::create(&temp_path).map_err(io_err)?;
			#[cfg(unix)]
			fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
			out.write_all(json.as_bytes()).map_err(io_err)?;
			out.sync_all().map_err(io_err)?;
		}
		fs::rename(&temp_path, &path).map_err(io_err)?;

		tracing::debug!(path = %path.display(), account = %account_id, "stored key");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use near_crypto::KeyType;

	fn scratch_dir(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!(
			"nekocoin-keystore-{name}-{}",
			std::process::id()
		));
		let _ = fs::remove_dir_all(&dir);
		dir
	}

	fn random_key() -> SecretKey {
		SecretKey::from_random(KeyType::ED25519)
	}

	#[test]
	fn in_memory_is_scoped_by_network() {
		let store = InMemoryKeyStore::new();
		let alice: AccountId = "alice.test.near".parse().unwrap();
		let key = random_key();

		store.set_key("sandbox", &alice, &key).unwrap();

		assert_eq!(store.get_key("sandbox", &alice).unwrap(), Some(key));
		assert!(store.get_key("testnet", &alice).unwrap().is_none());
	}

	#[test]
	fn file_store_roundtrip_and_layout() {
		let dir = scratch_dir("roundtrip");
		let store = FileKeyStore::new(&dir);
		let account: AccountId = "nekocoin.testnet".parse().unwrap();
		let key = random_key();

		assert!(store.get_key("testnet", &account).unwrap().is_none());
		store.set_key("testnet", &account, &key).unwrap();

		let path = dir.join("testnet").join("nekocoin.testnet.json");
		let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(raw["account_id"], "nekocoin.testnet");
		assert_eq!(raw["public_key"], key.public_key().to_string());
		assert!(raw["private_key"].as_str().unwrap().starts_with("ed25519:"));
		assert!(!path.with_extension("json.tmp").exists());

		assert_eq!(store.get_key("testnet", &account).unwrap(), Some(key));

		fs::remove_dir_all(&dir).unwrap();
	}

	#[cfg(unix)]
	#[test]
	fn written_keys_are_owner_only() {
		let dir = scratch_dir("perms");
		let store = FileKeyStore::new(&dir);
		let account: AccountId = "test.near".parse().unwrap();

		store.set_key("sandbox", &account, &random_key()).unwrap();
		// Overwriting keeps the restricted mode.
		store.set_key("sandbox", &account, &random_key()).unwrap();

		let file_mode = fs::metadata(store.key_path("sandbox", &account))
			.unwrap()
			.permissions()
			.mode();
		let dir_mode = fs::metadata(dir.join("sandbox")).unwrap().permissions().mode();
		assert_eq!(file_mode & 0o777, 0o600);
		assert_eq!(dir_mode & 0o777, 0o700);

		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn validator_key_accepts_either_or_both_secret_fields() {
		let dir = scratch_dir("validator");
		fs::create_dir_all(&dir).unwrap();
		let key = random_key();
		let other = random_key();

		let cases = [
			serde_json::json!({"account_id": "test.near", "secret_key": key.to_string()}),
			serde_json::json!({"account_id": "test.near", "private_key": key.to_string()}),
			serde_json::json!({
				"account_id": "test.near",
				"public_key": key.public_key().to_string(),
				"secret_key": key.to_string(),
				"private_key": other.to_string(),
			}),
		];
		for (i, json) in cases.iter().enumerate() {
			let path = dir.join(format!("validator_key_{i}.json"));
			fs::write(&path, json.to_string()).unwrap();

			let (file, loaded) = load_key_file(&path).unwrap();
			assert_eq!(file.account_id.unwrap().as_str(), "test.near");
			assert_eq!(loaded, key, "case {i}");
		}

		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn missing_and_malformed_key_files_are_errors() {
		let dir = scratch_dir("malformed");
		assert!(matches!(
			load_key_file(&dir.join("nope.json")),
			Err(KeyStoreError::Io { .. })
		));

		fs::create_dir_all(&dir).unwrap();
		let bad_json = dir.join("bad.json");
		fs::write(&bad_json, "{not json").unwrap();
		assert!(matches!(load_key_file(&bad_json), Err(KeyStoreError::Json { .. })));

		let no_secret = dir.join("no_secret.json");
		fs::write(&no_secret, r#"{"account_id":"test.near"}"#).unwrap();
		assert!(matches!(
			load_key_file(&no_secret),
			Err(KeyStoreError::MissingSecret { .. })
		));

		let bad_key = dir.join("bad_key.json");
		fs::write(&bad_key, r#"{"secret_key":"ed25519:abc"}"#).unwrap();
		assert!(matches!(load_key_file(&bad_key), Err(KeyStoreError::Key { .. })));

		fs::remove_dir_all(&dir).unwrap();
	}
}
