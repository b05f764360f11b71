use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::keystore::FileKeyStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub network: NetworkConfig,
	#[serde(default)]
	pub keys: KeysConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
	pub default: String,
	pub testnet_rpc: String,
	pub sandbox_rpc: String,
	#[serde(default = "default_rpc_timeout_secs")]
	pub rpc_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
	/// Root of the on-disk credential store.
	pub credentials_dir: Option<PathBuf>,
	/// Validator key written by a local sandbox node.
	pub validator_key: PathBuf,
}

fn default_rpc_timeout_secs() -> u64 {
	30
}

impl Default for KeysConfig {
	fn default() -> Self {
		Self {
			credentials_dir: None,
			validator_key: PathBuf::from("/tmp/near-sandbox/validator_key.json"),
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			network: NetworkConfig {
				default: "testnet".into(),
				testnet_rpc: "https://rpc.testnet.near.org".into(),
				sandbox_rpc: "http://localhost:3030".into(),
				rpc_timeout_secs: default_rpc_timeout_secs(),
			},
			keys: KeysConfig::default(),
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.nekocoin/).
	pub fn dir() -> PathBuf {
		dirs::home_dir().unwrap_or_default().join(".nekocoin")
	}

	/// Path to the config file.
	pub fn path() -> PathBuf {
		Self::dir().join("config.toml")
	}

	/// Load config from disk, falling back to defaults if no file exists.
	pub fn load() -> anyhow::Result<Self> {
		Self::load_from(&Self::path())
	}

	pub fn load_from(path: &Path) -> anyhow::Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display()))?;
		toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
	}

	/// Persist the current config to disk, creating the directory if needed.
	pub fn save(&self) -> anyhow::Result<()> {
		let path = Self::path();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.with_context(|| format!("failed to create {}", parent.display()))?;
		}
		std::fs::write(&path, toml::to_string_pretty(self)?)
			.with_context(|| format!("failed to write {}", path.display()))?;
		Ok(())
	}

	/// Return the RPC URL for the given network name.
	pub fn rpc_url(&self, network: &str) -> &str {
		match network {
			"sandbox" | "local" => &self.network.sandbox_rpc,
			_ => &self.network.testnet_rpc,
		}
	}

	pub fn credentials_dir(&self) -> PathBuf {
		self.keys
			.credentials_dir
			.clone()
			.unwrap_or_else(FileKeyStore::default_root)
	}
}
