use anyhow::Result;

use crate::cli::{Cli, ConfigCommand};
use crate::commands::{resolve_credentials_dir, resolve_network, resolve_rpc};
use crate::config::Config;

pub fn run(cli: &Cli, cmd: &ConfigCommand) -> Result<()> {
	match cmd {
		ConfigCommand::Show => show(cli),
		ConfigCommand::Init { force } => init(*force),
	}
}

fn show(cli: &Cli) -> Result<()> {
	let config = Config::load()?;
	let network = resolve_network(cli.network, &config)?;
	let path = Config::path();
	let source = if path.exists() { "file" } else { "defaults" };

	println!("Config ({source}: {})", path.display());
	println!("  Network:     {}", network.as_str());
	println!("  RPC:         {}", resolve_rpc(cli, &config, network));
	println!("  Timeout:     {}s", config.network.rpc_timeout_secs);
	println!("  Credentials: {}", resolve_credentials_dir(cli, &config).display());
	println!("  Validator:   {}", config.keys.validator_key.display());
	Ok(())
}

fn init(force: bool) -> Result<()> {
	let path = Config::path();
	if path.exists() && !force {
		anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
	}
	Config::default().save()?;
	println!("Wrote {}", path.display());
	Ok(())
}
