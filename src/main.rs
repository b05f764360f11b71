use anyhow::Result;
use clap::Parser;

use nekocoin_ops::cli::{Cli, Command};
use nekocoin_ops::{commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	logging::init();

	match &cli.command {
		Command::Deploy { wasm } => commands::deploy::run(&cli, wasm).await,
		Command::Clean { apply, batch } => commands::clean::run(&cli, *apply, *batch).await,
		Command::Sandbox(args) => commands::sandbox::run(&cli, args).await,
		Command::Config { command } => commands::config::run(&cli, command),
		_ => commands::token::run(&cli, &cli.command).await,
	}
}
