use anyhow::{anyhow, Result};

use crate::address::Address;
use crate::cli::{AccountCommand, Cli};
use crate::commands::resolve_gateway;
use crate::config::Config;
use crate::gateway::Gateway;

pub async fn run(cli: &Cli, cmd: &AccountCommand) -> Result<()> {
	let config = Config::load()?;
	let gateway = resolve_gateway(cli, &config)?;

	match cmd {
		AccountCommand::Nonce { address } => {
			let address: Address = address
				.parse()
				.map_err(|e| anyhow!("invalid address: {e}"))?;
			let nonce = gateway.fetch_nonce(&address).await?;
			println!("Address: {address}");
			println!("Nonce:   {nonce}");
			Ok(())
		}
	}
}
