use anyhow::Result;

use crate::cli::{Cli, TxCommand};
use crate::commands::resolve_gateway;
use crate::config::Config;
use crate::gateway::Gateway;

pub async fn run(cli: &Cli, cmd: &TxCommand) -> Result<()> {
	let config = Config::load()?;
	let gateway = resolve_gateway(cli, &config)?;

	match cmd {
		TxCommand::Status { tx_hash } => {
			let status = gateway.transaction_status(tx_hash).await?;
			println!("Transaction: {tx_hash}");
			println!("Status:      {status:?}");
			Ok(())
		}
	}
}
