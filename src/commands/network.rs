use anyhow::Result;

use crate::cli::{Cli, NetworkCommand};
use crate::commands::resolve_gateway;
use crate::config::Config;
use crate::gateway::Gateway;

pub async fn run(cli: &Cli, cmd: &NetworkCommand) -> Result<()> {
	let config = Config::load()?;
	let gateway = resolve_gateway(cli, &config)?;

	match cmd {
		NetworkCommand::Config => {
			let net = gateway.network_config().await?;
			println!("Gateway:            {}", gateway.url());
			println!("Chain ID:           {}", net.chain_id);
			println!("Min gas price:      {}", net.min_gas_price);
			println!("Min gas limit:      {}", net.min_gas_limit);
			println!("Gas per data byte:  {}", net.gas_per_data_byte);
			println!("Min tx version:     {}", net.min_transaction_version);
			if net.chain_id != config.chain.chain_id && cli.chain_id.is_none() {
				println!();
				println!(
					"Note: configured chain id is {:?}; transactions will be rejected unless it matches.",
					config.chain.chain_id
				);
			}
			Ok(())
		}
	}
}
