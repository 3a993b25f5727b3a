use std::path::Path;

use anyhow::{anyhow, Result};

use crate::address::Address;
use crate::cli::{Cli, TxArgs};
use crate::commands::{flow_settings, parse_value, read_arguments, report_tx, resolve_gateway, tx_flow_error};
use crate::config::Config;
use crate::flows::Orchestrator;

pub async fn run(
	cli: &Cli,
	contract: &str,
	pem: &Path,
	function: &str,
	arguments: Option<&Path>,
	tx: &TxArgs,
) -> Result<()> {
	let config = Config::load()?;
	let gateway = resolve_gateway(cli, &config)?;
	let settings = flow_settings(cli, &config, Some(tx));

	let contract: Address = contract
		.parse()
		.map_err(|e| anyhow!("invalid contract address: {e}"))?;
	let args = read_arguments(arguments)?;
	let value = parse_value(&tx.value)?;

	println!("Calling {function} on {contract}...");
	let report = Orchestrator::new(&gateway, settings)
		.call(pem, contract, function, &args, value)
		.await
		.map_err(tx_flow_error)?;
	report_tx(&report)
}
