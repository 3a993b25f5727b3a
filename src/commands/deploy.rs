use std::path::Path;

use anyhow::Result;

use crate::cli::{Cli, TxArgs};
use crate::commands::{flow_settings, parse_value, read_arguments, report_tx, resolve_gateway, tx_flow_error};
use crate::config::Config;
use crate::flows::Orchestrator;
use crate::project::ContractCode;

pub async fn run(
	cli: &Cli,
	project: &Path,
	pem: &Path,
	arguments: Option<&Path>,
	tx: &TxArgs,
) -> Result<()> {
	let config = Config::load()?;
	let gateway = resolve_gateway(cli, &config)?;
	let settings = flow_settings(cli, &config, Some(tx));

	let code = ContractCode::load(project)?;
	let args = read_arguments(arguments)?;
	let value = parse_value(&tx.value)?;

	println!("Deploying {} ({} bytes)...", code.source().display(), code.bytes().len());
	let report = Orchestrator::new(&gateway, settings)
		.deploy(pem, code.deploy_payload(), &args, value)
		.await
		.map_err(tx_flow_error)?;
	report_tx(&report)
}
