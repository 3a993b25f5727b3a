use std::path::Path;

use anyhow::{anyhow, Result};

use crate::address::Address;
use crate::cli::Cli;
use crate::codec;
use crate::commands::{flow_settings, read_arguments, resolve_gateway};
use crate::config::Config;
use crate::flows::{Orchestrator, QueryRequest};

pub async fn run(
	cli: &Cli,
	contract: &str,
	function: &str,
	arguments: Option<&Path>,
	returns: Option<&str>,
) -> Result<()> {
	let config = Config::load()?;
	let gateway = resolve_gateway(cli, &config)?;
	let settings = flow_settings(cli, &config, None);

	let request = QueryRequest {
		contract: contract
			.parse::<Address>()
			.map_err(|e| anyhow!("invalid contract address: {e}"))?,
		function: function.to_owned(),
		args: read_arguments(arguments)?,
		returns: codec::parse_kinds(returns.unwrap_or("")).map_err(|e| anyhow!("--returns: {e}"))?,
	};

	let report = Orchestrator::new(&gateway, settings).query(&request).await?;
	if report.values.is_empty() {
		println!("(no values returned)");
	}
	for (i, value) in report.values.iter().enumerate() {
		println!("[{i}] {value}");
	}
	Ok(())
}
