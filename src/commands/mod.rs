pub mod account;
pub mod call;
pub mod deploy;
pub mod network;
pub mod query;
pub mod tx;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use num_bigint::BigUint;

use crate::cli::{Cli, TxArgs};
use crate::codec::{self, Literal};
use crate::config::Config;
use crate::flows::{FlowError, FlowSettings, TxOutcome, TxReport, TxState};
use crate::gateway::GatewayClient;

/// Build the gateway client from CLI flag or config.
pub fn resolve_gateway(cli: &Cli, config: &Config) -> Result<GatewayClient> {
	let url = cli.proxy.as_deref().unwrap_or(&config.gateway.url);
	Ok(GatewayClient::new(url, config.request_timeout(), config.retry_policy())?)
}

/// Gas, chain and polling settings from CLI flags over config.  Queries
/// pass no transaction options.
pub fn flow_settings(cli: &Cli, config: &Config, tx: Option<&TxArgs>) -> FlowSettings {
	let mut chain = config.chain_params();
	if let Some(id) = &cli.chain_id {
		chain.chain_id = id.clone();
	}

	let no_wait = tx.is_some_and(|t| t.no_wait);
	FlowSettings {
		chain,
		gas_price: tx.and_then(|t| t.gas_price).unwrap_or(config.gas.price),
		gas_limit: tx.and_then(|t| t.gas_limit).unwrap_or(config.gas.limit),
		poll_attempts: if no_wait { 0 } else { config.poll.max_attempts },
		poll_interval: if no_wait {
			Duration::ZERO
		} else {
			config.poll_interval()
		},
	}
}

/// Read an optional arguments file in full before any flow starts.
pub fn read_arguments(path: Option<&Path>) -> Result<Vec<Literal>> {
	match path {
		Some(p) => codec::load_arguments(p).with_context(|| format!("reading arguments from {}", p.display())),
		None => Ok(Vec::new()),
	}
}

pub fn parse_value(text: &str) -> Result<BigUint> {
	text.parse()
		.map_err(|_| anyhow::anyhow!("invalid value {text:?}: expected a non-negative integer"))
}

/// Print a transaction report; rejected transactions are an error.
pub fn report_tx(report: &TxReport) -> Result<()> {
	println!("Sender: {}", report.sender);
	println!("Nonce:  {}", report.nonce);
	println!("TX:     {}", report.tx_hash);
	match report.outcome {
		TxOutcome::Finalized => {
			println!("Status: finalized");
			Ok(())
		}
		TxOutcome::TimedOut => {
			println!("Status: not final yet; check later with `erdcli tx status {}`", report.tx_hash);
			Ok(())
		}
		TxOutcome::Rejected => anyhow::bail!("transaction {} was rejected by the network", report.tx_hash),
	}
}

/// A failed transaction flow.  Once broadcast, the hash is kept in the
/// message so the transaction can still be followed up.
pub fn tx_flow_error(err: FlowError<TxState>) -> anyhow::Error {
	match err.tx_hash.clone() {
		Some(hash) => anyhow::Error::new(err).context(format!(
			"transaction {hash} was broadcast but its status is unknown; check it with `erdcli tx status {hash}`"
		)),
		None => err.into(),
	}
}
