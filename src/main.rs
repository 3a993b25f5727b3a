use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use erdcli::cli::{Cli, Command};
use erdcli::commands;

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let default_filter = if cli.verbose { "erdcli=debug" } else { "erdcli=info" };
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	match &cli.command {
		Command::Deploy {
			project,
			pem,
			arguments,
			tx,
		} => commands::deploy::run(&cli, project, pem, arguments.as_deref(), tx).await,
		Command::Call {
			contract,
			pem,
			function,
			arguments,
			tx,
		} => commands::call::run(&cli, contract, pem, function, arguments.as_deref(), tx).await,
		Command::Query {
			contract,
			function,
			arguments,
			returns,
		} => {
			commands::query::run(&cli, contract, function, arguments.as_deref(), returns.as_deref())
				.await
		}
		Command::Account { command } => commands::account::run(&cli, command).await,
		Command::Tx { command } => commands::tx::run(&cli, command).await,
		Command::Network { command } => commands::network::run(&cli, command).await,
	}
}
