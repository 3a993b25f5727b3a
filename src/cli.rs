use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
	name = "erdcli",
	about = "Deploy, call and query smart contracts through a proxy gateway.",
	version
)]
pub struct Cli {
	/// Gateway (proxy) URL; overrides the config file.
	#[arg(long, global = true)]
	pub proxy: Option<String>,

	/// Chain identifier; overrides the config file.
	#[arg(long, global = true)]
	pub chain_id: Option<String>,

	/// Log engine activity at debug level.
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Deploy a contract from a project directory or a .wasm file.
	Deploy {
		/// Project directory (bytecode under output/) or .wasm file.
		project: PathBuf,

		/// Owner's PEM key file.
		#[arg(long)]
		pem: PathBuf,

		/// Constructor arguments file (one kind:value per line, or a JSON array).
		#[arg(long)]
		arguments: Option<PathBuf>,

		#[command(flatten)]
		tx: TxArgs,
	},

	/// Call a contract function in a signed transaction.
	Call {
		/// Contract address (erd1...).
		contract: String,

		/// Caller's PEM key file.
		#[arg(long)]
		pem: PathBuf,

		/// Function to call.
		#[arg(long)]
		function: String,

		/// Arguments file (one kind:value per line, or a JSON array).
		#[arg(long)]
		arguments: Option<PathBuf>,

		#[command(flatten)]
		tx: TxArgs,
	},

	/// Run a read-only contract function.
	Query {
		/// Contract address (erd1...).
		contract: String,

		/// Function to query.
		#[arg(long)]
		function: String,

		/// Arguments file (one kind:value per line, or a JSON array).
		#[arg(long)]
		arguments: Option<PathBuf>,

		/// Comma-separated kinds of the returned values, e.g. `u64,str`.
		/// Unlisted values decode as biguint.
		#[arg(long)]
		returns: Option<String>,
	},

	/// Inspect accounts.
	Account {
		#[command(subcommand)]
		command: AccountCommand,
	},

	/// Check transaction status.
	Tx {
		#[command(subcommand)]
		command: TxCommand,
	},

	/// Inspect network parameters.
	Network {
		#[command(subcommand)]
		command: NetworkCommand,
	},
}

/// Options shared by every signed transaction.
#[derive(clap::Args)]
pub struct TxArgs {
	/// Gas price; defaults to the config file.
	#[arg(long)]
	pub gas_price: Option<u64>,

	/// Gas limit; defaults to the config file.
	#[arg(long)]
	pub gas_limit: Option<u64>,

	/// Value to transfer, in the smallest denomination.
	#[arg(long, default_value = "0")]
	pub value: String,

	/// Return right after broadcasting instead of waiting for finality.
	#[arg(long)]
	pub no_wait: bool,
}

// -- Account subcommands --

#[derive(Subcommand)]
pub enum AccountCommand {
	/// Show the current nonce of an address.
	Nonce {
		/// Account address (erd1...).
		address: String,
	},
}

// -- Tx subcommands --

#[derive(Subcommand)]
pub enum TxCommand {
	/// Check the status of a transaction.
	Status {
		/// Transaction hash (64 hex characters).
		tx_hash: String,
	},
}

// -- Network subcommands --

#[derive(Subcommand)]
pub enum NetworkCommand {
	/// Show chain id and gas parameters published by the gateway.
	Config,
}
