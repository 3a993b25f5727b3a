//! End-to-end flows: deploy, call and query.
//!
//! ```text
//! deploy/call: Idle → KeyLoaded → NonceFetched → Built → Signed → Broadcast
//!              → Polling → Finalized | Rejected | TimedOut
//! query:       Idle → Encoded → Queried → Decoded
//! ```
//!
//! Transaction arguments are encoded while still `Idle`, so a bad argument
//! never reaches the network.  Any component failure ends the flow in
//! `Failed(kind)`.  Nothing is retried across states; retries happen only
//! inside gateway calls.  The nonce is read right before building, without
//! any client-side locking: two concurrent runs for one sender can pick the
//! same nonce and the network will reject one of them.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use num_bigint::BigUint;

use crate::address::Address;
use crate::codec::{self, ArgKind, IntWidth, Literal};
use crate::error::{EngineError, ErrorKind};
use crate::gateway::{self, ContractQuery, Gateway, TxStatus};
use crate::keystore;
use crate::signer;
use crate::tx_builder::{self, ChainParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
	Idle,
	KeyLoaded,
	NonceFetched,
	Built,
	Signed,
	Broadcast,
	Polling,
	Finalized,
	Rejected,
	TimedOut,
	Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
	Idle,
	Encoded,
	Queried,
	Decoded,
	Failed(ErrorKind),
}

/// How a broadcast transaction ended, from this process's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
	Finalized,
	Rejected,
	/// Status polling gave up; the transaction may still complete.
	TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReport {
	pub tx_hash: String,
	pub sender: Address,
	pub nonce: u64,
	pub outcome: TxOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReport {
	pub values: Vec<Literal>,
	pub return_code: String,
}

/// A flow that stopped in `Failed`.  `reached` is the last state entered
/// successfully; `error` is the component error, unchanged.  `tx_hash` is
/// set once the transaction was accepted for broadcast, so it can still be
/// tracked.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct FlowError<S: fmt::Debug> {
	pub reached: S,
	pub error: EngineError,
	pub tx_hash: Option<String>,
}

impl<S: fmt::Debug> FlowError<S> {
	pub fn kind(&self) -> ErrorKind {
		self.error.kind()
	}

	pub fn into_inner(self) -> EngineError {
		self.error
	}
}

impl FlowError<TxState> {
	pub fn final_state(&self) -> TxState {
		TxState::Failed(self.kind())
	}
}

impl FlowError<QueryState> {
	pub fn final_state(&self) -> QueryState {
		QueryState::Failed(self.kind())
	}
}

pub type FlowResult<T, S> = Result<T, FlowError<S>>;

/// Gas, chain and polling parameters shared by transaction flows.
#[derive(Debug, Clone)]
pub struct FlowSettings {
	pub chain: ChainParams,
	pub gas_price: u64,
	pub gas_limit: u64,
	pub poll_attempts: u32,
	pub poll_interval: Duration,
}

/// What a transaction flow should do once it has a nonce.
#[derive(Debug, Clone)]
pub enum TxIntent {
	/// Deploy code; the head is the full code payload (bytecode plus VM
	/// markers, see [`crate::project::ContractCode::deploy_payload`]).
	Deploy { code_payload: Vec<u8> },
	Call { contract: Address, function: String },
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
	pub contract: Address,
	pub function: String,
	pub args: Vec<Literal>,
	/// Expected kinds of the returned values, in order.  Values beyond
	/// this list decode as `biguint`.
	pub returns: Vec<ArgKind>,
}

struct Tracker<S> {
	flow: &'static str,
	state: S,
	tx_hash: Option<String>,
}

impl<S: fmt::Debug + Copy> Tracker<S> {
	fn new(flow: &'static str, initial: S) -> Self {
		Self {
			flow,
			state: initial,
			tx_hash: None,
		}
	}

	fn enter(&mut self, next: S) {
		tracing::debug!(flow = self.flow, from = ?self.state, to = ?next, "state transition");
		self.state = next;
	}

	fn fail(&self, error: EngineError) -> FlowError<S> {
		tracing::debug!(flow = self.flow, reached = ?self.state, kind = ?error.kind(), tx_hash = ?self.tx_hash, "flow failed");
		FlowError {
			reached: self.state,
			error,
			tx_hash: self.tx_hash.clone(),
		}
	}
}

/// Drives the flows against one gateway.
pub struct Orchestrator<'g, G: Gateway + ?Sized> {
	gateway: &'g G,
	settings: FlowSettings,
}

impl<'g, G: Gateway + ?Sized> Orchestrator<'g, G> {
	pub fn new(gateway: &'g G, settings: FlowSettings) -> Self {
		Self { gateway, settings }
	}

	/// Deploy the given code payload from the owner in `key_path`.
	pub async fn deploy(
		&self,
		key_path: &Path,
		code_payload: Vec<u8>,
		args: &[Literal],
		value: BigUint,
	) -> FlowResult<TxReport, TxState> {
		self.submit(key_path, TxIntent::Deploy { code_payload }, args, value)
			.await
	}

	/// Call `function` on `contract` as the account in `key_path`.
	pub async fn call(
		&self,
		key_path: &Path,
		contract: Address,
		function: &str,
		args: &[Literal],
		value: BigUint,
	) -> FlowResult<TxReport, TxState> {
		let intent = TxIntent::Call {
			contract,
			function: function.to_owned(),
		};
		self.submit(key_path, intent, args, value).await
	}

	/// Run the full transaction pipeline for `intent`.
	pub async fn submit(
		&self,
		key_path: &Path,
		intent: TxIntent,
		args: &[Literal],
		value: BigUint,
	) -> FlowResult<TxReport, TxState> {
		let mut t = Tracker::new("transaction", TxState::Idle);
		let s = &self.settings;

		let encoded = codec::encode_args(args).map_err(|e| t.fail(e))?;

		let key = keystore::load(key_path).map_err(|e| t.fail(e))?;
		let sender = *key.address();
		t.enter(TxState::KeyLoaded);

		let nonce = self
			.gateway
			.fetch_nonce(&sender)
			.await
			.map_err(|e| t.fail(e))?;
		t.enter(TxState::NonceFetched);

		let unsigned = match &intent {
			TxIntent::Deploy { code_payload } => tx_builder::build_deploy(
				sender, code_payload, &encoded, value, s.gas_price, s.gas_limit, nonce, &s.chain,
			),
			TxIntent::Call { contract, function } => tx_builder::build_call(
				sender, *contract, function, &encoded, value, s.gas_price, s.gas_limit, nonce, &s.chain,
			),
		}
		.map_err(|e| t.fail(e))?;
		t.enter(TxState::Built);

		let signed = signer::sign(&unsigned, &key).map_err(|e| t.fail(e))?;
		drop(key);
		t.enter(TxState::Signed);

		let tx_hash = self.gateway.broadcast(&signed).await.map_err(|e| t.fail(e))?;
		t.tx_hash = Some(tx_hash.clone());
		t.enter(TxState::Broadcast);
		tracing::info!(%tx_hash, nonce, sender = %sender, "transaction broadcast");

		t.enter(TxState::Polling);
		let polled =
			gateway::poll_status(self.gateway, &tx_hash, s.poll_attempts, s.poll_interval).await;
		let outcome = match polled {
			Ok(TxStatus::Finalized) => TxOutcome::Finalized,
			Ok(_) => TxOutcome::Rejected,
			Err(EngineError::Timeout { .. }) => TxOutcome::TimedOut,
			Err(e) => return Err(t.fail(e)),
		};
		t.enter(match outcome {
			TxOutcome::Finalized => TxState::Finalized,
			TxOutcome::Rejected => TxState::Rejected,
			TxOutcome::TimedOut => TxState::TimedOut,
		});
		tracing::info!(%tx_hash, ?outcome, "transaction flow finished");

		Ok(TxReport {
			tx_hash,
			sender,
			nonce,
			outcome,
		})
	}

	/// Read-only contract call; no key and no signature involved.
	pub async fn query(&self, req: &QueryRequest) -> FlowResult<QueryReport, QueryState> {
		let mut t = Tracker::new("query", QueryState::Idle);

		let args = codec::encode_args(&req.args).map_err(|e| t.fail(e))?;
		t.enter(QueryState::Encoded);

		let query = ContractQuery {
			contract: req.contract,
			function: req.function.clone(),
			args,
		};
		let result = self.gateway.query(&query).await.map_err(|e| t.fail(e))?;
		if !result.is_ok() {
			let reason = result
				.return_message
				.clone()
				.unwrap_or_else(|| result.return_code.clone());
			return Err(t.fail(EngineError::GatewayRejected(reason)));
		}
		t.enter(QueryState::Queried);

		if result.return_data.len() < req.returns.len() {
			return Err(t.fail(EngineError::ArgumentDecodeError {
				kind: "return values".into(),
				reason: format!(
					"expected {} values, got {}",
					req.returns.len(),
					result.return_data.len()
				),
			}));
		}
		let values = result
			.return_data
			.iter()
			.enumerate()
			.map(|(i, raw)| {
				let kind = req
					.returns
					.get(i)
					.copied()
					.unwrap_or(ArgKind::Uint(IntWidth::Big));
				codec::decode(raw, kind)
			})
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| t.fail(e))?;
		t.enter(QueryState::Decoded);

		Ok(QueryReport {
			values,
			return_code: result.return_code,
		})
	}
}
