use std::path::PathBuf;

use thiserror::Error;

/// Every failure the engine can report.  The command surface turns these
/// into a message and a non-zero exit; nothing below it prints.
#[derive(Debug, Error)]
pub enum EngineError {
	/// The credential file is missing, malformed, or fails its checksum.
	#[error("invalid key file {path}: {reason}")]
	InvalidKeyFile { path: PathBuf, reason: String },

	/// An argument literal outside the supported set (1-based position).
	#[error("unsupported argument #{position}: {value:?}")]
	UnsupportedArgumentType { position: usize, value: String },

	/// A returned buffer does not fit the expected kind.
	#[error("cannot decode {kind} value: {reason}")]
	ArgumentDecodeError { kind: String, reason: String },

	#[error("signing failed: {0}")]
	SigningError(String),

	/// Transport-level failure; retried by the gateway's policy.
	#[error("gateway unreachable: {0}")]
	NetworkUnreachable(String),

	/// The gateway understood the request and refused it.  The reason is
	/// the remote text, unmodified.
	#[error("gateway rejected request: {0}")]
	GatewayRejected(String),

	/// Status polling ran out of attempts.
	#[error("transaction {tx_hash} not final after {attempts} status checks")]
	Timeout { tx_hash: String, attempts: u32 },

	/// The gateway answered with something we could not parse.
	#[error("unexpected gateway response: {0}")]
	InvalidResponse(String),

	#[error("invalid gateway url {0:?}")]
	InvalidGatewayUrl(String),

	#[error("project error: {0}")]
	Project(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Data-only classification of an [`EngineError`], used by retry policies
/// and by the flow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	InvalidKeyFile,
	UnsupportedArgumentType,
	ArgumentDecodeError,
	SigningError,
	NetworkUnreachable,
	GatewayRejected,
	NonceStale,
	Timeout,
	InvalidResponse,
	InvalidGatewayUrl,
	Project,
	Io,
}

/// Rejection reasons that mean the sender's nonce was already used.
const STALE_NONCE_MARKERS: &[&str] = &["nonce too low", "lowernonceintx", "nonce is too low"];

impl EngineError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InvalidKeyFile { .. } => ErrorKind::InvalidKeyFile,
			Self::UnsupportedArgumentType { .. } => ErrorKind::UnsupportedArgumentType,
			Self::ArgumentDecodeError { .. } => ErrorKind::ArgumentDecodeError,
			Self::SigningError(_) => ErrorKind::SigningError,
			Self::NetworkUnreachable(_) => ErrorKind::NetworkUnreachable,
			Self::GatewayRejected(reason) if is_stale_nonce_reason(reason) => ErrorKind::NonceStale,
			Self::GatewayRejected(_) => ErrorKind::GatewayRejected,
			Self::Timeout { .. } => ErrorKind::Timeout,
			Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
			Self::InvalidGatewayUrl(_) => ErrorKind::InvalidGatewayUrl,
			Self::Project(_) => ErrorKind::Project,
			Self::Io(_) => ErrorKind::Io,
		}
	}

	/// True when the gateway refused a transaction because its nonce was
	/// already consumed.  Callers may re-run the whole flow; the engine
	/// never does so on its own.
	pub fn is_nonce_stale(&self) -> bool {
		self.kind() == ErrorKind::NonceStale
	}
}

fn is_stale_nonce_reason(reason: &str) -> bool {
	let lower = reason.to_lowercase();
	STALE_NONCE_MARKERS.iter().any(|m| lower.contains(m))
}

pub type EngineResult<T> = Result<T, EngineError>;
