use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::Signature;
use num_bigint::BigUint;
use serde::Serialize;

use crate::address::Address;
use crate::error::{EngineError, EngineResult};

/// Separates the payload head from each argument, and arguments from each
/// other.  The network splits the data field on this byte, positionally.
pub const ARG_DELIMITER: u8 = b'@';

/// VM type marker placed after deploy bytecode (WASM VM, version 5).
pub const VM_TYPE_WASM: &str = "0500";

/// Code metadata placed after the VM type: upgradeable, not payable.
pub const CODE_METADATA_UPGRADEABLE: &str = "0100";

pub const DEFAULT_TX_VERSION: u32 = 1;

/// Network parameters every transaction is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
	pub chain_id: String,
	pub version: u32,
}

/// A transaction as assembled by this module.  Fields are fixed at build
/// time; the only later change is [`crate::signer::sign`] producing a
/// signed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	nonce: u64,
	sender: Address,
	receiver: Address,
	value: BigUint,
	gas_price: u64,
	gas_limit: u64,
	payload: Vec<u8>,
	chain_id: String,
	version: u32,
	signature: Option<Signature>,
}

/// JSON shape shared by the signing serialization and the send endpoint.
/// Field order here is the canonical order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransaction<'a> {
	pub nonce: u64,
	pub sender: String,
	pub receiver: String,
	pub value: String,
	pub gas_price: u64,
	pub gas_limit: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
	#[serde(rename = "chainID")]
	pub chain_id: &'a str,
	pub version: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub signature: Option<String>,
}

impl Transaction {
	pub fn nonce(&self) -> u64 {
		self.nonce
	}

	pub fn sender(&self) -> &Address {
		&self.sender
	}

	pub fn receiver(&self) -> &Address {
		&self.receiver
	}

	pub fn value(&self) -> &BigUint {
		&self.value
	}

	pub fn gas_price(&self) -> u64 {
		self.gas_price
	}

	pub fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	pub fn chain_id(&self) -> &str {
		&self.chain_id
	}

	pub fn version(&self) -> u32 {
		self.version
	}

	pub fn signature(&self) -> Option<&Signature> {
		self.signature.as_ref()
	}

	pub(crate) fn with_signature(&self, signature: Signature) -> Self {
		Self {
			signature: Some(signature),
			..self.clone()
		}
	}

	/// Wire form, including the signature when present.
	pub fn to_wire(&self) -> WireTransaction<'_> {
		WireTransaction {
			nonce: self.nonce,
			sender: self.sender.to_bech32(),
			receiver: self.receiver.to_bech32(),
			value: self.value.to_string(),
			gas_price: self.gas_price,
			gas_limit: self.gas_limit,
			data: (!self.payload.is_empty()).then(|| BASE64.encode(&self.payload)),
			chain_id: &self.chain_id,
			version: self.version,
			signature: self.signature.map(|s| hex::encode(s.to_bytes())),
		}
	}

	/// Canonical bytes covered by the signature: compact JSON of every
	/// field except the signature, in the order of [`WireTransaction`].
	pub fn signing_bytes(&self) -> Vec<u8> {
		let mut wire = self.to_wire();
		wire.signature = None;
		serde_json::to_vec(&wire).expect("wire transaction has only plain fields")
	}
}

/// Join a payload head and hex-encoded arguments with [`ARG_DELIMITER`]:
/// `head ( '@' hex(arg) )*`.
pub fn build_payload(head: &[u8], encoded_args: &[Vec<u8>]) -> Vec<u8> {
	let args_len: usize = encoded_args.iter().map(|a| 1 + a.len() * 2).sum();
	let mut out = Vec::with_capacity(head.len() + args_len);
	out.extend_from_slice(head);
	for arg in encoded_args {
		out.push(ARG_DELIMITER);
		out.extend_from_slice(hex::encode(arg).as_bytes());
	}
	out
}

/// Build an unsigned contract deployment.  `code_payload` is placed
/// verbatim at the head of the data field; see
/// [`crate::project::ContractCode::deploy_payload`].
#[allow(clippy::too_many_arguments)]
pub fn build_deploy(
	sender: Address,
	code_payload: &[u8],
	encoded_args: &[Vec<u8>],
	value: BigUint,
	gas_price: u64,
	gas_limit: u64,
	nonce: u64,
	chain: &ChainParams,
) -> EngineResult<Transaction> {
	if code_payload.is_empty() {
		return Err(EngineError::Project("deploy code is empty".into()));
	}

	Ok(Transaction {
		nonce,
		sender,
		receiver: Address::zero(),
		value,
		gas_price,
		gas_limit,
		payload: build_payload(code_payload, encoded_args),
		chain_id: chain.chain_id.clone(),
		version: chain.version,
		signature: None,
	})
}

/// Build an unsigned call of `function` on the `receiver` contract.
#[allow(clippy::too_many_arguments)]
pub fn build_call(
	sender: Address,
	receiver: Address,
	function: &str,
	encoded_args: &[Vec<u8>],
	value: BigUint,
	gas_price: u64,
	gas_limit: u64,
	nonce: u64,
	chain: &ChainParams,
) -> EngineResult<Transaction> {
	if function.is_empty() || function.bytes().any(|b| b == ARG_DELIMITER) {
		return Err(EngineError::UnsupportedArgumentType {
			position: 0,
			value: format!("function name {function:?}"),
		});
	}

	Ok(Transaction {
		nonce,
		sender,
		receiver,
		value,
		gas_price,
		gas_limit,
		payload: build_payload(function.as_bytes(), encoded_args),
		chain_id: chain.chain_id.clone(),
		version: chain.version,
		signature: None,
	})
}
