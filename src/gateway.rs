use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::address::Address;
use crate::error::{EngineError, EngineResult};
use crate::retry::RetryPolicy;
use crate::tx_builder::Transaction;

/// Where a broadcast transaction stands, as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
	Accepted,
	Pending,
	Finalized,
	Rejected,
}

impl TxStatus {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Finalized | Self::Rejected)
	}

	fn from_remote(s: &str) -> Option<Self> {
		Some(match s.to_lowercase().as_str() {
			"pending" | "received" | "partially-executed" => Self::Pending,
			"accepted" => Self::Accepted,
			"executed" | "success" | "successful" | "finalized" => Self::Finalized,
			"fail" | "failed" | "invalid" | "rejected" => Self::Rejected,
			_ => return None,
		})
	}
}

/// A read-only contract call.  Arguments are already encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractQuery {
	pub contract: Address,
	pub function: String,
	pub args: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
	pub return_data: Vec<Vec<u8>>,
	pub return_code: String,
	pub return_message: Option<String>,
}

impl QueryResult {
	pub fn is_ok(&self) -> bool {
		self.return_code == "ok"
	}
}

/// Network parameters published by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
	#[serde(rename = "erd_chain_id")]
	pub chain_id: String,
	#[serde(rename = "erd_min_gas_price")]
	pub min_gas_price: u64,
	#[serde(rename = "erd_min_gas_limit")]
	pub min_gas_limit: u64,
	#[serde(rename = "erd_gas_per_data_byte", default)]
	pub gas_per_data_byte: u64,
	#[serde(rename = "erd_min_transaction_version", default = "default_min_version")]
	pub min_transaction_version: u32,
}

fn default_min_version() -> u32 {
	1
}

/// Everything the flows need from the network.  Implemented over HTTP by
/// [`GatewayClient`]; tests substitute their own.
#[async_trait]
pub trait Gateway: Send + Sync {
	async fn fetch_nonce(&self, address: &Address) -> EngineResult<u64>;

	/// Submit a signed transaction and return its hash.
	async fn broadcast(&self, tx: &Transaction) -> EngineResult<String>;

	/// One status lookup.  Use [`poll_status`] to wait for finality.
	async fn transaction_status(&self, tx_hash: &str) -> EngineResult<TxStatus>;

	async fn query(&self, query: &ContractQuery) -> EngineResult<QueryResult>;

	async fn network_config(&self) -> EngineResult<NetworkConfig>;
}

/// Check `tx_hash` until it is finalized or rejected.  Transient failures
/// count as an attempt; once `max_attempts` checks are spent the result is
/// [`EngineError::Timeout`], which says nothing about the transaction
/// itself.
pub async fn poll_status<G: Gateway + ?Sized>(
	gateway: &G,
	tx_hash: &str,
	max_attempts: u32,
	interval: Duration,
) -> EngineResult<TxStatus> {
	for attempt in 1..=max_attempts {
		match gateway.transaction_status(tx_hash).await {
			Ok(status) if status.is_terminal() => return Ok(status),
			Ok(status) => tracing::debug!(tx_hash, attempt, ?status, "not final yet"),
			Err(EngineError::NetworkUnreachable(e)) => {
				tracing::warn!(tx_hash, attempt, error = %e, "status check failed")
			}
			Err(e) => return Err(e),
		}
		if attempt < max_attempts {
			tokio::time::sleep(interval).await;
		}
	}

	Err(EngineError::Timeout {
		tx_hash: tx_hash.to_owned(),
		attempts: max_attempts,
	})
}

/// HTTP client for the proxy gateway.
///
/// Every request except status checks goes through the configured
/// [`RetryPolicy`].
pub struct GatewayClient {
	url: String,
	http: reqwest::Client,
	retry: RetryPolicy,
}

impl GatewayClient {
	pub fn new(url: &str, request_timeout: Duration, retry: RetryPolicy) -> EngineResult<Self> {
		let parsed =
			reqwest::Url::parse(url).map_err(|_| EngineError::InvalidGatewayUrl(url.to_owned()))?;
		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(EngineError::InvalidGatewayUrl(url.to_owned()));
		}

		let http = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(|e| EngineError::NetworkUnreachable(format!("cannot build HTTP client: {e}")))?;

		Ok(Self {
			url: url.trim_end_matches('/').to_owned(),
			http,
			retry,
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.url, path.trim_start_matches('/'))
	}

	async fn get(&self, path: &str) -> EngineResult<(StatusCode, String)> {
		tracing::debug!(method = "GET", path, "gateway request");
		let resp = self
			.http
			.get(self.endpoint(path))
			.send()
			.await
			.map_err(transport_error)?;
		let status = resp.status();
		let body = resp.text().await.map_err(transport_error)?;
		tracing::debug!(path, %status, "gateway response");
		Ok((status, body))
	}

	async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> EngineResult<(StatusCode, String)> {
		tracing::debug!(method = "POST", path, "gateway request");
		let resp = self
			.http
			.post(self.endpoint(path))
			.json(body)
			.send()
			.await
			.map_err(transport_error)?;
		let status = resp.status();
		let text = resp.text().await.map_err(transport_error)?;
		tracing::debug!(path, %status, "gateway response");
		Ok((status, text))
	}

	async fn get_json(&self, path: &str) -> EngineResult<Value> {
		let (status, body) = self.get(path).await?;
		classify_response(status, &body)
	}

	async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> EngineResult<Value> {
		let (status, text) = self.post(path, body).await?;
		classify_response(status, &text)
	}
}

#[async_trait]
impl Gateway for GatewayClient {
	async fn fetch_nonce(&self, address: &Address) -> EngineResult<u64> {
		let path = format!("address/{}/nonce", address.to_bech32());
		let data = self.retry.run("fetch_nonce", || self.get_json(&path)).await?;
		data.get("nonce")
			.and_then(Value::as_u64)
			.ok_or_else(|| EngineError::InvalidResponse(format!("no nonce in {data}")))
	}

	async fn broadcast(&self, tx: &Transaction) -> EngineResult<String> {
		if tx.signature().is_none() {
			return Err(EngineError::SigningError("refusing to broadcast an unsigned transaction".into()));
		}

		let body = tx.to_wire();
		let data = self
			.retry
			.run("broadcast", || self.post_json("transaction/send", &body))
			.await?;
		let hash = data
			.get("txHash")
			.and_then(Value::as_str)
			.ok_or_else(|| EngineError::InvalidResponse(format!("no txHash in {data}")))?;
		if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(EngineError::InvalidResponse(format!("malformed txHash {hash:?}")));
		}
		Ok(hash.to_owned())
	}

	async fn transaction_status(&self, tx_hash: &str) -> EngineResult<TxStatus> {
		let (status, body) = self.get(&format!("transaction/{tx_hash}/status")).await?;
		// Freshly sent transactions may not be indexed yet.
		if status == StatusCode::NOT_FOUND {
			return Ok(TxStatus::Pending);
		}
		let data = classify_response(status, &body)?;
		let remote = data
			.get("status")
			.and_then(Value::as_str)
			.ok_or_else(|| EngineError::InvalidResponse(format!("no status in {data}")))?;
		TxStatus::from_remote(remote)
			.ok_or_else(|| EngineError::InvalidResponse(format!("unknown status {remote:?}")))
	}

	async fn query(&self, query: &ContractQuery) -> EngineResult<QueryResult> {
		let body = json!({
			"scAddress": query.contract.to_bech32(),
			"funcName": query.function,
			"args": query.args.iter().map(hex::encode).collect::<Vec<_>>(),
		});
		let data = self
			.retry
			.run("query", || self.post_json("vm-values/query", &body))
			.await?;
		parse_query_result(&data)
	}

	async fn network_config(&self) -> EngineResult<NetworkConfig> {
		let data = self.retry.run("network_config", || self.get_json("network/config")).await?;
		let config = data.get("config").cloned().unwrap_or(data);
		serde_json::from_value(config).map_err(|e| EngineError::InvalidResponse(e.to_string()))
	}
}

// -- Response handling --

fn transport_error(e: reqwest::Error) -> EngineError {
	EngineError::NetworkUnreachable(e.to_string())
}

/// Turn an HTTP status and body into the payload value, or the right
/// error class.  Handles both bare JSON and the proxy envelope
/// `{ "data": ..., "error": "...", "code": "..." }`.
///
/// An envelope error is a rejection whatever the status code, except on
/// 429 which is always transient.
pub fn classify_response(status: StatusCode, body: &str) -> EngineResult<Value> {
	if status == StatusCode::TOO_MANY_REQUESTS {
		return Err(EngineError::NetworkUnreachable(format!("HTTP {status}")));
	}

	let parsed: Option<Value> = serde_json::from_str(body).ok();

	if let Some(reason) = parsed
		.as_ref()
		.and_then(|v| v.get("error"))
		.and_then(Value::as_str)
		.filter(|s| !s.is_empty())
	{
		return Err(EngineError::GatewayRejected(reason.to_owned()));
	}

	if status.is_server_error() {
		let detail = body.trim();
		return Err(EngineError::NetworkUnreachable(if detail.is_empty() {
			format!("HTTP {status}")
		} else {
			format!("HTTP {status}: {detail:.200}")
		}));
	}

	if status.is_client_error() {
		let reason = body.trim();
		return Err(EngineError::GatewayRejected(if reason.is_empty() {
			format!("HTTP {status}")
		} else {
			reason.to_owned()
		}));
	}

	let value = parsed.ok_or_else(|| EngineError::InvalidResponse(format!("not JSON: {body:.200}")))?;
	match value {
		Value::Object(mut map) if map.contains_key("data") => Ok(map.remove("data").unwrap_or(Value::Null)),
		other => Ok(other),
	}
}

fn parse_query_result(data: &Value) -> EngineResult<QueryResult> {
	// The proxy nests the VM output one level deeper than other endpoints.
	let output = data
		.get("data")
		.filter(|d| d.is_object())
		.unwrap_or(data);

	let return_data = match output.get("returnData") {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => items
			.iter()
			.map(|item| match item {
				Value::Null => Ok(Vec::new()),
				Value::String(s) => BASE64
					.decode(s)
					.map_err(|e| EngineError::InvalidResponse(format!("returnData item {s:?}: {e}"))),
				other => Err(EngineError::InvalidResponse(format!("returnData item {other}"))),
			})
			.collect::<EngineResult<Vec<_>>>()?,
		Some(other) => return Err(EngineError::InvalidResponse(format!("returnData {other}"))),
	};

	let return_code = output
		.get("returnCode")
		.and_then(Value::as_str)
		.ok_or_else(|| EngineError::InvalidResponse(format!("no returnCode in {output}")))?
		.to_owned();
	let return_message = output
		.get("returnMessage")
		.and_then(Value::as_str)
		.filter(|s| !s.is_empty())
		.map(str::to_owned);

	Ok(QueryResult {
		return_data,
		return_code,
		return_message,
	})
}
