//! GatewayClient against an in-process HTTP gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use erdcli::address::Address;
use erdcli::gateway::{poll_status, ContractQuery, Gateway, GatewayClient, TxStatus};
use erdcli::retry::{Backoff, RetryPolicy};
use erdcli::signer;
use erdcli::tx_builder::{build_call, ChainParams};
use erdcli::EngineError;

mod common;

fn fast_retry(max_attempts: u32) -> RetryPolicy {
	RetryPolicy {
		max_attempts,
		base_delay: Duration::from_millis(1),
		max_delay: Duration::from_millis(1),
		backoff: Backoff::Fixed,
		..RetryPolicy::default()
	}
}

fn client(url: &str, max_attempts: u32) -> GatewayClient {
	GatewayClient::new(url, Duration::from_secs(5), fast_retry(max_attempts)).unwrap()
}

fn signed_call(seed: u8) -> erdcli::tx_builder::Transaction {
	let key = erdcli::keystore::KeyMaterial::from_seed([seed; 32]);
	let chain = ChainParams {
		chain_id: "T".into(),
		version: 1,
	};
	let tx = build_call(
		*key.address(),
		Address::from_bytes([9u8; 32]),
		"add",
		&[vec![0x07]],
		0u32.into(),
		1_000_000_000,
		60_000,
		3,
		&chain,
	)
	.unwrap();
	signer::sign(&tx, &key).unwrap()
}

#[tokio::test]
async fn fetch_nonce_reads_envelope() {
	let (url, log) = common::start_gateway(|_| {
		(200, r#"{"data":{"nonce":5},"error":"","code":"successful"}"#.into())
	})
	.await;

	let addr = Address::from_bytes([1u8; 32]);
	let nonce = client(&url, 3).fetch_nonce(&addr).await.unwrap();
	assert_eq!(nonce, 5);

	let log = log.lock().unwrap();
	assert_eq!(log.len(), 1);
	assert_eq!(log[0].method, "GET");
	assert_eq!(log[0].path, format!("/address/{}/nonce", addr.to_bech32()));
}

#[tokio::test]
async fn fetch_nonce_stops_after_max_attempts() {
	let (url, log) = common::start_gateway(|_| (503, String::new())).await;

	let err = client(&url, 3)
		.fetch_nonce(&Address::from_bytes([1u8; 32]))
		.await
		.unwrap_err();

	assert!(matches!(err, EngineError::NetworkUnreachable(_)), "{err:?}");
	assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
	// Grab a free port, then close it so nothing is listening.
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let port = listener.local_addr().unwrap().port();
	drop(listener);

	let err = client(&format!("http://127.0.0.1:{port}"), 2)
		.fetch_nonce(&Address::from_bytes([1u8; 32]))
		.await
		.unwrap_err();
	assert!(matches!(err, EngineError::NetworkUnreachable(_)), "{err:?}");
}

#[tokio::test]
async fn recovers_when_gateway_comes_back() {
	let calls = Arc::new(AtomicU32::new(0));
	let seen = calls.clone();
	let (url, _log) = common::start_gateway(move |_| {
		if seen.fetch_add(1, Ordering::SeqCst) < 2 {
			(503, String::new())
		} else {
			(200, r#"{"nonce":11}"#.into())
		}
	})
	.await;

	let nonce = client(&url, 3)
		.fetch_nonce(&Address::from_bytes([1u8; 32]))
		.await
		.unwrap();
	assert_eq!(nonce, 11);
	assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn broadcast_rejection_is_verbatim_and_not_retried() {
	let (url, log) = common::start_gateway(|_| {
		(400, r#"{"data":null,"error":"insufficient funds","code":"bad_request"}"#.into())
	})
	.await;

	let err = client(&url, 5).broadcast(&signed_call(4)).await.unwrap_err();
	match err {
		EngineError::GatewayRejected(reason) => assert_eq!(reason, "insufficient funds"),
		other => panic!("unexpected error: {other:?}"),
	}
	assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn broadcast_and_query_retry_up_to_the_bound() {
	let (url, log) = common::start_gateway(|_| (503, "temporarily unavailable".into())).await;
	let gw = client(&url, 4);

	let err = gw.broadcast(&signed_call(4)).await.unwrap_err();
	assert!(matches!(err, EngineError::NetworkUnreachable(ref m) if m.contains("temporarily unavailable")), "{err:?}");
	assert_eq!(log.lock().unwrap().len(), 4);

	let query = ContractQuery {
		contract: Address::from_bytes([9u8; 32]),
		function: "getSum".into(),
		args: Vec::new(),
	};
	let err = gw.query(&query).await.unwrap_err();
	assert!(matches!(err, EngineError::NetworkUnreachable(_)), "{err:?}");

	let log = log.lock().unwrap();
	assert_eq!(log.len(), 8);
	assert!(log[..4].iter().all(|r| r.path == "/transaction/send"));
	assert!(log[4..].iter().all(|r| r.path == "/vm-values/query"));
}

#[tokio::test]
async fn server_error_envelope_is_a_stale_nonce_rejection() {
	let (url, log) = common::start_gateway(|_| {
		(
			500,
			r#"{"data":null,"error":"transaction generation failed: lowerNonceInTx","code":"internal_issue"}"#.into(),
		)
	})
	.await;

	let err = client(&url, 3).broadcast(&signed_call(4)).await.unwrap_err();
	assert!(
		matches!(err, EngineError::GatewayRejected(ref r) if r == "transaction generation failed: lowerNonceInTx"),
		"{err:?}"
	);
	assert!(err.is_nonce_stale());
	assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn broadcast_sends_wire_fields() {
	let hash = common::tx_hash("ab12");
	let reply = format!(r#"{{"data":{{"txHash":"{hash}"}},"error":"","code":"successful"}}"#);
	let (url, log) = common::start_gateway(move |_| (200, reply.clone())).await;

	let tx = signed_call(4);
	let got = client(&url, 1).broadcast(&tx).await.unwrap();
	assert_eq!(got, hash);

	let log = log.lock().unwrap();
	assert_eq!(log[0].method, "POST");
	assert_eq!(log[0].path, "/transaction/send");

	let body: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
	assert_eq!(body["nonce"], 3);
	assert_eq!(body["sender"], tx.sender().to_bech32());
	assert_eq!(body["receiver"], tx.receiver().to_bech32());
	assert_eq!(body["value"], "0");
	assert_eq!(body["gasPrice"], 1_000_000_000u64);
	assert_eq!(body["gasLimit"], 60_000);
	assert_eq!(body["data"], "YWRkQDA3");
	assert_eq!(body["chainID"], "T");
	assert_eq!(body["version"], 1);
	assert_eq!(body["signature"].as_str().unwrap().len(), 128);
}

#[tokio::test]
async fn unsigned_transactions_are_not_sent() {
	let (url, log) = common::start_gateway(|_| (200, "{}".into())).await;
	let key = erdcli::keystore::KeyMaterial::from_seed([4u8; 32]);
	let chain = ChainParams {
		chain_id: "T".into(),
		version: 1,
	};
	let tx = build_call(*key.address(), Address::zero(), "f", &[], 0u32.into(), 1, 1, 0, &chain).unwrap();

	let err = client(&url, 1).broadcast(&tx).await.unwrap_err();
	assert!(matches!(err, EngineError::SigningError(_)));
	assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn query_posts_hex_args_and_decodes_base64() {
	let (url, log) = common::start_gateway(|_| {
		(
			200,
			r#"{"data":{"data":{"returnData":["Kg=="],"returnCode":"ok","returnMessage":""}},"error":"","code":"successful"}"#.into(),
		)
	})
	.await;

	let contract = Address::from_bytes([9u8; 32]);
	let query = ContractQuery {
		contract,
		function: "getSum".into(),
		args: vec![vec![0x01, 0x02]],
	};
	let result = client(&url, 1).query(&query).await.unwrap();
	assert_eq!(result.return_data, vec![vec![0x2a]]);
	assert!(result.is_ok());

	let log = log.lock().unwrap();
	assert_eq!(log[0].path, "/vm-values/query");
	let body: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
	assert_eq!(body["scAddress"], contract.to_bech32());
	assert_eq!(body["funcName"], "getSum");
	assert_eq!(body["args"], serde_json::json!(["0102"]));
}

#[tokio::test]
async fn poll_waits_for_final_status() {
	let calls = Arc::new(AtomicU32::new(0));
	let seen = calls.clone();
	let (url, _log) = common::start_gateway(move |req| {
		assert!(req.path.ends_with("/status"));
		match seen.fetch_add(1, Ordering::SeqCst) {
			0 => (404, String::new()),
			1 => (200, r#"{"data":{"status":"pending"}}"#.into()),
			_ => (200, r#"{"data":{"status":"executed"}}"#.into()),
		}
	})
	.await;

	let gw = client(&url, 1);
	let status = poll_status(&gw, &common::tx_hash("ab12"), 5, Duration::from_millis(1))
		.await
		.unwrap();
	assert_eq!(status, TxStatus::Finalized);
	assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn poll_reports_timeout_when_never_final() {
	let (url, log) = common::start_gateway(|_| (200, r#"{"status":"received"}"#.into())).await;

	let gw = client(&url, 1);
	let err = poll_status(&gw, "abcd", 4, Duration::from_millis(1))
		.await
		.unwrap_err();
	match err {
		EngineError::Timeout { tx_hash, attempts } => {
			assert_eq!(tx_hash, "abcd");
			assert_eq!(attempts, 4);
		}
		other => panic!("unexpected error: {other:?}"),
	}
	assert_eq!(log.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn network_config_is_parsed() {
	let (url, _log) = common::start_gateway(|_| {
		(
			200,
			r#"{"data":{"config":{"erd_chain_id":"T","erd_min_gas_price":1000000000,"erd_min_gas_limit":50000,"erd_gas_per_data_byte":1500,"erd_min_transaction_version":1}},"error":"","code":"successful"}"#.into(),
		)
	})
	.await;

	let config = client(&url, 1).network_config().await.unwrap();
	assert_eq!(config.chain_id, "T");
	assert_eq!(config.min_gas_price, 1_000_000_000);
	assert_eq!(config.min_gas_limit, 50_000);
	assert_eq!(config.gas_per_data_byte, 1500);
}
