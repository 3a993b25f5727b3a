//! Shared helpers: an in-process HTTP gateway and key files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
	extract::State,
	http::{header, Method, StatusCode, Uri},
	response::{IntoResponse, Response},
	Router,
};
use erdcli::keystore::KeyMaterial;
use tokio::net::TcpListener;

/// One request as seen by the mock gateway.
#[derive(Debug, Clone)]
pub struct Recorded {
	pub method: String,
	pub path: String,
	pub body: String,
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

type Handler = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct MockState {
	handler: Arc<Handler>,
	log: Log,
}

/// Start a programmable gateway on an ephemeral port.  `handler` maps each
/// request to a status code and JSON body.  Returns the base URL and the
/// request log.
pub async fn start_gateway<F>(handler: F) -> (String, Log)
where
	F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
{
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let state = MockState {
		handler: Arc::new(handler),
		log: log.clone(),
	};
	let app = Router::new().fallback(respond).with_state(state);

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});

	(format!("http://{addr}"), log)
}

async fn respond(State(state): State<MockState>, method: Method, uri: Uri, body: String) -> Response {
	let request = Recorded {
		method: method.to_string(),
		path: uri.path().to_owned(),
		body,
	};
	let (status, reply) = (state.handler.as_ref())(&request);
	state.log.lock().unwrap().push(request);

	let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
	(status, [(header::CONTENT_TYPE, "application/json")], reply).into_response()
}

/// A deterministic test key and its PEM file.
pub fn write_key(dir: &tempfile::TempDir, seed: u8) -> (KeyMaterial, PathBuf) {
	let key = KeyMaterial::from_seed([seed; 32]);
	let path = dir.path().join(format!("key{seed}.pem"));
	std::fs::write(&path, key.to_pem()).unwrap();
	(key, path)
}

/// A 64-character hash starting with `prefix`.
pub fn tx_hash(prefix: &str) -> String {
	format!("{prefix:0<64}")
}
