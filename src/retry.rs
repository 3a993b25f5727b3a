//! Bounded retry for gateway calls.
//!
//! Which failures are worth another attempt is declared in
//! [`RetryPolicy::retry_on`], not decided by the call sites.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
	Fixed,
	Exponential,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
	/// Total attempts, including the first.  Zero is treated as one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff: Backoff,
	pub retry_on: Vec<ErrorKind>,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(500),
			max_delay: Duration::from_secs(5),
			backoff: Backoff::Exponential,
			retry_on: vec![ErrorKind::NetworkUnreachable],
		}
	}
}

impl RetryPolicy {
	/// A policy that makes exactly one attempt.
	pub fn none() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	pub fn is_retryable(&self, err: &EngineError) -> bool {
		self.retry_on.contains(&err.kind())
	}

	/// Delay before attempt `attempt + 1`, where `attempt` is the 1-based
	/// number of the attempt that just failed.
	pub fn delay_after(&self, attempt: u32) -> Duration {
		match self.backoff {
			Backoff::Fixed => self.base_delay.min(self.max_delay),
			Backoff::Exponential => {
				let base_ms = self.base_delay.as_millis() as u64;
				let max_ms = self.max_delay.as_millis() as u64;
				let delay_ms = base_ms
					.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
					.min(max_ms);

				// Up to 10% jitter on top.
				let jitter_range = delay_ms / 10;
				let jitter = if jitter_range > 0 {
					rand::thread_rng().gen_range(0..jitter_range)
				} else {
					0
				};
				Duration::from_millis(delay_ms + jitter)
			}
		}
	}

	/// Run `op` until it succeeds, fails with a non-retryable error, or
	/// the attempt budget is spent.  The last error is returned as is.
	pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> EngineResult<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = EngineResult<T>>,
	{
		let max_attempts = self.max_attempts.max(1);
		let mut attempt = 1;
		loop {
			match op().await {
				Ok(v) => return Ok(v),
				Err(e) if attempt < max_attempts && self.is_retryable(&e) => {
					let delay = self.delay_after(attempt);
					tracing::warn!(
						op = op_name,
						attempt,
						max_attempts,
						delay_ms = delay.as_millis() as u64,
						error = %e,
						"retrying"
					);
					tokio::time::sleep(delay).await;
					attempt += 1;
				}
				Err(e) => return Err(e),
			}
		}
	}
}
