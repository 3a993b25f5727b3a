use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::retry::{Backoff, RetryPolicy};
use crate::tx_builder::{ChainParams, DEFAULT_TX_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub gateway: GatewayConfig,
	pub chain: ChainConfig,
	pub gas: GasConfig,
	pub retry: RetryConfig,
	pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
	pub url: String,
	pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
	pub chain_id: String,
	pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
	pub price: u64,
	pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay_ms: u64,
	pub max_delay_ms: u64,
	pub backoff: Backoff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
	pub max_attempts: u32,
	pub interval_ms: u64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			gateway: GatewayConfig {
				url: "https://devnet-gateway.elrond.com".into(),
				request_timeout_secs: 30,
			},
			chain: ChainConfig {
				chain_id: "D".into(),
				version: DEFAULT_TX_VERSION,
			},
			gas: GasConfig {
				price: 1_000_000_000,
				limit: 500_000,
			},
			retry: RetryConfig {
				max_attempts: 3,
				base_delay_ms: 500,
				max_delay_ms: 5_000,
				backoff: Backoff::Exponential,
			},
			poll: PollConfig {
				max_attempts: 30,
				interval_ms: 6_000,
			},
		}
	}
}

// Sections and their keys are optional; anything missing takes the default.
macro_rules! section_default {
	($($ty:ident => $field:ident),* $(,)?) => {
		$(impl Default for $ty {
			fn default() -> Self {
				Config::default().$field
			}
		})*
	};
}

section_default! {
	GatewayConfig => gateway,
	ChainConfig => chain,
	GasConfig => gas,
	RetryConfig => retry,
	PollConfig => poll,
}

impl Config {
	/// Directory where CLI state is stored (~/.erdcli/).
	pub fn dir() -> anyhow::Result<PathBuf> {
		dirs::home_dir()
			.map(|home| home.join(".erdcli"))
			.ok_or_else(|| anyhow::anyhow!("could not determine home directory"))
	}

	/// Path to the config file.
	pub fn path() -> anyhow::Result<PathBuf> {
		Ok(Self::dir()?.join("config.toml"))
	}

	/// Load config from disk, falling back to defaults if no file exists.
	pub fn load() -> anyhow::Result<Self> {
		let path = Self::path()?;
		if path.exists() {
			let content = std::fs::read_to_string(&path)?;
			Ok(toml::from_str(&content)?)
		} else {
			Ok(Self::default())
		}
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.gateway.request_timeout_secs)
	}

	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy {
			max_attempts: self.retry.max_attempts,
			base_delay: Duration::from_millis(self.retry.base_delay_ms),
			max_delay: Duration::from_millis(self.retry.max_delay_ms),
			backoff: self.retry.backoff,
			retry_on: vec![ErrorKind::NetworkUnreachable],
		}
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll.interval_ms)
	}

	pub fn chain_params(&self) -> ChainParams {
		ChainParams {
			chain_id: self.chain.chain_id.clone(),
			version: self.chain.version,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_sensible() {
		let c = Config::default();
		assert_eq!(c.gateway.url, "https://devnet-gateway.elrond.com");
		assert_eq!(c.chain.chain_id, "D");
		assert_eq!(c.chain.version, 1);
		assert_eq!(c.retry.max_attempts, 3);
		assert_eq!(c.retry.backoff, Backoff::Exponential);
	}

	#[test]
	fn toml_roundtrip() {
		let mut c = Config::default();
		c.gateway.url = "http://localhost:7950".into();
		c.retry.backoff = Backoff::Fixed;

		let serialized = toml::to_string_pretty(&c).unwrap();
		let parsed: Config = toml::from_str(&serialized).unwrap();

		assert_eq!(parsed.gateway.url, "http://localhost:7950");
		assert_eq!(parsed.retry.backoff, Backoff::Fixed);
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let parsed: Config = toml::from_str("[chain]\nchain_id = \"T\"\nversion = 1\n").unwrap();
		assert_eq!(parsed.chain.chain_id, "T");
		assert_eq!(parsed.gas.limit, 500_000);
		assert_eq!(parsed.poll.max_attempts, 30);
	}

	#[test]
	fn partial_section_keeps_other_keys() {
		let parsed: Config = toml::from_str("[retry]\nmax_attempts = 5\n\n[gateway]\nurl = \"http://localhost:7950\"\n").unwrap();
		assert_eq!(parsed.retry.max_attempts, 5);
		assert_eq!(parsed.retry.base_delay_ms, 500);
		assert_eq!(parsed.retry.max_delay_ms, 5_000);
		assert_eq!(parsed.retry.backoff, Backoff::Exponential);
		assert_eq!(parsed.gateway.url, "http://localhost:7950");
		assert_eq!(parsed.gateway.request_timeout_secs, 30);
	}

	#[test]
	fn retry_policy_only_retries_network_errors() {
		let p = Config::default().retry_policy();
		assert_eq!(p.max_attempts, 3);
		assert_eq!(p.retry_on, vec![ErrorKind::NetworkUnreachable]);
		assert_eq!(p.base_delay, Duration::from_millis(500));
	}
}
