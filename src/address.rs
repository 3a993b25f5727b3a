use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};

/// Human-readable prefix of account addresses.
pub const HRP: &str = "erd";

pub const ADDRESS_LEN: usize = 32;

/// A 32-byte account identifier.  For user accounts the bytes are the
/// Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
	#[error("invalid bech32: {0}")]
	Bech32(String),
	#[error("wrong prefix {0:?}, expected \"erd\"")]
	WrongPrefix(String),
	#[error("expected 32 bytes, got {0}")]
	WrongLength(usize),
	#[error("invalid hex: {0}")]
	Hex(String),
}

impl Address {
	pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
		Self(bytes)
	}

	/// The all-zero address that receives contract deployments.
	pub const fn zero() -> Self {
		Self([0u8; ADDRESS_LEN])
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
		let arr: [u8; ADDRESS_LEN] = bytes
			.try_into()
			.map_err(|_| AddressError::WrongLength(bytes.len()))?;
		Ok(Self(arr))
	}

	pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
		&self.0
	}

	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|b| *b == 0)
	}

	pub fn to_bech32(&self) -> String {
		bech32::encode(HRP, self.0.to_base32(), Variant::Bech32)
			.expect("static hrp and 32-byte payload always encode")
	}

	pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
		let (hrp, data, variant) =
			bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
		if variant != Variant::Bech32 {
			return Err(AddressError::Bech32("bech32m checksum is not accepted".into()));
		}
		if hrp != HRP {
			return Err(AddressError::WrongPrefix(hrp));
		}
		let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32(e.to_string()))?;
		Self::from_slice(&bytes)
	}

	/// Parse either the bech32 form or 64 hex characters (optional `0x`).
	pub fn parse_any(s: &str) -> Result<Self, AddressError> {
		let s = s.trim();
		if s.starts_with(HRP) {
			return Self::from_bech32(s);
		}
		let clean = s.strip_prefix("0x").unwrap_or(s);
		let bytes = hex::decode(clean).map_err(|e| AddressError::Hex(e.to_string()))?;
		Self::from_slice(&bytes)
	}
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse_any(s)
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_bech32())
	}
}

impl fmt::Debug for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Address({})", self.to_bech32())
	}
}
