//! Argument literals and their wire encoding.
//!
//! Every contract argument and return value is one of a closed set of
//! literal kinds.  Integers are big-endian; fixed-width kinds occupy
//! exactly their width, big kinds use the minimal encoding with zero as the
//! empty buffer.  Decoding is strict: a buffer that is not the canonical
//! encoding of some value is an error, so `encode(decode(b)) == b` holds
//! for every buffer `decode` accepts.

use std::fmt;
use std::path::Path;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use serde_json::Value;

use crate::address::{Address, ADDRESS_LEN};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
	/// Exactly this many bytes (1, 2, 4 or 8).
	Fixed(usize),
	/// Minimal-width, arbitrary precision.
	Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
	Uint(IntWidth),
	Int(IntWidth),
	Str,
	Bytes,
	Bool,
	Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
	Uint { value: BigUint, width: IntWidth },
	Int { value: BigInt, width: IntWidth },
	Str(String),
	Bytes(Vec<u8>),
	Bool(bool),
	Address(Address),
}

impl Literal {
	pub fn u64(value: u64) -> Self {
		Self::Uint {
			value: value.into(),
			width: IntWidth::Fixed(8),
		}
	}

	pub fn biguint(value: impl Into<BigUint>) -> Self {
		Self::Uint {
			value: value.into(),
			width: IntWidth::Big,
		}
	}

	pub fn bigint(value: impl Into<BigInt>) -> Self {
		Self::Int {
			value: value.into(),
			width: IntWidth::Big,
		}
	}

	pub fn kind(&self) -> ArgKind {
		match self {
			Self::Uint { width, .. } => ArgKind::Uint(*width),
			Self::Int { width, .. } => ArgKind::Int(*width),
			Self::Str(_) => ArgKind::Str,
			Self::Bytes(_) => ArgKind::Bytes,
			Self::Bool(_) => ArgKind::Bool,
			Self::Address(_) => ArgKind::Address,
		}
	}
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Uint { value, .. } => write!(f, "{value}"),
			Self::Int { value, .. } => write!(f, "{value}"),
			Self::Str(s) => f.write_str(s),
			Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Address(a) => write!(f, "{a}"),
		}
	}
}

impl fmt::Display for ArgKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Uint(IntWidth::Fixed(n)) => write!(f, "u{}", n * 8),
			Self::Uint(IntWidth::Big) => f.write_str("biguint"),
			Self::Int(IntWidth::Fixed(n)) => write!(f, "i{}", n * 8),
			Self::Int(IntWidth::Big) => f.write_str("bigint"),
			Self::Str => f.write_str("str"),
			Self::Bytes => f.write_str("bytes"),
			Self::Bool => f.write_str("bool"),
			Self::Address => f.write_str("addr"),
		}
	}
}

impl std::str::FromStr for ArgKind {
	type Err = String;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		Ok(match name.trim() {
			"u8" => Self::Uint(IntWidth::Fixed(1)),
			"u16" => Self::Uint(IntWidth::Fixed(2)),
			"u32" => Self::Uint(IntWidth::Fixed(4)),
			"u64" => Self::Uint(IntWidth::Fixed(8)),
			"biguint" => Self::Uint(IntWidth::Big),
			"i8" => Self::Int(IntWidth::Fixed(1)),
			"i16" => Self::Int(IntWidth::Fixed(2)),
			"i32" => Self::Int(IntWidth::Fixed(4)),
			"i64" => Self::Int(IntWidth::Fixed(8)),
			"bigint" => Self::Int(IntWidth::Big),
			"str" => Self::Str,
			"bytes" => Self::Bytes,
			"bool" => Self::Bool,
			"addr" => Self::Address,
			other => return Err(format!("unknown kind {other:?}")),
		})
	}
}

// -- Encoding --

/// Encode a single literal.  Errors report position 1; use
/// [`encode_args`] to get the real position within an argument list.
pub fn encode(literal: &Literal) -> EngineResult<Vec<u8>> {
	let unsupported = || EngineError::UnsupportedArgumentType {
		position: 1,
		value: format!("{}:{literal}", literal.kind()),
	};

	match literal {
		Literal::Uint { value, width } => match width {
			IntWidth::Big if value.is_zero() => Ok(Vec::new()),
			IntWidth::Big => Ok(value.to_bytes_be()),
			IntWidth::Fixed(n) => {
				check_width(*n).ok_or_else(unsupported)?;
				let raw = if value.is_zero() { Vec::new() } else { value.to_bytes_be() };
				pad_left(raw, *n, 0x00).ok_or_else(unsupported)
			}
		},
		Literal::Int { value, width } => match width {
			IntWidth::Big if value.is_zero() => Ok(Vec::new()),
			IntWidth::Big => Ok(value.to_signed_bytes_be()),
			IntWidth::Fixed(n) => {
				check_width(*n).ok_or_else(unsupported)?;
				let fill = if value.sign() == Sign::Minus { 0xff } else { 0x00 };
				pad_left(value.to_signed_bytes_be(), *n, fill).ok_or_else(unsupported)
			}
		},
		Literal::Str(s) => Ok(s.as_bytes().to_vec()),
		Literal::Bytes(b) => Ok(b.clone()),
		Literal::Bool(true) => Ok(vec![0x01]),
		Literal::Bool(false) => Ok(Vec::new()),
		Literal::Address(a) => Ok(a.as_bytes().to_vec()),
	}
}

/// Encode an ordered argument list, preserving order.
pub fn encode_args(literals: &[Literal]) -> EngineResult<Vec<Vec<u8>>> {
	literals
		.iter()
		.enumerate()
		.map(|(i, lit)| {
			encode(lit).map_err(|e| match e {
				EngineError::UnsupportedArgumentType { value, .. } => {
					EngineError::UnsupportedArgumentType { position: i + 1, value }
				}
				other => other,
			})
		})
		.collect()
}

fn check_width(n: usize) -> Option<()> {
	matches!(n, 1 | 2 | 4 | 8).then_some(())
}

fn pad_left(raw: Vec<u8>, width: usize, fill: u8) -> Option<Vec<u8>> {
	if raw.len() > width {
		return None;
	}
	let mut out = vec![fill; width - raw.len()];
	out.extend_from_slice(&raw);
	Some(out)
}

// -- Decoding --

pub fn decode(bytes: &[u8], kind: ArgKind) -> EngineResult<Literal> {
	let fail = |reason: String| EngineError::ArgumentDecodeError {
		kind: kind.to_string(),
		reason,
	};

	match kind {
		ArgKind::Uint(width) => {
			match width {
				IntWidth::Fixed(n) => expect_len(bytes, n).map_err(fail)?,
				IntWidth::Big => {
					if bytes.first() == Some(&0x00) {
						return Err(fail("leading zero byte".into()));
					}
				}
			}
			Ok(Literal::Uint {
				value: BigUint::from_bytes_be(bytes),
				width,
			})
		}
		ArgKind::Int(width) => {
			match width {
				IntWidth::Fixed(n) => expect_len(bytes, n).map_err(fail)?,
				IntWidth::Big => {
					if !is_minimal_signed(bytes) {
						return Err(fail("redundant sign byte".into()));
					}
				}
			}
			let value = if bytes.is_empty() {
				BigInt::zero()
			} else {
				BigInt::from_signed_bytes_be(bytes)
			};
			Ok(Literal::Int { value, width })
		}
		ArgKind::Str => String::from_utf8(bytes.to_vec())
			.map(Literal::Str)
			.map_err(|e| fail(e.to_string())),
		ArgKind::Bytes => Ok(Literal::Bytes(bytes.to_vec())),
		ArgKind::Bool => match bytes {
			[] => Ok(Literal::Bool(false)),
			[0x01] => Ok(Literal::Bool(true)),
			other => Err(fail(format!("not a boolean: 0x{}", hex::encode(other)))),
		},
		ArgKind::Address => {
			expect_len(bytes, ADDRESS_LEN).map_err(fail)?;
			Address::from_slice(bytes)
				.map(Literal::Address)
				.map_err(|e| fail(e.to_string()))
		}
	}
}

fn expect_len(bytes: &[u8], n: usize) -> Result<(), String> {
	if bytes.len() == n {
		Ok(())
	} else {
		Err(format!("expected {n} bytes, got {}", bytes.len()))
	}
}

fn is_minimal_signed(bytes: &[u8]) -> bool {
	match bytes {
		[] => true,
		[0x00] => false,
		[0x00, next, ..] => next & 0x80 != 0,
		[0xff, next, ..] => next & 0x80 == 0,
		_ => true,
	}
}

// -- Arguments files --

/// Parse one `kind:value` record.  `position` is 1-based and only used
/// for error reporting.
pub fn parse_literal(position: usize, record: &str) -> EngineResult<Literal> {
	let unsupported = || EngineError::UnsupportedArgumentType {
		position,
		value: record.to_owned(),
	};

	let (kind_name, raw) = record.split_once(':').ok_or_else(unsupported)?;
	let kind: ArgKind = kind_name.trim().parse().map_err(|_| unsupported())?;
	// `str` values are taken verbatim; every other kind ignores padding.
	let raw = if kind == ArgKind::Str { raw } else { raw.trim() };

	let literal = match kind {
		ArgKind::Uint(width) => Literal::Uint {
			value: raw.parse().map_err(|_| unsupported())?,
			width,
		},
		ArgKind::Int(width) => Literal::Int {
			value: raw.parse().map_err(|_| unsupported())?,
			width,
		},
		ArgKind::Str => Literal::Str(raw.to_owned()),
		ArgKind::Bytes => {
			let clean = raw.strip_prefix("0x").unwrap_or(raw);
			Literal::Bytes(hex::decode(clean).map_err(|_| unsupported())?)
		}
		ArgKind::Bool => Literal::Bool(raw.parse().map_err(|_| unsupported())?),
		ArgKind::Address => Literal::Address(raw.parse().map_err(|_| unsupported())?),
	};

	// Reject fixed-width values that do not fit, at parse time.
	encode(&literal).map_err(|_| unsupported())?;
	Ok(literal)
}

/// Parse an arguments file body.  A body starting with `[` is read as a
/// JSON array; anything else as one `kind:value` per line, skipping blank
/// lines and `#` comments.
pub fn parse_arguments(text: &str) -> EngineResult<Vec<Literal>> {
	if text.trim_start().starts_with('[') {
		return parse_json_arguments(text);
	}

	text.lines()
		.map(str::trim_start)
		.filter(|l| !l.trim_end().is_empty() && !l.starts_with('#'))
		.enumerate()
		.map(|(i, line)| parse_literal(i + 1, line))
		.collect()
}

pub fn load_arguments(path: impl AsRef<Path>) -> EngineResult<Vec<Literal>> {
	let text = std::fs::read_to_string(path.as_ref())?;
	parse_arguments(&text)
}

fn parse_json_arguments(text: &str) -> EngineResult<Vec<Literal>> {
	let values: Vec<Value> =
		serde_json::from_str(text).map_err(|e| EngineError::UnsupportedArgumentType {
			position: 1,
			value: format!("not a JSON array: {e}"),
		})?;

	values
		.iter()
		.enumerate()
		.map(|(i, v)| json_literal(i + 1, v))
		.collect()
}

fn json_literal(position: usize, value: &Value) -> EngineResult<Literal> {
	let unsupported = || EngineError::UnsupportedArgumentType {
		position,
		value: value.to_string(),
	};

	match value {
		Value::Bool(b) => Ok(Literal::Bool(*b)),
		// Numbers keep their source text, so integers of any size survive.
		Value::Number(n) => {
			let text = n.to_string();
			if text.contains(['.', 'e', 'E']) {
				return Err(unsupported());
			}
			if text.starts_with('-') {
				text.parse::<BigInt>().map(Literal::bigint).map_err(|_| unsupported())
			} else {
				text.parse::<BigUint>().map(Literal::biguint).map_err(|_| unsupported())
			}
		}
		Value::String(s) if s.starts_with("erd1") => s
			.parse()
			.map(Literal::Address)
			.map_err(|_| unsupported()),
		Value::String(s) if s.starts_with("0x") => hex::decode(&s[2..])
			.map(Literal::Bytes)
			.map_err(|_| unsupported()),
		Value::String(s) => Ok(Literal::Str(s.clone())),
		Value::Null | Value::Array(_) | Value::Object(_) => Err(unsupported()),
	}
}

/// Parse a comma-separated list of kind names, e.g. `u64,str,biguint`.
pub fn parse_kinds(list: &str) -> Result<Vec<ArgKind>, String> {
	list.split(',')
		.filter(|s| !s.trim().is_empty())
		.map(str::parse)
		.collect()
}
