use ed25519_dalek::{Signer as _, Verifier as _, VerifyingKey};

use crate::error::{EngineError, EngineResult};
use crate::keystore::KeyMaterial;
use crate::tx_builder::Transaction;

/// Sign the canonical serialization of `tx` and return a signed copy.
///
/// Ed25519 signatures are deterministic, so the same transaction and key
/// always produce the same bytes.  Fails when the key does not belong to
/// the transaction's sender.
pub fn sign(tx: &Transaction, key: &KeyMaterial) -> EngineResult<Transaction> {
	if key.address() != tx.sender() {
		return Err(EngineError::SigningError(format!(
			"key for {} cannot sign for sender {}",
			key.address(),
			tx.sender()
		)));
	}

	let signature = key.signing_key().sign(&tx.signing_bytes());
	tracing::debug!(nonce = tx.nonce(), sender = %tx.sender(), "transaction signed");
	Ok(tx.with_signature(signature))
}

/// Check a signed transaction against its sender's public key.
pub fn verify(tx: &Transaction) -> EngineResult<()> {
	let signature = tx
		.signature()
		.ok_or_else(|| EngineError::SigningError("transaction is not signed".into()))?;
	let public = VerifyingKey::from_bytes(tx.sender().as_bytes())
		.map_err(|e| EngineError::SigningError(format!("sender is not a valid public key: {e}")))?;
	public
		.verify(&tx.signing_bytes(), signature)
		.map_err(|_| EngineError::SigningError("signature does not match transaction".into()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::address::Address;
	use crate::tx_builder::{build_call, ChainParams};

	fn chain() -> ChainParams {
		ChainParams {
			chain_id: "T".into(),
			version: 1,
		}
	}

	fn unsigned_for(key: &KeyMaterial, nonce: u64) -> Transaction {
		build_call(
			*key.address(),
			Address::from_bytes([9u8; 32]),
			"add",
			&[vec![0x07]],
			0u32.into(),
			1_000_000_000,
			60_000,
			nonce,
			&chain(),
		)
		.unwrap()
	}

	#[test]
	fn signing_is_deterministic() {
		let key = KeyMaterial::from_seed([4u8; 32]);
		let tx = unsigned_for(&key, 1);
		let a = sign(&tx, &key).unwrap();
		let b = sign(&tx, &key).unwrap();
		assert_eq!(
			a.signature().unwrap().to_bytes(),
			b.signature().unwrap().to_bytes()
		);
	}

	#[test]
	fn signed_copy_leaves_original_untouched() {
		let key = KeyMaterial::from_seed([4u8; 32]);
		let tx = unsigned_for(&key, 1);
		let signed = sign(&tx, &key).unwrap();
		assert!(tx.signature().is_none());
		assert_eq!(signed.signing_bytes(), tx.signing_bytes());
		verify(&signed).unwrap();
	}

	#[test]
	fn signature_covers_every_field() {
		let key = KeyMaterial::from_seed([4u8; 32]);
		let signed = sign(&unsigned_for(&key, 1), &key).unwrap();
		let other = sign(&unsigned_for(&key, 2), &key).unwrap();
		assert_ne!(signed.signature(), other.signature());

		// Graft the nonce-1 signature onto the nonce-2 body.
		let forged = unsigned_for(&key, 2).with_signature(*signed.signature().unwrap());
		assert!(verify(&forged).is_err());
	}

	#[test]
	fn wrong_key_is_a_signing_error() {
		let owner = KeyMaterial::from_seed([4u8; 32]);
		let intruder = KeyMaterial::from_seed([5u8; 32]);
		let err = sign(&unsigned_for(&owner, 1), &intruder).unwrap_err();
		assert!(matches!(err, EngineError::SigningError(_)));
	}

	#[test]
	fn unsigned_does_not_verify() {
		let key = KeyMaterial::from_seed([4u8; 32]);
		assert!(verify(&unsigned_for(&key, 1)).is_err());
	}
}
