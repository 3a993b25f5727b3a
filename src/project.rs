use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::tx_builder::{ARG_DELIMITER, CODE_METADATA_UPGRADEABLE, VM_TYPE_WASM};

const WASM_MAGIC: &[u8] = b"\0asm";

/// Compiled contract bytecode ready for deployment.
#[derive(Debug, Clone)]
pub struct ContractCode {
	bytes: Vec<u8>,
	source: PathBuf,
}

impl ContractCode {
	/// Locate and read the bytecode for a project.
	///
	/// `path` may name a `.wasm` file directly, or a project directory
	/// whose `output/` folder (or the directory itself) holds exactly one
	/// `.wasm` file.
	pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
		let path = path.as_ref();
		let file = if path.is_file() {
			path.to_path_buf()
		} else if path.is_dir() {
			match find_wasm(&path.join("output"))? {
				Some(file) => file,
				None => find_wasm(path)?.ok_or_else(|| {
					EngineError::Project(format!("no .wasm file in {}", path.display()))
				})?,
			}
		} else {
			return Err(EngineError::Project(format!("{} does not exist", path.display())));
		};

		let bytes = std::fs::read(&file)?;
		if !bytes.starts_with(WASM_MAGIC) {
			return Err(EngineError::Project(format!("{} is not a WASM module", file.display())));
		}
		tracing::debug!(file = %file.display(), size = bytes.len(), "loaded contract code");
		Ok(Self { bytes, source: file })
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn source(&self) -> &Path {
		&self.source
	}

	/// Head of a deploy payload: `hex(code) '@' vm-type '@' code-metadata`.
	pub fn deploy_payload(&self) -> Vec<u8> {
		let mut out = hex::encode(&self.bytes).into_bytes();
		out.push(ARG_DELIMITER);
		out.extend_from_slice(VM_TYPE_WASM.as_bytes());
		out.push(ARG_DELIMITER);
		out.extend_from_slice(CODE_METADATA_UPGRADEABLE.as_bytes());
		out
	}
}

/// The single `.wasm` file in `dir`, `None` if there is none or `dir` is
/// missing, an error if there are several.
fn find_wasm(dir: &Path) -> EngineResult<Option<PathBuf>> {
	if !dir.is_dir() {
		return Ok(None);
	}
	let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
		.filter_map(|entry| entry.ok().map(|e| e.path()))
		.filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "wasm"))
		.collect();

	match found.len() {
		0 => Ok(None),
		1 => Ok(found.pop()),
		n => Err(EngineError::Project(format!(
			"{n} .wasm files in {}, pass one explicitly",
			dir.display()
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MODULE: &[u8] = b"\0asm\x01\0\0\0";

	#[test]
	fn finds_wasm_under_output() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("output")).unwrap();
		std::fs::write(dir.path().join("output/adder.wasm"), MODULE).unwrap();

		let code = ContractCode::load(dir.path()).unwrap();
		assert_eq!(code.bytes(), MODULE);
		assert!(code.source().ends_with("output/adder.wasm"));
	}

	#[test]
	fn accepts_a_direct_file() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("counter.wasm");
		std::fs::write(&file, MODULE).unwrap();
		assert_eq!(ContractCode::load(&file).unwrap().bytes(), MODULE);
	}

	#[test]
	fn rejects_ambiguous_and_missing_code() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(ContractCode::load(dir.path()), Err(EngineError::Project(_))));

		std::fs::write(dir.path().join("a.wasm"), MODULE).unwrap();
		std::fs::write(dir.path().join("b.wasm"), MODULE).unwrap();
		let err = ContractCode::load(dir.path()).unwrap_err();
		assert!(err.to_string().contains("2 .wasm files"), "{err}");
	}

	#[test]
	fn rejects_non_wasm_bytes() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("fake.wasm");
		std::fs::write(&file, b"CODE").unwrap();
		assert!(matches!(ContractCode::load(&file), Err(EngineError::Project(_))));
	}

	#[test]
	fn deploy_payload_appends_vm_markers() {
		let code = ContractCode {
			bytes: vec![0x00, 0x61],
			source: PathBuf::from("x.wasm"),
		};
		assert_eq!(code.deploy_payload(), b"0061@0500@0100");
	}
}
