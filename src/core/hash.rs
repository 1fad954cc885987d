//! Content-based file hashing

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

const ROOT_KEY_LEN: usize = 12;

/// SHA-256 of a file's full contents, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
	/// Hash the current bytes on disk
	pub fn compute(path: &Path) -> std::io::Result<Self> {
		let bytes = fs::read(path)?;
		Ok(Self::of_bytes(&bytes))
	}

	pub fn of_bytes(bytes: &[u8]) -> Self {
		Self(hex_digest(bytes))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Cache identity of a root folder: first 12 hex chars of SHA-256(path)
pub fn root_key(root_folder: &str) -> String {
	let mut digest = hex_digest(root_folder.as_bytes());
	digest.truncate(ROOT_KEY_LEN);
	digest
}

fn hex_digest(bytes: &[u8]) -> String {
	let mut hasher = Sha256::new();
	hasher.update(bytes);
	hasher
		.finalize()
		.iter()
		.map(|b| format!("{:02x}", b))
		.collect()
}
