//! Persistent embedding cache, one JSON file per root folder
//!
//! Entries are keyed by the path as given to the engine and invalidated by
//! comparing a SHA-256 of the file's current bytes with the stored hash.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{self, CACHE_FILE_EXT, CACHE_FILE_PREFIX};
use crate::core::{root_key, ContentHash, Embedding};
use crate::ui;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCacheEntry {
	pub file_path: String,
	pub embedding: Embedding,
	pub content_hash: String,
	/// Character limit the embedded diff was cut at, if it was cut
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub truncated_at: Option<usize>,
	pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingCache {
	pub root_folder: String,
	#[serde(default)]
	pub embeddings: HashMap<String, FileCacheEntry>,
	pub last_updated: DateTime<Utc>,
}

impl EmbeddingCache {
	pub fn empty(root_folder: &str) -> Self {
		Self {
			root_folder: root_folder.to_string(),
			embeddings: HashMap::new(),
			last_updated: Utc::now(),
		}
	}

	pub fn len(&self) -> usize {
		self.embeddings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.embeddings.is_empty()
	}

	/// Returns the cached vector only while the file is unchanged.
	///
	/// A stale or unreadable entry is removed and reported as a miss.
	pub fn lookup(&mut self, path: &str) -> Option<Embedding> {
		self.lookup_within(path, usize::MAX)
	}

	/// Like [`EmbeddingCache::lookup`], but a vector embedded from a diff cut
	/// at more than `limit` characters is a miss. Such entries are kept.
	pub fn lookup_within(&mut self, path: &str, limit: usize) -> Option<Embedding> {
		let entry = self.embeddings.get(path)?;

		let current = ContentHash::compute(&resolve(&self.root_folder, path)).ok();
		match current {
			Some(hash) if hash.as_str() == entry.content_hash => {
				if entry.truncated_at.is_some_and(|cut| cut > limit) {
					return None;
				}
				Some(entry.embedding.clone())
			}
			_ => {
				ui::debug(&format!("Cache entry for {} is stale", path));
				self.embeddings.remove(path);
				None
			}
		}
	}

	/// Stores `embedding` under a fresh hash of the file's current bytes.
	///
	/// Files that cannot be read (e.g. deleted in the changeset) fall back to
	/// hashing `text`, which never matches on lookup.
	pub fn put(&mut self, path: &str, embedding: Embedding, text: &str, truncated_at: Option<usize>) {
		let hash = ContentHash::compute(&resolve(&self.root_folder, path))
			.unwrap_or_else(|_| ContentHash::of_bytes(text.as_bytes()));

		let now = Utc::now();
		self.embeddings.insert(
			path.to_string(),
			FileCacheEntry {
				file_path: path.to_string(),
				embedding,
				content_hash: hash.as_str().to_string(),
				truncated_at,
				last_updated: now,
			},
		);
		self.last_updated = now;
	}

	/// Number of entries whose file changed since they were cached (non-destructive)
	pub fn stale_count(&self) -> usize {
		self.embeddings
			.values()
			.filter(|entry| {
				ContentHash::compute(&resolve(&self.root_folder, &entry.file_path))
					.map(|h| h.as_str() != entry.content_hash)
					.unwrap_or(true)
			})
			.count()
	}
}

/// Load/save boundary for embedding caches
pub trait CacheStore {
	/// Never fails: a missing or unreadable cache is an empty one
	fn load(&self, root_folder: &str) -> EmbeddingCache;

	/// Best-effort persistence; failures are logged
	fn save(&self, cache: &EmbeddingCache);
}

/// Stores each cache as `embedding_cache_<key>.json` in one directory
#[derive(Debug, Clone)]
pub struct JsonCacheStore {
	dir: PathBuf,
}

impl JsonCacheStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Store rooted at the configured data directory
	pub fn from_config() -> Self {
		Self::new(config::data_dir())
	}

	pub fn path_for(&self, root_folder: &str) -> PathBuf {
		self.dir.join(format!(
			"{}{}.{}",
			CACHE_FILE_PREFIX,
			root_key(root_folder),
			CACHE_FILE_EXT
		))
	}

	pub fn try_load(&self, root_folder: &str) -> Result<EmbeddingCache> {
		let path = self.path_for(root_folder);
		let bytes = fs::read(&path).context("Failed to read embedding cache")?;
		let mut cache: EmbeddingCache =
			serde_json::from_slice(&bytes).context("Failed to parse embedding cache")?;
		cache.root_folder = root_folder.to_string();
		Ok(cache)
	}

	pub fn try_save(&self, cache: &EmbeddingCache) -> Result<PathBuf> {
		fs::create_dir_all(&self.dir).context("Failed to create data directory")?;

		let path = self.path_for(&cache.root_folder);
		let json = serde_json::to_string_pretty(cache).context("Failed to serialize embedding cache")?;
		fs::write(&path, json).context("Failed to write embedding cache")?;

		Ok(path)
	}

	/// Deletes the cache file for `root_folder`, returning whether one existed
	pub fn remove(&self, root_folder: &str) -> Result<bool> {
		let path = self.path_for(root_folder);
		if !path.exists() {
			return Ok(false);
		}
		fs::remove_file(&path).with_context(|| format!("Failed to delete {}", path.display()))?;
		Ok(true)
	}
}

impl CacheStore for JsonCacheStore {
	fn load(&self, root_folder: &str) -> EmbeddingCache {
		match self.try_load(root_folder) {
			Ok(cache) => {
				ui::debug(&format!("Loaded {} cached embeddings", cache.len()));
				cache
			}
			Err(e) => {
				ui::debug(&format!("Starting with empty cache: {:#}", e));
				EmbeddingCache::empty(root_folder)
			}
		}
	}

	fn save(&self, cache: &EmbeddingCache) {
		match self.try_save(cache) {
			Ok(path) => ui::debug(&format!("Saved {} embeddings to {}", cache.len(), path.display())),
			Err(e) => ui::warn(&format!("Could not save embedding cache: {:#}", e)),
		}
	}
}

fn resolve(root: &str, path: &str) -> PathBuf {
	let p = Path::new(path);
	if p.is_absolute() {
		p.to_path_buf()
	} else {
		Path::new(root).join(p)
	}
}
