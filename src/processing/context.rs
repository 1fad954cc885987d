//! Per-call request data and the collaborators clustering layers share

use anyhow::Result;
use rand::rngs::StdRng;

use crate::config::{ClusterConfig, TRUNCATION_MARKER};
use crate::core::Embedding;
use crate::providers::diff::truncate;
use crate::providers::{DiffSource, Embedder, RateLimiter};
use crate::storage::{CacheStore, EmbeddingCache};

/// One clustering call's inputs
pub struct Request<'a> {
	pub files: &'a [String],
	pub root: &'a str,
	/// `None` selects threshold mode
	pub target: Option<usize>,
	pub config: &'a ClusterConfig,
}

impl Request<'_> {
	pub fn threshold_mode(&self) -> bool {
		self.target.is_none()
	}
}

/// A file's embedded diff text
pub struct EmbeddedDiff {
	pub embedding: Embedding,
	pub text: String,
	/// Character limit the diff was cut at, if it was cut
	pub truncated_at: Option<usize>,
}

/// Diff retrieval, embedding, and pacing bundled for embedding loops
pub struct Fetcher {
	pub embedder: Box<dyn Embedder>,
	pub diffs: Box<dyn DiffSource>,
	pub limiter: Box<dyn RateLimiter>,
}

impl Fetcher {
	pub fn pause(&mut self) {
		self.limiter.pause();
	}

	/// Fetches the file's diff, truncates it to `limit` chars, and embeds it.
	pub fn embed_file(&self, path: &str, root: &str, limit: usize) -> Result<EmbeddedDiff> {
		let diff = self.diffs.file_diff(path, root)?;
		if diff.trim().is_empty() {
			anyhow::bail!("Empty diff");
		}

		let truncated_at = (diff.chars().count() > limit).then_some(limit);
		let text = truncate(&diff, limit, TRUNCATION_MARKER);
		let embedding = self.embedder.embed(&text)?;
		if embedding.is_empty() {
			anyhow::bail!("Empty embedding");
		}

		Ok(EmbeddedDiff {
			embedding,
			text,
			truncated_at,
		})
	}

	/// Embeds `path` and records it in `cache`
	pub fn embed_into(&self, cache: &mut EmbeddingCache, path: &str, root: &str, limit: usize) -> Result<Embedding> {
		let diff = self.embed_file(path, root, limit)?;
		cache.put(path, diff.embedding.clone(), &diff.text, diff.truncated_at);
		Ok(diff.embedding)
	}
}

/// Long-lived collaborators; the embedding cache is loaded on first use
pub struct Services {
	pub fetcher: Fetcher,
	pub store: Box<dyn CacheStore>,
	pub rng: StdRng,
	cache: Option<EmbeddingCache>,
}

impl Services {
	pub fn new(fetcher: Fetcher, store: Box<dyn CacheStore>, rng: StdRng) -> Self {
		Self {
			fetcher,
			store,
			rng,
			cache: None,
		}
	}

	/// Borrow the cache for `root` (loading it if needed) alongside the fetcher.
	///
	/// A cache loaded for another root is saved before it is replaced.
	pub fn cache_and_fetcher(&mut self, root: &str) -> (&mut EmbeddingCache, &mut Fetcher) {
		if self.cache.as_ref().is_some_and(|c| c.root_folder != root) {
			self.persist();
			self.cache = None;
		}

		let store = &self.store;
		let cache = self.cache.get_or_insert_with(|| store.load(root));
		(cache, &mut self.fetcher)
	}

	pub fn cache_loaded(&self) -> bool {
		self.cache.is_some()
	}

	/// Writes the in-memory cache back, if one was loaded
	pub fn persist(&self) {
		if let Some(cache) = &self.cache {
			self.store.save(cache);
		}
	}
}
