//! Application configuration and constants

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};

static CUSTOM_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

// === Storage ===
pub const DATA_DIR: &str = ".diffgroup";
pub const CACHE_FILE_PREFIX: &str = "embedding_cache_";
pub const CACHE_FILE_EXT: &str = "json";

// === Diff Retrieval ===
pub const CACHED_DIFF_LIMIT: usize = 15_000;
pub const SEMANTIC_DIFF_LIMIT: usize = 10_000;
pub const TRUNCATION_MARKER: &str = "\n... [diff truncated]";

// === Embedding Budget ===
pub const MAX_NEW_EMBEDDINGS: usize = 5;
pub const EMBED_DELAY: Duration = Duration::from_secs(2);
pub const EMBED_TIMEOUT: Duration = Duration::from_secs(60);

// === Clustering ===
pub const KMEANS_ITERATIONS: usize = 20;
pub const MAX_DEFAULT_CLUSTERS: usize = 5;
pub const MAX_REPRESENTATIVES: usize = 8;
pub const SAMPLING_MIN_FILES: usize = 10;
pub const MAX_CHUNK_SIZE: usize = 3;
pub const WHOLE_EXTENSIONS: &[&str] = &[".md", ".txt"];
pub const REPRESENTATIVE_HINTS: &[&str] = &["main", "index", "core", "app"];

// === Embedding Service Defaults ===
pub const DEFAULT_EMBED_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";

/// Acceptance thresholds for every cascade layer
///
/// Defaults are the tuned values the engine ships with; tests override them
/// freely without touching global state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
	pub directory_confidence: f32,
	pub directory_similarity: f32,
	pub pattern_confidence: f32,
	pub pattern_similarity: f32,
	pub cached_confidence: f32,
	pub cached_similarity: f32,
	/// Minimum hit ratio for a cached result to be accepted
	pub cached_accept_ratio: f32,
	/// Below this hit ratio the cached layer gives up before embedding anything
	pub cached_abort_ratio: f32,
	pub sampling_similarity: f32,
	/// Pairwise cosine cutoff for threshold-mode semantic grouping
	pub semantic_threshold: f32,
	/// Share of a cluster its dominant directory must hold to count as well grouped
	pub directory_dominance: f32,
	/// Same, for the dominant extension of a pattern cluster
	pub extension_dominance: f32,
}

impl Default for ClusterConfig {
	fn default() -> Self {
		Self {
			directory_confidence: 0.8,
			directory_similarity: 0.7,
			pattern_confidence: 0.7,
			pattern_similarity: 0.6,
			cached_confidence: 0.6,
			cached_similarity: 0.5,
			cached_accept_ratio: 0.4,
			cached_abort_ratio: 0.3,
			sampling_similarity: 0.4,
			semantic_threshold: 0.6,
			directory_dominance: 0.7,
			extension_dominance: 0.6,
		}
	}
}

/// Connection settings for the embedding service
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
	pub api_key: Option<String>,
	pub base_url: String,
	pub model: String,
}

impl EmbeddingSettings {
	/// Read from DIFFGROUP_API_KEY (or OPENAI_API_KEY), DIFFGROUP_EMBED_URL, DIFFGROUP_EMBED_MODEL
	pub fn from_env() -> Self {
		let api_key = std::env::var("DIFFGROUP_API_KEY")
			.or_else(|_| std::env::var("OPENAI_API_KEY"))
			.ok()
			.filter(|k| !k.trim().is_empty());

		Self {
			api_key,
			base_url: std::env::var("DIFFGROUP_EMBED_URL").unwrap_or_else(|_| DEFAULT_EMBED_URL.to_string()),
			model: std::env::var("DIFFGROUP_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string()),
		}
	}

	pub fn require_key(&self) -> Result<&str> {
		self.api_key
			.as_deref()
			.context("No embedding API key. Set DIFFGROUP_API_KEY or OPENAI_API_KEY")
	}
}

pub fn set_data_dir(path: PathBuf) {
	let _ = CUSTOM_DATA_DIR.set(path);
}

/// Cache directory (custom override, DIFFGROUP_DATA_DIR, ~/.diffgroup, or ./.diffgroup)
pub fn data_dir() -> PathBuf {
	if let Some(custom) = CUSTOM_DATA_DIR.get() {
		return custom.clone();
	}

	if let Ok(env_path) = std::env::var("DIFFGROUP_DATA_DIR") {
		if !env_path.is_empty() {
			crate::ui::debug(&format!("Using DIFFGROUP_DATA_DIR: {}", env_path));
			return PathBuf::from(env_path);
		}
	}

	let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
	match home {
		Some(home) => PathBuf::from(home).join(DATA_DIR),
		None => PathBuf::from(DATA_DIR),
	}
}

/// K-means target when the caller gave none
pub fn default_cluster_count(files: usize) -> usize {
	(files / 2).clamp(1, MAX_DEFAULT_CLUSTERS)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_cluster_count_is_clamped() {
		assert_eq!(default_cluster_count(1), 1);
		assert_eq!(default_cluster_count(6), 3);
		assert_eq!(default_cluster_count(40), 5);
	}

	#[test]
	fn defaults_match_documented_thresholds() {
		let config = ClusterConfig::default();
		assert_eq!(config.directory_confidence, 0.8);
		assert_eq!(config.pattern_similarity, 0.6);
		assert_eq!(config.cached_accept_ratio, 0.4);
		assert_eq!(config.sampling_similarity, 0.4);
	}
}
