//! Clustering driven mostly by previously cached embeddings

use crate::config::{CACHED_DIFF_LIMIT, MAX_NEW_EMBEDDINGS};
use crate::core::cluster::singletons;
use crate::core::{Cluster, ClusterKind, Embedding};
use crate::ui;

use super::context::{Request, Services};
use super::semantic::{build_clusters, complete, group_vectors, to_clusters};

/// Confidence reported when no cluster has two members to measure
const NEUTRAL_CONFIDENCE: f32 = 0.5;

pub struct CachedOutcome {
	pub clusters: Vec<Cluster>,
	pub confidence: f32,
	pub hit_ratio: f32,
}

impl CachedOutcome {
	fn abandoned(files: &[String], hit_ratio: f32) -> Self {
		Self {
			clusters: to_clusters(singletons(files), ClusterKind::Cached),
			confidence: 0.0,
			hit_ratio,
		}
	}
}

pub fn cluster(request: &Request, services: &mut Services) -> CachedOutcome {
	let files = request.files;
	let (cache, fetcher) = services.cache_and_fetcher(request.root);

	let mut names: Vec<String> = Vec::new();
	let mut vectors: Vec<Embedding> = Vec::new();
	let mut uncached: Vec<&String> = Vec::new();
	let entries_before = cache.len();

	for path in files {
		match cache.lookup(path) {
			Some(embedding) => {
				names.push(path.clone());
				vectors.push(embedding);
			}
			None => uncached.push(path),
		}
	}

	let hit_ratio = names.len() as f32 / files.len() as f32;
	ui::debug(&format!(
		"Cache hits: {}/{} ({:.0}%)",
		names.len(),
		files.len(),
		hit_ratio * 100.0
	));

	if hit_ratio < request.config.cached_abort_ratio {
		// keep stale-entry removals
		if cache.len() < entries_before {
			services.persist();
		}
		return CachedOutcome::abandoned(files, hit_ratio);
	}

	for (i, path) in uncached.iter().take(MAX_NEW_EMBEDDINGS).enumerate() {
		if i > 0 {
			fetcher.pause();
		}
		match fetcher.embed_into(cache, path, request.root, CACHED_DIFF_LIMIT) {
			Ok(embedding) => {
				names.push((*path).clone());
				vectors.push(embedding);
			}
			Err(e) => ui::debug(&format!("No embedding for {}: {:#}", path, e)),
		}
	}

	services.persist();

	if vectors.len() < 2 {
		return CachedOutcome::abandoned(files, hit_ratio);
	}

	let index_groups = group_vectors(
		&vectors,
		request.target,
		request.config.semantic_threshold,
		&mut services.rng,
	);
	let (mut clusters, cohesions) = build_clusters(&names, &vectors, index_groups, ClusterKind::Cached);

	let confidence = if cohesions.is_empty() {
		NEUTRAL_CONFIDENCE
	} else {
		cohesions.iter().sum::<f32>() / cohesions.len() as f32
	};

	complete(&mut clusters, files, ClusterKind::Cached);

	CachedOutcome {
		clusters,
		confidence,
		hit_ratio,
	}
}
