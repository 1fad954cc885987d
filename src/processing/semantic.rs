//! Full semantic clustering, the last layer of the cascade
//!
//! Every file's diff is embedded one call at a time with a pause between
//! calls. Vectors already in the embedding cache are reused and fresh ones
//! are written back.

use rand::rngs::StdRng;

use crate::config::{ClusterConfig, KMEANS_ITERATIONS, SEMANTIC_DIFF_LIMIT};
use crate::core::cluster::{fill_missing, singletons};
use crate::core::embedding::cohesion;
use crate::core::{Cluster, ClusterKind, Embedding, Group};
use crate::ui;

use super::context::Services;
use super::{kmeans, threshold};

pub struct SemanticOutcome {
	pub clusters: Vec<Cluster>,
	/// Number of files that ended up with a vector
	pub embedded: usize,
}

pub fn cluster(
	files: &[String],
	root: &str,
	target: Option<usize>,
	config: &ClusterConfig,
	services: &mut Services,
) -> SemanticOutcome {
	let (names, vectors) = embed_all(files, root, services);
	services.persist();

	if vectors.len() < 2 {
		ui::debug(&format!("Only {} files embedded, using singletons", vectors.len()));
		return SemanticOutcome {
			clusters: to_clusters(singletons(files), ClusterKind::Semantic),
			embedded: vectors.len(),
		};
	}

	let index_groups = group_vectors(&vectors, target, config.semantic_threshold, &mut services.rng);
	let (mut clusters, _) = build_clusters(&names, &vectors, index_groups, ClusterKind::Semantic);

	complete(&mut clusters, files, ClusterKind::Semantic);

	SemanticOutcome {
		clusters,
		embedded: vectors.len(),
	}
}

fn embed_all(files: &[String], root: &str, services: &mut Services) -> (Vec<String>, Vec<Embedding>) {
	let (cache, fetcher) = services.cache_and_fetcher(root);
	let mut names = Vec::new();
	let mut vectors = Vec::new();
	let mut calls = 0;

	for path in files {
		if let Some(embedding) = cache.lookup_within(path, SEMANTIC_DIFF_LIMIT) {
			names.push(path.clone());
			vectors.push(embedding);
			continue;
		}

		if calls > 0 {
			fetcher.pause();
		}
		calls += 1;

		match fetcher.embed_into(cache, path, root, SEMANTIC_DIFF_LIMIT) {
			Ok(embedding) => {
				names.push(path.clone());
				vectors.push(embedding);
			}
			Err(e) => ui::warn(&format!("Skipping {}: {:#}", path, e)),
		}
	}

	ui::debug(&format!(
		"Embedded {}/{} files ({} service calls)",
		vectors.len(),
		files.len(),
		calls
	));
	(names, vectors)
}

/// K-means toward `target`, or first-fit at `threshold` in threshold mode.
///
/// A K-means failure degrades to one group per vector.
pub fn group_vectors(
	vectors: &[Embedding],
	target: Option<usize>,
	threshold_value: f32,
	rng: &mut StdRng,
) -> Vec<Vec<usize>> {
	let refs: Vec<&Embedding> = vectors.iter().collect();

	match target {
		None => threshold::cluster(&refs, threshold_value),
		Some(k) => match kmeans::kmeans(&refs, k, KMEANS_ITERATIONS, rng) {
			Ok(assignments) => kmeans::groups(&assignments),
			Err(e) => {
				ui::debug(&format!("K-means failed, using singletons: {:#}", e));
				(0..vectors.len()).map(|i| vec![i]).collect()
			}
		},
	}
}

/// Turns index groups into scored clusters.
///
/// Also returns the cohesion of every cluster with two or more members.
pub fn build_clusters(
	names: &[String],
	vectors: &[Embedding],
	index_groups: Vec<Vec<usize>>,
	kind: ClusterKind,
) -> (Vec<Cluster>, Vec<f32>) {
	let mut clusters = Vec::with_capacity(index_groups.len());
	let mut cohesions = Vec::new();

	for indices in index_groups {
		let members: Vec<&Embedding> = indices.iter().map(|&i| &vectors[i]).collect();
		let score = cohesion(&members);
		if members.len() >= 2 {
			cohesions.push(score);
		}

		let files = indices.iter().map(|&i| names[i].clone()).collect();
		clusters.push(Cluster::new(files, kind).with_score(score));
	}

	(clusters, cohesions)
}

/// Adds a singleton for every file that no cluster covers.
pub fn complete(clusters: &mut Vec<Cluster>, files: &[String], kind: ClusterKind) {
	let mut covered: Vec<Group> = clusters.iter().map(|c| c.files.clone()).collect();
	let before = covered.len();
	fill_missing(&mut covered, files);
	clusters.extend(to_clusters(covered.split_off(before), kind));
}

pub fn to_clusters(groups: Vec<Group>, kind: ClusterKind) -> Vec<Cluster> {
	groups.into_iter().map(|g| Cluster::new(g, kind)).collect()
}
