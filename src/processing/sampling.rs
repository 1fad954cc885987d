//! Representative sampling for large changesets
//!
//! Only a handful of diverse files are embedded. Everything else joins the
//! representative cluster its path resembles most.

use std::collections::HashSet;

use crate::config::{MAX_REPRESENTATIVES, REPRESENTATIVE_HINTS};
use crate::core::similarity::{file_affinity, group_similarity};
use crate::core::{file, Cluster, ClusterKind, Group};
use crate::ui;

use super::context::{Request, Services};
use super::semantic;
use super::validate::split_failing;

/// Clusters via representatives, or `None` when fewer than two of them
/// could be embedded.
pub fn cluster(request: &Request, services: &mut Services) -> Option<Vec<Cluster>> {
	let representatives = select_representatives(request.files);
	ui::debug(&format!(
		"Sampling {} representatives from {} files",
		representatives.len(),
		request.files.len()
	));

	let outcome = semantic::cluster(&representatives, request.root, None, request.config, services);
	if outcome.embedded < 2 {
		return None;
	}

	let chosen: HashSet<&str> = representatives.iter().map(String::as_str).collect();
	let remaining: Vec<String> = request
		.files
		.iter()
		.filter(|f| !chosen.contains(f.as_str()))
		.cloned()
		.collect();

	let seeds: Vec<Group> = outcome.clusters.into_iter().map(|c| c.files).collect();
	let mut groups = assign_remaining(seeds, &remaining, request.root);

	if request.threshold_mode() {
		groups = split_failing(groups, request.root, request.config.sampling_similarity);
	}

	Some(
		groups
			.into_iter()
			.map(|g| {
				let score = group_similarity(&g, request.root);
				Cluster::new(g, ClusterKind::Semantic).with_score(score)
			})
			.collect(),
	)
}

/// Picks up to `min(8, n/2)` files: one per extension (preferring names
/// like `main`/`index`/`core`/`app`), then the longest remaining paths.
pub fn select_representatives(files: &[String]) -> Vec<String> {
	let budget = MAX_REPRESENTATIVES.min(files.len() / 2);
	let mut picked: Vec<String> = Vec::with_capacity(budget);
	let mut seen_ext: HashSet<String> = HashSet::new();

	for path in files {
		if picked.len() >= budget {
			break;
		}
		let ext = file::extension(path);
		if !seen_ext.insert(ext.clone()) {
			continue;
		}

		let same_ext: Vec<&String> = files.iter().filter(|f| file::extension(f) == ext).collect();
		let choice = same_ext
			.iter()
			.find(|f| {
				let name = file::base_name(f).to_ascii_lowercase();
				REPRESENTATIVE_HINTS.iter().any(|hint| name.contains(hint))
			})
			.or(same_ext.first())
			.copied()
			.unwrap_or(path);
		picked.push(choice.clone());
	}

	if picked.len() < budget {
		let mut rest: Vec<&String> = files.iter().filter(|f| !picked.contains(*f)).collect();
		rest.sort_by(|a, b| b.len().cmp(&a.len()));
		picked.extend(rest.into_iter().take(budget - picked.len()).cloned());
	}

	picked
}

/// Appends each remaining file to the seed group with the highest mean path
/// affinity. Ties go to the earliest group.
pub fn assign_remaining(mut groups: Vec<Group>, remaining: &[String], root: &str) -> Vec<Group> {
	if groups.is_empty() {
		return remaining.iter().map(|f| vec![f.clone()]).collect();
	}

	for path in remaining {
		let mut best = 0;
		let mut best_score = f32::NEG_INFINITY;

		for (i, group) in groups.iter().enumerate() {
			let score = group.iter().map(|m| file_affinity(path, m, root)).sum::<f32>() / group.len() as f32;
			if score > best_score {
				best_score = score;
				best = i;
			}
		}

		groups[best].push(path.clone());
	}

	groups
}
