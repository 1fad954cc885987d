//! Directory clustering: one group per parent directory

use std::collections::HashMap;

use crate::core::similarity::dominant;
use crate::core::{file, Group};

use super::merge::merge_smallest;

/// Groups files by immediate parent directory, in first-seen order, then
/// merges the smallest groups down to `target` when one is given.
pub fn cluster(files: &[String], root: &str, target: Option<usize>) -> Vec<Group> {
	let mut index: HashMap<String, usize> = HashMap::new();
	let mut groups: Vec<Group> = Vec::new();

	for path in files {
		let dir = file::directory(path, root);
		match index.get(&dir) {
			Some(&i) => groups[i].push(path.clone()),
			None => {
				index.insert(dir, groups.len());
				groups.push(vec![path.clone()]);
			}
		}
	}

	match target {
		Some(t) => merge_smallest(groups, t),
		None => groups,
	}
}

/// Fraction of files sitting in a well-grouped cluster.
///
/// Singletons always count; larger groups count when their dominant
/// directory holds at least `dominance` of the members.
pub fn confidence(groups: &[Group], root: &str, dominance: f32) -> f32 {
	let total: usize = groups.iter().map(Vec::len).sum();
	if total == 0 {
		return 0.0;
	}

	let well: usize = groups
		.iter()
		.filter(|g| {
			if g.len() == 1 {
				return true;
			}
			let top = dominant(g.iter().map(|f| file::directory(f, root)))
				.map(|(_, c)| c)
				.unwrap_or(0);
			top as f32 / g.len() as f32 >= dominance
		})
		.map(Vec::len)
		.sum();

	well as f32 / total as f32
}
