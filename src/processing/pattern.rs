//! Pattern clustering: test/implementation pairs, then extension groups

use std::collections::{HashMap, HashSet};

use crate::config::{MAX_CHUNK_SIZE, WHOLE_EXTENSIONS};
use crate::core::similarity::dominant;
use crate::core::{file, Group};

use super::merge::merge_smallest;

pub fn cluster(files: &[String], root: &str, target: Option<usize>) -> Vec<Group> {
	let (mut groups, consumed) = pair_tests(files, root);

	let remaining: Vec<&String> = files.iter().filter(|f| !consumed.contains(f.as_str())).collect();
	groups.extend(group_by_extension(&remaining));

	match target {
		Some(t) => merge_smallest(groups, t),
		None => groups,
	}
}

/// Fraction of files in groups whose dominant extension holds at least `dominance`.
pub fn confidence(groups: &[Group], dominance: f32) -> f32 {
	let total: usize = groups.iter().map(Vec::len).sum();
	if total == 0 {
		return 0.0;
	}

	let well: usize = groups
		.iter()
		.filter(|g| {
			let top = dominant(g.iter().map(|f| file::extension(f)))
				.map(|(_, c)| c)
				.unwrap_or(0);
			top as f32 / g.len() as f32 >= dominance
		})
		.map(Vec::len)
		.sum();

	well as f32 / total as f32
}

/// Pairs each test file with its implementation; both leave the pool.
fn pair_tests<'a>(files: &'a [String], root: &str) -> (Vec<Group>, HashSet<&'a str>) {
	let mut groups = Vec::new();
	let mut consumed: HashSet<&str> = HashSet::new();

	for test in files {
		if consumed.contains(test.as_str()) {
			continue;
		}
		let Some(test_stem) = file::test_stem(test) else {
			continue;
		};

		let test_dir = file::without_test_dirs(&file::directory(test, root));
		let candidates: Vec<&String> = files
			.iter()
			.filter(|c| {
				*c != test
					&& !consumed.contains(c.as_str())
					&& !file::is_test(c)
					&& file::stem(c) == test_stem
			})
			.collect();

		let chosen = candidates
			.iter()
			.find(|c| related_dirs(&file::directory(c, root), &test_dir))
			.or_else(|| candidates.first())
			.copied();

		if let Some(implementation) = chosen {
			consumed.insert(test.as_str());
			consumed.insert(implementation.as_str());
			groups.push(vec![implementation.clone(), test.clone()]);
		}
	}

	(groups, consumed)
}

fn related_dirs(a: &str, b: &str) -> bool {
	a == b || a.starts_with(b) || b.starts_with(a) || a.ends_with(b) || b.ends_with(a)
}

/// Extension groups of up to three files; `.md`/`.txt` groups stay whole.
fn group_by_extension(files: &[&String]) -> Vec<Group> {
	let mut order: Vec<String> = Vec::new();
	let mut by_ext: HashMap<String, Group> = HashMap::new();

	for path in files {
		let ext = file::extension(path);
		by_ext
			.entry(ext.clone())
			.or_insert_with(|| {
				order.push(ext);
				Vec::new()
			})
			.push((*path).clone());
	}

	let mut groups = Vec::new();
	for ext in order {
		let Some(members) = by_ext.remove(&ext) else {
			continue;
		};
		if members.len() <= MAX_CHUNK_SIZE || WHOLE_EXTENSIONS.contains(&ext.as_str()) {
			groups.push(members);
		} else {
			groups.extend(members.chunks(MAX_CHUNK_SIZE).map(|c| c.to_vec()));
		}
	}
	groups
}
