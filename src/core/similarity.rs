//! Heuristic similarity measures over file paths

use std::collections::HashMap;

use super::file;

/// Most frequent value and its count. Ties go to the value seen first.
pub fn dominant<I>(values: I) -> Option<(String, usize)>
where
	I: IntoIterator<Item = String>,
{
	let mut order: Vec<String> = Vec::new();
	let mut counts: HashMap<String, usize> = HashMap::new();

	for value in values {
		let count = counts.entry(value.clone()).or_insert(0);
		if *count == 0 {
			order.push(value);
		}
		*count += 1;
	}

	let mut best: Option<(String, usize)> = None;
	for value in order {
		let count = counts[&value];
		match &best {
			Some((_, c)) if count <= *c => {}
			_ => best = Some((value, count)),
		}
	}
	best
}

/// Share of the group held by its dominant extension
pub fn extension_homogeneity(files: &[String]) -> f32 {
	share(files, |f| file::extension(f))
}

/// Share of the group held by its dominant parent directory
pub fn directory_homogeneity(files: &[String], root: &str) -> f32 {
	share(files, |f| file::directory(f, root))
}

/// Mean of extension and directory homogeneity
pub fn group_similarity(files: &[String], root: &str) -> f32 {
	(extension_homogeneity(files) + directory_homogeneity(files, root)) / 2.0
}

/// Path-only affinity between two files, used for back-assignment
///
/// 0.5 for a matching extension, plus 0.5 for an identical directory or 0.3
/// when one directory contains the other as a substring.
pub fn file_affinity(a: &str, b: &str, root: &str) -> f32 {
	let mut score = 0.0;

	if file::extension(a) == file::extension(b) {
		score += 0.5;
	}

	let dir_a = file::directory(a, root);
	let dir_b = file::directory(b, root);
	if dir_a == dir_b {
		score += 0.5;
	} else if dir_a.contains(&dir_b) || dir_b.contains(&dir_a) {
		score += 0.3;
	}

	score
}

fn share<F>(files: &[String], key: F) -> f32
where
	F: Fn(&str) -> String,
{
	if files.is_empty() {
		return 0.0;
	}
	let count = dominant(files.iter().map(|f| key(f))).map(|(_, c)| c).unwrap_or(0);
	count as f32 / files.len() as f32
}
