//! Cluster data structures

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plain group of file paths, the working unit inside clusterers
pub type Group = Vec<String>;

/// Which layer of the cascade produced a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
	Directory,
	Pattern,
	Cached,
	Semantic,
}

impl ClusterKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ClusterKind::Directory => "directory",
			ClusterKind::Pattern => "pattern",
			ClusterKind::Cached => "cached",
			ClusterKind::Semantic => "semantic",
		}
	}
}

impl std::fmt::Display for ClusterKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A group of changed files that will share one generated description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
	/// Member paths, in the order the clusterer emitted them
	pub files: Vec<String>,
	/// Similarity score (0.0-1.0), when the producing layer computes one
	pub score: Option<f32>,
	pub kind: ClusterKind,
	pub created_at: DateTime<Utc>,
}

impl Cluster {
	pub fn new(files: Vec<String>, kind: ClusterKind) -> Self {
		Self {
			files,
			score: None,
			kind,
			created_at: Utc::now(),
		}
	}

	pub fn with_score(mut self, score: f32) -> Self {
		self.score = Some(score.clamp(0.0, 1.0));
		self
	}
}

/// One group per file.
pub fn singletons(files: &[String]) -> Vec<Group> {
	files.iter().map(|f| vec![f.clone()]).collect()
}

/// True when `groups` covers `files` exactly once with no empty group.
pub fn is_partition(groups: &[Group], files: &[String]) -> bool {
	let expected: HashSet<&str> = files.iter().map(String::as_str).collect();
	let mut seen: HashSet<&str> = HashSet::with_capacity(files.len());

	for group in groups {
		if group.is_empty() {
			return false;
		}
		for file in group {
			if !expected.contains(file.as_str()) || !seen.insert(file.as_str()) {
				return false;
			}
		}
	}

	seen.len() == expected.len()
}

/// Appends a singleton for every input file missing from `groups`.
pub fn fill_missing(groups: &mut Vec<Group>, files: &[String]) {
	let present: HashSet<String> = groups.iter().flatten().cloned().collect();
	for file in files {
		if !present.contains(file) {
			groups.push(vec![file.clone()]);
		}
	}
}
