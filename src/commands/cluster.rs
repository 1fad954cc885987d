//! Cluster command - group changed files for description generation

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::*;
use serde::{Deserialize, Serialize};

use crate::cli::Target;
use crate::config::default_cluster_count;
use crate::core::Cluster;
use crate::processing::Engine;
use crate::providers::diff::changed_files;
use crate::ui;

#[derive(Debug, Serialize, Deserialize)]
struct ClusterExport {
	root: String,
	timestamp: String,
	total_files: usize,
	clusters: Vec<ClusterInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClusterInfo {
	id: usize,
	kind: String,
	score: Option<f32>,
	size: usize,
	files: Vec<String>,
}

pub fn run(
	files: Vec<String>,
	dir: &Path,
	target: Target,
	delay_ms: u64,
	seed: Option<u64>,
	export: Option<&Path>,
) -> Result<()> {
	let root = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	let root_str = root.to_string_lossy().to_string();

	let files = if files.is_empty() {
		ui::debug("No files given, asking git for changes");
		changed_files(&root)?
	} else {
		files
	};

	if files.is_empty() {
		ui::warn("No changed files found");
		return Ok(());
	}

	let target_count = match target {
		Target::Threshold => 0,
		Target::Auto => default_cluster_count(files.len()) as i64,
		Target::Count(n) => n as i64,
	};

	ui::info(&format!(
		"Clustering {} files in {}",
		files.len(),
		ui::path_link(&root, &root_str)
	));

	let start = Instant::now();
	let mut engine = Engine::from_env(Duration::from_millis(delay_ms), seed)?;
	let clusters = engine.cluster(&files, &root_str, target_count)?;
	let duration = start.elapsed();

	if let Some(export_path) = export {
		return export_clusters(&clusters, &root_str, files.len(), export_path);
	}

	print_clusters(&clusters, &root);
	eprintln!(
		"\n{}",
		format!("Completed in {:.1}s", duration.as_secs_f32()).dimmed()
	);

	Ok(())
}

fn print_clusters(clusters: &[Cluster], root: &Path) {
	let total: usize = clusters.iter().map(|c| c.files.len()).sum();
	ui::success(&format!("{} clusters, {} files", clusters.len(), total));

	for (id, cluster) in clusters.iter().enumerate() {
		let score = cluster
			.score
			.map(|s| format!(", {:.0}% similar", s * 100.0))
			.unwrap_or_default();

		eprintln!(
			"\n{} {} ({}, {} files{})",
			"Cluster".bright_white(),
			(id + 1).to_string().bright_cyan(),
			cluster.kind.as_str().yellow(),
			cluster.files.len(),
			score
		);

		for file in &cluster.files {
			eprintln!("  {}", ui::path_link(&root.join(file), file));
		}
	}
}

fn export_clusters(clusters: &[Cluster], root: &str, total_files: usize, export_path: &Path) -> Result<()> {
	let export_data = ClusterExport {
		root: root.to_string(),
		timestamp: chrono::Utc::now().to_rfc3339(),
		total_files,
		clusters: clusters
			.iter()
			.enumerate()
			.map(|(id, c)| ClusterInfo {
				id: id + 1,
				kind: c.kind.as_str().to_string(),
				score: c.score,
				size: c.files.len(),
				files: c.files.clone(),
			})
			.collect(),
	};

	let json = serde_json::to_string_pretty(&export_data)?;

	if export_path.to_str() == Some("-") || export_path.as_os_str().is_empty() {
		println!("{}", json);
	} else {
		std::fs::write(export_path, json)?;
		ui::success(&format!("Exported to {}", export_path.display()));
	}

	Ok(())
}
