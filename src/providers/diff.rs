//! Diff retrieval from git

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// Supplies the text that gets embedded for a changed file
pub trait DiffSource {
	fn file_diff(&self, path: &str, root: &str) -> Result<String>;
}

/// Diffs against `HEAD`; untracked files yield their whole content
#[derive(Debug, Default, Clone, Copy)]
pub struct GitDiff;

impl DiffSource for GitDiff {
	fn file_diff(&self, path: &str, root: &str) -> Result<String> {
		let output = Command::new("git")
			.args(["-C", root, "diff", "HEAD", "--", path])
			.output()
			.context("Failed to run git diff")?;

		if output.status.success() {
			let diff = String::from_utf8_lossy(&output.stdout).into_owned();
			if !diff.trim().is_empty() {
				return Ok(diff);
			}
		}

		let full = Path::new(root).join(path);
		let content = fs::read(&full).with_context(|| format!("No diff and unreadable file: {}", path))?;
		let text = String::from_utf8_lossy(&content).into_owned();

		if text.trim().is_empty() {
			anyhow::bail!("No changes found for {}", path);
		}

		Ok(text)
	}
}

/// Changed and untracked files under `root`, relative to `root`.
///
/// `git status` reports paths from the repository top level, so entries are
/// re-based on the prefix of `root` and anything outside it is dropped.
pub fn changed_files(root: &Path) -> Result<Vec<String>> {
	let prefix = git(root, &["rev-parse", "--show-prefix"])?;
	let status = git(root, &["status", "--porcelain", "--untracked-files=all"])?;

	Ok(under_prefix(parse_porcelain(&status), prefix.trim()))
}

fn git(root: &Path, args: &[&str]) -> Result<String> {
	let output = Command::new("git")
		.arg("-C")
		.arg(root)
		.args(args)
		.output()
		.with_context(|| format!("Failed to run git {}", args[0]))?;

	if !output.status.success() {
		anyhow::bail!(
			"git {} failed: {}",
			args[0],
			String::from_utf8_lossy(&output.stderr).trim()
		);
	}

	Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_porcelain(text: &str) -> Vec<String> {
	text.lines()
		.filter(|line| line.len() > 3)
		.map(|line| {
			let entry = &line[3..];
			let path = entry.rsplit(" -> ").next().unwrap_or(entry);
			path.trim_matches('"').to_string()
		})
		.collect()
}

fn under_prefix(paths: Vec<String>, prefix: &str) -> Vec<String> {
	if prefix.is_empty() {
		return paths;
	}
	paths
		.into_iter()
		.filter_map(|p| p.strip_prefix(prefix).map(str::to_string))
		.filter(|p| !p.is_empty())
		.collect()
}

/// Cuts `text` at `limit` characters, appending `marker` when shortened.
pub fn truncate(text: &str, limit: usize, marker: &str) -> String {
	match text.char_indices().nth(limit) {
		Some((idx, _)) => format!("{}{}", &text[..idx], marker),
		None => text.to_string(),
	}
}
