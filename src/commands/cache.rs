//! Cache command - inspect or clear a repository's embedding cache

use std::path::Path;

use anyhow::Result;
use colored::*;

use crate::storage::JsonCacheStore;
use crate::ui;

pub fn run(dir: &Path, clear: bool) -> Result<()> {
	let root = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	let root_str = root.to_string_lossy().to_string();
	let store = JsonCacheStore::from_config();
	let path = store.path_for(&root_str);

	if clear {
		if store.remove(&root_str)? {
			ui::success(&format!("Deleted {}", path.display()));
		} else {
			ui::info("No embedding cache to delete");
		}
		return Ok(());
	}

	if !path.exists() {
		ui::info(&format!("No embedding cache for {}", root_str));
		return Ok(());
	}

	let cache = store.try_load(&root_str)?;
	let stale = cache.stale_count();

	ui::header("Embedding Cache");
	eprintln!("  {} {}", "File:".bright_blue(), path.display());
	eprintln!("  {} {}", "Root:".bright_blue(), cache.root_folder);
	eprintln!("  {} {}", "Entries:".bright_blue(), cache.len());
	if stale > 0 {
		eprintln!("  {} {}", "Stale:".yellow(), stale);
	}
	eprintln!(
		"  {} {}",
		"Updated:".bright_blue(),
		cache.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
	);

	Ok(())
}
