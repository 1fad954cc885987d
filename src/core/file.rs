//! Changed-file path helpers
//!
//! A changed file is just its path string. Everything else (extension,
//! parent directory, test-ness) is derived here on demand.

use std::path::{Component, Path};

const TEST_MARKERS: &[&str] = &["_test", ".test", ".spec"];
const TEST_DIRS: &[&str] = &["test", "tests"];

/// Path relative to `root` with forward slashes.
///
/// Relative inputs are returned unchanged; absolute paths outside the root
/// are kept as-is.
pub fn relative(path: &str, root: &str) -> String {
	let p = Path::new(path);
	if p.is_absolute() && !root.is_empty() {
		if let Ok(rel) = p.strip_prefix(root) {
			return to_slash(rel);
		}
	}
	to_slash(p)
}

/// Immediate parent directory relative to `root`, `"."` for top-level files.
pub fn directory(path: &str, root: &str) -> String {
	let rel = relative(path, root);
	match Path::new(&rel).parent() {
		Some(parent) if !parent.as_os_str().is_empty() => to_slash(parent),
		_ => ".".to_string(),
	}
}

/// Lowercased extension including the dot (`".go"`), empty when absent.
pub fn extension(path: &str) -> String {
	Path::new(path)
		.extension()
		.and_then(|e| e.to_str())
		.map(|e| format!(".{}", e.to_ascii_lowercase()))
		.unwrap_or_default()
}

/// File name component.
pub fn base_name(path: &str) -> &str {
	Path::new(path)
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or(path)
}

/// File name without its final extension.
pub fn stem(path: &str) -> &str {
	Path::new(path)
		.file_stem()
		.and_then(|n| n.to_str())
		.unwrap_or(path)
}

/// Returns the implementation stem when `path` looks like a test file.
///
/// `foo_test.go`, `foo.test.ts` and `foo.spec.js` all yield `foo`; a file
/// under a `test`/`tests` directory yields its own stem.
pub fn test_stem(path: &str) -> Option<&str> {
	let stem = stem(path);
	for marker in TEST_MARKERS {
		if let Some(base) = stem.strip_suffix(marker) {
			if !base.is_empty() {
				return Some(base);
			}
		}
	}

	if in_test_dir(path) {
		return Some(stem);
	}

	None
}

pub fn is_test(path: &str) -> bool {
	test_stem(path).is_some()
}

fn in_test_dir(path: &str) -> bool {
	Path::new(path)
		.parent()
		.map(|p| {
			p.components().any(|c| match c {
				Component::Normal(name) => name
					.to_str()
					.is_some_and(|n| TEST_DIRS.contains(&n)),
				_ => false,
			})
		})
		.unwrap_or(false)
}

/// Directory with every `test`/`tests` component removed.
pub fn without_test_dirs(dir: &str) -> String {
	let kept: Vec<&str> = dir
		.split('/')
		.filter(|part| !TEST_DIRS.contains(part) && !part.is_empty())
		.collect();
	if kept.is_empty() {
		".".to_string()
	} else {
		kept.join("/")
	}
}

fn to_slash(path: &Path) -> String {
	let parts: Vec<String> = path
		.components()
		.filter_map(|c| match c {
			Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
			Component::RootDir => Some(String::new()),
			Component::ParentDir => Some("..".to_string()),
			_ => None,
		})
		.collect();
	parts.join("/")
}
