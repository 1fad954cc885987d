// Integration tests for the clustering engine

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use diffgroup::config::{ClusterConfig, CACHED_DIFF_LIMIT, SEMANTIC_DIFF_LIMIT, TRUNCATION_MARKER};
use diffgroup::core::{ClusterKind, Embedding};
use diffgroup::processing::cascade::{CachedStrategy, SamplingStrategy, SemanticStrategy};
use diffgroup::processing::{Engine, Fetcher, Services};
use diffgroup::providers::{DiffSource, Embedder, NoDelay, RateLimiter};
use diffgroup::storage::{CacheStore, JsonCacheStore};

type Events = Rc<RefCell<Vec<&'static str>>>;

struct EchoDiff;

impl DiffSource for EchoDiff {
	fn file_diff(&self, path: &str, _root: &str) -> Result<String> {
		Ok(format!("diff {}", path))
	}
}

/// Header line naming the file followed by filler
struct LongDiff(usize);

impl DiffSource for LongDiff {
	fn file_diff(&self, path: &str, _root: &str) -> Result<String> {
		Ok(format!("diff {}\n{}", path, "x".repeat(self.0)))
	}
}

struct RecordingLimiter(Events);

impl RateLimiter for RecordingLimiter {
	fn pause(&mut self) {
		self.0.borrow_mut().push("pause");
	}
}

/// Returns a fixed vector per file, recording every call
struct FakeEmbedder {
	vectors: HashMap<String, Vec<f32>>,
	calls: Rc<Cell<usize>>,
	texts: Rc<RefCell<Vec<String>>>,
	events: Events,
}

impl Embedder for FakeEmbedder {
	fn embed(&self, text: &str) -> Result<Embedding> {
		self.calls.set(self.calls.get() + 1);
		self.texts.borrow_mut().push(text.to_string());
		self.events.borrow_mut().push("embed");

		let path = text.trim_start_matches("diff ").lines().next().unwrap_or_default();
		match self.vectors.get(path) {
			Some(v) => Ok(Embedding::new(v.clone())),
			None => anyhow::bail!("no vector for {}", path),
		}
	}
}

struct Fixture {
	root: PathBuf,
	data: PathBuf,
	calls: Rc<Cell<usize>>,
	texts: Rc<RefCell<Vec<String>>>,
	events: Events,
}

impl Fixture {
	fn new(name: &str, files: &[&str]) -> Self {
		let root = std::env::temp_dir().join(format!("diffgroup-it-{}-{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&root);
		for file in files {
			let path = root.join(file);
			fs::create_dir_all(path.parent().unwrap()).unwrap();
			fs::write(&path, format!("contents of {}", file)).unwrap();
		}
		let data = root.join(".data");
		Self {
			root,
			data,
			calls: Rc::new(Cell::new(0)),
			texts: Rc::new(RefCell::new(Vec::new())),
			events: Rc::new(RefCell::new(Vec::new())),
		}
	}

	fn root(&self) -> String {
		self.root.to_string_lossy().to_string()
	}

	fn engine(&self, vectors: &[(&str, Vec<f32>)]) -> Engine {
		self.engine_with(vectors, Box::new(EchoDiff), Box::new(NoDelay))
	}

	fn engine_with(
		&self,
		vectors: &[(&str, Vec<f32>)],
		diffs: Box<dyn DiffSource>,
		limiter: Box<dyn RateLimiter>,
	) -> Engine {
		let embedder = FakeEmbedder {
			vectors: vectors.iter().map(|(p, v)| (p.to_string(), v.clone())).collect(),
			calls: Rc::clone(&self.calls),
			texts: Rc::clone(&self.texts),
			events: Rc::clone(&self.events),
		};
		let fetcher = Fetcher {
			embedder: Box::new(embedder),
			diffs,
			limiter,
		};
		let services = Services::new(
			fetcher,
			Box::new(JsonCacheStore::new(&self.data)),
			StdRng::seed_from_u64(11),
		);
		Engine::new(ClusterConfig::default(), services)
	}

	/// Embeds `files` through the semantic layer so they are cached, then
	/// clears the call records
	fn precache(&self, files: &[String], vectors: &[(&str, Vec<f32>)]) {
		let mut engine = self.engine(vectors).with_strategies(vec![Box::new(SemanticStrategy)]);
		engine.cluster(files, &self.root(), 0).unwrap();
		self.reset();
	}

	fn reset(&self) {
		self.calls.set(0);
		self.texts.borrow_mut().clear();
		self.events.borrow_mut().clear();
	}

	fn cache_file(&self) -> PathBuf {
		JsonCacheStore::new(&self.data).path_for(&self.root())
	}

	fn cached_entries(&self) -> usize {
		JsonCacheStore::new(&self.data).load(&self.root()).len()
	}
}

fn strings(names: &[&str]) -> Vec<String> {
	names.iter().map(|s| s.to_string()).collect()
}

fn normalized(groups: Vec<Vec<String>>) -> HashSet<Vec<String>> {
	groups
		.into_iter()
		.map(|mut g| {
			g.sort();
			g
		})
		.collect()
}

fn assert_partition(groups: &[Vec<String>], files: &[String]) {
	let flat: Vec<&String> = groups.iter().flatten().collect();
	assert_eq!(flat.len(), files.len(), "file count changed: {:?}", groups);
	let set: HashSet<&String> = flat.into_iter().collect();
	assert_eq!(set, files.iter().collect::<HashSet<_>>());
	assert!(groups.iter().all(|g| !g.is_empty()));
}

const BLOB_FILES: &[&str] = &["api/server.go", "web/page.ts", "db/schema.sql", "docs/guide.md"];

fn blob_vectors() -> Vec<(&'static str, Vec<f32>)> {
	vec![
		("api/server.go", vec![1.0, 0.0, 0.0]),
		("db/schema.sql", vec![0.95, 0.05, 0.0]),
		("web/page.ts", vec![0.0, 1.0, 0.0]),
		("docs/guide.md", vec![0.05, 0.95, 0.0]),
	]
}

#[test]
fn empty_and_single_inputs_bypass_the_cascade() {
	let fx = Fixture::new("trivial", &["only.rs"]);
	let mut engine = fx.engine(&[]);

	assert!(engine.cluster_files(&[], &fx.root(), 3).unwrap().is_empty());
	for target in [-1, 0, 1, 7] {
		let result = engine.cluster_files(&strings(&["only.rs"]), &fx.root(), target).unwrap();
		assert_eq!(result, vec![strings(&["only.rs"])]);
	}
	assert_eq!(fx.calls.get(), 0);
	assert!(!fx.cache_file().exists());
}

#[test]
fn rejects_malformed_input() {
	let fx = Fixture::new("input", &[]);
	let mut engine = fx.engine(&[]);

	assert!(engine.cluster(&strings(&["a.rs", "a.rs"]), &fx.root(), 0).is_err());
	assert!(engine.cluster(&strings(&["a.rs", ""]), &fx.root(), 0).is_err());
	assert!(engine.cluster(&strings(&["a.rs", "b.rs"]), "  ", 0).is_err());
}

#[test]
fn directory_layer_wins_without_touching_the_cache() {
	let files = strings(&["a/1.go", "a/2.go", "b/1.go"]);
	let fx = Fixture::new("directory", &["a/1.go", "a/2.go", "b/1.go"]);
	let mut engine = fx.engine(&[]);

	let clusters = engine.cluster(&files, &fx.root(), 0).unwrap();
	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Directory));

	let groups: Vec<Vec<String>> = clusters.into_iter().map(|c| c.files).collect();
	assert_eq!(groups, vec![strings(&["a/1.go", "a/2.go"]), strings(&["b/1.go"])]);
	assert_eq!(fx.calls.get(), 0);
	assert!(!fx.cache_file().exists());
	assert!(!engine.services().cache_loaded());
}

#[test]
fn pattern_layer_pairs_tests_when_directories_are_mixed() {
	let names = [
		"pkg/foo.go",
		"pkg/foo_test.go",
		"pkg/util.py",
		"pkg/notes.txt",
		"pkg/run.sh",
		"pkg/conf.toml",
	];
	let files = strings(&names);
	let fx = Fixture::new("pattern", &names);
	let mut engine = fx.engine(&[]);

	let clusters = engine.cluster(&files, &fx.root(), 0).unwrap();
	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Pattern));
	let groups: Vec<Vec<String>> = clusters.into_iter().map(|c| c.files).collect();
	assert_eq!(groups[0], strings(&["pkg/foo.go", "pkg/foo_test.go"]));
	assert_eq!(groups.len(), 5);
}

#[test]
fn falls_through_to_semantic_then_reuses_cache() {
	let files = strings(BLOB_FILES);
	let fx = Fixture::new("cascade", BLOB_FILES);
	let expected = normalized(vec![
		strings(&["api/server.go", "db/schema.sql"]),
		strings(&["web/page.ts", "docs/guide.md"]),
	]);

	// every path heuristic mixes directories/extensions at target 2
	let mut engine = fx.engine(&blob_vectors());
	let clusters = engine.cluster(&files, &fx.root(), 2).unwrap();
	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Semantic));
	assert_eq!(normalized(clusters.into_iter().map(|c| c.files).collect()), expected);
	assert_eq!(fx.calls.get(), 4);
	assert!(fx.cache_file().exists());

	// second run: everything is cached, no service calls
	let mut engine = fx.engine(&blob_vectors());
	let clusters = engine.cluster(&files, &fx.root(), 2).unwrap();
	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Cached));
	assert_eq!(normalized(clusters.into_iter().map(|c| c.files).collect()), expected);
	assert_eq!(fx.calls.get(), 4);

	// an edited file is re-embedded, the rest still come from cache
	fs::write(fx.root.join("web/page.ts"), "edited").unwrap();
	let mut engine = fx.engine(&blob_vectors());
	let clusters = engine.cluster(&files, &fx.root(), 2).unwrap();
	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Cached));
	assert_eq!(fx.calls.get(), 5);
}

#[test]
fn threshold_semantic_pairs_similar_and_isolates_outlier() {
	let names = ["one.rs", "two.rs", "three.rs"];
	let fx = Fixture::new("threshold", &names);
	let mut engine = fx
		.engine(&[
			("one.rs", vec![1.0, 0.1, 0.0]),
			("two.rs", vec![0.9, 0.2, 0.0]),
			("three.rs", vec![0.0, 0.0, 1.0]),
		])
		.with_strategies(vec![Box::new(SemanticStrategy)]);

	let groups = engine.cluster_files(&strings(&names), &fx.root(), 0).unwrap();
	assert_eq!(groups, vec![strings(&["one.rs", "two.rs"]), strings(&["three.rs"])]);
}

#[test]
fn semantic_kmeans_with_k_equal_to_files_gives_singletons() {
	let names = ["one.rs", "two.rs", "three.rs"];
	let fx = Fixture::new("kmeans", &names);
	let mut engine = fx
		.engine(&[
			("one.rs", vec![1.0, 0.0]),
			("two.rs", vec![0.0, 1.0]),
			("three.rs", vec![1.0, 1.0]),
		])
		.with_strategies(vec![Box::new(SemanticStrategy)]);

	let groups = engine.cluster_files(&strings(&names), &fx.root(), 3).unwrap();
	assert_eq!(groups.len(), 3);
	assert_partition(&groups, &strings(&names));
}

#[test]
fn embedding_failures_degrade_to_singletons() {
	let names = ["x/a.go", "y/b.rs", "z/c.py"];
	let fx = Fixture::new("failures", &names);
	let mut engine = fx.engine(&[]).with_strategies(vec![Box::new(SemanticStrategy)]);

	let groups = engine.cluster_files(&strings(&names), &fx.root(), 0).unwrap();
	assert_eq!(groups, vec![strings(&["x/a.go"]), strings(&["y/b.rs"]), strings(&["z/c.py"])]);
	assert_eq!(fx.calls.get(), 3);
}

#[test]
fn sampling_embeds_only_representatives() {
	let names = [
		"src/main.rs", "src/lib.rs", "src/parse.rs", "src/eval.rs", "src/types.rs", "src/error.rs",
		"web/index.ts", "web/view.ts", "web/state.ts", "web/api.ts", "web/style.ts", "web/router.ts",
	];
	let files = strings(&names);
	let fx = Fixture::new("sampling", &names);
	let vectors: Vec<(&str, Vec<f32>)> = names
		.iter()
		.map(|n| (*n, if n.ends_with(".rs") { vec![1.0, 0.0] } else { vec![0.0, 1.0] }))
		.collect();
	let mut engine = fx.engine(&vectors).with_strategies(vec![Box::new(SamplingStrategy)]);

	let groups = engine.cluster_files(&files, &fx.root(), 0).unwrap();
	assert_partition(&groups, &files);
	assert!(fx.calls.get() <= 6);

	let expected = normalized(vec![names[..6].iter().map(|s| s.to_string()).collect(), names[6..].iter().map(|s| s.to_string()).collect()]);
	assert_eq!(normalized(groups), expected);
}

#[test]
fn sampling_falls_back_to_patterns_when_nothing_embeds() {
	let names: Vec<String> = (0..12).map(|i| format!("m{}/file{}.{}", i % 3, i, ["go", "rs", "py"][i % 3])).collect();
	let refs: Vec<&str> = names.iter().map(String::as_str).collect();
	let fx = Fixture::new("sampling-fallback", &refs);
	let mut engine = fx.engine(&[]).with_strategies(vec![Box::new(SamplingStrategy)]);

	let clusters = engine.cluster(&names, &fx.root(), 0).unwrap();
	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Pattern));
	let groups: Vec<Vec<String>> = clusters.into_iter().map(|c| c.files).collect();
	assert_partition(&groups, &names);
}

#[test]
fn every_run_partitions_its_input() {
	let names: Vec<String> = (0..23)
		.map(|i| format!("d{}/f{}.{}", i % 5, i, ["go", "rs", "ts", "md"][i % 4]))
		.collect();
	let refs: Vec<&str> = names.iter().map(String::as_str).collect();
	let fx = Fixture::new("partition", &refs);
	let vectors: Vec<(&str, Vec<f32>)> = refs
		.iter()
		.enumerate()
		.filter(|(i, _)| i % 3 != 0)
		.map(|(i, n)| (*n, vec![(i % 4) as f32, 1.0, (i % 7) as f32]))
		.collect();

	for target in [0, 1, 2, 4, 9, 30] {
		let mut engine = fx.engine(&vectors);
		let groups = engine.cluster_files(&names, &fx.root(), target).unwrap();
		assert_partition(&groups, &names);
	}
}

#[test]
fn corrupt_cache_file_is_ignored() {
	let fx = Fixture::new("corrupt", BLOB_FILES);
	fs::create_dir_all(&fx.data).unwrap();
	fs::write(fx.cache_file(), "][").unwrap();

	let mut engine = fx.engine(&blob_vectors());
	let groups = engine.cluster_files(&strings(BLOB_FILES), &fx.root(), 2).unwrap();
	assert_partition(&groups, &strings(BLOB_FILES));

	let reloaded = JsonCacheStore::new(&fx.data).load(&fx.root());
	assert_eq!(reloaded.len(), 4);
}

fn numbered(count: usize) -> (Vec<String>, Vec<(&'static str, Vec<f32>)>) {
	let names: Vec<&'static str> = ["src/a.rs", "src/b.rs", "src/c.rs", "src/d.rs", "src/e.rs", "src/f.rs", "src/g.rs", "src/h.rs", "src/i.rs", "src/j.rs"][..count].to_vec();
	let vectors = names
		.iter()
		.enumerate()
		.map(|(i, n)| (*n, vec![1.0, i as f32 / 10.0]))
		.collect();
	(strings(&names), vectors)
}

fn fixture_for(name: &str, files: &[String]) -> Fixture {
	let refs: Vec<&str> = files.iter().map(String::as_str).collect();
	Fixture::new(name, &refs)
}

#[test]
fn cached_layer_embeds_at_most_five_new_files() {
	let (files, vectors) = numbered(10);
	let fx = fixture_for("cached-cap", &files);
	fx.precache(&files[..4], &vectors);
	assert_eq!(fx.cached_entries(), 4);

	let mut engine = fx.engine(&vectors).with_strategies(vec![Box::new(CachedStrategy)]);
	let groups = engine.cluster_files(&files, &fx.root(), 0).unwrap();

	assert_partition(&groups, &files);
	assert_eq!(fx.calls.get(), 5);
	assert_eq!(fx.cached_entries(), 9);
}

#[test]
fn cached_layer_embeds_but_is_rejected_below_accept_ratio() {
	// 3 of 8 cached: above the abort ratio, below the accept ratio
	let (files, vectors) = numbered(8);
	let fx = fixture_for("cached-band", &files);
	fx.precache(&files[..3], &vectors);

	let mut engine = fx
		.engine(&vectors)
		.with_strategies(vec![Box::new(CachedStrategy), Box::new(SemanticStrategy)]);
	let clusters = engine.cluster(&files, &fx.root(), 0).unwrap();

	assert!(clusters.iter().all(|c| c.kind == ClusterKind::Semantic));
	// the cached layer embedded 5; semantic found all 8 in the cache
	assert_eq!(fx.calls.get(), 5);
	assert_eq!(fx.cached_entries(), 8);
}

#[test]
fn cached_layer_aborts_below_abort_ratio_without_calls() {
	let (files, vectors) = numbered(8);
	let fx = fixture_for("cached-abort", &files);
	fx.precache(&files[..2], &vectors);

	let mut engine = fx.engine(&vectors).with_strategies(vec![Box::new(CachedStrategy)]);
	let groups = engine.cluster_files(&files, &fx.root(), 0).unwrap();

	assert_eq!(fx.calls.get(), 0);
	assert_eq!(groups.len(), 8);
	assert_eq!(fx.cached_entries(), 2);
}

#[test]
fn aborted_cached_layer_still_saves_removed_stale_entries() {
	let (files, vectors) = numbered(10);
	let fx = fixture_for("cached-prune", &files);
	fx.precache(&files[..4], &vectors);
	fs::write(fx.root.join(&files[0]), "edited").unwrap();
	fs::write(fx.root.join(&files[1]), "edited").unwrap();

	let mut engine = fx.engine(&vectors).with_strategies(vec![Box::new(CachedStrategy)]);
	engine.cluster_files(&files, &fx.root(), 0).unwrap();

	assert_eq!(fx.calls.get(), 0);
	assert_eq!(fx.cached_entries(), 2);
}

fn assert_cut(texts: &[String], limit: usize) {
	for text in texts {
		assert_eq!(text.chars().count(), limit + TRUNCATION_MARKER.chars().count());
		assert!(text.ends_with(TRUNCATION_MARKER));
	}
}

#[test]
fn long_diffs_are_cut_per_layer() {
	let (files, vectors) = numbered(4);
	let fx = fixture_for("truncation", &files);
	let long = || Box::new(LongDiff(20_000));

	let mut engine = fx
		.engine_with(&vectors, long(), Box::new(NoDelay))
		.with_strategies(vec![Box::new(SemanticStrategy)]);
	engine.cluster(&files[..2], &fx.root(), 0).unwrap();
	assert_eq!(fx.texts.borrow().len(), 2);
	assert_cut(&fx.texts.borrow()[..], SEMANTIC_DIFF_LIMIT);
	fx.reset();

	// half cached: the cached layer embeds the rest with its longer limit
	let mut engine = fx
		.engine_with(&vectors, long(), Box::new(NoDelay))
		.with_strategies(vec![Box::new(CachedStrategy)]);
	engine.cluster(&files, &fx.root(), 0).unwrap();
	assert_eq!(fx.texts.borrow().len(), 2);
	assert_cut(&fx.texts.borrow()[..], CACHED_DIFF_LIMIT);
	fx.reset();

	// semantic re-embeds only the vectors cut longer than its own limit
	let mut engine = fx
		.engine_with(&vectors, long(), Box::new(NoDelay))
		.with_strategies(vec![Box::new(SemanticStrategy)]);
	engine.cluster(&files, &fx.root(), 0).unwrap();
	let texts = fx.texts.borrow();
	assert_eq!(texts.len(), 2);
	assert!(texts[0].starts_with("diff src/c.rs"));
	assert!(texts[1].starts_with("diff src/d.rs"));
	assert_cut(&texts, SEMANTIC_DIFF_LIMIT);
}

#[test]
fn pauses_only_between_service_calls() {
	let (files, vectors) = numbered(6);
	let fx = fixture_for("pacing", &files);
	fx.precache(&[files[1].clone(), files[3].clone()], &vectors);

	// b and d are cache hits
	let mut engine = fx
		.engine_with(&vectors, Box::new(EchoDiff), Box::new(RecordingLimiter(Rc::clone(&fx.events))))
		.with_strategies(vec![Box::new(SemanticStrategy)]);
	engine.cluster(&files[..4], &fx.root(), 0).unwrap();
	assert_eq!(*fx.events.borrow(), vec!["embed", "pause", "embed"]);
	fx.reset();

	// 4 of 6 cached now: the cached layer embeds e and f
	let mut engine = fx
		.engine_with(&vectors, Box::new(EchoDiff), Box::new(RecordingLimiter(Rc::clone(&fx.events))))
		.with_strategies(vec![Box::new(CachedStrategy)]);
	engine.cluster(&files, &fx.root(), 0).unwrap();
	assert_eq!(*fx.events.borrow(), vec!["embed", "pause", "embed"]);
}

#[test]
fn one_shot_entry_point_handles_trivial_inputs() {
	assert!(diffgroup::smart_cluster_files(&[], "/repo", 0).unwrap().is_empty());
	assert_eq!(
		diffgroup::smart_cluster_files(&strings(&["main.rs"]), "/repo", 4).unwrap(),
		vec![strings(&["main.rs"])]
	);
	assert!(diffgroup::smart_cluster_files(&strings(&["a.rs", "a.rs"]), "/repo", 0).is_err());
	assert!(diffgroup::smart_cluster_files(&strings(&["a.rs"]), "", 0).is_err());
}
