//! Cascade controller: cheapest strategy first, stop at the first accepted result

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{self, ClusterConfig, EmbeddingSettings, SAMPLING_MIN_FILES};
use crate::core::cluster::is_partition;
use crate::core::similarity::group_similarity;
use crate::core::{Cluster, ClusterKind, Group};
use crate::providers::{FixedDelay, GitDiff, HttpEmbedder};
use crate::storage::JsonCacheStore;
use crate::ui;

use super::context::{Fetcher, Request, Services};
use super::validate::validate;
use super::{cached, directory, pattern, sampling, semantic};

/// Output of one strategy, with the numbers its acceptance rule looks at
pub struct Attempt {
	pub clusters: Vec<Cluster>,
	pub confidence: f32,
	pub hit_ratio: Option<f32>,
}

impl Attempt {
	pub fn groups(&self) -> Vec<Group> {
		self.clusters.iter().map(|c| c.files.clone()).collect()
	}

	fn accepted_as_is(clusters: Vec<Cluster>) -> Self {
		Self {
			clusters,
			confidence: 1.0,
			hit_ratio: None,
		}
	}
}

/// One layer of the cascade
pub trait Strategy {
	fn name(&self) -> &'static str;

	/// Whether this layer runs at all for the request
	fn applies(&self, _request: &Request) -> bool {
		true
	}

	fn produce(&self, request: &Request, services: &mut Services) -> Attempt;

	fn accept(&self, request: &Request, attempt: &Attempt) -> bool;
}

pub struct DirectoryStrategy;

impl Strategy for DirectoryStrategy {
	fn name(&self) -> &'static str {
		"directory"
	}

	fn produce(&self, request: &Request, _services: &mut Services) -> Attempt {
		let groups = directory::cluster(request.files, request.root, request.target);
		let confidence = directory::confidence(&groups, request.root, request.config.directory_dominance);
		Attempt {
			clusters: scored(groups, request.root, ClusterKind::Directory),
			confidence,
			hit_ratio: None,
		}
	}

	fn accept(&self, request: &Request, attempt: &Attempt) -> bool {
		let c = request.config;
		attempt.confidence >= c.directory_confidence
			&& (!request.threshold_mode() || validate(&attempt.groups(), request.root, c.directory_similarity))
	}
}

pub struct PatternStrategy;

impl Strategy for PatternStrategy {
	fn name(&self) -> &'static str {
		"pattern"
	}

	fn produce(&self, request: &Request, _services: &mut Services) -> Attempt {
		pattern_attempt(request)
	}

	fn accept(&self, request: &Request, attempt: &Attempt) -> bool {
		let c = request.config;
		attempt.confidence >= c.pattern_confidence
			&& validate(&attempt.groups(), request.root, c.pattern_similarity)
	}
}

pub struct CachedStrategy;

impl Strategy for CachedStrategy {
	fn name(&self) -> &'static str {
		"cached-embedding"
	}

	fn produce(&self, request: &Request, services: &mut Services) -> Attempt {
		let outcome = cached::cluster(request, services);
		Attempt {
			clusters: outcome.clusters,
			confidence: outcome.confidence,
			hit_ratio: Some(outcome.hit_ratio),
		}
	}

	fn accept(&self, request: &Request, attempt: &Attempt) -> bool {
		let c = request.config;
		attempt.confidence >= c.cached_confidence
			&& attempt.hit_ratio.unwrap_or(0.0) >= c.cached_accept_ratio
			&& validate(&attempt.groups(), request.root, c.cached_similarity)
	}
}

pub struct SamplingStrategy;

impl Strategy for SamplingStrategy {
	fn name(&self) -> &'static str {
		"smart-sampling"
	}

	fn applies(&self, request: &Request) -> bool {
		request.files.len() > SAMPLING_MIN_FILES
	}

	fn produce(&self, request: &Request, services: &mut Services) -> Attempt {
		match sampling::cluster(request, services) {
			Some(clusters) => Attempt::accepted_as_is(clusters),
			None => {
				ui::debug("Representatives could not be clustered, falling back to patterns");
				pattern_attempt(request)
			}
		}
	}

	fn accept(&self, _request: &Request, _attempt: &Attempt) -> bool {
		true
	}
}

pub struct SemanticStrategy;

impl Strategy for SemanticStrategy {
	fn name(&self) -> &'static str {
		"semantic"
	}

	fn produce(&self, request: &Request, services: &mut Services) -> Attempt {
		let outcome = semantic::cluster(request.files, request.root, request.target, request.config, services);
		Attempt::accepted_as_is(outcome.clusters)
	}

	fn accept(&self, _request: &Request, _attempt: &Attempt) -> bool {
		true
	}
}

/// Directory, pattern, cached embeddings, sampling, full semantic
pub fn default_cascade() -> Vec<Box<dyn Strategy>> {
	vec![
		Box::new(DirectoryStrategy),
		Box::new(PatternStrategy),
		Box::new(CachedStrategy),
		Box::new(SamplingStrategy),
		Box::new(SemanticStrategy),
	]
}

fn pattern_attempt(request: &Request) -> Attempt {
	let groups = pattern::cluster(request.files, request.root, request.target);
	let confidence = pattern::confidence(&groups, request.config.extension_dominance);
	Attempt {
		clusters: scored(groups, request.root, ClusterKind::Pattern),
		confidence,
		hit_ratio: None,
	}
}

fn scored(groups: Vec<Group>, root: &str, kind: ClusterKind) -> Vec<Cluster> {
	groups
		.into_iter()
		.map(|g| {
			let score = group_similarity(&g, root);
			Cluster::new(g, kind).with_score(score)
		})
		.collect()
}

/// Owns the collaborators and the ordered list of strategies
pub struct Engine {
	config: ClusterConfig,
	services: Services,
	strategies: Vec<Box<dyn Strategy>>,
}

impl Engine {
	pub fn new(config: ClusterConfig, services: Services) -> Self {
		Self {
			config,
			services,
			strategies: default_cascade(),
		}
	}

	/// Engine wired to git, the HTTP embedding service, and the on-disk cache
	pub fn from_env(delay: Duration, seed: Option<u64>) -> Result<Self> {
		let fetcher = Fetcher {
			embedder: Box::new(HttpEmbedder::new(EmbeddingSettings::from_env())?),
			diffs: Box::new(GitDiff),
			limiter: Box::new(FixedDelay(delay)),
		};
		let rng = match seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		let services = Services::new(fetcher, Box::new(JsonCacheStore::from_config()), rng);
		Ok(Self::new(ClusterConfig::default(), services))
	}

	pub fn with_strategies(mut self, strategies: Vec<Box<dyn Strategy>>) -> Self {
		self.strategies = strategies;
		self
	}

	pub fn services(&self) -> &Services {
		&self.services
	}

	/// Clusters `files` for one root folder.
	///
	/// `target_clusters <= 0` selects threshold mode. Only malformed input
	/// is an error; every other failure degrades to a simpler grouping.
	pub fn cluster(&mut self, files: &[String], root: &str, target_clusters: i64) -> Result<Vec<Cluster>> {
		check_input(files, root)?;

		match files.len() {
			0 => return Ok(Vec::new()),
			1 => return Ok(vec![Cluster::new(files.to_vec(), ClusterKind::Directory).with_score(1.0)]),
			_ => {}
		}

		let target = usize::try_from(target_clusters).ok().filter(|&t| t > 0);
		let request = Request {
			files,
			root,
			target,
			config: &self.config,
		};

		ui::debug(&format!(
			"Clustering {} files ({})",
			files.len(),
			match target {
				Some(t) => format!("target {}", t),
				None => "threshold mode".to_string(),
			}
		));

		for strategy in &self.strategies {
			if !strategy.applies(&request) {
				continue;
			}

			let attempt = strategy.produce(&request, &mut self.services);
			let groups = attempt.groups();

			if !is_partition(&groups, files) {
				ui::warn(&format!("{} clustering lost or duplicated files, skipping", strategy.name()));
				continue;
			}

			if strategy.accept(&request, &attempt) {
				ui::debug(&format!(
					"Accepted {} clustering: {} clusters, confidence {:.2}",
					strategy.name(),
					attempt.clusters.len(),
					attempt.confidence
				));
				return Ok(attempt.clusters);
			}

			ui::debug(&format!(
				"Rejected {} clustering (confidence {:.2}{})",
				strategy.name(),
				attempt.confidence,
				attempt
					.hit_ratio
					.map(|r| format!(", hit ratio {:.2}", r))
					.unwrap_or_default()
			));
		}

		ui::debug("No strategy accepted, one cluster per file");
		Ok(files
			.iter()
			.map(|f| Cluster::new(vec![f.clone()], ClusterKind::Semantic))
			.collect())
	}

	/// Same as [`Engine::cluster`], reduced to plain file lists
	pub fn cluster_files(&mut self, files: &[String], root: &str, target_clusters: i64) -> Result<Vec<Vec<String>>> {
		Ok(self
			.cluster(files, root, target_clusters)?
			.into_iter()
			.map(|c| c.files)
			.collect())
	}
}

/// One-shot entry point using environment configuration
pub fn smart_cluster_files(files: &[String], root_folder: &str, target_clusters: i64) -> Result<Vec<Vec<String>>> {
	check_input(files, root_folder)?;
	if files.len() < 2 {
		return Ok(files.iter().map(|f| vec![f.clone()]).collect());
	}
	Engine::from_env(config::EMBED_DELAY, None)?.cluster_files(files, root_folder, target_clusters)
}

fn check_input(files: &[String], root: &str) -> Result<()> {
	if root.trim().is_empty() {
		anyhow::bail!("Root folder must not be empty");
	}

	let mut seen = HashSet::with_capacity(files.len());
	for path in files {
		if path.trim().is_empty() {
			anyhow::bail!("File paths must not be empty");
		}
		if !seen.insert(path.as_str()) {
			anyhow::bail!("Duplicate file path: {}", path);
		}
	}

	Ok(())
}
