use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

/// Desired number of clusters: a positive count, `auto`, or 0 for threshold mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
	Threshold,
	Auto,
	Count(usize),
}

fn parse_target(s: &str) -> Result<Target, String> {
	if s.eq_ignore_ascii_case("auto") {
		return Ok(Target::Auto);
	}
	let val: i64 = s.parse().map_err(|_| format!("'{}' is not a number or 'auto'", s))?;
	if val <= 0 {
		Ok(Target::Threshold)
	} else {
		Ok(Target::Count(val as usize))
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.usage(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.literal(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.placeholder(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
		.valid(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

#[derive(Parser, Debug)]
#[command(
	name = "diffgroup",
	author,
	version,
	about = "Group changed files into coherent clusters",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {bin} {cluster} {cluster_args}          {cluster_desc}
  {bin} {cluster} {cluster_k_args}  {cluster_k_desc}
  {bin} {cache}   {cache_args}  {cache_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "diffgroup".bright_blue(),
		cluster = "cluster".yellow(),
		cluster_args = "-d .",
		cluster_desc = "Cluster all changed files".dimmed(),
		cluster_k_args = "-k 3 --export -",
		cluster_k_desc = "Aim for 3 clusters, JSON to stdout".dimmed(),
		cache = "cache".yellow(),
		cache_args = "-d . --clear",
		cache_desc = "Drop cached embeddings".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Directory holding embedding caches (default: ~/.diffgroup)
	#[arg(long = "data-dir", global = true)]
	pub data_dir: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Cluster changed files
	Cluster {
		/// Files to cluster (default: everything `git status` reports)
		#[arg(value_name = "FILES")]
		files: Vec<String>,

		/// Repository root
		#[arg(short = 'd', long = "dir", default_value = ".")]
		directory: PathBuf,

		/// Target cluster count, `auto`, or 0 for similarity thresholds only
		#[arg(short = 'k', long = "target", default_value = "0", value_parser = parse_target)]
		target: Target,

		/// Pause between embedding calls in milliseconds
		#[arg(long = "delay-ms", default_value_t = 2000)]
		delay_ms: u64,

		/// Seed for reproducible K-means runs
		#[arg(long = "seed")]
		seed: Option<u64>,

		/// Write clusters as JSON to a file, or `-` for stdout
		#[arg(short = 'e', long = "export", value_name = "PATH")]
		export: Option<PathBuf>,
	},

	/// Inspect or clear the embedding cache of a repository
	Cache {
		/// Repository root
		#[arg(short = 'd', long = "dir", default_value = ".")]
		directory: PathBuf,

		/// Delete the cache file
		#[arg(long = "clear")]
		clear: bool,
	},

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}
