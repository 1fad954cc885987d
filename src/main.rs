//! diffgroup - cluster changed files for commit message generation

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;

use diffgroup::cli::{Cli, Command};
use diffgroup::{commands, config, ui};

fn main() {
	if let Err(e) = run() {
		ui::error(&format!("{:#}", e));
		std::process::exit(1);
	}
}

fn run() -> Result<()> {
	let cli = Cli::parse();

	ui::Log::set_verbose(cli.verbose);
	if let Some(dir) = cli.data_dir {
		config::set_data_dir(dir);
	}

	match cli.command {
		Command::Cluster {
			files,
			directory,
			target,
			delay_ms,
			seed,
			export,
		} => {
			print_header();
			commands::cluster::run(files, &directory, target, delay_ms, seed, export.as_deref())
		}
		Command::Cache { directory, clear } => {
			print_header();
			commands::cache::run(&directory, clear)
		}
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			if let Some(sub) = subcommand {
				if let Some(sub_cmd) = cmd.find_subcommand_mut(&sub) {
					sub_cmd.print_help()?;
				} else {
					ui::warn(&format!("Unknown subcommand: {}", sub));
					cmd.print_help()?;
				}
			} else {
				cmd.print_help()?;
			}
			Ok(())
		}
	}
}

fn print_header() {
	eprintln!();
	eprintln!(
		"{}",
		format!("─── diffgroup v{} ───", env!("CARGO_PKG_VERSION"))
			.bright_blue()
			.bold()
	);
}
