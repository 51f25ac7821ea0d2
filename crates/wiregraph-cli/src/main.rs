//! wiregraph command-line tool
//!
//! Compiles component manifests into the generated wiring source file.
//!
//! ## Usage
//!
//! ```bash
//! wiregraph generate Manifests/ -o Generated/Wiring.swift
//! wiregraph generate App.json Feature.json --dot graph.dot -vv
//! wiregraph graph Manifests/ > graph.dot
//! ```
//!
//! Settings are read from `wiregraph.toml` (or `--config`), then
//! `WIREGRAPH_*` environment variables, then command-line flags.

mod manifest;
mod output;
mod settings;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use wiregraph::graph::{DependencyTreeGenerator, GraphErrors};

use crate::manifest::{Manifest, load_manifests};
use crate::output::write_if_changed;
use crate::settings::{DEFAULT_SETTINGS_FILE, Settings};

#[derive(Parser)]
#[command(name = "wiregraph")]
#[command(about = "Compile-time dependency graph compiler", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Generate the wiring source file for every root
	Generate {
		/// Manifest files or directories containing them
		#[arg(value_name = "MANIFEST", required = true)]
		manifests: Vec<PathBuf>,

		/// File to write (defaults to standard output)
		#[arg(short, long, value_name = "FILE")]
		output: Option<PathBuf>,

		/// Also write the dependency graph in DOT format
		#[arg(long, value_name = "FILE")]
		dot: Option<PathBuf>,

		/// Path to the settings file (defaults to ./wiregraph.toml)
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,

		/// Generate roots one at a time
		#[arg(long)]
		sequential: bool,
	},

	/// Print the dependency graph in DOT format
	Graph {
		/// Manifest files or directories containing them
		#[arg(value_name = "MANIFEST", required = true)]
		manifests: Vec<PathBuf>,

		/// Path to the settings file (defaults to ./wiregraph.toml)
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,
	},
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbosity);

	let result = match cli.command {
		Commands::Generate {
			manifests,
			output,
			dot,
			config,
			sequential,
		} => load_settings(config.as_deref()).and_then(|mut settings| {
			if output.is_some() {
				settings.output = output;
			}
			if dot.is_some() {
				settings.dot_output = dot;
			}
			if sequential {
				settings.parallel = false;
			}
			run_generate(&manifests, &settings)
		}),
		Commands::Graph { manifests, config } => {
			load_settings(config.as_deref()).and_then(|settings| run_graph(&manifests, &settings))
		}
	};

	if let Err(error) = result {
		report(&error);
		process::exit(1);
	}
}

/// Installs the stderr subscriber; `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbosity: u8) {
	use tracing_subscriber::EnvFilter;

	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
	let path = config.unwrap_or(Path::new(DEFAULT_SETTINGS_FILE));
	if config.is_some() && !path.exists() {
		anyhow::bail!("Settings file does not exist: {}", path.display());
	}
	Settings::load(path, std::env::vars())
		.with_context(|| format!("Failed to load settings from {}", path.display()))
}

fn build_generator(manifest: Manifest, settings: &Settings) -> anyhow::Result<DependencyTreeGenerator> {
	let imports = manifest
		.imports
		.into_iter()
		.chain(settings.additional_imports.iter().cloned());
	let generator =
		DependencyTreeGenerator::new(manifest.instantiables, imports, settings.generator_options())?;
	Ok(generator)
}

fn run_generate(manifests: &[PathBuf], settings: &Settings) -> anyhow::Result<()> {
	let manifest = load_manifests(manifests, settings.parallel)?;
	let generator = build_generator(manifest, settings)?;
	let file = generator.generate_file()?;

	match &settings.output {
		Some(path) => {
			let written = write_if_changed(path, &file)
				.with_context(|| format!("Failed to write {}", path.display()))?;
			if written {
				info!(path = %path.display(), "wrote generated file");
				println!("{} {}", "Generated:".green(), path.display());
			} else {
				println!("{} {}", "Unchanged:".dimmed(), path.display());
			}
		}
		None => print!("{file}"),
	}

	if let Some(path) = &settings.dot_output {
		let dot = generator.generate_dependency_graph()?.to_dot();
		write_if_changed(path, &dot).with_context(|| format!("Failed to write {}", path.display()))?;
		info!(path = %path.display(), "wrote dependency graph");
	}
	Ok(())
}

fn run_graph(manifests: &[PathBuf], settings: &Settings) -> anyhow::Result<()> {
	let manifest = load_manifests(manifests, settings.parallel)?;
	let graph = build_generator(manifest, settings)?.generate_dependency_graph()?;
	let statistics = graph.statistics();
	info!(
		roots = statistics.root_count,
		nodes = statistics.node_count,
		edges = statistics.edge_count,
		"rendering dependency graph"
	);
	print!("{}", graph.to_dot());
	Ok(())
}

/// Prints every graph error on its own line; other errors with their causes.
fn report(error: &anyhow::Error) {
	match error.downcast_ref::<GraphErrors>() {
		Some(errors) => {
			for graph_error in errors.iter() {
				eprintln!("{} {}", "error:".red().bold(), graph_error);
			}
			eprintln!(
				"{}",
				format!("{} error(s) in dependency graph", errors.len()).red()
			);
		}
		None => eprintln!("{} {:#}", "error:".red().bold(), error),
	}
}
