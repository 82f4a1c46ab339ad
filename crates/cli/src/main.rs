//! `baml-grammar`: validate and build compiled tree-sitter grammars.
//!
//! ```text
//! baml-grammar check baml --library target/grammars/libjson.so --library baml=build/parser.so
//! baml-grammar check --config grammars.toml --json
//! baml-grammar build ../tree-sitter-baml
//! baml-grammar paths
//! ```

mod check;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use baml_grammar::{grammar_lib_dir, grammar_search_paths, load_config};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::check::{Target, run_checks};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "baml-grammar")]
#[command(about = "Check that compiled tree-sitter grammars load")]
struct Args {
	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Load each grammar and report whether it is usable
	Check {
		/// Grammar names to look up in the search paths
		names: Vec<String>,

		/// Explicit grammar libraries as `PATH` or `NAME=PATH` (name otherwise derived from the file name)
		#[arg(short, long = "library", value_name = "[NAME=]PATH")]
		libraries: Vec<String>,

		/// Grammar list in TOML
		#[arg(short, long, value_name = "FILE")]
		config: Option<PathBuf>,

		/// Print reports as JSON
		#[arg(long)]
		json: bool,
	},
	/// Compile generated grammar sources and check the result
	Build {
		/// Grammar checkout (containing src/parser.c) or its src directory
		grammar_dir: PathBuf,

		/// Grammar name; defaults to the directory name without `tree-sitter-`
		#[arg(short, long)]
		name: Option<String>,

		/// Output directory for the library
		#[arg(short, long, value_name = "DIR")]
		out: Option<PathBuf>,
	},
	/// Print the grammar search paths
	Paths,
}

fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	match args.command {
		Command::Check {
			names,
			libraries,
			config,
			json,
		} => {
			let mut targets: Vec<Target> = names.into_iter().map(Target::Named).collect();
			targets.extend(libraries.iter().map(|arg| Target::from_library_arg(arg)));
			if let Some(path) = config {
				let config = load_config(&path).with_context(|| format!("loading {}", path.display()))?;
				targets.extend(config.grammars.into_iter().map(Target::Configured));
			}
			if targets.is_empty() {
				targets.push(Target::Named("baml".to_string()));
			}

			let reports = run_checks(&targets);
			if json {
				println!("{}", serde_json::to_string_pretty(&reports)?);
			} else {
				for report in &reports {
					println!("{report}");
				}
			}

			Ok(if reports.iter().all(|r| r.passed()) {
				ExitCode::SUCCESS
			} else {
				ExitCode::FAILURE
			})
		}
		Command::Build { grammar_dir, name, out } => {
			let name = match name {
				Some(name) => name,
				None => check::grammar_name_from_dir(&grammar_dir)
					.with_context(|| format!("cannot derive a grammar name from {}", grammar_dir.display()))?,
			};
			let out = out.unwrap_or_else(grammar_lib_dir);

			let outcome = baml_grammar_build::build_grammar(&name, &grammar_dir, &out)?;
			info!(grammar = %name, status = ?outcome.status, library = %outcome.library.display(), "Build finished");

			let report = check::check_artifact(&outcome.artifact());
			println!("{report}");
			Ok(if report.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
		}
		Command::Paths => {
			for dir in grammar_search_paths() {
				let marker = if dir.is_dir() { "" } else { " (missing)" };
				println!("{}{marker}", dir.display());
			}
			Ok(ExitCode::SUCCESS)
		}
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("baml_grammar=debug,baml_grammar_build=debug,info")
		} else {
			EnvFilter::new("error")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}
