//! Check targets and their reports.

use std::fmt;
use std::path::{Path, PathBuf};

use baml_grammar::{
	GrammarArtifact, GrammarConfig, GrammarInfo, Origin, grammar_lib_dir, inspect_grammar,
	resolve_grammar,
};
use serde::Serialize;

/// Something the user asked to check.
#[derive(Debug, Clone)]
pub enum Target {
	/// Look the grammar up in the search paths.
	Named(String),
	/// An explicit library file.
	Library { name: String, path: PathBuf },
	/// An entry from `grammars.toml`; built first when it has a `source`.
	Configured(GrammarConfig),
}

impl Target {
	pub fn from_library_path(path: PathBuf) -> Self {
		let name = grammar_name_from_library(&path).unwrap_or_else(|| path.display().to_string());
		Self::Library { name, path }
	}

	/// Parses a `--library` value: `PATH`, or `NAME=PATH` to override the
	/// name the entry symbol is derived from.
	pub fn from_library_arg(arg: &str) -> Self {
		if let Some((name, path)) = arg.split_once('=')
			&& !name.is_empty()
			&& !name.contains(['/', '\\'])
		{
			return Self::Library {
				name: name.to_string(),
				path: PathBuf::from(path),
			};
		}
		Self::from_library_path(PathBuf::from(arg))
	}

	fn name(&self) -> &str {
		match self {
			Self::Named(name) | Self::Library { name, .. } => name,
			Self::Configured(grammar) => &grammar.name,
		}
	}

	fn artifact(&self) -> Result<GrammarArtifact, String> {
		match self {
			Self::Named(name) => resolve_grammar(name).map_err(|e| e.to_string()),
			Self::Library { name, path } => Ok(GrammarArtifact::library(name, path)),
			Self::Configured(grammar) => {
				if grammar.library.is_none()
					&& let Some(source) = &grammar.source
				{
					baml_grammar_build::build_grammar(&grammar.name, source, &grammar_lib_dir())
						.map_err(|e| format!("error building {} grammar: {e}", grammar.name))?;
				}
				grammar.artifact().map_err(|e| e.to_string())
			}
		}
	}
}

/// Outcome of checking one grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
	pub grammar: String,
	#[serde(flatten)]
	pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
	Ok { info: GrammarInfo },
	Failed { error: String },
}

impl CheckReport {
	pub fn passed(&self) -> bool {
		matches!(self.outcome, Outcome::Ok { .. })
	}
}

impl fmt::Display for CheckReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.outcome {
			Outcome::Ok { info } => {
				write!(
					f,
					"ok      {}: abi {}, {} symbols, {} tokens, {} states",
					self.grammar, info.abi_version, info.symbol_count, info.token_count, info.state_count
				)?;
				if let Origin::Library(path) = &info.origin {
					write!(f, " ({})", path.display())?;
				}
				Ok(())
			}
			Outcome::Failed { error } => write!(f, "FAILED  {}: {error}", self.grammar),
		}
	}
}

pub fn check_artifact(artifact: &GrammarArtifact) -> CheckReport {
	let outcome = match inspect_grammar(artifact) {
		Ok(info) => Outcome::Ok { info },
		Err(e) => Outcome::Failed { error: e.to_string() },
	};
	CheckReport {
		grammar: artifact.name().to_string(),
		outcome,
	}
}

pub fn run_checks(targets: &[Target]) -> Vec<CheckReport> {
	targets
		.iter()
		.map(|target| match target.artifact() {
			Ok(artifact) => check_artifact(&artifact),
			Err(error) => CheckReport {
				grammar: target.name().to_string(),
				outcome: Outcome::Failed { error },
			},
		})
		.collect()
}

/// `libtree_sitter_baml.so`, `libtree-sitter-baml.so`, `libbaml.so`, `baml.dll` → `baml`.
pub fn grammar_name_from_library(path: &Path) -> Option<String> {
	let stem = path.file_stem()?.to_str()?;
	let stem = stem.strip_prefix("lib").unwrap_or(stem);
	let stem = ["tree_sitter_", "tree-sitter-"]
		.iter()
		.find_map(|prefix| stem.strip_prefix(prefix))
		.unwrap_or(stem);
	(!stem.is_empty()).then(|| stem.to_string())
}

/// `tree-sitter-baml/` → `baml`; a trailing `src/` component is skipped.
pub fn grammar_name_from_dir(dir: &Path) -> Option<String> {
	let dir = if dir.file_name().is_some_and(|n| n == "src") { dir.parent()? } else { dir };
	let name = dir.file_name()?.to_str()?;
	let name = name.strip_prefix("tree-sitter-").unwrap_or(name);
	(!name.is_empty()).then(|| name.to_string())
}
