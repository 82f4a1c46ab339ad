//! `grammars.toml` configuration.
//!
//! ```toml
//! [[grammar]]
//! name = "baml"
//! source = "../tree-sitter-baml"
//!
//! [[grammar]]
//! name = "json"
//! library = "/usr/lib/tree-sitter/libjson.so"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::GrammarArtifact;
use crate::error::GrammarLoadError;
use crate::loader::resolve_grammar;
use crate::paths::{grammar_lib_dir, grammar_library_name};

/// Errors that can occur when loading a grammar configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse grammar config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid grammar config: {0}")]
	Invalid(String),
}

/// Top-level configuration: the grammars to check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(default, rename = "grammar")]
	pub grammars: Vec<GrammarConfig>,
}

/// One grammar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarConfig {
	pub name: String,
	/// Grammar repository containing generated `src/parser.c`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<PathBuf>,
	/// Prebuilt shared library.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub library: Option<PathBuf>,
}

impl Config {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		let mut seen = HashSet::new();
		for grammar in &self.grammars {
			if grammar.name.trim().is_empty() {
				return Err(ConfigError::Invalid("grammar name must not be empty".into()));
			}
			if !seen.insert(grammar.name.as_str()) {
				return Err(ConfigError::Invalid(format!("grammar `{}` is listed twice", grammar.name)));
			}
		}
		Ok(())
	}

	/// Rewrites relative `source`/`library` paths to be relative to `base`.
	pub fn resolve_relative_to(mut self, base: &Path) -> Self {
		for grammar in &mut self.grammars {
			for path in [&mut grammar.source, &mut grammar.library].into_iter().flatten() {
				if path.is_relative() {
					*path = base.join(&*path);
				}
			}
		}
		self
	}

	pub fn get(&self, name: &str) -> Option<&GrammarConfig> {
		self.grammars.iter().find(|g| g.name == name)
	}
}

impl GrammarConfig {
	/// Resolves the artifact to validate for this entry.
	///
	/// An explicit `library` wins. Entries with a `source` resolve to the
	/// build output in [`grammar_lib_dir`]; the rest go through the search paths.
	pub fn artifact(&self) -> Result<GrammarArtifact, GrammarLoadError> {
		if let Some(library) = &self.library {
			return Ok(GrammarArtifact::library(&self.name, library));
		}
		if self.source.is_some() {
			return Ok(GrammarArtifact::library(
				&self.name,
				grammar_lib_dir().join(grammar_library_name(&self.name)),
			));
		}
		resolve_grammar(&self.name)
	}
}

/// Reads `path`, resolving relative entries against its parent directory.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	let config = Config::from_toml_str(&content)?;
	let base = path.parent().unwrap_or_else(|| Path::new("."));
	Ok(config.resolve_relative_to(base))
}
