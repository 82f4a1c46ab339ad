//! Grammar loading errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when turning an artifact into a language handle.
///
/// Every message starts with `error loading <name> grammar` so harness output
/// reads the same whichever step failed.
#[derive(Error, Debug)]
pub enum GrammarLoadError {
	/// Grammar library not found in any search path.
	#[error("error loading {name} grammar: not found in any grammar search path")]
	NotFound { name: String },

	/// An explicit artifact path does not exist.
	#[error("error loading {name} grammar: {} does not exist", .path.display())]
	MissingArtifact { name: String, path: PathBuf },

	/// The artifact file exists but has no contents.
	#[error("error loading {name} grammar: {} is empty", .path.display())]
	EmptyArtifact { name: String, path: PathBuf },

	/// The dynamic loader rejected the file (truncated, corrupt, wrong platform).
	#[error("error loading {name} grammar: failed to open {}: {source}", .path.display())]
	Library {
		name: String,
		path: PathBuf,
		#[source]
		source: libloading::Error,
	},

	/// The library does not export the language entry point.
	#[error("error loading {name} grammar: missing language function `{symbol}`: {source}")]
	MissingSymbol {
		name: String,
		symbol: String,
		#[source]
		source: libloading::Error,
	},

	/// The language entry point returned a null pointer.
	#[error("error loading {name} grammar: language function returned null")]
	NullLanguage { name: String },

	/// The language tables were generated for an unsupported ABI.
	#[error(
		"error loading {name} grammar: incompatible language version {found}, expected {min}..={max}"
	)]
	IncompatibleVersion { name: String, found: u32, min: u32, max: u32 },

	/// The language tables are internally inconsistent.
	#[error("error loading {name} grammar: malformed language: {reason}")]
	Malformed { name: String, reason: String },

	/// Filesystem I/O error while inspecting the artifact.
	#[error("error loading {name} grammar: {}: {source}", .path.display())]
	Io {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl GrammarLoadError {
	/// Name of the grammar that failed to load.
	pub fn grammar(&self) -> &str {
		match self {
			Self::NotFound { name }
			| Self::MissingArtifact { name, .. }
			| Self::EmptyArtifact { name, .. }
			| Self::Library { name, .. }
			| Self::MissingSymbol { name, .. }
			| Self::NullLanguage { name }
			| Self::IncompatibleVersion { name, .. }
			| Self::Malformed { name, .. }
			| Self::Io { name, .. } => name,
		}
	}
}
