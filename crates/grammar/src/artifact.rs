//! Grammar artifact sources.
//!
//! An artifact is the compiled output of `tree-sitter generate`: language
//! tables reachable through a single `tree_sitter_<name>` entry point. The
//! tables themselves are opaque here; only the entry point is named.

use std::fmt;
use std::path::{Path, PathBuf};

use tree_sitter_language::LanguageFn;

/// A compiled grammar that can be turned into a language handle.
#[derive(Clone)]
pub enum GrammarArtifact {
	/// Grammar linked into the current binary, as exported by grammar crates.
	Builtin { name: String, language: LanguageFn },
	/// Grammar compiled into a shared library exporting `tree_sitter_<name>`.
	Library { name: String, path: PathBuf },
}

impl GrammarArtifact {
	pub fn builtin(name: impl Into<String>, language: LanguageFn) -> Self {
		Self::Builtin {
			name: name.into(),
			language,
		}
	}

	pub fn library(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
		Self::Library {
			name: name.into(),
			path: path.into(),
		}
	}

	/// Grammar name, e.g. `baml`.
	pub fn name(&self) -> &str {
		match self {
			Self::Builtin { name, .. } | Self::Library { name, .. } => name,
		}
	}

	/// Library path for [`GrammarArtifact::Library`].
	pub fn path(&self) -> Option<&Path> {
		match self {
			Self::Builtin { .. } => None,
			Self::Library { path, .. } => Some(path),
		}
	}

	/// Exported symbol name of the language function.
	pub fn symbol(&self) -> String {
		entry_symbol(self.name())
	}
}

impl fmt::Debug for GrammarArtifact {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Builtin { name, .. } => f.debug_struct("Builtin").field("name", name).finish_non_exhaustive(),
			Self::Library { name, path } => f
				.debug_struct("Library")
				.field("name", name)
				.field("path", path)
				.finish(),
		}
	}
}

/// Returns the C symbol a grammar library exports for `name`.
///
/// Dashes are not valid in C identifiers, so `embedded-template` maps to
/// `tree_sitter_embedded_template`.
pub fn entry_symbol(name: &str) -> String {
	format!("tree_sitter_{}", name.replace('-', "_"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_entry_symbol() {
		assert_eq!(entry_symbol("baml"), "tree_sitter_baml");
		assert_eq!(entry_symbol("embedded-template"), "tree_sitter_embedded_template");
	}

	#[test]
	fn test_library_accessors() {
		let artifact = GrammarArtifact::library("baml", "/tmp/libbaml.so");
		assert_eq!(artifact.name(), "baml");
		assert_eq!(artifact.path(), Some(Path::new("/tmp/libbaml.so")));
		assert_eq!(artifact.symbol(), "tree_sitter_baml");
	}

	#[test]
	fn test_debug_omits_function_pointer() {
		unsafe extern "C" fn null_language() -> *const () {
			std::ptr::null()
		}
		let artifact = GrammarArtifact::builtin("baml", unsafe { LanguageFn::from_raw(null_language) });
		assert_eq!(artifact.path(), None);
		assert_eq!(format!("{artifact:?}"), r#"Builtin { name: "baml", .. }"#);
	}
}
