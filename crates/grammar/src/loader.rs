//! Turning grammar artifacts into language handles.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use libloading::{Library, Symbol};
use tracing::debug;

use crate::artifact::{GrammarArtifact, entry_symbol};
use crate::error::GrammarLoadError;
use crate::handle::{LanguageHandle, Origin};
use crate::paths::find_grammar_library;

/// Signature of the `tree_sitter_<name>` entry point.
type LanguageEntry = unsafe extern "C" fn() -> *const ();

/// Loads the language described by `artifact`.
///
/// Every call opens its own library handle; nothing is cached between calls.
pub fn load_language(artifact: &GrammarArtifact) -> Result<LanguageHandle, GrammarLoadError> {
	match artifact {
		GrammarArtifact::Builtin { name, language } => {
			let entry = language.into_raw();
			// SAFETY: `LanguageFn` is only constructible from a tree-sitter
			// language function linked into this binary.
			unsafe { LanguageHandle::from_raw(name, entry(), Origin::Builtin, None) }
		}
		GrammarArtifact::Library { name, path } => load_library(name, path),
	}
}

/// Resolves a grammar name to the first library found in the search paths.
pub fn resolve_grammar(name: &str) -> Result<GrammarArtifact, GrammarLoadError> {
	let path = find_grammar_library(name).ok_or_else(|| GrammarLoadError::NotFound { name: name.to_string() })?;
	debug!(grammar = name, path = %path.display(), "Resolved grammar library");
	Ok(GrammarArtifact::library(name, path))
}

/// Loads a grammar by name from the search paths.
///
/// Returns [`GrammarLoadError::NotFound`] when no search path holds a
/// library for `name`.
pub fn load_grammar(name: &str) -> Result<LanguageHandle, GrammarLoadError> {
	load_language(&resolve_grammar(name)?)
}

fn load_library(name: &str, path: &Path) -> Result<LanguageHandle, GrammarLoadError> {
	let metadata = fs::metadata(path).map_err(|source| match source.kind() {
		ErrorKind::NotFound => GrammarLoadError::MissingArtifact {
			name: name.to_string(),
			path: path.to_path_buf(),
		},
		_ => GrammarLoadError::Io {
			name: name.to_string(),
			path: path.to_path_buf(),
			source,
		},
	})?;

	if metadata.len() == 0 {
		return Err(GrammarLoadError::EmptyArtifact {
			name: name.to_string(),
			path: path.to_path_buf(),
		});
	}

	debug!(grammar = name, path = %path.display(), "Opening grammar library");

	// SAFETY: Loading a tree-sitter grammar runs no initializers beyond what
	// the C toolchain emits for a plain table-only object.
	let library = unsafe { Library::new(path) }.map_err(|source| GrammarLoadError::Library {
		name: name.to_string(),
		path: path.to_path_buf(),
		source,
	})?;

	let symbol = entry_symbol(name);
	// SAFETY: tree-sitter grammars export `const TSLanguage *tree_sitter_<name>(void)`.
	let raw = unsafe {
		let entry: Symbol<LanguageEntry> =
			library
				.get(symbol.as_bytes())
				.map_err(|source| GrammarLoadError::MissingSymbol {
					name: name.to_string(),
					symbol: symbol.clone(),
					source,
				})?;
		entry()
	};

	// SAFETY: `raw` points into `library`, which the handle now owns.
	unsafe { LanguageHandle::from_raw(name, raw, Origin::Library(path.to_path_buf()), Some(library)) }
}
