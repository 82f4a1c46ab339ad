//! The grammar loadability check.

use serde::Serialize;
use tracing::{debug, warn};

use crate::artifact::GrammarArtifact;
use crate::error::GrammarLoadError;
use crate::handle::{LanguageHandle, Origin};
use crate::loader::load_language;

/// Checks that `artifact` yields a usable language handle.
///
/// The handle is released before this returns, whatever the outcome.
pub fn validate_grammar_loadable(artifact: &GrammarArtifact) -> Result<(), GrammarLoadError> {
	inspect_grammar(artifact).map(|_| ())
}

/// Loads `artifact`, summarizes the language, and releases it.
pub fn inspect_grammar(artifact: &GrammarArtifact) -> Result<GrammarInfo, GrammarLoadError> {
	match load_language(artifact) {
		Ok(handle) => {
			let info = GrammarInfo::from(&handle);
			debug!(
				grammar = %info.name,
				abi = info.abi_version,
				symbols = info.symbol_count,
				states = info.state_count,
				"Grammar loaded"
			);
			Ok(info)
		}
		Err(e) => {
			warn!(grammar = artifact.name(), error = %e, "Grammar failed to load");
			Err(e)
		}
	}
}

/// Summary of a successfully loaded language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarInfo {
	pub name: String,
	pub origin: Origin,
	pub abi_version: u32,
	pub symbol_count: u32,
	pub alias_count: u32,
	pub token_count: u32,
	pub external_token_count: u32,
	pub state_count: u32,
}

impl From<&LanguageHandle> for GrammarInfo {
	fn from(handle: &LanguageHandle) -> Self {
		let header = handle.header();
		Self {
			name: handle.name().to_string(),
			origin: handle.origin().clone(),
			abi_version: header.abi_version,
			symbol_count: header.symbol_count,
			alias_count: header.alias_count,
			token_count: header.token_count,
			external_token_count: header.external_token_count,
			state_count: header.state_count,
		}
	}
}
