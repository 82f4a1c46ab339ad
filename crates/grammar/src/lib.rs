// Grammar checks run inside test harnesses and the CLI; report through tracing.
#![deny(clippy::print_stderr)]

//! Tree-sitter grammar loading and validation.
//!
//! This crate turns a compiled grammar artifact into a [`LanguageHandle`] and
//! checks that the handle is usable before any parser touches it.
//!
//! # Architecture
//!
//! * [`artifact`]: Where an artifact comes from (compiled-in or shared library)
//! * [`handle`]: The loaded, non-null language and the library keeping it alive
//! * [`loader`]: Turning artifacts into handles
//! * [`validate`]: The pass/fail check and grammar summaries
//! * [`paths`]: Locating grammar libraries on disk
//! * [`config`]: `grammars.toml` parsing
//!
//! # Example
//!
//! ```no_run
//! use baml_grammar::{GrammarArtifact, validate_grammar_loadable};
//!
//! let artifact = GrammarArtifact::library("baml", "target/grammars/libbaml.so");
//! validate_grammar_loadable(&artifact).expect("error loading baml grammar");
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod handle;
pub mod loader;
pub mod paths;
pub mod validate;

pub use artifact::GrammarArtifact;
pub use config::{Config, ConfigError, GrammarConfig, load_config};
pub use error::GrammarLoadError;
pub use handle::{ABI_VERSION, LanguageHandle, MIN_COMPATIBLE_ABI_VERSION, Origin};
pub use loader::{load_grammar, load_language, resolve_grammar};
pub use paths::{
	cache_dir, find_grammar_library, grammar_lib_dir, grammar_library_name, grammar_search_paths,
	runtime_dir,
};
pub use tree_sitter_language::LanguageFn;
pub use validate::{GrammarInfo, inspect_grammar, validate_grammar_loadable};
