#![deny(clippy::print_stderr)]

//! Grammar building.
//!
//! Compiles the C sources emitted by `tree-sitter generate` (`src/parser.c`
//! plus an optional external scanner) into a shared library that
//! [`baml_grammar`] can load and validate.

mod compile;

use std::path::PathBuf;

pub use compile::{BuildOutcome, BuildStatus, build_grammar, grammar_src_dir};
use thiserror::Error;

/// Errors that can occur while building a grammar.
#[derive(Debug, Error)]
pub enum GrammarBuildError {
	#[error("no parser.c found in {}", .0.display())]
	NoParserSource(PathBuf),
	#[error("no C compiler available: {0}")]
	CompilerNotFound(String),
	#[error("compilation failed: {0}")]
	Compilation(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Result type for grammar build operations.
pub type Result<T> = std::result::Result<T, GrammarBuildError>;
