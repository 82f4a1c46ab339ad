#![allow(unused_crate_dependencies)]

use std::fs;

use baml_grammar::{
	GrammarArtifact, GrammarLoadError, LanguageFn, Origin, grammar_library_name, inspect_grammar,
	load_language, validate_grammar_loadable,
};

/// Leading `TSLanguage` fields of a small ABI 14 grammar.
static BAML_TABLES: [u32; 6] = [14, 187, 3, 96, 0, 412];
static FUTURE_TABLES: [u32; 6] = [99, 187, 3, 96, 0, 412];
static EMPTY_TABLES: [u32; 6] = [14, 0, 0, 0, 0, 0];

unsafe extern "C" fn tree_sitter_baml() -> *const () {
	BAML_TABLES.as_ptr().cast()
}

unsafe extern "C" fn tree_sitter_future() -> *const () {
	FUTURE_TABLES.as_ptr().cast()
}

unsafe extern "C" fn tree_sitter_empty() -> *const () {
	EMPTY_TABLES.as_ptr().cast()
}

unsafe extern "C" fn tree_sitter_null() -> *const () {
	std::ptr::null()
}

const BAML: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_baml) };
const FUTURE: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_future) };
const EMPTY: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_empty) };
const NULL: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_null) };

#[test]
fn test_can_load_grammar() {
	let artifact = GrammarArtifact::builtin("baml", BAML);
	validate_grammar_loadable(&artifact).expect("Error loading BAML grammar");
}

#[test]
fn test_validation_is_repeatable() {
	let artifact = GrammarArtifact::builtin("baml", BAML);
	let bad = GrammarArtifact::builtin("baml", NULL);

	for _ in 0..16 {
		assert!(validate_grammar_loadable(&artifact).is_ok());
		assert!(validate_grammar_loadable(&bad).is_err());
	}
}

#[test]
fn test_handles_are_independent() {
	let artifact = GrammarArtifact::builtin("baml", BAML);
	let first = load_language(&artifact).unwrap();
	let second = load_language(&artifact).unwrap();
	drop(first);
	assert_eq!(second.abi_version(), 14);
	assert_eq!(second.as_ptr(), BAML_TABLES.as_ptr().cast());
}

#[test]
fn test_inspect_reports_header() {
	let info = inspect_grammar(&GrammarArtifact::builtin("baml", BAML)).unwrap();
	assert_eq!(info.name, "baml");
	assert_eq!(info.origin, Origin::Builtin);
	assert_eq!(info.abi_version, 14);
	assert_eq!(info.symbol_count, 187);
	assert_eq!(info.token_count, 96);
	assert_eq!(info.state_count, 412);
}

#[test]
fn test_null_language_fails() {
	let err = validate_grammar_loadable(&GrammarArtifact::builtin("baml", NULL)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::NullLanguage { .. }));
	assert_eq!(err.to_string(), "error loading baml grammar: language function returned null");
}

#[test]
fn test_incompatible_abi_fails() {
	let err = validate_grammar_loadable(&GrammarArtifact::builtin("future", FUTURE)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::IncompatibleVersion { found: 99, .. }));
}

#[test]
fn test_structurally_empty_language_fails() {
	let err = validate_grammar_loadable(&GrammarArtifact::builtin("empty", EMPTY)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::Malformed { .. }));
}

#[test]
fn test_missing_library_fails() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join(grammar_library_name("baml"));
	let err = validate_grammar_loadable(&GrammarArtifact::library("baml", &path)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::MissingArtifact { .. }));
}

#[test]
fn test_empty_library_fails() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join(grammar_library_name("baml"));
	fs::write(&path, b"").unwrap();

	let err = validate_grammar_loadable(&GrammarArtifact::library("baml", &path)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::EmptyArtifact { .. }));
	assert!(err.to_string().starts_with("error loading baml grammar"));
}

#[test]
fn test_truncated_library_fails() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join(grammar_library_name("baml"));
	// An ELF magic followed by nothing usable.
	fs::write(&path, b"\x7fELF\x02\x01\x01\0\0\0\0\0").unwrap();

	let err = validate_grammar_loadable(&GrammarArtifact::library("baml", &path)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::Library { .. }), "{err}");
	assert!(err.to_string().starts_with("error loading baml grammar"));
}

#[test]
fn test_corrupted_library_fails() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join(grammar_library_name("baml"));
	let garbage: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
	fs::write(&path, garbage).unwrap();

	let err = validate_grammar_loadable(&GrammarArtifact::library("baml", &path)).unwrap_err();
	assert!(matches!(err, GrammarLoadError::Library { .. }), "{err}");
}
