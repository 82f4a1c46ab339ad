//! Grammar library search paths.
//!
//! Compiled grammars live in `~/.cache/baml-grammar/grammars/` by default.
//! `BAML_GRAMMAR_RUNTIME` points at an alternative runtime directory, and a
//! workspace `target/grammars/` directory is checked first during development.

use std::path::PathBuf;

/// Environment variable overriding the runtime directory.
pub const RUNTIME_ENV: &str = "BAML_GRAMMAR_RUNTIME";

const APP_DIR: &str = "baml-grammar";

/// Returns the platform-specific library filename for a grammar.
///
/// Dashes become underscores to match the exported `tree_sitter_<name>` symbol.
pub fn grammar_library_name(name: &str) -> String {
	use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};

	format!("{DLL_PREFIX}{}.{DLL_EXTENSION}", name.replace('-', "_"))
}

/// Returns the first existing library for `name` across [`grammar_search_paths`].
pub fn find_grammar_library(name: &str) -> Option<PathBuf> {
	find_in(&grammar_search_paths(), name)
}

pub(crate) fn find_in(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
	let lib_name = grammar_library_name(name);
	dirs.iter().map(|dir| dir.join(&lib_name)).find(|path| path.is_file())
}

/// Returns the runtime directory: `$BAML_GRAMMAR_RUNTIME` or `~/.local/share/baml-grammar/`.
pub fn runtime_dir() -> PathBuf {
	if let Some(runtime) = env_dir(RUNTIME_ENV) {
		return runtime;
	}

	data_local_dir()
		.map(|d| d.join(APP_DIR))
		.unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the cache directory: `$XDG_CACHE_HOME/baml-grammar/` or `~/.cache/baml-grammar/`.
pub fn cache_dir() -> Option<PathBuf> {
	if cfg!(windows) {
		return env_dir("LOCALAPPDATA").map(|p| p.join(APP_DIR).join("cache"));
	}
	xdg_dir("XDG_CACHE_HOME", &[".cache"]).map(|p| p.join(APP_DIR))
}

/// Directory freshly built grammar libraries are written to.
pub fn grammar_lib_dir() -> PathBuf {
	if env_dir(RUNTIME_ENV).is_some() {
		return runtime_dir().join("grammars");
	}
	cache_dir()
		.map(|c| c.join("grammars"))
		.unwrap_or_else(|| runtime_dir().join("grammars"))
}

/// Returns directories to search for compiled grammar libraries, in priority order.
pub fn grammar_search_paths() -> Vec<PathBuf> {
	let mut dirs = Vec::new();

	if let Some(runtime) = env_dir(RUNTIME_ENV) {
		dirs.push(runtime.join("grammars"));
	}

	if let Ok(manifest) = std::env::var("CARGO_MANIFEST_DIR")
		&& let Some(workspace) = PathBuf::from(manifest).ancestors().nth(2)
	{
		dirs.push(workspace.join("target").join("grammars"));
	}

	if let Some(cache) = cache_dir() {
		dirs.push(cache.join("grammars"));
	}

	if let Some(data) = data_local_dir() {
		dirs.push(data.join(APP_DIR).join("grammars"));
	}

	if let Ok(exe_path) = std::env::current_exe()
		&& let Some(exe_dir) = exe_path.parent()
	{
		dirs.push(exe_dir.join("grammars"));
	}

	dirs
}

/// Returns the platform-specific local data directory.
fn data_local_dir() -> Option<PathBuf> {
	if cfg!(windows) {
		return env_dir("LOCALAPPDATA");
	}
	xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}

fn xdg_dir(var: &str, home_relative: &[&str]) -> Option<PathBuf> {
	xdg_dir_with(env_dir, var, home_relative)
}

/// `$var` when set, else `$HOME` joined with `home_relative`.
fn xdg_dir_with(env: impl Fn(&str) -> Option<PathBuf>, var: &str, home_relative: &[&str]) -> Option<PathBuf> {
	env(var).or_else(|| {
		let home = env("HOME")?;
		Some(home_relative.iter().fold(home, |dir, part| dir.join(part)))
	})
}

fn env_dir(var: &str) -> Option<PathBuf> {
	std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	#[test]
	fn test_grammar_library_name() {
		let name = grammar_library_name("baml");
		#[cfg(target_os = "linux")]
		assert_eq!(name, "libbaml.so");
		#[cfg(target_os = "macos")]
		assert_eq!(name, "libbaml.dylib");
		#[cfg(target_os = "windows")]
		assert_eq!(name, "baml.dll");

		assert!(grammar_library_name("embedded-template").contains("embedded_template"));
	}

	#[test]
	fn test_find_in_respects_order() {
		let first = tempfile::tempdir().unwrap();
		let second = tempfile::tempdir().unwrap();
		let lib_name = grammar_library_name("baml");
		fs::write(second.path().join(&lib_name), b"x").unwrap();

		let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
		assert_eq!(find_in(&dirs, "baml"), Some(second.path().join(&lib_name)));

		fs::write(first.path().join(&lib_name), b"x").unwrap();
		assert_eq!(find_in(&dirs, "baml"), Some(first.path().join(&lib_name)));
		assert_eq!(find_in(&dirs, "json"), None);
	}

	#[test]
	fn test_find_in_ignores_directories() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join(grammar_library_name("baml"))).unwrap();
		assert_eq!(find_in(&[dir.path().to_path_buf()], "baml"), None);
	}

	#[test]
	fn test_xdg_dir_prefers_variable_over_home() {
		let env = |var: &str| match var {
			"XDG_CACHE_HOME" => Some(PathBuf::from("/xdg/cache")),
			"HOME" => Some(PathBuf::from("/home/u")),
			_ => None,
		};
		assert_eq!(xdg_dir_with(env, "XDG_CACHE_HOME", &[".cache"]), Some(PathBuf::from("/xdg/cache")));
		assert_eq!(
			xdg_dir_with(env, "XDG_DATA_HOME", &[".local", "share"]),
			Some(PathBuf::from("/home/u/.local/share"))
		);
		assert_eq!(xdg_dir_with(|_| None, "XDG_DATA_HOME", &[".local", "share"]), None);
	}
}
