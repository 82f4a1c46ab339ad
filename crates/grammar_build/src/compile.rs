//! Grammar compilation into dynamic libraries.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::SystemTime;

use baml_grammar::{GrammarArtifact, grammar_library_name};
use tracing::{debug, info};

use super::{GrammarBuildError, Result};

/// Status of a build operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
	/// Library was already newer than every source file.
	AlreadyBuilt,
	/// Library was (re)compiled.
	Built,
}

/// Result of a successful [`build_grammar`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
	pub name: String,
	pub status: BuildStatus,
	pub library: PathBuf,
}

impl BuildOutcome {
	/// The built library as a loadable artifact.
	pub fn artifact(&self) -> GrammarArtifact {
		GrammarArtifact::library(&self.name, &self.library)
	}
}

/// Returns the directory holding `parser.c` for a grammar checkout.
///
/// Accepts either the grammar root (with a `src/` subdirectory) or the
/// `src/` directory itself.
pub fn grammar_src_dir(grammar_dir: &Path) -> PathBuf {
	let nested = grammar_dir.join("src");
	if nested.join("parser.c").exists() {
		nested
	} else if grammar_dir.join("parser.c").exists() {
		grammar_dir.to_path_buf()
	} else {
		nested
	}
}

/// Returns the first compiler from `candidates` that executes successfully.
fn find_compiler(candidates: &[&str]) -> Option<String> {
	candidates
		.iter()
		.find(|name| {
			Command::new(name)
				.arg("--version")
				.stdout(Stdio::null())
				.stderr(Stdio::null())
				.status()
				.is_ok()
		})
		.map(|name| name.to_string())
}

/// Resolves C and C++ compilers, preferring `CC`/`CXX` then probing common names.
fn resolve_compilers() -> &'static (Option<String>, Option<String>) {
	static COMPILERS: OnceLock<(Option<String>, Option<String>)> = OnceLock::new();
	COMPILERS.get_or_init(|| {
		#[cfg(windows)]
		const CC_CANDIDATES: &[&str] = &["cl", "clang-cl", "clang", "gcc"];
		#[cfg(windows)]
		const CXX_CANDIDATES: &[&str] = &["cl", "clang-cl", "clang++", "g++"];
		#[cfg(not(windows))]
		const CC_CANDIDATES: &[&str] = &["cc", "clang", "gcc"];
		#[cfg(not(windows))]
		const CXX_CANDIDATES: &[&str] = &["c++", "clang++", "g++"];

		let cc = std::env::var("CC").ok().or_else(|| find_compiler(CC_CANDIDATES));
		let cxx = std::env::var("CXX").ok().or_else(|| find_compiler(CXX_CANDIDATES));
		(cc, cxx)
	})
}

/// Extensions of files whose edits invalidate a built library.
const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "h", "hh", "hpp"];

/// Returns true if any source or header under `src_dir` is newer than the compiled library.
fn needs_recompile(src_dir: &Path, lib_path: &Path) -> bool {
	let Ok(lib_mtime) = fs::metadata(lib_path).and_then(|m| m.modified()) else {
		return true;
	};
	newest_source_mtime(src_dir).is_some_and(|src_mtime| src_mtime > lib_mtime)
}

fn newest_source_mtime(dir: &Path) -> Option<SystemTime> {
	let entries = fs::read_dir(dir).ok()?;
	entries
		.flatten()
		.filter_map(|entry| {
			let path = entry.path();
			let file_type = entry.file_type().ok()?;
			if file_type.is_dir() {
				newest_source_mtime(&path)
			} else if path
				.extension()
				.and_then(|ext| ext.to_str())
				.is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
			{
				entry.metadata().and_then(|m| m.modified()).ok()
			} else {
				None
			}
		})
		.max()
}

/// Compiles a tree-sitter grammar into a dynamic library in `out_dir`.
///
/// 1. Verifies the presence of `parser.c`.
/// 2. Skips work if the library is newer than every source and header.
/// 3. Compiles `parser.c` (and `scanner.c`) as C, `scanner.cc` as C++14.
/// 4. Links the objects into `lib<name>.so` (or the platform equivalent),
///    through the C++ driver when a C++ scanner is present.
///
/// # Errors
///
/// * [`GrammarBuildError::NoParserSource`] if `parser.c` is missing.
/// * [`GrammarBuildError::CompilerNotFound`] if no usable compiler exists.
/// * [`GrammarBuildError::Compilation`] if compiling or linking fails.
pub fn build_grammar(name: &str, grammar_dir: &Path, out_dir: &Path) -> Result<BuildOutcome> {
	let src_dir = grammar_src_dir(grammar_dir);
	if !src_dir.join("parser.c").exists() {
		return Err(GrammarBuildError::NoParserSource(src_dir));
	}

	fs::create_dir_all(out_dir)?;
	let lib_path = out_dir.join(grammar_library_name(name));

	debug!(
		grammar = name,
		lib_path = %lib_path.display(),
		lib_exists = lib_path.exists(),
		"Grammar library path"
	);

	if !needs_recompile(&src_dir, &lib_path) {
		return Ok(BuildOutcome {
			name: name.to_string(),
			status: BuildStatus::AlreadyBuilt,
			library: lib_path,
		});
	}

	info!(grammar = name, lib_path = %lib_path.display(), "Compiling grammar");

	let scanner_cc = src_dir.join("scanner.cc");
	let needs_cxx = scanner_cc.exists();
	let (cc, cxx) = resolve_compilers();
	let c_compiler = cc
		.as_deref()
		.ok_or_else(|| GrammarBuildError::CompilerNotFound("install clang/gcc or set CC".into()))?;
	let cxx_compiler = if needs_cxx {
		Some(cxx.as_deref().ok_or_else(|| {
			GrammarBuildError::CompilerNotFound(format!(
				"C++ compiler required for {name}; install clang++/g++ or set CXX"
			))
		})?)
	} else {
		None
	};

	let obj_dir = out_dir.join("obj").join(name);
	fs::create_dir_all(&obj_dir)?;

	let mut c_sources = vec![src_dir.join("parser.c")];
	let scanner_c = src_dir.join("scanner.c");
	if !needs_cxx && scanner_c.exists() {
		c_sources.push(scanner_c);
	}
	let mut objects = compile_objects(&src_dir, &obj_dir, c_compiler, &c_sources, false)?;

	let linker = match cxx_compiler {
		Some(cxx_compiler) => {
			objects.extend(compile_objects(&src_dir, &obj_dir, cxx_compiler, &[scanner_cc], true)?);
			cxx_compiler
		}
		None => c_compiler,
	};

	run_compiler(link_command(&objects, &lib_path, linker, needs_cxx)?)?;

	if !lib_path.exists() {
		return Err(GrammarBuildError::Compilation(format!(
			"compilation succeeded but library not found at {}",
			lib_path.display()
		)));
	}

	debug!(grammar = name, lib_path = %lib_path.display(), "Successfully compiled grammar");
	Ok(BuildOutcome {
		name: name.to_string(),
		status: BuildStatus::Built,
		library: lib_path,
	})
}

fn target_triple() -> String {
	std::env::var("TARGET").unwrap_or_else(|_| {
		let arch = std::env::consts::ARCH;
		if cfg!(target_os = "windows") {
			format!("{arch}-pc-windows-msvc")
		} else if cfg!(target_os = "macos") {
			format!("{arch}-apple-darwin")
		} else {
			format!("{arch}-unknown-linux-gnu")
		}
	})
}

fn base_build(compiler: &str, cpp: bool) -> cc::Build {
	let target = target_triple();
	let mut build = cc::Build::new();
	build
		.cargo_metadata(false)
		.warnings(false)
		.opt_level(2)
		.debug(false)
		.pic(true)
		.host(&target)
		.target(&target)
		.cpp(cpp)
		.compiler(compiler);
	build
}

/// Compiles `sources` to object files in `obj_dir`, each in its own language.
fn compile_objects(
	src_dir: &Path,
	obj_dir: &Path,
	compiler: &str,
	sources: &[PathBuf],
	cpp: bool,
) -> Result<Vec<PathBuf>> {
	let mut build = base_build(compiler, cpp);
	build.include(src_dir).out_dir(obj_dir).files(sources);
	if cpp {
		build.std("c++14");
	} else {
		build.std("c11");
	}

	build
		.try_compile_intermediates()
		.map_err(|e| GrammarBuildError::Compilation(e.to_string()))
}

/// Builds the invocation linking `objects` into a shared library.
fn link_command(objects: &[PathBuf], lib_path: &Path, linker: &str, cpp: bool) -> Result<Command> {
	let tool = base_build(linker, cpp)
		.try_get_compiler()
		.map_err(|e| GrammarBuildError::CompilerNotFound(e.to_string()))?;

	let mut cmd = tool.to_command();
	if tool.is_like_msvc() {
		cmd.args(["/nologo", "/LD"]).args(objects).arg(format!("/Fe:{}", lib_path.display()));
	} else {
		// The C++ driver pulls in its own runtime when `cpp` is set.
		cmd.arg("-shared").arg("-o").arg(lib_path).args(objects);

		#[cfg(target_os = "linux")]
		cmd.arg("-Wl,-z,relro,-z,now");
	}

	Ok(cmd)
}

fn run_compiler(mut cmd: Command) -> Result<()> {
	let output = cmd.output().map_err(|e| match e.kind() {
		ErrorKind::NotFound => GrammarBuildError::CompilerNotFound(e.to_string()),
		_ => GrammarBuildError::Compilation(e.to_string()),
	})?;

	if output.status.success() {
		Ok(())
	} else {
		Err(GrammarBuildError::Compilation(String::from_utf8_lossy(&output.stderr).into()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn src_dir_prefers_nested_src() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("src")).unwrap();
		fs::write(dir.path().join("src/parser.c"), "").unwrap();
		assert_eq!(grammar_src_dir(dir.path()), dir.path().join("src"));
	}

	#[test]
	fn src_dir_accepts_src_itself() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("parser.c"), "").unwrap();
		assert_eq!(grammar_src_dir(dir.path()), dir.path());
	}

	#[test]
	fn missing_library_needs_recompile() {
		let dir = tempfile::tempdir().unwrap();
		assert!(needs_recompile(dir.path(), &dir.path().join("libmissing.so")));
	}

	fn set_age(path: &Path, secs: u64) {
		let when = SystemTime::now() - std::time::Duration::from_secs(secs);
		fs::File::options().write(true).open(path).unwrap().set_modified(when).unwrap();
	}

	#[test]
	fn fresh_library_skips_recompile() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("parser.c"), "").unwrap();
		let lib = dir.path().join("libx.so");
		fs::write(&lib, "").unwrap();
		set_age(&dir.path().join("parser.c"), 60);

		assert!(!needs_recompile(dir.path(), &lib));
	}

	#[test]
	fn edited_header_forces_recompile() {
		let dir = tempfile::tempdir().unwrap();
		let out = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("tree_sitter")).unwrap();
		fs::write(dir.path().join("parser.c"), "").unwrap();
		fs::write(dir.path().join("tree_sitter/parser.h"), "").unwrap();
		let lib = out.path().join("libx.so");
		fs::write(&lib, "").unwrap();

		set_age(&dir.path().join("parser.c"), 120);
		set_age(&dir.path().join("tree_sitter/parser.h"), 120);
		set_age(&lib, 60);
		assert!(!needs_recompile(dir.path(), &lib));

		set_age(&dir.path().join("tree_sitter/parser.h"), 0);
		assert!(needs_recompile(dir.path(), &lib));
	}

	#[test]
	fn unrelated_files_do_not_force_recompile() {
		let dir = tempfile::tempdir().unwrap();
		let out = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("parser.c"), "").unwrap();
		fs::write(dir.path().join("node-types.json"), "[]").unwrap();
		let lib = out.path().join("libx.so");
		fs::write(&lib, "").unwrap();

		set_age(&dir.path().join("parser.c"), 120);
		set_age(&lib, 60);
		assert!(!needs_recompile(dir.path(), &lib));
	}

	#[test]
	fn missing_parser_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let out = tempfile::tempdir().unwrap();
		let err = build_grammar("baml", dir.path(), out.path()).unwrap_err();
		assert!(matches!(err, GrammarBuildError::NoParserSource(path) if path == dir.path().join("src")));
	}
}
