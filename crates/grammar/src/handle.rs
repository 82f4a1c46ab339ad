//! Loaded language handles.

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use libloading::Library;
use serde::Serialize;
use tracing::trace;

use crate::error::GrammarLoadError;

/// Newest language ABI the tree-sitter runtime understands.
pub const ABI_VERSION: u32 = 15;

/// Oldest language ABI the tree-sitter runtime still accepts.
pub const MIN_COMPATIBLE_ABI_VERSION: u32 = 13;

/// Leading fields of `TSLanguage`, identical for ABI 13 through 15.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageHeader {
	pub abi_version: u32,
	pub symbol_count: u32,
	pub alias_count: u32,
	pub token_count: u32,
	pub external_token_count: u32,
	pub state_count: u32,
}

/// Where a handle's language tables live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Origin {
	Builtin,
	Library(PathBuf),
}

/// A non-null, ABI-compatible language loaded from an artifact.
///
/// Library-backed handles own their [`Library`]; the language pointer is only
/// valid while the library stays mapped, so dropping the handle unloads both.
pub struct LanguageHandle {
	name: String,
	ptr: NonNull<LanguageHeader>,
	origin: Origin,
	// Must drop after every use of `ptr`.
	library: Option<Library>,
}

impl LanguageHandle {
	/// Wraps the pointer returned by a language function.
	///
	/// # Safety
	///
	/// `raw` must be null or point to a `TSLanguage` that stays valid for as
	/// long as `library` (or the process, for builtin grammars) is loaded.
	pub(crate) unsafe fn from_raw(
		name: &str,
		raw: *const (),
		origin: Origin,
		library: Option<Library>,
	) -> Result<Self, GrammarLoadError> {
		let ptr = NonNull::new(raw.cast_mut().cast::<LanguageHeader>())
			.ok_or_else(|| GrammarLoadError::NullLanguage { name: name.to_string() })?;

		let handle = Self {
			name: name.to_string(),
			ptr,
			origin,
			library,
		};
		handle.check_header()?;
		Ok(handle)
	}

	fn check_header(&self) -> Result<(), GrammarLoadError> {
		let header = self.header();

		if !(MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION).contains(&header.abi_version) {
			return Err(GrammarLoadError::IncompatibleVersion {
				name: self.name.clone(),
				found: header.abi_version,
				min: MIN_COMPATIBLE_ABI_VERSION,
				max: ABI_VERSION,
			});
		}

		let reason = if header.symbol_count == 0 {
			Some("language defines no symbols".to_string())
		} else if header.token_count > header.symbol_count {
			Some(format!(
				"token count {} exceeds symbol count {}",
				header.token_count, header.symbol_count
			))
		} else if header.state_count == 0 {
			Some("language defines no parse states".to_string())
		} else {
			None
		};

		match reason {
			Some(reason) => Err(GrammarLoadError::Malformed {
				name: self.name.clone(),
				reason,
			}),
			None => Ok(()),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn origin(&self) -> &Origin {
		&self.origin
	}

	/// Path of the backing shared library, if any.
	pub fn library_path(&self) -> Option<&Path> {
		match &self.origin {
			Origin::Library(path) => Some(path),
			Origin::Builtin => None,
		}
	}

	/// Whether this handle keeps a shared library mapped.
	pub fn owns_library(&self) -> bool {
		self.library.is_some()
	}

	pub fn header(&self) -> LanguageHeader {
		// SAFETY: `ptr` is non-null and points at a `TSLanguage` kept alive by
		// `library` (or the binary); its leading fields match `LanguageHeader`.
		unsafe { self.ptr.as_ptr().read() }
	}

	pub fn abi_version(&self) -> u32 {
		self.header().abi_version
	}

	/// Raw `const TSLanguage *` for handing to a parsing runtime.
	pub fn as_ptr(&self) -> *const c_void {
		self.ptr.as_ptr().cast_const().cast()
	}
}

impl std::fmt::Debug for LanguageHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LanguageHandle")
			.field("name", &self.name)
			.field("origin", &self.origin)
			.field("abi_version", &self.abi_version())
			.finish_non_exhaustive()
	}
}

impl Drop for LanguageHandle {
	fn drop(&mut self) {
		trace!(grammar = %self.name, unload = self.library.is_some(), "Releasing language handle");
	}
}
