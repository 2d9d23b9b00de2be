//! Module handles: opening native modules and resolving their symbols.
//!
//! The [`LinkSpace`] trait is the capability through which the manager
//! opens modules. [`NativeLinkSpace`] opens them with process-wide symbol
//! visibility, so every module opened earlier can satisfy the undefined
//! symbols of modules opened later.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tracing::debug;

use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;

#[cfg(unix)]
use libloading::os::unix::Library as RawLibrary;
#[cfg(not(unix))]
use libloading::Library as RawLibrary;

/// When relocations of a newly opened module are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolBinding {
    /// Bind on first use (`RTLD_LAZY`).
    Lazy,
    /// Bind everything at open time (`RTLD_NOW`).
    Eager,
}

impl SymbolBinding {
    /// Maps the `eager_binding` configuration flag.
    pub fn from_eager(eager: bool) -> Self {
        if eager { Self::Eager } else { Self::Lazy }
    }
}

/// A single opened module.
pub trait ModuleHandle: fmt::Debug {
    /// Path the module was opened from.
    fn path(&self) -> &Path;

    /// Returns the address of an exported symbol, or `None` if absent.
    fn resolve(&self, symbol: &CStr) -> Option<NonNull<c_void>>;

    /// Unloads the module.
    fn close(self: Box<Self>) -> Result<(), String>;
}

/// Capability to open modules into a shared symbol space.
pub trait LinkSpace: fmt::Debug {
    /// Opens the module at `path`.
    fn open(&self, path: &Path, binding: SymbolBinding) -> ExtResult<Box<dyn ModuleHandle>>;
}

/// Opens modules through the platform dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLinkSpace;

impl NativeLinkSpace {
    /// Creates the native link space.
    pub fn new() -> Self {
        Self
    }
}

impl LinkSpace for NativeLinkSpace {
    fn open(&self, path: &Path, binding: SymbolBinding) -> ExtResult<Box<dyn ModuleHandle>> {
        debug!(path = %path.display(), ?binding, "Opening extension module");

        // SAFETY: opening a module runs its initializers. Extension modules
        // are operator-configured and trusted.
        let library = unsafe { open_global(path, binding) }
            .map_err(|e| ExtensionError::module_load(path, e.to_string()))?;

        Ok(Box::new(NativeModule {
            path: path.to_path_buf(),
            library,
        }))
    }
}

#[cfg(unix)]
unsafe fn open_global(path: &Path, binding: SymbolBinding) -> Result<RawLibrary, libloading::Error> {
    use libloading::os::unix::{RTLD_GLOBAL, RTLD_LAZY, RTLD_NOW};

    let flags = match binding {
        SymbolBinding::Lazy => RTLD_LAZY,
        SymbolBinding::Eager => RTLD_NOW,
    };
    unsafe { RawLibrary::open(Some(path), flags | RTLD_GLOBAL) }
}

// Windows resolves cross-module symbols through import libraries, so there
// is no global/lazy distinction to request.
#[cfg(not(unix))]
unsafe fn open_global(path: &Path, _binding: SymbolBinding) -> Result<RawLibrary, libloading::Error> {
    unsafe { RawLibrary::new(path) }
}

/// A module opened by [`NativeLinkSpace`].
pub struct NativeModule {
    path: PathBuf,
    library: RawLibrary,
}

impl ModuleHandle for NativeModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, symbol: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: the symbol is only read as an address here; callers that
        // reinterpret it take responsibility for its type.
        let address = unsafe { self.library.get::<*mut c_void>(symbol.to_bytes_with_nul()) }
            .map(|sym| *sym)
            .ok()?;
        NonNull::new(address)
    }

    fn close(self: Box<Self>) -> Result<(), String> {
        debug!(path = %self.path.display(), "Closing extension module");
        self.library.close().map_err(|e| e.to_string())
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_from_flag() {
        assert_eq!(SymbolBinding::from_eager(true), SymbolBinding::Eager);
        assert_eq!(SymbolBinding::from_eager(false), SymbolBinding::Lazy);
    }

    #[test]
    fn test_open_missing_module_fails() {
        let err = NativeLinkSpace::new()
            .open(Path::new("/nonexistent/ext_missing.fdx"), SymbolBinding::Lazy)
            .expect_err("must fail");
        assert_eq!(err.kind(), extmgr_core::ErrorKind::ModuleLoadFailed);
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_resolve_against_system_libc() {
        let module = NativeLinkSpace::new()
            .open(Path::new("libc.so.6"), SymbolBinding::Lazy)
            .expect("libc must open");
        assert!(module.resolve(c"strlen").is_some());
        assert!(module.resolve(c"fd_ext_init").is_none());
        module.close().expect("close");
    }
}
