//! FFI ABI definitions for extension modules.
//!
//! Defines the C-compatible contract every extension module exports:
//!
//! | Symbol           | Required | Signature                                             |
//! |------------------|----------|-------------------------------------------------------|
//! | `fd_ext_init`    | yes      | `int fd_ext_init(int major, int minor, struct fd_ext_arg *)` |
//! | `fd_ext_fini`    | no       | `void fd_ext_fini(void)`                              |
//! | `fd_ext_depends` | no       | `const char *fd_ext_depends[]`, NULL-terminated       |

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

/// Host ABI major version offered to every entry point.
pub const ABI_VERSION_MAJOR: c_int = 1;

/// Host ABI minor version offered to every entry point.
pub const ABI_VERSION_MINOR: c_int = 2;

/// Name of the mandatory entry point.
pub const ENTRY_SYMBOL_NAME: &str = "fd_ext_init";

/// Entry point symbol, NUL-terminated.
pub const ENTRY_SYMBOL: &CStr = c"fd_ext_init";

/// Optional exit hook symbol, NUL-terminated.
pub const EXIT_SYMBOL: &CStr = c"fd_ext_fini";

/// Optional dependency array symbol, NUL-terminated.
pub const DEPENDS_SYMBOL: &CStr = c"fd_ext_depends";

/// Arguments handed to the entry point (`struct fd_ext_arg`).
#[repr(C)]
#[derive(Debug)]
pub struct ExtensionArgs {
    /// Per-extension config file path, or NULL when none was configured.
    pub conffile: *mut c_char,
    /// Shared host context, forwarded unmodified.
    pub dict: *mut c_void,
}

/// Type signature of the entry point.
pub type EntryFn =
    unsafe extern "C" fn(major: c_int, minor: c_int, args: *mut ExtensionArgs) -> c_int;

/// Type signature of the exit hook.
pub type ExitFn = unsafe extern "C" fn();

/// Host compatibility version passed to entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiVersion {
    /// Major number; extensions reject any other value.
    pub major: c_int,
    /// Minor number; extensions reject any other value.
    pub minor: c_int,
}

impl AbiVersion {
    /// The version this host implements.
    pub const HOST: Self = Self {
        major: ABI_VERSION_MAJOR,
        minor: ABI_VERSION_MINOR,
    };
}

impl Default for AbiVersion {
    fn default() -> Self {
        Self::HOST
    }
}

impl std::fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A static, NULL-terminated array of C strings laid out exactly like
/// `const char *fd_ext_depends[]`.
///
/// Exported by extensions written in Rust; element 0 is the extension's own
/// name, the remaining non-null elements are prerequisite names.
#[repr(transparent)]
pub struct DependencyArray<const N: usize>(pub [*const c_char; N]);

// The pointers reference string literals with static lifetime and are never
// written through.
unsafe impl<const N: usize> Sync for DependencyArray<N> {}

impl<const N: usize> DependencyArray<N> {
    /// Wraps a pointer array. The last element must be null.
    pub const fn new(entries: [*const c_char; N]) -> Self {
        Self(entries)
    }

    /// Address of the first element, as `dlsym` would return it.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.0.as_ptr()
    }
}

/// Opaque context pointer forwarded to every entry point.
///
/// The manager never dereferences it. Lifetime and synchronization of the
/// pointee are the embedding host's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedContext(*mut c_void);

impl SharedContext {
    /// A null context.
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Wraps a raw pointer.
    pub const fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// Returns the raw pointer.
    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

impl Default for SharedContext {
    fn default() -> Self {
        Self::null()
    }
}
