//! FFI safety wrappers: typed views over raw symbol addresses and module
//! owned strings.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr::NonNull;

use super::abi::{EntryFn, ExitFn, ExtensionArgs};

/// A NUL-terminated string living inside a loaded module image.
///
/// Only valid while the module that owns it stays loaded. Descriptors
/// detach these into owned copies before their module is closed.
#[derive(Clone, Copy)]
pub struct ModuleStr(NonNull<c_char>);

impl ModuleStr {
    /// Wraps a pointer into module memory.
    ///
    /// # Safety
    /// `ptr` must point at a NUL-terminated string that stays valid for as
    /// long as the returned value is used.
    pub unsafe fn from_ptr(ptr: NonNull<c_char>) -> Self {
        Self(ptr)
    }

    /// Borrows the string.
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: validity is guaranteed by the `from_ptr` contract.
        unsafe { CStr::from_ptr(self.0.as_ptr()) }
    }
}

impl fmt::Debug for ModuleStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_c_str(), f)
    }
}

/// Effective identity of an extension.
///
/// `Borrowed` points at element 0 of the module's dependency array and is
/// never freed by the host. `Owned` is derived from the module path and is
/// released with the descriptor.
#[derive(Debug, Clone)]
pub enum ExtensionName {
    /// View into module memory.
    Borrowed(ModuleStr),
    /// Independently allocated name.
    Owned(CString),
}

impl ExtensionName {
    /// Derives a name from the final component of a module path.
    pub fn from_path(path: &Path) -> Self {
        let base = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        // File names cannot contain NUL on any supported platform.
        Self::Owned(CString::new(base).unwrap_or_default())
    }

    /// Raw name bytes, without the terminating NUL.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Borrowed(s) => s.as_c_str().to_bytes(),
            Self::Owned(s) => s.as_bytes(),
        }
    }

    /// ASCII case-insensitive comparison, like `strcasecmp`.
    pub fn matches(&self, other: &[u8]) -> bool {
        self.as_bytes().eq_ignore_ascii_case(other)
    }

    /// Whether the name points into module memory.
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Self::Borrowed(_))
    }

    /// Copies a borrowed name out of module memory.
    pub fn detach(self) -> Self {
        match self {
            Self::Borrowed(s) => Self::Owned(s.as_c_str().to_owned()),
            owned => owned,
        }
    }

    /// Lossy UTF-8 rendering for logs and reports.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl fmt::Display for ExtensionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// Reads a NULL-terminated `const char *[]` exported by a module.
///
/// # Safety
/// `array` must be the address of such an array inside a loaded module, and
/// every element must stay valid while the module is loaded.
pub unsafe fn read_dependency_array(array: NonNull<c_void>) -> Vec<ModuleStr> {
    let mut cursor = array.as_ptr() as *const *const c_char;
    let mut entries = Vec::new();
    loop {
        // SAFETY: the array is NULL-terminated per the caller's contract.
        let entry = unsafe { *cursor };
        let Some(entry) = NonNull::new(entry as *mut c_char) else {
            break;
        };
        // SAFETY: forwarded from the caller's contract.
        entries.push(unsafe { ModuleStr::from_ptr(entry) });
        cursor = unsafe { cursor.add(1) };
    }
    entries
}

/// Typed handle to a resolved `fd_ext_init`.
#[derive(Clone, Copy)]
pub struct EntryPoint(EntryFn);

impl EntryPoint {
    /// Reinterprets a symbol address as the entry point.
    ///
    /// # Safety
    /// `address` must be a function with the [`EntryFn`] signature.
    pub unsafe fn from_address(address: NonNull<c_void>) -> Self {
        // SAFETY: function and data pointers share a representation on every
        // platform the dynamic loader supports.
        Self(unsafe { std::mem::transmute::<*mut c_void, EntryFn>(address.as_ptr()) })
    }

    /// Invokes the entry point.
    ///
    /// # Safety
    /// The module owning the function must still be loaded.
    pub unsafe fn call(&self, major: c_int, minor: c_int, args: &mut ExtensionArgs) -> c_int {
        unsafe { (self.0)(major, minor, args) }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntryPoint").field(&(self.0 as *const ())).finish()
    }
}

/// Typed handle to a resolved `fd_ext_fini`.
#[derive(Clone, Copy)]
pub struct ExitHook(ExitFn);

impl ExitHook {
    /// Reinterprets a symbol address as the exit hook.
    ///
    /// # Safety
    /// `address` must be a function with the [`ExitFn`] signature.
    pub unsafe fn from_address(address: NonNull<c_void>) -> Self {
        // SAFETY: see `EntryPoint::from_address`.
        Self(unsafe { std::mem::transmute::<*mut c_void, ExitFn>(address.as_ptr()) })
    }

    /// Invokes the exit hook.
    ///
    /// # Safety
    /// The module owning the function must still be loaded.
    pub unsafe fn call(&self) {
        unsafe { (self.0)() }
    }
}

impl fmt::Debug for ExitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExitHook").field(&(self.0 as *const ())).finish()
    }
}

/// Converts a path into a C string for the extension ABI.
///
/// Returns `None` if the path contains a NUL byte.
pub fn path_to_c_string(path: &Path) -> Option<CString> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        CString::new(path.as_os_str().as_bytes()).ok()
    }
    #[cfg(not(unix))]
    {
        CString::new(path.to_string_lossy().into_owned()).ok()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::ffi::abi::DependencyArray;

    static DEPS: DependencyArray<3> =
        DependencyArray::new([c"ext2".as_ptr(), c"ext1".as_ptr(), std::ptr::null()]);

    #[test]
    fn test_read_dependency_array() {
        let address = NonNull::new(DEPS.as_ptr() as *mut c_void).expect("non-null");
        let entries = unsafe { read_dependency_array(address) };
        let names: Vec<&[u8]> = entries.iter().map(|s| s.as_c_str().to_bytes()).collect();
        assert_eq!(names, vec![b"ext2".as_slice(), b"ext1".as_slice()]);
    }

    #[test]
    fn test_name_from_path_uses_final_component() {
        let name = ExtensionName::from_path(&PathBuf::from("/opt/lib/extensions/acl_wl.fdx"));
        assert_eq!(name.to_string(), "acl_wl.fdx");
        assert!(!name.is_borrowed());
    }

    #[test]
    fn test_name_matches_case_insensitively() {
        let name = ExtensionName::Owned(CString::new("Foo").expect("cstring"));
        assert!(name.matches(b"FOO"));
        assert!(name.matches(b"foo"));
        assert!(!name.matches(b"foobar"));
    }

    #[test]
    fn test_detach_copies_borrowed_name() {
        let address = NonNull::new(DEPS.as_ptr() as *mut c_void).expect("non-null");
        let first = unsafe { read_dependency_array(address) }[0];
        let name = ExtensionName::Borrowed(first);
        assert!(name.is_borrowed());

        let detached = name.detach();
        assert!(!detached.is_borrowed());
        assert_eq!(detached.as_bytes(), b"ext2");
    }

    #[test]
    fn test_path_to_c_string() {
        let c = path_to_c_string(Path::new("/etc/ext1.cfg")).expect("cstring");
        assert_eq!(c.as_bytes(), b"/etc/ext1.cfg");
    }
}
