//! Safe view over the arguments the host passes to `fd_ext_init`.

use std::ffi::CStr;
use std::path::Path;

use extmgr_loader::ffi::{ExtensionArgs, SharedContext};

/// What an extension receives at initialization.
#[derive(Debug, Clone, Copy)]
pub struct InitArgs<'a> {
    conffile: Option<&'a CStr>,
    context: SharedContext,
}

impl<'a> InitArgs<'a> {
    /// Builds the view from the raw pointer handed to the entry point.
    ///
    /// # Safety
    /// `args` must be null or point at an `ExtensionArgs` whose `conffile`
    /// is null or a NUL-terminated string, both valid for `'a`.
    pub unsafe fn from_raw(args: *const ExtensionArgs) -> Self {
        // SAFETY: forwarded from the caller's contract.
        let Some(args) = (unsafe { args.as_ref() }) else {
            return Self::default();
        };
        let conffile = if args.conffile.is_null() {
            None
        } else {
            // SAFETY: non-null and NUL-terminated per the caller's contract.
            Some(unsafe { CStr::from_ptr(args.conffile) })
        };
        Self {
            conffile,
            context: SharedContext::from_raw(args.dict),
        }
    }

    /// Builds a view directly, for calling init functions outside the host.
    pub fn new(conffile: Option<&'a CStr>, context: SharedContext) -> Self {
        Self { conffile, context }
    }

    /// The extension's config file path, if one was configured.
    pub fn config_path(&self) -> Option<&'a Path> {
        let conffile = self.conffile?;
        #[cfg(unix)]
        {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;
            Some(Path::new(OsStr::from_bytes(conffile.to_bytes())))
        }
        #[cfg(not(unix))]
        {
            conffile.to_str().ok().map(Path::new)
        }
    }

    /// The raw config path string.
    pub fn config_c_str(&self) -> Option<&'a CStr> {
        self.conffile
    }

    /// Host context pointer, never dereferenced by the host.
    pub fn context(&self) -> SharedContext {
        self.context
    }
}

impl Default for InitArgs<'_> {
    fn default() -> Self {
        Self {
            conffile: None,
            context: SharedContext::null(),
        }
    }
}
