//! Entry point guard shared by every generated `fd_ext_init`.

use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};

use extmgr_loader::ffi::{ABI_VERSION_MAJOR, ABI_VERSION_MINOR, ExtensionArgs};

use crate::args::InitArgs;

/// Runs `init` once per module image, after checking the host version.
///
/// Returns `EINVAL` if `major.minor` differs from the version this SDK was
/// built against, `ENOTSUP` if the image was already initialized, and
/// otherwise whatever `init` returns. The once-flag is set before `init`
/// runs, so a failed initialization is not retried.
///
/// # Safety
/// `args` must satisfy the contract of [`InitArgs::from_raw`].
pub unsafe fn guarded_init<F>(
    name: &str,
    initialized: &AtomicBool,
    major: c_int,
    minor: c_int,
    args: *mut ExtensionArgs,
    init: F,
) -> c_int
where
    F: FnOnce(&InitArgs<'_>) -> c_int,
{
    if major != ABI_VERSION_MAJOR || minor != ABI_VERSION_MINOR {
        tracing::error!(
            extension = name,
            host_major = major,
            host_minor = minor,
            expected_major = ABI_VERSION_MAJOR,
            expected_minor = ABI_VERSION_MINOR,
            "Extension built for a different host version"
        );
        return libc::EINVAL;
    }

    if initialized.swap(true, Ordering::SeqCst) {
        tracing::error!(extension = name, "Extension initialized twice");
        return libc::ENOTSUP;
    }

    // SAFETY: forwarded from the caller's contract.
    let args = unsafe { InitArgs::from_raw(args) };
    init(&args)
}
