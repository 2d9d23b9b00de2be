//! Exercises the symbols generated by `extension_entry!` and `extension_exit!`.

use std::ffi::CStr;
use std::io::Write;
use std::ptr::NonNull;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use extmgr_loader::ffi::ExtensionArgs;
use extmgr_loader::ffi::safety::read_dependency_array;
use extmgr_sdk::prelude::*;
use extmgr_sdk::{ABI_VERSION_MAJOR, ABI_VERSION_MINOR};

static SEEN_CONFIG: Mutex<Option<String>> = Mutex::new(None);
static FINI_CALLS: AtomicUsize = AtomicUsize::new(0);

fn guarded_extension_init(args: &InitArgs<'_>) -> c_int {
    let Some(path) = args.config_path() else {
        return libc::ENOENT;
    };
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    if let Ok(mut seen) = SEEN_CONFIG.lock() {
        *seen = Some(contents);
    }
    0
}

fn guarded_exit() {
    FINI_CALLS.fetch_add(1, Ordering::SeqCst);
}

extension_entry!("guarded", ["base", "util"], guarded_extension_init);
extension_exit!(guarded_exit);

#[test]
fn test_dependency_array_lists_name_then_prerequisites() {
    let array = NonNull::from(&fd_ext_depends).cast();
    let entries = unsafe { read_dependency_array(array) };
    let names: Vec<&CStr> = entries.iter().map(|e| e.as_c_str()).collect();
    assert_eq!(names, vec![c"guarded", c"base", c"util"]);
}

#[test]
fn test_entry_point_guards_version_and_repeat_calls() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "greeting = hello").expect("write config");
    let path = std::ffi::CString::new(file.path().to_string_lossy().into_owned())
        .expect("config path");

    let mut args = ExtensionArgs {
        conffile: path.as_ptr().cast_mut(),
        dict: std::ptr::null_mut(),
    };

    let mismatch = unsafe { fd_ext_init(ABI_VERSION_MAJOR, ABI_VERSION_MINOR + 1, &mut args) };
    assert_eq!(mismatch, libc::EINVAL);

    let first = unsafe { fd_ext_init(ABI_VERSION_MAJOR, ABI_VERSION_MINOR, &mut args) };
    assert_eq!(first, 0);
    let seen = SEEN_CONFIG.lock().expect("lock").clone();
    assert_eq!(seen.as_deref(), Some("greeting = hello\n"));

    let second = unsafe { fd_ext_init(ABI_VERSION_MAJOR, ABI_VERSION_MINOR, &mut args) };
    assert_eq!(second, libc::ENOTSUP);
}

#[test]
fn test_exit_hook_calls_function() {
    let before = FINI_CALLS.load(Ordering::SeqCst);
    fd_ext_fini();
    assert_eq!(FINI_CALLS.load(Ordering::SeqCst), before + 1);
}
