//! In-memory link space and test extensions for lifecycle tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::rc::Rc;

use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;
use extmgr_loader::ffi::{
    ABI_VERSION_MAJOR, ABI_VERSION_MINOR, DEPENDS_SYMBOL, DependencyArray, ENTRY_SYMBOL,
    EXIT_SYMBOL, EntryFn, ExitFn, ExtensionArgs,
};
use extmgr_loader::{ExtensionManager, LinkSpace, ManagerOptions, ModuleHandle, SymbolBinding};

// ---------------------------------------------------------------------------
// Extension-side bookkeeping
// ---------------------------------------------------------------------------

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static INITIALIZED: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
    static FORCED_STATUS: RefCell<HashMap<&'static str, c_int>> = RefCell::new(HashMap::new());
    static LAST_CONTEXT: Cell<usize> = const { Cell::new(0) };
}

/// Clears all extension-side state for the current test thread.
pub fn reset() {
    EVENTS.with(|e| e.borrow_mut().clear());
    INITIALIZED.with(|s| s.borrow_mut().clear());
    FORCED_STATUS.with(|s| s.borrow_mut().clear());
    LAST_CONTEXT.with(|c| c.set(0));
}

/// Events recorded by test extensions, in call order.
pub fn events() -> Vec<String> {
    EVENTS.with(|e| e.borrow().clone())
}

/// Makes the named extension's entry point return `status`.
pub fn force_status(name: &'static str, status: c_int) {
    FORCED_STATUS.with(|s| s.borrow_mut().insert(name, status));
}

/// Context pointer seen by the most recent entry point call.
pub fn last_context() -> usize {
    LAST_CONTEXT.with(Cell::get)
}

fn record(event: String) {
    EVENTS.with(|e| e.borrow_mut().push(event));
}

/// Shared entry point body: version guard, once guard, then record.
pub fn on_init(name: &'static str, major: c_int, minor: c_int, args: *mut ExtensionArgs) -> c_int {
    if major != ABI_VERSION_MAJOR || minor != ABI_VERSION_MINOR {
        return libc::EINVAL;
    }
    if !INITIALIZED.with(|s| s.borrow_mut().insert(name)) {
        return libc::ENOTSUP;
    }

    // SAFETY: the manager passes a valid `ExtensionArgs` for the call.
    let args = unsafe { args.as_ref() };
    let conffile = args
        .and_then(|a| NonNull::new(a.conffile))
        // SAFETY: `conffile` is a NUL-terminated path owned by the descriptor.
        .map(|p| unsafe { CStr::from_ptr(p.as_ptr()) }.to_string_lossy().into_owned())
        .unwrap_or_else(|| "-".to_string());
    LAST_CONTEXT.with(|c| c.set(args.map_or(0, |a| a.dict as usize)));

    record(format!("init:{name}:{conffile}"));
    FORCED_STATUS.with(|s| s.borrow().get(name).copied().unwrap_or(0))
}

/// Shared exit hook body.
pub fn on_fini(name: &'static str) {
    record(format!("fini:{name}"));
}

macro_rules! test_extension {
    ($module:ident, $name:literal) => {
        pub mod $module {
            use std::os::raw::c_int;

            use extmgr_loader::ffi::ExtensionArgs;

            pub extern "C" fn init(major: c_int, minor: c_int, args: *mut ExtensionArgs) -> c_int {
                super::on_init($name, major, minor, args)
            }

            pub extern "C" fn fini() {
                super::on_fini($name)
            }
        }
    };
}

test_extension!(ext1, "ext1");
test_extension!(ext2, "ext2");
test_extension!(ext_a, "a");
test_extension!(ext_b, "b");
test_extension!(ext_c, "c");
test_extension!(ext_foo, "Foo");
test_extension!(ext_bar, "bar");
test_extension!(legacy, "legacy");
test_extension!(needs_legacy, "needs_legacy");
test_extension!(ext_x, "x");

pub static EXT1_DEPENDS: DependencyArray<2> =
    DependencyArray::new([c"ext1".as_ptr(), std::ptr::null()]);
pub static EXT2_DEPENDS: DependencyArray<3> =
    DependencyArray::new([c"ext2".as_ptr(), c"ext1".as_ptr(), std::ptr::null()]);
pub static A_DEPENDS: DependencyArray<2> = DependencyArray::new([c"a".as_ptr(), std::ptr::null()]);
pub static B_DEPENDS: DependencyArray<3> =
    DependencyArray::new([c"b".as_ptr(), c"a".as_ptr(), std::ptr::null()]);
pub static C_DEPENDS: DependencyArray<3> =
    DependencyArray::new([c"c".as_ptr(), c"b".as_ptr(), std::ptr::null()]);
pub static FOO_DEPENDS: DependencyArray<2> =
    DependencyArray::new([c"Foo".as_ptr(), std::ptr::null()]);
pub static BAR_DEPENDS: DependencyArray<3> =
    DependencyArray::new([c"bar".as_ptr(), c"FOO".as_ptr(), std::ptr::null()]);
pub static X_DEPENDS: DependencyArray<3> =
    DependencyArray::new([c"x".as_ptr(), c"x".as_ptr(), std::ptr::null()]);
pub static NEEDS_LEGACY_DEPENDS: DependencyArray<3> = DependencyArray::new([
    c"needs_legacy".as_ptr(),
    c"legacy.fdx".as_ptr(),
    std::ptr::null(),
]);

// ---------------------------------------------------------------------------
// Link space
// ---------------------------------------------------------------------------

/// Symbol table of a fake module.
#[derive(Debug, Clone, Default)]
pub struct Image {
    symbols: Vec<(CString, usize)>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, f: EntryFn) -> Self {
        self.symbols.push((ENTRY_SYMBOL.to_owned(), f as usize));
        self
    }

    pub fn exit(mut self, f: ExitFn) -> Self {
        self.symbols.push((EXIT_SYMBOL.to_owned(), f as usize));
        self
    }

    pub fn depends<const N: usize>(mut self, array: &'static DependencyArray<N>) -> Self {
        self.symbols
            .push((DEPENDS_SYMBOL.to_owned(), array.as_ptr() as usize));
        self
    }
}

#[derive(Debug, Default)]
struct State {
    images: HashMap<PathBuf, Image>,
    opens: Vec<(PathBuf, SymbolBinding)>,
    closes: Vec<PathBuf>,
    fail_eager: HashSet<PathBuf>,
    fail_close: HashSet<PathBuf>,
}

/// Link space serving fake modules from memory.
#[derive(Debug, Clone, Default)]
pub struct MockLinkSpace {
    state: Rc<RefCell<State>>,
}

impl MockLinkSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, path: &str, image: Image) {
        self.state
            .borrow_mut()
            .images
            .insert(PathBuf::from(path), image);
    }

    /// Makes eager opens of `path` fail while lazy opens succeed.
    pub fn fail_eager(&self, path: &str) {
        self.state.borrow_mut().fail_eager.insert(PathBuf::from(path));
    }

    pub fn fail_close(&self, path: &str) {
        self.state.borrow_mut().fail_close.insert(PathBuf::from(path));
    }

    pub fn opens(&self) -> Vec<PathBuf> {
        self.state
            .borrow()
            .opens
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn open_bindings(&self, path: &str) -> Vec<SymbolBinding> {
        self.state
            .borrow()
            .opens
            .iter()
            .filter(|(p, _)| p == Path::new(path))
            .map(|(_, b)| *b)
            .collect()
    }

    pub fn closes(&self) -> Vec<PathBuf> {
        self.state.borrow().closes.clone()
    }
}

impl LinkSpace for MockLinkSpace {
    fn open(&self, path: &Path, binding: SymbolBinding) -> ExtResult<Box<dyn ModuleHandle>> {
        let mut state = self.state.borrow_mut();
        state.opens.push((path.to_path_buf(), binding));

        if binding == SymbolBinding::Eager && state.fail_eager.contains(path) {
            return Err(ExtensionError::module_load(path, "undefined symbol: missing_helper"));
        }
        let Some(image) = state.images.get(path) else {
            return Err(ExtensionError::module_load(
                path,
                "cannot open shared object file: No such file or directory",
            ));
        };

        Ok(Box::new(MockModule {
            path: path.to_path_buf(),
            symbols: image.symbols.clone(),
            state: Rc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct MockModule {
    path: PathBuf,
    symbols: Vec<(CString, usize)>,
    state: Rc<RefCell<State>>,
}

impl ModuleHandle for MockModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, symbol: &CStr) -> Option<NonNull<c_void>> {
        self.symbols
            .iter()
            .find(|(name, _)| name.as_c_str() == symbol)
            .and_then(|(_, address)| NonNull::new(*address as *mut c_void))
    }

    fn close(self: Box<Self>) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        state.closes.push(self.path.clone());
        if state.fail_close.contains(&self.path) {
            return Err(format!("{}: close failed", self.path.display()));
        }
        Ok(())
    }
}

/// Options with lazy binding and the default teardown settings.
pub fn lazy_options() -> ManagerOptions {
    ManagerOptions {
        binding: SymbolBinding::Lazy,
        ..ManagerOptions::default()
    }
}

/// A manager over `link`.
pub fn manager(link: &MockLinkSpace, options: ManagerOptions) -> ExtensionManager {
    ExtensionManager::with_link_space(Box::new(link.clone()), options)
}

/// Registers `name` as `/ext/{name}.fdx` with config `/ext/{name}.cfg`.
pub fn add(manager: &mut ExtensionManager, name: &str) {
    manager
        .add(
            &PathBuf::from(format!("/ext/{name}.fdx")),
            &PathBuf::from(format!("/ext/{name}.cfg")),
        )
        .expect("add extension");
}
