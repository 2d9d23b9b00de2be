//! FFI boundary: the extension ABI and safe wrappers around it.

pub mod abi;
pub mod safety;

pub use abi::{
    ABI_VERSION_MAJOR, ABI_VERSION_MINOR, AbiVersion, DEPENDS_SYMBOL, DependencyArray, ENTRY_SYMBOL,
    EXIT_SYMBOL, EntryFn, ExitFn, ExtensionArgs, SharedContext,
};
pub use safety::{EntryPoint, ExitHook, ExtensionName, ModuleStr};
