//! # extmgr-sdk
//!
//! Write extmgr extension modules in Rust. Build the crate as a `cdylib`
//! and export the ABI with:
//!
//! - [`extension_entry!`]: name, prerequisites and the guarded entry point
//! - [`extension_exit!`]: optional exit hook

pub mod args;
pub mod entry;
pub mod macros;
pub mod prelude;

pub use args::InitArgs;
pub use extmgr_loader::ffi::{ABI_VERSION_MAJOR, ABI_VERSION_MINOR, SharedContext};

#[doc(hidden)]
pub mod __private {
    pub use extmgr_loader::ffi::{DependencyArray, ExtensionArgs};
    pub use std::sync::atomic::AtomicBool;
}
