//! # extmgr-loader
//!
//! Native extension lifecycle for extmgr:
//!
//! - Ordered extension registry (insertion order is load order)
//! - Dependency validation against earlier-configured extensions
//! - Load sequence: open, check, resolve entry/exit, initialize
//! - Best-effort terminate with exit hooks and module unloading
//! - Dry-run checks without initializing anything

pub mod dependency;
pub mod descriptor;
pub mod ffi;
pub mod manager;
pub mod module;
pub mod registry;

pub use descriptor::{ExtensionDescriptor, ExtensionStatus, LifecycleState};
pub use ffi::{AbiVersion, ExtensionArgs, ExtensionName, SharedContext};
pub use manager::{CheckReport, ExtensionManager, ManagerOptions};
pub use module::{LinkSpace, ModuleHandle, NativeLinkSpace, SymbolBinding};
pub use registry::ExtensionRegistry;
