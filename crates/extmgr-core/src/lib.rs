//! # extmgr-core
//!
//! Core crate for extmgr. Contains the unified error type, configuration
//! schemas, and the resolver that turns the operator's extension list file
//! into ordered `(module path, config path)` pairs.
//!
//! This crate has **no** internal dependencies on other extmgr crates.

pub mod config;
pub mod error;
pub mod list;
pub mod result;

pub use error::{ErrorKind, ExtensionError};
pub use list::ExtensionListEntry;
pub use result::ExtResult;
