//! Convenience result type alias for extmgr.

use crate::error::ExtensionError;

/// A specialized `Result` type for extension management operations.
pub type ExtResult<T> = Result<T, ExtensionError>;
