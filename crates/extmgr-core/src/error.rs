//! Unified error type for extension management.
//!
//! Every failure surfaced by registration, loading and configuration maps
//! into [`ExtensionError`]. Each variant also carries an errno-style
//! [`code`](ExtensionError::code) so that hosts which still speak integer
//! status codes can report the failure unchanged.

use std::fmt;
use std::os::raw::c_int;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error kind categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Registration input was unusable.
    InvalidArgument,
    /// A descriptor or one of its owned copies could not be allocated.
    AllocationFailure,
    /// The dynamic loader refused to open a module.
    ModuleLoadFailed,
    /// A declared prerequisite was not configured earlier.
    UnsatisfiedDependency,
    /// The mandatory entry point symbol is absent.
    EntryPointMissing,
    /// The extension rejected the host's major/minor numbers.
    VersionMismatch,
    /// The extension image was already initialized.
    AlreadyInitialized,
    /// The extension's entry point returned its own failure status.
    Initialization,
    /// A configuration error occurred.
    Configuration,
    /// A dry-run check found problems in one or more extensions.
    CheckFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::AllocationFailure => write!(f, "ALLOCATION_FAILURE"),
            Self::ModuleLoadFailed => write!(f, "MODULE_LOAD_FAILED"),
            Self::UnsatisfiedDependency => write!(f, "UNSATISFIED_DEPENDENCY"),
            Self::EntryPointMissing => write!(f, "ENTRY_POINT_MISSING"),
            Self::VersionMismatch => write!(f, "VERSION_MISMATCH"),
            Self::AlreadyInitialized => write!(f, "ALREADY_INITIALIZED"),
            Self::Initialization => write!(f, "INITIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::CheckFailed => write!(f, "CHECK_FAILED"),
        }
    }
}

/// The unified error used throughout extmgr.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Bad registration input (empty module path, interior NUL byte, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Descriptor construction could not allocate.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The platform loader could not open the module.
    #[error("failed to load extension module '{}': {reason}", .path.display())]
    ModuleLoadFailed {
        /// Module path that was being opened.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// A prerequisite named by the module is not configured before it.
    #[error(
        "extension '{extension}' depends on '{dependency}' which was not loaded first, fix the extension order in the configuration"
    )]
    UnsatisfiedDependency {
        /// Name of the extension declaring the dependency.
        extension: String,
        /// The first prerequisite that could not be found.
        dependency: String,
    },

    /// The module does not export the mandatory entry point.
    #[error("extension module '{}' does not export the entry point '{symbol}'", .path.display())]
    EntryPointMissing {
        /// Module path.
        path: PathBuf,
        /// Symbol that was looked up.
        symbol: &'static str,
    },

    /// The extension rejected the host's compatibility version.
    #[error(
        "extension '{extension}' returned status {status} (EINVAL) from initialization, usually a rejection of host version {major}.{minor}"
    )]
    VersionMismatch {
        /// Extension name.
        extension: String,
        /// Host major version that was offered.
        major: c_int,
        /// Host minor version that was offered.
        minor: c_int,
        /// Raw status returned by the entry point.
        status: c_int,
    },

    /// The extension image was already initialized once.
    #[error("extension '{extension}' is already initialized")]
    AlreadyInitialized {
        /// Extension name.
        extension: String,
        /// Raw status returned by the entry point.
        status: c_int,
    },

    /// The extension's own initialization failed with a non-zero status.
    #[error("extension '{extension}' failed to initialize (status {status})")]
    Initialization {
        /// Extension name.
        extension: String,
        /// Raw status returned by the entry point.
        status: c_int,
    },

    /// Configuration could not be read or deserialized.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A dry-run check reported problems. Nothing was initialized.
    #[error("{failed} of {total} extensions failed the check")]
    CheckFailed {
        /// Extensions with a reported problem.
        failed: usize,
        /// Extensions checked.
        total: usize,
    },
}

impl ExtensionError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an allocation-failure error.
    pub fn allocation(message: impl Into<String>) -> Self {
        Self::AllocationFailure(message.into())
    }

    /// Create a module-load error.
    pub fn module_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModuleLoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error without an underlying cause.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Classifies a non-zero status returned by an extension entry point.
    ///
    /// The entry-point guard reports a version mismatch with `EINVAL` and a
    /// repeated initialization with `ENOTSUP`; every other value is the
    /// extension's own failure code.
    pub fn from_init_status(
        extension: impl Into<String>,
        major: c_int,
        minor: c_int,
        status: c_int,
    ) -> Self {
        let extension = extension.into();
        match status {
            libc::EINVAL => Self::VersionMismatch {
                extension,
                major,
                minor,
                status,
            },
            libc::ENOTSUP => Self::AlreadyInitialized { extension, status },
            _ => Self::Initialization { extension, status },
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AllocationFailure(_) => ErrorKind::AllocationFailure,
            Self::ModuleLoadFailed { .. } => ErrorKind::ModuleLoadFailed,
            Self::UnsatisfiedDependency { .. } => ErrorKind::UnsatisfiedDependency,
            Self::EntryPointMissing { .. } => ErrorKind::EntryPointMissing,
            Self::VersionMismatch { .. } => ErrorKind::VersionMismatch,
            Self::AlreadyInitialized { .. } => ErrorKind::AlreadyInitialized,
            Self::Initialization { .. } => ErrorKind::Initialization,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::CheckFailed { .. } => ErrorKind::CheckFailed,
        }
    }

    /// Returns the errno-style code for this error.
    ///
    /// Statuses reported by an extension are returned verbatim.
    pub fn code(&self) -> c_int {
        match self {
            Self::AllocationFailure(_) => libc::ENOMEM,
            Self::VersionMismatch { status, .. }
            | Self::AlreadyInitialized { status, .. }
            | Self::Initialization { status, .. } => *status,
            Self::InvalidArgument(_)
            | Self::ModuleLoadFailed { .. }
            | Self::UnsatisfiedDependency { .. }
            | Self::EntryPointMissing { .. }
            | Self::Configuration { .. }
            | Self::CheckFailed { .. } => libc::EINVAL,
        }
    }
}

impl From<config::ConfigError> for ExtensionError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for ExtensionError {
    fn from(err: std::io::Error) -> Self {
        Self::Configuration {
            message: format!("I/O error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_status_classification() {
        let err = ExtensionError::from_init_status("sample", 1, 2, libc::EINVAL);
        assert_eq!(err.kind(), ErrorKind::VersionMismatch);
        assert_eq!(err.code(), libc::EINVAL);

        let err = ExtensionError::from_init_status("sample", 1, 2, libc::ENOTSUP);
        assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
        assert_eq!(err.code(), libc::ENOTSUP);

        let err = ExtensionError::from_init_status("sample", 1, 2, libc::EACCES);
        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert_eq!(err.code(), libc::EACCES);
    }

    #[test]
    fn test_version_mismatch_message_carries_status() {
        let err = ExtensionError::from_init_status("sample", 1, 2, libc::EINVAL);
        let msg = err.to_string();
        assert!(msg.contains(&format!("status {}", libc::EINVAL)));
        assert!(msg.contains("usually"));
        assert!(msg.contains("1.2"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(ExtensionError::allocation("x").code(), libc::ENOMEM);
        assert_eq!(ExtensionError::invalid_argument("x").code(), libc::EINVAL);
        assert_eq!(
            ExtensionError::module_load("/nope.fdx", "not found").code(),
            libc::EINVAL
        );
    }

    #[test]
    fn test_unsatisfied_dependency_message() {
        let err = ExtensionError::UnsatisfiedDependency {
            extension: "ext2".to_string(),
            dependency: "ext1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'ext2'"));
        assert!(msg.contains("'ext1'"));
        assert_eq!(err.kind().to_string(), "UNSATISFIED_DEPENDENCY");
    }
}
