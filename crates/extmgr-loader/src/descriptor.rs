//! Extension descriptors: one per configured extension.

use std::ffi::CString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;

use crate::ffi::safety::{ExitHook, ExtensionName, path_to_c_string};
use crate::module::ModuleHandle;

/// Where a descriptor is in the load sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Registered, not yet processed.
    Unloaded,
    /// Module opened.
    Opened,
    /// Declared prerequisites found among earlier entries.
    DependenciesChecked,
    /// Entry point resolved.
    EntryResolved,
    /// Exit hook lookup done (present or not).
    ExitResolved,
    /// Entry point returned success.
    Initialized,
    /// A step failed.
    Failed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Opened => "opened",
            Self::DependenciesChecked => "dependencies_checked",
            Self::EntryResolved => "entry_resolved",
            Self::ExitResolved => "exit_resolved",
            Self::Initialized => "initialized",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A single configured extension and everything resolved from its module.
#[derive(Debug)]
pub struct ExtensionDescriptor {
    module_path: PathBuf,
    config_path: Option<CString>,
    handle: Option<Box<dyn ModuleHandle>>,
    dependencies: Option<Vec<CString>>,
    name: Option<ExtensionName>,
    exit_hook: Option<ExitHook>,
    state: LifecycleState,
    initialized_at: Option<DateTime<Utc>>,
}

impl ExtensionDescriptor {
    /// Builds a descriptor from registration input.
    ///
    /// The module path must be non-empty; an empty config path means the
    /// extension receives no config file. Neither may contain a NUL byte.
    pub fn new(module_path: &Path, config_path: &Path) -> ExtResult<Self> {
        if module_path.as_os_str().is_empty() {
            return Err(ExtensionError::invalid_argument(
                "extension module path is empty",
            ));
        }
        if path_to_c_string(module_path).is_none() {
            return Err(ExtensionError::invalid_argument(format!(
                "extension module path '{}' contains a NUL byte",
                module_path.display()
            )));
        }

        let config_path = if config_path.as_os_str().is_empty() {
            None
        } else {
            Some(path_to_c_string(config_path).ok_or_else(|| {
                ExtensionError::invalid_argument(format!(
                    "extension config path '{}' contains a NUL byte",
                    config_path.display()
                ))
            })?)
        };

        let mut owned_path = PathBuf::new();
        owned_path
            .as_mut_os_string()
            .try_reserve_exact(module_path.as_os_str().len())
            .map_err(|e| ExtensionError::allocation(format!("module path copy: {e}")))?;
        owned_path.push(module_path);

        Ok(Self {
            module_path: owned_path,
            config_path,
            handle: None,
            dependencies: None,
            name: None,
            exit_hook: None,
            state: LifecycleState::Unloaded,
            initialized_at: None,
        })
    }

    /// Path of the extension module.
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    /// Config path handed to the entry point, if any.
    pub fn config_path(&self) -> Option<&CString> {
        self.config_path.as_ref()
    }

    /// Resolved name; present once dependency validation has run.
    pub fn name(&self) -> Option<&ExtensionName> {
        self.name.as_ref()
    }

    /// Name for log lines: the resolved name, else the module path.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => self.module_path.display().to_string(),
        }
    }

    /// Declared prerequisites; `None` for legacy modules without the symbol.
    pub fn dependencies(&self) -> Option<&[CString]> {
        self.dependencies.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether a module handle is currently held.
    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the module exported an exit hook.
    pub fn has_exit_hook(&self) -> bool {
        self.exit_hook.is_some()
    }

    pub(crate) fn handle(&self) -> Option<&dyn ModuleHandle> {
        self.handle.as_deref()
    }

    pub(crate) fn set_state(&mut self, state: LifecycleState) {
        self.state = state;
    }

    /// Installs a freshly opened module together with what was read from it.
    pub(crate) fn attach(
        &mut self,
        handle: Box<dyn ModuleHandle>,
        name: ExtensionName,
        dependencies: Option<Vec<CString>>,
    ) {
        // Name must be replaced before the previous handle is dropped.
        self.name = Some(name);
        self.dependencies = dependencies;
        self.exit_hook = None;
        self.handle = Some(handle);
        self.state = LifecycleState::Opened;
    }

    pub(crate) fn set_exit_hook(&mut self, hook: Option<ExitHook>) {
        self.exit_hook = hook;
    }

    pub(crate) fn exit_hook(&self) -> Option<ExitHook> {
        self.exit_hook
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.state = LifecycleState::Initialized;
        self.initialized_at = Some(Utc::now());
    }

    /// Gives up the module handle, detaching anything that points into it.
    pub(crate) fn take_handle(&mut self) -> Option<Box<dyn ModuleHandle>> {
        self.name = self.name.take().map(ExtensionName::detach);
        self.exit_hook = None;
        self.handle.take()
    }

    /// Read-only snapshot for reporting.
    pub fn status(&self) -> ExtensionStatus {
        ExtensionStatus {
            module_path: self.module_path.clone(),
            config_path: self
                .config_path
                .as_ref()
                .map(|c| c.to_string_lossy().into_owned()),
            name: self.name.as_ref().map(|n| n.to_string()),
            dependencies: self
                .dependencies
                .as_ref()
                .map(|deps| {
                    deps.iter()
                        .map(|d| d.to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default(),
            state: self.state,
            loaded: self.handle.is_some(),
            has_exit_hook: self.exit_hook.is_some(),
            initialized_at: self.initialized_at,
        }
    }
}

/// Serializable view of a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionStatus {
    /// Module path.
    pub module_path: PathBuf,
    /// Config path, if one was configured.
    pub config_path: Option<String>,
    /// Resolved name, once known.
    pub name: Option<String>,
    /// Declared prerequisite names.
    pub dependencies: Vec<String>,
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Whether the module is currently loaded.
    pub loaded: bool,
    /// Whether an exit hook will run at shutdown.
    pub has_exit_hook: bool,
    /// When the entry point succeeded.
    pub initialized_at: Option<DateTime<Utc>>,
}
