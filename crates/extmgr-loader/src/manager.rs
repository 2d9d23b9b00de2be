//! Extension manager: load and terminate lifecycle for all extensions.
//!
//! `load()` walks the registry once, in order, and per extension:
//! open → check dependencies → resolve `fd_ext_init` → resolve `fd_ext_fini`
//! → call `fd_ext_init`. The first failure stops the walk; extensions that
//! already initialized stay loaded.
//!
//! `terminate()` drains the registry, runs exit hooks and closes modules.
//! It never fails.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use extmgr_core::config::extension::{ExtensionsConfig, ShutdownOrder};
use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;

use crate::dependency;
use crate::descriptor::{ExtensionStatus, LifecycleState};
use crate::ffi::abi::{
    AbiVersion, ENTRY_SYMBOL, ENTRY_SYMBOL_NAME, EXIT_SYMBOL, ExtensionArgs, SharedContext,
};
use crate::ffi::safety::{EntryPoint, ExitHook, ExtensionName};
use crate::module::{LinkSpace, ModuleHandle, NativeLinkSpace, SymbolBinding};
use crate::registry::ExtensionRegistry;

/// Tunables for the load and terminate sequences.
#[derive(Debug, Clone, Copy)]
pub struct ManagerOptions {
    /// Relocation binding used when opening modules.
    pub binding: SymbolBinding,
    /// Close modules during `terminate()`; when `false` they are leaked.
    pub unload_modules: bool,
    /// Teardown order.
    pub shutdown_order: ShutdownOrder,
    /// Version offered to entry points.
    pub version: AbiVersion,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::from(&ExtensionsConfig::default())
    }
}

impl From<&ExtensionsConfig> for ManagerOptions {
    fn from(config: &ExtensionsConfig) -> Self {
        Self {
            binding: SymbolBinding::from_eager(config.eager_binding),
            unload_modules: config.unload_modules,
            shutdown_order: config.shutdown_order,
            version: AbiVersion::HOST,
        }
    }
}

/// Outcome of a dry-run check for one extension.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Module path.
    pub module_path: PathBuf,
    /// Resolved name, if the module could be opened.
    pub name: Option<String>,
    /// Declared prerequisites.
    pub dependencies: Vec<String>,
    /// Module exports no dependency array.
    pub legacy: bool,
    /// Module exports `fd_ext_fini`.
    pub has_exit_hook: bool,
    /// First problem found, if any.
    pub error: Option<String>,
}

/// Drives registration, loading and teardown of native extensions.
#[derive(Debug)]
pub struct ExtensionManager {
    registry: ExtensionRegistry,
    link_space: Box<dyn LinkSpace>,
    options: ManagerOptions,
    context: SharedContext,
}

impl ExtensionManager {
    /// Creates a manager that opens modules through the platform loader.
    pub fn new(options: ManagerOptions) -> Self {
        Self::with_link_space(Box::new(NativeLinkSpace::new()), options)
    }

    /// Creates a manager over a specific link space.
    pub fn with_link_space(link_space: Box<dyn LinkSpace>, options: ManagerOptions) -> Self {
        Self {
            registry: ExtensionRegistry::new(),
            link_space,
            options,
            context: SharedContext::null(),
        }
    }

    /// Sets the context pointer forwarded to every entry point.
    pub fn with_context(mut self, context: SharedContext) -> Self {
        self.context = context;
        self
    }

    /// Registers an extension. Must be called before `load()`.
    pub fn add(&mut self, module_path: &Path, config_path: &Path) -> ExtResult<()> {
        self.registry.add(module_path, config_path)
    }

    /// The registry.
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// The active options.
    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// Status snapshot of every registered extension.
    pub fn statuses(&self) -> Vec<ExtensionStatus> {
        self.registry.statuses()
    }

    /// Loads and initializes every registered extension, in order.
    ///
    /// Stops at the first failure and returns it. Extensions initialized
    /// before the failure are left loaded. Extensions already initialized
    /// by a previous call are skipped.
    pub fn load(&mut self) -> ExtResult<()> {
        for index in 0..self.registry.len() {
            let Some(descriptor) = self.registry.get(index) else {
                break;
            };
            if descriptor.state() == LifecycleState::Initialized {
                continue;
            }

            if let Err(e) = self.load_one(index) {
                if let Some(descriptor) = self.registry.get_mut(index) {
                    descriptor.set_state(LifecycleState::Failed);
                }
                error!(position = index, error = %e, code = e.code(), "Extension load failed");
                return Err(e);
            }
        }

        info!(count = self.registry.len(), "All extensions loaded");
        Ok(())
    }

    fn load_one(&mut self, index: usize) -> ExtResult<()> {
        let binding = self.options.binding;
        let version = self.options.version;
        let context = self.context;

        let module_path = match self.registry.get(index) {
            Some(descriptor) => descriptor.module_path().to_path_buf(),
            None => return Ok(()),
        };

        info!(module = %module_path.display(), "Loading extension");

        // UNLOADED -> OPENED
        let handle = match self.link_space.open(&module_path, binding) {
            Ok(handle) => handle,
            Err(e) => {
                if binding == SymbolBinding::Eager {
                    self.diagnose_open_failure(index, &module_path);
                }
                return Err(e);
            }
        };

        // OPENED -> DEPENDENCIES_CHECKED
        let declaration = dependency::read_declaration(handle.as_ref(), &module_path);
        let checked = dependency::check_dependencies(
            self.registry
                .earlier_than(index)
                .iter()
                .filter_map(|d| d.name()),
            &declaration,
        );

        let descriptor = self
            .registry
            .get_mut(index)
            .ok_or_else(|| ExtensionError::invalid_argument("registry changed during load"))?;
        descriptor.attach(handle, declaration.name, declaration.dependencies);

        if let Err(e) = checked {
            close_quietly(descriptor.take_handle());
            return Err(e);
        }
        descriptor.set_state(LifecycleState::DependenciesChecked);

        let name = descriptor.display_name();

        // DEPENDENCIES_CHECKED -> ENTRY_RESOLVED
        let Some(entry_address) = descriptor.handle().and_then(|h| h.resolve(ENTRY_SYMBOL)) else {
            close_quietly(descriptor.take_handle());
            return Err(ExtensionError::EntryPointMissing {
                path: module_path,
                symbol: ENTRY_SYMBOL_NAME,
            });
        };
        // SAFETY: `fd_ext_init` has the `EntryFn` signature per the ABI.
        let entry = unsafe { EntryPoint::from_address(entry_address) };
        descriptor.set_state(LifecycleState::EntryResolved);

        // ENTRY_RESOLVED -> EXIT_RESOLVED
        let exit_hook = descriptor
            .handle()
            .and_then(|h| h.resolve(EXIT_SYMBOL))
            // SAFETY: `fd_ext_fini` has the `ExitFn` signature per the ABI.
            .map(|address| unsafe { ExitHook::from_address(address) });
        if exit_hook.is_none() {
            debug!(extension = %name, "Extension has no fd_ext_fini function");
        } else {
            debug!(extension = %name, "Extension fd_ext_fini resolved");
        }
        descriptor.set_exit_hook(exit_hook);
        descriptor.set_state(LifecycleState::ExitResolved);

        // EXIT_RESOLVED -> INITIALIZED
        let mut args = ExtensionArgs {
            conffile: descriptor
                .config_path()
                .map_or(std::ptr::null_mut(), |c| c.as_ptr().cast_mut()),
            dict: context.as_ptr(),
        };
        // SAFETY: the module is held open by the descriptor for the call.
        let status = unsafe { entry.call(version.major, version.minor, &mut args) };
        if status != 0 {
            return Err(ExtensionError::from_init_status(
                name,
                version.major,
                version.minor,
                status,
            ));
        }

        descriptor.mark_initialized();
        info!(
            extension = %name,
            module = %module_path.display(),
            exit_hook = descriptor.has_exit_hook(),
            "Extension initialized"
        );
        Ok(())
    }

    /// Reopens a module that failed eager binding, lazily, only to report
    /// unsatisfied dependencies alongside the loader error.
    fn diagnose_open_failure(&self, index: usize, module_path: &Path) {
        let Ok(handle) = self.link_space.open(module_path, SymbolBinding::Lazy) else {
            return;
        };

        let declaration = dependency::read_declaration(handle.as_ref(), module_path);
        let checked = dependency::check_dependencies(
            self.registry
                .earlier_than(index)
                .iter()
                .filter_map(|d| d.name()),
            &declaration,
        );
        if let Err(e) = checked {
            error!(
                module = %module_path.display(),
                error = %e,
                "In addition, not all declared dependencies are satisfied"
            );
        }

        drop(declaration);
        close_quietly(Some(handle));
    }

    /// Opens every registered module without initializing it, validates its
    /// declaration against the modules before it, and closes them all.
    ///
    /// Problems are reported per extension instead of stopping the run.
    pub fn check(&self) -> Vec<CheckReport> {
        let mut opened: Vec<Box<dyn ModuleHandle>> = Vec::new();
        let mut seen: Vec<ExtensionName> = Vec::new();
        let mut reports = Vec::with_capacity(self.registry.len());

        for descriptor in self.registry.iter() {
            let module_path = descriptor.module_path();
            let mut report = CheckReport {
                module_path: module_path.to_path_buf(),
                name: None,
                dependencies: Vec::new(),
                legacy: false,
                has_exit_hook: false,
                error: None,
            };

            let handle = match self.link_space.open(module_path, self.options.binding) {
                Ok(handle) => handle,
                Err(e) => {
                    report.error = Some(e.to_string());
                    reports.push(report);
                    continue;
                }
            };

            let mut declaration = dependency::read_declaration(handle.as_ref(), module_path);
            declaration.name = declaration.name.detach();

            report.name = Some(declaration.name.to_string());
            report.legacy = declaration.is_legacy();
            report.dependencies = declaration
                .dependencies
                .iter()
                .flatten()
                .map(|d| d.to_string_lossy().into_owned())
                .collect();
            report.has_exit_hook = handle.resolve(EXIT_SYMBOL).is_some();

            if let Err(e) = dependency::check_dependencies(seen.iter(), &declaration) {
                report.error = Some(e.to_string());
            } else if handle.resolve(ENTRY_SYMBOL).is_none() {
                report.error = Some(
                    ExtensionError::EntryPointMissing {
                        path: module_path.to_path_buf(),
                        symbol: ENTRY_SYMBOL_NAME,
                    }
                    .to_string(),
                );
            }

            seen.push(declaration.name);
            opened.push(handle);
            reports.push(report);
        }

        while let Some(handle) = opened.pop() {
            close_quietly(Some(handle));
        }

        reports
    }

    /// Runs exit hooks, closes modules and empties the registry.
    ///
    /// Every step is best effort; this always returns `Ok(())`.
    pub fn terminate(&mut self) -> ExtResult<()> {
        let order = self.options.shutdown_order;
        let unload = self.options.unload_modules;

        for mut descriptor in self.registry.drain(order) {
            let name = descriptor.display_name();

            if let Some(hook) = descriptor.exit_hook() {
                debug!(extension = %name, "Calling fd_ext_fini");
                // SAFETY: the hook is only kept while its module is loaded.
                unsafe { hook.call() };
            }

            if let Some(handle) = descriptor.take_handle() {
                if unload {
                    debug!(extension = %name, "Unloading extension");
                    close_quietly(Some(handle));
                } else {
                    debug!(extension = %name, "Leaving extension module mapped");
                    std::mem::forget(handle);
                }
            }
        }

        info!("All extensions terminated");
        Ok(())
    }
}

impl Drop for ExtensionManager {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            warn!(
                count = self.registry.len(),
                "Extension manager dropped without terminate(), terminating now"
            );
            let _ = self.terminate();
        }
    }
}

fn close_quietly(handle: Option<Box<dyn ModuleHandle>>) {
    let Some(handle) = handle else {
        return;
    };
    let path = handle.path().to_path_buf();
    if let Err(e) = handle.close() {
        warn!(module = %path.display(), error = %e, "Unloading extension failed");
    }
}
