//! Extension loading configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Order in which `terminate()` tears extensions down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownOrder {
    /// Oldest-registered first, the same order they were initialized in.
    #[default]
    Fifo,
    /// Newest-registered first, so dependents go before their prerequisites.
    Reverse,
}

/// Extension loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionsConfig {
    /// Installation root; relative paths below are resolved against it.
    #[serde(default = "default_home")]
    pub home: PathBuf,
    /// INI file holding the `[Extension] ExtensionList` entry.
    #[serde(default = "default_list_file")]
    pub list_file: PathBuf,
    /// Directory containing extension modules and their config files.
    #[serde(default = "default_module_dir")]
    pub module_dir: PathBuf,
    /// File suffix of extension modules.
    #[serde(default = "default_module_suffix")]
    pub module_suffix: String,
    /// File suffix of per-extension config files.
    #[serde(default = "default_config_suffix")]
    pub config_suffix: String,
    /// Resolve all relocations when a module is opened instead of on first use.
    #[serde(default = "default_eager_binding")]
    pub eager_binding: bool,
    /// Close module handles during shutdown. When `false` they are leaked.
    #[serde(default = "default_true")]
    pub unload_modules: bool,
    /// Teardown order used by `terminate()`.
    #[serde(default)]
    pub shutdown_order: ShutdownOrder,
}

impl ExtensionsConfig {
    /// Absolute (or home-relative) path of the extension list file.
    pub fn list_file_path(&self) -> PathBuf {
        self.home.join(&self.list_file)
    }

    /// Absolute (or home-relative) path of the module directory.
    pub fn module_dir_path(&self) -> PathBuf {
        self.home.join(&self.module_dir)
    }
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            list_file: default_list_file(),
            module_dir: default_module_dir(),
            module_suffix: default_module_suffix(),
            config_suffix: default_config_suffix(),
            eager_binding: default_eager_binding(),
            unload_modules: default_true(),
            shutdown_order: ShutdownOrder::default(),
        }
    }
}

fn default_home() -> PathBuf {
    PathBuf::from(".")
}

fn default_list_file() -> PathBuf {
    PathBuf::from("cfg/extensions.cfg")
}

fn default_module_dir() -> PathBuf {
    PathBuf::from("lib/extensions")
}

fn default_module_suffix() -> String {
    "fdx".to_string()
}

fn default_config_suffix() -> String {
    "cfg".to_string()
}

// Debug builds bind eagerly so ABI problems surface at load time.
fn default_eager_binding() -> bool {
    cfg!(debug_assertions)
}

fn default_true() -> bool {
    true
}
