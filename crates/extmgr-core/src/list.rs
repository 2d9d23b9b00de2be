//! Extension list resolution.
//!
//! Operators name the extensions to load in an INI file:
//!
//! ```ini
//! [Extension]
//! ExtensionList = dict_base, sample
//! ```
//!
//! Each name `n` becomes the pair `(<module_dir>/n.<module_suffix>,
//! <module_dir>/n.<config_suffix>)`, in the order written.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::extension::ExtensionsConfig;
use crate::error::ExtensionError;
use crate::result::ExtResult;

/// One resolved entry of the extension list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionListEntry {
    /// Name as written in the list file.
    pub name: String,
    /// Path to the extension module.
    pub module_path: PathBuf,
    /// Path to the extension's own config file.
    pub config_path: PathBuf,
}

const LIST_SECTION: &str = "Extension";
const LIST_KEY: &str = "ExtensionList";

/// Finds `[Extension] ExtensionList`, matching section and key names
/// ASCII case-insensitively. `None` when either is absent.
fn find_list_value(file: config::Map<String, config::Value>) -> ExtResult<Option<String>> {
    let Some((_, section)) = file
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(LIST_SECTION))
    else {
        return Ok(None);
    };

    let value = section
        .into_table()?
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(LIST_KEY))
        .map(|(_, value)| value.into_string())
        .transpose()?;
    Ok(value)
}

/// Splits a raw `ExtensionList` value into names.
///
/// All whitespace is removed, then the value is split on commas. Empty
/// items are dropped.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    stripped
        .split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Maps extension names to module and config paths under `module_dir`.
pub fn entries_for(
    names: &[String],
    module_dir: &Path,
    module_suffix: &str,
    config_suffix: &str,
) -> Vec<ExtensionListEntry> {
    names
        .iter()
        .map(|name| ExtensionListEntry {
            name: name.clone(),
            module_path: module_dir.join(format!("{name}.{module_suffix}")),
            config_path: module_dir.join(format!("{name}.{config_suffix}")),
        })
        .collect()
}

/// Reads the configured list file and resolves every entry, in order.
pub fn resolve_extension_list(config: &ExtensionsConfig) -> ExtResult<Vec<ExtensionListEntry>> {
    let list_file = config.list_file_path();
    debug!(path = %list_file.display(), "Reading extension list");

    let source = config::Config::builder()
        .add_source(config::File::from(list_file.as_path()).format(config::FileFormat::Ini))
        .build()
        .map_err(|e| {
            ExtensionError::configuration(format!(
                "Failed to read extension list '{}': {e}",
                list_file.display()
            ))
        })?;

    let file: config::Map<String, config::Value> = source.try_deserialize()?;
    let names = match find_list_value(file)? {
        Some(raw) => parse_extension_list(&raw),
        None => {
            warn!(
                path = %list_file.display(),
                "No [{LIST_SECTION}] {LIST_KEY} entry in the extension list, nothing to load"
            );
            Vec::new()
        }
    };
    let entries = entries_for(
        &names,
        &config.module_dir_path(),
        &config.module_suffix,
        &config.config_suffix,
    );

    info!(
        path = %list_file.display(),
        count = entries.len(),
        "Extension list resolved"
    );

    Ok(entries)
}
