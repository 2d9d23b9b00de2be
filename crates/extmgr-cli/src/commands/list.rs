//! Extension list CLI command.

use serde::Serialize;
use tabled::Tabled;

use extmgr_core::list::{ExtensionListEntry, resolve_extension_list};
use extmgr_core::result::ExtResult;

use crate::output::{self, OutputFormat};

/// One row of `list` output
#[derive(Debug, Serialize, Tabled)]
pub struct ListRow {
    /// Load position
    #[tabled(rename = "#")]
    pub position: usize,
    /// Name from the list file
    #[tabled(rename = "Name")]
    pub name: String,
    /// Module path
    #[tabled(rename = "Module")]
    pub module: String,
    /// Whether the module file exists
    #[tabled(rename = "Present")]
    pub present: bool,
    /// Config path
    #[tabled(rename = "Config")]
    pub config: String,
}

impl ListRow {
    fn new(position: usize, entry: &ExtensionListEntry) -> Self {
        Self {
            position,
            name: entry.name.clone(),
            module: entry.module_path.display().to_string(),
            present: entry.module_path.exists(),
            config: entry.config_path.display().to_string(),
        }
    }
}

/// Execute the list command
pub fn execute(config_path: &str, env: Option<&str>, format: OutputFormat) -> ExtResult<()> {
    let config = super::load_config(config_path, env)?;
    let entries = resolve_extension_list(&config.extensions)?;
    let rows = rows(&entries);
    output::print_rows(&rows, format, "No extensions configured.");
    Ok(())
}

fn rows(entries: &[ExtensionListEntry]) -> Vec<ListRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| ListRow::new(i + 1, entry))
        .collect()
}
