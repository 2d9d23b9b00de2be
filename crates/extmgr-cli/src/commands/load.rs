//! Trial load CLI command.

use serde::Serialize;
use tabled::Tabled;

use extmgr_core::result::ExtResult;
use extmgr_loader::ExtensionStatus;

use crate::output::{self, OutputFormat, or_dash};

/// One row of `load` output
#[derive(Debug, Serialize, Tabled)]
pub struct StatusRow {
    /// Resolved name
    #[tabled(rename = "Name")]
    pub name: String,
    /// Module path
    #[tabled(rename = "Module")]
    pub module: String,
    /// Lifecycle state
    #[tabled(rename = "State")]
    pub state: String,
    /// Exit hook registered
    #[tabled(rename = "Exit hook")]
    pub exit_hook: bool,
    /// Initialization time
    #[tabled(rename = "Initialized at")]
    pub initialized_at: String,
}

impl From<&ExtensionStatus> for StatusRow {
    fn from(status: &ExtensionStatus) -> Self {
        Self {
            name: or_dash(status.name.as_deref()),
            module: status.module_path.display().to_string(),
            state: status.state.to_string(),
            exit_hook: status.has_exit_hook,
            initialized_at: status
                .initialized_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute the load command: load all, report, terminate.
pub fn execute(config_path: &str, env: Option<&str>, format: OutputFormat) -> ExtResult<()> {
    let config = super::load_config(config_path, env)?;
    let mut manager = super::build_manager(&config)?;

    let loaded = manager.load();
    let statuses = manager.statuses();

    output::print_records(&statuses, format, "No extensions loaded.", |s| StatusRow::from(s));

    manager.terminate()?;
    loaded?;

    output::print_success(&format!(
        "{} loaded and terminated",
        output::extension_count(statuses.len())
    ));
    Ok(())
}
