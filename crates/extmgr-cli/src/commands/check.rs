//! Dry-run check CLI command.

use serde::Serialize;
use tabled::Tabled;

use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;
use extmgr_loader::CheckReport;

use crate::output::{self, OutputFormat, joined_or_dash, or_dash};

/// One row of `check` output
#[derive(Debug, Serialize, Tabled)]
pub struct CheckRow {
    /// Module path
    #[tabled(rename = "Module")]
    pub module: String,
    /// Resolved name
    #[tabled(rename = "Name")]
    pub name: String,
    /// Declared prerequisites
    #[tabled(rename = "Depends on")]
    pub dependencies: String,
    /// Exit hook exported
    #[tabled(rename = "Exit hook")]
    pub exit_hook: bool,
    /// Result
    #[tabled(rename = "Result")]
    pub result: String,
}

impl From<&CheckReport> for CheckRow {
    fn from(report: &CheckReport) -> Self {
        let dependencies = if report.legacy {
            "(legacy)".to_string()
        } else {
            joined_or_dash(&report.dependencies)
        };
        Self {
            module: report.module_path.display().to_string(),
            name: or_dash(report.name.as_deref()),
            dependencies,
            exit_hook: report.has_exit_hook,
            result: report.error.clone().unwrap_or_else(|| "ok".to_string()),
        }
    }
}

/// Execute the check command
pub fn execute(config_path: &str, env: Option<&str>, format: OutputFormat) -> ExtResult<()> {
    let config = super::load_config(config_path, env)?;
    let manager = super::build_manager(&config)?;
    let reports = manager.check();

    output::print_records(&reports, format, "No extensions to check.", |r| CheckRow::from(r));

    outcome(&reports)?;
    output::print_success(&format!(
        "{} passed the check",
        output::extension_count(reports.len())
    ));
    Ok(())
}

/// Turns the reports into the command result.
fn outcome(reports: &[CheckReport]) -> ExtResult<()> {
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(ExtensionError::CheckFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}
