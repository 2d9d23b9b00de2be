//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    env: Option<&str>,
    format: OutputFormat,
) -> ExtResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path, env)?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => {
            let config = super::load_config(config_path, env)?;
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            let ext = &config.extensions;
            output::print_kv("Log level", &config.logging.level);
            output::print_kv("List file", &ext.list_file_path().display().to_string());
            output::print_kv("Module dir", &ext.module_dir_path().display().to_string());
            output::print_kv("Eager binding", &ext.eager_binding.to_string());
            output::print_kv("Unload modules", &ext.unload_modules.to_string());
            output::print_kv("Shutdown order", &format!("{:?}", ext.shutdown_order));
            if !ext.list_file_path().exists() {
                output::print_warning("Extension list file does not exist");
            }
        }
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ExtensionError::configuration(format!("Failed to create dir: {e}"))
                })?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| ExtensionError::configuration(format!("Failed to write config: {e}")))?;

            output::print_success(&format!("Default config written to '{out_path}'"));
        }
    }

    Ok(())
}
