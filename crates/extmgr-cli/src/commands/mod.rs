//! CLI command definitions and dispatch.

pub mod check;
pub mod config;
pub mod list;
pub mod load;

use clap::{Parser, Subcommand};

use extmgr_core::config::AppConfig;
use extmgr_core::list::resolve_extension_list;
use extmgr_core::result::ExtResult;
use extmgr_loader::{ExtensionManager, ManagerOptions};

use crate::output::OutputFormat;

/// extmgr: inspect, check and trial-load native extensions
#[derive(Debug, Parser)]
#[command(name = "extmgr-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Configuration overlay name (`config/{env}`)
    #[arg(short, long, env = "EXTMGR_ENV")]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Configuration management
    Config(config::ConfigArgs),
    /// Show the resolved extension list
    List,
    /// Open every extension and validate it without initializing
    Check,
    /// Load every extension, report status, then terminate
    Load,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> ExtResult<()> {
        let env = self.env.as_deref();
        match &self.command {
            Commands::Config(args) => config::execute(args, &self.config, env, self.format).await,
            Commands::List => list::execute(&self.config, env, self.format),
            Commands::Check => check::execute(&self.config, env, self.format),
            Commands::Load => load::execute(&self.config, env, self.format),
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str, env: Option<&str>) -> ExtResult<AppConfig> {
    AppConfig::load(config_path, env)
}

/// Helper: build a manager with every listed extension registered
pub fn build_manager(config: &AppConfig) -> ExtResult<ExtensionManager> {
    let entries = resolve_extension_list(&config.extensions)?;
    let mut manager = ExtensionManager::new(ManagerOptions::from(&config.extensions));
    for entry in &entries {
        manager.add(&entry.module_path, &entry.config_path)?;
    }
    Ok(manager)
}
