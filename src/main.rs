//! extmgr extension host
//!
//! Loads the configured native extensions, keeps them running until a
//! shutdown signal arrives, then terminates them.

use tracing_subscriber::{EnvFilter, fmt};

use extmgr_core::config::AppConfig;
use extmgr_core::list::resolve_extension_list;
use extmgr_core::result::ExtResult;
use extmgr_loader::{ExtensionManager, ManagerOptions};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(code = e.code(), "Extension host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> ExtResult<AppConfig> {
    let config_path =
        std::env::var("EXTMGR_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("EXTMGR_ENV").ok();

    AppConfig::load(&config_path, env.as_deref())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Load every listed extension, wait for shutdown, terminate.
async fn run(config: AppConfig) -> ExtResult<()> {
    tracing::info!("Starting extmgr extension host v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Resolve the extension list ───────────────────────
    let entries = resolve_extension_list(&config.extensions)?;

    // ── Step 2: Register extensions in list order ────────────────
    let mut manager = ExtensionManager::new(ManagerOptions::from(&config.extensions));
    for entry in &entries {
        manager.add(&entry.module_path, &entry.config_path)?;
    }

    // ── Step 3: Load and initialize ──────────────────────────────
    if let Err(e) = manager.load() {
        tracing::error!("Extension loading failed, terminating loaded extensions");
        manager.terminate()?;
        return Err(e);
    }
    tracing::info!(count = manager.registry().len(), "Extension host ready");

    // ── Step 4: Wait for shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, terminating extensions...");

    // ── Step 5: Terminate ────────────────────────────────────────
    manager.terminate()?;

    tracing::info!("Extension host shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
