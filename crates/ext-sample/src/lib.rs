//! Sample extension: reads its config file at startup and logs shutdown.
//!
//! Built as `sample.fdx`-compatible `cdylib`; list it as `sample` in the
//! extension list and copy `libsample.so` to `<module_dir>/sample.fdx`.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use extmgr_sdk::prelude::*;

/// Settings read from the extension's own config file.
#[derive(Debug, Default, Deserialize)]
struct SampleConfig {
    #[serde(default)]
    greeting: Option<String>,
}

fn load_config(path: &Path) -> Result<SampleConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(
            config::File::from(path)
                .format(config::FileFormat::Ini)
                .required(false),
        )
        .build()?
        .try_deserialize()
}

// The module carries its own copy of the tracing globals, so it needs its
// own subscriber.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn sample_init(args: &InitArgs<'_>) -> c_int {
    init_logging();

    let Some(path) = args.config_path() else {
        info!("Sample extension initialized without a config file");
        return 0;
    };

    let config = load_config(path).unwrap_or_else(|e| {
        warn!(config = %path.display(), error = %e, "Ignoring unreadable sample config");
        SampleConfig::default()
    });

    info!(
        config = %path.display(),
        greeting = config.greeting.as_deref().unwrap_or("hello"),
        "Sample extension initialized"
    );
    0
}

fn sample_exit() {
    info!("Sample extension shutting down");
}

extension_entry!("sample", sample_init);
extension_exit!(sample_exit);

#[cfg(test)]
mod tests {
    use std::ffi::CString;
    use std::io::Write;

    use extmgr_sdk::SharedContext;

    use super::*;

    #[test]
    fn test_load_config_reads_greeting() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "greeting = bonjour").expect("write");
        let config = load_config(file.path()).expect("config");
        assert_eq!(config.greeting.as_deref(), Some("bonjour"));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/sample.cfg")).expect("config");
        assert!(config.greeting.is_none());
    }

    #[test]
    fn test_init_succeeds_with_and_without_config() {
        assert_eq!(sample_init(&InitArgs::default()), 0);

        let path = CString::new("/nonexistent/sample.cfg").expect("cstring");
        let args = InitArgs::new(Some(path.as_c_str()), SharedContext::null());
        assert_eq!(sample_init(&args), 0);
    }
}
