//! Diagnostic logging.
//!
//! The terminal belongs to the UI, so log lines go to a file (by default
//! `scrollbox.log` in the cache directory).

use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cache::CacheManager;
use crate::config::DebugConfig;

/// Where log lines for this run are written.
pub fn log_path(config: &DebugConfig, app_name: &str) -> Result<PathBuf> {
    match &config.log_file {
        Some(path) => Ok(path.clone()),
        None => Ok(CacheManager::new(app_name)?.log_path()),
    }
}

/// Install the global tracing subscriber. Debug mode logs at DEBUG, otherwise INFO.
pub fn init(config: &DebugConfig, app_name: &str) -> Result<PathBuf> {
    let path = log_path(config, app_name)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let level = if config.enabled {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_prefers_configured_file() {
        let config = DebugConfig {
            enabled: true,
            log_file: Some(PathBuf::from("/tmp/custom.log")),
        };
        assert_eq!(
            log_path(&config, "scrollbox").unwrap(),
            PathBuf::from("/tmp/custom.log")
        );
    }

    #[test]
    fn test_default_log_path_ends_with_log_file() {
        let Ok(path) = log_path(&DebugConfig::default(), "scrollbox") else {
            // no cache directory on this machine
            return;
        };
        assert!(path.ends_with("scrollbox/scrollbox.log"));
    }
}
