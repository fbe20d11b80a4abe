// src/cli/handlers/commons.rs

// Shared setup for every command: find and load the workspace, install the logger
// and bootstrap the session.

use crate::cli::GlobalArgs;
use crate::core::config_loader;
use crate::core::logging::{self, LogSettings};
use crate::core::paths;
use crate::models::LunaConfig;
use crate::state::Session;
use anyhow::{Context, Result};
use colored::Colorize;

/// Loads the workspace config selected by `globals`.
pub fn load_config(globals: &GlobalArgs) -> Result<LunaConfig> {
    let cwd = std::env::current_dir().context("Could not determine the current directory.")?;
    let config_path = config_loader::locate_config(globals.config.as_deref(), &cwd)?;
    let config = config_loader::load_config(&config_path)
        .with_context(|| format!("Failed to load workspace '{}'", config_path.display()))?;
    Ok(config)
}

/// Installs the logger as configured by the workspace. A log file that cannot be
/// opened falls back to terminal-only logging.
pub fn init_logging(config: &LunaConfig) {
    let settings = LogSettings {
        timestamps: config.timestamps,
        log_file: config.log_to_file.then(|| paths::log_file(config)),
    };

    if let Err(e) = logging::init(&settings) {
        eprintln!("{}: {}", "Warning".yellow().bold(), e);
        let fallback = LogSettings {
            log_file: None,
            ..settings
        };
        // A second failure means a logger is already installed.
        let _ = logging::init(&fallback);
    }
}

/// Loads the workspace, installs the logger and bootstraps a session.
pub fn open_session(globals: &GlobalArgs) -> Result<Session> {
    let config = load_config(globals)?;
    init_logging(&config);
    Ok(Session::bootstrap(config))
}

/// `on`/`off` style switches accepted on the command line.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "enable" | "enabled" => Some(true),
        "off" | "false" | "no" | "0" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("disabled"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }
}
