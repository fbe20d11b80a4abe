//! # Config Loader
//!
//! Reads `luna.toml` into a [`WorkspaceConfig`] and resolves it into a [`LunaConfig`]:
//! every path is expanded and anchored at the directory holding the config file, and
//! unset lists fall back to their defaults.

use crate::constants::{CONFIG_ENV_VAR, DEFAULT_PLATFORMS, DEFAULT_PROFILES};
use crate::core::paths::{self, PathError};
use crate::models::{LunaConfig, WorkspaceConfig};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No 'luna.toml' found in '{0}' or any parent directory. Use --config or set LUNA_CONFIG.")]
    NotFound(PathBuf),
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Picks the config file: an explicit path first, then `LUNA_CONFIG`, then the first
/// `luna.toml` found walking up from `start`.
pub fn locate_config(explicit: Option<&Path>, start: &Path) -> ConfigResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(paths::resolve_path(start, &path.to_string_lossy())?);
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        log::debug!("Using config from {}.", CONFIG_ENV_VAR);
        return Ok(paths::resolve_path(start, &path.to_string_lossy())?);
    }
    paths::find_config(start).ok_or_else(|| ConfigError::NotFound(start.to_path_buf()))
}

/// Reads and resolves the config file at `path`.
pub fn load_config(path: &Path) -> ConfigResult<LunaConfig> {
    log::debug!("Loading config from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: WorkspaceConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    resolve_config(raw, path)
}

/// Turns the raw file contents into a [`LunaConfig`].
///
/// Unset paths default to the config directory, except `output_path` which defaults
/// to `<workspace_path>/Binaries`. The name defaults to the config directory's name.
pub fn resolve_config(raw: WorkspaceConfig, config_path: &Path) -> ConfigResult<LunaConfig> {
    let config_path = paths::normalize(config_path);
    let base = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let resolve = |value: &Option<String>| -> ConfigResult<PathBuf> {
        Ok(paths::resolve_path(&base, value.as_deref().unwrap_or_default())?)
    };

    let code_path = resolve(&raw.code_path)?;
    let solution_path = resolve(&raw.solution_path)?;
    let workspace_path = resolve(&raw.workspace_path)?;
    let output_path = match raw.output_path.as_deref() {
        Some(template) => paths::resolve_path(&base, template)?,
        None => workspace_path.join("Binaries"),
    };

    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            base.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Luna".to_string());

    let platforms = or_defaults(raw.platforms, DEFAULT_PLATFORMS);
    let profiles = or_defaults(raw.profiles, DEFAULT_PROFILES);

    Ok(LunaConfig {
        name,
        config_path,
        code_path,
        solution_path,
        workspace_path,
        output_path,
        plugins: raw.plugins,
        targets: raw.targets,
        default_target: raw.default_target,
        platforms,
        profiles,
        pre_generate: raw.pre_generate.filter(|c| !c.trim().is_empty()),
        log_to_file: raw.log_to_file,
        timestamps: raw.timestamps,
    })
}

fn or_defaults(values: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if values.is_empty() {
        defaults.iter().map(|s| (*s).to_string()).collect()
    } else {
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONFIG_FILENAME;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_resolves_paths_and_defaults() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
name = "Game"
code_path = "Code"
solution_path = "Build/../Solution"
plugins = ["visual-studio"]
"#,
        )
        .unwrap();

        // --- Execute ---
        let config = load_config(&config_path).unwrap();

        // --- Assert ---
        let root = paths::normalize(dir.path());
        assert_eq!(config.name, "Game");
        assert_eq!(config.code_path, root.join("Code"));
        assert_eq!(config.solution_path, root.join("Solution"));
        assert_eq!(config.workspace_path, root);
        assert_eq!(config.output_path, root.join("Binaries"));
        assert_eq!(config.platforms, vec!["x64"]);
        assert_eq!(config.profiles, vec!["Debug", "Release"]);
        assert_eq!(config.plugins, Some(vec!["visual-studio".to_string()]));
        assert_eq!(config.targets, None);
        assert!(config.pre_generate.is_none());
    }

    #[test]
    fn test_resolve_config_keeps_explicit_lists() {
        let raw = WorkspaceConfig {
            platforms: vec!["ARM64".to_string()],
            profiles: vec!["Shipping".to_string()],
            pre_generate: Some("   ".to_string()),
            ..WorkspaceConfig::default()
        };

        let config = resolve_config(raw, Path::new("/work/MyGame/luna.toml")).unwrap();

        assert_eq!(config.name, "MyGame");
        assert_eq!(config.platforms, vec!["ARM64"]);
        assert_eq!(config.profiles, vec!["Shipping"]);
        assert!(config.pre_generate.is_none());
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "name = [").unwrap();

        assert!(matches!(load_config(&config_path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_locate_config_prefers_explicit_path() {
        let located = locate_config(Some(Path::new("other/luna.toml")), Path::new("/work")).unwrap();
        assert_eq!(located, PathBuf::from("/work/other/luna.toml"));
    }
}
