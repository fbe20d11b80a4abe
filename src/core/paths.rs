// src/core/paths.rs

use crate::constants::{CACHE_DIR, CONFIG_FILENAME, LOG_FILENAME};
use crate::models::LunaConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Failed to expand path '{template}': {message}")]
    Expansion { template: String, message: String },
}

pub type PathResult<T> = Result<T, PathError>;

/// Expands home directory (`~`) and environment variables (`$VAR`, `${VAR}`).
pub fn expand_path(template: &str) -> PathResult<PathBuf> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Expands `template` and anchors it at `base` when it is relative. An empty template
/// resolves to `base` itself.
pub fn resolve_path(base: &Path, template: &str) -> PathResult<PathBuf> {
    let expanded = expand_path(template.trim())?;
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };
    Ok(normalize(&joined))
}

/// Drops `.` components and folds `..` into its parent without touching the
/// filesystem, then strips Windows verbatim prefixes.
pub fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    dunce::simplified(&out).to_path_buf()
}

/// Walks up from `start` looking for a `luna.toml`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// `<solution_path>/lunaCache`: options, solution and project caches.
pub fn cache_dir(config: &LunaConfig) -> PathBuf {
    config.solution_path.join(CACHE_DIR)
}

pub fn log_file(config: &LunaConfig) -> PathBuf {
    cache_dir(config).join(LOG_FILENAME)
}
