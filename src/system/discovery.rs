//! # Discovery
//!
//! Finds what a workspace contributes to a session: built-in plugins and targets from
//! an explicit catalog, filtered by the allow-lists in `luna.toml`, and build manifests
//! below the code path. A broken entry is logged and skipped, never fatal.

use crate::constants::BUILD_MANIFEST_SUFFIX;
use crate::core::manifest::{self, ManifestBuild};
use crate::core::project_tree::ProjectConventions;
use crate::core::registry::Registry;
use crate::models::LunaConfig;
use crate::targets::visual_studio::VisualStudioTarget;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Plugin,
    Target,
}

/// A compiled-in extension and the function that registers it.
#[derive(Debug, Clone, Copy)]
pub struct PluginEntry {
    /// Name used in the `plugins` / `targets` allow-lists.
    pub name: &'static str,
    pub kind: PluginKind,
    pub description: &'static str,
    pub register: fn(&mut Registry, &LunaConfig) -> bool,
}

pub const BUILTIN_PLUGINS: &[PluginEntry] = &[PluginEntry {
    name: "project-conventions",
    kind: PluginKind::Plugin,
    description: "SDK, target framework and output paths stamped into every project.",
    register: register_project_conventions,
}];

pub const BUILTIN_TARGETS: &[PluginEntry] = &[PluginEntry {
    name: "visual-studio",
    kind: PluginKind::Target,
    description: "Visual Studio 2022 solution for Windows x64.",
    register: register_visual_studio,
}];

fn register_project_conventions(registry: &mut Registry, config: &LunaConfig) -> bool {
    registry.register_meta::<ProjectConventions>(
        Box::new(ProjectConventions::from_config(config)),
        None,
    )
}

fn register_visual_studio(registry: &mut Registry, _config: &LunaConfig) -> bool {
    registry.register_target(VisualStudioTarget, None)
}

/// Offers every catalog entry admitted by `allow_list` to `callback`.
///
/// `None` admits everything. Names are compared case-insensitively; requested names
/// with no catalog entry are reported. `callback` returns whether the entry was
/// accepted. Returns the number of accepted entries.
pub fn discover_plugins<F>(catalog: &[PluginEntry], allow_list: Option<&[String]>, mut callback: F) -> usize
where
    F: FnMut(&PluginEntry) -> bool,
{
    if let Some(requested) = allow_list {
        for name in requested {
            if !catalog.iter().any(|e| e.name.eq_ignore_ascii_case(name)) {
                log::warn!("Unknown plugin '{}' requested, ignoring.", name);
            }
        }
    }

    let mut accepted = 0;
    for entry in catalog {
        let admitted = allow_list
            .is_none_or(|names| names.iter().any(|n| n.eq_ignore_ascii_case(entry.name)));
        if !admitted {
            log::debug!("Plugin '{}' is not enabled for this workspace.", entry.name);
            continue;
        }

        if callback(entry) {
            accepted += 1;
        } else {
            log::error!("Plugin '{}' could not be registered.", entry.name);
        }
    }
    accepted
}

/// Loads every `*.build.toml` below `code_path`, in path order.
pub fn discover_manifests(code_path: &Path) -> Vec<ManifestBuild> {
    if !code_path.is_dir() {
        log::warn!("Code path '{}' does not exist.", code_path.display());
        return Vec::new();
    }

    let mut builds = Vec::new();
    let walker = WalkDir::new(code_path).sort_by_file_name();

    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let is_manifest = entry.file_type().is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(BUILD_MANIFEST_SUFFIX);
        if !is_manifest {
            continue;
        }

        match manifest::load_manifest(entry.path()) {
            Ok(build) => {
                log::debug!("Found build '{}' at '{}'", build.manifest().name, entry.path().display());
                builds.push(build);
            }
            Err(e) => log::error!("{}", e),
        }
    }

    builds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::tests::test_config;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discover_plugins_honours_allow_list() {
        // --- Setup ---
        let catalog = [BUILTIN_PLUGINS, BUILTIN_TARGETS].concat();
        let allow = vec!["Visual-Studio".to_string(), "missing".to_string()];
        let mut seen = Vec::new();

        // --- Execute ---
        let accepted = discover_plugins(&catalog, Some(allow.as_slice()), |entry| {
            seen.push(entry.name);
            true
        });

        // --- Assert ---
        assert_eq!(accepted, 1);
        assert_eq!(seen, vec!["visual-studio"]);
    }

    #[test]
    fn test_discover_plugins_counts_only_accepted() {
        let accepted = discover_plugins(BUILTIN_TARGETS, None, |_| false);
        assert_eq!(accepted, 0);
    }

    #[test]
    fn test_builtin_entries_register() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let mut registry = Registry::new();

        // --- Execute ---
        let plugins = discover_plugins(BUILTIN_PLUGINS, None, |e| (e.register)(&mut registry, &config));
        let targets = discover_plugins(BUILTIN_TARGETS, None, |e| (e.register)(&mut registry, &config));

        // --- Assert ---
        assert_eq!(plugins + targets, 2);
        assert!(registry.meta::<ProjectConventions>().is_some());
        assert!(registry.target_as::<VisualStudioTarget>().is_some());
    }

    #[test]
    fn test_discover_manifests_skips_broken_files() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let engine = dir.path().join("engine");
        fs::create_dir_all(&engine).unwrap();
        fs::write(engine.join("core.build.toml"), "name = \"Core\"").unwrap();
        fs::write(dir.path().join("app.build.toml"), "name = \"App\"\ntemplate = \"console\"").unwrap();
        fs::write(dir.path().join("broken.build.toml"), "name = ").unwrap();
        fs::write(dir.path().join("notes.toml"), "name = \"Ignored\"").unwrap();

        // --- Execute ---
        let builds = discover_manifests(dir.path());

        // --- Assert ---
        let names: Vec<_> = builds.iter().map(|b| b.manifest().name.as_str()).collect();
        assert_eq!(names, vec!["App", "Core"]);
    }

    #[test]
    fn test_discover_manifests_missing_code_path() {
        let dir = tempdir().unwrap();
        assert!(discover_manifests(&dir.path().join("nope")).is_empty());
    }
}
