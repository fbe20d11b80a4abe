//! # Build Manifests
//!
//! A `*.build.toml` file declares one artifact: its identity, where it sits in the
//! solution, which project shape it takes, and the options it contributes. Each loaded
//! manifest becomes a [`ManifestBuild`], a [`BuildProvider`] like any compiled-in one.
//!
//! ```toml
//! name = "Core"
//! path = "Engine"
//! template = "standalone-library"
//! feature = "WithCore"
//! files = ["Core.cs", { path = "Shaders/Basic.hlsl", link = "Shaders/Basic.hlsl", tag = "None" }]
//! references = ["Math"]
//!
//! [[options]]
//! name = "WithCore"
//! enabled = true
//! ```

use crate::core::identity;
use crate::core::options::OptionRegistry;
use crate::core::project_tree::{FileRecord, ProjectTreeBuilder};
use crate::core::registry::BuildProvider;
use crate::core::solution::{ArtifactDescription, SolutionContext};
use crate::core::target::GenerationContext;
use crate::models::{BuildManifest, ManifestFile, ManifestOption, ProjectTemplate};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Could not read build manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid build manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Build manifest '{path}' has an invalid guid '{value}': {source}")]
    InvalidGuid {
        path: PathBuf,
        value: String,
        #[source]
        source: uuid::Error,
    },
    #[error("Build manifest '{path}' has no name.")]
    MissingName { path: PathBuf },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// A build provider backed by a manifest file.
#[derive(Debug, Clone)]
pub struct ManifestBuild {
    guid: Uuid,
    source: PathBuf,
    manifest: BuildManifest,
    /// Resolved identities of `manifest.options`, same order.
    option_guids: Vec<Uuid>,
}

/// Reads and validates a manifest file.
pub fn load_manifest(path: &Path) -> ManifestResult<ManifestBuild> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: BuildManifest = toml::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    ManifestBuild::new(manifest, path)
}

fn resolve_guid(path: &Path, declared: Option<&str>, seed: &str) -> ManifestResult<Uuid> {
    match declared {
        Some(text) => identity::parse_guid(text).map_err(|source| ManifestError::InvalidGuid {
            path: path.to_path_buf(),
            value: text.to_string(),
            source,
        }),
        None => Ok(identity::guid_from_name(seed)),
    }
}

impl ManifestBuild {
    /// Manifests without an explicit guid get one derived from their name, so the
    /// identity is stable across runs.
    pub fn new(manifest: BuildManifest, source: &Path) -> ManifestResult<Self> {
        if manifest.name.trim().is_empty() {
            return Err(ManifestError::MissingName {
                path: source.to_path_buf(),
            });
        }

        let guid = resolve_guid(source, manifest.guid.as_deref(), &manifest.name)?;
        let option_guids = manifest
            .options
            .iter()
            .map(|option| {
                let seed = format!("{}.{}", manifest.name, option.name);
                resolve_guid(source, option.guid.as_deref(), &seed)
            })
            .collect::<ManifestResult<Vec<_>>>()?;

        Ok(Self {
            guid,
            source: source.to_path_buf(),
            manifest,
            option_guids,
        })
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn manifest(&self) -> &BuildManifest {
        &self.manifest
    }

    fn options(&self) -> impl Iterator<Item = (&ManifestOption, Uuid)> + '_ {
        self.manifest
            .options
            .iter()
            .zip(self.option_guids.iter().copied())
    }

    fn option_guid_by_name(&self, name: &str) -> Option<Uuid> {
        self.options()
            .find(|(option, _)| option.name.eq_ignore_ascii_case(name))
            .map(|(_, guid)| guid)
    }

    fn feature_enabled(&self, options: &OptionRegistry) -> bool {
        let Some(feature) = self.manifest.feature.as_deref() else {
            return true;
        };

        let found = self
            .option_guid_by_name(feature)
            .and_then(|guid| options.find(guid))
            .or_else(|| options.find_by_path(feature));

        match found {
            Some(option) => option.is_enabled(),
            None => {
                log::warn!(
                    "Build '{}' requires unknown option '{}', skipping.",
                    self.manifest.name,
                    feature
                );
                false
            }
        }
    }

    fn file_records(&self) -> Vec<FileRecord> {
        self.manifest
            .files
            .iter()
            .map(|file| match file {
                ManifestFile::Path(path) => FileRecord::compile(path, link_name(path)),
                ManifestFile::Detailed { path, link, tag } => FileRecord::tagged(
                    path,
                    link.clone().unwrap_or_else(|| link_name(path)),
                    tag.as_deref().unwrap_or("Compile"),
                ),
            })
            .collect()
    }
}

/// File name part of a manifest path, used as the in-project link.
fn link_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl BuildProvider for ManifestBuild {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn configurate(&self, options: &mut OptionRegistry) {
        let category = self.manifest.name.as_str();

        for (option, guid) in self.options() {
            let depends_on = option.depends_on.as_deref().and_then(|name| {
                let resolved = self.option_guid_by_name(name);
                if resolved.is_none() {
                    log::warn!(
                        "Option '{}.{}' depends on unknown option '{}'.",
                        category,
                        option.name,
                        name
                    );
                }
                resolved
            });
            let category = Some(option.category.as_deref().unwrap_or(category));

            let registered = match option.value.as_deref() {
                Some(text) => options.register_value(guid, &option.name, text, category, depends_on),
                None => options.register_flag(
                    guid,
                    &option.name,
                    option.enabled.unwrap_or(true),
                    category,
                    depends_on,
                ),
            };

            if let (Some(registered), Some(description)) = (registered, &option.description) {
                registered.description = description.clone();
            }
        }
    }

    fn generate(
        &self,
        _solution: &SolutionContext,
        ctx: &GenerationContext<'_>,
    ) -> Option<ArtifactDescription> {
        if !self.feature_enabled(ctx.options) {
            return None;
        }

        let mut artifact = ArtifactDescription::new(
            self.guid,
            self.manifest.name.clone(),
            self.manifest.path.clone(),
            self.manifest.kind,
        );
        let conventions = ctx.conventions();
        let files = self.file_records();

        {
            let mut builder = ProjectTreeBuilder::new(&mut artifact.root, &self.source, &conventions);
            match self.manifest.template {
                ProjectTemplate::Library => builder.as_library(),
                ProjectTemplate::StandaloneLibrary => builder.as_standalone_library(),
                ProjectTemplate::Console => builder.as_console_launcher(),
                ProjectTemplate::Plugin => builder.as_plugin(),
                ProjectTemplate::Target => builder.as_target(),
            };

            builder
                .add_properties(
                    self.manifest
                        .properties
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str())),
                )
                .add_files(&files)
                .add_references(&self.manifest.references)
                .add_pre_build_commands(&self.manifest.pre_build)
                .add_post_build_commands(&self.manifest.post_build);
        }

        Some(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionValue;
    use crate::core::platforms::NameList;
    use crate::core::registry::Registry;
    use crate::core::target::tests::test_config;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
name = "Core"
path = "Engine"
template = "console"
feature = "WithCore"
files = ["Core.cs", { path = "Shaders/Basic.hlsl", tag = "None" }]
references = ["Math"]

[properties]
LangVersion = "latest"

[[options]]
name = "WithCore"
description = "Build the core module"

[[options]]
name = "Verbose"
enabled = false
depends_on = "WithCore"

[[options]]
name = "Backend"
category = "Rendering"
value = "Vulkan"
"#;

    fn write_manifest(dir: &Path) -> PathBuf {
        let path = dir.join("core.build.toml");
        fs::write(&path, MANIFEST).unwrap();
        fs::write(dir.join("Core.cs"), "class Core {}").unwrap();
        fs::create_dir_all(dir.join("Shaders")).unwrap();
        fs::write(dir.join("Shaders").join("Basic.hlsl"), "").unwrap();
        path
    }

    #[test]
    fn test_load_manifest_derives_stable_identities() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let path = write_manifest(dir.path());

        // --- Execute ---
        let first = load_manifest(&path).unwrap();
        let second = load_manifest(&path).unwrap();

        // --- Assert ---
        assert_eq!(first.guid(), identity::guid_from_name("Core"));
        assert_eq!(first.guid(), second.guid());
        assert_eq!(first.manifest().options.len(), 3);
    }

    #[test]
    fn test_load_manifest_rejects_bad_guid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.build.toml");
        fs::write(&path, "name = \"Bad\"\nguid = \"not-a-guid\"").unwrap();

        let result = load_manifest(&path);
        assert!(matches!(result, Err(ManifestError::InvalidGuid { .. })));
    }

    #[test]
    fn test_load_manifest_rejects_missing_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.build.toml");
        fs::write(&path, "name = \" \"").unwrap();

        assert!(matches!(load_manifest(&path), Err(ManifestError::MissingName { .. })));
    }

    #[test]
    fn test_configurate_registers_options() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let build = load_manifest(&write_manifest(dir.path())).unwrap();
        let mut options = OptionRegistry::new(dir.path().join("cache"));

        // --- Execute ---
        build.configurate(&mut options);
        options.build_dependency_tree();

        // --- Assert ---
        let with_core = options.find_by_path("Core.WithCore").unwrap();
        assert!(with_core.is_enabled());
        assert_eq!(with_core.description, "Build the core module");

        let verbose = options.find_by_path("Core.Verbose").unwrap();
        assert!(!verbose.is_enabled());
        assert_eq!(verbose.depends_on, Some(with_core.guid));
        assert_eq!(options.dependents(with_core.guid), &[verbose.guid]);

        let backend = options.find_by_path("Rendering.Backend").unwrap();
        assert_eq!(
            backend.value,
            OptionValue::Value {
                text: "Vulkan".to_string()
            }
        );
    }

    #[test]
    fn test_generate_builds_project_tree() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let build = load_manifest(&write_manifest(dir.path())).unwrap();
        let mut options = OptionRegistry::new(dir.path().join("cache"));
        build.configurate(&mut options);
        let registry = Registry::new();
        let platforms = NameList::with_names("platform", ["x64"]);
        let profiles = NameList::with_names("profile", ["Debug"]);
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &platforms,
            profiles: &profiles,
            config: &config,
        };
        let solution = SolutionContext::new("Game", dir.path().join("Game.sln"), Uuid::nil(), platforms.clone(), profiles.clone());

        // --- Execute ---
        let artifact = build.generate(&solution, &ctx).unwrap();

        // --- Assert ---
        assert_eq!(artifact.name, "Core");
        assert_eq!(artifact.relative_path, "Engine");
        let root = &artifact.root;
        assert_eq!(root.attribute("Sdk"), Some("Microsoft.NET.Sdk"));

        let mut leaves = Vec::new();
        root.descendants_named("OutputType", &mut leaves);
        assert_eq!(leaves.first().map(|n| n.value()), Some("Exe"));

        let mut compiled = Vec::new();
        root.descendants_named("Compile", &mut compiled);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled.first().and_then(|n| n.attribute("Link")), Some("Core.cs"));

        let mut none_items = Vec::new();
        root.descendants_named("None", &mut none_items);
        assert_eq!(none_items.len(), 2);

        let mut references = Vec::new();
        root.descendants_named("ProjectReference", &mut references);
        assert_eq!(references.len(), 1);

        let mut lang = Vec::new();
        root.descendants_named("LangVersion", &mut lang);
        assert_eq!(lang.first().map(|n| n.value()), Some("latest"));
    }

    #[test]
    fn test_generate_respects_feature_flag() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let build = load_manifest(&write_manifest(dir.path())).unwrap();
        let mut options = OptionRegistry::new(dir.path().join("cache"));
        build.configurate(&mut options);
        let with_core = options.find_by_path("Core.WithCore").unwrap().guid;
        options.set_enabled(with_core, false);
        let registry = Registry::new();
        let names = NameList::new("platform");
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &names,
            profiles: &names,
            config: &config,
        };
        let solution = SolutionContext::new("Game", dir.path().join("Game.sln"), Uuid::nil(), names.clone(), names.clone());

        // --- Execute & Assert ---
        assert!(build.generate(&solution, &ctx).is_none());
    }
}
