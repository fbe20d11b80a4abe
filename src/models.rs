// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// --- `luna.toml` MODELS (what is read from the configuration file) ---

/// Raw deserialized form of `luna.toml`. Paths are still unexpanded strings.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub name: Option<String>,
    pub code_path: Option<String>,
    pub solution_path: Option<String>,
    pub workspace_path: Option<String>,
    pub output_path: Option<String>,
    /// Allow-list of plugins to activate. `None` activates every built-in plugin.
    pub plugins: Option<Vec<String>>,
    /// Allow-list of targets to activate. `None` activates every built-in target.
    pub targets: Option<Vec<String>>,
    pub default_target: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Command line run before every generation pass. A failure aborts the pass.
    pub pre_generate: Option<String>,
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default)]
    pub timestamps: bool,
}

/// The fully resolved workspace configuration. All paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunaConfig {
    pub name: String,
    pub config_path: PathBuf,
    pub code_path: PathBuf,
    pub solution_path: PathBuf,
    pub workspace_path: PathBuf,
    pub output_path: PathBuf,
    pub plugins: Option<Vec<String>>,
    pub targets: Option<Vec<String>>,
    pub default_target: Option<String>,
    pub platforms: Vec<String>,
    pub profiles: Vec<String>,
    pub pre_generate: Option<String>,
    pub log_to_file: bool,
    pub timestamps: bool,
}

// --- BUILD MANIFEST MODELS (`*.build.toml`) ---

/// Type classification of an artifact. Selects the project type guid and file
/// extension in the target.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    CSharp,
    Cpp,
}

/// The shape a manifest asks the project tree builder to give its project.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectTemplate {
    #[default]
    Library,
    StandaloneLibrary,
    Console,
    Plugin,
    Target,
}

/// A file entry in a manifest: either a bare path or a detailed record.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ManifestFile {
    Path(String),
    Detailed {
        path: String,
        link: Option<String>,
        tag: Option<String>,
    },
}

/// An option declared by a manifest. `value` makes it a value option, otherwise it
/// is a flag defaulting to `enabled`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestOption {
    pub name: String,
    pub guid: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub value: Option<String>,
    /// Name of another option of the same manifest.
    pub depends_on: Option<String>,
}

/// Deserialized `*.build.toml` file describing one artifact.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildManifest {
    pub name: String,
    pub guid: Option<String>,
    /// Location of the artifact inside the solution, e.g. `Engine\Core`.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub kind: ArtifactKind,
    #[serde(default)]
    pub template: ProjectTemplate,
    /// Name of a flag option that must be enabled for the artifact to be generated.
    pub feature: Option<String>,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub pre_build: Vec<String>,
    #[serde(default)]
    pub post_build: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub options: Vec<ManifestOption>,
}

// --- BINARY CACHE MODELS (bincode + lz4) ---

/// Enabled-state of every flag option, keyed by option identity.
pub type OptionSnapshot = BTreeMap<Uuid, bool>;

/// A `SystemTime` stored as the duration since the Unix epoch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializableSystemTime(Duration);

impl From<SystemTime> for SerializableSystemTime {
    fn from(time: SystemTime) -> Self {
        Self(time.duration_since(UNIX_EPOCH).unwrap_or_default())
    }
}

impl From<SerializableSystemTime> for SystemTime {
    fn from(time: SerializableSystemTime) -> Self {
        UNIX_EPOCH + time.0
    }
}

/// Generation record of one artifact, stored next to its project file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectCache {
    pub project_guid: Uuid,
    pub source_location: PathBuf,
    pub source_modified: Option<SerializableSystemTime>,
    pub options: OptionSnapshot,
}

/// Identity and placement of one artifact as the solution file lists it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolutionEntry {
    pub source_location: PathBuf,
    pub guid: Uuid,
    pub name: String,
    pub relative_path: String,
    pub kind: ArtifactKind,
}

/// Generation record of the solution file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SolutionCache {
    pub solution_guid: Uuid,
    pub artifacts: Vec<SolutionEntry>,
    pub platforms: Vec<String>,
    pub profiles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_accepts_short_and_detailed_files() {
        let text = r#"
            name = "Core"
            path = "Engine"
            kind = "cpp"
            template = "standalone-library"
            files = ["src/a.cpp", { path = "src/b.cpp", link = "b.cpp", tag = "ClCompile" }]

            [[options]]
            name = "Tests"
            enabled = false
        "#;

        let manifest: BuildManifest = toml::from_str(text).unwrap();

        assert_eq!(manifest.kind, ArtifactKind::Cpp);
        assert_eq!(manifest.template, ProjectTemplate::StandaloneLibrary);
        assert_eq!(manifest.files.len(), 2);
        assert!(matches!(&manifest.files[1], ManifestFile::Detailed { tag: Some(t), .. } if t == "ClCompile"));
        assert_eq!(manifest.options[0].enabled, Some(false));
    }

    #[test]
    fn test_serializable_system_time_round_trips_through_system_time() {
        let now = SystemTime::now();
        let stored = SerializableSystemTime::from(now);
        let restored: SystemTime = stored.into();
        assert_eq!(SerializableSystemTime::from(restored), stored);
    }
}
