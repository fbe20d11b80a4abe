//! # Solution Assembler
//!
//! A [`SolutionContext`] collects the artifacts produced during one generation pass,
//! keyed by the build script that declared them, and writes them out:
//!
//! 1. every stale artifact is rendered and written (up-to-date ones are skipped),
//! 2. the solution's structural record is compared against the current artifact set,
//!    platforms and profiles,
//! 3. if that differs, the folder hierarchy and the profile × platform matrix are
//!    synthesized from the full artifact set and the solution file is written.
//!
//! The concrete text of both files comes from a [`SolutionSerializer`].

use crate::core::cache;
use crate::core::generation_cache::{GenerationCache, StaleReason, Staleness};
use crate::core::identity;
use crate::core::logging::LogScope;
use crate::core::options::OptionRegistry;
use crate::core::platforms::NameList;
use crate::core::project_tree::ProjectTreeNode;
use crate::models::{ArtifactKind, SolutionEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// One generatable output unit (a project).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescription {
    pub guid: Uuid,
    pub name: String,
    /// Location inside the solution, `\` or `/` separated. May be empty.
    pub relative_path: String,
    pub kind: ArtifactKind,
    pub root: ProjectTreeNode,
}

impl ArtifactDescription {
    /// An artifact with an empty `Project` root.
    pub fn new(
        guid: Uuid,
        name: impl Into<String>,
        relative_path: impl Into<String>,
        kind: ArtifactKind,
    ) -> Self {
        Self {
            guid,
            name: name.into(),
            relative_path: relative_path.into(),
            kind,
            root: ProjectTreeNode::new("Project"),
        }
    }

    /// Non-empty segments of the relative path.
    pub fn path_segments(&self) -> Vec<&str> {
        self.relative_path
            .split(['\\', '/'])
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Directory of the artifact relative to the solution: `<segments>/<name>`.
    pub fn directory(&self) -> PathBuf {
        let mut dir: PathBuf = self.path_segments().into_iter().collect();
        dir.push(&self.name);
        dir
    }
}

/// A solution folder synthesized from artifact paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionFolder {
    pub guid: Uuid,
    pub name: String,
    /// Full prefix this folder stands for, e.g. `\Engine\Core`.
    pub path: String,
    pub parent: Option<Uuid>,
    /// The artifact's own entry: part of the nesting table, never declared as a folder.
    pub nested_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderLayout {
    pub folders: Vec<SolutionFolder>,
}

impl FolderLayout {
    /// Folders that are declared as standalone folder entries.
    pub fn declared(&self) -> impl Iterator<Item = &SolutionFolder> + '_ {
        self.folders.iter().filter(|f| !f.nested_only)
    }

    /// `(child, parent)` pairs for every folder that has a parent.
    pub fn nesting(&self) -> impl Iterator<Item = (Uuid, Uuid)> + '_ {
        self.folders
            .iter()
            .filter_map(|f| f.parent.map(|parent| (f.guid, parent)))
    }

    pub fn folder(&self, path: &str) -> Option<&SolutionFolder> {
        self.folders.iter().find(|f| f.path == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    ActiveCfg,
    Build0,
}

/// One line of the per-artifact configuration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationMapping {
    pub artifact: Uuid,
    pub profile: String,
    pub platform: String,
    pub kind: MappingKind,
}

/// Output format of a solution and its artifacts.
pub trait SolutionSerializer {
    /// Path of the artifact's file relative to the solution directory.
    fn artifact_file(&self, artifact: &ArtifactDescription) -> PathBuf;

    fn render_artifact(&self, artifact: &ArtifactDescription) -> String;

    fn render_solution(
        &self,
        solution: &SolutionContext,
        layout: &FolderLayout,
        matrix: &[ConfigurationMapping],
    ) -> String;
}

/// What a write pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub artifacts_written: usize,
    pub artifacts_skipped: usize,
    pub artifacts_failed: usize,
    pub solution_written: bool,
    pub solution_failed: bool,
}

impl WriteReport {
    pub fn files_written(&self) -> usize {
        self.artifacts_written + usize::from(self.solution_written)
    }

    pub fn is_success(&self) -> bool {
        self.artifacts_failed == 0 && !self.solution_failed
    }
}

#[derive(Debug, Clone)]
pub struct SolutionContext {
    name: String,
    output_path: PathBuf,
    guid: Uuid,
    platforms: NameList,
    profiles: NameList,
    artifacts: Vec<(PathBuf, ArtifactDescription)>,
}

impl SolutionContext {
    /// `output_path` is the full path of the solution file.
    pub fn new(
        name: impl Into<String>,
        output_path: impl Into<PathBuf>,
        guid: Uuid,
        platforms: NameList,
        profiles: NameList,
    ) -> Self {
        Self {
            name: name.into(),
            output_path: output_path.into(),
            guid,
            platforms,
            profiles,
            artifacts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn solution_dir(&self) -> &Path {
        self.output_path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn platforms(&self) -> &NameList {
        &self.platforms
    }

    pub fn profiles(&self) -> &NameList {
        &self.profiles
    }

    /// Records an artifact under the build script that declared it. A second artifact
    /// for the same script replaces the first.
    pub fn add_artifact(&mut self, artifact: ArtifactDescription, source: impl Into<PathBuf>) {
        let source = source.into();
        match self.artifacts.iter_mut().find(|(s, _)| *s == source) {
            Some((_, existing)) => {
                log::warn!(
                    "'{}' replaces '{}' for build script '{}'.",
                    artifact.name,
                    existing.name,
                    source.display()
                );
                *existing = artifact;
            }
            None => self.artifacts.push((source, artifact)),
        }
    }

    pub fn clear_all(&mut self) {
        self.artifacts.clear();
    }

    pub fn artifacts(&self) -> impl Iterator<Item = (&Path, &ArtifactDescription)> + '_ {
        self.artifacts.iter().map(|(s, a)| (s.as_path(), a))
    }

    pub fn artifact_for(&self, source: &Path) -> Option<&ArtifactDescription> {
        self.artifacts
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// What the solution file records about each artifact.
    pub fn solution_entries(&self) -> Vec<SolutionEntry> {
        self.artifacts
            .iter()
            .map(|(source, artifact)| SolutionEntry {
                source_location: source.clone(),
                guid: artifact.guid,
                name: artifact.name.clone(),
                relative_path: artifact.relative_path.clone(),
                kind: artifact.kind,
            })
            .collect()
    }

    /// Builds the folder hierarchy for the full artifact set.
    ///
    /// Each artifact contributes its path segments followed by its own name. One folder
    /// exists per distinct prefix. Intermediate folders get fresh identities; the final
    /// segment reuses the artifact's identity and is nested-only.
    pub fn synthesize_folders(&self) -> FolderLayout {
        let mut folders: Vec<SolutionFolder> = Vec::new();
        let mut by_prefix: HashMap<String, usize> = HashMap::new();

        for (_, artifact) in &self.artifacts {
            let mut segments = artifact.path_segments();
            segments.push(artifact.name.as_str());
            let last = segments.len().saturating_sub(1);

            let mut prefix = String::new();
            let mut parent: Option<Uuid> = None;

            for (position, segment) in segments.into_iter().enumerate() {
                prefix.push('\\');
                prefix.push_str(segment);

                if let Some(folder) = by_prefix.get(&prefix).and_then(|&i| folders.get(i)) {
                    parent = Some(folder.guid);
                    continue;
                }

                let terminal = position == last;
                let folder = SolutionFolder {
                    guid: if terminal { artifact.guid } else { identity::new_guid() },
                    name: segment.to_string(),
                    path: prefix.clone(),
                    parent,
                    nested_only: terminal,
                };
                parent = Some(folder.guid);
                by_prefix.insert(prefix.clone(), folders.len());
                folders.push(folder);
            }
        }

        FolderLayout { folders }
    }

    /// Profile × platform pairs in profile-major order.
    pub fn configurations(&self) -> Vec<(String, String)> {
        self.profiles
            .iter()
            .flat_map(|profile| {
                self.platforms
                    .iter()
                    .map(move |platform| (profile.to_string(), platform.to_string()))
            })
            .collect()
    }

    /// One `ActiveCfg` and one `Build0` mapping per artifact and configuration.
    pub fn configuration_matrix(&self) -> Vec<ConfigurationMapping> {
        let configurations = self.configurations();
        let mut matrix = Vec::with_capacity(self.artifacts.len() * configurations.len() * 2);

        for (_, artifact) in &self.artifacts {
            for (profile, platform) in &configurations {
                for kind in [MappingKind::ActiveCfg, MappingKind::Build0] {
                    matrix.push(ConfigurationMapping {
                        artifact: artifact.guid,
                        profile: profile.clone(),
                        platform: platform.clone(),
                        kind,
                    });
                }
            }
        }
        matrix
    }

    /// Writes stale artifacts and, if its structure changed, the solution file.
    ///
    /// Write failures are logged and counted in the report; the pass continues with
    /// the remaining files.
    pub fn write(&self, serializer: &dyn SolutionSerializer, options: &OptionRegistry) -> WriteReport {
        let started = Instant::now();
        log::info!("Solution '{}': generating", self.name);
        let _scope = LogScope::open();

        let solution_dir = self.solution_dir();
        let generation_cache = GenerationCache::new(solution_dir);
        let mut report = WriteReport::default();

        for (source, artifact) in &self.artifacts {
            let output = solution_dir.join(serializer.artifact_file(artifact));
            let staleness = if output.exists() {
                generation_cache.artifact_staleness(artifact, source, options)
            } else {
                Staleness::Stale(StaleReason::OutputMissing)
            };

            let reason = match staleness {
                Staleness::UpToDate => {
                    log::debug!("Project '{}' is up to date.", artifact.name);
                    report.artifacts_skipped += 1;
                    continue;
                }
                Staleness::Stale(reason) => reason,
            };

            log::info!("Project '{}': writing ({}).", artifact.name, reason);
            let contents = serializer.render_artifact(artifact);
            if let Err(e) = cache::write_file_atomic(&output, contents.as_bytes()) {
                log::error!("Project '{}' could not be written: {}", artifact.name, e);
                report.artifacts_failed += 1;
                continue;
            }
            report.artifacts_written += 1;

            if let Err(e) = generation_cache.cache_artifact(artifact, source, options) {
                log::error!("Project '{}' could not be cached: {}", artifact.name, e);
            }
        }

        let entries = self.solution_entries();
        let staleness = if self.output_path.exists() {
            generation_cache.solution_staleness(self.guid, &entries, &self.platforms, &self.profiles)
        } else {
            Staleness::Stale(StaleReason::OutputMissing)
        };

        match staleness {
            Staleness::UpToDate => log::debug!("Solution '{}' is up to date.", self.name),
            Staleness::Stale(reason) => {
                log::info!("Solution '{}': writing ({}).", self.name, reason);
                let layout = self.synthesize_folders();
                let matrix = self.configuration_matrix();
                let contents = serializer.render_solution(self, &layout, &matrix);

                match cache::write_file_atomic(&self.output_path, contents.as_bytes()) {
                    Ok(()) => {
                        report.solution_written = true;
                        if let Err(e) = generation_cache.cache_solution(
                            self.guid,
                            &entries,
                            &self.platforms,
                            &self.profiles,
                        ) {
                            log::error!("Solution '{}' could not be cached: {}", self.name, e);
                        }
                    }
                    Err(e) => {
                        log::error!("Solution '{}' could not be written: {}", self.name, e);
                        report.solution_failed = true;
                    }
                }
            }
        }

        log::info!(
            "Solution '{}': {} written, {} up to date, took {:.2?}",
            self.name,
            report.files_written(),
            report.artifacts_skipped,
            started.elapsed()
        );
        report
    }
}
