//! # Generation Cache
//!
//! Decides whether an artifact (project file) or the solution file must be written
//! again. Each artifact keeps a record next to its own output:
//!
//! `<solution dir>/<relative path>/<name>/luna.project.cache`
//!
//! holding the artifact identity, the build script it came from, that script's
//! modification time and the state of every flag option at generation time. The
//! solution keeps a coarser record (`luna.solution.cache`) of its identity, the
//! identity and placement of every artifact and the platform and profile lists.
//!
//! Any problem reading a record means "stale": the cache may cause extra work but
//! never skips needed work.

use crate::constants::{PROJECT_CACHE_FILENAME, SOLUTION_CACHE_FILENAME};
use crate::core::cache::{self, CacheResult};
use crate::core::options::OptionRegistry;
use crate::core::platforms::NameList;
use crate::core::solution::ArtifactDescription;
use crate::models::{ProjectCache, SerializableSystemTime, SolutionCache, SolutionEntry};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Why something has to be regenerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// No record exists yet.
    Missing,
    /// The record could not be read or decoded.
    Unreadable,
    /// The generated output file itself is gone.
    OutputMissing,
    IdentityChanged,
    SourceMoved,
    SourceModified,
    OptionRemoved(Uuid),
    OptionChanged(Uuid),
    SourcesChanged,
    /// Same build scripts, but an artifact's identity, name, path or kind differs.
    ArtifactsChanged,
    PlatformsChanged,
    ProfilesChanged,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no cache record"),
            Self::Unreadable => write!(f, "cache record unreadable"),
            Self::OutputMissing => write!(f, "output file missing"),
            Self::IdentityChanged => write!(f, "identity changed"),
            Self::SourceMoved => write!(f, "source location changed"),
            Self::SourceModified => write!(f, "source file modified"),
            Self::OptionRemoved(id) => write!(f, "option {} no longer exists", id),
            Self::OptionChanged(id) => write!(f, "option {} changed", id),
            Self::SourcesChanged => write!(f, "set of build scripts changed"),
            Self::ArtifactsChanged => write!(f, "artifact identity or location changed"),
            Self::PlatformsChanged => write!(f, "platforms changed"),
            Self::ProfilesChanged => write!(f, "profiles changed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    UpToDate,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

#[derive(Debug, Clone)]
pub struct GenerationCache {
    solution_dir: PathBuf,
}

impl GenerationCache {
    pub fn new(solution_dir: impl Into<PathBuf>) -> Self {
        Self {
            solution_dir: solution_dir.into(),
        }
    }

    pub fn artifact_cache_path(&self, artifact: &ArtifactDescription) -> PathBuf {
        self.solution_dir
            .join(artifact.directory())
            .join(PROJECT_CACHE_FILENAME)
    }

    pub fn solution_cache_path(&self) -> PathBuf {
        self.solution_dir.join(SOLUTION_CACHE_FILENAME)
    }

    /// Compares the artifact against its record.
    pub fn artifact_staleness(
        &self,
        artifact: &ArtifactDescription,
        source: &Path,
        options: &OptionRegistry,
    ) -> Staleness {
        let path = self.artifact_cache_path(artifact);
        if !path.exists() {
            return Staleness::Stale(StaleReason::Missing);
        }

        let cached: ProjectCache = match cache::read_cache(&path) {
            Ok(record) => record,
            Err(e) => {
                log::error!("Could not read project cache '{}': {}", path.display(), e);
                return Staleness::Stale(StaleReason::Unreadable);
            }
        };

        if cached.project_guid != artifact.guid {
            return Staleness::Stale(StaleReason::IdentityChanged);
        }
        if cached.source_location != source {
            return Staleness::Stale(StaleReason::SourceMoved);
        }

        let current = cache::modified_time(source).map(SerializableSystemTime::from);
        if current.is_none() || current != cached.source_modified {
            return Staleness::Stale(StaleReason::SourceModified);
        }

        for (guid, enabled) in &cached.options {
            match options.is_enabled(*guid) {
                None => return Staleness::Stale(StaleReason::OptionRemoved(*guid)),
                Some(state) if state != *enabled => {
                    return Staleness::Stale(StaleReason::OptionChanged(*guid));
                }
                Some(_) => {}
            }
        }

        Staleness::UpToDate
    }

    pub fn is_artifact_stale(
        &self,
        artifact: &ArtifactDescription,
        source: &Path,
        options: &OptionRegistry,
    ) -> bool {
        self.artifact_staleness(artifact, source, options).is_stale()
    }

    /// Records the artifact as generated. Call after its file was written: the
    /// source's modification time is read now.
    pub fn cache_artifact(
        &self,
        artifact: &ArtifactDescription,
        source: &Path,
        options: &OptionRegistry,
    ) -> CacheResult<()> {
        let record = ProjectCache {
            project_guid: artifact.guid,
            source_location: source.to_path_buf(),
            source_modified: cache::modified_time(source).map(SerializableSystemTime::from),
            options: options.snapshot(),
        };
        cache::write_cache(&self.artifact_cache_path(artifact), &record)
    }

    /// Compares the solution structure against its record.
    pub fn solution_staleness(
        &self,
        solution_guid: Uuid,
        artifacts: &[SolutionEntry],
        platforms: &NameList,
        profiles: &NameList,
    ) -> Staleness {
        let path = self.solution_cache_path();
        if !path.exists() {
            return Staleness::Stale(StaleReason::Missing);
        }

        let cached: SolutionCache = match cache::read_cache(&path) {
            Ok(record) => record,
            Err(e) => {
                log::error!("Could not read solution cache '{}': {}", path.display(), e);
                return Staleness::Stale(StaleReason::Unreadable);
            }
        };

        if cached.solution_guid != solution_guid {
            return Staleness::Stale(StaleReason::IdentityChanged);
        }

        let same_sources = cached.artifacts.len() == artifacts.len()
            && cached.artifacts.iter().all(|c| {
                artifacts
                    .iter()
                    .any(|a| a.source_location == c.source_location)
            });
        if !same_sources {
            return Staleness::Stale(StaleReason::SourcesChanged);
        }
        if cached.artifacts.iter().any(|c| !artifacts.contains(c)) {
            return Staleness::Stale(StaleReason::ArtifactsChanged);
        }

        if cached.platforms.len() != platforms.count()
            || cached.platforms.iter().any(|p| !platforms.contains(p))
        {
            return Staleness::Stale(StaleReason::PlatformsChanged);
        }

        if cached.profiles.len() != profiles.count()
            || cached.profiles.iter().any(|p| !profiles.contains(p))
        {
            return Staleness::Stale(StaleReason::ProfilesChanged);
        }

        Staleness::UpToDate
    }

    pub fn is_solution_stale(
        &self,
        solution_guid: Uuid,
        artifacts: &[SolutionEntry],
        platforms: &NameList,
        profiles: &NameList,
    ) -> bool {
        self.solution_staleness(solution_guid, artifacts, platforms, profiles)
            .is_stale()
    }

    pub fn cache_solution(
        &self,
        solution_guid: Uuid,
        artifacts: &[SolutionEntry],
        platforms: &NameList,
        profiles: &NameList,
    ) -> CacheResult<()> {
        let record = SolutionCache {
            solution_guid,
            artifacts: artifacts.to_vec(),
            platforms: platforms.to_vec(),
            profiles: profiles.to_vec(),
        };
        cache::write_cache(&self.solution_cache_path(), &record)
    }
}
