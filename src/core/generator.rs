//! # Generator
//!
//! Runs a generation pass for the active target: persists the option state, runs the
//! workspace's `pre_generate` tool, then hands over to the target.

use crate::core::logging;
use crate::core::solution::WriteReport;
use crate::core::target::{GenerationContext, TargetError};
use crate::system::executor::{self, ExecutionError};
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("No target is active. Use 'luna targets' to list the available targets.")]
    NoActiveTarget,
    #[error("Target '{0}' is not registered.")]
    UnknownTarget(String),
    #[error("Pre-generate command '{command}' failed: {source}")]
    PreGenerate {
        command: String,
        #[source]
        source: ExecutionError,
    },
    #[error(transparent)]
    Target(#[from] TargetError),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Holds the target selection of a session.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    active_target: Option<Uuid>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_target(&self) -> Option<Uuid> {
        self.active_target
    }

    /// Selects a registered target by identity.
    pub fn set_active_target(&mut self, guid: Uuid, ctx: &GenerationContext<'_>) -> GenerateResult<()> {
        if ctx.registry.target(guid).is_none() {
            return Err(GenerateError::UnknownTarget(guid.to_string()));
        }
        self.active_target = Some(guid);
        Ok(())
    }

    /// Selects a registered target by its display name, case-insensitively.
    pub fn set_active_by_name(&mut self, name: &str, ctx: &GenerationContext<'_>) -> GenerateResult<Uuid> {
        let found = ctx
            .registry
            .target_by_name(name)
            .ok_or_else(|| GenerateError::UnknownTarget(name.to_string()))?;
        log::debug!("Active target: '{}'", found.target.name());
        self.active_target = Some(found.guid);
        Ok(found.guid)
    }

    /// Runs one generation pass for the active target.
    ///
    /// A failing `pre_generate` command aborts the pass before anything is written.
    /// Failing to persist the option state does not.
    pub fn generate(&self, ctx: &GenerationContext<'_>) -> GenerateResult<WriteReport> {
        let guid = self.active_target.ok_or(GenerateError::NoActiveTarget)?;
        let target = ctx
            .registry
            .target(guid)
            .ok_or_else(|| GenerateError::UnknownTarget(guid.to_string()))?;

        let started = Instant::now();
        log::info!("Generating '{}' for {}", ctx.config.name, target.name());

        if let Err(e) = ctx.options.save_to_file() {
            log::error!("Could not save option states: {}", e);
        }

        if let Some(command) = ctx.config.pre_generate.as_deref() {
            log::info!("Running pre-generate command: {}", command);
            executor::execute_command(command, &ctx.config.workspace_path).map_err(|source| {
                GenerateError::PreGenerate {
                    command: command.to_string(),
                    source,
                }
            })?;
        }

        let report = target.generate_solution(ctx)?;
        logging::success(format!(
            "Generated '{}' in {:.2?} ({} file(s) written, {} up to date).",
            ctx.config.name,
            started.elapsed(),
            report.files_written(),
            report.artifacts_skipped
        ));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::Capability;
    use crate::core::options::OptionRegistry;
    use crate::core::platforms::NameList;
    use crate::core::registry::Registry;
    use crate::core::target::tests::test_config;
    use crate::targets::visual_studio::VisualStudioTarget;
    use tempfile::tempdir;

    #[test]
    fn test_generate_without_target_fails() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let registry = Registry::new();
        let options = OptionRegistry::new(dir.path().join("cache"));
        let names = NameList::new("platform");
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &names,
            profiles: &names,
            config: &config,
        };

        let result = Generator::new().generate(&ctx);
        assert!(matches!(result, Err(GenerateError::NoActiveTarget)));
    }

    #[test]
    fn test_set_active_by_name() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let mut registry = Registry::new();
        registry.register_target(VisualStudioTarget, None);
        let options = OptionRegistry::new(dir.path().join("cache"));
        let names = NameList::new("platform");
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &names,
            profiles: &names,
            config: &config,
        };
        let mut generator = Generator::new();

        // --- Execute ---
        let selected = generator.set_active_by_name("visual studio 2022 - windows x64", &ctx);
        let missing = generator.set_active_by_name("Xcode", &ctx);

        // --- Assert ---
        assert_eq!(selected.unwrap(), VisualStudioTarget::GUID);
        assert!(matches!(missing, Err(GenerateError::UnknownTarget(_))));
        assert_eq!(generator.active_target(), Some(VisualStudioTarget::GUID));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_pre_generate_aborts_pass() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.pre_generate = Some("false".to_string());
        let mut registry = Registry::new();
        registry.register_target(VisualStudioTarget, None);
        let options = OptionRegistry::new(dir.path().join("cache"));
        let platforms = NameList::with_names("platform", ["x64"]);
        let profiles = NameList::with_names("profile", ["Debug"]);
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &platforms,
            profiles: &profiles,
            config: &config,
        };
        let mut generator = Generator::new();
        generator.set_active_target(VisualStudioTarget::GUID, &ctx).unwrap();

        // --- Execute ---
        let result = generator.generate(&ctx);

        // --- Assert ---
        assert!(matches!(result, Err(GenerateError::PreGenerate { .. })));
        assert!(!VisualStudioTarget.solution_file(&config).exists());
    }

    #[test]
    fn test_generate_writes_empty_solution() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let mut registry = Registry::new();
        registry.register_target(VisualStudioTarget, None);
        let options = OptionRegistry::new(dir.path().join("cache"));
        let platforms = NameList::with_names("platform", ["x64"]);
        let profiles = NameList::with_names("profile", ["Debug"]);
        let ctx = GenerationContext {
            registry: &registry,
            options: &options,
            platforms: &platforms,
            profiles: &profiles,
            config: &config,
        };
        let mut generator = Generator::new();
        generator.set_active_target(VisualStudioTarget::GUID, &ctx).unwrap();

        // --- Execute ---
        let report = generator.generate(&ctx).unwrap();

        // --- Assert ---
        assert!(report.solution_written);
        assert!(VisualStudioTarget.solution_file(&config).is_file());
        assert!(options.cache_file().is_file());
    }
}
