//! # Target Strategy
//!
//! A target is an output format (for example a Visual Studio solution). Running a
//! target is one generation pass: every registered build provider is asked for its
//! artifact against a fresh [`SolutionContext`], then the context is written through the
//! target's serializer.

use crate::core::identity::AsAny;
use crate::core::logging::LogScope;
use crate::core::options::OptionRegistry;
use crate::core::platforms::NameList;
use crate::core::project_tree::ProjectConventions;
use crate::core::registry::Registry;
use crate::core::solution::{SolutionContext, WriteReport};
use crate::models::LunaConfig;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Target '{target}' finished with {failed} file(s) that could not be written.")]
    Incomplete { target: String, failed: usize },
}

pub type TargetResult<T> = Result<T, TargetError>;

/// Everything a generation pass reads.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub registry: &'a Registry,
    pub options: &'a OptionRegistry,
    pub platforms: &'a NameList,
    pub profiles: &'a NameList,
    pub config: &'a LunaConfig,
}

impl GenerationContext<'_> {
    /// The registered project conventions, or the defaults for this workspace.
    pub fn conventions(&self) -> ProjectConventions {
        self.registry
            .meta::<ProjectConventions>()
            .cloned()
            .unwrap_or_else(|| ProjectConventions::from_config(self.config))
    }
}

pub trait Target: AsAny {
    fn name(&self) -> &str;

    /// Sub folder of the solution path this target writes into.
    fn solution_folder(&self) -> &str;

    /// Directory the solution file is written to.
    fn full_solution_path(&self, config: &LunaConfig) -> PathBuf {
        config.solution_path.join(self.solution_folder())
    }

    /// Runs one complete generation pass.
    fn generate_solution(&self, ctx: &GenerationContext<'_>) -> TargetResult<WriteReport>;
}

/// Asks every build provider with a known source location for its artifact and adds
/// the results to `solution`. Returns the number of artifacts collected.
pub fn collect_artifacts(solution: &mut SolutionContext, ctx: &GenerationContext<'_>) -> usize {
    solution.clear_all();

    for build in ctx.registry.builds() {
        let Some(source) = build.source_location else {
            log::debug!(
                "Build '{}' has no source location, skipping.",
                build.provider.name()
            );
            continue;
        };

        let artifact = {
            let _scope = LogScope::open();
            build.provider.generate(solution, ctx)
        };

        match artifact {
            Some(artifact) => solution.add_artifact(artifact, source),
            None => log::debug!("Build '{}' produced no artifact.", build.provider.name()),
        }
    }

    solution.len()
}
