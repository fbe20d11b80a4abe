// src/state.rs

use crate::core::configurator::{ConfigureReport, Configurator};
use crate::core::generator::{GenerateResult, Generator};
use crate::core::options::{OptionRegistry, OptionResult};
use crate::core::paths;
use crate::core::platforms::NameList;
use crate::core::registry::Registry;
use crate::core::solution::WriteReport;
use crate::core::target::GenerationContext;
use crate::models::{LunaConfig, OptionSnapshot};
use crate::system::discovery::{self, BUILTIN_PLUGINS, BUILTIN_TARGETS};
use std::ops::{Deref, DerefMut};

/// Tracks whether the option set was handed out for mutation.
#[derive(Debug)]
enum OptionsJournal {
    /// No mutable access has been requested yet.
    Pristine,
    /// Mutable access was requested. Holds the flag states from before the first
    /// mutation.
    Dirty { original: OptionSnapshot },
}

/// Everything one invocation works with: the resolved config, the registry filled
/// from plugins and manifests, the reconciled options and the target selection.
#[derive(Debug)]
pub struct Session {
    config: LunaConfig,
    registry: Registry,
    options: OptionRegistry,
    journal: OptionsJournal,
    platforms: NameList,
    profiles: NameList,
    generator: Generator,
}

impl Session {
    /// Registers built-in plugins and targets admitted by the config, loads the build
    /// manifests below the code path, runs a configuration pass and selects the
    /// default target.
    pub fn bootstrap(config: LunaConfig) -> Self {
        let mut registry = Registry::new();

        discovery::discover_plugins(BUILTIN_PLUGINS, config.plugins.as_deref(), |entry| {
            (entry.register)(&mut registry, &config)
        });
        discovery::discover_plugins(BUILTIN_TARGETS, config.targets.as_deref(), |entry| {
            (entry.register)(&mut registry, &config)
        });

        for build in discovery::discover_manifests(&config.code_path) {
            let guid = build.guid();
            let source = build.source().to_path_buf();
            registry.register_build_with(guid, Box::new(build), Some(source));
        }

        let platforms = NameList::with_names("platform", &config.platforms);
        let profiles = NameList::with_names("profile", &config.profiles);
        let mut options = OptionRegistry::new(paths::cache_dir(&config));
        Configurator::configurate(&registry, &mut options);

        let mut session = Self {
            config,
            registry,
            options,
            journal: OptionsJournal::Pristine,
            platforms,
            profiles,
            generator: Generator::new(),
        };
        session.select_default_target();
        session
    }

    /// `default_target` if it names a registered target, otherwise the first one.
    fn select_default_target(&mut self) {
        let ctx = GenerationContext {
            registry: &self.registry,
            options: &self.options,
            platforms: &self.platforms,
            profiles: &self.profiles,
            config: &self.config,
        };

        if let Some(name) = self.config.default_target.as_deref() {
            match self.generator.set_active_by_name(name, &ctx) {
                Ok(_) => return,
                Err(e) => log::warn!("Default target: {}", e),
            }
        }

        if let Some(first) = self.registry.targets().next() {
            if let Err(e) = self.generator.set_active_target(first.guid, &ctx) {
                log::warn!("{}", e);
            }
        }
    }

    pub fn config(&self) -> &LunaConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    /// Mutable access to the options. The first call records the current flag states
    /// so [`Session::options_need_saving`] can tell whether anything changed.
    pub fn options_mut(&mut self) -> OptionsGuard<'_> {
        OptionsGuard {
            options: &mut self.options,
            journal: &mut self.journal,
        }
    }

    pub fn options_need_saving(&self) -> bool {
        match &self.journal {
            OptionsJournal::Pristine => false,
            OptionsJournal::Dirty { original } => *original != self.options.snapshot(),
        }
    }

    /// Persists the option states and starts a new journal.
    pub fn save_options(&mut self) -> OptionResult<()> {
        self.options.save_to_file()?;
        self.journal = OptionsJournal::Pristine;
        Ok(())
    }

    /// Runs a new configuration pass over the registered builds.
    pub fn reconfigure(&mut self) -> ConfigureReport {
        let report = Configurator::configurate(&self.registry, &mut self.options);
        self.journal = OptionsJournal::Pristine;
        report
    }

    pub fn platforms(&self) -> &NameList {
        &self.platforms
    }

    pub fn profiles(&self) -> &NameList {
        &self.profiles
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn generation_context(&self) -> GenerationContext<'_> {
        GenerationContext {
            registry: &self.registry,
            options: &self.options,
            platforms: &self.platforms,
            profiles: &self.profiles,
            config: &self.config,
        }
    }

    /// Selects the target used by [`Session::generate`].
    pub fn select_target(&mut self, name: &str) -> GenerateResult<()> {
        let ctx = GenerationContext {
            registry: &self.registry,
            options: &self.options,
            platforms: &self.platforms,
            profiles: &self.profiles,
            config: &self.config,
        };
        self.generator.set_active_by_name(name, &ctx).map(|_| ())
    }

    pub fn generate(&mut self) -> GenerateResult<WriteReport> {
        let report = self.generator.generate(&self.generation_context())?;
        // The generator persisted the options.
        self.journal = OptionsJournal::Pristine;
        Ok(report)
    }
}

/// Mutable view of a session's options that journals the first mutation.
#[derive(Debug)]
pub struct OptionsGuard<'a> {
    options: &'a mut OptionRegistry,
    journal: &'a mut OptionsJournal,
}

impl Deref for OptionsGuard<'_> {
    type Target = OptionRegistry;

    fn deref(&self) -> &Self::Target {
        &*self.options
    }
}

impl DerefMut for OptionsGuard<'_> {
    fn deref_mut(&mut self) -> &mut OptionRegistry {
        if let OptionsJournal::Pristine = self.journal {
            *self.journal = OptionsJournal::Dirty {
                original: self.options.snapshot(),
            };
        }
        &mut *self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONFIG_FILENAME;
    use crate::core::config_loader;
    use crate::core::identity::Capability;
    use crate::targets::visual_studio::VisualStudioTarget;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_workspace(root: &Path) -> LunaConfig {
        let code = root.join("Code").join("Core");
        fs::create_dir_all(&code).unwrap();
        fs::write(
            code.join("core.build.toml"),
            "name = \"Core\"\npath = \"Engine\"\nfeature = \"WithCore\"\n\n[[options]]\nname = \"WithCore\"\n",
        )
        .unwrap();
        fs::write(code.join("Core.cs"), "class Core {}").unwrap();
        fs::write(
            root.join(CONFIG_FILENAME),
            "name = \"Game\"\ncode_path = \"Code\"\nsolution_path = \"Solution\"\n",
        )
        .unwrap();
        config_loader::load_config(&root.join(CONFIG_FILENAME)).unwrap()
    }

    #[test]
    fn test_bootstrap_registers_everything() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = write_workspace(dir.path());

        // --- Execute ---
        let session = Session::bootstrap(config);

        // --- Assert ---
        assert_eq!(session.registry().build_count(), 1);
        assert_eq!(session.registry().target_count(), 1);
        assert_eq!(session.registry().meta_count(), 1);
        assert_eq!(session.options().len(), 1);
        assert_eq!(session.generator().active_target(), Some(VisualStudioTarget::GUID));
        assert_eq!(session.platforms().to_vec(), vec!["x64"]);
        assert!(session.options().cache_file().is_file());
    }

    #[test]
    fn test_options_guard_journals_changes() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let mut session = Session::bootstrap(write_workspace(dir.path()));
        assert!(!session.options_need_saving());

        // --- Execute & Assert ---
        session.options_mut().set_enabled_by_path("Core.WithCore", true).unwrap();
        assert!(!session.options_need_saving());

        session.options_mut().set_enabled_by_path("Core.WithCore", false).unwrap();
        assert!(session.options_need_saving());

        session.save_options().unwrap();
        assert!(!session.options_need_saving());
    }

    #[test]
    fn test_generate_is_incremental_and_honours_options() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let config = write_workspace(dir.path());
        let mut session = Session::bootstrap(config.clone());

        // --- Execute ---
        let first = session.generate().unwrap();
        let second = session.generate().unwrap();
        session.options_mut().set_enabled_by_path("Core.WithCore", false).unwrap();
        let third = session.generate().unwrap();

        // --- Assert ---
        assert_eq!(first.artifacts_written, 1);
        assert!(first.solution_written);
        assert_eq!(second.files_written(), 0);
        assert_eq!(third.artifacts_written, 0);
        assert!(third.solution_written);

        let sln = fs::read_to_string(VisualStudioTarget.solution_file(&config)).unwrap();
        assert!(!sln.contains("\"Core\""));

        let restored = Session::bootstrap(config);
        assert_eq!(
            restored.options().find_by_path("Core.WithCore").map(|o| o.is_enabled()),
            Some(false)
        );
    }

    #[test]
    fn test_allow_list_excludes_targets() {
        let dir = tempdir().unwrap();
        let mut config = write_workspace(dir.path());
        config.targets = Some(Vec::new());

        let session = Session::bootstrap(config);

        assert_eq!(session.registry().target_count(), 0);
        assert_eq!(session.generator().active_target(), None);
    }
}
