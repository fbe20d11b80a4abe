// src/core/configurator.rs

use crate::core::logging::LogScope;
use crate::core::options::OptionRegistry;
use crate::core::registry::Registry;

/// Summary of one configuration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    pub registered: usize,
    /// Flag states restored from the options cache.
    pub restored: usize,
    pub unresolved_dependencies: usize,
    pub saved: bool,
}

/// Rebuilds the option set from the registered build providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Configurator;

impl Configurator {
    /// Clears `options`, lets every provider register its options, links dependencies
    /// and restores the user's saved choices. The reconciled state is written back so
    /// options of removed providers disappear from the cache.
    ///
    /// Cache failures are logged; the pass always completes.
    pub fn configurate(registry: &Registry, options: &mut OptionRegistry) -> ConfigureReport {
        log::info!("Configuring {} build(s)", registry.build_count());
        let _scope = LogScope::open();
        let mut report = ConfigureReport::default();

        options.clear();
        for build in registry.builds() {
            log::debug!("Configurating '{}'", build.provider.name());
            build.provider.configurate(options);
        }
        report.registered = options.len();
        report.unresolved_dependencies = options.build_dependency_tree();

        match options.load_from_file() {
            Ok(restored) => report.restored = restored,
            Err(e) => log::error!("Could not restore option states: {}", e),
        }

        match options.save_to_file() {
            Ok(()) => report.saved = true,
            Err(e) => log::error!("Could not save option states: {}", e),
        }

        log::info!(
            "{} option(s) registered, {} restored from cache.",
            report.registered,
            report.restored
        );
        report
    }
}
