//! # Registry
//!
//! The catalog of everything a generation pass works with:
//!
//! - **build providers**, each producing at most one artifact per pass,
//! - **meta services**, arbitrary singletons looked up by the capability they were
//!   registered under (not by their concrete type),
//! - **targets**, the output-format strategies.
//!
//! Every entry is keyed by its [`Uuid`]. Registration order is preserved so indexed
//! enumeration is stable. A registrant may attach a source location (the build script
//! that declared it), which the generation cache later uses as correlation key.
//!
//! Registration never fails hard: duplicates are logged and ignored.

use crate::core::identity::{AsAny, Capability};
use crate::core::options::OptionRegistry;
use crate::core::solution::{ArtifactDescription, SolutionContext};
use crate::core::target::{GenerationContext, Target};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A factory for one artifact.
pub trait BuildProvider: AsAny {
    /// Human readable name used in log lines.
    fn name(&self) -> &str;

    /// Declares the options this provider understands.
    fn configurate(&self, options: &mut OptionRegistry) {
        let _ = options;
    }

    /// Produces the artifact description for the current pass, or `None` when the
    /// provider has nothing to contribute (for example a disabled feature).
    fn generate(
        &self,
        solution: &SolutionContext,
        ctx: &GenerationContext<'_>,
    ) -> Option<ArtifactDescription>;
}

struct Entry<T: ?Sized> {
    guid: Uuid,
    item: Box<T>,
}

/// Insertion-ordered store with guid lookup.
struct Catalog<T: ?Sized> {
    entries: Vec<Entry<T>>,
    index: HashMap<Uuid, usize>,
}

impl<T: ?Sized> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: ?Sized> Catalog<T> {
    fn contains(&self, guid: Uuid) -> bool {
        self.index.contains_key(&guid)
    }

    fn insert(&mut self, guid: Uuid, item: Box<T>) {
        self.index.insert(guid, self.entries.len());
        self.entries.push(Entry { guid, item });
    }

    fn get(&self, guid: Uuid) -> Option<&T> {
        let position = *self.index.get(&guid)?;
        self.entries.get(position).map(|e| e.item.as_ref())
    }

    fn at(&self, index: usize) -> Option<&Entry<T>> {
        self.entries.get(index)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A registered build provider together with its registration data.
#[derive(Clone, Copy)]
pub struct RegisteredBuild<'a> {
    pub guid: Uuid,
    pub provider: &'a dyn BuildProvider,
    pub source_location: Option<&'a Path>,
}

impl fmt::Debug for RegisteredBuild<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredBuild")
            .field("guid", &self.guid)
            .field("name", &self.provider.name())
            .field("source_location", &self.source_location)
            .finish()
    }
}

/// A registered target together with its identity.
#[derive(Clone, Copy)]
pub struct RegisteredTarget<'a> {
    pub guid: Uuid,
    pub target: &'a dyn Target,
}

impl fmt::Debug for RegisteredTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTarget")
            .field("guid", &self.guid)
            .field("name", &self.target.name())
            .finish()
    }
}

#[derive(Default)]
pub struct Registry {
    builds: Catalog<dyn BuildProvider>,
    targets: Catalog<dyn Target>,
    metas: HashMap<Uuid, Box<dyn Any>>,
    source_locations: HashMap<Uuid, PathBuf>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("builds", &self.builds.len())
            .field("metas", &self.metas.len())
            .field("targets", &self.targets.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn remember_source(&mut self, guid: Uuid, source: Option<PathBuf>) {
        if let Some(path) = source {
            self.source_locations.insert(guid, path);
        }
    }

    // --- Build providers ---

    /// Registers a build provider under its declared type's identity.
    pub fn register_build<T>(&mut self, provider: T, source: Option<PathBuf>) -> bool
    where
        T: BuildProvider + Capability,
    {
        self.register_build_with(T::GUID, Box::new(provider), source)
    }

    /// Registers a build provider under an explicit identity. Used when many providers
    /// share one Rust type (e.g. one per build manifest).
    pub fn register_build_with(
        &mut self,
        guid: Uuid,
        provider: Box<dyn BuildProvider>,
        source: Option<PathBuf>,
    ) -> bool {
        if self.builds.contains(guid) {
            log::warn!(
                "Build '{}' ({}) is already registered. Skipping.",
                provider.name(),
                guid
            );
            return false;
        }

        log::info!("Registered build '{}' ({}).", provider.name(), guid);
        self.builds.insert(guid, provider);
        self.remember_source(guid, source);
        true
    }

    pub fn build(&self, guid: Uuid) -> Option<&dyn BuildProvider> {
        self.builds.get(guid)
    }

    /// Typed lookup of a build provider registered by its declared type.
    pub fn build_as<T: BuildProvider + Capability>(&self) -> Option<&T> {
        self.builds.get(T::GUID)?.as_any().downcast_ref::<T>()
    }

    pub fn build_count(&self) -> usize {
        self.builds.len()
    }

    pub fn build_at(&self, index: usize) -> Option<RegisteredBuild<'_>> {
        match self.builds.at(index) {
            Some(entry) => Some(self.registered_build(entry)),
            None => {
                log::error!(
                    "Build index {} is out of range ({} registered).",
                    index,
                    self.builds.len()
                );
                None
            }
        }
    }

    /// All build providers in registration order.
    pub fn builds(&self) -> impl Iterator<Item = RegisteredBuild<'_>> + '_ {
        self.builds
            .entries
            .iter()
            .map(move |entry| self.registered_build(entry))
    }

    fn registered_build<'a>(&'a self, entry: &'a Entry<dyn BuildProvider>) -> RegisteredBuild<'a> {
        RegisteredBuild {
            guid: entry.guid,
            provider: entry.item.as_ref(),
            source_location: self.source_location(entry.guid),
        }
    }

    // --- Meta services ---

    /// Registers a meta service under the capability `C`.
    ///
    /// The key is `C::GUID`, so a concrete implementation can be registered behind a
    /// public capability (`registry.register_meta::<dyn MyService>(Box::new(imp), None)`).
    pub fn register_meta<C>(&mut self, service: Box<C>, source: Option<PathBuf>) -> bool
    where
        C: Capability + ?Sized,
    {
        if self.metas.contains_key(&C::GUID) {
            log::warn!(
                "Meta service '{}' ({}) is already registered. Skipping.",
                C::NAME,
                C::GUID
            );
            return false;
        }

        log::info!("Registered meta service '{}' ({}).", C::NAME, C::GUID);
        self.metas.insert(C::GUID, Box::new(service));
        self.remember_source(C::GUID, source);
        true
    }

    pub fn meta<C: Capability + ?Sized>(&self) -> Option<&C> {
        self.metas
            .get(&C::GUID)?
            .downcast_ref::<Box<C>>()
            .map(|service| service.as_ref())
    }

    pub fn meta_mut<C: Capability + ?Sized>(&mut self) -> Option<&mut C> {
        self.metas
            .get_mut(&C::GUID)?
            .downcast_mut::<Box<C>>()
            .map(|service| service.as_mut())
    }

    pub fn has_meta(&self, guid: Uuid) -> bool {
        self.metas.contains_key(&guid)
    }

    pub fn meta_count(&self) -> usize {
        self.metas.len()
    }

    // --- Targets ---

    pub fn register_target<T>(&mut self, target: T, source: Option<PathBuf>) -> bool
    where
        T: Target + Capability,
    {
        if self.targets.contains(T::GUID) {
            log::warn!(
                "Target '{}' ({}) is already registered. Skipping.",
                target.name(),
                T::GUID
            );
            return false;
        }

        log::info!("Registered target '{}' ({}).", target.name(), T::GUID);
        self.targets.insert(T::GUID, Box::new(target));
        self.remember_source(T::GUID, source);
        true
    }

    pub fn target(&self, guid: Uuid) -> Option<&dyn Target> {
        self.targets.get(guid)
    }

    pub fn target_as<T: Target + Capability>(&self) -> Option<&T> {
        self.targets.get(T::GUID)?.as_any().downcast_ref::<T>()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn target_at(&self, index: usize) -> Option<RegisteredTarget<'_>> {
        match self.targets.at(index) {
            Some(entry) => Some(RegisteredTarget {
                guid: entry.guid,
                target: entry.item.as_ref(),
            }),
            None => {
                log::error!(
                    "Target index {} is out of range ({} registered).",
                    index,
                    self.targets.len()
                );
                None
            }
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = RegisteredTarget<'_>> + '_ {
        self.targets.entries.iter().map(|entry| RegisteredTarget {
            guid: entry.guid,
            target: entry.item.as_ref(),
        })
    }

    /// Case-insensitive lookup by display name.
    pub fn target_by_name(&self, name: &str) -> Option<RegisteredTarget<'_>> {
        self.targets()
            .find(|t| t.target.name().eq_ignore_ascii_case(name))
    }

    // --- Source locations ---

    /// The source location recorded when `guid` was registered.
    pub fn source_location(&self, guid: Uuid) -> Option<&Path> {
        self.source_locations.get(&guid).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::tests::StaticBuild;

    trait Greeter {
        fn greet(&self) -> String;
    }

    impl Capability for dyn Greeter {
        const GUID: Uuid = Uuid::from_u128(0x6f1c_0a4e_8f8b_4a2b_9a55_0c1d_2e3f_4a5b);
        const NAME: &'static str = "Greeter";
    }

    struct EnglishGreeter;

    impl Greeter for EnglishGreeter {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Counter {
        value: u32,
    }

    impl Capability for Counter {
        const GUID: Uuid = Uuid::from_u128(0x11);
        const NAME: &'static str = "Counter";
    }

    #[test]
    fn test_register_build_rejects_duplicates() {
        // --- Setup ---
        let mut registry = Registry::new();

        // --- Execute ---
        let first = registry.register_build(StaticBuild::named("Core"), Some(PathBuf::from("core.build.toml")));
        let second = registry.register_build(StaticBuild::named("Other"), None);

        // --- Assert ---
        assert!(first);
        assert!(!second);
        assert_eq!(registry.build_count(), 1);
        assert_eq!(registry.build_as::<StaticBuild>().unwrap().name(), "Core");
        assert_eq!(
            registry.source_location(StaticBuild::GUID),
            Some(Path::new("core.build.toml"))
        );
    }

    #[test]
    fn test_register_build_with_explicit_identities_keeps_order() {
        let mut registry = Registry::new();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        assert!(registry.register_build_with(a, Box::new(StaticBuild::named("A")), None));
        assert!(registry.register_build_with(b, Box::new(StaticBuild::named("B")), None));
        assert!(!registry.register_build_with(a, Box::new(StaticBuild::named("A2")), None));

        let names: Vec<&str> = registry.builds().map(|b| b.provider.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(registry.build_at(1).unwrap().guid, b);
        assert!(registry.build_at(2).is_none());
        assert!(registry.source_location(a).is_none());
    }

    #[test]
    fn test_meta_is_keyed_by_capability_not_concrete_type() {
        // --- Setup ---
        let mut registry = Registry::new();

        // --- Execute ---
        let registered = registry.register_meta::<dyn Greeter>(Box::new(EnglishGreeter), None);
        let duplicate = registry.register_meta::<dyn Greeter>(Box::new(EnglishGreeter), None);

        // --- Assert ---
        assert!(registered);
        assert!(!duplicate);
        assert_eq!(registry.meta::<dyn Greeter>().unwrap().greet(), "hello");
        assert!(registry.has_meta(<dyn Greeter as Capability>::GUID));
        assert_eq!(registry.meta_count(), 1);
    }

    #[test]
    fn test_meta_mut_updates_service() {
        let mut registry = Registry::new();
        registry.register_meta::<Counter>(Box::new(Counter { value: 1 }), None);

        registry.meta_mut::<Counter>().unwrap().value += 41;

        assert_eq!(registry.meta::<Counter>().unwrap().value, 42);
        assert!(registry.meta::<dyn Greeter>().is_none());
    }

    #[test]
    fn test_out_of_range_target_lookup_returns_none() {
        let registry = Registry::new();
        assert!(registry.target_at(0).is_none());
        assert_eq!(registry.target_count(), 0);
        assert!(registry.target_by_name("anything").is_none());
    }
}
