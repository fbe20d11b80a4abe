//! # Option Registry
//!
//! Holds every option declared during a configuration pass. Options are rebuilt from
//! scratch on each pass (providers may appear or disappear between runs) while the
//! user's choices survive through the options cache:
//!
//! `clear()` → providers register → `load_from_file()` → `save_to_file()`.
//!
//! Identities must be unique. Names need not be; lookups by name resolve to the first
//! option registered with that name.

use crate::constants::OPTIONS_CACHE_FILENAME;
use crate::core::cache::{self, CacheError};
use crate::models::OptionSnapshot;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum OptionError {
    #[error("Option '{0}' is not registered.")]
    UnknownOption(String),
    #[error("Option '{0}' is a value option and cannot be toggled.")]
    NotAFlag(String),
    #[error("Options cache error: {0}")]
    Cache(#[from] CacheError),
}

pub type OptionResult<T> = Result<T, OptionError>;

/// Payload of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A user togglable feature gate.
    Flag { enabled: bool },
    /// A named constant. Always counts as enabled.
    Value { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunaOption {
    pub guid: Uuid,
    pub name: String,
    pub description: String,
    /// Empty means uncategorized.
    pub category: String,
    pub depends_on: Option<Uuid>,
    /// Options that declared a dependency on this one. Filled by
    /// [`OptionRegistry::build_dependency_tree`].
    pub dependency_of: Vec<Uuid>,
    pub value: OptionValue,
}

impl LunaOption {
    pub fn is_flag(&self) -> bool {
        matches!(self.value, OptionValue::Flag { .. })
    }

    pub fn is_enabled(&self) -> bool {
        match self.value {
            OptionValue::Flag { enabled } => enabled,
            OptionValue::Value { .. } => true,
        }
    }

    /// `category.name`, or just the name when uncategorized.
    pub fn qualified_name(&self) -> String {
        if self.category.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.category, self.name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionRegistry {
    options: Vec<LunaOption>,
    index: HashMap<Uuid, usize>,
    cache_dir: PathBuf,
}

impl OptionRegistry {
    /// Creates an empty registry persisting into `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            options: Vec::new(),
            index: HashMap::new(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(OPTIONS_CACHE_FILENAME)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn register(
        &mut self,
        guid: Uuid,
        name: &str,
        value: OptionValue,
        category: Option<&str>,
        depends_on: Option<Uuid>,
    ) -> Option<&mut LunaOption> {
        if let Some(existing) = self.find(guid) {
            log::error!(
                "Option '{}' ({}) is already registered as '{}'.",
                name,
                guid,
                existing.name
            );
            return None;
        }

        let position = self.options.len();
        self.options.push(LunaOption {
            guid,
            name: name.to_string(),
            description: String::new(),
            category: category.unwrap_or_default().to_string(),
            depends_on,
            dependency_of: Vec::new(),
            value,
        });
        self.index.insert(guid, position);
        self.options.get_mut(position)
    }

    /// Registers a flag option. Returns `None` if `guid` is already taken.
    pub fn register_flag(
        &mut self,
        guid: Uuid,
        name: &str,
        enabled: bool,
        category: Option<&str>,
        depends_on: Option<Uuid>,
    ) -> Option<&mut LunaOption> {
        self.register(guid, name, OptionValue::Flag { enabled }, category, depends_on)
    }

    /// Registers a value option. Returns `None` if `guid` is already taken.
    pub fn register_value(
        &mut self,
        guid: Uuid,
        name: &str,
        text: &str,
        category: Option<&str>,
        depends_on: Option<Uuid>,
    ) -> Option<&mut LunaOption> {
        let value = OptionValue::Value {
            text: text.to_string(),
        };
        self.register(guid, name, value, category, depends_on)
    }

    pub fn find(&self, guid: Uuid) -> Option<&LunaOption> {
        let position = *self.index.get(&guid)?;
        self.options.get(position)
    }

    fn find_mut(&mut self, guid: Uuid) -> Option<&mut LunaOption> {
        let position = *self.index.get(&guid)?;
        self.options.get_mut(position)
    }

    /// `None` if unknown. Value options always report `true`.
    pub fn is_enabled(&self, guid: Uuid) -> Option<bool> {
        self.find(guid).map(LunaOption::is_enabled)
    }

    /// Sets a flag's state. Returns `false` for unknown ids and value options.
    pub fn set_enabled(&mut self, guid: Uuid, enabled: bool) -> bool {
        match self.find_mut(guid) {
            Some(LunaOption {
                value: OptionValue::Flag { enabled: state },
                ..
            }) => {
                *state = enabled;
                true
            }
            _ => false,
        }
    }

    /// Case-insensitive lookup. With `category` set only that category is searched.
    pub fn find_by_name(&self, category: Option<&str>, name: &str) -> Option<&LunaOption> {
        self.options.iter().find(|o| {
            o.name.eq_ignore_ascii_case(name)
                && category.is_none_or(|c| o.category.eq_ignore_ascii_case(c))
        })
    }

    /// Resolves `category.name` (or a bare `name`) to an option.
    ///
    /// A dotted path is first tried as category plus name; if that misses, the whole
    /// path is tried as a bare name so option names containing dots stay reachable.
    pub fn find_by_path(&self, path: &str) -> Option<&LunaOption> {
        if let Some((category, name)) = path.split_once('.') {
            if let Some(option) = self.find_by_name(Some(category), name) {
                return Some(option);
            }
        }
        self.find_by_name(None, path)
    }

    /// Toggles the flag named by `path`. Used by the CLI.
    pub fn set_enabled_by_path(&mut self, path: &str, enabled: bool) -> OptionResult<Uuid> {
        let option = self
            .find_by_path(path)
            .ok_or_else(|| OptionError::UnknownOption(path.to_string()))?;
        let guid = option.guid;

        if !option.is_flag() {
            return Err(OptionError::NotAFlag(option.qualified_name()));
        }

        self.set_enabled(guid, enabled);
        Ok(guid)
    }

    /// Options that declared a dependency on `guid`.
    pub fn dependents(&self, guid: Uuid) -> &[Uuid] {
        self.find(guid)
            .map(|o| o.dependency_of.as_slice())
            .unwrap_or_default()
    }

    /// Rebuilds the reverse dependency lists. Returns the number of options whose
    /// dependency could not be resolved (each is logged).
    pub fn build_dependency_tree(&mut self) -> usize {
        for option in &mut self.options {
            option.dependency_of.clear();
        }

        let edges: Vec<(Uuid, Uuid, String)> = self
            .options
            .iter()
            .filter_map(|o| o.depends_on.map(|target| (o.guid, target, o.name.clone())))
            .collect();

        let mut unresolved = 0;
        for (dependent, target, name) in edges {
            match self.find_mut(target) {
                Some(parent) => parent.dependency_of.push(dependent),
                None => {
                    log::error!(
                        "Option '{}' ({}) depends on unknown option {}.",
                        name,
                        dependent,
                        target
                    );
                    unresolved += 1;
                }
            }
        }
        unresolved
    }

    /// Visits every option in registration order. The visitor returns `false` to stop.
    pub fn visit_options<F>(&self, mut visitor: F)
    where
        F: FnMut(&LunaOption) -> bool,
    {
        for option in &self.options {
            if !visitor(option) {
                break;
            }
        }
    }

    /// Visits options grouped by category, in order of first appearance. The empty
    /// category holds uncategorized options. The visitor returns `false` to stop.
    pub fn visit_grouped_options<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &[&LunaOption]) -> bool,
    {
        let mut groups: Vec<(&str, Vec<&LunaOption>)> = Vec::new();
        for option in &self.options {
            match groups.iter_mut().find(|(c, _)| *c == option.category) {
                Some((_, members)) => members.push(option),
                None => groups.push((option.category.as_str(), vec![option])),
            }
        }

        for (category, members) in &groups {
            if !visitor(category, members) {
                break;
            }
        }
    }

    /// Enabled-state of every flag option.
    pub fn snapshot(&self) -> OptionSnapshot {
        self.options
            .iter()
            .filter_map(|o| match o.value {
                OptionValue::Flag { enabled } => Some((o.guid, enabled)),
                OptionValue::Value { .. } => None,
            })
            .collect()
    }

    /// Persists the flag snapshot into the cache directory.
    pub fn save_to_file(&self) -> OptionResult<()> {
        let path = self.cache_file();
        let snapshot = self.snapshot();
        cache::write_cache(&path, &snapshot)?;
        log::debug!("Saved {} option states to '{}'.", snapshot.len(), path.display());
        Ok(())
    }

    /// Applies persisted flag states to the live options and returns how many were
    /// applied. Entries for options that are no longer registered are dropped.
    pub fn load_from_file(&mut self) -> OptionResult<usize> {
        let path = self.cache_file();
        if !path.exists() {
            log::debug!("No options cache at '{}'.", path.display());
            return Ok(0);
        }

        let stored: OptionSnapshot = cache::read_cache(&path)?;
        let mut applied = 0;
        for (guid, enabled) in stored {
            if self.set_enabled(guid, enabled) {
                applied += 1;
            } else {
                log::debug!("Dropping cached state of unknown option {}.", guid);
            }
        }
        Ok(applied)
    }

    pub fn clear(&mut self) {
        self.options.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_register_flag_reports_default() {
        let mut options = OptionRegistry::new("unused");

        assert!(options.register_flag(id(1), "Tests", true, None, None).is_some());
        assert!(options.register_flag(id(2), "Docs", false, Some("Build"), None).is_some());

        assert_eq!(options.is_enabled(id(1)), Some(true));
        assert_eq!(options.is_enabled(id(2)), Some(false));
        assert_eq!(options.is_enabled(id(3)), None);
    }

    #[test]
    fn test_duplicate_identity_is_rejected_and_first_state_kept() {
        // --- Setup ---
        let mut options = OptionRegistry::new("unused");
        options.register_flag(id(1), "Tests", true, None, None);

        // --- Execute ---
        let second = options.register_flag(id(1), "Other", false, Some("Build"), None);

        // --- Assert ---
        assert!(second.is_none());
        assert_eq!(options.len(), 1);
        let first = options.find(id(1)).unwrap();
        assert_eq!(first.name, "Tests");
        assert!(first.is_enabled());
        assert_eq!(first.category, "");
    }

    #[test]
    fn test_duplicate_names_resolve_to_first_registration() {
        let mut options = OptionRegistry::new("unused");
        options.register_flag(id(1), "Tests", true, None, None);
        assert!(options.register_flag(id(2), "tests", false, None, None).is_some());

        assert_eq!(options.find_by_name(None, "TESTS").unwrap().guid, id(1));
    }

    #[test]
    fn test_value_options_are_always_enabled_and_not_toggleable() {
        let mut options = OptionRegistry::new("unused");
        options.register_value(id(1), "Version", "1.2.0", Some("Meta"), None);

        assert_eq!(options.is_enabled(id(1)), Some(true));
        assert!(!options.set_enabled(id(1), false));
        assert!(matches!(
            options.set_enabled_by_path("meta.version", false),
            Err(OptionError::NotAFlag(_))
        ));
        assert!(options.snapshot().is_empty());
    }

    #[test]
    fn test_set_enabled_by_path_is_case_insensitive() {
        let mut options = OptionRegistry::new("unused");
        options.register_flag(id(1), "Tests", true, Some("Build"), None);
        options.register_flag(id(2), "Docs", true, None, None);

        assert_eq!(options.set_enabled_by_path("build.TESTS", false).unwrap(), id(1));
        assert_eq!(options.set_enabled_by_path("docs", false).unwrap(), id(2));
        assert!(matches!(
            options.set_enabled_by_path("Build.Missing", true),
            Err(OptionError::UnknownOption(_))
        ));

        assert_eq!(options.is_enabled(id(1)), Some(false));
        assert_eq!(options.is_enabled(id(2)), Some(false));
    }

    #[test]
    fn test_build_dependency_tree_links_and_reports_missing() {
        // --- Setup ---
        let mut options = OptionRegistry::new("unused");
        options.register_flag(id(1), "Editor", true, None, None);
        options.register_flag(id(2), "EditorTests", true, None, Some(id(1)));
        options.register_flag(id(3), "Orphan", true, None, Some(id(99)));

        // --- Execute ---
        let unresolved = options.build_dependency_tree();
        let unresolved_again = options.build_dependency_tree();

        // --- Assert ---
        assert_eq!(unresolved, 1);
        assert_eq!(unresolved_again, 1);
        assert_eq!(options.dependents(id(1)), &[id(2)]);
        assert!(options.dependents(id(2)).is_empty());
    }

    #[test]
    fn test_visitors_stop_early() {
        let mut options = OptionRegistry::new("unused");
        options.register_flag(id(1), "A", true, Some("Build"), None);
        options.register_flag(id(2), "B", true, None, None);
        options.register_flag(id(3), "C", true, Some("Build"), None);
        options.register_flag(id(4), "D", true, Some("Docs"), None);

        let mut visited = Vec::new();
        options.visit_options(|o| {
            visited.push(o.name.clone());
            visited.len() < 2
        });
        assert_eq!(visited, vec!["A", "B"]);

        let mut groups = Vec::new();
        options.visit_grouped_options(|category, members| {
            groups.push((category.to_string(), members.len()));
            true
        });
        assert_eq!(
            groups,
            vec![
                ("Build".to_string(), 2),
                (String::new(), 1),
                ("Docs".to_string(), 1)
            ]
        );

        let mut first_only = 0;
        options.visit_grouped_options(|_, _| {
            first_only += 1;
            false
        });
        assert_eq!(first_only, 1);
    }

    #[test]
    fn test_save_clear_reregister_load_round_trip() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let mut options = OptionRegistry::new(dir.path());
        options.register_flag(id(1), "Tests", true, None, None);
        options.register_flag(id(2), "Docs", true, None, None);
        options.register_flag(id(3), "Removed", false, None, None);
        options.register_value(id(4), "Version", "1.0", None, None);
        options.set_enabled(id(1), false);
        options.save_to_file().unwrap();

        // --- Execute ---
        options.clear();
        assert!(options.is_empty());
        options.register_flag(id(1), "Tests", true, None, None);
        options.register_flag(id(2), "Docs", false, None, None);
        options.register_flag(id(5), "New", true, None, None);
        let applied = options.load_from_file().unwrap();

        // --- Assert ---
        assert_eq!(applied, 2);
        assert_eq!(options.is_enabled(id(1)), Some(false));
        assert_eq!(options.is_enabled(id(2)), Some(true));
        assert_eq!(options.is_enabled(id(3)), None);
        assert_eq!(options.is_enabled(id(5)), Some(true));
    }

    #[test]
    fn test_load_from_file_without_cache_is_a_no_op() {
        let dir = tempdir().unwrap();
        let mut options = OptionRegistry::new(dir.path());
        options.register_flag(id(1), "Tests", true, None, None);

        assert_eq!(options.load_from_file().unwrap(), 0);
        assert_eq!(options.is_enabled(id(1)), Some(true));
    }

    #[test]
    fn test_load_from_corrupt_cache_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(OPTIONS_CACHE_FILENAME), b"junk").unwrap();
        let mut options = OptionRegistry::new(dir.path());

        assert!(matches!(options.load_from_file(), Err(OptionError::Cache(_))));
    }
}
