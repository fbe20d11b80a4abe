// src/core/platforms.rs

//! Deduplicated, ordered name lists. One instance holds the solution platforms
//! (`x64`, `x86`, ...) and another the build profiles (`Debug`, `Release`, ...).

/// An insertion-ordered list of unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList {
    kind: &'static str,
    names: Vec<String>,
}

impl NameList {
    /// `kind` only appears in log lines ("platform", "profile").
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            names: Vec::new(),
        }
    }

    pub fn with_names<I, S>(kind: &'static str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new(kind);
        for name in names {
            list.add(name);
        }
        list
    }

    /// Adds `name` unless it is already present. Returns whether it was added.
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            log::warn!("The {} '{}' is already registered.", self.kind, name);
            return false;
        }
        log::debug!("Registered {} '{}'.", self.kind, name);
        self.names.push(name);
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        before != self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn at(&self, index: usize) -> Option<&str> {
        let name = self.names.get(index).map(String::as_str);
        if name.is_none() {
            log::error!("{} index {} is out of range ({} registered).", self.kind, index, self.names.len());
        }
        name
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }
}
