//! # Targets
//!
//! Concrete output formats. Each target implements [`crate::core::target::Target`]
//! and is made available to workspaces through the built-in plugin catalog.

pub mod visual_studio;
