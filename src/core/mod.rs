// src/core/mod.rs

pub mod cache;
pub mod config_loader;
pub mod configurator;
pub mod generation_cache;
pub mod generator;
pub mod identity;
pub mod logging;
pub mod manifest;
pub mod options;
pub mod paths;
pub mod platforms;
pub mod project_tree;
pub mod registry;
pub mod solution;
pub mod target;
