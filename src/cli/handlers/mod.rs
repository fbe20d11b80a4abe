// src/cli/handlers/mod.rs

pub mod commons;
pub mod configure;
pub mod debug_cache;
pub mod generate;
pub mod info;
pub mod options;
pub mod plugins;
pub mod targets;
