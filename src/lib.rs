//! # Luna
//!
//! A plugin-extensible meta-build tool. Luna collects build providers (compiled-in
//! plugins and `*.build.toml` manifests), reconciles their options with the user's
//! saved choices and writes IDE solution and project files, regenerating only what
//! changed since the previous run.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;
pub mod targets;
