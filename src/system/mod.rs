//! # System Interaction Layer
//!
//! The boundary between the generation engine and the machine it runs on.
//!
//! - **`discovery`**: finds built-in plugins and targets admitted by the workspace and
//!   loads the build manifests below the code path.
//! - **`executor`**: runs external tools such as the `pre_generate` command.

pub mod discovery;
pub mod executor;
