// src/constants.rs

/// The name of the workspace configuration file.
pub const CONFIG_FILENAME: &str = "luna.toml";

/// Environment variable that overrides the configuration file lookup.
pub const CONFIG_ENV_VAR: &str = "LUNA_CONFIG";

/// The name of the per-run cache directory (inside the solution path).
pub const CACHE_DIR: &str = "lunaCache";

/// Persisted enabled-state of every flag option (inside the cache directory).
pub const OPTIONS_CACHE_FILENAME: &str = "options.luna.cache";

/// Per-artifact generation record, stored next to the artifact's output.
pub const PROJECT_CACHE_FILENAME: &str = "luna.project.cache";

/// Solution-level generation record, stored next to the solution file.
pub const SOLUTION_CACHE_FILENAME: &str = "luna.solution.cache";

/// Log file written to the cache directory when file logging is enabled.
pub const LOG_FILENAME: &str = "luna.log";

/// Suffix of the build manifests discovered below the code path.
pub const BUILD_MANIFEST_SUFFIX: &str = ".build.toml";

pub const DEFAULT_PLATFORMS: &[&str] = &["x64"];
pub const DEFAULT_PROFILES: &[&str] = &["Debug", "Release"];
