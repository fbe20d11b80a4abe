// src/cli/mod.rs

use clap::Parser;
use std::path::PathBuf;

pub mod handlers;

/// luna: incremental solution and project generation.
///
/// Commands:
///   generate   Generate the solution for the active target (`--target <name>`)
///   configure  Rebuild the option set and report it
///   options    List options or set a flag (`options set <[category.]name> <on|off>`)
///   targets    List registered targets
///   plugins    List built-in plugins and whether they are enabled
///   info       Show the resolved workspace configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// Path to `luna.toml`. Defaults to `LUNA_CONFIG`, then a search upward from the
    /// current directory.
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to run.
    pub command: Option<String>,

    /// Arguments passed on to the command.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Flags shared by every command handler.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
}

impl From<&Cli> for GlobalArgs {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_collects_trailing_arguments() {
        let cli = Cli::try_parse_from(["luna", "--config", "game/luna.toml", "options", "set", "Core.Fast", "off"]).unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("game/luna.toml")));
        assert_eq!(cli.command.as_deref(), Some("options"));
        assert_eq!(cli.args, vec!["set", "Core.Fast", "off"]);
    }

    #[test]
    fn test_cli_passes_flags_to_command() {
        let cli = Cli::try_parse_from(["luna", "generate", "--target", "Visual Studio 2022 - Windows x64"]).unwrap();

        assert_eq!(cli.command.as_deref(), Some("generate"));
        assert_eq!(cli.args, vec!["--target", "Visual Studio 2022 - Windows x64"]);
    }
}
