// src/bin/luna.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use luna::cli::{Cli, GlobalArgs, handlers};

// --- Command Definition and Registry ---

/// A command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &GlobalArgs) -> Result<()>,
}

/// Every command the binary understands. To add a command, add an entry here.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "_cache",
        aliases: &[],
        handler: handlers::debug_cache::handle,
    },
    CommandDefinition {
        name: "configure",
        aliases: &["config"],
        handler: handlers::configure::handle,
    },
    CommandDefinition {
        name: "generate",
        aliases: &["gen"],
        handler: handlers::generate::handle,
    },
    CommandDefinition {
        name: "info",
        aliases: &[],
        handler: handlers::info::handle,
    },
    CommandDefinition {
        name: "options",
        aliases: &["opt"],
        handler: handlers::options::handle,
    },
    CommandDefinition {
        name: "plugins",
        aliases: &[],
        handler: handlers::plugins::handle,
    },
    CommandDefinition {
        name: "targets",
        aliases: &[],
        handler: handlers::targets::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

fn main() {
    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Routes the invocation to its handler. Without a command, `generate` runs.
fn run_cli(cli: Cli) -> Result<()> {
    let globals = GlobalArgs::from(&cli);

    let (name, args) = match cli.command {
        Some(name) => (name, cli.args),
        None => ("generate".to_string(), Vec::new()),
    };

    match find_command(&name) {
        Some(command) => (command.handler)(args, &globals),
        None => {
            let known: Vec<&str> = COMMAND_REGISTRY
                .iter()
                .map(|c| c.name)
                .filter(|n| !n.starts_with('_'))
                .collect();
            anyhow::bail!("Unknown command '{}'. Available commands: {}", name, known.join(", "))
        }
    }
}
