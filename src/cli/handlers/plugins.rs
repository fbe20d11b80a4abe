// src/cli/handlers/plugins.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use crate::system::discovery::{BUILTIN_PLUGINS, BUILTIN_TARGETS, PluginEntry, PluginKind};
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Lists the built-in plugins and targets and whether this workspace enables them."
)]
struct PluginsArgs {}

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let _plugins_args = PluginsArgs::try_parse_from(&args)?;
    let config = commons::load_config(globals)?;
    commons::init_logging(&config);

    println!("\n--- {} ---", "Plugins".yellow());
    for entry in BUILTIN_PLUGINS.iter().chain(BUILTIN_TARGETS) {
        let allow_list = match entry.kind {
            PluginKind::Plugin => config.plugins.as_deref(),
            PluginKind::Target => config.targets.as_deref(),
        };
        print_entry(entry, is_enabled(entry, allow_list));
    }
    Ok(())
}

fn is_enabled(entry: &PluginEntry, allow_list: Option<&[String]>) -> bool {
    allow_list.is_none_or(|names| names.iter().any(|n| n.eq_ignore_ascii_case(entry.name)))
}

fn print_entry(entry: &PluginEntry, enabled: bool) {
    let state = if enabled { "enabled".green() } else { "disabled".dimmed() };
    let kind = match entry.kind {
        PluginKind::Plugin => "plugin",
        PluginKind::Target => "target",
    };
    println!(
        "  {:<22} {:<8} {:<10} {}",
        entry.name.cyan(),
        kind,
        state,
        entry.description.dimmed()
    );
}
