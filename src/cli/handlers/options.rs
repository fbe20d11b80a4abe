// src/cli/handlers/options.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use crate::core::options::{LunaOption, OptionRegistry, OptionValue};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Lists or changes the workspace options.")]
struct OptionsArgs {
    #[command(subcommand)]
    command: Option<OptionsSubcommand>,
}

#[derive(Subcommand, Debug)]
enum OptionsSubcommand {
    /// Lists every option, grouped by category.
    List,
    /// Turns a flag on or off.
    Set {
        /// `category.name`, or a bare option name.
        path: String,
        /// `on` or `off`.
        state: String,
    },
}

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let options_args = OptionsArgs::try_parse_from(&args)?;
    let mut session = commons::open_session(globals)?;

    match options_args.command.unwrap_or(OptionsSubcommand::List) {
        OptionsSubcommand::List => {
            print_options(session.options());
            Ok(())
        }
        OptionsSubcommand::Set { path, state } => {
            let enabled = commons::parse_switch(&state)
                .ok_or_else(|| anyhow!("Expected 'on' or 'off', got '{}'.", state))?;
            session.options_mut().set_enabled_by_path(&path, enabled)?;

            if !session.options_need_saving() {
                println!("Option '{}' is already {}.", path.cyan(), switch_label(enabled));
                return Ok(());
            }

            session.save_options().context("Failed to save option states")?;
            println!("Option '{}' is now {}.", path.cyan(), switch_label(enabled));
            Ok(())
        }
    }
}

fn switch_label(enabled: bool) -> ColoredString {
    if enabled { "on".green() } else { "off".red() }
}

fn print_options(options: &OptionRegistry) {
    if options.is_empty() {
        println!("\nNo options are registered.");
        return;
    }

    options.visit_grouped_options(|category, members| {
        let header = if category.is_empty() { "(uncategorized)" } else { category };
        println!("\n{}", header.yellow().bold());
        for option in members {
            println!("  {}", describe(option, options));
        }
        true
    });
}

fn describe(option: &LunaOption, options: &OptionRegistry) -> String {
    let state = match &option.value {
        OptionValue::Flag { enabled } => format!("[{}]", switch_label(*enabled)),
        OptionValue::Value { text } => format!("= {}", text.cyan()),
    };

    let mut line = format!("{:<24} {}", option.name, state);
    if let Some(parent) = option.depends_on.and_then(|guid| options.find(guid)) {
        line.push_str(&format!("  (requires {})", parent.qualified_name()).dimmed().to_string());
    }
    if !option.description.is_empty() {
        line.push_str(&format!("  {}", option.description.dimmed()));
    }
    line
}
