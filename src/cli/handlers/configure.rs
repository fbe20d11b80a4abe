// src/cli/handlers/configure.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Re-runs the configuration pass and reports the option set."
)]
struct ConfigureArgs {}

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let _configure_args = ConfigureArgs::try_parse_from(&args)?;
    let mut session = commons::open_session(globals)?;
    let report = session.reconfigure();

    println!("\n--- {} '{}' ---", "Configuration".yellow(), session.config().name);
    println!("  {:<22} {}", "Builds:".blue(), session.registry().build_count());
    println!("  {:<22} {}", "Options:".blue(), report.registered);
    println!("  {:<22} {}", "Restored from cache:".blue(), report.restored);
    if report.unresolved_dependencies > 0 {
        println!(
            "  {:<22} {}",
            "Broken dependencies:".blue(),
            report.unresolved_dependencies.to_string().red()
        );
    }
    if !report.saved {
        println!("{}", "  Option states could not be saved.".red());
    }
    Ok(())
}
