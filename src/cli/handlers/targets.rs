// src/cli/handlers/targets.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the registered targets.")]
struct TargetsArgs {}

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let _targets_args = TargetsArgs::try_parse_from(&args)?;
    let session = commons::open_session(globals)?;
    let active = session.generator().active_target();

    if session.registry().target_count() == 0 {
        println!("\n{}", "No targets are registered for this workspace.".yellow());
        return Ok(());
    }

    println!("\n--- {} ---", "Targets".yellow());
    for registered in session.registry().targets() {
        let marker = if Some(registered.guid) == active { "*".green().bold() } else { " ".normal() };
        let output = registered
            .target
            .full_solution_path(session.config());
        println!(
            " {} {:<36} {}",
            marker,
            registered.target.name(),
            output.display().to_string().dimmed()
        );
    }
    Ok(())
}
