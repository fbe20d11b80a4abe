// src/cli/handlers/generate.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Generates the solution and projects for the active target."
)]
struct GenerateArgs {
    /// Display name of the target to generate for. Defaults to `default_target`.
    #[arg(long, short)]
    target: Option<String>,
}

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let generate_args = GenerateArgs::try_parse_from(&args)?;
    let mut session = commons::open_session(globals)?;

    if let Some(target) = &generate_args.target {
        session.select_target(target)?;
    }

    let report = session
        .generate()
        .with_context(|| format!("Generation of '{}' failed", session.config().name))?;

    println!(
        "\n{} {} file(s) written, {} project(s) up to date.",
        "Done:".green().bold(),
        report.files_written(),
        report.artifacts_skipped
    );
    Ok(())
}
