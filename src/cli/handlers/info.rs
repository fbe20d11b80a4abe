// src/cli/handlers/info.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use crate::core::paths;
use crate::models::LunaConfig;
use crate::state::Session;
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Displays the resolved workspace configuration and what was registered."
)]
struct InfoArgs {}

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let _info_args = InfoArgs::try_parse_from(&args)?;
    let session = commons::open_session(globals)?;

    print_metadata(session.config());
    print_registry(&session);

    println!("\n---------------------------------");
    Ok(())
}

fn print_metadata(config: &LunaConfig) {
    println!("\n--- {} '{}' ---", "Workspace".yellow(), config.name.yellow());
    println!("  {:<15} {}", "Config file:".blue(), config.config_path.display());
    println!("  {:<15} {}", "Code path:".blue(), config.code_path.display());
    println!("  {:<15} {}", "Solution path:".blue(), config.solution_path.display());
    println!("  {:<15} {}", "Workspace:".blue(), config.workspace_path.display());
    println!("  {:<15} {}", "Output path:".blue(), config.output_path.display());
    println!("  {:<15} {}", "Cache dir:".blue(), paths::cache_dir(config).display());
    if let Some(command) = &config.pre_generate {
        println!("  {:<15} {}", "Pre-generate:".blue(), command.dimmed());
    }
}

fn print_registry(session: &Session) {
    let registry = session.registry();
    let active = session.generator().active_target();

    println!("\n  {}:", "Configurations".blue());
    println!("    - {}: {}", "platforms".cyan(), session.platforms().to_vec().join(", "));
    println!("    - {}: {}", "profiles".cyan(), session.profiles().to_vec().join(", "));

    println!("\n  {} ({}):", "Builds".blue(), registry.build_count());
    for build in registry.builds() {
        let source = build
            .source_location
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no source)".to_string());
        println!("    - {} {}", build.provider.name().cyan(), source.dimmed());
    }

    println!("\n  {} ({}):", "Targets".blue(), registry.target_count());
    for registered in registry.targets() {
        let marker = if Some(registered.guid) == active { " (active)" } else { "" };
        println!("    - {}{}", registered.target.name().cyan(), marker.green());
    }

    println!(
        "\n  {} {} option(s), {} meta service(s)",
        "Registered:".blue(),
        session.options().len(),
        registry.meta_count()
    );
}
