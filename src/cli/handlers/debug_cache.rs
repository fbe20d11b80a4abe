// src/cli/handlers/debug_cache.rs

use crate::cli::GlobalArgs;
use crate::cli::handlers::commons;
use crate::constants::{OPTIONS_CACHE_FILENAME, PROJECT_CACHE_FILENAME, SOLUTION_CACHE_FILENAME};
use crate::core::cache;
use crate::core::paths;
use crate::models::{OptionSnapshot, ProjectCache, SolutionCache};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// --- Command Argument Parsing ---

/// (Internal) Inspect or clear the generation caches of a workspace.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, hide = true)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommand {
    /// Decodes every cache file below the solution path and prints it as JSON.
    Inspect,
    /// Deletes the solution and project records, forcing a full regeneration on the
    /// next run.
    Clear {
        /// Also forget the saved option states.
        #[arg(long)]
        options: bool,
    },
}

// --- Main Handler ---

pub fn handle(args: Vec<String>, globals: &GlobalArgs) -> Result<()> {
    let cache_args = CacheArgs::try_parse_from(&args)?;
    let config = commons::load_config(globals)?;
    commons::init_logging(&config);

    match cache_args.command {
        CacheSubcommand::Inspect => inspect_caches(&config.solution_path, &paths::cache_dir(&config)),
        CacheSubcommand::Clear { options } => {
            clear_caches(&config.solution_path, options.then(|| paths::cache_dir(&config)))
        }
    }
}

// --- Subcommand Logic ---

/// Every generation record below `root`.
fn find_records(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.file_type().is_file()
                && (entry.file_name() == PROJECT_CACHE_FILENAME
                    || entry.file_name() == SOLUTION_CACHE_FILENAME)
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn inspect_caches(solution_path: &Path, cache_dir: &Path) -> Result<()> {
    println!(
        "\nInspecting caches below '{}'",
        solution_path.display().to_string().cyan()
    );

    let options_file = cache_dir.join(OPTIONS_CACHE_FILENAME);
    if options_file.is_file() {
        print_record::<OptionSnapshot>(&options_file)?;
    } else {
        println!("{}", "\nNo option states have been saved yet.".yellow());
    }

    let records = find_records(solution_path);
    if records.is_empty() {
        println!("{}", "\nNo generation records found. Nothing has been generated yet.".yellow());
        return Ok(());
    }

    for record in records {
        if record.file_name().is_some_and(|n| n == SOLUTION_CACHE_FILENAME) {
            print_record::<SolutionCache>(&record)?;
        } else {
            print_record::<ProjectCache>(&record)?;
        }
    }
    Ok(())
}

fn print_record<T: DeserializeOwned + Serialize>(path: &Path) -> Result<()> {
    println!("\n  {:<12} {}", "Cache Path:".blue(), path.display());

    let record: T = match cache::read_cache(path) {
        Ok(record) => record,
        Err(e) => {
            println!("  {:<12} {}", "Status:".blue(), e.to_string().red());
            return Ok(());
        }
    };

    let json_output =
        serde_json::to_string_pretty(&record).context("Failed to serialize cache data to JSON.")?;
    println!("--- {} ---", "Cache Content (as JSON)".green());
    println!("{}", json_output);
    Ok(())
}

fn clear_caches(solution_path: &Path, options_dir: Option<PathBuf>) -> Result<()> {
    println!(
        "\nClearing caches below '{}'",
        solution_path.display().to_string().cyan()
    );

    let mut deleted = 0;
    for record in find_records(solution_path) {
        fs::remove_file(&record)
            .with_context(|| format!("Failed to delete '{}'", record.display()))?;
        println!("  {:<12} {}", "Deleted:".blue(), record.display());
        deleted += 1;
    }

    if let Some(dir) = options_dir {
        let options_file = dir.join(OPTIONS_CACHE_FILENAME);
        if options_file.is_file() {
            fs::remove_file(&options_file)
                .with_context(|| format!("Failed to delete '{}'", options_file.display()))?;
            println!("  {:<12} {}", "Deleted:".blue(), options_file.display());
            deleted += 1;
        }
    }

    if deleted == 0 {
        println!("\n{}", "No cache files found. Nothing to do.".yellow());
    } else {
        println!(
            "\n{}",
            "Successfully cleared caches. Everything will be regenerated on the next run.".bold()
        );
    }
    Ok(())
}
