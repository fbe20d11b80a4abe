// src/system/executor.rs

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with {status}.")]
    NonZeroExitStatus { command: String, status: ExitStatus },
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Runs an external tool and waits for it. Output is passed through to the terminal.
///
/// A leading `-` marks the command as allowed to fail. An empty command is a success.
pub fn execute_command(command_line: &str, cwd: &Path) -> ExecutionResult<()> {
    let trimmed = command_line.trim();
    let (command_line, ignore_errors) = match trimmed.strip_prefix('-') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };
    if command_line.is_empty() {
        return Ok(());
    }

    let parts = shlex::split(command_line)
        .ok_or_else(|| ExecutionError::CommandParse(command_line.to_string()))?;
    let Some((program, args)) = parts.split_first() else {
        return Ok(());
    };
    let clean_cwd = dunce::simplified(cwd);
    log::debug!("Running '{}' in '{}'", command_line, clean_cwd.display());

    let status = StdCommand::new(program)
        .args(args)
        .current_dir(clean_cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();

    // Windows built-ins like `echo` only exist inside `cmd`.
    let status = match status {
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Command '{}' not found. Retrying with cmd /C.", program);
            StdCommand::new("cmd")
                .arg("/C")
                .arg(command_line)
                .current_dir(clean_cwd)
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
        }
        other => other,
    }
    .map_err(|e| ExecutionError::CommandFailed(command_line.to_string(), e))?;

    if !status.success() {
        if ignore_errors {
            log::warn!("Command '{}' exited with {} (ignored).", command_line, status);
            return Ok(());
        }
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line.to_string(),
            status,
        });
    }
    Ok(())
}
