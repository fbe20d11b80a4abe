//! # Logging
//!
//! Installs the process logger on top of `env_logger`. Every line carries a level
//! prefix (`[INFO]`, `[WARNING]`, `[ERROR]`, `[SUCCESS]`), is indented by the number of
//! currently open [`LogScope`]s and can optionally be mirrored into `luna.log`.
//!
//! Success lines are ordinary `info` records sent to the [`SUCCESS_TARGET`] target.

use colored::*;
use env_logger::{Builder, Env, Target};
use log::Level;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Log target used to mark a record as a success message.
pub const SUCCESS_TARGET: &str = "luna::success";

static SCOPE_DEPTH: AtomicUsize = AtomicUsize::new(0);

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Could not open log file '{path}': {source}")]
    LogFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("A logger was already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// How the process logger should be set up.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// Prefix every line with a timestamp.
    pub timestamps: bool,
    /// Mirror all output into this file (created or truncated).
    pub log_file: Option<PathBuf>,
}

/// Installs the global logger. `RUST_LOG` still overrides the default `info` filter.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    let timestamps = settings.timestamps;
    let colorize = settings.log_file.is_none();

    builder.format(move |buf, record| {
        let stamp = if timestamps {
            Some(buf.timestamp_seconds().to_string())
        } else {
            None
        };
        let line = format_line(
            record.level(),
            record.target(),
            depth(),
            &record.args().to_string(),
            stamp.as_deref(),
            colorize,
        );
        writeln!(buf, "{}", line)
    });

    if let Some(path) = &settings.log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LoggingError::LogFile {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let file = File::create(path).map_err(|e| LoggingError::LogFile {
            path: path.display().to_string(),
            source: e,
        })?;
        builder.target(Target::Pipe(Box::new(TeeWriter { file })));
    }

    builder.try_init()?;
    Ok(())
}

/// Writes each log line to stderr and to the log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Renders one log line. Kept free of global state so it can be tested directly.
pub fn format_line(
    level: Level,
    target: &str,
    depth: usize,
    message: &str,
    timestamp: Option<&str>,
    colorize: bool,
) -> String {
    let (label, color) = if target == SUCCESS_TARGET {
        ("[SUCCESS]", Color::Green)
    } else {
        match level {
            Level::Error => ("[ERROR]", Color::Red),
            Level::Warn => ("[WARNING]", Color::Yellow),
            Level::Info => ("[INFO]", Color::White),
            Level::Debug => ("[DEBUG]", Color::Cyan),
            Level::Trace => ("[TRACE]", Color::BrightBlack),
        }
    };

    let prefix = if colorize {
        label.color(color).to_string()
    } else {
        label.to_string()
    };
    let indent = "  ".repeat(depth);

    match timestamp {
        Some(stamp) => format!("{} {}{} {}", stamp, indent, prefix, message),
        None => format!("{}{} {}", indent, prefix, message),
    }
}

/// Current indentation depth of the process logger.
pub fn depth() -> usize {
    SCOPE_DEPTH.load(Ordering::Relaxed)
}

/// Logs a success line.
pub fn success(message: impl std::fmt::Display) {
    log::info!(target: SUCCESS_TARGET, "{}", message);
}

/// RAII guard that indents every log line emitted while it is alive.
#[derive(Debug)]
pub struct LogScope {
    counter: &'static AtomicUsize,
}

impl LogScope {
    /// Opens a scope on the process logger.
    pub fn open() -> Self {
        Self::on(&SCOPE_DEPTH)
    }

    fn on(counter: &'static AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for LogScope {
    fn drop(&mut self) {
        // Never wraps below zero, even if scopes are dropped out of order.
        let _ = self
            .counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1));
    }
}
