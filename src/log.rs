// Author: Dustin Pilgrim
// License: MIT

use std::fmt::Arguments;
use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use once_cell::sync::Lazy;

/// Rotate the log file once it grows past this size (5 MiB)
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_BACKUPS: u32 = 3;

#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl LogLevel {
    /// Map the numeric `max_level` setting onto a level, clamping out-of-range values.
    pub fn from_number(n: u8) -> Self {
        match n {
            0 | 1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERR",
            LogLevel::Warn => "WRN",
            LogLevel::Info => "INF",
            LogLevel::Debug => "DBG",
        }
    }

    /// ANSI color code for terminal output
    fn color(&self) -> &'static str {
        match self {
            LogLevel::Error => "\x1b[31m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Info => "\x1b[36m",
            LogLevel::Debug => "\x1b[90m",
        }
    }
}

const RESET_COLOR: &str = "\x1b[0m";

/// Logger settings, built once at startup and installed with [`init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub console: bool,
    pub use_colors: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: false,
            use_colors: io::stdout().is_terminal(),
            file: None,
        }
    }
}

static GLOBAL_CONFIG: Lazy<Mutex<LogConfig>> = Lazy::new(|| Mutex::new(LogConfig::default()));

/// Install the logger configuration. Prepares (and rotates) the log file and
/// writes a run header so separate daemon runs are easy to tell apart.
pub fn init(config: LogConfig) {
    if let Some(path) = &config.file {
        match prepare_log_file(path) {
            Ok(needs_blank) => {
                if needs_blank {
                    let _ = write_raw_line(path, "");
                }
                let _ = write_raw_line(path, &run_header());
            }
            Err(e) => eprintln!("turnoff: failed to prepare log file {}: {e}", path.display()),
        }
    }

    let mut global = GLOBAL_CONFIG.lock().unwrap_or_else(|e| e.into_inner());
    *global = config;
}

/// Core logging function, used through the `slog!` family of macros.
pub fn log_message(level: LogLevel, prefix: &str, args: Arguments) {
    let config = GLOBAL_CONFIG.lock().unwrap_or_else(|e| e.into_inner());

    if level > config.level {
        return;
    }

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let file_line = format!("[{}][{}][{}] {}", timestamp, level.tag(), prefix, args);

    if let Some(path) = &config.file {
        if let Err(e) = write_line(path, &file_line) {
            eprintln!("Failed to write log: {}", e);
        }
    }

    if config.console || level == LogLevel::Error {
        let console_line = if config.use_colors {
            format!("{}●{} [{}][{}] {}", level.color(), RESET_COLOR, timestamp, prefix, args)
        } else {
            file_line
        };

        match level {
            LogLevel::Error => eprintln!("{}", console_line),
            _ => println!("{}", console_line),
        }
    }
}

#[macro_export]
macro_rules! slog {
    ($level:expr, $prefix:expr, $($arg:tt)*) => {
        $crate::log::log_message($level, $prefix, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! sinfo {
    ($prefix:expr, $($arg:tt)*) => { $crate::slog!($crate::log::LogLevel::Info, $prefix, $($arg)*) };
}

#[macro_export]
macro_rules! swarn {
    ($prefix:expr, $($arg:tt)*) => { $crate::slog!($crate::log::LogLevel::Warn, $prefix, $($arg)*) };
}

#[macro_export]
macro_rules! serror {
    ($prefix:expr, $($arg:tt)*) => { $crate::slog!($crate::log::LogLevel::Error, $prefix, $($arg)*) };
}

#[macro_export]
macro_rules! sdebug {
    ($prefix:expr, $($arg:tt)*) => { $crate::slog!($crate::log::LogLevel::Debug, $prefix, $($arg)*) };
}

/// Default log file location: `$XDG_CACHE_HOME/turnoff/turnoff.log`
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("turnoff")
        .join("turnoff.log")
}

pub fn run_header() -> String {
    let pid = std::process::id();
    format!("==================== turnoff daemon run start (pid={pid}) ====================")
}

/// Ensures the log directory exists and rotates the file if needed.
/// Returns whether a blank separator line should precede the next run header.
fn prepare_log_file(path: &Path) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if meta.len() == 0 {
        return Ok(false);
    }

    if meta.len() >= MAX_LOG_BYTES {
        rotate(path, KEEP_BACKUPS);
        return Ok(false);
    }

    Ok(true)
}

fn rotate(path: &Path, keep_backups: u32) {
    if keep_backups == 0 {
        let _ = fs::remove_file(path);
        return;
    }

    for i in (1..keep_backups).rev() {
        let from = rotated_name(path, i);
        if from.exists() {
            let _ = fs::rename(from, rotated_name(path, i + 1));
        }
    }

    let _ = fs::rename(path, rotated_name(path, 1));
}

fn rotated_name(base: &Path, n: u32) -> PathBuf {
    PathBuf::from(format!("{}.{}", base.display(), n))
}

fn write_raw_line(path: &Path, line: &str) -> io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{line}")?;
    f.flush()
}

fn write_line(path: &Path, line: &str) -> io::Result<()> {
    // The file may have been rotated away by another process.
    if let Ok(meta) = fs::metadata(path) {
        if meta.len() >= MAX_LOG_BYTES {
            rotate(path, KEEP_BACKUPS);
        }
    }
    write_raw_line(path, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_levels_clamp() {
        assert_eq!(LogLevel::from_number(0), LogLevel::Error);
        assert_eq!(LogLevel::from_number(2), LogLevel::Warn);
        assert_eq!(LogLevel::from_number(3), LogLevel::Info);
        assert_eq!(LogLevel::from_number(9), LogLevel::Debug);
    }

    #[test]
    fn rotation_shifts_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnoff.log");

        fs::write(&path, "current").unwrap();
        fs::write(rotated_name(&path, 1), "older").unwrap();

        rotate(&path, 3);

        assert!(!path.exists());
        assert_eq!(fs::read_to_string(rotated_name(&path, 1)).unwrap(), "current");
        assert_eq!(fs::read_to_string(rotated_name(&path, 2)).unwrap(), "older");
    }

    #[test]
    fn prepare_reports_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("turnoff.log");

        assert!(!prepare_log_file(&path).unwrap());
        fs::write(&path, "line\n").unwrap();
        assert!(prepare_log_file(&path).unwrap());
    }
}
