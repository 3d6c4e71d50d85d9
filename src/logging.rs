//! Run logging.
//!
//! Every record is appended to a scratch log file named after the
//! command and pid; warnings and errors are echoed to stderr as well.
//! On a clean exit the scratch file is discarded; on a fatal abort it is
//! preserved under the log directory with a timestamped name so the
//! failure can be inspected after the process is gone.

use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// File-backed run logger, passed by reference to whoever needs to log.
///
/// Each record carries the invoking command line so a preserved log is
/// self-describing.
pub struct Logger {
    command: String,
    context: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl Logger {
    /// Opens the scratch log `<tmp>/<command>_<pid>.log`.
    pub fn open(command: &str, context: &str) -> std::io::Result<Logger> {
        let path = std::env::temp_dir().join(format!("{}_{}.log", command, std::process::id()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Logger {
            command: command.to_string(),
            context: context.to_string(),
            path,
            file: Mutex::new(file),
        })
    }

    fn log(&self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!(
            "{} {} {} - {} command: {}",
            timestamp, level, self.command, message, self.context
        );
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", entry);
        }
        if level >= LogLevel::Warning {
            eprintln!("{}", entry);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Clean-exit path: the scratch file has nothing worth keeping.
    pub fn discard(self) {
        let _ = std::fs::remove_file(&self.path);
    }

    /// Fatal-abort path: move the scratch file into `log_dir` under a
    /// timestamped name and return where it went.
    pub fn preserve(self, log_dir: &Path) -> std::io::Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let dest = log_dir.join(format!(
            "{}_{}_{}.log",
            self.command,
            stamp,
            std::process::id()
        ));
        std::fs::rename(&self.path, &dest)?;
        Ok(dest)
    }
}
