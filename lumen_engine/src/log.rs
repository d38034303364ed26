//! Engine logging.
//!
//! All engine subsystems log through a single process-wide logger slot:
//! - Pluggable sink via the `Logger` trait (console, file, test capture...)
//! - Severity levels (Trace, Debug, Info, Warn, Error) with a global floor
//! - Colored console output by default
//! - File and line information on ERROR entries
//!
//! The logger is the only process global in the engine. Everything else
//! (device, scene, frame loop) is an explicit object owned by the caller.

use std::sync::{OnceLock, RwLock};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::SystemTime;
use chrono::{DateTime, Local};
use colored::*;

/// Sink for engine log entries.
///
/// # Example
///
/// ```no_run
/// use lumen_engine::lumen::log::{Logger, LogEntry};
///
/// struct FileLogger;
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// lumen_engine::lumen::log::set_logger(FileLogger);
/// ```
pub trait Logger: Send + Sync {
    /// Consume one entry. Called with the logger slot read-locked.
    fn log(&self, entry: &LogEntry);
}

/// One log record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Time the entry was emitted
    pub timestamp: SystemTime,

    /// Emitting subsystem (e.g. "lumen::FrameRing", "lumen::SceneGraph")
    pub source: String,

    /// Formatted message
    pub message: String,

    /// Source file (ERROR entries only)
    pub file: Option<&'static str>,

    /// Source line (ERROR entries only)
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Per-frame chatter (barriers, queue sizes)
    Trace,

    /// Development information
    Debug,

    /// Lifecycle milestones (startup, resize, shutdown)
    Info,

    /// Recoverable problems (missing resources, skipped draws)
    Warn,

    /// Failures, carries file:line
    Error,
}

impl LogSeverity {
    fn as_u8(self) -> u8 {
        match self {
            LogSeverity::Trace => 0,
            LogSeverity::Debug => 1,
            LogSeverity::Info => 2,
            LogSeverity::Warn => 3,
            LogSeverity::Error => 4,
        }
    }

    /// Fixed-width label used by the console logger.
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Colored console logger.
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry as a plain (uncolored) line.
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, entry.severity.label(), entry.source, entry.message, file, line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp, entry.severity.label(), entry.source, entry.message
            ),
        }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity = match entry.severity {
            LogSeverity::Trace => entry.severity.label().bright_black(),
            LogSeverity::Debug => entry.severity.label().cyan(),
            LogSeverity::Info => entry.severity.label().green(),
            LogSeverity::Warn => entry.severity.label().yellow(),
            LogSeverity::Error => entry.severity.label().red().bold(),
        };
        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            eprintln!("[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, source, entry.message, file, line);
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message);
        }
    }
}

// ===== LOGGER SLOT =====

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(0);

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Replace the active logger.
pub fn set_logger<L: Logger + 'static>(logger: L) {
    if let Ok(mut lock) = logger_slot().write() {
        *lock = Box::new(logger);
    }
}

/// Restore the colored console logger.
pub fn reset_logger() {
    set_logger(DefaultLogger);
}

/// Drop every entry below `severity`.
pub fn set_min_severity(severity: LogSeverity) {
    MIN_SEVERITY.store(severity.as_u8(), Ordering::Relaxed);
}

/// Current severity floor.
pub fn min_severity() -> LogSeverity {
    match MIN_SEVERITY.load(Ordering::Relaxed) {
        0 => LogSeverity::Trace,
        1 => LogSeverity::Debug,
        2 => LogSeverity::Info,
        3 => LogSeverity::Warn,
        _ => LogSeverity::Error,
    }
}

/// Whether an entry of this severity would reach the logger.
pub fn enabled(severity: LogSeverity) -> bool {
    severity.as_u8() >= MIN_SEVERITY.load(Ordering::Relaxed)
}

/// Emit an entry. Used by the `engine_*!` macros.
pub fn dispatch(
    severity: LogSeverity,
    source: &str,
    message: String,
    location: Option<(&'static str, u32)>,
) {
    if !enabled(severity) {
        return;
    }
    if let Ok(lock) = logger_slot().read() {
        lock.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: location.map(|(file, _)| file),
            line: location.map(|(_, line)| line),
        });
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (per-frame detail).
///
/// ```ignore
/// engine_trace!("lumen::RenderGraph", "barrier {:?}", barrier);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::dispatch($crate::log::LogSeverity::Trace, $source, format!($($arg)*), None)
    };
}

/// Log a DEBUG message.
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::dispatch($crate::log::LogSeverity::Debug, $source, format!($($arg)*), None)
    };
}

/// Log an INFO message.
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::dispatch($crate::log::LogSeverity::Info, $source, format!($($arg)*), None)
    };
}

/// Log a WARN message.
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::dispatch($crate::log::LogSeverity::Warn, $source, format!($($arg)*), None)
    };
}

/// Log an ERROR message with file:line information.
///
/// ```ignore
/// engine_error!("lumen::FrameLoop", "device lost: {}", err);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::dispatch(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            Some((file!(), line!())),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
