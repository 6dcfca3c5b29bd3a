//! Compositor diagnostics
//!
//! Render-target creation, effect passes and the frame stages report through
//! a replaceable [`Logger`]. Nothing in the frame path returns errors to the
//! host loop: failures end up here as `Error` entries carrying the call site.
//!
//! The `engine_*` macros are the only entry points used inside the crate.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for compositor diagnostics
///
/// Install one with `Engine::set_logger` to route entries to an editor
/// console, a file or a test buffer.
///
/// ```no_run
/// use compositor_core::compositor::log::{Logger, LogEntry};
///
/// struct ConsolePanelLogger {
///     lines: std::sync::Mutex<Vec<String>>,
/// }
///
/// impl Logger for ConsolePanelLogger {
///     fn log(&self, entry: &LogEntry) {
///         if let Ok(mut lines) = self.lines.lock() {
///             lines.push(entry.message.clone());
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One diagnostic record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, e.g. "compositor::EffectStack"
    pub source: String,
    pub message: String,
    /// Call site, filled by `engine_error!` only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` of the call site, when recorded
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }

    fn local_time(&self) -> String {
        let local: DateTime<Local> = self.timestamp.into();
        local.format("%H:%M:%S%.3f").to_string()
    }
}

/// Ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-pass chatter (bind calls, pass routing)
    Trace,
    Debug,
    /// Resource creation and resizes
    Info,
    /// Degraded but recoverable situations
    Warn,
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the default logger
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn tint(&self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.dimmed(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Console logger installed until `Engine::set_logger` replaces it
///
/// Lines read `[time] [LEVEL] [source] message`, followed by `(file:line)`
/// when the entry carries a call site. Errors go to stderr.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry without colors
    pub fn format_plain(entry: &LogEntry) -> String {
        compose(
            &entry.local_time(),
            entry.severity.label(),
            &entry.source,
            &entry.message,
            entry.location(),
        )
    }
}

fn compose(
    time: &str,
    level: impl std::fmt::Display,
    source: impl std::fmt::Display,
    message: &str,
    location: Option<String>,
) -> String {
    let mut text = format!("[{}] [{}] [{}] {}", time, level, source, message);
    if let Some(location) = location {
        text.push_str(&format!(" ({})", location));
    }
    text
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let text = compose(
            &entry.local_time(),
            entry.severity.tint(),
            entry.source.as_str().bright_blue(),
            &entry.message,
            entry.location(),
        );
        if entry.severity == LogSeverity::Error {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }
}

// ===== LOGGING MACROS =====

#[doc(hidden)]
#[macro_export]
macro_rules! __compositor_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::compositor::Engine::log(
            $crate::compositor::log::LogSeverity::$severity,
            $source,
            format!($($arg)*),
        )
    };
}

/// `engine_trace!("compositor::EffectStack", "Pass {}/{} of '{}'", i + 1, n, name);`
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__compositor_log!(Trace, $source, $($arg)*) };
}

/// `engine_debug!("compositor::OpaquePass", "Skipping '{}': no material", name);`
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__compositor_log!(Debug, $source, $($arg)*) };
}

/// `engine_info!("compositor::RenderTarget", "Created '{}' ({}x{})", name, w, h);`
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::__compositor_log!(Info, $source, $($arg)*) };
}

/// `engine_warn!("compositor::FogEffect", "Scene target has no depth texture");`
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__compositor_log!(Warn, $source, $($arg)*) };
}

/// Error entry tagged with the call site
///
/// `engine_error!("compositor::RenderTarget", "Framebuffer incomplete: 0x{:X}", status);`
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::compositor::Engine::log_detailed(
            $crate::compositor::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
