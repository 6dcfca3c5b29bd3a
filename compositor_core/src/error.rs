//! Error types for the compositor
//!
//! This module defines the error types used throughout the crate,
//! including device failures, render target creation and effect processing.

use std::fmt;

/// Result type for compositor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Compositor errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (device lost, lock poisoned, driver failure)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown handle, invalid render target, missing shader)
    InvalidResource(String),

    /// Initialization failed (pipeline, fullscreen quad, uniform buffer)
    InitializationFailed(String),

    /// A render target failed its completeness check
    IncompleteTarget {
        /// Name of the render target
        name: String,
        /// Native status code reported by the device
        status: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::IncompleteTarget { name, status } => {
                write!(f, "Render target '{}' incomplete (status: 0x{:X})", name, status)
            }
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let guard = device.lock()
///     .map_err(|_| engine_err!("compositor::Device", "Graphics device lock poisoned"))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::compositor::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an `Error::BackendError`
///
/// # Example
///
/// ```ignore
/// if width == 0 {
///     engine_bail!("compositor::BloomEffect", "Cannot blur a {}x{} image", width, height);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
