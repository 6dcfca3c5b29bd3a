//! Process-wide state: the active logger, its severity filter and the
//! optional device slot. Frame pipelines themselves are owned values.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use crate::device::{GraphicsDevice, SharedDevice};
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Device slot, present once `Engine::initialize` has run
static DEVICE_SLOT: OnceLock<RwLock<Option<SharedDevice>>> = OnceLock::new();

/// Active logger, `DefaultLogger` until replaced
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Entries below this severity are discarded
static MIN_SEVERITY: RwLock<LogSeverity> = RwLock::new(LogSeverity::Trace);

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

fn reported(error: Error) -> Error {
    crate::engine_error!("compositor::Engine", "{}", error);
    error
}

fn device_slot() -> Result<&'static RwLock<Option<SharedDevice>>> {
    DEVICE_SLOT.get().ok_or_else(|| {
        reported(Error::InitializationFailed(
            "Engine not initialized, call Engine::initialize() first".to_string(),
        ))
    })
}

fn poisoned<T>(_: T) -> Error {
    reported(Error::BackendError("Device slot lock poisoned".to_string()))
}

// ===== PUBLIC API =====

/// Process-wide access point for the logger and an optional shared device
///
/// Hosts that pass `SharedDevice` values around explicitly never need the
/// device slot; logging works without `initialize`.
///
/// ```no_run
/// use compositor_core::compositor::Engine;
///
/// Engine::initialize()?;
/// // Engine::create_device(MyGlDevice::new(&context)?)?;
/// let device = Engine::device()?;
/// Engine::shutdown();
/// # Ok::<(), compositor_core::compositor::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Create the device slot. Calling it again is harmless.
    pub fn initialize() -> Result<()> {
        DEVICE_SLOT.get_or_init(|| RwLock::new(None));
        Ok(())
    }

    /// Empty the device slot
    ///
    /// Targets and pipelines keep their own `SharedDevice` clones, so the
    /// device outlives the slot until the last of them is dropped.
    pub fn shutdown() {
        if let Some(slot) = DEVICE_SLOT.get() {
            if let Ok(mut current) = slot.write() {
                current.take();
            }
        }
    }

    /// Share `device` and place it in the slot
    pub fn create_device<D: GraphicsDevice + 'static>(device: D) -> Result<SharedDevice> {
        let shared: SharedDevice = Arc::new(Mutex::new(device));
        Self::register_device(Arc::clone(&shared))?;
        crate::engine_info!("compositor::Engine", "Graphics device registered");
        Ok(shared)
    }

    /// Place an already shared device in the slot
    ///
    /// Fails when the slot is occupied; `destroy_device` empties it.
    pub fn register_device(device: SharedDevice) -> Result<()> {
        let mut current = device_slot()?.write().map_err(poisoned)?;
        if current.is_some() {
            return Err(reported(Error::InitializationFailed(
                "A graphics device is already registered, call Engine::destroy_device() first".to_string(),
            )));
        }
        *current = Some(device);
        Ok(())
    }

    /// Clone of the registered device
    pub fn device() -> Result<SharedDevice> {
        let current = device_slot()?.read().map_err(poisoned)?;
        current.as_ref().map(Arc::clone).ok_or_else(|| {
            reported(Error::InitializationFailed(
                "Graphics device not created, call Engine::create_device() first".to_string(),
            ))
        })
    }

    /// Empty the slot. Succeeds when it is already empty.
    pub fn destroy_device() -> Result<()> {
        device_slot()?.write().map_err(poisoned)?.take();
        Ok(())
    }

    /// Clear singletons between tests
    #[doc(hidden)]
    pub fn reset_for_testing() {
        Self::shutdown();
        Self::set_min_severity(LogSeverity::Trace);
    }

    // ===== LOGGING API =====

    /// Route every following entry to `logger`
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Go back to the console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Drop every entry below `severity` before it reaches the logger
    pub fn set_min_severity(severity: LogSeverity) {
        if let Ok(mut min) = MIN_SEVERITY.write() {
            *min = severity;
        }
    }

    /// Current minimum severity
    pub fn min_severity() -> LogSeverity {
        MIN_SEVERITY.read().map(|min| *min).unwrap_or(LogSeverity::Trace)
    }

    /// Target of `engine_trace!` through `engine_warn!`
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Target of `engine_error!`, which adds the call site
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if severity < Self::min_severity() {
            return;
        }
        if let Ok(logger) = logger_lock().read() {
            logger.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file,
                line,
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
