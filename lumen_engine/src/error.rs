//! Error types for the Lumen engine.
//!
//! Three families of failure exist in the runtime core:
//! - backend failures (`BackendError`, `OutOfMemory`, `DeviceLost`) which are
//!   fatal: partial GPU state cannot be rolled back;
//! - misuse of the structural API (stale handles, cycles, frame protocol
//!   violations) which is reported without touching any state;
//! - configuration and initialization problems.
//!
//! Missing assets are NOT errors: they surface as `None` at the point of use.

use std::fmt;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific failure (command recording, submission, presentation)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// The GPU device was lost
    DeviceLost,

    /// Invalid GPU resource description or usage
    InvalidResource(String),

    /// Initialization failed (device, surface, frame ring)
    InitializationFailed(String),

    /// A handle that does not (or no longer) resolve to a live object
    InvalidHandle(String),

    /// An operation that would break a structural invariant
    InvalidOperation(String),

    /// Rejected configuration value
    InvalidConfig(String),
}

impl Error {
    /// Whether this error leaves the GPU timeline in an unknown state.
    ///
    /// Fatal errors are never handled inside the core; the frame loop
    /// aborts the process after logging them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::BackendError(_) | Error::OutOfMemory | Error::DeviceLost)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::DeviceLost => write!(f, "GPU device lost"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log a fatal error and abort the process.
///
/// Used at the outermost frame-loop boundary only. Anything below it
/// propagates with `?`.
pub fn abort_on_fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            crate::engine_error!("lumen::Fatal", "unrecoverable error, aborting: {}", err);
            std::process::abort();
        }
    }
}

// ===== ERROR MACROS =====

/// Build an `Error::InvalidOperation`, logging it at ERROR level.
///
/// ```ignore
/// let node = self.objects.get(key)
///     .ok_or_else(|| engine_err!("lumen::SceneGraph", "unknown object {:?}", key))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::error::Error::InvalidOperation(message)
    }};
}

/// Return early with an `Error::InvalidOperation`, logging it at ERROR level.
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
