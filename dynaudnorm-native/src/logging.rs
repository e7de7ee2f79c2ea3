//! Process-wide engine logger slot.
//!
//! The engine accepts one plain C callback. [`log_trampoline`] is that
//! callback; it forwards to whatever [`EngineLogger`] currently sits in the
//! slot. Events may arrive on an engine-owned thread.

use std::ffi::{c_char, c_int, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use dynaudnorm_core::{EngineLogger, LogLevel};

use crate::symbols::LogFunction;

static LOGGER: RwLock<Option<Arc<dyn EngineLogger>>> = parking_lot::const_rwlock(None);

/// Held across the slot update and the native registration. Separate from
/// `LOGGER` so the engine may log from inside `setLogFunction`.
static REGISTRATION: Mutex<()> = parking_lot::const_mutex(());

/// Install `logger` and hand the matching callback to `set_native`, as one
/// step with respect to other registrations.
pub(crate) fn register<F>(logger: Option<Arc<dyn EngineLogger>>, set_native: F)
where
    F: FnOnce(Option<LogFunction>),
{
    let _registration = REGISTRATION.lock();
    let callback = if install(logger) {
        Some(log_trampoline as LogFunction)
    } else {
        None
    };
    set_native(callback);
}

/// Replace the registered logger. Returns whether one is now installed.
pub(crate) fn install(logger: Option<Arc<dyn EngineLogger>>) -> bool {
    let installed = logger.is_some();
    *LOGGER.write() = logger;
    installed
}

/// Deliver one event to the registered logger, if any.
pub(crate) fn dispatch(level: c_int, message: &str) {
    // Clone out so the logger runs without the slot locked.
    let logger = LOGGER.read().clone();
    if let Some(logger) = logger {
        logger.log(LogLevel::from_raw(level), message);
    }
}

/// C entry point registered with the engine. Never unwinds.
pub(crate) extern "C" fn log_trampoline(level: c_int, message: *const c_char) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if message.is_null() {
            return;
        }
        // SAFETY: the engine passes a NUL-terminated string that stays valid
        // for the duration of the callback.
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
        dispatch(level, &text);
    }));
}
