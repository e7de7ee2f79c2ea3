//! Fault translation at the foreign boundary.
//!
//! Every call into the engine runs through [`guard`]. A panic unwinding out of
//! the call is caught and turned into `NativeCallFailure`; errors already typed
//! as `NormalizerError` pass through unchanged. The fault's type and message
//! are kept only as text, formatted as `<fault type>: "<message>"`. Only the
//! guard that catches a fault logs it as an error, so nested guards report
//! each fault once.

use std::any::{type_name, Any};
use std::panic::{self, AssertUnwindSafe};

use crate::models::error::{NormalizerError, Result};

/// Fault type reported for caught panics.
const PANIC_FAULT: &str = "panic";

/// Run `call`, translating any fault it raises into a `NormalizerError`.
pub fn guard<T, F>(operation: &'static str, call: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        // Already typed; whoever raised it has logged it.
        Ok(Err(err)) => {
            log::debug!("{} failed: {}", operation, err);
            Err(err)
        }
        Err(payload) => {
            let cause = describe_panic(payload.as_ref());
            log::error!("{} raised a fault: {}", operation, cause);
            Err(NormalizerError::NativeCallFailure { operation, cause })
        }
    }
}

/// Format an error as `<type>: "<message>"`.
pub fn describe_fault<E: std::error::Error>(err: &E) -> String {
    format!("{}: \"{}\"", type_name::<E>(), err)
}

/// Wrap a boundary error as `NativeCallFailure`.
pub fn call_failure<E: std::error::Error>(operation: &'static str, err: &E) -> NormalizerError {
    NormalizerError::NativeCallFailure {
        operation,
        cause: describe_fault(err),
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string payload>".to_string()
    };
    format!("{}: \"{}\"", PANIC_FAULT, message)
}
