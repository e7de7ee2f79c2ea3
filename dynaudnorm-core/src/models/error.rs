use thiserror::Error;

/// Errors raised by the normalizer binding.
///
/// Every failure surfaced while crossing the foreign boundary ends up as one of
/// these variants. Native fault representations never leak through; their type
/// name and message survive only as diagnostic text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizerError {
    /// The native module could not be resolved or loaded. Not retried.
    #[error("failed to load native library {library}: {reason}")]
    NativeLoadFailure { library: String, reason: String },

    /// A fault was raised while crossing the foreign boundary.
    #[error("failed to call native function {operation}: {cause}")]
    NativeCallFailure { operation: &'static str, cause: String },

    /// The native engine refused to create an instance.
    #[error("failed to create native instance: {0}")]
    CreationFailure(String),

    /// Operation attempted on a session that is not active.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// Bad configuration, buffer shape, or malformed sample stream.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A native call reported failure through its sentinel return value.
    #[error("native {operation} reported failure")]
    OperationFailed { operation: &'static str },

    /// The native destroy call failed. The handle has already been invalidated.
    #[error("failed to destroy native instance {handle}")]
    DestructionFailure { handle: i32 },

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NormalizerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NormalizerError>;
