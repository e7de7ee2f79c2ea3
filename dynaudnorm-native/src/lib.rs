//! # dynaudnorm-native
//!
//! Runtime-loaded backend for `dynaudnorm-core`.
//!
//! Resolves the versioned `DynamicAudioNormalizerAPI` shared library, binds
//! its C API through `libloading`, and implements `EngineApi` on top of it.
//! The library is loaded at most once per process, on first use.
//!
//! ## Architecture
//!
//! ```text
//! dynaudnorm-native (this crate)
//! ├── library_name  ← module naming, LoaderOptions
//! ├── symbols       ← C API function table
//! ├── handles       ← integer handle ⇄ instance pointer table
//! ├── logging       ← process-wide logger slot + C trampoline
//! └── engine        ← NativeEngine (EngineApi), NativeLoader
//! ```

mod engine;
mod handles;
mod library_name;
mod logging;
mod symbols;

use std::sync::Arc;

use dynaudnorm_core::{
    BuildInfo, EngineApi, EngineConfiguration, EngineLogger, NormalizerError, Result, SessionHandle, VersionInfo,
};

pub use engine::{shared_loader, NativeEngine, NativeLoader};
pub use library_name::{
    resolve_module_name, LoaderOptions, PlatformClass, CORE_VERSION, LIBRARY_PATH_ENV, MODULE_NAME,
};
pub use symbols::symbol_name;

/// Create a session on the shared engine.
///
/// `config` is validated before the library is touched. A library that
/// cannot be loaded surfaces as `CreationFailure`.
pub fn create_session(config: EngineConfiguration) -> Result<SessionHandle> {
    create_session_with(shared_loader(), config)
}

/// Create a session on the engine behind `loader`.
pub fn create_session_with(loader: &NativeLoader, config: EngineConfiguration) -> Result<SessionHandle> {
    config.validate()?;
    let engine = loader.engine().map_err(|err| match err {
        NormalizerError::NativeLoadFailure { .. } => NormalizerError::CreationFailure(err.to_string()),
        other => other,
    })?;
    SessionHandle::create(engine, config)
}

pub fn version_info() -> Result<VersionInfo> {
    NativeEngine::shared()?.version_info()
}

pub fn build_info() -> Result<BuildInfo> {
    NativeEngine::shared()?.build_info()
}

/// Register the process-wide engine logger. `None` detaches it.
pub fn set_logging_handler(logger: Option<Arc<dyn EngineLogger>>) -> Result<bool> {
    NativeEngine::shared()?.set_logging_handler(logger)
}
