use std::ffi::OsString;
use std::path::PathBuf;

/// Undecorated name of the engine's shared library.
pub const MODULE_NAME: &str = "DynamicAudioNormalizerAPI";

/// Revision of the engine C API this binding is written against.
///
/// Exported symbols carry it as an `_r<N>` suffix and, on Unix-like systems,
/// the module name carries it as a `-<N>` suffix.
pub const CORE_VERSION: u32 = 8;

/// Environment variable naming an explicit shared library path.
pub const LIBRARY_PATH_ENV: &str = "DYNAUDNORM_LIBRARY";

/// Platform family, as far as module naming is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformClass {
    /// Modules are installed under their bare name.
    Windows,
    /// Modules are installed side by side, one per core version.
    Unix,
}

impl PlatformClass {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

/// Undecorated module name to load.
///
/// Versioned as `<module>-<version>` on Unix when a core version is known,
/// bare otherwise. Platform prefix and suffix are added separately by
/// [`LoaderOptions::library_target`].
pub fn resolve_module_name(module: &str, platform: PlatformClass, core_version: Option<u32>) -> String {
    match (platform, core_version) {
        (PlatformClass::Unix, Some(version)) => format!("{}-{}", module, version),
        _ => module.to_string(),
    }
}

/// Where and what to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub module_name: String,
    /// `None` falls back to the unversioned module name.
    pub core_version: Option<u32>,
    pub platform: PlatformClass,
    /// Explicit library path. Bypasses name resolution entirely.
    pub library_path: Option<PathBuf>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            module_name: MODULE_NAME.to_string(),
            core_version: Some(CORE_VERSION),
            platform: PlatformClass::current(),
            library_path: None,
        }
    }
}

impl LoaderOptions {
    /// Defaults, plus an explicit path from `DYNAUDNORM_LIBRARY` if set.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(path) = std::env::var_os(LIBRARY_PATH_ENV).filter(|p| !p.is_empty()) {
            options.library_path = Some(PathBuf::from(path));
        }
        options
    }

    pub fn resolved_module_name(&self) -> String {
        resolve_module_name(&self.module_name, self.platform, self.core_version)
    }

    /// Argument for the dynamic loader: the explicit path, or the resolved
    /// module name with the platform's library prefix and suffix.
    pub fn library_target(&self) -> OsString {
        match &self.library_path {
            Some(path) => path.clone().into_os_string(),
            None => libloading::library_filename(self.resolved_module_name()),
        }
    }

    /// API revision used for symbol names.
    pub fn symbol_revision(&self) -> u32 {
        self.core_version.unwrap_or(CORE_VERSION)
    }
}
