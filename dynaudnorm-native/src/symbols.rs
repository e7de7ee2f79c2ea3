//! Function table for the engine's C API.
//!
//! Every export is named `MDynamicAudioNormalizer_<function>_r<revision>`.
//! Signatures mirror the C header; booleans cross as `int`, instances as an
//! opaque pointer.

use std::ffi::{c_char, c_int, c_void};

use libloading::Library;

use dynaudnorm_core::boundary;
use dynaudnorm_core::{NormalizerError, Result};

/// Engine log callback: `(level, message)`.
pub(crate) type LogFunction = unsafe extern "C" fn(level: c_int, message: *const c_char);

/// Exported symbol name for `function` at API `revision`.
pub fn symbol_name(function: &str, revision: u32) -> String {
    format!("MDynamicAudioNormalizer_{}_r{}", function, revision)
}

/// Engine C API function pointers.
#[allow(clippy::type_complexity)]
pub(crate) struct EngineSymbols {
    pub create_instance: unsafe extern "C" fn(
        channels: u32,
        sample_rate: u32,
        frame_len_msec: u32,
        filter_size: u32,
        peak_value: f64,
        max_amplification: f64,
        target_rms: f64,
        compress_factor: f64,
        channels_coupled: c_int,
        enable_dc_correction: c_int,
        alt_boundary_mode: c_int,
        log_file: *mut c_void,
    ) -> *mut c_void,

    pub destroy_instance: unsafe extern "C" fn(handle: *mut *mut c_void),

    pub process: unsafe extern "C" fn(
        handle: *mut c_void,
        samples_in: *const *const f64,
        samples_out: *const *mut f64,
        input_size: i64,
        output_size: *mut i64,
    ) -> c_int,

    pub process_inplace: unsafe extern "C" fn(
        handle: *mut c_void,
        samples_in_out: *const *mut f64,
        input_size: i64,
        output_size: *mut i64,
    ) -> c_int,

    pub flush_buffer: unsafe extern "C" fn(
        handle: *mut c_void,
        samples_out: *const *mut f64,
        buffer_size: i64,
        output_size: *mut i64,
    ) -> c_int,

    pub reset: unsafe extern "C" fn(handle: *mut c_void) -> c_int,

    pub get_configuration: unsafe extern "C" fn(
        handle: *mut c_void,
        channels: *mut u32,
        sample_rate: *mut u32,
        frame_len: *mut u32,
        filter_size: *mut u32,
    ) -> c_int,

    pub get_internal_delay: unsafe extern "C" fn(handle: *mut c_void, delay: *mut i64) -> c_int,

    pub get_version_info: unsafe extern "C" fn(major: *mut u32, minor: *mut u32, patch: *mut u32),

    pub get_build_info: unsafe extern "C" fn(
        date: *mut *const c_char,
        time: *mut *const c_char,
        compiler: *mut *const c_char,
        arch: *mut *const c_char,
        debug: *mut c_int,
    ),

    pub set_log_function: unsafe extern "C" fn(function: Option<LogFunction>) -> Option<LogFunction>,
}

// SAFETY: plain function pointers into the loaded library. The owning
// `NativeEngine` keeps the `Library` alive for as long as the table exists.
unsafe impl Send for EngineSymbols {}
unsafe impl Sync for EngineSymbols {}

impl std::fmt::Debug for EngineSymbols {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSymbols").field("loaded", &true).finish()
    }
}

impl EngineSymbols {
    /// Resolve every export at `revision` from `lib`.
    ///
    /// `library` is used for error reporting only.
    pub fn load(lib: &Library, library: &str, revision: u32) -> Result<Self> {
        let resolver = Resolver { lib, library, revision };

        // SAFETY: each type below matches the corresponding declaration in the
        // engine's C header for this revision.
        unsafe {
            Ok(Self {
                create_instance: resolver.get("createInstance")?,
                destroy_instance: resolver.get("destroyInstance")?,
                process: resolver.get("process")?,
                process_inplace: resolver.get("processInplace")?,
                flush_buffer: resolver.get("flushBuffer")?,
                reset: resolver.get("reset")?,
                get_configuration: resolver.get("getConfiguration")?,
                get_internal_delay: resolver.get("getInternalDelay")?,
                get_version_info: resolver.get("getVersionInfo")?,
                get_build_info: resolver.get("getBuildInfo")?,
                set_log_function: resolver.get("setLogFunction")?,
            })
        }
    }
}

struct Resolver<'a> {
    lib: &'a Library,
    library: &'a str,
    revision: u32,
}

impl Resolver<'_> {
    /// Look up `function` and copy out the raw pointer.
    ///
    /// # Safety
    /// `T` must be the exact function pointer type of the export.
    unsafe fn get<T: Copy>(&self, function: &str) -> Result<T> {
        let name = symbol_name(function, self.revision);
        let mut raw = name.clone().into_bytes();
        raw.push(0);

        let symbol = unsafe { self.lib.get::<T>(&raw) }.map_err(|e| NormalizerError::NativeLoadFailure {
            library: self.library.to_string(),
            reason: format!("missing symbol {}: {}", name, boundary::describe_fault(&e)),
        })?;
        Ok(*symbol)
    }
}
