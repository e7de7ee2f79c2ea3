use std::ffi::{c_char, c_int, CStr};
use std::ptr;
use std::sync::{Arc, OnceLock};

use libloading::Library;

use dynaudnorm_core::boundary;
use dynaudnorm_core::{
    AppliedConfiguration, BuildInfo, EngineApi, EngineConfiguration, EngineLogger, NormalizerError, Result,
    SampleBuffer, VersionInfo,
};

use crate::handles::{HandleTable, InstancePtr};
use crate::library_name::LoaderOptions;
use crate::logging;
use crate::symbols::EngineSymbols;

/// The engine library, loaded and bound.
///
/// Instances are addressed by integer handles from an internal table; the
/// raw instance pointers never leave this type. Dropping the engine destroys
/// any instance still registered.
pub struct NativeEngine {
    symbols: EngineSymbols,
    handles: HandleTable,
    library_name: String,
    /// Must outlive every pointer in `symbols`.
    _library: Library,
}

impl std::fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEngine")
            .field("library", &self.library_name)
            .field("live_instances", &self.handles.len())
            .finish()
    }
}

impl NativeEngine {
    /// Load the library described by `options` and bind every export.
    ///
    /// Any failure here is a `NativeLoadFailure`.
    pub fn load(options: &LoaderOptions) -> Result<Self> {
        let target = options.library_target();
        let library_name = target.to_string_lossy().into_owned();
        log::debug!("Loading native library {}", library_name);

        // SAFETY: loading runs the library's initializers. The engine library
        // has no initialization side effects beyond its own globals.
        let library = unsafe { Library::new(&target) }.map_err(|e| NormalizerError::NativeLoadFailure {
            library: library_name.clone(),
            reason: boundary::describe_fault(&e),
        })?;
        let symbols = EngineSymbols::load(&library, &library_name, options.symbol_revision())?;

        log::info!("Loaded native library {}", library_name);
        Ok(Self {
            symbols,
            handles: HandleTable::new(),
            library_name,
            _library: library,
        })
    }

    /// The process-wide engine, loaded on first use.
    pub fn shared() -> Result<Arc<NativeEngine>> {
        shared_loader().engine()
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    fn instance(&self, handle: i32) -> Option<InstancePtr> {
        let instance = self.handles.get(handle);
        if instance.is_none() {
            log::warn!("Unknown native handle {}", handle);
        }
        instance
    }

    /// Frame count from a native status and out-parameter.
    fn produced(status: c_int, count: i64) -> i64 {
        if status != 0 && count >= 0 {
            count
        } else {
            -1
        }
    }

    fn destroy_raw(&self, instance: InstancePtr) -> bool {
        let mut raw = instance.as_ptr();
        // SAFETY: `raw` came from createInstance and has just been removed from
        // the table, so nothing else can reach it.
        unsafe { (self.symbols.destroy_instance)(&mut raw) };
        raw.is_null()
    }
}

fn owned_string(raw: *const c_char) -> String {
    if raw.is_null() {
        return String::new();
    }
    // SAFETY: the engine returns pointers to static NUL-terminated strings.
    unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
}

fn frame_len(frame_count: usize) -> Result<i64> {
    i64::try_from(frame_count)
        .map_err(|_| NormalizerError::Validation(format!("frame count {} out of range", frame_count)))
}

impl EngineApi for NativeEngine {
    fn version_info(&self) -> Result<VersionInfo> {
        boundary::guard("getVersionInfo", || {
            let (mut major, mut minor, mut patch) = (0u32, 0u32, 0u32);
            // SAFETY: out-parameters point at live locals.
            unsafe { (self.symbols.get_version_info)(&mut major, &mut minor, &mut patch) };
            Ok(VersionInfo { major, minor, patch })
        })
    }

    fn build_info(&self) -> Result<BuildInfo> {
        boundary::guard("getBuildInfo", || {
            let mut date: *const c_char = ptr::null();
            let mut time: *const c_char = ptr::null();
            let mut compiler: *const c_char = ptr::null();
            let mut arch: *const c_char = ptr::null();
            let mut debug: c_int = 0;
            // SAFETY: out-parameters point at live locals.
            unsafe {
                (self.symbols.get_build_info)(&mut date, &mut time, &mut compiler, &mut arch, &mut debug)
            };
            Ok(BuildInfo {
                build_date: owned_string(date),
                build_time: owned_string(time),
                compiler: owned_string(compiler),
                architecture: owned_string(arch),
                debug_build: debug != 0,
            })
        })
    }

    fn set_logging_handler(&self, logger: Option<Arc<dyn EngineLogger>>) -> Result<bool> {
        boundary::guard("setLogFunction", || {
            logging::register(logger, |callback| {
                // SAFETY: the trampoline is a plain `extern "C"` function that
                // never unwinds and stays valid for the life of the process.
                unsafe { (self.symbols.set_log_function)(callback) };
            });
            Ok(true)
        })
    }

    fn create_instance(&self, config: &EngineConfiguration) -> Result<i32> {
        boundary::guard("createInstance", || {
            // SAFETY: scalar arguments only; a null log file disables file logging.
            let raw = unsafe {
                (self.symbols.create_instance)(
                    config.channels,
                    config.sample_rate,
                    config.frame_len_msec,
                    config.filter_size,
                    config.peak_value,
                    config.max_amplification,
                    config.target_rms,
                    config.compress_factor,
                    c_int::from(config.channels_coupled),
                    c_int::from(config.enable_dc_correction),
                    c_int::from(config.alt_boundary_mode),
                    ptr::null_mut(),
                )
            };
            let Some(instance) = InstancePtr::new(raw) else {
                log::warn!("createInstance returned null");
                return Ok(-1);
            };

            match self.handles.insert(instance) {
                Some(handle) => Ok(handle),
                None => {
                    log::error!("Native handle space exhausted");
                    self.destroy_raw(instance);
                    Ok(-1)
                }
            }
        })
    }

    fn destroy_instance(&self, handle: i32) -> Result<bool> {
        boundary::guard("destroyInstance", || {
            Ok(match self.handles.remove(handle) {
                Some(instance) => self.destroy_raw(instance),
                None => {
                    log::warn!("destroyInstance for unknown handle {}", handle);
                    false
                }
            })
        })
    }

    fn process_inplace(&self, handle: i32, buffer: &mut SampleBuffer, frame_count: usize) -> Result<i64> {
        boundary::guard("processInplace", || {
            let Some(instance) = self.instance(handle) else {
                return Ok(-1);
            };
            let input_size = frame_len(frame_count)?;
            let channels = buffer.channel_ptrs_mut();
            let mut output_size: i64 = 0;
            // SAFETY: one pointer per channel, each valid for `frame_count`
            // samples (checked by the caller against the buffer capacity).
            let status = unsafe {
                (self.symbols.process_inplace)(instance.as_ptr(), channels.as_ptr(), input_size, &mut output_size)
            };
            Ok(Self::produced(status, output_size))
        })
    }

    fn process(
        &self,
        handle: i32,
        source: &SampleBuffer,
        dest: &mut SampleBuffer,
        frame_count: usize,
    ) -> Result<i64> {
        boundary::guard("process", || {
            let Some(instance) = self.instance(handle) else {
                return Ok(-1);
            };
            let input_size = frame_len(frame_count)?;
            let inputs = source.channel_ptrs();
            let outputs = dest.channel_ptrs_mut();
            let mut output_size: i64 = 0;
            // SAFETY: the engine only reads through `inputs`; both pointer sets
            // are valid for `frame_count` samples per channel.
            let status = unsafe {
                (self.symbols.process)(
                    instance.as_ptr(),
                    inputs.as_ptr(),
                    outputs.as_ptr(),
                    input_size,
                    &mut output_size,
                )
            };
            Ok(Self::produced(status, output_size))
        })
    }

    fn flush_buffer(&self, handle: i32, output: &mut SampleBuffer) -> Result<i64> {
        boundary::guard("flushBuffer", || {
            let Some(instance) = self.instance(handle) else {
                return Ok(-1);
            };
            let buffer_size = frame_len(output.frame_count())?;
            let channels = output.channel_ptrs_mut();
            let mut output_size: i64 = 0;
            // SAFETY: one pointer per channel, each valid for `buffer_size` samples.
            let status = unsafe {
                (self.symbols.flush_buffer)(instance.as_ptr(), channels.as_ptr(), buffer_size, &mut output_size)
            };
            Ok(Self::produced(status, output_size))
        })
    }

    fn reset(&self, handle: i32) -> Result<bool> {
        boundary::guard("reset", || {
            let Some(instance) = self.instance(handle) else {
                return Ok(false);
            };
            // SAFETY: live instance from the handle table.
            Ok(unsafe { (self.symbols.reset)(instance.as_ptr()) } != 0)
        })
    }

    fn get_configuration(&self, handle: i32) -> Result<Option<AppliedConfiguration>> {
        boundary::guard("getConfiguration", || {
            let Some(instance) = self.instance(handle) else {
                return Ok(None);
            };
            let (mut channels, mut sample_rate, mut frame_len, mut filter_size) = (0u32, 0u32, 0u32, 0u32);
            // SAFETY: live instance; out-parameters point at live locals.
            let status = unsafe {
                (self.symbols.get_configuration)(
                    instance.as_ptr(),
                    &mut channels,
                    &mut sample_rate,
                    &mut frame_len,
                    &mut filter_size,
                )
            };
            Ok((status != 0).then_some(AppliedConfiguration {
                channels,
                sample_rate,
                frame_len,
                filter_size,
            }))
        })
    }

    fn get_internal_delay(&self, handle: i32) -> Result<i64> {
        boundary::guard("getInternalDelay", || {
            let Some(instance) = self.instance(handle) else {
                return Ok(-1);
            };
            let mut delay: i64 = 0;
            // SAFETY: live instance; out-parameter points at a live local.
            let status = unsafe { (self.symbols.get_internal_delay)(instance.as_ptr(), &mut delay) };
            Ok(Self::produced(status, delay))
        })
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        for (handle, instance) in self.handles.drain() {
            log::warn!("Destroying leaked native instance {}", handle);
            if !self.destroy_raw(instance) {
                log::error!("Failed to destroy leaked native instance {}", handle);
            }
        }
    }
}

/// Loads one engine, at most once.
///
/// Concurrent first callers block on a single load attempt. The outcome is
/// kept: a failed load returns the same `NativeLoadFailure` forever after.
pub struct NativeLoader {
    options: LoaderOptions,
    engine: OnceLock<Result<Arc<NativeEngine>>>,
}

impl NativeLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            engine: OnceLock::new(),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn engine(&self) -> Result<Arc<NativeEngine>> {
        self.engine
            .get_or_init(|| {
                let loaded = NativeEngine::load(&self.options).map(Arc::new);
                if let Err(err) = &loaded {
                    log::error!("{}", err);
                }
                loaded
            })
            .clone()
    }

    /// Whether a load has been attempted, successful or not.
    pub fn load_attempted(&self) -> bool {
        self.engine.get().is_some()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.engine.get(), Some(Ok(_)))
    }
}

/// Loader behind [`NativeEngine::shared`], configured from the environment.
pub fn shared_loader() -> &'static NativeLoader {
    static SHARED: OnceLock<NativeLoader> = OnceLock::new();
    SHARED.get_or_init(|| NativeLoader::new(LoaderOptions::from_env()))
}
