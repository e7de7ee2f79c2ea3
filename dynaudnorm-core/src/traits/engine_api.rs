use std::sync::Arc;

use crate::models::config::EngineConfiguration;
use crate::models::engine_info::{AppliedConfiguration, BuildInfo, VersionInfo};
use crate::models::error::Result;
use crate::processing::sample_buffer::SampleBuffer;
use crate::traits::logger::EngineLogger;

/// Raw call surface of the native normalizer engine.
///
/// Implemented by:
/// - `NativeEngine` (runtime-loaded shared library, `dynaudnorm-native`)
/// - test doubles
///
/// Methods report native failure through sentinel values exactly like the
/// engine does: a negative handle or frame count, `false`, or `None`.
/// `Err` is reserved for faults raised while crossing the boundary itself.
/// Turning sentinels into typed errors is the caller's job (see `SessionHandle`).
///
/// Handles are opaque non-negative integers. Calls for one handle are never
/// issued concurrently by `SessionHandle`; implementations may still be shared
/// across threads for different handles.
pub trait EngineApi: Send + Sync {
    fn version_info(&self) -> Result<VersionInfo>;

    fn build_info(&self) -> Result<BuildInfo>;

    /// Install `logger` as the process-wide receiver of engine log events,
    /// replacing any previous one. `None` detaches the current logger.
    fn set_logging_handler(&self, logger: Option<Arc<dyn EngineLogger>>) -> Result<bool>;

    /// Create an instance. Returns a negative value on failure.
    fn create_instance(&self, config: &EngineConfiguration) -> Result<i32>;

    fn destroy_instance(&self, handle: i32) -> Result<bool>;

    /// Process `frame_count` frames of `buffer` in place. Returns the number of
    /// frames written back, or a negative value on failure.
    fn process_inplace(&self, handle: i32, buffer: &mut SampleBuffer, frame_count: usize) -> Result<i64>;

    /// Process `frame_count` frames from `source` into `dest`. `source` is
    /// never modified.
    fn process(
        &self,
        handle: i32,
        source: &SampleBuffer,
        dest: &mut SampleBuffer,
        frame_count: usize,
    ) -> Result<i64>;

    /// Drain pending frames into `output`. Returns 0 once exhausted.
    fn flush_buffer(&self, handle: i32, output: &mut SampleBuffer) -> Result<i64>;

    fn reset(&self, handle: i32) -> Result<bool>;

    fn get_configuration(&self, handle: i32) -> Result<Option<AppliedConfiguration>>;

    /// Internal delay in frames, or a negative value on failure.
    fn get_internal_delay(&self, handle: i32) -> Result<i64>;
}
