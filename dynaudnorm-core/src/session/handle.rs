use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::boundary;
use crate::models::config::EngineConfiguration;
use crate::models::engine_info::AppliedConfiguration;
use crate::models::error::{NormalizerError, Result};
use crate::models::state::SessionState;
use crate::processing::sample_buffer::SampleBuffer;
use crate::processing::sample_codec::{PcmReader, PcmWriter};
use crate::traits::engine_api::EngineApi;

/// Handle value held while no native instance is owned.
const INVALID_HANDLE: i32 = -1;

/// Mutable session state, protected by `parking_lot::Mutex`.
struct SessionInner {
    state: SessionState,
    handle: i32,
    creation_attempted: bool,
}

/// Frame totals from [`SessionHandle::process_stream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub frames_read: u64,
    pub frames_processed: u64,
    pub frames_flushed: u64,
    pub blocks: u64,
}

impl StreamStats {
    pub fn frames_written(&self) -> u64 {
        self.frames_processed + self.frames_flushed
    }
}

/// Owner of exactly one native normalizer instance.
///
/// Every engine call for this session, release included, runs under one
/// per-session lock, so two threads never cross the boundary for the same
/// instance at once. Separate sessions share nothing but the engine and run
/// fully in parallel.
///
/// The handle is invalidated before the native destroy call is issued. A
/// failed destroy therefore still leaves the session `Released`. Dropping an
/// active session releases it; prefer calling [`release`](Self::release)
/// explicitly so destroy failures are observable.
///
/// ```text
/// SessionHandle::create(engine, config)
///     ├─ process_inplace / process / flush_buffer   (repeat)
///     ├─ reset                                      (any time while active)
///     └─ release                                    (idempotent; also on Drop)
/// ```
pub struct SessionHandle {
    engine: Arc<dyn EngineApi>,
    config: EngineConfiguration,
    inner: Mutex<SessionInner>,
}

impl SessionHandle {
    /// Validate `config` without touching the engine.
    ///
    /// The session starts `Uninitialized`; call [`initialize`](Self::initialize)
    /// to create the native instance.
    pub fn new(engine: Arc<dyn EngineApi>, config: EngineConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            inner: Mutex::new(SessionInner {
                state: SessionState::Uninitialized,
                handle: INVALID_HANDLE,
                creation_attempted: false,
            }),
        })
    }

    /// Validate `config` and create the native instance.
    pub fn create(engine: Arc<dyn EngineApi>, config: EngineConfiguration) -> Result<Self> {
        let session = Self::new(engine, config)?;
        session.initialize()?;
        Ok(session)
    }

    /// Create the native instance. Only one attempt is allowed per session; a
    /// failed attempt leaves it `Uninitialized` for good.
    pub fn initialize(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.creation_attempted {
            return Err(NormalizerError::InvalidState(format!(
                "createInstance called on {} session",
                inner.state.name()
            )));
        }
        inner.creation_attempted = true;

        let handle = boundary::guard("createInstance", || self.engine.create_instance(&self.config))?;
        if handle < 0 {
            log::error!("createInstance returned invalid handle {}", handle);
            return Err(NormalizerError::CreationFailure(format!(
                "engine returned handle {}",
                handle
            )));
        }

        inner.handle = handle;
        inner.state = SessionState::Active;
        log::debug!(
            "Session created: handle={}, channels={}, sample_rate={}",
            handle,
            self.config.channels,
            self.config.sample_rate
        );
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn config(&self) -> &EngineConfiguration {
        &self.config
    }

    /// The native handle, while active.
    pub fn handle(&self) -> Option<i32> {
        let inner = self.inner.lock();
        inner.state.is_active().then_some(inner.handle)
    }

    /// Process the first `frame_count` frames of `buffer` in place.
    ///
    /// Returns the number of frames written back to the front of `buffer`,
    /// which may be less than `frame_count` while the engine fills its delay.
    pub fn process_inplace(&self, buffer: &mut SampleBuffer, frame_count: usize) -> Result<usize> {
        const OP: &str = "processInplace";
        let count = self.with_active(OP, |engine, handle| {
            buffer.ensure_shape(self.channels(), frame_count)?;
            engine.process_inplace(handle, buffer, frame_count)
        })?;
        frames(OP, count)
    }

    /// Process `frame_count` frames of `source` into `dest`. `source` is left
    /// untouched.
    pub fn process(&self, source: &SampleBuffer, dest: &mut SampleBuffer, frame_count: usize) -> Result<usize> {
        const OP: &str = "process";
        let count = self.with_active(OP, |engine, handle| {
            source.ensure_shape(self.channels(), frame_count)?;
            dest.ensure_shape(self.channels(), frame_count)?;
            engine.process(handle, source, dest, frame_count)
        })?;
        frames(OP, count)
    }

    /// Drain delayed frames into `output`. Returns 0 once nothing is left;
    /// callers loop until then.
    pub fn flush_buffer(&self, output: &mut SampleBuffer) -> Result<usize> {
        const OP: &str = "flushBuffer";
        let count = self.with_active(OP, |engine, handle| {
            output.ensure_shape(self.channels(), output.frame_count())?;
            engine.flush_buffer(handle, output)
        })?;
        frames(OP, count)
    }

    /// Clear the engine's internal state, keeping the instance.
    pub fn reset(&self) -> Result<()> {
        const OP: &str = "reset";
        if self.with_active(OP, |engine, handle| engine.reset(handle))? {
            Ok(())
        } else {
            Err(NormalizerError::OperationFailed { operation: OP })
        }
    }

    pub fn get_configuration(&self) -> Result<AppliedConfiguration> {
        const OP: &str = "getConfiguration";
        self.with_active(OP, |engine, handle| engine.get_configuration(handle))?
            .ok_or(NormalizerError::OperationFailed { operation: OP })
    }

    /// Engine latency in frames.
    pub fn get_internal_delay(&self) -> Result<usize> {
        const OP: &str = "getInternalDelay";
        let delay = self.with_active(OP, |engine, handle| engine.get_internal_delay(handle))?;
        frames(OP, delay)
    }

    /// Destroy the native instance. Calling this again is a no-op.
    ///
    /// The session is `Released` before the destroy call is made, so even a
    /// `DestructionFailure` leaves nothing reusable behind.
    pub fn release(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            SessionState::Released => return Ok(()),
            SessionState::Uninitialized => {
                inner.creation_attempted = true;
                inner.state = SessionState::Released;
                return Ok(());
            }
            SessionState::Active => {}
        }

        let handle = inner.handle;
        inner.handle = INVALID_HANDLE;
        inner.state = SessionState::Released;

        let destroyed = boundary::guard("destroyInstance", || self.engine.destroy_instance(handle))?;
        if !destroyed {
            log::error!("destroyInstance failed for handle {}", handle);
            return Err(NormalizerError::DestructionFailure { handle });
        }
        log::debug!("Session released: handle={}", handle);
        Ok(())
    }

    /// Normalize a whole raw PCM stream.
    ///
    /// Reads blocks of up to `buffer_frames` frames, processes them in place
    /// and writes the result, then flushes the engine until it reports 0.
    /// The session is left active; call [`reset`](Self::reset) before reusing
    /// it for an unrelated stream.
    pub fn process_stream<R: Read, W: Write>(
        &self,
        reader: &mut PcmReader<R>,
        writer: &mut PcmWriter<W>,
        buffer_frames: usize,
    ) -> Result<StreamStats> {
        for codec in [reader.codec(), writer.codec()] {
            if codec.channels() != self.channels() {
                return Err(NormalizerError::Validation(format!(
                    "stream has {} channels, session expects {}",
                    codec.channels(),
                    self.channels()
                )));
            }
        }

        let mut buffer = SampleBuffer::new(self.channels(), buffer_frames)?;
        let mut stats = StreamStats::default();

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            let produced = self.process_inplace(&mut buffer, read)?;
            writer.write(&buffer, produced)?;

            stats.frames_read += read as u64;
            stats.frames_processed += produced as u64;
            stats.blocks += 1;
        }

        loop {
            let flushed = self.flush_buffer(&mut buffer)?;
            if flushed == 0 {
                break;
            }
            writer.write(&buffer, flushed)?;
            stats.frames_flushed += flushed as u64;
        }

        writer.flush()?;
        log::debug!(
            "Stream processed: {} frames in, {} frames out, {} blocks",
            stats.frames_read,
            stats.frames_written(),
            stats.blocks
        );
        Ok(stats)
    }

    fn channels(&self) -> usize {
        self.config.channels as usize
    }

    /// Run `call` against the live handle under the session lock, translating
    /// faults. Fails with `InvalidState` unless the session is active.
    fn with_active<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: FnOnce(&dyn EngineApi, i32) -> Result<T>,
    {
        let inner = self.inner.lock();
        if !inner.state.is_active() {
            return Err(NormalizerError::InvalidState(format!(
                "{} called on {} session",
                operation,
                inner.state.name()
            )));
        }
        boundary::guard(operation, || call(self.engine.as_ref(), inner.handle))
    }
}

fn frames(operation: &'static str, count: i64) -> Result<usize> {
    usize::try_from(count).map_err(|_| NormalizerError::OperationFailed { operation })
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::error!("Failed to release session on drop: {}", err);
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SessionHandle")
            .field("state", &inner.state)
            .field("handle", &inner.handle)
            .field("config", &self.config)
            .finish()
    }
}
