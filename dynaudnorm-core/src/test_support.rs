//! In-process stand-in for the native engine.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::EngineConfiguration;
use crate::models::engine_info::{AppliedConfiguration, BuildInfo, LogLevel, VersionInfo};
use crate::models::error::Result;
use crate::processing::sample_buffer::SampleBuffer;
use crate::traits::engine_api::EngineApi;
use crate::traits::logger::EngineLogger;

struct FakeInstance {
    config: EngineConfiguration,
    pending: VecDeque<Vec<f64>>,
    busy: Arc<AtomicBool>,
}

/// Pass-through engine with a fixed delay line.
///
/// Output is the input delayed by `delay` frames; `flush_buffer` drains what is
/// left. Failure and panic switches are plain atomics so tests can flip them
/// mid-session.
pub(crate) struct FakeEngine {
    delay: usize,
    hold: Duration,
    next_handle: AtomicI32,
    instances: Mutex<HashMap<i32, FakeInstance>>,
    logger: Mutex<Option<Arc<dyn EngineLogger>>>,

    pub fail_create: AtomicBool,
    pub fail_destroy: AtomicBool,
    pub fail_process: AtomicBool,
    pub panic_on_reset: AtomicBool,

    pub create_calls: AtomicUsize,
    pub destroy_calls: AtomicUsize,
    pub overlap_detected: AtomicBool,
}

impl FakeEngine {
    pub fn new(delay: usize) -> Self {
        Self {
            delay,
            hold: Duration::ZERO,
            next_handle: AtomicI32::new(0),
            instances: Mutex::new(HashMap::new()),
            logger: Mutex::new(None),
            fail_create: AtomicBool::new(false),
            fail_destroy: AtomicBool::new(false),
            fail_process: AtomicBool::new(false),
            panic_on_reset: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            destroy_calls: AtomicUsize::new(0),
            overlap_detected: AtomicBool::new(false),
        }
    }

    /// Sleep this long inside every processing call, to widen race windows.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    pub fn live_instances(&self) -> usize {
        self.instances.lock().len()
    }

    /// Deliver a log event the way the engine would.
    pub fn emit(&self, level: LogLevel, message: &str) {
        if let Some(logger) = self.logger.lock().clone() {
            logger.log(level, message);
        }
    }

    fn enter(&self, handle: i32) -> Option<Arc<AtomicBool>> {
        let busy = self.instances.lock().get(&handle).map(|i| Arc::clone(&i.busy))?;
        if busy.swap(true, Ordering::SeqCst) {
            self.overlap_detected.store(true, Ordering::SeqCst);
        }
        if !self.hold.is_zero() {
            thread::sleep(self.hold);
        }
        Some(busy)
    }

    /// Push `frame_count` frames through the delay line, returning the frames
    /// that fall out the other end (at most `frame_count`).
    fn run(&self, handle: i32, input: &SampleBuffer, frame_count: usize) -> Option<Vec<Vec<f64>>> {
        let mut instances = self.instances.lock();
        let instance = instances.get_mut(&handle)?;

        for index in 0..frame_count {
            instance
                .pending
                .push_back(input.channels().map(|c| c[index]).collect());
        }

        let ready = instance.pending.len().saturating_sub(self.delay).min(frame_count);
        Some(instance.pending.drain(..ready).collect())
    }

    fn pass_through(&self, handle: i32, input: &SampleBuffer, frame_count: usize) -> Option<Vec<Vec<f64>>> {
        let busy = self.enter(handle)?;
        let frames = if self.fail_process.load(Ordering::SeqCst) {
            None
        } else {
            self.run(handle, input, frame_count)
        };
        busy.store(false, Ordering::SeqCst);
        frames
    }
}

fn write_frames(frames: &[Vec<f64>], output: &mut SampleBuffer) {
    for (index, frame) in frames.iter().enumerate() {
        for (channel, sample) in frame.iter().enumerate() {
            output.channel_mut(channel)[index] = *sample;
        }
    }
}

impl EngineApi for FakeEngine {
    fn version_info(&self) -> Result<VersionInfo> {
        Ok(VersionInfo {
            major: 2,
            minor: 10,
            patch: 0,
        })
    }

    fn build_info(&self) -> Result<BuildInfo> {
        Ok(BuildInfo {
            build_date: "Jan 01 2024".into(),
            build_time: "12:00:00".into(),
            compiler: "fake".into(),
            architecture: "x64".into(),
            debug_build: false,
        })
    }

    fn set_logging_handler(&self, logger: Option<Arc<dyn EngineLogger>>) -> Result<bool> {
        *self.logger.lock() = logger;
        Ok(true)
    }

    fn create_instance(&self, config: &EngineConfiguration) -> Result<i32> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Ok(-1);
        }
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.instances.lock().insert(
            handle,
            FakeInstance {
                config: config.clone(),
                pending: VecDeque::new(),
                busy: Arc::new(AtomicBool::new(false)),
            },
        );
        Ok(handle)
    }

    fn destroy_instance(&self, handle: i32) -> Result<bool> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        let removed = self.instances.lock().remove(&handle).is_some();
        Ok(removed && !self.fail_destroy.load(Ordering::SeqCst))
    }

    fn process_inplace(&self, handle: i32, buffer: &mut SampleBuffer, frame_count: usize) -> Result<i64> {
        Ok(match self.pass_through(handle, buffer, frame_count) {
            Some(frames) => {
                write_frames(&frames, buffer);
                frames.len() as i64
            }
            None => -1,
        })
    }

    fn process(
        &self,
        handle: i32,
        source: &SampleBuffer,
        dest: &mut SampleBuffer,
        frame_count: usize,
    ) -> Result<i64> {
        Ok(match self.pass_through(handle, source, frame_count) {
            Some(frames) => {
                write_frames(&frames, dest);
                frames.len() as i64
            }
            None => -1,
        })
    }

    fn flush_buffer(&self, handle: i32, output: &mut SampleBuffer) -> Result<i64> {
        let Some(busy) = self.enter(handle) else {
            return Ok(-1);
        };
        let frames: Option<Vec<Vec<f64>>> = self.instances.lock().get_mut(&handle).map(|instance| {
            let count = instance.pending.len().min(output.frame_count());
            instance.pending.drain(..count).collect()
        });
        busy.store(false, Ordering::SeqCst);

        Ok(match frames {
            Some(frames) => {
                write_frames(&frames, output);
                frames.len() as i64
            }
            None => -1,
        })
    }

    fn reset(&self, handle: i32) -> Result<bool> {
        if self.panic_on_reset.load(Ordering::SeqCst) {
            panic!("engine fault during reset");
        }
        Ok(match self.instances.lock().get_mut(&handle) {
            Some(instance) => {
                instance.pending.clear();
                true
            }
            None => false,
        })
    }

    fn get_configuration(&self, handle: i32) -> Result<Option<AppliedConfiguration>> {
        Ok(self.instances.lock().get(&handle).map(|instance| AppliedConfiguration {
            channels: instance.config.channels,
            sample_rate: instance.config.sample_rate,
            frame_len: instance.config.frame_len_msec,
            filter_size: instance.config.filter_size,
        }))
    }

    fn get_internal_delay(&self, handle: i32) -> Result<i64> {
        Ok(if self.instances.lock().contains_key(&handle) {
            self.delay as i64
        } else {
            -1
        })
    }
}
