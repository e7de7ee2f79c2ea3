use crate::models::engine_info::LogLevel;

/// Receiver for log events emitted by the native engine.
///
/// At most one logger is registered per process; the last registration wins.
/// `log` may be invoked on an internal engine thread, concurrently with any
/// session operation. Implementations must not block and must not call back
/// into the binding.
pub trait EngineLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

impl<F> EngineLogger for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn log(&self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

/// Forwards engine log events into the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacadeLogger;

impl LogFacadeLogger {
    pub const TARGET: &'static str = "dynaudnorm::engine";
}

impl EngineLogger for LogFacadeLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let level = match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        };
        log::log!(target: Self::TARGET, level, "{}", message.trim_end());
    }
}
