//! # dynaudnorm-core
//!
//! Platform-agnostic core of the Dynamic Audio Normalizer binding.
//!
//! Owns the session lifecycle, the error model, fault translation at the
//! foreign boundary, and the raw PCM codec. The native backend lives in
//! `dynaudnorm-native` and plugs in through the `EngineApi` trait.
//!
//! ## Architecture
//!
//! ```text
//! dynaudnorm-core (this crate)
//! ├── traits/       ← EngineApi, EngineLogger
//! ├── models/       ← NormalizerError, SessionState, EngineConfiguration, VersionInfo, etc.
//! ├── processing/   ← SampleBuffer, PcmFormat, SampleCodec, PcmReader/PcmWriter
//! ├── session/      ← SessionHandle (owns one native instance)
//! └── boundary      ← panic/fault → NormalizerError translation
//! ```

pub mod boundary;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use models::config::{EngineConfiguration, MAX_CHANNELS};
pub use models::engine_info::{AppliedConfiguration, BuildInfo, LogLevel, VersionInfo};
pub use models::error::{NormalizerError, Result};
pub use models::state::SessionState;
pub use processing::pcm_format::{Endianness, PcmFormat};
pub use processing::sample_buffer::SampleBuffer;
pub use processing::sample_codec::{PcmReader, PcmWriter, SampleCodec};
pub use session::handle::{SessionHandle, StreamStats};
pub use traits::engine_api::EngineApi;
pub use traits::logger::{EngineLogger, LogFacadeLogger};
