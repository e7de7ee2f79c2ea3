use serde::{Deserialize, Serialize};

use super::error::{NormalizerError, Result};

/// Highest channel count the native engine accepts.
pub const MAX_CHANNELS: u32 = 8;

/// Construction parameters for one native normalizer instance.
///
/// Immutable once a session has been created from it. Invalid values are
/// rejected by [`validate`](Self::validate) rather than clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfiguration {
    /// Number of interleaved channels, 1 to 8.
    pub channels: u32,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Frame length in milliseconds (default: 500).
    pub frame_len_msec: u32,

    /// Gaussian filter size in frames, odd (default: 31).
    pub filter_size: u32,

    /// Target peak magnitude (default: 0.95).
    pub peak_value: f64,

    /// Maximum gain factor (default: 10.0).
    pub max_amplification: f64,

    /// Target RMS, 0.0 disables (default: 0.0).
    pub target_rms: f64,

    /// Compression threshold, 0.0 disables (default: 0.0).
    pub compress_factor: f64,

    /// Apply the same gain to all channels (default: true).
    pub channels_coupled: bool,

    /// Enable DC bias correction (default: false).
    pub enable_dc_correction: bool,

    /// Use the alternative boundary mode (default: false).
    pub alt_boundary_mode: bool,
}

impl EngineConfiguration {
    pub fn new(channels: u32, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CHANNELS).contains(&self.channels) {
            return Err(invalid(format!(
                "channel count {} out of range, must be 1 to {}",
                self.channels, MAX_CHANNELS
            )));
        }
        if self.sample_rate == 0 {
            return Err(invalid("sample rate must be positive".into()));
        }
        if !(10..=8000).contains(&self.frame_len_msec) {
            return Err(invalid(format!(
                "frame length {} ms out of range, must be 10 to 8000",
                self.frame_len_msec
            )));
        }
        if !(3..=301).contains(&self.filter_size) || self.filter_size % 2 == 0 {
            return Err(invalid(format!(
                "filter size {} invalid, must be an odd value from 3 to 301",
                self.filter_size
            )));
        }
        if !(0.01..=1.0).contains(&self.peak_value) {
            return Err(invalid(format!(
                "peak value {:.2} out of range, must be 0.01 to 1.00",
                self.peak_value
            )));
        }
        if !(1.0..=100.0).contains(&self.max_amplification) {
            return Err(invalid(format!(
                "maximum amplification {:.2} out of range, must be 1.00 to 100.00",
                self.max_amplification
            )));
        }
        if !(0.0..=1.0).contains(&self.target_rms) {
            return Err(invalid(format!(
                "target RMS {:.2} out of range, must be 0.00 to 1.00",
                self.target_rms
            )));
        }
        if self.compress_factor != 0.0 && !(1.0..=30.0).contains(&self.compress_factor) {
            return Err(invalid(format!(
                "compression factor {:.2} out of range, must be 0 or 1.00 to 30.00",
                self.compress_factor
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> NormalizerError {
    NormalizerError::Validation(message)
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44100,
            frame_len_msec: 500,
            filter_size: 31,
            peak_value: 0.95,
            max_amplification: 10.0,
            target_rms: 0.0,
            compress_factor: 0.0,
            channels_coupled: true,
            enable_dc_correction: false,
            alt_boundary_mode: false,
        }
    }
}
