use sha2::{Digest, Sha256};

use crate::models::error::{NormalizerError, Result};

/// Planar multi-channel sample storage.
///
/// Holds `channel_count` equal-length sequences of `f64` samples, nominally in
/// `[-1.0, 1.0]`. The range is not enforced here; encoders clamp on output.
/// The shape is fixed at construction so every channel always has
/// `frame_count` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f64>>,
    frames: usize,
}

impl SampleBuffer {
    /// Allocate a zeroed buffer.
    pub fn new(channel_count: usize, frame_count: usize) -> Result<Self> {
        if channel_count == 0 {
            return Err(NormalizerError::Validation(
                "sample buffer needs at least one channel".into(),
            ));
        }
        Ok(Self {
            channels: vec![vec![0.0; frame_count]; channel_count],
            frames: frame_count,
        })
    }

    /// Wrap existing per-channel data. All channels must have the same length.
    pub fn from_channels(channels: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(NormalizerError::Validation(
                "sample buffer needs at least one channel".into(),
            ));
        };
        let frames = first.len();
        if let Some((index, channel)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(NormalizerError::Validation(format!(
                "channel {} has {} frames, expected {}",
                index,
                channel.len(),
                frames
            )));
        }
        Ok(Self { channels, frames })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frame capacity (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn fill(&mut self, value: f64) {
        for channel in &mut self.channels {
            channel.fill(value);
        }
    }

    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    /// Check that this buffer has `channels` channels and room for `frame_count` frames.
    pub fn ensure_shape(&self, channels: usize, frame_count: usize) -> Result<()> {
        if self.channel_count() != channels {
            return Err(NormalizerError::Validation(format!(
                "buffer has {} channels, session expects {}",
                self.channel_count(),
                channels
            )));
        }
        if frame_count > self.frames {
            return Err(NormalizerError::Validation(format!(
                "frame count {} exceeds buffer capacity {}",
                frame_count, self.frames
            )));
        }
        Ok(())
    }

    /// Per-channel read pointers for handing the buffer to native code.
    pub fn channel_ptrs(&self) -> Vec<*const f64> {
        self.channels.iter().map(|c| c.as_ptr()).collect()
    }

    /// Per-channel write pointers for handing the buffer to native code.
    pub fn channel_ptrs_mut(&mut self) -> Vec<*mut f64> {
        self.channels.iter_mut().map(|c| c.as_mut_ptr()).collect()
    }

    /// SHA-256 hex digest over all samples, channel by channel.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for channel in &self.channels {
            for sample in channel {
                hasher.update(sample.to_le_bytes());
            }
        }
        hex_encode(&hasher.finalize())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
