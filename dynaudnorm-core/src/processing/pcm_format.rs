use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::error::NormalizerError;

/// Byte order of encoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

/// Raw headerless PCM sample encoding.
///
/// 16-bit formats are fixed-point scaled by `i16::MAX`. 32- and 64-bit formats
/// store IEEE-754 single and double precision floats without scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PcmFormat {
    #[serde(rename = "PCM_16BIT_LE")]
    Pcm16Le,
    #[serde(rename = "PCM_16BIT_BE")]
    Pcm16Be,
    #[serde(rename = "PCM_32BIT_LE")]
    Pcm32Le,
    #[serde(rename = "PCM_32BIT_BE")]
    Pcm32Be,
    #[serde(rename = "PCM_64BIT_LE")]
    Pcm64Le,
    #[serde(rename = "PCM_64BIT_BE")]
    Pcm64Be,
}

impl PcmFormat {
    pub const ALL: [PcmFormat; 6] = [
        Self::Pcm16Le,
        Self::Pcm16Be,
        Self::Pcm32Le,
        Self::Pcm32Be,
        Self::Pcm64Le,
        Self::Pcm64Be,
    ];

    pub fn bit_width(&self) -> u32 {
        match self {
            Self::Pcm16Le | Self::Pcm16Be => 16,
            Self::Pcm32Le | Self::Pcm32Be => 32,
            Self::Pcm64Le | Self::Pcm64Be => 64,
        }
    }

    /// Bytes per sample.
    pub fn sample_size(&self) -> usize {
        self.bit_width() as usize / 8
    }

    pub fn endianness(&self) -> Endianness {
        match self {
            Self::Pcm16Le | Self::Pcm32Le | Self::Pcm64Le => Endianness::Little,
            Self::Pcm16Be | Self::Pcm32Be | Self::Pcm64Be => Endianness::Big,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pcm16Le => "PCM_16BIT_LE",
            Self::Pcm16Be => "PCM_16BIT_BE",
            Self::Pcm32Le => "PCM_32BIT_LE",
            Self::Pcm32Be => "PCM_32BIT_BE",
            Self::Pcm64Le => "PCM_64BIT_LE",
            Self::Pcm64Be => "PCM_64BIT_BE",
        }
    }

    /// Decode one sample. `bytes` must be exactly `sample_size()` long.
    pub(crate) fn read_sample(&self, bytes: &[u8]) -> f64 {
        let little = self.endianness() == Endianness::Little;
        match self.bit_width() {
            16 => {
                let raw = [bytes[0], bytes[1]];
                let value = if little { i16::from_le_bytes(raw) } else { i16::from_be_bytes(raw) };
                f64::from(value) / f64::from(i16::MAX)
            }
            32 => {
                let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
                let value = if little { f32::from_le_bytes(raw) } else { f32::from_be_bytes(raw) };
                f64::from(value)
            }
            _ => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                if little {
                    f64::from_le_bytes(raw)
                } else {
                    f64::from_be_bytes(raw)
                }
            }
        }
    }

    /// Encode one sample into `out`, which must be exactly `sample_size()` long.
    pub(crate) fn write_sample(&self, value: f64, out: &mut [u8]) {
        let little = self.endianness() == Endianness::Little;
        match self.bit_width() {
            16 => {
                let value = float_to_i16(value);
                let raw = if little { value.to_le_bytes() } else { value.to_be_bytes() };
                out.copy_from_slice(&raw);
            }
            32 => {
                let value = value as f32;
                let raw = if little { value.to_le_bytes() } else { value.to_be_bytes() };
                out.copy_from_slice(&raw);
            }
            _ => {
                let raw = if little { value.to_le_bytes() } else { value.to_be_bytes() };
                out.copy_from_slice(&raw);
            }
        }
    }
}

/// Clamp to `[-1.0, 1.0]`, scale by `i16::MAX`, round to nearest.
fn float_to_i16(value: f64) -> i16 {
    round_half_up(value.clamp(-1.0, 1.0) * f64::from(i16::MAX)) as i16
}

// Ties go toward positive infinity, not away from zero.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PcmFormat {
    type Err = NormalizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NormalizerError::Validation(format!("unknown sample format: {}", s)))
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::Pcm16Le
    }
}
