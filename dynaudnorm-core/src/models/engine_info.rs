use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Native library version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}-{}", self.major, self.minor, self.patch)
    }
}

/// Build metadata reported by the native library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub build_date: String,
    pub build_time: String,
    pub compiler: String,
    pub architecture: String,
    pub debug_build: bool,
}

impl BuildInfo {
    /// Key/value view using the native library's key names.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("BuildDate".to_string(), self.build_date.clone()),
            ("BuildTime".to_string(), self.build_time.clone()),
            ("Compiler".to_string(), self.compiler.clone()),
            ("Architecture".to_string(), self.architecture.clone()),
            (
                "DebugBuild".to_string(),
                if self.debug_build { "Yes" } else { "No" }.to_string(),
            ),
        ])
    }
}

/// Parameters as applied by a live native instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedConfiguration {
    pub channels: u32,
    pub sample_rate: u32,
    pub frame_len: u32,
    pub filter_size: u32,
}

impl AppliedConfiguration {
    pub fn to_map(&self) -> BTreeMap<String, u32> {
        BTreeMap::from([
            ("channels".to_string(), self.channels),
            ("sampleRate".to_string(), self.sample_rate),
            ("frameLen".to_string(), self.frame_len),
            ("filterSize".to_string(), self.filter_size),
        ])
    }
}

/// Severity of a message emitted by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Warning,
    Error,
}

impl LogLevel {
    /// Map a raw native level. Unknown values are treated as errors.
    pub fn from_raw(level: i32) -> Self {
        match level {
            0 => Self::Debug,
            1 => Self::Warning,
            _ => Self::Error,
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Self::Debug => 0,
            Self::Warning => 1,
            Self::Error => 2,
        }
    }
}
