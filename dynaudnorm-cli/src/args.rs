use std::path::PathBuf;

use dynaudnorm_core::{NormalizerError, PcmFormat, Result};

pub const CHANNELS_DEFAULT: u32 = 2;
pub const SAMPLE_RATE_DEFAULT: u32 = 44100;

pub const USAGE: &str = "Usage:\n  dynaudnorm [<channel_count> [<sample_rate> [<sample_format>]]] <input.pcm> <output.pcm>\n\n\
Sample formats: PCM_16BIT_LE, PCM_16BIT_BE, PCM_32BIT_LE, PCM_32BIT_BE, PCM_64BIT_LE, PCM_64BIT_BE";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub channels: u32,
    pub sample_rate: u32,
    pub format: PcmFormat,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl CliArgs {
    /// Parse `[channels [sampleRate [format]]] <input> <output>`.
    ///
    /// Optional values fill in from the left; the last two arguments are
    /// always the input and output paths.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let (options, paths) = match args.len() {
            2..=5 => args.split_at(args.len() - 2),
            n => {
                return Err(NormalizerError::Validation(format!(
                    "expected 2 to 5 arguments, got {}",
                    n
                )))
            }
        };

        let mut parsed = Self {
            channels: CHANNELS_DEFAULT,
            sample_rate: SAMPLE_RATE_DEFAULT,
            format: PcmFormat::default(),
            input: PathBuf::from(paths[0].as_ref()),
            output: PathBuf::from(paths[1].as_ref()),
        };

        if let Some(channels) = options.first() {
            parsed.channels = parse_number("channel count", channels.as_ref())?;
        }
        if let Some(sample_rate) = options.get(1) {
            parsed.sample_rate = parse_number("sample rate", sample_rate.as_ref())?;
        }
        if let Some(format) = options.get(2) {
            parsed.format = format.as_ref().parse()?;
        }

        Ok(parsed)
    }
}

fn parse_number(what: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| NormalizerError::Validation(format!("invalid {}: {}", what, value)))
}
