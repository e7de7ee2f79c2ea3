use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use dynaudnorm_core::{AppliedConfiguration, EngineConfiguration, NormalizerError, PcmFormat, Result, StreamStats};

/// Summary of one normalizer run, written next to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingReport {
    pub input: String,
    pub output: String,
    pub format: PcmFormat,
    pub configuration: EngineConfiguration,
    pub applied: AppliedConfiguration,
    pub internal_delay: usize,
    pub engine_version: Option<String>,
    pub stats: StreamStats,
    pub output_bytes: u64,
    /// SHA-256 hex digest of the output file.
    pub output_checksum: String,
    pub started_at: String,
    pub finished_at: String,
}

/// `{output}.report.json`, beside the output file.
pub fn report_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".report.json");
    PathBuf::from(name)
}

pub fn write_report(report: &ProcessingReport, output: &Path) -> Result<PathBuf> {
    let path = report_path(output);
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| NormalizerError::Io(format!("failed to serialize report: {}", e)))?;
    fs::write(&path, json).map_err(|e| NormalizerError::Io(format!("failed to write report: {}", e)))?;
    Ok(path)
}

/// SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let data = fs::read(path)
        .map_err(|e| NormalizerError::Io(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dynaudnorm_report_{}_{}", std::process::id(), name))
    }

    fn read_report(output: &Path) -> ProcessingReport {
        let json = fs::read_to_string(report_path(output)).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    fn sample_report(output: &Path) -> ProcessingReport {
        ProcessingReport {
            input: "in.pcm".into(),
            output: output.display().to_string(),
            format: PcmFormat::Pcm16Le,
            configuration: EngineConfiguration::default(),
            applied: AppliedConfiguration {
                channels: 2,
                sample_rate: 44100,
                frame_len: 22050,
                filter_size: 31,
            },
            internal_delay: 352800,
            engine_version: Some("2.10-0".into()),
            stats: StreamStats {
                frames_read: 8192,
                frames_processed: 0,
                frames_flushed: 8192,
                blocks: 2,
            },
            output_bytes: 32768,
            output_checksum: "00".repeat(32),
            started_at: "2024-01-01T00:00:00+00:00".into(),
            finished_at: "2024-01-01T00:00:01+00:00".into(),
        }
    }

    #[test]
    fn report_path_keeps_output_extension() {
        assert_eq!(report_path(Path::new("/tmp/out.pcm")), PathBuf::from("/tmp/out.pcm.report.json"));
        assert_eq!(report_path(Path::new("/tmp/out.raw")), PathBuf::from("/tmp/out.raw.report.json"));
        assert_eq!(report_path(Path::new("out")), PathBuf::from("out.report.json"));
    }

    #[test]
    fn report_is_written_beside_output() {
        let output = temp_path("out.pcm");
        let report = sample_report(&output);

        let path = write_report(&report, &output).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"outputChecksum\""));
        assert!(json.contains("\"PCM_16BIT_LE\""));
        assert!(json.contains("\"framesFlushed\": 8192"));

        assert_eq!(read_report(&output), report);
        fs::remove_file(path).ok();
    }

    #[test]
    fn checksum_of_known_content() {
        let path = temp_path("abc.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        fs::remove_file(path).ok();
    }

    #[test]
    fn checksum_of_missing_file_fails() {
        assert!(matches!(
            sha256_file(&temp_path("missing.bin")),
            Err(NormalizerError::Io(_))
        ));
    }
}
