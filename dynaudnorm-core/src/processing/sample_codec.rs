//! Raw interleaved PCM ⇄ planar `f64` conversion.
//!
//! Stream layout (no header):
//! ```text
//! frame 0: [ch0][ch1]...[chN-1]   frame 1: [ch0][ch1]...   ...
//! ```
//! Each sample is `PcmFormat::sample_size()` bytes in the format's byte order.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::models::config::MAX_CHANNELS;
use crate::models::error::{NormalizerError, Result};
use crate::processing::pcm_format::PcmFormat;
use crate::processing::sample_buffer::SampleBuffer;

/// Stateless converter for one format and channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCodec {
    format: PcmFormat,
    channels: usize,
}

impl SampleCodec {
    pub fn new(format: PcmFormat, channels: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS as usize {
            return Err(NormalizerError::Validation(format!(
                "invalid number of channels: {}",
                channels
            )));
        }
        Ok(Self { format, channels })
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Bytes per interleaved frame.
    pub fn frame_size(&self) -> usize {
        self.format.sample_size() * self.channels
    }

    /// Decode whole frames from `bytes` into the front of `buffer`.
    ///
    /// Returns the number of frames decoded. A trailing partial frame is an
    /// error, as is more data than `buffer` can hold.
    pub fn decode(&self, bytes: &[u8], buffer: &mut SampleBuffer) -> Result<usize> {
        self.check_channels(buffer)?;

        let frame_size = self.frame_size();
        if bytes.len() % frame_size != 0 {
            return Err(NormalizerError::Validation(format!(
                "byte count {} is not a multiple of frame size {}",
                bytes.len(),
                frame_size
            )));
        }

        let frame_count = bytes.len() / frame_size;
        buffer.ensure_shape(self.channels, frame_count)?;

        let sample_size = self.format.sample_size();
        for (index, frame) in bytes.chunks_exact(frame_size).enumerate() {
            for (channel, sample) in frame.chunks_exact(sample_size).enumerate() {
                buffer.channel_mut(channel)[index] = self.format.read_sample(sample);
            }
        }

        Ok(frame_count)
    }

    /// Encode the first `frame_count` frames of `buffer` into `out`.
    ///
    /// `out` is resized to exactly `frame_count * frame_size()` bytes; its
    /// allocation is kept so callers can reuse it.
    pub fn encode(&self, buffer: &SampleBuffer, frame_count: usize, out: &mut Vec<u8>) -> Result<()> {
        self.check_channels(buffer)?;
        buffer.ensure_shape(self.channels, frame_count)?;

        let frame_size = self.frame_size();
        let sample_size = self.format.sample_size();
        out.clear();
        out.resize(frame_count * frame_size, 0);

        for (index, frame) in out.chunks_exact_mut(frame_size).enumerate() {
            for (channel, sample) in frame.chunks_exact_mut(sample_size).enumerate() {
                self.format.write_sample(buffer.channel(channel)[index], sample);
            }
        }

        Ok(())
    }

    fn check_channels(&self, buffer: &SampleBuffer) -> Result<()> {
        if buffer.channel_count() != self.channels {
            return Err(NormalizerError::Validation(format!(
                "buffer has {} channels, codec expects {}",
                buffer.channel_count(),
                self.channels
            )));
        }
        Ok(())
    }
}

/// Streaming raw PCM reader.
pub struct PcmReader<R: Read> {
    inner: R,
    codec: SampleCodec,
    scratch: Vec<u8>,
}

impl PcmReader<BufReader<File>> {
    pub fn open(path: &Path, channels: usize, format: PcmFormat) -> Result<Self> {
        let codec = SampleCodec::new(format, channels)?;
        let file = File::open(path)
            .map_err(|e| NormalizerError::Io(format!("failed to open {}: {}", path.display(), e)))?;
        Ok(Self::new(BufReader::new(file), codec))
    }
}

impl<R: Read> PcmReader<R> {
    pub fn new(inner: R, codec: SampleCodec) -> Self {
        Self {
            inner,
            codec,
            scratch: Vec::new(),
        }
    }

    pub fn codec(&self) -> &SampleCodec {
        &self.codec
    }

    /// Read up to `buffer.frame_count()` frames.
    ///
    /// Returns the number of frames stored at the front of `buffer`; 0 means
    /// the source is exhausted. Fails if the source ends inside a frame.
    pub fn read(&mut self, buffer: &mut SampleBuffer) -> Result<usize> {
        if buffer.frame_count() == 0 {
            return Err(NormalizerError::Validation(
                "buffer capacity must be at least one frame".into(),
            ));
        }

        let wanted = buffer.frame_count() * self.codec.frame_size();
        if self.scratch.len() < wanted {
            self.scratch.resize(wanted, 0);
        }

        let mut filled = 0;
        while filled < wanted {
            match self.inner.read(&mut self.scratch[filled..wanted]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.codec.decode(&self.scratch[..filled], buffer)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Streaming raw PCM writer.
pub struct PcmWriter<W: Write> {
    inner: W,
    codec: SampleCodec,
    scratch: Vec<u8>,
    bytes_written: u64,
}

impl PcmWriter<BufWriter<File>> {
    pub fn create(path: &Path, channels: usize, format: PcmFormat) -> Result<Self> {
        let codec = SampleCodec::new(format, channels)?;
        let file = File::create(path)
            .map_err(|e| NormalizerError::Io(format!("failed to create {}: {}", path.display(), e)))?;
        Ok(Self::new(BufWriter::new(file), codec))
    }
}

impl<W: Write> PcmWriter<W> {
    pub fn new(inner: W, codec: SampleCodec) -> Self {
        Self {
            inner,
            codec,
            scratch: Vec::new(),
            bytes_written: 0,
        }
    }

    pub fn codec(&self) -> &SampleCodec {
        &self.codec
    }

    /// Encode and write the first `frame_count` frames of `buffer`.
    pub fn write(&mut self, buffer: &SampleBuffer, frame_count: usize) -> Result<()> {
        self.codec.encode(buffer, frame_count, &mut self.scratch)?;
        self.inner.write_all(&self.scratch)?;
        self.bytes_written += self.scratch.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn ramp(channels: usize, frames: usize) -> SampleBuffer {
        let data = (0..channels)
            .map(|c| {
                (0..frames)
                    .map(|i| {
                        let t = i as f64 / frames as f64;
                        (t * 2.0 - 1.0) * if c % 2 == 0 { 1.0 } else { -0.5 }
                    })
                    .collect()
            })
            .collect();
        SampleBuffer::from_channels(data).unwrap()
    }

    #[test]
    fn codec_rejects_bad_channel_counts() {
        assert!(SampleCodec::new(PcmFormat::Pcm16Le, 0).is_err());
        assert!(SampleCodec::new(PcmFormat::Pcm16Le, 9).is_err());
        assert!(SampleCodec::new(PcmFormat::Pcm16Le, 8).is_ok());
    }

    #[test]
    fn frame_size_is_width_times_channels() {
        assert_eq!(SampleCodec::new(PcmFormat::Pcm16Be, 2).unwrap().frame_size(), 4);
        assert_eq!(SampleCodec::new(PcmFormat::Pcm32Le, 3).unwrap().frame_size(), 12);
        assert_eq!(SampleCodec::new(PcmFormat::Pcm64Le, 6).unwrap().frame_size(), 48);
    }

    #[test]
    fn interleaving_order() {
        let codec = SampleCodec::new(PcmFormat::Pcm16Le, 2).unwrap();
        let buffer = SampleBuffer::from_channels(vec![vec![1.0, 0.0], vec![-1.0, 0.5]]).unwrap();
        let mut out = Vec::new();
        codec.encode(&buffer, 2, &mut out).unwrap();

        let samples: Vec<i16> = out.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();
        assert_eq!(samples, vec![32767, -32767, 0, 16384]);
    }

    #[test]
    fn encode_sizes_output_exactly() {
        let codec = SampleCodec::new(PcmFormat::Pcm64Be, 2).unwrap();
        let buffer = ramp(2, 10);
        let mut out = vec![0xFF; 1000];
        codec.encode(&buffer, 3, &mut out).unwrap();
        assert_eq!(out.len(), 3 * 16);
    }

    #[test]
    fn round_trip_float_formats_exact() {
        for format in [PcmFormat::Pcm64Le, PcmFormat::Pcm64Be] {
            let codec = SampleCodec::new(format, 3).unwrap();
            let original = ramp(3, 64);
            let mut bytes = Vec::new();
            codec.encode(&original, 64, &mut bytes).unwrap();

            let mut decoded = SampleBuffer::new(3, 64).unwrap();
            assert_eq!(codec.decode(&bytes, &mut decoded).unwrap(), 64);
            assert_eq!(decoded, original);
        }

        for format in [PcmFormat::Pcm32Le, PcmFormat::Pcm32Be] {
            let codec = SampleCodec::new(format, 2).unwrap();
            let original = ramp(2, 64);
            let mut bytes = Vec::new();
            codec.encode(&original, 64, &mut bytes).unwrap();

            let mut decoded = SampleBuffer::new(2, 64).unwrap();
            codec.decode(&bytes, &mut decoded).unwrap();
            for c in 0..2 {
                for (a, b) in original.channel(c).iter().zip(decoded.channel(c)) {
                    assert_eq!(*a as f32, *b as f32);
                }
            }
        }
    }

    #[test]
    fn round_trip_int16_within_quantization() {
        for format in [PcmFormat::Pcm16Le, PcmFormat::Pcm16Be] {
            let codec = SampleCodec::new(format, 2).unwrap();
            let original = ramp(2, 257);
            let mut bytes = Vec::new();
            codec.encode(&original, 257, &mut bytes).unwrap();

            let mut decoded = SampleBuffer::new(2, 257).unwrap();
            codec.decode(&bytes, &mut decoded).unwrap();
            for c in 0..2 {
                for (a, b) in original.channel(c).iter().zip(decoded.channel(c)) {
                    assert_abs_diff_eq!(*a, *b, epsilon = 1.0 / 32767.0);
                }
            }
        }
    }

    #[test]
    fn decode_rejects_partial_frame() {
        let codec = SampleCodec::new(PcmFormat::Pcm16Le, 2).unwrap();
        let mut buffer = SampleBuffer::new(2, 16).unwrap();
        let result = codec.decode(&[0u8; 6], &mut buffer);
        assert!(matches!(result, Err(NormalizerError::Validation(_))));
    }

    #[test]
    fn decode_rejects_channel_mismatch() {
        let codec = SampleCodec::new(PcmFormat::Pcm16Le, 2).unwrap();
        let mut buffer = SampleBuffer::new(1, 16).unwrap();
        assert!(codec.decode(&[0u8; 4], &mut buffer).is_err());
    }

    #[test]
    fn decode_rejects_overflowing_capacity() {
        let codec = SampleCodec::new(PcmFormat::Pcm16Le, 1).unwrap();
        let mut buffer = SampleBuffer::new(1, 2).unwrap();
        assert!(codec.decode(&[0u8; 6], &mut buffer).is_err());
    }

    #[test]
    fn encode_rejects_frame_count_beyond_capacity() {
        let codec = SampleCodec::new(PcmFormat::Pcm32Le, 2).unwrap();
        let buffer = SampleBuffer::new(2, 4).unwrap();
        let mut out = Vec::new();
        assert!(codec.encode(&buffer, 5, &mut out).is_err());
    }

    #[test]
    fn reader_streams_until_exhausted() {
        let codec = SampleCodec::new(PcmFormat::Pcm16Le, 2).unwrap();
        let source = ramp(2, 10);
        let mut bytes = Vec::new();
        codec.encode(&source, 10, &mut bytes).unwrap();

        let mut reader = PcmReader::new(Cursor::new(bytes), codec);
        let mut buffer = SampleBuffer::new(2, 4).unwrap();

        assert_eq!(reader.read(&mut buffer).unwrap(), 4);
        assert_eq!(reader.read(&mut buffer).unwrap(), 4);
        assert_eq!(reader.read(&mut buffer).unwrap(), 2);
        assert_abs_diff_eq!(buffer.channel(0)[1], source.channel(0)[9], epsilon = 1.0 / 32767.0);
        assert_eq!(reader.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn reader_rejects_truncated_stream() {
        let codec = SampleCodec::new(PcmFormat::Pcm32Be, 2).unwrap();
        let mut reader = PcmReader::new(Cursor::new(vec![0u8; 8 + 5]), codec);
        let mut buffer = SampleBuffer::new(2, 16).unwrap();
        assert!(matches!(reader.read(&mut buffer), Err(NormalizerError::Validation(_))));
    }

    /// Hands out at most three bytes per call.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(3);
            self.0.read(&mut buf[..len])
        }
    }

    #[test]
    fn reader_tolerates_short_reads() {
        let codec = SampleCodec::new(PcmFormat::Pcm16Be, 2).unwrap();
        let source = ramp(2, 8);
        let mut bytes = Vec::new();
        codec.encode(&source, 8, &mut bytes).unwrap();

        let mut reader = PcmReader::new(Trickle(Cursor::new(bytes)), codec);
        let mut buffer = SampleBuffer::new(2, 8).unwrap();
        assert_eq!(reader.read(&mut buffer).unwrap(), 8);
    }

    #[test]
    fn writer_appends_frames() {
        let codec = SampleCodec::new(PcmFormat::Pcm32Le, 1).unwrap();
        let mut writer = PcmWriter::new(Vec::new(), codec);
        let buffer = SampleBuffer::from_channels(vec![vec![0.5, -0.5, 0.25]]).unwrap();

        writer.write(&buffer, 3).unwrap();
        writer.write(&buffer, 1).unwrap();
        assert_eq!(writer.bytes_written(), 16);

        let bytes = writer.finish().unwrap();
        assert_eq!(&bytes[12..16], &0.5f32.to_le_bytes());
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("dynaudnorm_codec_test_{}.pcm", std::process::id()));
        let source = ramp(2, 100);

        let mut writer = PcmWriter::create(&path, 2, PcmFormat::Pcm64Le).unwrap();
        writer.write(&source, 100).unwrap();
        writer.finish().unwrap();

        let mut reader = PcmReader::open(&path, 2, PcmFormat::Pcm64Le).unwrap();
        let mut buffer = SampleBuffer::new(2, 128).unwrap();
        assert_eq!(reader.read(&mut buffer).unwrap(), 100);
        assert_eq!(&buffer.channel(1)[..100], source.channel(1));

        std::fs::remove_file(&path).ok();
    }
}
