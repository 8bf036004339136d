//! WAV output using hound
//!
//! Rendered assemblies are written as 32-bit float or 16-bit PCM WAV files.

use std::path::Path;

use super::sample_buffer::SampleBuffer;
use crate::error::EngineError;

/// Sample format for written files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavFormat {
    /// 32-bit IEEE float
    #[default]
    Float32,
    /// 16-bit signed PCM (samples are clamped to [-1, 1])
    Pcm16,
}

fn wav_error(context: &str, err: hound::Error) -> EngineError {
    match err {
        hound::Error::IoError(e) => EngineError::io("writing WAV file", e),
        other => EngineError::Decoding(format!("{}: {}", context, other)),
    }
}

/// Write a buffer to a WAV file
///
/// # Errors
///
/// Returns `EngineError::Io` for filesystem failures.
pub fn write_wav(
    buffer: &SampleBuffer,
    path: impl AsRef<Path>,
    format: WavFormat,
) -> Result<(), EngineError> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: match format {
            WavFormat::Float32 => 32,
            WavFormat::Pcm16 => 16,
        },
        sample_format: match format {
            WavFormat::Float32 => hound::SampleFormat::Float,
            WavFormat::Pcm16 => hound::SampleFormat::Int,
        },
    };

    let context = path.display().to_string();
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| wav_error(&context, e))?;
    for &sample in buffer.samples() {
        match format {
            WavFormat::Float32 => writer.write_sample(sample),
            WavFormat::Pcm16 => {
                let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                writer.write_sample(scaled)
            }
        }
        .map_err(|e| wav_error(&context, e))?;
    }
    writer.finalize().map_err(|e| wav_error(&context, e))?;

    log::debug!(
        "Wrote {} frames ({} ms) to {}",
        buffer.frames(),
        buffer.duration_ms(),
        context
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::decoder::decode_file;

    #[test]
    fn test_write_then_decode_preserves_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let samples: Vec<f32> = (0..800).map(|i| ((i as f32) * 0.05).sin() * 0.5).collect();
        let buffer = SampleBuffer::new(samples, 2, 16_000).unwrap();

        write_wav(&buffer, &path, WavFormat::Pcm16).unwrap();
        let decoded = decode_file(&path).unwrap();

        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.sample_rate(), 16_000);
        assert_eq!(decoded.frames(), 400);
        assert!((decoded.samples()[10] - buffer.samples()[10]).abs() < 1e-3);
    }

    #[test]
    fn test_decode_missing_file_is_io_error() {
        let result = decode_file("/definitely/not/here.wav");
        assert!(matches!(result, Err(EngineError::Io { .. })));
    }
}
