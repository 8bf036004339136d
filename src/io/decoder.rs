//! Audio decoding using Symphonia
//!
//! This is the adapter between container/codec handling and the engine: it
//! yields an interleaved `f32` [`SampleBuffer`] at the file's native rate and
//! channel layout. Resampling to a common working rate is the caller's concern.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::sample_buffer::SampleBuffer;
use crate::error::EngineError;

/// Decode an audio file to an interleaved sample buffer
///
/// # Arguments
///
/// * `path` - Path to audio file (any container/codec Symphonia was built with)
///
/// # Returns
///
/// The decoded buffer at the file's native sample rate and channel count
///
/// # Errors
///
/// Returns `EngineError::Io` if the file cannot be opened and
/// `EngineError::Decoding` if probing or decoding fails.
pub fn decode_file(path: impl AsRef<Path>) -> Result<SampleBuffer, EngineError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|e| EngineError::io("opening audio file", e))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::Decoding(format!("{}: {}", path.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::Decoding(format!("{}: no audio track", path.display())))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::Decoding(format!("{}: {}", path.display(), e)))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut scratch: Option<DecodeBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(EngineError::Decoding(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count());

                let needed = decoded.capacity();
                if scratch.as_ref().map_or(true, |buf| buf.capacity() < needed) {
                    scratch = Some(DecodeBuffer::<f32>::new(needed as u64, spec));
                }
                if let Some(buf) = scratch.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    interleaved.extend_from_slice(buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet is skipped, the rest of the stream is still usable.
                log::warn!("Skipping undecodable packet in {}: {}", path.display(), e);
            }
            Err(e) => {
                return Err(EngineError::Decoding(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| EngineError::Decoding(format!("{}: unknown sample rate", path.display())))?;
    let channels = channels.unwrap_or(1).max(1);

    log::debug!(
        "Decoded {} frames at {} Hz ({} channel(s)) from {}",
        interleaved.len() / channels,
        sample_rate,
        channels,
        path.display()
    );

    let channels = u16::try_from(channels)
        .map_err(|_| EngineError::Decoding(format!("{}: too many channels", path.display())))?;
    SampleBuffer::new(interleaved, channels, sample_rate)
}
