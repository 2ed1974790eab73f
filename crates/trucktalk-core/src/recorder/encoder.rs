use crate::{AudioError, CoreResult};

use std::{
    io::{Cursor, Write},
    panic::Location,
    path::Path,
    sync::Arc,
};

use error_location::ErrorLocation;
use tempfile::TempPath;
use tracing::debug;

/// A captured practice clip: one WAV blob plus a locally playable file.
///
/// Dropping the clip deletes the file, revoking the local reference.
pub struct AudioClip {
    wav_bytes: Arc<Vec<u8>>,
    path: TempPath,
}

impl AudioClip {
    /// The encoded WAV bytes.
    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.wav_bytes
    }

    /// Path of the playable file backing this clip.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("byte_len", &self.wav_bytes.len())
            .field("path", &&*self.path)
            .finish()
    }
}

/// Assemble buffered capture samples into a clip.
#[track_caller]
pub(crate) fn encode_clip(samples: &[f32], sample_rate: u32) -> CoreResult<AudioClip> {
    let wav_bytes = encode_wav(samples, sample_rate)?;

    let mut file = tempfile::Builder::new()
        .prefix("trucktalk-clip-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| AudioError::EncodingFailed {
            reason: format!("Failed to create clip file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    file.write_all(&wav_bytes)
        .and_then(|()| file.flush())
        .map_err(|e| AudioError::EncodingFailed {
            reason: format!("Failed to write clip file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let path = file.into_temp_path();

    debug!(byte_len = wav_bytes.len(), path = ?&*path, "Clip encoded");

    Ok(AudioClip {
        wav_bytes: Arc::new(wav_bytes),
        path,
    })
}

/// Encode mono samples as 16-bit PCM WAV bytes.
#[track_caller]
pub(crate) fn encode_wav(samples: &[f32], sample_rate: u32) -> CoreResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| AudioError::EncodingFailed {
                reason: format!("Failed to create WAV writer: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(value)
                .map_err(|e| AudioError::EncodingFailed {
                    reason: format!("Failed to write sample: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        writer.finalize().map_err(|e| AudioError::EncodingFailed {
            reason: format!("Failed to finalize WAV: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    Ok(cursor.into_inner())
}

/// Decode a clip produced by [`encode_wav`] back into mono samples.
#[track_caller]
pub(crate) fn decode_clip(wav_bytes: &[u8]) -> CoreResult<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(wav_bytes)).map_err(|e| AudioError::DecodeFailed {
            reason: format!("Failed to read clip: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let spec = reader.spec();
    let channels = usize::from(spec.channels).max(1);

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
            .collect::<Result<_, _>>(),
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>(),
    }
    .map_err(|e| AudioError::DecodeFailed {
        reason: format!("Failed to decode clip samples: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok((samples, spec.sample_rate))
}
