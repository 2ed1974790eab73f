use crate::{AudioError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Mono samples produced by [`decode_audio_bytes`].
pub(crate) struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode compressed audio bytes into mono f32 samples.
///
/// Format-agnostic via symphonia probing; `extension` is only a hint. Used
/// for synthesized speech (mpeg) and tolerant of WAV for test fixtures.
#[track_caller]
pub(crate) fn decode_audio_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
) -> CoreResult<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(std::io::Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::DecodeFailed {
            reason: format!("Unsupported audio format: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeFailed {
            reason: "No supported audio track found".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeFailed {
            reason: format!("Unsupported audio codec: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let mut samples = Vec::new();
    let mut sample_rate: Option<u32> = codec_params.sample_rate;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream is reported as an unexpected EOF by symphonia.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::DecodeFailed {
                    reason: format!("Failed to read packet: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(error = %e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(AudioError::DecodeFailed {
                    reason: format!("Decode failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        sample_rate.get_or_insert(spec.rate);

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        // Downmix interleaved frames to mono.
        samples.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    let sample_rate = sample_rate.ok_or_else(|| AudioError::DecodeFailed {
        reason: "Could not determine sample rate".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    if samples.is_empty() {
        return Err(AudioError::DecodeFailed {
            reason: "Stream decoded to zero samples".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    debug!(
        sample_count = samples.len(),
        sample_rate, "Decoded audio bytes"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
