//! Audio decoding using symphonia
//!
//! Decodes a whole audio file to mono PCM for cepstral analysis. Supported
//! formats follow the symphonia `all` feature set: FLAC, MP3, OGG/Vorbis,
//! WAV, AAC/M4A.
//!
//! Analysis only ever looks at the first channel, at the file's native
//! sample rate. Stereo imaging contributes nothing to the quefrency
//! representation and halving the data keeps the filterbank pass cheap.

use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use thiserror::Error;

/// Decode errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// File could not be opened
    #[error("Cannot open file: {0}")]
    Open(String),

    /// Container format not recognized or no audio track present
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Codec failure partway through the stream
    #[error("Decode failed: {0}")]
    Failed(String),

    /// Stream carried no samples
    #[error("File contains no audio data")]
    Empty,
}

/// Decoded mono audio
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// First-channel samples in [-1.0, 1.0]
    pub samples: Vec<f64>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file's first channel to f64 PCM
pub fn decode_first_channel(file_path: &Path) -> Result<DecodedAudio, DecodeError> {
    let file =
        File::open(file_path).map_err(|e| DecodeError::Open(format!("{}: {}", file_path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = file_path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::UnsupportedFormat(format!("{:?}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::UnsupportedFormat("No audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(44100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedFormat(format!("{:?}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break; // EOF
            }
            Err(e) => return Err(DecodeError::Failed(format!("{:?}", e))),
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => extend_first_channel(&decoded, &mut samples),
            // Recoverable per-packet corruption; keep going
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(file = %file_path.display(), "Skipping corrupt packet: {}", e);
            }
            Err(e) => return Err(DecodeError::Failed(format!("{:?}", e))),
        }
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Append the first channel of a decoded buffer, converted to f64
fn extend_first_channel(decoded: &AudioBufferRef, output: &mut Vec<f64>) {
    match decoded {
        AudioBufferRef::U8(buf) => push_channel(buf, output),
        AudioBufferRef::U16(buf) => push_channel(buf, output),
        AudioBufferRef::U24(buf) => push_channel(buf, output),
        AudioBufferRef::U32(buf) => push_channel(buf, output),
        AudioBufferRef::S8(buf) => push_channel(buf, output),
        AudioBufferRef::S16(buf) => push_channel(buf, output),
        AudioBufferRef::S24(buf) => push_channel(buf, output),
        AudioBufferRef::S32(buf) => push_channel(buf, output),
        AudioBufferRef::F32(buf) => push_channel(buf, output),
        AudioBufferRef::F64(buf) => push_channel(buf, output),
    }
}

fn push_channel<S>(buf: &AudioBuffer<S>, output: &mut Vec<f64>)
where
    S: Sample + IntoSample<f64>,
{
    output.extend(buf.chan(0).iter().map(|&s| s.into_sample()));
}
