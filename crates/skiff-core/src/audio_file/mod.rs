//! Audio file decoding
//!
//! Decodes music streams and event sounds into memory as stereo f32 via
//! symphonia. Mono sources are duplicated to both channels; sources with
//! more than two channels keep the first pair.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{EngineError, EngineResult};
use crate::types::{StereoBuffer, StereoSample};

/// A fully decoded music stream ready for the playback channel
#[derive(Debug, Clone)]
pub struct MusicStream {
    /// Decoded stereo samples
    pub samples: StereoBuffer,
    /// Native sample rate of the source file
    pub sample_rate: u32,
}

impl MusicStream {
    /// Duration of the stream in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> EngineError {
    EngineError::DecodeFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Decode an audio file into a stereo stream
pub fn load(path: &Path) -> EngineResult<MusicStream> {
    let file = File::open(path).map_err(|e| decode_error(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_error(path, e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| decode_error(path, "no audio track found"))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_error(path, "unknown sample rate"))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(2);

    if channels == 0 {
        return Err(decode_error(path, "no audio channels"));
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, e))?;

    let mut samples: Vec<StereoSample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => return Err(decode_error(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Recoverable per-packet errors: skip the packet, keep decoding
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                log::debug!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(decode_error(path, e)),
        };

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);

        let interleaved = buf.samples();
        match channels {
            1 => samples.extend(interleaved.iter().map(|&s| StereoSample::mono(s))),
            _ => samples.extend(
                interleaved
                    .chunks_exact(channels)
                    .map(|frame| StereoSample::new(frame[0], frame[1])),
            ),
        }
    }

    if samples.is_empty() {
        return Err(decode_error(path, "decoded zero samples"));
    }

    log::info!(
        "decoded {:?}: {} frames at {} Hz ({} source channels)",
        path,
        samples.len(),
        sample_rate,
        channels
    );

    Ok(MusicStream {
        samples: StereoBuffer::from_vec(samples),
        sample_rate,
    })
}
