//! CPAL output stream setup
//!
//! Builds a single stereo output stream whose callback owns the engine.
//! The control thread keeps the returned handle alive for the duration of
//! playback; dropping it stops audio.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, Stream, StreamConfig};

use crate::error::{EngineError, EngineResult};

use super::command::command_channel;
use super::control::EngineHandle;
use super::engine::{report_channel, Engine};

/// Requested sample rate; falls back to the device maximum when unsupported
const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Requested buffer size in frames
const DEFAULT_BUFFER_FRAMES: u32 = 512;

/// Keeps the output stream alive. Drop this to stop audio.
pub struct OutputHandle {
    _stream: Stream,
    sample_rate: u32,
}

impl OutputHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Start the output stream and return its handle plus a control-side engine
/// handle
pub fn start_output() -> EngineResult<(OutputHandle, EngineHandle)> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(EngineError::NoDevices)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported = pick_output_config(&device)?;
    let sample_rate = supported.sample_rate().0;

    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: BufferSize::Fixed(DEFAULT_BUFFER_FRAMES),
    };

    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        DEFAULT_BUFFER_FRAMES,
        DEFAULT_BUFFER_FRAMES as f32 / sample_rate as f32 * 1000.0
    );

    let (command_tx, command_rx) = command_channel();
    let (report_tx, report_rx) = report_channel();
    let mut engine = Engine::new(sample_rate as f32, command_rx, report_tx);

    let channels = stream_config.channels as usize;
    // Preallocated so non-stereo devices don't allocate in the callback
    let mut stereo = vec![0.0f32; super::engine::MAX_BUFFER_SIZE * 2];
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                if channels == 2 {
                    engine.process(data);
                } else {
                    // Render stereo then spread over the device layout
                    let frames = (data.len() / channels).min(super::engine::MAX_BUFFER_SIZE);
                    engine.process(&mut stereo[..frames * 2]);
                    spread_stereo(&stereo[..frames * 2], data, channels);
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    let handle = OutputHandle {
        _stream: stream,
        sample_rate,
    };
    Ok((handle, EngineHandle::new(command_tx, report_rx, sample_rate)))
}

/// Spread a rendered stereo buffer over a non-stereo device layout. Mono
/// devices get an equal-weight downmix; channels past the first two are
/// silenced.
fn spread_stereo(stereo: &[f32], data: &mut [f32], channels: usize) {
    for (i, frame) in data.chunks_mut(channels).enumerate().take(stereo.len() / 2) {
        let left = stereo[i * 2];
        let right = stereo[i * 2 + 1];
        if channels == 1 {
            frame[0] = (left + right) * 0.5;
        } else {
            frame[0] = left;
            frame[1] = right;
            for ch in frame.iter_mut().skip(2) {
                *ch = 0.0;
            }
        }
    }
}

/// Pick the best output configuration: f32, stereo, at the default rate if
/// the device supports it
fn pick_output_config(device: &cpal::Device) -> EngineResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| EngineError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(EngineError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let best = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .find(|c| {
            DEFAULT_SAMPLE_RATE >= c.min_sample_rate().0
                && DEFAULT_SAMPLE_RATE <= c.max_sample_rate().0
        })
        .or_else(|| supported_configs.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported_configs.first())
        .ok_or_else(|| {
            EngineError::ConfigError("No suitable output configuration found".to_string())
        })?;

    let sample_rate = if DEFAULT_SAMPLE_RATE >= best.min_sample_rate().0
        && DEFAULT_SAMPLE_RATE <= best.max_sample_rate().0
    {
        cpal::SampleRate(DEFAULT_SAMPLE_RATE)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz",
            DEFAULT_SAMPLE_RATE,
            fallback.0
        );
        fallback
    };

    Ok(best.clone().with_sample_rate(sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_device_downmixes_both_channels() {
        let stereo = [0.8, 0.2, -0.4, 0.4];
        let mut data = [0.0f32; 2];
        spread_stereo(&stereo, &mut data, 1);
        assert!((data[0] - 0.5).abs() < 1e-6);
        assert!(data[1].abs() < 1e-6);
    }

    #[test]
    fn test_surround_device_gets_stereo_front_pair() {
        let stereo = [0.8, 0.2];
        let mut data = [9.0f32; 4];
        spread_stereo(&stereo, &mut data, 4);
        assert_eq!(&data, &[0.8, 0.2, 0.0, 0.0]);
    }
}
