//! Music playback channel
//!
//! Renders the loaded stream at a variable rate with linear interpolation,
//! looping at the end. Volume, pan, and speaker routing apply after the
//! per-sample read so they never interact with the playhead.

use crate::audio_file::MusicStream;
use crate::types::{StereoBuffer, StereoSample};

/// Which output speakers the music channel feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeakerMode {
    #[default]
    Both,
    Left,
    Right,
}

pub struct MusicChannel {
    stream: Option<MusicStream>,
    /// Fractional read position into the stream, in source frames
    playhead: f64,
    playing: bool,
    paused: bool,
    /// Playback frequency as a ratio of the stream's native rate
    frequency: f32,
    volume: f32,
    pan: f32,
    speaker_mode: SpeakerMode,
    /// Output device sample rate
    device_rate: f32,
}

impl MusicChannel {
    pub fn new(device_rate: f32) -> Self {
        Self {
            stream: None,
            playhead: 0.0,
            playing: false,
            paused: false,
            frequency: 1.0,
            volume: 1.0,
            pan: 0.0,
            speaker_mode: SpeakerMode::Both,
            device_rate,
        }
    }

    pub fn load(&mut self, stream: MusicStream) {
        self.stream = Some(stream);
        self.playhead = 0.0;
        self.playing = false;
    }

    pub fn play(&mut self) {
        self.playhead = 0.0;
        self.playing = true;
        self.paused = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frequency ratio relative to the stream's native rate. 1.0 plays at
    /// the recorded speed; values are kept in the same range the pitch
    /// recurrence can reach.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(0.25, 4.0);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    pub fn set_speaker_mode(&mut self, mode: SpeakerMode) {
        self.speaker_mode = mode;
    }

    /// Render the next `buffer.len()` output frames, looping at stream end
    pub fn render(&mut self, buffer: &mut StereoBuffer) {
        buffer.fill_silence();

        let Some(stream) = &self.stream else {
            return;
        };
        if !self.playing || self.paused || stream.samples.is_empty() {
            return;
        }

        let len = stream.samples.len();
        let step = (self.frequency * stream.sample_rate as f32 / self.device_rate) as f64;

        // Balance-style pan: full pan mutes one side, center is unity
        let pan_l = (1.0 - self.pan).min(1.0);
        let pan_r = (1.0 + self.pan).min(1.0);

        for out in buffer.iter_mut() {
            let base = self.playhead as usize;
            let frac = (self.playhead - base as f64) as f32;
            let s0 = stream.samples[base % len];
            let s1 = stream.samples[(base + 1) % len];
            let sample = s0 * (1.0 - frac) + s1 * frac;

            let left = sample.left * self.volume * pan_l;
            let right = sample.right * self.volume * pan_r;

            *out = match self.speaker_mode {
                SpeakerMode::Both => StereoSample::new(left, right),
                SpeakerMode::Left => StereoSample::new(left + right, 0.0),
                SpeakerMode::Right => StereoSample::new(0.0, left + right),
            };

            self.playhead += step;
            if self.playhead >= len as f64 {
                self.playhead -= len as f64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(len: usize, value: f32, sample_rate: u32) -> MusicStream {
        let mut samples = StereoBuffer::silence(len);
        for s in samples.iter_mut() {
            *s = StereoSample::new(value, value);
        }
        MusicStream {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn test_silent_until_play() {
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(64, 0.5, 48_000));

        let mut buffer = StereoBuffer::silence(32);
        channel.render(&mut buffer);
        assert!(buffer.peak() < 1e-6);

        channel.play();
        channel.render(&mut buffer);
        assert!(buffer.peak() > 0.4);
    }

    #[test]
    fn test_pause_silences_and_holds_playhead() {
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(64, 0.5, 48_000));
        channel.play();

        let mut buffer = StereoBuffer::silence(16);
        channel.render(&mut buffer);
        let pos = channel.playhead;

        channel.set_paused(true);
        channel.render(&mut buffer);
        assert!(buffer.peak() < 1e-6);
        assert_eq!(channel.playhead, pos);

        channel.set_paused(false);
        channel.render(&mut buffer);
        assert!(buffer.peak() > 0.4);
    }

    #[test]
    fn test_frequency_scales_playhead_advance() {
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(48_000, 0.5, 48_000));
        channel.play();
        channel.set_frequency(2.0);

        let mut buffer = StereoBuffer::silence(100);
        channel.render(&mut buffer);
        assert!((channel.playhead - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_playhead_wraps_at_end() {
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(50, 0.5, 48_000));
        channel.play();

        let mut buffer = StereoBuffer::silence(80);
        channel.render(&mut buffer);
        assert!(channel.playhead < 50.0);
        // Looped region still audible
        assert!(buffer[79].left > 0.4);
    }

    #[test]
    fn test_left_speaker_mode_mutes_right() {
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(64, 0.5, 48_000));
        channel.play();
        channel.set_speaker_mode(SpeakerMode::Left);

        let mut buffer = StereoBuffer::silence(8);
        channel.render(&mut buffer);
        assert!(buffer[4].left > 0.4);
        assert_eq!(buffer[4].right, 0.0);
    }

    #[test]
    fn test_pan_hard_left_mutes_right() {
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(64, 0.5, 48_000));
        channel.play();
        channel.set_pan(-1.0);

        let mut buffer = StereoBuffer::silence(8);
        channel.render(&mut buffer);
        assert!(buffer[4].left > 0.4);
        assert_eq!(buffer[4].right, 0.0);
    }

    #[test]
    fn test_resampling_rate_mismatch() {
        // 24 kHz stream on a 48 kHz device advances half a frame per output
        let mut channel = MusicChannel::new(48_000.0);
        channel.load(stream(1000, 0.5, 24_000));
        channel.play();

        let mut buffer = StereoBuffer::silence(100);
        channel.render(&mut buffer);
        assert!((channel.playhead - 50.0).abs() < 1e-6);
    }
}
