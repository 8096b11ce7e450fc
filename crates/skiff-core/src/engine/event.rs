//! One-shot event sounds with simple 3D spatialization
//!
//! Event sounds are short preloaded clips fired at a world position. Each
//! active clip plays on a voice; voices are attenuated by distance and panned
//! by direction relative to the listener.

use std::sync::Arc;

use crate::types::{ListenerPose, StereoBuffer, StereoSample};

/// Maximum simultaneously playing event voices
pub const MAX_EVENT_VOICES: usize = 16;

/// Distance at which attenuation begins (world units)
const MIN_DISTANCE: f32 = 1.0;
/// Distance beyond which a voice is inaudible
const MAX_DISTANCE: f32 = 60.0;

/// A one-shot sound fired at a world position
pub struct EventSound {
    pub samples: Arc<StereoBuffer>,
    pub position: [f32; 3],
}

/// A playing instance of an event sound
struct EventVoice {
    sound: EventSound,
    cursor: usize,
}

impl EventVoice {
    /// Gain and pan derived from the voice position and the listener
    fn spatialize(&self, listener: &ListenerPose) -> (f32, f32) {
        let dx = self.sound.position[0] - listener.position[0];
        let dy = self.sound.position[1] - listener.position[1];
        let dz = self.sound.position[2] - listener.position[2];
        let distance = (dx * dx + dy * dy + dz * dz).sqrt();

        let gain = if distance <= MIN_DISTANCE {
            1.0
        } else if distance >= MAX_DISTANCE {
            0.0
        } else {
            MIN_DISTANCE / distance
        };

        // Project the direction onto the listener's right axis for pan
        let fwd = listener.forward;
        let up = listener.up;
        let right = [
            fwd[1] * up[2] - fwd[2] * up[1],
            fwd[2] * up[0] - fwd[0] * up[2],
            fwd[0] * up[1] - fwd[1] * up[0],
        ];
        let pan = if distance > 1e-3 {
            ((dx * right[0] + dy * right[1] + dz * right[2]) / distance).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        (gain, pan)
    }
}

/// Fixed-size pool of event voices, mixed into the output after the music
/// channel's graph
pub struct EventMixer {
    voices: Vec<EventVoice>,
    listener: ListenerPose,
}

impl EventMixer {
    pub fn new() -> Self {
        Self {
            voices: Vec::with_capacity(MAX_EVENT_VOICES),
            listener: ListenerPose::default(),
        }
    }

    pub fn set_listener(&mut self, listener: ListenerPose) {
        self.listener = listener;
    }

    /// Start a voice; returns false when the pool is full and the sound was
    /// dropped
    pub fn play(&mut self, sound: EventSound) -> bool {
        if self.voices.len() >= MAX_EVENT_VOICES {
            return false;
        }
        self.voices.push(EventVoice { sound, cursor: 0 });
        true
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Mix all active voices into `buffer`, retiring finished ones
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        let listener = self.listener;
        for voice in &mut self.voices {
            let (gain, pan) = voice.spatialize(&listener);

            // Constant-power pan
            let angle = (pan + 1.0) * std::f32::consts::FRAC_PI_4;
            let gain_l = gain * angle.cos();
            let gain_r = gain * angle.sin();

            let samples = voice.sound.samples.as_slice();
            for out in buffer.iter_mut() {
                if voice.cursor >= samples.len() {
                    break;
                }
                let s = samples[voice.cursor];
                // Event clips mix both source channels down before panning
                let mono = 0.5 * (s.left + s.right);
                *out += StereoSample::new(mono * gain_l, mono * gain_r);
                voice.cursor += 1;
            }
        }
        self.voices.retain(|v| v.cursor < v.sound.samples.len());
    }
}

impl Default for EventMixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(len: usize, value: f32) -> Arc<StereoBuffer> {
        let mut buffer = StereoBuffer::silence(len);
        for s in buffer.iter_mut() {
            *s = StereoSample::new(value, value);
        }
        Arc::new(buffer)
    }

    fn sound_at(samples: Arc<StereoBuffer>, position: [f32; 3]) -> EventSound {
        EventSound { samples, position }
    }

    #[test]
    fn test_voice_retires_when_finished() {
        let mut mixer = EventMixer::new();
        assert!(mixer.play(sound_at(clip(10, 0.5), [0.0; 3])));
        assert_eq!(mixer.active_voices(), 1);

        let mut buffer = StereoBuffer::silence(16);
        mixer.process(&mut buffer);
        assert_eq!(mixer.active_voices(), 0);
        assert!(buffer.peak() > 0.0);
    }

    #[test]
    fn test_pool_full_drops_sound() {
        let mut mixer = EventMixer::new();
        let samples = clip(100, 0.1);
        for _ in 0..MAX_EVENT_VOICES {
            assert!(mixer.play(sound_at(samples.clone(), [0.0; 3])));
        }
        assert!(!mixer.play(sound_at(samples, [0.0; 3])));
    }

    #[test]
    fn test_distant_sound_quieter() {
        let samples = clip(32, 1.0);

        let mut near = EventMixer::new();
        near.play(sound_at(samples.clone(), [0.0, 0.0, 0.0]));
        let mut near_buf = StereoBuffer::silence(32);
        near.process(&mut near_buf);

        let mut far = EventMixer::new();
        far.play(sound_at(samples, [30.0, 0.0, 0.0]));
        let mut far_buf = StereoBuffer::silence(32);
        far.process(&mut far_buf);

        assert!(far_buf.peak() < near_buf.peak());
    }

    #[test]
    fn test_sound_to_the_right_pans_right() {
        let samples = clip(32, 1.0);
        let mut mixer = EventMixer::new();
        // Listener faces -z with +y up, so +x is to the right
        mixer.play(sound_at(samples, [5.0, 0.0, 0.0]));

        let mut buffer = StereoBuffer::silence(32);
        mixer.process(&mut buffer);

        assert!(buffer[0].right.abs() > buffer[0].left.abs());
    }
}
