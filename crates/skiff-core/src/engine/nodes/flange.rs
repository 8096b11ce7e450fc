//! Flanger node
//!
//! Short modulated delay mixed back with the dry signal. The feedback path
//! gives the characteristic swept-comb sound.

use crate::types::StereoBuffer;

use super::DspNode;

/// LFO rate parameter (Hz)
pub const PARAM_RATE: usize = 0;
/// Sweep depth parameter (0..1)
pub const PARAM_DEPTH: usize = 1;
/// Wet mix parameter (0..1)
pub const PARAM_MIX: usize = 2;

const BASE_DELAY_MS: f32 = 1.0;
const SWEEP_DELAY_MS: f32 = 5.0;
const DEFAULT_RATE: f32 = 0.25;
const DEFAULT_DEPTH: f32 = 1.0;
const DEFAULT_MIX: f32 = 0.5;
const FEEDBACK: f32 = 0.4;

struct ModDelayChannel {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl ModDelayChannel {
    fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(2)],
            write_pos: 0,
        }
    }

    /// Linear-interpolated read at a fractional delay
    #[inline]
    fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(0.0, (len - 2) as f32);
        let whole = delay as usize;
        let frac = delay - whole as f32;

        let i0 = (self.write_pos + len - whole) % len;
        let i1 = (i0 + len - 1) % len;
        self.buffer[i0] * (1.0 - frac) + self.buffer[i1] * frac
    }

    #[inline]
    fn write(&mut self, value: f32) {
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        self.buffer[self.write_pos] = value;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

pub struct FlangeNode {
    left: ModDelayChannel,
    right: ModDelayChannel,
    lfo_phase: f32,
    rate: f32,
    depth: f32,
    mix: f32,
    sample_rate: f32,
}

impl FlangeNode {
    pub fn new(sample_rate: f32) -> Self {
        let max_samples =
            ((BASE_DELAY_MS + SWEEP_DELAY_MS) / 1000.0 * sample_rate) as usize + 2;
        Self {
            left: ModDelayChannel::new(max_samples),
            right: ModDelayChannel::new(max_samples),
            lfo_phase: 0.0,
            rate: DEFAULT_RATE,
            depth: DEFAULT_DEPTH,
            mix: DEFAULT_MIX,
            sample_rate,
        }
    }
}

impl DspNode for FlangeNode {
    fn name(&self) -> &'static str {
        "flange"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            PARAM_RATE => self.rate = value.clamp(0.01, 10.0),
            PARAM_DEPTH => self.depth = value.clamp(0.0, 1.0),
            PARAM_MIX => self.mix = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        let base = BASE_DELAY_MS / 1000.0 * self.sample_rate;
        let sweep = SWEEP_DELAY_MS / 1000.0 * self.sample_rate * self.depth;
        let phase_inc = self.rate / self.sample_rate;

        for sample in buffer.iter_mut() {
            let lfo = 0.5 * (1.0 + (self.lfo_phase * std::f32::consts::TAU).sin());
            let delay = base + sweep * lfo;

            let wet_l = self.left.read(delay);
            let wet_r = self.right.read(delay);

            self.left.write(sample.left + wet_l * FEEDBACK);
            self.right.write(sample.right + wet_r * FEEDBACK);

            sample.left = sample.left * (1.0 - self.mix) + wet_l * self.mix;
            sample.right = sample.right * (1.0 - self.mix) + wet_r * self.mix;

            self.lfo_phase += phase_inc;
            if self.lfo_phase >= 1.0 {
                self.lfo_phase -= 1.0;
            }
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.lfo_phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    #[test]
    fn test_flange_output_bounded() {
        let mut node = FlangeNode::new(48_000.0);
        let mut buffer = StereoBuffer::silence(4096);
        for (i, s) in buffer.iter_mut().enumerate() {
            let v = (i as f32 * 0.07).sin();
            *s = StereoSample::new(v, v);
        }
        node.process(&mut buffer);
        assert!(node.lfo_phase >= 0.0 && node.lfo_phase < 1.0);
        assert!(buffer.peak() < 3.0);
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut node = FlangeNode::new(48_000.0);
        let mut buffer = StereoBuffer::silence(512);
        node.process(&mut buffer);
        assert!(buffer.peak() < 1e-6);
    }
}
