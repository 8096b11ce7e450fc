//! Chorus node
//!
//! Longer modulated delay than the flanger, no feedback, with the left and
//! right LFOs offset in phase for stereo width.

use crate::types::StereoBuffer;

use super::DspNode;

/// LFO rate parameter (Hz)
pub const PARAM_RATE: usize = 0;
/// Modulation depth parameter (0..1)
pub const PARAM_DEPTH: usize = 1;
/// Wet mix parameter (0..1)
pub const PARAM_MIX: usize = 2;

const BASE_DELAY_MS: f32 = 15.0;
const SWEEP_DELAY_MS: f32 = 10.0;
const DEFAULT_RATE: f32 = 0.8;
const DEFAULT_DEPTH: f32 = 0.5;
const DEFAULT_MIX: f32 = 0.5;
const RIGHT_PHASE_OFFSET: f32 = 0.25;

struct ChorusChannel {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl ChorusChannel {
    fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(2)],
            write_pos: 0,
        }
    }

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

pub struct ChorusNode {
    left: ChorusChannel,
    right: ChorusChannel,
    lfo_phase: f32,
    rate: f32,
    depth: f32,
    mix: f32,
    sample_rate: f32,
}

impl ChorusNode {
    pub fn new(sample_rate: f32) -> Self {
        let max_samples =
            ((BASE_DELAY_MS + SWEEP_DELAY_MS) / 1000.0 * sample_rate) as usize + 2;
        Self {
            left: ChorusChannel::new(max_samples),
            right: ChorusChannel::new(max_samples),
            lfo_phase: 0.0,
            rate: DEFAULT_RATE,
            depth: DEFAULT_DEPTH,
            mix: DEFAULT_MIX,
            sample_rate,
        }
    }
}

impl DspNode for ChorusNode {
    fn name(&self) -> &'static str {
        "chorus"
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
            let lfo_l = 0.5 * (1.0 + (self.lfo_phase * std::f32::consts::TAU).sin());
            let phase_r = self.lfo_phase + RIGHT_PHASE_OFFSET;
            let lfo_r = 0.5 * (1.0 + (phase_r * std::f32::consts::TAU).sin());

            let wet_l = self.left.read(base + sweep * lfo_l);
            let wet_r = self.right.read(base + sweep * lfo_r);

            self.left.write(sample.left);
            self.right.write(sample.right);

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
