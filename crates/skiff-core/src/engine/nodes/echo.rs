//! Feedback echo node

use crate::types::{StereoBuffer, StereoSample};

use super::DspNode;

/// Delay time parameter (milliseconds)
pub const PARAM_DELAY_MS: usize = 0;
/// Feedback amount parameter (0..1)
pub const PARAM_FEEDBACK: usize = 1;
/// Wet mix parameter (0..1)
pub const PARAM_WET: usize = 2;

/// Default delay for an enabled echo slot (ms)
pub const ECHO_DEFAULT_DELAY_MS: f32 = 50.0;

const MAX_DELAY_MS: f32 = 2000.0;
const DEFAULT_FEEDBACK: f32 = 0.5;
const DEFAULT_WET: f32 = 0.5;

/// Ring buffer delay line, preallocated at construction
struct DelayLine {
    buffer: Vec<StereoSample>,
    write_pos: usize,
}

impl DelayLine {
    fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![StereoSample::silence(); max_samples.max(1)],
            write_pos: 0,
        }
    }

    #[inline]
    fn read(&self, delay_samples: usize) -> StereoSample {
        let delay = delay_samples.min(self.buffer.len() - 1);
        let pos = (self.write_pos + self.buffer.len() - delay) % self.buffer.len();
        self.buffer[pos]
    }

    #[inline]
    fn write(&mut self, sample: StereoSample) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    fn clear(&mut self) {
        self.buffer.fill(StereoSample::silence());
        self.write_pos = 0;
    }
}

pub struct EchoNode {
    delay_line: DelayLine,
    delay_samples: usize,
    feedback: f32,
    wet: f32,
    sample_rate: f32,
}

impl EchoNode {
    pub fn new(sample_rate: f32) -> Self {
        let max_samples = (MAX_DELAY_MS / 1000.0 * sample_rate) as usize;
        let mut node = Self {
            delay_line: DelayLine::new(max_samples),
            delay_samples: 0,
            feedback: DEFAULT_FEEDBACK,
            wet: DEFAULT_WET,
            sample_rate,
        };
        node.set_delay_ms(ECHO_DEFAULT_DELAY_MS);
        node
    }

    fn set_delay_ms(&mut self, ms: f32) {
        let ms = ms.clamp(1.0, MAX_DELAY_MS);
        self.delay_samples = (ms / 1000.0 * self.sample_rate) as usize;
    }
}

impl DspNode for EchoNode {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            PARAM_DELAY_MS => self.set_delay_ms(value),
            PARAM_FEEDBACK => self.feedback = value.clamp(0.0, 0.95),
            PARAM_WET => self.wet = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        for sample in buffer.iter_mut() {
            let delayed = self.delay_line.read(self.delay_samples);
            self.delay_line.write(*sample + delayed * self.feedback);
            *sample = *sample * (1.0 - self.wet) + delayed * self.wet;
        }
    }

    fn reset(&mut self) {
        self.delay_line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_repeats_impulse() {
        let sample_rate = 1000.0;
        let mut node = EchoNode::new(sample_rate);
        node.set_param(PARAM_DELAY_MS, 10.0); // 10 samples
        node.set_param(PARAM_WET, 0.5);

        let mut buffer = StereoBuffer::silence(32);
        buffer[0] = StereoSample::new(1.0, 1.0);
        node.process(&mut buffer);

        // Dry impulse at 0, first echo at 10
        assert!(buffer[0].left > 0.4);
        assert!(buffer[10].left > 0.4);
        assert!(buffer[5].left.abs() < 1e-6);
    }

    #[test]
    fn test_feedback_clamped_below_unity() {
        let mut node = EchoNode::new(48_000.0);
        node.set_param(PARAM_FEEDBACK, 1.5);
        assert!(node.feedback <= 0.95);
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut node = EchoNode::new(1000.0);
        node.set_param(PARAM_DELAY_MS, 5.0);

        let mut buffer = StereoBuffer::silence(8);
        buffer[0] = StereoSample::new(1.0, 1.0);
        node.process(&mut buffer);

        node.reset();
        let mut silent = StereoBuffer::silence(16);
        node.process(&mut silent);
        assert!(silent.peak() < 1e-6);
    }
}
