//! Pitch-shift node via signalsmith-stretch
//!
//! Transposes audio by a frequency ratio while preserving duration. Paired
//! with a channel frequency change in the opposite direction, the net effect
//! is a tempo change without pitch movement.

use signalsmith_stretch::Stretch;

use crate::types::{StereoBuffer, StereoSample};

use super::DspNode;

/// Pitch ratio parameter (1.0 = unchanged)
pub const PARAM_RATIO: usize = 0;

/// Number of channels (stereo)
const CHANNELS: u32 = 2;

const MIN_RATIO: f32 = 0.25;
const MAX_RATIO: f32 = 4.0;

pub struct PitchShiftNode {
    stretcher: Stretch,
    ratio: f32,
    /// Scratch copy of the input so processing can run in place
    scratch: Vec<StereoSample>,
}

impl PitchShiftNode {
    pub fn new(sample_rate: u32, max_block: usize) -> Self {
        let mut stretcher = Stretch::preset_default(CHANNELS, sample_rate);
        stretcher.set_transpose_factor(1.0, None);

        Self {
            stretcher,
            ratio: 1.0,
            scratch: vec![StereoSample::silence(); max_block],
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }
}

impl DspNode for PitchShiftNode {
    fn name(&self) -> &'static str {
        "pitchshift"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == PARAM_RATIO {
            self.ratio = value.clamp(MIN_RATIO, MAX_RATIO);
            self.stretcher.set_transpose_factor(self.ratio, None);
        }
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        let len = buffer.len();
        if len == 0 {
            return;
        }
        debug_assert!(len <= self.scratch.len());

        self.scratch[..len].copy_from_slice(buffer.as_slice());
        let input = bytemuck::cast_slice::<StereoSample, f32>(&self.scratch[..len]);

        let output = buffer.as_interleaved_mut();
        output[..len * 2].fill(0.0);

        self.stretcher.process(input, &mut output[..len * 2]);
    }

    fn reset(&mut self) {
        self.stretcher.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_clamped() {
        let mut node = PitchShiftNode::new(48_000, 512);
        node.set_param(PARAM_RATIO, 10.0);
        assert_eq!(node.ratio(), MAX_RATIO);
        node.set_param(PARAM_RATIO, 0.0);
        assert_eq!(node.ratio(), MIN_RATIO);
    }

    #[test]
    fn test_process_preserves_length() {
        let mut node = PitchShiftNode::new(48_000, 512);
        node.set_param(PARAM_RATIO, 1.059);

        let mut buffer = StereoBuffer::silence(512);
        node.process(&mut buffer);
        assert_eq!(buffer.len(), 512);
    }
}
