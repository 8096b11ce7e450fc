//! Soft-clip distortion node

use crate::types::StereoBuffer;

use super::DspNode;

/// Distortion level parameter (0..1)
pub const PARAM_LEVEL: usize = 0;

/// Default level for an enabled distortion slot
pub const DISTORTION_DEFAULT_LEVEL: f32 = 0.8;

pub struct DistortionNode {
    level: f32,
}

impl DistortionNode {
    pub fn new() -> Self {
        Self {
            level: DISTORTION_DEFAULT_LEVEL,
        }
    }

    /// Drive gain derived from the level setting
    #[inline]
    fn drive(&self) -> f32 {
        1.0 + self.level * 9.0
    }
}

impl Default for DistortionNode {
    fn default() -> Self {
        Self::new()
    }
}

impl DspNode for DistortionNode {
    fn name(&self) -> &'static str {
        "distortion"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == PARAM_LEVEL {
            self.level = value.clamp(0.0, 1.0);
        }
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        let drive = self.drive();
        // Normalize so full-scale input stays near full scale
        let norm = 1.0 / (drive).tanh();

        for sample in buffer.iter_mut() {
            sample.left = (sample.left * drive).tanh() * norm;
            sample.right = (sample.right * drive).tanh() * norm;
        }
    }

    fn reset(&mut self) {}
}
