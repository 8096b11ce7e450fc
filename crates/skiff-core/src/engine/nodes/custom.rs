//! User-controlled gain node
//!
//! The coefficient lives in an atomic shared between the control thread and
//! the audio thread, so adjustments take effect on the next callback without
//! a round trip through the command queue.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::types::StereoBuffer;

use super::DspNode;

/// Lower bound for the gain coefficient
pub const COEFFICIENT_MIN: f32 = 0.0;
/// Upper bound for the gain coefficient
pub const COEFFICIENT_MAX: f32 = 2.0;
/// Coefficient value a freshly created node starts at
pub const COEFFICIENT_DEFAULT: f32 = 1.0;

/// Control-side handle to the custom node's gain coefficient
///
/// Stores the f32 as its bit pattern in an `AtomicU32`. Relaxed ordering is
/// enough: the audio thread only needs to see some recent value, and a
/// one-buffer lag is inaudible.
#[derive(Clone)]
pub struct CustomCoefficient {
    bits: Arc<AtomicU32>,
}

impl CustomCoefficient {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(COEFFICIENT_DEFAULT.to_bits())),
        }
    }

    /// Set the coefficient, clamped to `[COEFFICIENT_MIN, COEFFICIENT_MAX]`
    pub fn set(&self, value: f32) {
        let clamped = value.clamp(COEFFICIENT_MIN, COEFFICIENT_MAX);
        self.bits.store(clamped.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for CustomCoefficient {
    fn default() -> Self {
        Self::new()
    }
}

/// Audio-side node that scales every sample by the shared coefficient
///
/// The coefficient is read once per buffer; no locks, no allocation.
pub struct CustomFilterNode {
    coefficient: CustomCoefficient,
}

impl CustomFilterNode {
    pub fn new(coefficient: CustomCoefficient) -> Self {
        Self { coefficient }
    }
}

impl DspNode for CustomFilterNode {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn set_param(&mut self, _index: usize, _value: f32) {
        // Controlled through the shared coefficient, not the command queue
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        let gain = self.coefficient.get();
        buffer.scale(gain);
    }

    fn reset(&mut self) {}
}
