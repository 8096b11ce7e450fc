//! DSP nodes attachable to the music channel's processing graph
//!
//! One file per filter kind, mirroring the built-in node types the control
//! layer toggles: lowpass/highpass, echo, flange, chorus, distortion,
//! parametric EQ, pitch shift, and the user-defined custom filter.

pub mod chorus;
pub mod custom;
pub mod distortion;
pub mod echo;
pub mod filter;
pub mod flange;
pub mod parameq;
pub mod pitchshift;

use crate::types::StereoBuffer;

/// Opaque handle to an engine-side DSP node
///
/// Created once when the music stream loads and valid for the stream's
/// lifetime; the control layer only ever refers to nodes by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A unit of per-sample audio transformation
///
/// Nodes live on the audio thread once created; parameter changes arrive
/// through the engine command queue and are applied at buffer boundaries.
/// `process` runs inside the output callback and must not allocate or block.
pub trait DspNode: Send {
    /// Node name for logging
    fn name(&self) -> &'static str;

    /// Set a parameter by index (indices are per-node constants)
    ///
    /// Out-of-range indices and values are ignored or clamped; a parameter
    /// set never fails.
    fn set_param(&mut self, index: usize, value: f32);

    /// Process a stereo buffer in-place
    fn process(&mut self, buffer: &mut StereoBuffer);

    /// Clear internal state (delay lines, filter history)
    fn reset(&mut self);
}
