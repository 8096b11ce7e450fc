//! Parametric EQ node: a single peaking biquad

use crate::types::{StereoBuffer, StereoSample};

use super::DspNode;

/// Center frequency parameter (Hz)
pub const PARAM_CENTER: usize = 0;
/// Gain parameter (dB)
pub const PARAM_GAIN_DB: usize = 1;
/// Bandwidth parameter (Q)
pub const PARAM_BANDWIDTH: usize = 2;

/// Default center frequency for an enabled EQ slot (Hz)
pub const PARAMEQ_DEFAULT_CENTER: f32 = 5000.0;
/// Default gain for an enabled EQ slot (dB)
pub const PARAMEQ_DEFAULT_GAIN_DB: f32 = 0.0;

const DEFAULT_Q: f32 = 1.0;
const MIN_CENTER: f32 = 20.0;
const MAX_CENTER: f32 = 20_000.0;
const MAX_GAIN_DB: f32 = 24.0;

/// RBJ cookbook peaking-EQ coefficients, normalized by a0
#[derive(Clone, Copy)]
struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl BiquadCoeffs {
    fn peaking(center: f32, gain_db: f32, q: f32, sample_rate: f32) -> Self {
        let a = 10.0_f32.powf(gain_db / 40.0);
        let w0 = std::f32::consts::TAU * center / sample_rate;
        let alpha = w0.sin() / (2.0 * q);

        let a0 = 1.0 + alpha / a;
        Self {
            b0: (1.0 + alpha * a) / a0,
            b1: (-2.0 * w0.cos()) / a0,
            b2: (1.0 - alpha * a) / a0,
            a1: (-2.0 * w0.cos()) / a0,
            a2: (1.0 - alpha / a) / a0,
        }
    }
}

/// Transposed direct form II state, stereo
#[derive(Default)]
struct BiquadState {
    z1: StereoSample,
    z2: StereoSample,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, c: &BiquadCoeffs, input: StereoSample) -> StereoSample {
        let out = input * c.b0 + self.z1;
        self.z1 = input * c.b1 - out * c.a1 + self.z2;
        self.z2 = input * c.b2 - out * c.a2;
        out
    }
}

pub struct ParamEqNode {
    coeffs: BiquadCoeffs,
    state: BiquadState,
    center: f32,
    gain_db: f32,
    q: f32,
    sample_rate: f32,
}

impl ParamEqNode {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            coeffs: BiquadCoeffs::peaking(
                PARAMEQ_DEFAULT_CENTER,
                PARAMEQ_DEFAULT_GAIN_DB,
                DEFAULT_Q,
                sample_rate,
            ),
            state: BiquadState::default(),
            center: PARAMEQ_DEFAULT_CENTER,
            gain_db: PARAMEQ_DEFAULT_GAIN_DB,
            q: DEFAULT_Q,
            sample_rate,
        }
    }

    fn update_coeffs(&mut self) {
        self.coeffs = BiquadCoeffs::peaking(self.center, self.gain_db, self.q, self.sample_rate);
    }
}

impl DspNode for ParamEqNode {
    fn name(&self) -> &'static str {
        "parameq"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            PARAM_CENTER => self.center = value.clamp(MIN_CENTER, MAX_CENTER),
            PARAM_GAIN_DB => self.gain_db = value.clamp(-MAX_GAIN_DB, MAX_GAIN_DB),
            PARAM_BANDWIDTH => self.q = value.clamp(0.1, 10.0),
            _ => return,
        }
        self.update_coeffs();
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        for sample in buffer.iter_mut() {
            *sample = self.state.process(&self.coeffs, *sample);
        }
    }

    fn reset(&mut self) {
        self.state = BiquadState::default();
    }
}
