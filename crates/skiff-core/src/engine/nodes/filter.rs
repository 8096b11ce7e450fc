//! Lowpass and highpass filter nodes
//!
//! Both are views onto the same two-pole state-variable filter core; the
//! lowpass node takes the low output, the highpass node the high output.

use crate::types::StereoBuffer;

use super::DspNode;

/// Cutoff frequency parameter (Hz)
pub const PARAM_CUTOFF: usize = 0;
/// Resonance parameter (Q)
pub const PARAM_RESONANCE: usize = 1;

/// Default cutoff for an enabled lowpass slot (Hz)
pub const LOWPASS_DEFAULT_CUTOFF: f32 = 700.0;
/// Default cutoff for an enabled highpass slot (Hz)
pub const HIGHPASS_DEFAULT_CUTOFF: f32 = 5000.0;

const MIN_CUTOFF: f32 = 20.0;
const MAX_CUTOFF: f32 = 20_000.0;
const DEFAULT_Q: f32 = 0.707;

/// Two-pole (12dB/octave) state-variable filter
struct SvfCore {
    // State per channel
    ic1eq_l: f32,
    ic2eq_l: f32,
    ic1eq_r: f32,
    ic2eq_r: f32,
    // Coefficients
    g: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
}

impl SvfCore {
    fn new(cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let mut f = Self {
            ic1eq_l: 0.0,
            ic2eq_l: 0.0,
            ic1eq_r: 0.0,
            ic2eq_r: 0.0,
            g: 0.0,
            k: 0.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
        };
        f.set_params(cutoff, q, sample_rate);
        f
    }

    fn set_params(&mut self, cutoff: f32, q: f32, sample_rate: f32) {
        let cutoff = cutoff.clamp(MIN_CUTOFF, MAX_CUTOFF);
        let q = q.clamp(0.1, 10.0);

        self.g = (std::f32::consts::PI * cutoff / sample_rate).tan();
        self.k = 1.0 / q;
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
        self.a2 = self.g * self.a1;
        self.a3 = self.g * self.a2;
    }

    /// Process one frame and return ((low_l, low_r), (high_l, high_r))
    #[inline]
    fn process(&mut self, left: f32, right: f32) -> ((f32, f32), (f32, f32)) {
        let v3_l = left - self.ic2eq_l;
        let v1_l = self.a1 * self.ic1eq_l + self.a2 * v3_l;
        let v2_l = self.ic2eq_l + self.a2 * self.ic1eq_l + self.a3 * v3_l;
        self.ic1eq_l = 2.0 * v1_l - self.ic1eq_l;
        self.ic2eq_l = 2.0 * v2_l - self.ic2eq_l;

        let low_l = v2_l;
        let high_l = left - self.k * v1_l - low_l;

        let v3_r = right - self.ic2eq_r;
        let v1_r = self.a1 * self.ic1eq_r + self.a2 * v3_r;
        let v2_r = self.ic2eq_r + self.a2 * self.ic1eq_r + self.a3 * v3_r;
        self.ic1eq_r = 2.0 * v1_r - self.ic1eq_r;
        self.ic2eq_r = 2.0 * v2_r - self.ic2eq_r;

        let low_r = v2_r;
        let high_r = right - self.k * v1_r - low_r;

        ((low_l, low_r), (high_l, high_r))
    }

    fn reset(&mut self) {
        self.ic1eq_l = 0.0;
        self.ic2eq_l = 0.0;
        self.ic1eq_r = 0.0;
        self.ic2eq_r = 0.0;
    }
}

/// Which filter output a node takes
enum FilterMode {
    Lowpass,
    Highpass,
}

struct FilterNode {
    core: SvfCore,
    mode: FilterMode,
    cutoff: f32,
    q: f32,
    sample_rate: f32,
}

impl FilterNode {
    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            PARAM_CUTOFF => self.cutoff = value.clamp(MIN_CUTOFF, MAX_CUTOFF),
            PARAM_RESONANCE => self.q = value.clamp(0.1, 10.0),
            _ => return,
        }
        self.core.set_params(self.cutoff, self.q, self.sample_rate);
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        for sample in buffer.iter_mut() {
            let (low, high) = self.core.process(sample.left, sample.right);
            let (out_l, out_r) = match self.mode {
                FilterMode::Lowpass => low,
                FilterMode::Highpass => high,
            };
            sample.left = out_l;
            sample.right = out_r;
        }
    }
}

/// Lowpass filter node (default cutoff 700 Hz when enabled)
pub struct LowpassNode {
    inner: FilterNode,
}

impl LowpassNode {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            inner: FilterNode {
                core: SvfCore::new(LOWPASS_DEFAULT_CUTOFF, DEFAULT_Q, sample_rate),
                mode: FilterMode::Lowpass,
                cutoff: LOWPASS_DEFAULT_CUTOFF,
                q: DEFAULT_Q,
                sample_rate,
            },
        }
    }
}

impl DspNode for LowpassNode {
    fn name(&self) -> &'static str {
        "lowpass"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.inner.set_param(index, value);
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        self.inner.process(buffer);
    }

    fn reset(&mut self) {
        self.inner.core.reset();
    }
}

/// Highpass filter node (default cutoff 5 kHz when enabled)
pub struct HighpassNode {
    inner: FilterNode,
}

impl HighpassNode {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            inner: FilterNode {
                core: SvfCore::new(HIGHPASS_DEFAULT_CUTOFF, DEFAULT_Q, sample_rate),
                mode: FilterMode::Highpass,
                cutoff: HIGHPASS_DEFAULT_CUTOFF,
                q: DEFAULT_Q,
                sample_rate,
            },
        }
    }
}

impl DspNode for HighpassNode {
    fn name(&self) -> &'static str {
        "highpass"
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.inner.set_param(index, value);
    }

    fn process(&mut self, buffer: &mut StereoBuffer) {
        self.inner.process(buffer);
    }

    fn reset(&mut self) {
        self.inner.core.reset();
    }
}
