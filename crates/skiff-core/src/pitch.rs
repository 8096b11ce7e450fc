//! Pitch and tempo state machine
//!
//! Two independent step counters feed one pitch ratio. The ratio recurrence
//! branches on where the previous ratio sat relative to 1.0, so the same
//! counter values can map to different ratios depending on how they were
//! reached; the region enum makes that history explicit.
//!
//! Tempo steps also scale the channel frequency by the inverse semitone so
//! playback speed changes while perceived pitch stays put.

use log::{debug, error};

use crate::chain::PITCH_NODE_ID;
use crate::engine::nodes::pitchshift::PARAM_RATIO;
use crate::engine::EngineControl;

/// Equal-tempered semitone up, 2^(1/12)
pub const SEMITONE_UP: f32 = 1.059;
/// Equal-tempered semitone down, 2^(-1/12)
pub const SEMITONE_DOWN: f32 = 0.9438;

/// Upper safety bound on the pitch ratio
pub const RATIO_MAX: f32 = 1.98;
/// Lower safety bound on the pitch ratio
pub const RATIO_MIN: f32 = 0.52;

/// Where the previous ratio sat relative to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RatioRegion {
    AtUnity,
    AboveUnity,
    BelowUnity,
}

/// Direction of a pitch or tempo step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

impl StepDirection {
    fn delta(self) -> i32 {
        match self {
            StepDirection::Up => 1,
            StepDirection::Down => -1,
        }
    }
}

pub struct PitchTempoController {
    pitch_steps: i32,
    tempo_steps: i32,
    ratio: f32,
    region: RatioRegion,
    /// Channel frequency as a ratio of the stream's native rate
    frequency: f32,
}

impl PitchTempoController {
    pub fn new() -> Self {
        Self {
            pitch_steps: 0,
            tempo_steps: 0,
            ratio: 1.0,
            region: RatioRegion::AtUnity,
            frequency: 1.0,
        }
    }

    pub fn pitch_steps(&self) -> i32 {
        self.pitch_steps
    }

    pub fn tempo_steps(&self) -> i32 {
        self.tempo_steps
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// The ratio the recurrence would produce for a combined step count,
    /// given the current region
    fn candidate_ratio(&self, total: i32, direction: StepDirection) -> f32 {
        let magnitude = total.unsigned_abs();
        match self.region {
            RatioRegion::AtUnity => match direction {
                StepDirection::Up => SEMITONE_UP.powi(magnitude as i32),
                StepDirection::Down => SEMITONE_DOWN.powi(magnitude as i32),
            },
            RatioRegion::AboveUnity => SEMITONE_UP.powi(magnitude as i32),
            RatioRegion::BelowUnity => SEMITONE_DOWN.powi(magnitude as i32),
        }
    }

    fn region_of(ratio: f32) -> RatioRegion {
        if ratio == 1.0 {
            RatioRegion::AtUnity
        } else if ratio > 1.0 {
            RatioRegion::AboveUnity
        } else {
            RatioRegion::BelowUnity
        }
    }

    /// Run one step of the recurrence, returning the new ratio or `None`
    /// when the step would leave the safety bounds. Counters only move on
    /// `Some`.
    fn step(&mut self, counter_is_pitch: bool, direction: StepDirection) -> Option<f32> {
        let delta = direction.delta();
        let (pitch, tempo) = if counter_is_pitch {
            (self.pitch_steps + delta, self.tempo_steps)
        } else {
            (self.pitch_steps, self.tempo_steps + delta)
        };

        let candidate = self.candidate_ratio(pitch + tempo, direction);
        let out_of_bounds = match direction {
            StepDirection::Up => candidate > RATIO_MAX,
            StepDirection::Down => candidate < RATIO_MIN,
        };
        if out_of_bounds {
            debug!(
                "pitch step rejected: ratio {:.4} outside [{}, {}]",
                candidate, RATIO_MIN, RATIO_MAX
            );
            return None;
        }

        self.pitch_steps = pitch;
        self.tempo_steps = tempo;
        self.ratio = candidate;
        self.region = Self::region_of(candidate);
        Some(candidate)
    }

    /// Push the current ratio to the pitch-shift node. The node has to be
    /// evicted and reinserted for the engine to pick up the fresh value.
    fn reapply_node<E: EngineControl>(&self, engine: &mut E) {
        if let Err(err) = engine.detach_node(PITCH_NODE_ID) {
            error!("failed to detach pitch node: {}", err);
        }
        if let Err(err) = engine.attach_node(PITCH_NODE_ID, 0) {
            error!("failed to attach pitch node: {}", err);
        }
        if let Err(err) = engine.set_node_param(PITCH_NODE_ID, PARAM_RATIO, self.ratio) {
            error!("failed to set pitch ratio: {}", err);
        }
    }

    /// Apply a manual pitch step. No engine call happens when the step is
    /// rejected at the bounds; engine failures are logged and the counters
    /// stay where the step put them.
    pub fn apply_pitch_step<E: EngineControl>(&mut self, engine: &mut E, direction: StepDirection) {
        if self.step(true, direction).is_none() {
            return;
        }
        self.reapply_node(engine);
    }

    /// Apply a tempo step: same ratio recurrence as a pitch step, plus a
    /// compensating channel-frequency change in the opposite direction.
    pub fn apply_tempo_step<E: EngineControl>(&mut self, engine: &mut E, direction: StepDirection) {
        if self.step(false, direction).is_none() {
            return;
        }

        let compensation = match direction {
            StepDirection::Up => 2f32.powf(-1.0 / 12.0),
            StepDirection::Down => 2f32.powf(1.0 / 12.0),
        };
        self.frequency *= compensation;
        if let Err(err) = engine.set_frequency(self.frequency) {
            error!("failed to set channel frequency: {}", err);
        }

        self.reapply_node(engine);
    }
}

impl Default for PitchTempoController {
    fn default() -> Self {
        Self::new()
    }
}
