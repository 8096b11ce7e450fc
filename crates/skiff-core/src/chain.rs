//! Effect chain: toggleable filter slots on the music channel
//!
//! One slot per filter kind. Every slot's engine-side node is created once,
//! when the music stream loads, and stays registered for the stream's
//! lifetime; toggling only attaches or detaches it. The `enabled` flag flips
//! unconditionally, so a failed engine call leaves the flag and the graph
//! out of step until the next toggle rather than retrying.

use log::error;

use crate::engine::nodes::custom::{CustomCoefficient, CustomFilterNode};
use crate::engine::nodes::{
    chorus::ChorusNode,
    distortion::{self, DistortionNode},
    echo::{self, EchoNode},
    filter::{self, HighpassNode, LowpassNode},
    flange::FlangeNode,
    parameq::{self, ParamEqNode},
    NodeId,
};
use crate::engine::EngineControl;

/// The filter kinds the chain can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Echo,
    Flange,
    Distortion,
    Chorus,
    ParamEq,
    Custom,
}

impl FilterKind {
    pub const ALL: [FilterKind; 8] = [
        FilterKind::Lowpass,
        FilterKind::Highpass,
        FilterKind::Echo,
        FilterKind::Flange,
        FilterKind::Distortion,
        FilterKind::Chorus,
        FilterKind::ParamEq,
        FilterKind::Custom,
    ];

    fn index(self) -> usize {
        match self {
            FilterKind::Lowpass => 0,
            FilterKind::Highpass => 1,
            FilterKind::Echo => 2,
            FilterKind::Flange => 3,
            FilterKind::Distortion => 4,
            FilterKind::Chorus => 5,
            FilterKind::ParamEq => 6,
            FilterKind::Custom => 7,
        }
    }
}

/// Node id reserved for the pitch-shift node; filter slots start above it
pub const PITCH_NODE_ID: NodeId = NodeId(0);

fn node_id(kind: FilterKind) -> NodeId {
    NodeId(kind.index() as u32 + 1)
}

struct FilterSlot {
    kind: FilterKind,
    enabled: bool,
    id: NodeId,
}

pub struct EffectChain {
    slots: [FilterSlot; 8],
    coefficient: CustomCoefficient,
}

impl EffectChain {
    /// Create every slot's engine-side node. Called once per loaded stream.
    pub fn new<E: EngineControl>(engine: &mut E, sample_rate: u32) -> Self {
        let coefficient = CustomCoefficient::new();
        let rate = sample_rate as f32;

        for kind in FilterKind::ALL {
            let node: Box<dyn crate::engine::DspNode> = match kind {
                FilterKind::Lowpass => Box::new(LowpassNode::new(rate)),
                FilterKind::Highpass => Box::new(HighpassNode::new(rate)),
                FilterKind::Echo => Box::new(EchoNode::new(rate)),
                FilterKind::Flange => Box::new(FlangeNode::new(rate)),
                FilterKind::Distortion => Box::new(DistortionNode::new()),
                FilterKind::Chorus => Box::new(ChorusNode::new(rate)),
                FilterKind::ParamEq => Box::new(ParamEqNode::new(rate)),
                FilterKind::Custom => Box::new(CustomFilterNode::new(coefficient.clone())),
            };
            if let Err(err) = engine.create_node(node_id(kind), node) {
                error!("failed to create {:?} node: {}", kind, err);
            }
        }

        let slots = FilterKind::ALL.map(|kind| FilterSlot {
            kind,
            enabled: false,
            id: node_id(kind),
        });

        Self { slots, coefficient }
    }

    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        self.slots[kind.index()].enabled
    }

    /// Flip a slot's enabled state, attaching at the head of the chain or
    /// detaching accordingly. The flag flips even when an engine call fails.
    pub fn toggle<E: EngineControl>(&mut self, engine: &mut E, kind: FilterKind) {
        let slot = &mut self.slots[kind.index()];
        slot.enabled = !slot.enabled;
        let id = slot.id;

        if slot.enabled {
            if let Err(err) = engine.attach_node(id, 0) {
                error!("failed to attach {:?}: {}", kind, err);
            }
            Self::apply_defaults(engine, kind, id);
        } else if let Err(err) = engine.detach_node(id) {
            error!("failed to detach {:?}: {}", kind, err);
        }
    }

    /// Parameter values a slot gets each time it is enabled
    fn apply_defaults<E: EngineControl>(engine: &mut E, kind: FilterKind, id: NodeId) {
        let params: &[(usize, f32)] = match kind {
            FilterKind::Lowpass => &[(filter::PARAM_CUTOFF, filter::LOWPASS_DEFAULT_CUTOFF)],
            FilterKind::Highpass => &[(filter::PARAM_CUTOFF, filter::HIGHPASS_DEFAULT_CUTOFF)],
            FilterKind::Echo => &[(echo::PARAM_DELAY_MS, echo::ECHO_DEFAULT_DELAY_MS)],
            FilterKind::Distortion => {
                &[(distortion::PARAM_LEVEL, distortion::DISTORTION_DEFAULT_LEVEL)]
            }
            FilterKind::ParamEq => &[
                (parameq::PARAM_CENTER, parameq::PARAMEQ_DEFAULT_CENTER),
                (parameq::PARAM_GAIN_DB, parameq::PARAMEQ_DEFAULT_GAIN_DB),
            ],
            FilterKind::Flange | FilterKind::Chorus | FilterKind::Custom => &[],
        };

        for &(index, value) in params {
            if let Err(err) = engine.set_node_param(id, index, value) {
                error!("failed to set {:?} param {}: {}", kind, index, err);
            }
        }
    }

    /// Set the custom filter's gain coefficient, clamped to `[0.0, 2.0]`.
    /// Takes effect on the next audio buffer without an engine call.
    pub fn set_custom_coefficient(&self, value: f32) {
        self.coefficient.set(value);
    }

    pub fn custom_coefficient(&self) -> f32 {
        self.coefficient.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingEngine;

    fn chain_with_engine() -> (EffectChain, RecordingEngine) {
        let mut engine = RecordingEngine::new();
        let chain = EffectChain::new(&mut engine, 48_000);
        (chain, engine)
    }

    #[test]
    fn test_all_nodes_created_up_front() {
        let (_chain, engine) = chain_with_engine();
        assert_eq!(engine.created_nodes(), 8);
    }

    #[test]
    fn test_toggle_on_attaches_at_head() {
        let (mut chain, mut engine) = chain_with_engine();
        chain.toggle(&mut engine, FilterKind::Lowpass);

        assert!(chain.is_enabled(FilterKind::Lowpass));
        assert_eq!(engine.attach_count(node_id(FilterKind::Lowpass)), 1);
        assert_eq!(engine.last_attach_position(), Some(0));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let (mut chain, mut engine) = chain_with_engine();
        chain.toggle(&mut engine, FilterKind::Echo);
        chain.toggle(&mut engine, FilterKind::Echo);

        assert!(!chain.is_enabled(FilterKind::Echo));
        let id = node_id(FilterKind::Echo);
        assert_eq!(engine.attach_count(id), 1);
        assert_eq!(engine.detach_count(id), 1);
    }

    #[test]
    fn test_net_attach_matches_toggle_parity() {
        let (mut chain, mut engine) = chain_with_engine();
        let id = node_id(FilterKind::Flange);

        for _ in 0..5 {
            chain.toggle(&mut engine, FilterKind::Flange);
        }
        assert_eq!(
            engine.attach_count(id) as i32 - engine.detach_count(id) as i32,
            1
        );

        chain.toggle(&mut engine, FilterKind::Flange);
        assert_eq!(
            engine.attach_count(id) as i32 - engine.detach_count(id) as i32,
            0
        );
    }

    #[test]
    fn test_enable_applies_default_params() {
        let (mut chain, mut engine) = chain_with_engine();
        chain.toggle(&mut engine, FilterKind::Distortion);

        let id = node_id(FilterKind::Distortion);
        assert_eq!(
            engine.params_for(id),
            vec![(distortion::PARAM_LEVEL, 0.8)]
        );
    }

    #[test]
    fn test_custom_coefficient_clamped() {
        let (chain, _engine) = chain_with_engine();
        chain.set_custom_coefficient(2.5);
        assert_eq!(chain.custom_coefficient(), 2.0);
        chain.set_custom_coefficient(-1.0);
        assert_eq!(chain.custom_coefficient(), 0.0);
    }

    #[test]
    fn test_failed_attach_still_flips_flag() {
        let (mut chain, mut engine) = chain_with_engine();
        engine.fail_calls(true);
        chain.toggle(&mut engine, FilterKind::Chorus);
        assert!(chain.is_enabled(FilterKind::Chorus));

        // Next toggle issues the detach the failure never earned, which the
        // engine rejects; the flag still flips back
        engine.fail_calls(false);
        chain.toggle(&mut engine, FilterKind::Chorus);
        assert!(!chain.is_enabled(FilterKind::Chorus));
    }
}
