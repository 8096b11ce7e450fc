//! Recording engine fake for control-layer tests
//!
//! Stands in for the real command-queue handle. Unlike the real engine,
//! which reports invalid graph edits asynchronously, the fake rejects them
//! synchronously so tests catch bookkeeping drift at the call site.

use std::collections::HashMap;
use std::sync::Arc;

use crate::audio_file::MusicStream;
use crate::chain::PITCH_NODE_ID;
use crate::engine::channel::SpeakerMode;
use crate::engine::nodes::{DspNode, NodeId};
use crate::engine::EngineControl;
use crate::error::{EngineError, EngineResult};
use crate::types::{ListenerPose, StereoBuffer};

#[derive(Default)]
struct NodeRecord {
    attached: bool,
    attaches: u32,
    detaches: u32,
    params: Vec<(usize, f32)>,
}

#[derive(Default)]
pub struct RecordingEngine {
    nodes: HashMap<NodeId, NodeRecord>,
    last_attach_position: Option<usize>,
    frequency_calls: Vec<f32>,
    volume_calls: Vec<f32>,
    pan_calls: Vec<f32>,
    speaker_calls: Vec<SpeakerMode>,
    pause_calls: Vec<bool>,
    play_count: u32,
    load_count: u32,
    listener_count: u32,
    event_count: u32,
    pump_count: u32,
    fail: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every engine call returns `CallFailed` without recording
    pub fn fail_calls(&mut self, fail: bool) {
        self.fail = fail;
    }

    fn check_fail(&self, operation: &'static str) -> EngineResult<()> {
        if self.fail {
            Err(EngineError::CallFailed {
                operation,
                reason: "injected failure".into(),
            })
        } else {
            Ok(())
        }
    }

    /// Create and attach the pitch node, the way playback startup does
    pub fn install_pitch_node(&mut self) {
        self.nodes.insert(
            PITCH_NODE_ID,
            NodeRecord {
                attached: true,
                attaches: 1,
                ..Default::default()
            },
        );
    }

    pub fn created_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn attach_count(&self, id: NodeId) -> u32 {
        self.nodes.get(&id).map_or(0, |n| n.attaches)
    }

    pub fn detach_count(&self, id: NodeId) -> u32 {
        self.nodes.get(&id).map_or(0, |n| n.detaches)
    }

    pub fn last_attach_position(&self) -> Option<usize> {
        self.last_attach_position
    }

    pub fn params_for(&self, id: NodeId) -> Vec<(usize, f32)> {
        self.nodes.get(&id).map_or_else(Vec::new, |n| n.params.clone())
    }

    pub fn frequency_calls(&self) -> Vec<f32> {
        self.frequency_calls.clone()
    }

    pub fn volume_calls(&self) -> Vec<f32> {
        self.volume_calls.clone()
    }

    pub fn pan_calls(&self) -> Vec<f32> {
        self.pan_calls.clone()
    }

    pub fn speaker_calls(&self) -> Vec<SpeakerMode> {
        self.speaker_calls.clone()
    }

    pub fn pause_calls(&self) -> Vec<bool> {
        self.pause_calls.clone()
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn load_count(&self) -> u32 {
        self.load_count
    }

    pub fn listener_count(&self) -> u32 {
        self.listener_count
    }

    pub fn event_count(&self) -> u32 {
        self.event_count
    }

    pub fn pump_count(&self) -> u32 {
        self.pump_count
    }
}

impl EngineControl for RecordingEngine {
    fn load_stream(&mut self, _stream: MusicStream) -> EngineResult<()> {
        self.check_fail("load_stream")?;
        self.load_count += 1;
        Ok(())
    }

    fn play(&mut self) -> EngineResult<()> {
        self.check_fail("play")?;
        self.play_count += 1;
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> EngineResult<()> {
        self.check_fail("set_paused")?;
        self.pause_calls.push(paused);
        Ok(())
    }

    fn set_frequency(&mut self, frequency: f32) -> EngineResult<()> {
        self.check_fail("set_frequency")?;
        self.frequency_calls.push(frequency);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> EngineResult<()> {
        self.check_fail("set_volume")?;
        self.volume_calls.push(volume);
        Ok(())
    }

    fn set_pan(&mut self, pan: f32) -> EngineResult<()> {
        self.check_fail("set_pan")?;
        self.pan_calls.push(pan);
        Ok(())
    }

    fn set_speaker_mode(&mut self, mode: SpeakerMode) -> EngineResult<()> {
        self.check_fail("set_speaker_mode")?;
        self.speaker_calls.push(mode);
        Ok(())
    }

    fn create_node(&mut self, id: NodeId, _node: Box<dyn DspNode>) -> EngineResult<()> {
        self.check_fail("create_node")?;
        self.nodes.insert(id, NodeRecord::default());
        Ok(())
    }

    fn attach_node(&mut self, id: NodeId, position: usize) -> EngineResult<()> {
        self.check_fail("attach_node")?;
        let record = self.nodes.get_mut(&id).ok_or(EngineError::CallFailed {
            operation: "attach_node",
            reason: "unknown node".into(),
        })?;
        if record.attached {
            return Err(EngineError::CallFailed {
                operation: "attach_node",
                reason: "already attached".into(),
            });
        }
        record.attached = true;
        record.attaches += 1;
        self.last_attach_position = Some(position);
        Ok(())
    }

    fn detach_node(&mut self, id: NodeId) -> EngineResult<()> {
        self.check_fail("detach_node")?;
        let record = self.nodes.get_mut(&id).ok_or(EngineError::CallFailed {
            operation: "detach_node",
            reason: "unknown node".into(),
        })?;
        if !record.attached {
            return Err(EngineError::CallFailed {
                operation: "detach_node",
                reason: "not attached".into(),
            });
        }
        record.attached = false;
        record.detaches += 1;
        Ok(())
    }

    fn set_node_param(&mut self, id: NodeId, index: usize, value: f32) -> EngineResult<()> {
        self.check_fail("set_node_param")?;
        let record = self.nodes.get_mut(&id).ok_or(EngineError::CallFailed {
            operation: "set_node_param",
            reason: "unknown node".into(),
        })?;
        record.params.push((index, value));
        Ok(())
    }

    fn set_listener(&mut self, _pose: &ListenerPose) -> EngineResult<()> {
        self.check_fail("set_listener")?;
        self.listener_count += 1;
        Ok(())
    }

    fn play_event(&mut self, _samples: Arc<StereoBuffer>, _position: [f32; 3]) -> EngineResult<()> {
        self.check_fail("play_event")?;
        self.event_count += 1;
        Ok(())
    }

    fn pump(&mut self) {
        self.pump_count += 1;
    }
}
