//! Control-thread view of the engine
//!
//! `EngineControl` is the seam between the game-facing control layer and the
//! audio thread. The real implementation, `EngineHandle`, turns every call
//! into a queued command; tests substitute a recording fake.

use std::sync::Arc;

use log::warn;
use rtrb::{Consumer, Producer};

use crate::audio_file::MusicStream;
use crate::error::{EngineError, EngineResult};
use crate::types::{ListenerPose, StereoBuffer};

use super::channel::SpeakerMode;
use super::command::EngineCommand;
use super::engine::EngineReport;
use super::event::EventSound;
use super::nodes::{DspNode, NodeId};

/// Operations the control layer needs from the audio engine
pub trait EngineControl {
    fn load_stream(&mut self, stream: MusicStream) -> EngineResult<()>;
    fn play(&mut self) -> EngineResult<()>;
    fn set_paused(&mut self, paused: bool) -> EngineResult<()>;
    fn set_frequency(&mut self, frequency: f32) -> EngineResult<()>;
    fn set_volume(&mut self, volume: f32) -> EngineResult<()>;
    fn set_pan(&mut self, pan: f32) -> EngineResult<()>;
    fn set_speaker_mode(&mut self, mode: SpeakerMode) -> EngineResult<()>;
    fn create_node(&mut self, id: NodeId, node: Box<dyn DspNode>) -> EngineResult<()>;
    fn attach_node(&mut self, id: NodeId, position: usize) -> EngineResult<()>;
    fn detach_node(&mut self, id: NodeId) -> EngineResult<()>;
    fn set_node_param(&mut self, id: NodeId, index: usize, value: f32) -> EngineResult<()>;
    fn set_listener(&mut self, pose: &ListenerPose) -> EngineResult<()>;
    fn play_event(&mut self, samples: Arc<StereoBuffer>, position: [f32; 3]) -> EngineResult<()>;

    /// Drain asynchronous feedback from the audio thread; call once per
    /// game frame
    fn pump(&mut self);
}

/// Command-queue-backed engine handle
pub struct EngineHandle {
    commands: Producer<EngineCommand>,
    reports: Consumer<EngineReport>,
    sample_rate: u32,
}

impl EngineHandle {
    pub fn new(
        commands: Producer<EngineCommand>,
        reports: Consumer<EngineReport>,
        sample_rate: u32,
    ) -> Self {
        Self {
            commands,
            reports,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn send(&mut self, operation: &'static str, command: EngineCommand) -> EngineResult<()> {
        self.commands.push(command).map_err(|_| EngineError::CallFailed {
            operation,
            reason: "command queue full".into(),
        })
    }
}

impl EngineControl for EngineHandle {
    fn load_stream(&mut self, stream: MusicStream) -> EngineResult<()> {
        self.send("load_stream", EngineCommand::LoadStream(Box::new(stream)))
    }

    fn play(&mut self) -> EngineResult<()> {
        self.send("play", EngineCommand::Play)
    }

    fn set_paused(&mut self, paused: bool) -> EngineResult<()> {
        self.send("set_paused", EngineCommand::SetPaused(paused))
    }

    fn set_frequency(&mut self, frequency: f32) -> EngineResult<()> {
        self.send("set_frequency", EngineCommand::SetFrequency(frequency))
    }

    fn set_volume(&mut self, volume: f32) -> EngineResult<()> {
        self.send("set_volume", EngineCommand::SetVolume(volume))
    }

    fn set_pan(&mut self, pan: f32) -> EngineResult<()> {
        self.send("set_pan", EngineCommand::SetPan(pan))
    }

    fn set_speaker_mode(&mut self, mode: SpeakerMode) -> EngineResult<()> {
        self.send("set_speaker_mode", EngineCommand::SetSpeakerMode(mode))
    }

    fn create_node(&mut self, id: NodeId, node: Box<dyn DspNode>) -> EngineResult<()> {
        self.send("create_node", EngineCommand::CreateNode { id, node })
    }

    fn attach_node(&mut self, id: NodeId, position: usize) -> EngineResult<()> {
        self.send("attach_node", EngineCommand::AttachNode { id, position })
    }

    fn detach_node(&mut self, id: NodeId) -> EngineResult<()> {
        self.send("detach_node", EngineCommand::DetachNode { id })
    }

    fn set_node_param(&mut self, id: NodeId, index: usize, value: f32) -> EngineResult<()> {
        self.send(
            "set_node_param",
            EngineCommand::SetNodeParam { id, index, value },
        )
    }

    fn set_listener(&mut self, pose: &ListenerPose) -> EngineResult<()> {
        self.send("set_listener", EngineCommand::SetListener(Box::new(*pose)))
    }

    fn play_event(&mut self, samples: Arc<StereoBuffer>, position: [f32; 3]) -> EngineResult<()> {
        self.send(
            "play_event",
            EngineCommand::PlayEvent(Box::new(EventSound { samples, position })),
        )
    }

    fn pump(&mut self) {
        while let Ok(report) = self.reports.pop() {
            match report {
                EngineReport::RejectedEdit { operation } => {
                    warn!("engine rejected {} on the audio thread", operation);
                }
                EngineReport::VoiceDropped => {
                    warn!("event sound dropped, all voices busy");
                }
            }
        }
    }
}
