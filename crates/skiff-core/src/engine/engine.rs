//! Audio-thread engine core
//!
//! Owns the music channel, the node graph, and the event mixer. Runs inside
//! the output stream callback: drain pending commands, render the channel,
//! run the graph, mix event voices, clamp. Nothing here allocates after
//! construction.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::types::{StereoBuffer, StereoSample};

use super::channel::MusicChannel;
use super::command::EngineCommand;
use super::event::EventMixer;
use super::graph::{EditOutcome, NodeGraph};

/// Largest frame count one callback may ask for
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Capacity of the report queue back to the control thread
const REPORT_QUEUE_CAPACITY: usize = 64;

/// Feedback from the audio thread, drained by the control thread each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineReport {
    /// A graph edit referred to a node in the wrong state and was dropped
    RejectedEdit { operation: &'static str },
    /// An event sound was dropped because all voices were busy
    VoiceDropped,
}

/// Create a report channel pair
pub fn report_channel() -> (Producer<EngineReport>, Consumer<EngineReport>) {
    RingBuffer::new(REPORT_QUEUE_CAPACITY)
}

pub struct Engine {
    channel: MusicChannel,
    graph: NodeGraph,
    events: EventMixer,
    commands: Consumer<EngineCommand>,
    reports: Producer<EngineReport>,
    scratch: StereoBuffer,
}

impl Engine {
    pub fn new(
        device_rate: f32,
        commands: Consumer<EngineCommand>,
        reports: Producer<EngineReport>,
    ) -> Self {
        Self {
            channel: MusicChannel::new(device_rate),
            graph: NodeGraph::new(),
            events: EventMixer::new(),
            commands,
            reports,
            scratch: StereoBuffer::silence(MAX_BUFFER_SIZE),
        }
    }

    fn report(&mut self, report: EngineReport) {
        // A full report queue just means the control side is behind; drop
        let _ = self.reports.push(report);
    }

    fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::LoadStream(stream) => self.channel.load(*stream),
            EngineCommand::Play => self.channel.play(),
            EngineCommand::SetPaused(paused) => self.channel.set_paused(paused),
            EngineCommand::SetFrequency(freq) => self.channel.set_frequency(freq),
            EngineCommand::SetVolume(volume) => self.channel.set_volume(volume),
            EngineCommand::SetPan(pan) => self.channel.set_pan(pan),
            EngineCommand::SetSpeakerMode(mode) => self.channel.set_speaker_mode(mode),
            EngineCommand::CreateNode { id, node } => self.graph.create(id, node),
            EngineCommand::AttachNode { id, position } => {
                if self.graph.attach(id, position) == EditOutcome::Rejected {
                    self.report(EngineReport::RejectedEdit { operation: "attach" });
                }
            }
            EngineCommand::DetachNode { id } => {
                if self.graph.detach(id) == EditOutcome::Rejected {
                    self.report(EngineReport::RejectedEdit { operation: "detach" });
                }
            }
            EngineCommand::SetNodeParam { id, index, value } => {
                if self.graph.set_param(id, index, value) == EditOutcome::Rejected {
                    self.report(EngineReport::RejectedEdit {
                        operation: "set_param",
                    });
                }
            }
            EngineCommand::SetListener(pose) => self.events.set_listener(*pose),
            EngineCommand::PlayEvent(sound) => {
                if !self.events.play(*sound) {
                    self.report(EngineReport::VoiceDropped);
                }
            }
        }
    }

    /// Render one callback's worth of interleaved stereo output
    pub fn process(&mut self, output: &mut [f32]) {
        let frames = (output.len() / 2).min(MAX_BUFFER_SIZE);

        while let Ok(command) = self.commands.pop() {
            self.apply_command(command);
        }

        self.scratch.set_len_from_capacity(frames);
        self.channel.render(&mut self.scratch);
        self.graph.process(&mut self.scratch);
        self.events.process(&mut self.scratch);

        for (out, sample) in output.chunks_exact_mut(2).zip(self.scratch.iter()) {
            out[0] = sample.left.clamp(-1.0, 1.0);
            out[1] = sample.right.clamp(-1.0, 1.0);
        }
    }

    #[cfg(test)]
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }
}
