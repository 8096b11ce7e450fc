//! Lock-free command channel between the control thread and audio thread
//!
//! Commands are pushed by the control thread and drained by the audio thread
//! at buffer boundaries, so graph edits never race the render loop. Large
//! payloads are boxed to keep the queue slots small.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::audio_file::MusicStream;
use crate::types::ListenerPose;

use super::channel::SpeakerMode;
use super::event::EventSound;
use super::nodes::{DspNode, NodeId};

/// Capacity of the command queue
///
/// Sized for a burst of UI input between two audio callbacks; at 256 slots
/// even mashed keys will not fill it within one buffer period.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// A command sent from the control thread to the audio thread
pub enum EngineCommand {
    /// Replace the music channel's source and reset its playhead
    LoadStream(Box<MusicStream>),
    /// Start (or restart) music playback
    Play,
    /// Pause or resume the music channel
    SetPaused(bool),
    /// Set the music channel's playback frequency ratio
    SetFrequency(f32),
    /// Set the music channel's volume (0..1)
    SetVolume(f32),
    /// Set the music channel's pan (-1..1)
    SetPan(f32),
    /// Route the music channel to one or both speakers
    SetSpeakerMode(SpeakerMode),
    /// Register a DSP node under an id; the node is not yet in the graph
    CreateNode { id: NodeId, node: Box<dyn DspNode> },
    /// Insert a created node into the graph at the given position
    AttachNode { id: NodeId, position: usize },
    /// Remove a node from the graph; it stays registered
    DetachNode { id: NodeId },
    /// Set a parameter on a registered node
    SetNodeParam { id: NodeId, index: usize, value: f32 },
    /// Update the 3D listener used for event sound spatialization
    SetListener(Box<ListenerPose>),
    /// Fire a one-shot event sound at a world position
    PlayEvent(Box<EventSound>),
}

/// Create a command channel pair
pub fn command_channel() -> (Producer<EngineCommand>, Consumer<EngineCommand>) {
    RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_size_is_small() {
        // Queue slots should stay pointer-sized-ish; box anything bigger
        assert!(
            std::mem::size_of::<EngineCommand>() <= 40,
            "EngineCommand is {} bytes; box the large variant",
            std::mem::size_of::<EngineCommand>()
        );
    }

    #[test]
    fn test_channel_roundtrip() {
        let (mut tx, mut rx) = command_channel();
        tx.push(EngineCommand::SetVolume(0.5)).unwrap();
        tx.push(EngineCommand::Play).unwrap();

        assert!(matches!(rx.pop(), Ok(EngineCommand::SetVolume(_))));
        assert!(matches!(rx.pop(), Ok(EngineCommand::Play)));
        assert!(rx.pop().is_err());
    }
}
