//! Audio engine: playback channel, DSP graph, and the thread boundary
//!
//! The engine proper runs on the audio thread inside the output callback.
//! The control thread talks to it exclusively through `EngineControl`, whose
//! real implementation queues commands over a lock-free ring buffer.

pub mod backend;
pub mod channel;
pub mod command;
pub mod control;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod event;
pub mod graph;
pub mod nodes;

pub use backend::{start_output, OutputHandle};
pub use channel::SpeakerMode;
pub use command::{command_channel, EngineCommand, COMMAND_QUEUE_CAPACITY};
pub use control::{EngineControl, EngineHandle};
pub use engine::{report_channel, Engine, EngineReport, MAX_BUFFER_SIZE};
pub use event::{EventSound, MAX_EVENT_VOICES};
pub use graph::NodeGraph;
pub use nodes::{DspNode, NodeId};
