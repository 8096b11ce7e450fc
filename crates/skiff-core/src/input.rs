//! Discrete control commands and their source
//!
//! Input arrives as edge events ("key went down this frame"), already mapped
//! to named commands. The facade drains the source once per update tick; how
//! the events are produced (stdin, a window system, a replay script) is the
//! caller's business.

use std::collections::VecDeque;

use crate::chain::FilterKind;

/// A single discrete control action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    SpeakerLeft,
    SpeakerRight,
    SpeakerBoth,
    TempoUp,
    TempoDown,
    VolumeUp,
    VolumeDown,
    PanLeft,
    PanRight,
    PitchUp,
    PitchDown,
    ToggleFilter(FilterKind),
    CustomCoefficientUp,
    CustomCoefficientDown,
}

/// Source of control commands, drained once per update tick
pub trait CommandSource {
    /// Next pending command, or `None` when the tick's input is exhausted
    fn next_command(&mut self) -> Option<Command>;
}

/// In-memory command source for scripted sequences
#[derive(Default)]
pub struct QueuedSource {
    queue: VecDeque<Command>,
}

impl QueuedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }
}

impl From<Vec<Command>> for QueuedSource {
    fn from(commands: Vec<Command>) -> Self {
        Self {
            queue: commands.into(),
        }
    }
}

impl CommandSource for QueuedSource {
    fn next_command(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_source_drains_in_order() {
        let mut source = QueuedSource::from(vec![Command::PitchUp, Command::TempoDown]);
        assert_eq!(source.next_command(), Some(Command::PitchUp));
        assert_eq!(source.next_command(), Some(Command::TempoDown));
        assert_eq!(source.next_command(), None);
    }
}
