//! Game-facing audio facade
//!
//! Owns the engine handle, the effect chain, and the pitch controller, and
//! turns per-frame command events into engine calls. `update` must run once
//! per frame after game-state update; it drains the frame's commands, pushes
//! the listener, and pumps engine feedback.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use crate::audio_file;
use crate::chain::{EffectChain, FilterKind, PITCH_NODE_ID};
use crate::engine::nodes::pitchshift::{PitchShiftNode, PARAM_RATIO};
use crate::engine::{
    start_output, EngineControl, EngineHandle, OutputHandle, SpeakerMode, MAX_BUFFER_SIZE,
};
use crate::error::{EngineError, EngineResult};
use crate::input::{Command, CommandSource};
use crate::pitch::{PitchTempoController, StepDirection};
use crate::types::{ListenerPose, StereoBuffer};

/// Volume change per key press
const VOLUME_STEP: f32 = 0.1;
/// Pan change per key press
const PAN_STEP: f32 = 0.1;
/// Custom filter coefficient change per key press
const COEFFICIENT_STEP: f32 = 0.1;

pub struct Audio<E: EngineControl = EngineHandle> {
    engine: E,
    _output: Option<OutputHandle>,
    sample_rate: u32,
    chain: Option<EffectChain>,
    pitch: Option<PitchTempoController>,
    event_sounds: HashMap<String, Arc<StereoBuffer>>,
    playing: bool,
    paused: bool,
    volume: f32,
    pan: f32,
}

impl Audio<EngineHandle> {
    /// Start the output stream and build a facade around it
    pub fn new() -> EngineResult<Self> {
        let (output, engine) = start_output()?;
        let sample_rate = output.sample_rate();
        Ok(Self::build(engine, Some(output), sample_rate))
    }
}

impl<E: EngineControl> Audio<E> {
    /// Build a facade over an arbitrary engine, without an output stream
    pub fn with_engine(engine: E, sample_rate: u32) -> Self {
        Self::build(engine, None, sample_rate)
    }

    fn build(engine: E, output: Option<OutputHandle>, sample_rate: u32) -> Self {
        Self {
            engine,
            _output: output,
            sample_rate,
            chain: None,
            pitch: None,
            event_sounds: HashMap::new(),
            playing: false,
            paused: false,
            volume: 1.0,
            pan: 0.0,
        }
    }

    pub fn chain(&self) -> Option<&EffectChain> {
        self.chain.as_ref()
    }

    pub fn pitch(&self) -> Option<&PitchTempoController> {
        self.pitch.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the music volume directly, clamped to 0..1
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Err(err) = self.engine.set_volume(self.volume) {
            error!("failed to set volume: {}", err);
        }
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Decode the music stream and create every DSP node up front: the eight
    /// filter slots plus the pitch-shift node. One stream per session.
    pub fn load_music_stream(&mut self, path: &Path) -> EngineResult<()> {
        if self.chain.is_some() {
            return Err(EngineError::AlreadyLoaded);
        }

        let stream = audio_file::load(path)?;
        info!(
            "loaded music stream: {} ({:.1}s at {}Hz)",
            path.display(),
            stream.duration_seconds(),
            stream.sample_rate
        );
        self.engine.load_stream(stream)?;

        self.engine.create_node(
            PITCH_NODE_ID,
            Box::new(PitchShiftNode::new(self.sample_rate, MAX_BUFFER_SIZE)),
        )?;
        self.chain = Some(EffectChain::new(&mut self.engine, self.sample_rate));
        self.pitch = Some(PitchTempoController::new());
        Ok(())
    }

    /// Start playback. Attaches the pitch-shift node at a neutral ratio so
    /// later pitch steps always find it in the graph.
    pub fn play_music_stream(&mut self) -> EngineResult<()> {
        if self.chain.is_none() {
            return Err(EngineError::NotLoaded);
        }

        self.engine.play()?;
        self.engine.attach_node(PITCH_NODE_ID, 0)?;
        self.engine.set_node_param(PITCH_NODE_ID, PARAM_RATIO, 1.0)?;
        self.playing = true;
        self.paused = false;
        Ok(())
    }

    /// Decode a one-shot clip and keep it under a name for later triggering
    pub fn load_event_sound(&mut self, name: &str, path: &Path) -> EngineResult<()> {
        let stream = audio_file::load(path)?;
        self.event_sounds
            .insert(name.to_string(), Arc::new(stream.samples));
        Ok(())
    }

    /// Fire a loaded event sound at a world position
    pub fn play_event_sound(&mut self, name: &str, position: [f32; 3]) -> EngineResult<()> {
        let samples = self
            .event_sounds
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::CallFailed {
                operation: "play_event_sound",
                reason: format!("no event sound named {:?}", name),
            })?;
        self.engine.play_event(samples, position)
    }

    /// Per-frame update: dispatch this frame's commands, push the listener,
    /// pump engine feedback. Call exactly once per frame, between game-state
    /// update and render.
    pub fn update(&mut self, commands: &mut dyn CommandSource, listener: &ListenerPose) {
        while let Some(command) = commands.next_command() {
            self.dispatch(command);
        }

        if let Err(err) = self.engine.set_listener(listener) {
            error!("failed to push listener: {}", err);
        }
        self.engine.pump();
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::TogglePause => {
                self.paused = !self.paused;
                if let Err(err) = self.engine.set_paused(self.paused) {
                    error!("failed to set pause: {}", err);
                }
            }
            Command::SpeakerLeft => self.set_speaker(SpeakerMode::Left),
            Command::SpeakerRight => self.set_speaker(SpeakerMode::Right),
            Command::SpeakerBoth => self.set_speaker(SpeakerMode::Both),
            Command::VolumeUp => self.adjust_volume(VOLUME_STEP),
            Command::VolumeDown => self.adjust_volume(-VOLUME_STEP),
            Command::PanLeft => self.adjust_pan(-PAN_STEP),
            Command::PanRight => self.adjust_pan(PAN_STEP),
            Command::TempoUp => self.tempo_step(StepDirection::Up),
            Command::TempoDown => self.tempo_step(StepDirection::Down),
            Command::PitchUp => self.pitch_step(StepDirection::Up),
            Command::PitchDown => self.pitch_step(StepDirection::Down),
            Command::ToggleFilter(kind) => self.toggle_filter(kind),
            Command::CustomCoefficientUp => self.adjust_coefficient(COEFFICIENT_STEP),
            Command::CustomCoefficientDown => self.adjust_coefficient(-COEFFICIENT_STEP),
        }
    }

    fn set_speaker(&mut self, mode: SpeakerMode) {
        if let Err(err) = self.engine.set_speaker_mode(mode) {
            error!("failed to set speaker mode: {}", err);
        }
    }

    fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.volume + delta);
    }

    fn adjust_pan(&mut self, delta: f32) {
        self.pan = (self.pan + delta).clamp(-1.0, 1.0);
        if let Err(err) = self.engine.set_pan(self.pan) {
            error!("failed to set pan: {}", err);
        }
    }

    fn toggle_filter(&mut self, kind: FilterKind) {
        match self.chain.as_mut() {
            Some(chain) => chain.toggle(&mut self.engine, kind),
            None => warn!("filter toggle before any stream loaded"),
        }
    }

    fn adjust_coefficient(&mut self, delta: f32) {
        match self.chain.as_ref() {
            Some(chain) => {
                chain.set_custom_coefficient(chain.custom_coefficient() + delta);
            }
            None => warn!("coefficient change before any stream loaded"),
        }
    }

    fn pitch_step(&mut self, direction: StepDirection) {
        match self.pitch.as_mut() {
            Some(pitch) => pitch.apply_pitch_step(&mut self.engine, direction),
            None => warn!("pitch step before any stream loaded"),
        }
    }

    fn tempo_step(&mut self, direction: StepDirection) {
        match self.pitch.as_mut() {
            Some(pitch) => pitch.apply_tempo_step(&mut self.engine, direction),
            None => warn!("tempo step before any stream loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain;
    use crate::engine::nodes::NodeId;
    use crate::input::QueuedSource;
    use crate::testutil::RecordingEngine;

    fn lowpass_id() -> NodeId {
        // Slot ids start after the pitch node
        NodeId(1)
    }

    fn loaded_audio() -> Audio<RecordingEngine> {
        let mut audio = Audio::with_engine(RecordingEngine::new(), 48_000);
        // Skip file decode: install the nodes the way load_music_stream does
        audio
            .engine
            .create_node(
                chain::PITCH_NODE_ID,
                Box::new(PitchShiftNode::new(48_000, 64)),
            )
            .unwrap();
        audio.chain = Some(EffectChain::new(&mut audio.engine, 48_000));
        audio.pitch = Some(PitchTempoController::new());
        audio
    }

    fn tick(audio: &mut Audio<RecordingEngine>, commands: Vec<Command>) {
        let mut source = QueuedSource::from(commands);
        audio.update(&mut source, &ListenerPose::default());
    }

    #[test]
    fn test_play_before_load_rejected() {
        let mut audio = Audio::with_engine(RecordingEngine::new(), 48_000);
        assert!(matches!(
            audio.play_music_stream(),
            Err(EngineError::NotLoaded)
        ));
    }

    #[test]
    fn test_play_attaches_pitch_node_neutral() {
        let mut audio = loaded_audio();
        audio.play_music_stream().unwrap();

        assert_eq!(audio.engine.play_count(), 1);
        assert_eq!(audio.engine.attach_count(chain::PITCH_NODE_ID), 1);
        assert_eq!(
            audio.engine.params_for(chain::PITCH_NODE_ID),
            vec![(PARAM_RATIO, 1.0)]
        );
    }

    #[test]
    fn test_toggle_sequence_end_to_end() {
        let mut audio = loaded_audio();
        audio.play_music_stream().unwrap();

        tick(
            &mut audio,
            vec![
                Command::ToggleFilter(FilterKind::Lowpass),
                Command::ToggleFilter(FilterKind::Lowpass),
                Command::ToggleFilter(FilterKind::Lowpass),
            ],
        );

        assert!(audio.chain().unwrap().is_enabled(FilterKind::Lowpass));
        assert_eq!(audio.engine.attach_count(lowpass_id()), 2);
        assert_eq!(audio.engine.detach_count(lowpass_id()), 1);
    }

    #[test]
    fn test_update_pushes_listener_and_pumps() {
        let mut audio = loaded_audio();
        tick(&mut audio, vec![]);
        tick(&mut audio, vec![]);

        assert_eq!(audio.engine.listener_count(), 2);
        assert_eq!(audio.engine.pump_count(), 2);
    }

    #[test]
    fn test_volume_steps_clamped() {
        let mut audio = loaded_audio();
        tick(&mut audio, vec![Command::VolumeUp; 5]);
        assert_eq!(audio.volume(), 1.0);

        tick(&mut audio, vec![Command::VolumeDown; 15]);
        assert_eq!(audio.volume(), 0.0);
        assert_eq!(audio.engine.volume_calls().last(), Some(&0.0));
    }

    #[test]
    fn test_pan_steps_reach_engine() {
        let mut audio = loaded_audio();
        tick(&mut audio, vec![Command::PanLeft, Command::PanLeft]);
        assert!((audio.pan() + 0.2).abs() < 1e-6);
        assert_eq!(audio.engine.pan_calls().len(), 2);
    }

    #[test]
    fn test_pause_toggles() {
        let mut audio = loaded_audio();
        tick(&mut audio, vec![Command::TogglePause]);
        assert!(audio.is_paused());
        tick(&mut audio, vec![Command::TogglePause]);
        assert!(!audio.is_paused());
        assert_eq!(audio.engine.pause_calls(), vec![true, false]);
    }

    #[test]
    fn test_coefficient_steps_accumulate_and_clamp() {
        let mut audio = loaded_audio();
        tick(&mut audio, vec![Command::CustomCoefficientUp; 15]);
        assert_eq!(audio.chain().unwrap().custom_coefficient(), 2.0);

        tick(&mut audio, vec![Command::CustomCoefficientDown; 30]);
        assert_eq!(audio.chain().unwrap().custom_coefficient(), 0.0);
    }

    #[test]
    fn test_pitch_commands_drive_controller() {
        let mut audio = loaded_audio();
        audio.play_music_stream().unwrap();
        tick(&mut audio, vec![Command::TempoUp]);

        let pitch = audio.pitch().unwrap();
        assert_eq!(pitch.tempo_steps(), 1);
        assert!((pitch.ratio() - 1.059).abs() < 1e-6);
        assert_eq!(
            audio.engine.frequency_calls(),
            vec![2f32.powf(-1.0 / 12.0)]
        );
    }

    #[test]
    fn test_unknown_event_sound_errors() {
        let mut audio = loaded_audio();
        assert!(audio.play_event_sound("missing", [0.0; 3]).is_err());
    }

    #[test]
    fn test_set_volume_clamps_and_reaches_engine() {
        let mut audio = loaded_audio();
        audio.set_volume(0.2);
        assert_eq!(audio.volume(), 0.2);

        audio.set_volume(3.0);
        assert_eq!(audio.volume(), 1.0);
        assert_eq!(audio.engine.volume_calls(), vec![0.2, 1.0]);
    }

    #[test]
    fn test_speaker_commands_reach_engine() {
        let mut audio = loaded_audio();
        tick(
            &mut audio,
            vec![
                Command::SpeakerLeft,
                Command::SpeakerRight,
                Command::SpeakerBoth,
            ],
        );
        assert_eq!(
            audio.engine.speaker_calls(),
            vec![SpeakerMode::Left, SpeakerMode::Right, SpeakerMode::Both]
        );
    }
}
