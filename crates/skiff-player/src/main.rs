//! Skiff Player - interactive music playback with a live effect chain
//!
//! Starts the audio engine, loads the configured music stream, and runs a
//! fixed-rate update loop that feeds keyboard commands to the audio facade.
//! A slow circling listener and periodic event sounds exercise the 3D path.

mod config;
mod input;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use skiff_core::facade::Audio;
use skiff_core::types::ListenerPose;

use input::StdinSource;

/// Seconds between automatic event sounds
const EVENT_INTERVAL: Duration = Duration::from_secs(7);

/// Radius of the listener's slow circle around the sound origin
const LISTENER_RADIUS: f32 = 8.0;

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("skiff-player starting up");

    let config_path = config::default_config_path();
    let config = config::load_config(&config_path);

    let mut audio = Audio::new().context("failed to start audio output")?;
    audio.set_volume(config.volume);

    audio
        .load_music_stream(&config.music_path)
        .with_context(|| format!("failed to load music stream {:?}", config.music_path))?;

    for sound in &config.event_sounds {
        if let Err(e) = audio.load_event_sound(&sound.name, &sound.path) {
            log::warn!("skipping event sound {:?}: {}", sound.name, e);
        }
    }
    let event_names: Vec<String> = config
        .event_sounds
        .iter()
        .map(|s| s.name.clone())
        .collect();

    audio.play_music_stream().context("failed to start playback")?;
    log::info!("playback started");

    input::print_key_help();
    let mut commands = StdinSource::spawn();

    let tick = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);
    let start = Instant::now();
    let mut last_event = Instant::now();
    let mut next_event_index = 0usize;

    while !commands.quit_requested() {
        let frame_start = Instant::now();
        let elapsed = start.elapsed().as_secs_f32();

        // Listener circles the origin at walking pace
        let angle = elapsed * 0.2;
        let (sin, cos) = angle.sin_cos();
        let listener = ListenerPose {
            position: [LISTENER_RADIUS * cos, 0.0, LISTENER_RADIUS * sin],
            velocity: [
                -LISTENER_RADIUS * 0.2 * sin,
                0.0,
                LISTENER_RADIUS * 0.2 * cos,
            ],
            forward: [-cos, 0.0, -sin],
            up: [0.0, 1.0, 0.0],
        };

        audio.update(&mut commands, &listener);

        if !event_names.is_empty() && last_event.elapsed() >= EVENT_INTERVAL {
            let name = &event_names[next_event_index % event_names.len()];
            if let Err(e) = audio.play_event_sound(name, [0.0; 3]) {
                log::warn!("event sound {:?} failed: {}", name, e);
            }
            next_event_index += 1;
            last_event = Instant::now();
        }

        if let Some(remaining) = tick.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    log::info!("skiff-player shutting down");
    Ok(())
}
