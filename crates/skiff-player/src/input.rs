//! Keyboard input over stdin
//!
//! A reader thread turns stdin lines into control commands and sends them
//! over a channel; the main loop drains the channel once per tick through
//! the `CommandSource` seam. Line-buffered stdin means a key needs Enter,
//! which is crude but portable and keeps the player free of terminal
//! dependencies.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use skiff_core::chain::FilterKind;
use skiff_core::input::{Command, CommandSource};

/// Key that ends the player cleanly
const QUIT_KEY: char = 'x';

fn is_quit_key(key: char) -> bool {
    key == QUIT_KEY
}

/// Map one key to a command
fn command_for_key(key: char) -> Option<Command> {
    match key {
        'q' => Some(Command::TogglePause),
        '1' => Some(Command::SpeakerLeft),
        '2' => Some(Command::SpeakerRight),
        '3' => Some(Command::SpeakerBoth),
        '4' => Some(Command::TempoDown),
        '5' => Some(Command::TempoUp),
        '+' => Some(Command::VolumeUp),
        '-' => Some(Command::VolumeDown),
        '[' => Some(Command::PanLeft),
        ']' => Some(Command::PanRight),
        'n' => Some(Command::PitchDown),
        'm' => Some(Command::PitchUp),
        'r' => Some(Command::ToggleFilter(FilterKind::Lowpass)),
        't' => Some(Command::ToggleFilter(FilterKind::Highpass)),
        'y' => Some(Command::ToggleFilter(FilterKind::Echo)),
        'u' => Some(Command::ToggleFilter(FilterKind::Flange)),
        'i' => Some(Command::ToggleFilter(FilterKind::Distortion)),
        'o' => Some(Command::ToggleFilter(FilterKind::Chorus)),
        'p' => Some(Command::ToggleFilter(FilterKind::ParamEq)),
        'c' => Some(Command::ToggleFilter(FilterKind::Custom)),
        '.' => Some(Command::CustomCoefficientUp),
        ',' => Some(Command::CustomCoefficientDown),
        _ => None,
    }
}

/// Command source fed by the stdin reader thread
pub struct StdinSource {
    receiver: Receiver<Command>,
    quit: Arc<AtomicBool>,
}

impl StdinSource {
    /// Spawn the reader thread and return the source
    pub fn spawn() -> Self {
        let (sender, receiver) = unbounded();
        let quit = Arc::new(AtomicBool::new(false));
        let reader_quit = quit.clone();
        thread::Builder::new()
            .name("stdin-input".to_string())
            .spawn(move || reader_loop(sender, reader_quit))
            .expect("failed to spawn stdin reader thread");
        Self { receiver, quit }
    }

    /// True once the quit key has been pressed
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }
}

fn reader_loop(sender: Sender<Command>, quit: Arc<AtomicBool>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        for key in line.chars() {
            if is_quit_key(key) {
                quit.store(true, Ordering::Relaxed);
                return;
            }
            if let Some(command) = command_for_key(key) {
                if sender.send(command).is_err() {
                    return;
                }
            }
        }
    }
}

impl CommandSource for StdinSource {
    fn next_command(&mut self) -> Option<Command> {
        self.receiver.try_recv().ok()
    }
}

/// One-line key reference printed at startup
pub fn print_key_help() {
    println!("Keys (press Enter to apply):");
    println!("  q pause/resume   1/2/3 left/right/both speakers");
    println!("  4/5 tempo down/up   n/m pitch down/up   +/- volume   [/] pan");
    println!("  r lowpass  t highpass  y echo  u flange  i distortion");
    println!("  o chorus  p param-eq  c custom filter  ,/. custom coefficient");
    println!("  x quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keys_map_to_distinct_kinds() {
        let kinds: Vec<_> = "rtyuiopc"
            .chars()
            .map(|k| match command_for_key(k) {
                Some(Command::ToggleFilter(kind)) => kind,
                other => panic!("expected filter toggle for {:?}, got {:?}", k, other),
            })
            .collect();

        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_unmapped_key_ignored() {
        assert_eq!(command_for_key('z'), None);
    }

    #[test]
    fn test_quit_key_not_a_command() {
        assert!(is_quit_key(QUIT_KEY));
        assert_eq!(command_for_key(QUIT_KEY), None);
    }
}
