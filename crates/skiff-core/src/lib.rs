//! Skiff Core - Audio effect-chain and playback library

pub mod audio_file;
pub mod chain;
pub mod engine;
pub mod error;
pub mod facade;
pub mod input;
pub mod pitch;
pub mod types;

#[cfg(test)]
pub mod testutil;

pub use types::*;
