//! Real-time engine for tonebox.
//!
//! Generators, per-channel effects, polyphonic voices, the beat-clocked
//! sequencer and the lock-free boundary the audio callback drives.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod control;
pub mod effects;
mod engine;
mod envelope_state;
mod frame;
mod frequency;
pub mod generators;
mod mixer;
pub mod sequencer;
mod synth;
mod voice;

pub use control::{control_channel, ControlReceiver, ControlSender, DEFAULT_CAPACITY};
pub use effects::EffectsChain;
pub use engine::{Engine, EngineConfig, SharedState, MAX_COMMANDS_PER_BLOCK};
pub use envelope_state::{EnvelopeStage, EnvelopeState};
pub use frame::Frame;
pub use frequency::{cents_to_ratio, frequency_to_increment, note_to_frequency, semitones_to_ratio};
pub use generators::{Generate, GeneratorState};
pub use mixer::{master, pan_gains};
pub use sequencer::{PlaybackState, Sequencer};
pub use synth::{Synthesizer, VOICES_PER_CHANNEL};
pub use voice::{NoteTrigger, Voice};
