//! Core data model for the tonebox synthesis engine.
//!
//! This crate defines the score and configuration types shared by the
//! real-time engine and the control side. The project layer produces
//! these values; the engine only reads them.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod command;
mod effects;
mod envelope;
mod oscillator;
mod pattern;
mod project;

pub use command::{Command, PatternPreview};
pub use effects::{
    BitcrusherParams, ChorusParams, DelayParams, DistortionCurve, DistortionParams,
    EffectSettings, FilterMode, FilterParams, PhaserParams, ReverbParams, RingModParams,
    SaturationParams, SidechainParams, TremoloParams, WidenerParams,
};
pub use envelope::Envelope;
pub use oscillator::{NoiseMode, OscillatorCategory, OscillatorConfig, OscillatorType};
pub use pattern::{arpeggio_code, arpeggio_offsets, Note, Pattern};
pub use project::{ChannelConfig, Clip, Project};
