//! Control messages sent from the control context to the audio context.

use crate::oscillator::OscillatorType;
use crate::project::ChannelConfig;

/// Pattern preview target: play one pattern on one channel in a loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternPreview {
    /// Index into `Project::patterns`.
    pub pattern: usize,
    /// Channel that renders the pattern.
    pub channel: usize,
}

/// A control message. Copied by value through the control channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    // === Live sound ===
    /// Retune the channel's sounding voices.
    SetFrequency { channel: usize, hz: f32 },
    /// Set the channel volume (0.0-1.0).
    SetVolume { channel: usize, volume: f32 },
    /// Select the channel's default oscillator type.
    SetWaveform { channel: usize, waveform: OscillatorType },
    /// Start a held note (released by `NoteOff`).
    NoteOn { channel: usize, note: u8, velocity: f32 },
    /// Release a held note.
    NoteOff { channel: usize, note: u8 },
    /// Play a one-shot note of a given type for `duration` seconds.
    PreviewSound { channel: usize, note: u8, oscillator: OscillatorType, duration: f32 },
    /// Release every non-percussive voice on every channel.
    AllNotesOff,
    /// Cut every voice, drums included, and clear effect tails.
    AllSoundOff,

    // === Transport ===
    Play,
    /// Stop advancing but keep the position.
    Pause,
    /// Stop and return to the loop start.
    Stop,
    /// Jump to a beat position.
    SetPosition(f64),
    SetLoop { enabled: bool, start: f64, end: f64 },
    SetBpm(f64),
    SetMasterVolume(f32),
    /// Enter pattern preview (`Some`) or arrangement playback (`None`).
    PreviewPattern(Option<PatternPreview>),

    // === Configuration ===
    /// Replace a channel's configuration.
    SyncChannel { channel: usize, config: ChannelConfig },
}

impl Command {
    /// Channel this command addresses, if any.
    pub fn channel(&self) -> Option<usize> {
        match self {
            Command::SetFrequency { channel, .. }
            | Command::SetVolume { channel, .. }
            | Command::SetWaveform { channel, .. }
            | Command::NoteOn { channel, .. }
            | Command::NoteOff { channel, .. }
            | Command::PreviewSound { channel, .. }
            | Command::SyncChannel { channel, .. } => Some(*channel),
            _ => None,
        }
    }
}
