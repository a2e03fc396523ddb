//! Project structure: channels, pattern library and arrangement.

use alloc::vec::Vec;

use crate::effects::EffectSettings;
use crate::envelope::Envelope;
use crate::oscillator::OscillatorConfig;
use crate::pattern::Pattern;

/// Per-channel settings read by the synthesizer and its effects chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelConfig {
    pub oscillator: OscillatorConfig,
    pub envelope: Envelope,
    /// Channel volume (0.0-1.0).
    pub volume: f32,
    /// Pan position (-1.0 = left, 0.0 = center, 1.0 = right).
    pub pan: f32,
    pub muted: bool,
    pub solo: bool,
    /// Vibrato LFO rate in Hz for notes with vibrato depth.
    pub vibrato_rate: f32,
    pub effects: EffectSettings,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            oscillator: OscillatorConfig::default(),
            envelope: Envelope::default(),
            volume: 0.8,
            pan: 0.0,
            muted: false,
            solo: false,
            vibrato_rate: 5.5,
            effects: EffectSettings::default(),
        }
    }
}

/// Placement of a pattern on the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clip {
    /// Index into `Project::patterns`.
    pub pattern: usize,
    /// Index into `Project::channels`.
    pub channel: usize,
    /// Start position in beats.
    pub start: f64,
    /// Length in beats; notes past this point are not played.
    pub length: f64,
}

impl Clip {
    pub fn new(pattern: usize, channel: usize, start: f64, length: f64) -> Self {
        Self { pattern, channel, start, length: length.max(0.0) }
    }

    /// End position in beats.
    pub fn end(&self) -> f64 {
        self.start + self.length
    }
}

/// A complete project as supplied by the project layer.
#[derive(Clone, Debug)]
pub struct Project {
    pub channels: Vec<ChannelConfig>,
    pub patterns: Vec<Pattern>,
    pub clips: Vec<Clip>,
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Swing amount (0.0-1.0), pattern preview only.
    pub swing: f32,
    /// Swing grid in beats (0.5 = eighth notes).
    pub swing_grid: f64,
    /// Humanize amount (0.0-1.0), pattern preview only.
    pub humanize: f32,
    /// Seed for humanize jitter.
    pub humanize_seed: u64,
    /// Master output volume (0.0-1.0).
    pub master_volume: f32,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            patterns: Vec::new(),
            clips: Vec::new(),
            bpm: 120.0,
            swing: 0.0,
            swing_grid: 0.5,
            humanize: 0.0,
            humanize_seed: 0x5EED,
            master_volume: 0.8,
        }
    }
}

impl Project {
    /// Create a project with `num_channels` default channels.
    pub fn with_channels(num_channels: usize) -> Self {
        let mut project = Self::default();
        project.channels = (0..num_channels).map(|_| ChannelConfig::default()).collect();
        project
    }

    /// Add a pattern to the library, returning its index.
    pub fn add_pattern(&mut self, pattern: Pattern) -> usize {
        self.patterns.push(pattern);
        self.patterns.len() - 1
    }

    /// Place a clip on the timeline.
    pub fn add_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// End of the arrangement in beats (latest clip end).
    pub fn arrangement_end(&self) -> f64 {
        self.clips.iter().map(Clip::end).fold(0.0, f64::max)
    }

    /// Seconds per beat at the project tempo.
    pub fn seconds_per_beat(&self) -> f64 {
        if self.bpm > 0.0 {
            60.0 / self.bpm
        } else {
            0.0
        }
    }
}
