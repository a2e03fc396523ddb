//! Oscillator families and per-channel oscillator shape.

/// Broad grouping of oscillator types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscillatorCategory {
    /// Periodic or noise waveform shaped by the channel ADSR.
    Waveform,
    /// Synthesized percussion with a built-in pitch sweep and decay.
    Drum,
    /// Layered synth recipe with a built-in envelope.
    Preset,
}

/// Every sound source the generator bank can produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OscillatorType {
    // === Waveforms ===
    Sine,
    #[default]
    Pulse,
    Sawtooth,
    Triangle,
    Noise,

    // === Drums ===
    Kick,
    Kick808,
    Snare,
    Clap,
    HiHatClosed,
    HiHatOpen,
    TomLow,
    TomHigh,
    Rimshot,
    Cowbell,
    Crash,
    Shaker,

    // === Synth presets ===
    SuperSaw,
    Strings,
    WarmPad,
    FmBell,
    FmBass,
    ElectricPiano,
    Organ,
    Pluck,
    Brass,
    AcidBass,
    VinylNoise,
}

impl OscillatorType {
    /// All oscillator types, in declaration order.
    pub const ALL: [OscillatorType; 28] = [
        Self::Sine,
        Self::Pulse,
        Self::Sawtooth,
        Self::Triangle,
        Self::Noise,
        Self::Kick,
        Self::Kick808,
        Self::Snare,
        Self::Clap,
        Self::HiHatClosed,
        Self::HiHatOpen,
        Self::TomLow,
        Self::TomHigh,
        Self::Rimshot,
        Self::Cowbell,
        Self::Crash,
        Self::Shaker,
        Self::SuperSaw,
        Self::Strings,
        Self::WarmPad,
        Self::FmBell,
        Self::FmBass,
        Self::ElectricPiano,
        Self::Organ,
        Self::Pluck,
        Self::Brass,
        Self::AcidBass,
        Self::VinylNoise,
    ];

    /// Which family this type belongs to.
    pub const fn category(self) -> OscillatorCategory {
        use OscillatorType::*;
        match self {
            Sine | Pulse | Sawtooth | Triangle | Noise => OscillatorCategory::Waveform,
            Kick | Kick808 | Snare | Clap | HiHatClosed | HiHatOpen | TomLow | TomHigh
            | Rimshot | Cowbell | Crash | Shaker => OscillatorCategory::Drum,
            _ => OscillatorCategory::Preset,
        }
    }

    /// Drums and presets manage their own decay and ignore note-off.
    pub const fn is_self_decaying(self) -> bool {
        !matches!(self.category(), OscillatorCategory::Waveform)
    }

    /// Nominal decay constant in seconds for self-decaying types.
    ///
    /// A voice of this type is retired once its elapsed time exceeds three
    /// times this value. Waveforms return 0 (they follow the ADSR).
    pub const fn nominal_decay(self) -> f32 {
        use OscillatorType::*;
        match self {
            Sine | Pulse | Sawtooth | Triangle | Noise => 0.0,
            Kick => 0.25,
            Kick808 => 0.6,
            Snare => 0.15,
            Clap => 0.18,
            HiHatClosed => 0.05,
            HiHatOpen => 0.3,
            TomLow => 0.35,
            TomHigh => 0.25,
            Rimshot => 0.04,
            Cowbell => 0.2,
            Crash => 1.0,
            Shaker => 0.08,
            SuperSaw => 1.2,
            Strings => 1.6,
            WarmPad => 2.0,
            FmBell => 1.4,
            FmBass => 0.4,
            ElectricPiano => 0.9,
            Organ => 1.5,
            Pluck => 0.35,
            Brass => 0.8,
            AcidBass => 0.3,
            VinylNoise => 2.0,
        }
    }

    /// Fixed base pitch for drums, used to seed the phase increment.
    ///
    /// Returns `None` for pitched types, which follow the note frequency.
    pub const fn drum_base_frequency(self) -> Option<f32> {
        use OscillatorType::*;
        match self {
            Kick => Some(55.0),
            Kick808 => Some(45.0),
            Snare => Some(185.0),
            Clap => Some(1200.0),
            HiHatClosed | HiHatOpen => Some(320.0),
            TomLow => Some(95.0),
            TomHigh => Some(160.0),
            Rimshot => Some(480.0),
            Cowbell => Some(540.0),
            Crash => Some(410.0),
            Shaker => Some(3000.0),
            _ => None,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        use OscillatorType::*;
        match self {
            Sine => "Sine",
            Pulse => "Pulse",
            Sawtooth => "Sawtooth",
            Triangle => "Triangle",
            Noise => "Noise",
            Kick => "Kick",
            Kick808 => "808 Kick",
            Snare => "Snare",
            Clap => "Clap",
            HiHatClosed => "Closed Hat",
            HiHatOpen => "Open Hat",
            TomLow => "Low Tom",
            TomHigh => "High Tom",
            Rimshot => "Rimshot",
            Cowbell => "Cowbell",
            Crash => "Crash",
            Shaker => "Shaker",
            SuperSaw => "Super Saw",
            Strings => "Strings",
            WarmPad => "Warm Pad",
            FmBell => "FM Bell",
            FmBass => "FM Bass",
            ElectricPiano => "E-Piano",
            Organ => "Organ",
            Pluck => "Pluck",
            Brass => "Brass",
            AcidBass => "Acid Bass",
            VinylNoise => "Vinyl Noise",
        }
    }

    /// Stable index into [`OscillatorType::ALL`].
    pub fn index(self) -> u8 {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0) as u8
    }

    /// Inverse of [`OscillatorType::index`].
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// LFSR tap configuration for the noise waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoiseMode {
    /// Taps on bits 0 and 1: long sequence, close to white.
    #[default]
    Wide,
    /// Taps on bits 0 and 6: short periodic sequence, metallic.
    Narrow,
}

/// Static oscillator shape for one channel, read by all of its voices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorConfig {
    /// Default oscillator when a note doesn't override it.
    pub waveform: OscillatorType,
    /// Pulse duty cycle (0.01-0.99).
    pub pulse_width: f32,
    /// Triangle rise fraction (0.01-0.99, 0.5 = symmetric).
    pub triangle_slope: f32,
    /// Noise LFSR taps.
    pub noise_mode: NoiseMode,
    /// Detune in cents applied to waveform voices.
    pub detune_cents: f32,
    /// Initial phase (0.0-1.0) for new voices.
    pub start_phase: f32,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            waveform: OscillatorType::Pulse,
            pulse_width: 0.5,
            triangle_slope: 0.5,
            noise_mode: NoiseMode::Wide,
            detune_cents: 0.0,
            start_phase: 0.0,
        }
    }
}
