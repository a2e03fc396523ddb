//! Per-channel effect parameters.
//!
//! Each stage of the fixed effects chain has a parameter struct with its
//! own enable flag. These are plain values copied into the engine at
//! configuration-sync points.

/// Sample-rate reduction and bit-depth quantization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BitcrusherParams {
    pub enabled: bool,
    /// Quantization depth in bits (1-16).
    pub bit_depth: u8,
    /// Hold each sample for this many output samples (>= 1.0).
    pub rate_reduction: f32,
}

impl Default for BitcrusherParams {
    fn default() -> Self {
        Self { enabled: false, bit_depth: 8, rate_reduction: 4.0 }
    }
}

/// Waveshaping curve used by the distortion stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistortionCurve {
    /// Hyperbolic tangent.
    #[default]
    SoftClip,
    /// Clamp to [-1, 1].
    HardClip,
    /// Reflect back at +/-1.
    WaveFold,
    /// Tanh with different positive/negative knees.
    Asymmetric,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistortionParams {
    pub enabled: bool,
    pub curve: DistortionCurve,
    /// Input gain (1.0-50.0).
    pub drive: f32,
    /// Dry/wet (0.0-1.0).
    pub mix: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self { enabled: false, curve: DistortionCurve::SoftClip, drive: 4.0, mix: 1.0 }
    }
}

/// Which state-variable filter output is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    LowPass,
    HighPass,
    BandPass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub enabled: bool,
    pub mode: FilterMode,
    /// Cutoff in Hz.
    pub cutoff: f32,
    /// Resonance (0.0-1.0), clamped below self-oscillation.
    pub resonance: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self { enabled: false, mode: FilterMode::LowPass, cutoff: 2000.0, resonance: 0.2 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingModParams {
    pub enabled: bool,
    /// Carrier frequency in Hz.
    pub frequency: f32,
    pub mix: f32,
}

impl Default for RingModParams {
    fn default() -> Self {
        Self { enabled: false, frequency: 440.0, mix: 0.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TremoloParams {
    pub enabled: bool,
    /// LFO rate in Hz.
    pub rate: f32,
    /// Modulation depth (0.0-1.0).
    pub depth: f32,
}

impl Default for TremoloParams {
    fn default() -> Self {
        Self { enabled: false, rate: 5.0, depth: 0.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaserParams {
    pub enabled: bool,
    /// Number of all-pass stages (1-8).
    pub stages: u8,
    /// LFO rate in Hz.
    pub rate: f32,
    /// Sweep depth (0.0-1.0).
    pub depth: f32,
    /// Centre of the sweep (0.0-1.0).
    pub modulation: f32,
    /// Feedback (-0.95-0.95).
    pub feedback: f32,
    pub mix: f32,
}

impl Default for PhaserParams {
    fn default() -> Self {
        Self {
            enabled: false,
            stages: 4,
            rate: 0.5,
            depth: 0.7,
            modulation: 0.5,
            feedback: 0.4,
            mix: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChorusParams {
    pub enabled: bool,
    /// LFO rate in Hz.
    pub rate: f32,
    /// Modulation depth in seconds.
    pub depth: f32,
    /// Base delay in seconds.
    pub delay: f32,
    pub mix: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self { enabled: false, rate: 1.2, depth: 0.003, delay: 0.015, mix: 0.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DelayParams {
    pub enabled: bool,
    /// Delay time in seconds (capped at the buffer capacity).
    pub time: f32,
    /// Feedback (0.0-0.95).
    pub feedback: f32,
    pub mix: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self { enabled: false, time: 0.375, feedback: 0.35, mix: 0.3 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbParams {
    pub enabled: bool,
    /// Comb feedback scale (0.0-1.0).
    pub room_size: f32,
    /// High-frequency damping in the comb feedback (0.0-1.0).
    pub damping: f32,
    /// Stereo width (0.0-1.0).
    pub width: f32,
    /// Pre-delay in seconds.
    pub pre_delay: f32,
    pub mix: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            enabled: false,
            room_size: 0.6,
            damping: 0.4,
            width: 1.0,
            pre_delay: 0.02,
            mix: 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SidechainParams {
    pub enabled: bool,
    /// Channel whose dry output drives the follower.
    pub source: usize,
    /// Follower level where ducking starts (0.0-0.99).
    pub threshold: f32,
    /// Maximum gain reduction (0.0-1.0).
    pub amount: f32,
    /// Attack time in seconds.
    pub attack: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl Default for SidechainParams {
    fn default() -> Self {
        Self {
            enabled: false,
            source: 0,
            threshold: 0.1,
            amount: 0.8,
            attack: 0.005,
            release: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaturationParams {
    pub enabled: bool,
    /// Input gain (0.1-10.0).
    pub drive: f32,
    /// Knee threshold (0.1-0.99).
    pub threshold: f32,
    /// Blend of the warmth low-pass (0.0-1.0).
    pub warmth: f32,
    pub mix: f32,
}

impl Default for SaturationParams {
    fn default() -> Self {
        Self { enabled: false, drive: 1.5, threshold: 0.6, warmth: 0.3, mix: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidenerParams {
    pub enabled: bool,
    /// Side level (0.0-1.0).
    pub width: f32,
    /// Haas delay in seconds.
    pub delay: f32,
}

impl Default for WidenerParams {
    fn default() -> Self {
        Self { enabled: false, width: 0.5, delay: 0.012 }
    }
}

/// Parameters for every stage of one channel's effects chain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EffectSettings {
    pub bitcrusher: BitcrusherParams,
    pub distortion: DistortionParams,
    pub filter: FilterParams,
    pub ring_mod: RingModParams,
    pub tremolo: TremoloParams,
    pub phaser: PhaserParams,
    pub chorus: ChorusParams,
    pub delay: DelayParams,
    pub reverb: ReverbParams,
    pub sidechain: SidechainParams,
    pub saturation: SaturationParams,
    pub widener: WidenerParams,
}
