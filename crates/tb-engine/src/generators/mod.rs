//! Generator bank: per-sample waveform, drum and preset functions.
//!
//! Every generator is a function of the voice's [`GeneratorState`]: the
//! phase accumulator, the phase increment, elapsed voice time and the
//! voice's private noise/filter memories. No generator touches state
//! outside the voice it renders, so two voices never interfere.

mod drums;
mod noise;
mod presets;
mod waveforms;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tb_ir::{NoiseMode, OscillatorCategory, OscillatorConfig, OscillatorType};

use crate::frequency::frequency_to_increment;

pub use noise::{Lfsr, NOISE_OVERSAMPLE};

/// Number of auxiliary phase accumulators available to layered generators.
pub const MAX_LAYERS: usize = 8;

/// Per-voice noise and filter memories used by generators.
#[derive(Clone, Debug)]
pub struct NoiseState {
    /// 15-bit linear-feedback shift register.
    pub lfsr: Lfsr,
    /// Fractional LFSR clock accumulator.
    pub clock: f32,
    /// One-pole / state-variable filter memories owned by the voice.
    pub filter: [f32; 4],
    /// Seedable random source for white-noise layers.
    pub rng: SmallRng,
}

impl NoiseState {
    pub fn new(seed: u64) -> Self {
        Self { lfsr: Lfsr::new(), clock: 0.0, filter: [0.0; 4], rng: SmallRng::seed_from_u64(seed) }
    }

    /// Reset to the power-on state, reseeding the random source.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Uniform white noise in [-1, 1).
    #[inline]
    pub fn white(&mut self) -> f32 {
        use rand::Rng;
        self.rng.gen::<f32>() * 2.0 - 1.0
    }
}

/// Everything a generator may read or write for one voice.
#[derive(Clone, Debug)]
pub struct GeneratorState {
    /// Phase in cycles, [0, 1).
    pub phase: f32,
    /// Phase advance per sample. Drums overwrite this every sample.
    pub phase_increment: f32,
    /// Effective (modulated) frequency in Hz.
    pub frequency: f32,
    /// Seconds since note-on.
    pub elapsed: f32,
    pub sample_rate: f32,
    pub pulse_width: f32,
    pub triangle_slope: f32,
    pub noise_mode: NoiseMode,
    pub noise: NoiseState,
    /// Extra phase accumulators for stacked and FM layers.
    pub layers: [f32; MAX_LAYERS],
}

impl GeneratorState {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        Self {
            phase: 0.0,
            phase_increment: 0.0,
            frequency: 0.0,
            elapsed: 0.0,
            sample_rate,
            pulse_width: 0.5,
            triangle_slope: 0.5,
            noise_mode: NoiseMode::Wide,
            noise: NoiseState::new(seed),
            layers: [0.0; MAX_LAYERS],
        }
    }

    /// Restart for a new note: clear time, phases and noise memories.
    pub fn restart(&mut self, start_phase: f32, seed: u64) {
        self.phase = wrap(start_phase);
        self.elapsed = 0.0;
        self.layers = [0.0; MAX_LAYERS];
        self.noise.reset(seed);
    }

    /// Set the per-sample phase advance from a frequency in Hz.
    #[inline]
    pub fn set_pitch(&mut self, hz: f32) {
        self.frequency = hz;
        self.phase_increment = frequency_to_increment(hz, self.sample_rate);
    }

    /// Advance auxiliary layer `index` by `hz` and return its phase before the step.
    #[inline]
    pub fn layer(&mut self, index: usize, hz: f32) -> f32 {
        let dt = self.dt();
        match self.layers.get_mut(index) {
            Some(slot) => {
                let phase = *slot;
                *slot = wrap(phase + hz * dt);
                phase
            }
            None => 0.0,
        }
    }

    /// One-pole low-pass on filter memory `slot`.
    #[inline]
    pub fn one_pole(&mut self, slot: usize, input: f32, coefficient: f32) -> f32 {
        match self.noise.filter.get_mut(slot) {
            Some(y) => {
                *y += coefficient.clamp(0.0, 1.0) * (input - *y);
                *y
            }
            None => input,
        }
    }

    /// Copy the channel's shape parameters.
    pub fn apply_config(&mut self, config: &OscillatorConfig) {
        self.pulse_width = config.pulse_width.clamp(0.01, 0.99);
        self.triangle_slope = config.triangle_slope.clamp(0.01, 0.99);
        self.noise_mode = config.noise_mode;
    }

    /// Seconds per sample.
    #[inline]
    pub fn dt(&self) -> f32 {
        if self.sample_rate > 0.0 {
            1.0 / self.sample_rate
        } else {
            0.0
        }
    }
}

/// Uniform `generate(state) -> sample` contract over the closed set of types.
pub trait Generate {
    fn generate(self, state: &mut GeneratorState) -> f32;
}

impl Generate for OscillatorType {
    #[inline]
    fn generate(self, state: &mut GeneratorState) -> f32 {
        match self.category() {
            OscillatorCategory::Waveform => waveforms::generate(self, state),
            OscillatorCategory::Drum => drums::generate(self, state),
            OscillatorCategory::Preset => presets::generate(self, state),
        }
    }
}

/// Wrap a phase value into [0, 1).
#[inline]
pub(crate) fn wrap(phase: f32) -> f32 {
    phase - libm::floorf(phase)
}

/// 2-sample PolyBLEP residual for a discontinuity at phase 0.
#[inline]
pub(crate) fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

/// Band-limited sawtooth in [-1, 1].
#[inline]
pub(crate) fn blep_saw(phase: f32, dt: f32) -> f32 {
    2.0 * phase - 1.0 - poly_blep(phase, dt)
}

/// Band-limited pulse with the given duty cycle.
#[inline]
pub(crate) fn blep_pulse(phase: f32, duty: f32, dt: f32) -> f32 {
    let naive = if phase < duty { 1.0 } else { -1.0 };
    naive + poly_blep(phase, dt) - poly_blep(wrap(phase - duty + 1.0), dt)
}

#[inline]
pub(crate) fn sine(phase: f32) -> f32 {
    libm::sinf(core::f32::consts::TAU * phase)
}

/// Exponential decay with a linear tail reaching zero at three time constants.
#[inline]
pub(crate) fn decay_env(t: f32, tau: f32) -> f32 {
    if tau <= 0.0 {
        return 0.0;
    }
    let tail = (1.0 - t / (3.0 * tau)).max(0.0);
    libm::expf(-t / tau) * tail
}

/// Linear ramp from 0 to 1 over `attack` seconds.
#[inline]
pub(crate) fn attack_ramp(t: f32, attack: f32) -> f32 {
    if attack <= 0.0 {
        1.0
    } else {
        (t / attack).min(1.0)
    }
}
