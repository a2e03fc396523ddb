//! Ring modulator and tremolo: a sine oscillator multiplied into the signal.

use core::f32::consts::TAU;

use tb_ir::{RingModParams, TremoloParams};

use crate::generators::wrap;

/// Free-running sine oscillator in cycles.
#[derive(Clone, Debug, Default)]
pub struct SineLfo {
    phase: f32,
}

impl SineLfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a phase offset in cycles.
    pub fn with_phase(phase: f32) -> Self {
        Self { phase: wrap(phase) }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current value, then advance by `rate` Hz.
    #[inline]
    pub fn tick(&mut self, rate: f32, sample_rate: f32) -> f32 {
        let value = libm::sinf(TAU * self.phase);
        if sample_rate > 0.0 {
            self.phase = wrap(self.phase + rate.max(0.0) / sample_rate);
        }
        value
    }
}

#[derive(Clone, Debug, Default)]
pub struct RingMod {
    carrier: SineLfo,
}

impl RingMod {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.carrier.reset();
    }

    #[inline]
    pub fn process(&mut self, input: f32, params: &RingModParams, sample_rate: f32) -> f32 {
        let carrier = self.carrier.tick(params.frequency, sample_rate);
        let mix = params.mix.clamp(0.0, 1.0);
        input * (1.0 - mix) + input * carrier * mix
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tremolo {
    lfo: SineLfo,
}

impl Tremolo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.lfo.reset();
    }

    /// Gain swings between `1 - depth` and 1.
    #[inline]
    pub fn process(&mut self, input: f32, params: &TremoloParams, sample_rate: f32) -> f32 {
        let lfo = self.lfo.tick(params.rate, sample_rate);
        let depth = params.depth.clamp(0.0, 1.0);
        input * (1.0 - depth * 0.5 * (1.0 - lfo))
    }
}
