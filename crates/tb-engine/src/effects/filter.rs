//! Chamberlin state-variable filter.

use core::f32::consts::PI;

use tb_ir::{FilterMode, FilterParams};

/// Highest resonance accepted before the filter would self-oscillate.
const MAX_RESONANCE: f32 = 0.95;

#[derive(Clone, Debug, Default)]
pub struct StateVariableFilter {
    low: f32,
    band: f32,
    high: f32,
}

impl StateVariableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn process(&mut self, input: f32, params: &FilterParams, sample_rate: f32) -> f32 {
        let f = coefficient(params.cutoff, sample_rate);
        let q = damping(params.resonance);
        self.band += f * self.high;
        self.low += f * self.band;
        self.high = input - self.low - q * self.band;
        match params.mode {
            FilterMode::LowPass => self.low,
            FilterMode::HighPass => self.high,
            FilterMode::BandPass => self.band,
        }
    }
}

/// `f = 2 sin(pi fc / sr)`, kept inside the stable region.
#[inline]
pub fn coefficient(cutoff: f32, sample_rate: f32) -> f32 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    let fc = cutoff.clamp(10.0, sample_rate / 6.0);
    (2.0 * libm::sinf(PI * fc / sample_rate)).min(1.0)
}

/// Damping from resonance; lower damping means a sharper peak.
#[inline]
pub fn damping(resonance: f32) -> f32 {
    2.0 * (1.0 - resonance.clamp(0.0, MAX_RESONANCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn params(mode: FilterMode, cutoff: f32, resonance: f32) -> FilterParams {
        FilterParams { enabled: true, mode, cutoff, resonance }
    }

    fn rms_after(mode: FilterMode, cutoff: f32, tone: f32) -> f32 {
        let mut svf = StateVariableFilter::new();
        let p = params(mode, cutoff, 0.2);
        let mut acc = 0.0;
        let n = 8820;
        for i in 0..n {
            let x = libm::sinf(2.0 * PI * tone * i as f32 / SR);
            let y = svf.process(x, &p, SR);
            if i >= n / 2 {
                acc += y * y;
            }
        }
        libm::sqrtf(acc / (n / 2) as f32)
    }

    #[test]
    fn lowpass_passes_lows_and_cuts_highs() {
        assert!(rms_after(FilterMode::LowPass, 1000.0, 100.0) > 0.5);
        assert!(rms_after(FilterMode::LowPass, 1000.0, 6000.0) < 0.1);
    }

    #[test]
    fn highpass_cuts_lows() {
        assert!(rms_after(FilterMode::HighPass, 2000.0, 50.0) < 0.05);
    }

    #[test]
    fn max_resonance_stays_stable() {
        let mut svf = StateVariableFilter::new();
        let p = params(FilterMode::LowPass, 20000.0, 1.0);
        let mut peak = 0.0f32;
        for i in 0..44100 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            peak = peak.max(svf.process(x, &p, SR).abs());
        }
        assert!(peak.is_finite() && peak < 10.0);
        assert!(svf.low.abs() < 1e-3);
    }

    #[test]
    fn coefficient_is_clamped() {
        assert!(coefficient(1.0e6, SR) <= 1.0);
        assert_eq!(coefficient(1000.0, 0.0), 0.0);
    }
}
