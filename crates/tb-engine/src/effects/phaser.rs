//! All-pass phaser with shared feedback.

use core::f32::consts::PI;

use tb_ir::PhaserParams;

use super::modulation::SineLfo;

/// Maximum number of all-pass stages.
pub const MAX_STAGES: usize = 8;

/// Lowest and highest sweep frequencies.
const SWEEP_MIN: f32 = 100.0;
const SWEEP_MAX: f32 = 4000.0;

/// First-order all-pass section.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllPass {
    a1: f32,
    zm1: f32,
}

impl AllPass {
    #[inline]
    pub fn set_fc(&mut self, fc: f32, sample_rate: f32) {
        let w = libm::tanf(PI * (fc / sample_rate).clamp(0.0, 0.49));
        self.a1 = (1.0 - w) / (1.0 + w);
    }

    #[inline]
    pub fn tick(&mut self, x: f32) -> f32 {
        let y = -self.a1 * x + self.zm1;
        self.zm1 = x + self.a1 * y;
        y
    }
}

#[derive(Clone, Debug, Default)]
pub struct Phaser {
    stages: [AllPass; MAX_STAGES],
    lfo: SineLfo,
    last: f32,
}

impl Phaser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn process(&mut self, input: f32, params: &PhaserParams, sample_rate: f32) -> f32 {
        if sample_rate <= 0.0 {
            return input;
        }
        let lfo = self.lfo.tick(params.rate, sample_rate);
        let position = (params.modulation + params.depth.clamp(0.0, 1.0) * 0.5 * lfo).clamp(0.0, 1.0);
        let fc = SWEEP_MIN * libm::powf(SWEEP_MAX / SWEEP_MIN, position);
        let count = (params.stages as usize).clamp(1, MAX_STAGES);
        let feedback = params.feedback.clamp(-0.95, 0.95);

        let mut x = input + self.last * feedback;
        for stage in self.stages.iter_mut().take(count) {
            stage.set_fc(fc, sample_rate);
            x = stage.tick(x);
        }
        self.last = x;
        let mix = params.mix.clamp(0.0, 1.0);
        input * (1.0 - mix) + x * mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn allpass_preserves_energy() {
        let mut ap = AllPass::default();
        ap.set_fc(1000.0, SR);
        let mut energy = 0.0;
        for i in 0..20_000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let y = ap.tick(x);
            energy += y * y;
        }
        assert!((energy - 1.0).abs() < 1e-3, "{}", energy);
    }

    #[test]
    fn heavy_feedback_stays_bounded() {
        let mut phaser = Phaser::new();
        let p = PhaserParams { enabled: true, stages: 8, feedback: 2.0, mix: 1.0, ..Default::default() };
        for i in 0..44100 {
            let x = libm::sinf(i as f32 * 0.05);
            let y = phaser.process(x, &p, SR);
            assert!(y.is_finite() && y.abs() < 50.0);
        }
    }

    #[test]
    fn stage_count_is_clamped() {
        let mut phaser = Phaser::new();
        let p = PhaserParams { enabled: true, stages: 0, mix: 1.0, ..Default::default() };
        let y = phaser.process(1.0, &p, SR);
        assert!(y.is_finite() && y != 0.0);
    }
}
