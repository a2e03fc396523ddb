//! Stereo chorus: LFO-modulated delay read, right side in quadrature.

use tb_ir::ChorusParams;

use super::delay_line::DelayLine;
use super::modulation::SineLfo;
use crate::frame::Frame;

/// Longest base delay plus modulation depth, in seconds.
pub const MAX_CHORUS_SECONDS: f32 = 0.1;

#[derive(Clone, Debug)]
pub struct Chorus {
    left: DelayLine,
    right: DelayLine,
    lfo_left: SineLfo,
    lfo_right: SineLfo,
}

impl Chorus {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: DelayLine::with_max_seconds(MAX_CHORUS_SECONDS, sample_rate),
            right: DelayLine::with_max_seconds(MAX_CHORUS_SECONDS, sample_rate),
            lfo_left: SineLfo::new(),
            // Quarter-cycle offset decorrelates the sides.
            lfo_right: SineLfo::with_phase(0.25),
        }
    }

    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    #[inline]
    pub fn process(&mut self, input: Frame, params: &ChorusParams, sample_rate: f32) -> Frame {
        let base = params.delay.max(0.0);
        let depth = params.depth.max(0.0);
        let mod_l = self.lfo_left.tick(params.rate, sample_rate);
        let mod_r = self.lfo_right.tick(params.rate, sample_rate);
        let delay_l = ((base + depth * mod_l) * sample_rate).max(1.0);
        let delay_r = ((base + depth * mod_r) * sample_rate).max(1.0);

        let wet = Frame::new(self.left.read_fractional(delay_l), self.right.read_fractional(delay_r));
        self.left.write(input.left);
        self.right.write(input.right);
        Frame::blend(input, wet, params.mix.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn zero_mix_is_dry() {
        let mut chorus = Chorus::new(SR);
        let p = ChorusParams { enabled: true, mix: 0.0, ..Default::default() };
        let out = chorus.process(Frame::new(0.3, -0.2), &p, SR);
        assert_eq!(out, Frame::new(0.3, -0.2));
    }

    #[test]
    fn wet_signal_is_delayed() {
        let mut chorus = Chorus::new(SR);
        let p = ChorusParams { enabled: true, mix: 1.0, depth: 0.0, delay: 0.01, rate: 1.0 };
        let first = chorus.process(Frame::mono(1.0), &p, SR);
        assert_eq!(first, Frame::silence());
        let mut heard = false;
        for _ in 0..600 {
            heard |= chorus.process(Frame::silence(), &p, SR).peak() > 0.5;
        }
        assert!(heard);
    }

    #[test]
    fn oversized_delay_is_clamped() {
        let mut chorus = Chorus::new(SR);
        let p = ChorusParams { enabled: true, mix: 1.0, depth: 1.0, delay: 5.0, rate: 2.0 };
        for _ in 0..1000 {
            assert!(chorus.process(Frame::mono(0.5), &p, SR).peak().is_finite());
        }
    }
}
