//! Sidechain ducking driven by another channel's level.

use tb_ir::SidechainParams;

use crate::frame::Frame;

#[derive(Clone, Debug, Default)]
pub struct Sidechain {
    envelope: f32,
}

/// Per-sample smoothing coefficient for a time constant: `exp(-1 / (t * sr))`.
#[inline]
pub fn smoothing_coefficient(seconds: f32, sample_rate: f32) -> f32 {
    let samples = seconds * sample_rate;
    if samples <= 0.0 {
        0.0
    } else {
        libm::expf(-1.0 / samples)
    }
}

impl Sidechain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    /// Track the rectified key level and return the gain to apply.
    #[inline]
    pub fn gain(&mut self, key: f32, params: &SidechainParams, sample_rate: f32) -> f32 {
        let key = key.abs();
        let time = if key > self.envelope { params.attack } else { params.release };
        let coef = smoothing_coefficient(time, sample_rate);
        self.envelope = coef * self.envelope + (1.0 - coef) * key;

        let threshold = params.threshold.clamp(0.0, 0.99);
        let over = ((self.envelope - threshold) / (1.0 - threshold)).clamp(0.0, 1.0);
        1.0 - params.amount.clamp(0.0, 1.0) * over
    }

    #[inline]
    pub fn process(&mut self, input: Frame, key: f32, params: &SidechainParams, sample_rate: f32) -> Frame {
        input * self.gain(key, params, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: f32 = 44100.0;

    fn params() -> SidechainParams {
        SidechainParams { enabled: true, source: 0, threshold: 0.2, amount: 0.8, attack: 0.001, release: 0.1 }
    }

    #[test]
    fn quiet_key_leaves_signal_alone() {
        let mut sc = Sidechain::new();
        for _ in 0..1000 {
            assert_eq!(sc.gain(0.1, &params(), SR), 1.0);
        }
    }

    #[test]
    fn loud_key_ducks_by_amount() {
        let mut sc = Sidechain::new();
        let mut g = 1.0;
        for _ in 0..4410 {
            g = sc.gain(1.0, &params(), SR);
        }
        assert_relative_eq!(g, 0.2, epsilon = 1e-3);
    }

    #[test]
    fn release_is_slower_than_attack() {
        let mut sc = Sidechain::new();
        let mut rise = 0;
        while sc.envelope() < 0.5 {
            sc.gain(1.0, &params(), SR);
            rise += 1;
        }
        let mut fall = 0;
        while sc.envelope() > 0.25 {
            sc.gain(0.0, &params(), SR);
            fall += 1;
        }
        assert!(fall > rise * 10, "rise {} fall {}", rise, fall);
    }

    #[test]
    fn zero_time_follows_instantly() {
        assert_eq!(smoothing_coefficient(0.0, SR), 0.0);
        let c = smoothing_coefficient(1.0, SR);
        assert_relative_eq!(c, libm::expf(-1.0 / SR));
    }
}
