//! Tape-style saturation: soft knee, asymmetric tanh, even harmonics and warmth.

use core::f32::consts::PI;

use tb_ir::SaturationParams;

use crate::frame::Frame;

/// Level of the added second harmonic.
const EVEN_HARMONIC: f32 = 0.08;
/// Corner of the warmth low-pass.
const WARMTH_HZ: f32 = 3500.0;

#[derive(Clone, Debug, Default)]
pub struct Saturation {
    warm_left: f32,
    warm_right: f32,
}

/// Compress the part of `x` above `threshold` into a soft knee.
#[inline]
pub fn soft_knee(x: f32, threshold: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude <= threshold {
        return x;
    }
    let over = (magnitude - threshold) / (1.0 - threshold);
    let compressed = threshold + (magnitude - threshold) / (1.0 + over * over);
    compressed.copysign(x)
}

/// Asymmetric tanh with an added even-harmonic term.
#[inline]
pub fn shape(x: f32) -> f32 {
    let shaped = if x >= 0.0 { libm::tanhf(x) } else { libm::tanhf(1.2 * x) / 1.2 };
    shaped + EVEN_HARMONIC * shaped * shaped
}

impl Saturation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn process(&mut self, input: Frame, params: &SaturationParams, sample_rate: f32) -> Frame {
        let drive = params.drive.clamp(0.1, 10.0);
        let threshold = params.threshold.clamp(0.1, 0.99);
        let warmth = params.warmth.clamp(0.0, 1.0);
        let a = if sample_rate > 0.0 { 1.0 - libm::expf(-2.0 * PI * WARMTH_HZ / sample_rate) } else { 1.0 };

        let sat_l = shape(soft_knee(input.left * drive, threshold));
        let sat_r = shape(soft_knee(input.right * drive, threshold));
        self.warm_left += a * (sat_l - self.warm_left);
        self.warm_right += a * (sat_r - self.warm_right);

        let wet = Frame::new(
            sat_l * (1.0 - warmth) + self.warm_left * warmth,
            sat_r * (1.0 - warmth) + self.warm_right * warmth,
        );
        Frame::blend(input, wet, params.mix.clamp(0.0, 1.0))
    }
}
