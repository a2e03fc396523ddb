//! Waveshaping distortion.

use tb_ir::{DistortionCurve, DistortionParams};

/// Apply the selected curve to the driven input and blend with the dry signal.
#[inline]
pub fn process(input: f32, params: &DistortionParams) -> f32 {
    let driven = input * params.drive.clamp(1.0, 50.0);
    let wet = shape(params.curve, driven);
    let mix = params.mix.clamp(0.0, 1.0);
    input * (1.0 - mix) + wet * mix
}

#[inline]
pub fn shape(curve: DistortionCurve, x: f32) -> f32 {
    match curve {
        DistortionCurve::SoftClip => libm::tanhf(x),
        DistortionCurve::HardClip => x.clamp(-1.0, 1.0),
        DistortionCurve::WaveFold => fold(x),
        DistortionCurve::Asymmetric => {
            if x >= 0.0 {
                libm::tanhf(x)
            } else {
                0.8 * libm::tanhf(0.5 * x)
            }
        }
    }
}

/// Triangle fold: values past +/-1 reflect back into range.
#[inline]
fn fold(x: f32) -> f32 {
    let shifted = x + 1.0;
    let m = shifted - 4.0 * libm::floorf(shifted / 4.0);
    1.0 - (m - 2.0).abs()
}
