//! Unison spread: pitch multipliers and pan gains for detuned copies.

use core::f32::consts::FRAC_PI_4;

use heapless::Vec;

use crate::frequency::cents_to_ratio;

/// Maximum number of unison copies.
pub const MAX_UNISON: usize = 8;

/// One detuned copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnisonVoice {
    /// Frequency multiplier relative to the played pitch.
    pub ratio: f32,
    /// Constant-power left gain.
    pub left: f32,
    /// Constant-power right gain.
    pub right: f32,
}

impl UnisonVoice {
    /// Mono weight of this copy.
    #[inline]
    pub fn mono(&self) -> f32 {
        0.5 * (self.left + self.right)
    }
}

/// Spread `count` copies symmetrically over `±detune_cents` and `±spread` pan.
///
/// `count` is clamped to `1..=MAX_UNISON`. A single copy sits at the centre
/// with no detune.
pub fn unison(count: usize, detune_cents: f32, spread: f32) -> Vec<UnisonVoice, MAX_UNISON> {
    let count = count.clamp(1, MAX_UNISON);
    let spread = spread.clamp(0.0, 1.0);
    let mut voices = Vec::new();
    for i in 0..count {
        let position = if count == 1 { 0.0 } else { -1.0 + 2.0 * i as f32 / (count - 1) as f32 };
        let angle = (position * spread + 1.0) * FRAC_PI_4;
        let voice = UnisonVoice {
            ratio: cents_to_ratio(position * detune_cents),
            left: libm::cosf(angle),
            right: libm::sinf(angle),
        };
        // Capacity is MAX_UNISON and count never exceeds it.
        let _ = voices.push(voice);
    }
    voices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_copy_is_centred() {
        let voices = unison(1, 50.0, 1.0);
        assert_eq!(voices.len(), 1);
        assert_relative_eq!(voices[0].ratio, 1.0);
        assert_relative_eq!(voices[0].left, voices[0].right, epsilon = 1e-6);
    }

    #[test]
    fn copies_are_symmetric() {
        let voices = unison(7, 30.0, 0.8);
        assert_eq!(voices.len(), 7);
        for i in 0..7 {
            let mirror = voices[6 - i];
            assert_relative_eq!(voices[i].ratio * mirror.ratio, 1.0, epsilon = 1e-5);
            assert_relative_eq!(voices[i].left, mirror.right, epsilon = 1e-6);
        }
        assert_relative_eq!(voices[3].ratio, 1.0);
    }

    #[test]
    fn gains_are_constant_power() {
        for v in unison(5, 20.0, 1.0) {
            assert_relative_eq!(v.left * v.left + v.right * v.right, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn count_is_clamped() {
        assert_eq!(unison(0, 10.0, 0.5).len(), 1);
        assert_eq!(unison(32, 10.0, 0.5).len(), MAX_UNISON);
    }

    #[test]
    fn outer_copies_hit_full_detune() {
        let voices = unison(3, 100.0, 0.0);
        assert_relative_eq!(voices[2].ratio, cents_to_ratio(100.0), epsilon = 1e-6);
        assert_relative_eq!(voices[0].left, voices[0].right, epsilon = 1e-6);
    }
}
