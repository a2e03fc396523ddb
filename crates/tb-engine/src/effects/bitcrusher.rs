//! Sample-and-hold rate reduction followed by bit-depth quantization.

use tb_ir::BitcrusherParams;

#[derive(Clone, Debug, Default)]
pub struct Bitcrusher {
    held: f32,
    /// Samples left before the next capture.
    counter: f32,
}

impl Bitcrusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn process(&mut self, input: f32, params: &BitcrusherParams) -> f32 {
        if self.counter <= 0.0 {
            self.held = input;
            self.counter += params.rate_reduction.max(1.0);
        }
        self.counter -= 1.0;
        quantize(self.held, params.bit_depth)
    }
}

/// Round to one of `2^bits` evenly spaced levels spanning [-1, 1].
#[inline]
pub fn quantize(sample: f32, bits: u8) -> f32 {
    let bits = bits.clamp(1, 16);
    let steps = ((1u32 << bits) - 1) as f32;
    let unit = (sample.clamp(-1.0, 1.0) + 1.0) * 0.5;
    libm::floorf(unit * steps + 0.5) / steps * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bits: u8, rate: f32) -> BitcrusherParams {
        BitcrusherParams { enabled: true, bit_depth: bits, rate_reduction: rate }
    }

    #[test]
    fn holds_for_rate_samples() {
        let mut crusher = Bitcrusher::new();
        let p = params(16, 4.0);
        let out: Vec<f32> = (0..8).map(|i| crusher.process(i as f32 * 0.1, &p)).collect();
        assert!((out[0] - 0.0).abs() < 1e-4);
        assert_eq!(out[0], out[3]);
        assert!((out[4] - 0.4).abs() < 1e-3);
        assert_eq!(out[4], out[7]);
    }

    #[test]
    fn rate_one_passes_every_sample() {
        let mut crusher = Bitcrusher::new();
        let p = params(16, 1.0);
        assert!((crusher.process(0.25, &p) - 0.25).abs() < 1e-4);
        assert!((crusher.process(-0.5, &p) + 0.5).abs() < 1e-4);
    }

    #[test]
    fn level_count_is_two_to_the_bits() {
        for bits in 1..=4u8 {
            let mut levels: Vec<f32> = (0..=2000).map(|i| quantize(i as f32 / 1000.0 - 1.0, bits)).collect();
            levels.dedup();
            assert_eq!(levels.len(), 1 << bits, "bits {}: {:?}", bits, levels);
            assert_eq!(levels.first(), Some(&-1.0));
            assert_eq!(levels.last(), Some(&1.0));
        }
    }

    #[test]
    fn one_bit_is_sign() {
        assert_eq!(quantize(0.3, 1), 1.0);
        assert_eq!(quantize(-0.3, 1), -1.0);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(quantize(3.0, 2), 1.0);
        assert_eq!(quantize(-3.0, 2), -1.0);
    }
}
