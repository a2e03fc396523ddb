//! Fixed-capacity circular buffer shared by the delay-based stages.

use alloc::vec;
use alloc::vec::Vec;

/// Sample rate the maximum delay times are specified against.
pub const REFERENCE_SAMPLE_RATE: f32 = 44100.0;

/// Circular delay buffer. Allocated once at construction or sample-rate change.
#[derive(Clone, Debug)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write: usize,
}

impl DelayLine {
    /// A buffer holding `capacity` samples (at least 2).
    pub fn new(capacity: usize) -> Self {
        Self { buffer: vec![0.0; capacity.max(2)], write: 0 }
    }

    /// A buffer long enough for `max_seconds` of delay at `sample_rate`.
    pub fn with_max_seconds(max_seconds: f32, sample_rate: f32) -> Self {
        Self::new(seconds_to_samples(max_seconds, sample_rate) + 1)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest usable delay in samples.
    #[inline]
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Sample written `delay` steps ago, with `delay` clamped to `capacity - 1`.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let cap = self.buffer.len();
        let delay = delay.min(cap - 1);
        self.buffer[(self.write + cap - delay) % cap]
    }

    /// Linearly interpolated read at a fractional delay.
    #[inline]
    pub fn read_fractional(&self, delay: f32) -> f32 {
        let delay = delay.clamp(0.0, (self.max_delay() - 1) as f32);
        let whole = libm::floorf(delay);
        let frac = delay - whole;
        let a = self.read(whole as usize);
        let b = self.read(whole as usize + 1);
        a + (b - a) * frac
    }

    /// Store a sample and advance the write index.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write] = sample;
        self.write = (self.write + 1) % self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.write = 0;
    }
}

/// Convert seconds to whole samples (never negative).
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> usize {
    libm::floorf((seconds * sample_rate).max(0.0) + 0.5) as usize
}

/// Scale a delay length tuned at the reference rate to `sample_rate`.
#[inline]
pub fn scale_to_rate(samples_at_reference: usize, sample_rate: f32) -> usize {
    let scaled = samples_at_reference as f32 * sample_rate / REFERENCE_SAMPLE_RATE;
    (libm::floorf(scaled + 0.5) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_after_delay() {
        let mut line = DelayLine::new(8);
        line.write(1.0);
        for _ in 0..2 {
            line.write(0.0);
        }
        assert_eq!(line.read(3), 1.0);
        assert_eq!(line.read(2), 0.0);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut line = DelayLine::new(4);
        for i in 0..4 {
            line.write(i as f32 + 1.0);
        }
        // Delay 100 behaves as capacity - 1 = 3.
        assert_eq!(line.read(100), line.read(3));
    }

    #[test]
    fn fractional_read_interpolates() {
        let mut line = DelayLine::new(8);
        line.write(1.0);
        line.write(0.0);
        // delay 1 -> 0.0, delay 2 -> 1.0
        assert!((line.read_fractional(1.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn capacity_scales_with_rate() {
        assert_eq!(DelayLine::with_max_seconds(1.0, 48000.0).capacity(), 48001);
        assert_eq!(scale_to_rate(1116, 88200.0), 2232);
        assert_eq!(scale_to_rate(0, 44100.0), 1);
    }

    #[test]
    fn clear_zeroes_buffer() {
        let mut line = DelayLine::new(4);
        line.write(0.5);
        line.clear();
        assert_eq!(line.read(1), 0.0);
    }
}
