//! 15-bit linear-feedback shift register noise source.

use tb_ir::NoiseMode;

/// LFSR clock rate relative to the note frequency.
pub const NOISE_OVERSAMPLE: f32 = 16.0;

/// Upper bound on register steps per output sample.
const MAX_STEPS_PER_SAMPLE: u32 = 64;

/// A 15-bit Fibonacci LFSR with selectable taps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lfsr {
    register: u16,
}

impl Lfsr {
    /// Power-on state (only bit 0 set).
    pub const fn new() -> Self {
        Self { register: 1 }
    }

    /// Current register contents (15 bits).
    pub fn register(&self) -> u16 {
        self.register
    }

    /// Shift once, feeding back the XOR of bit 0 and the mode's tap.
    #[inline]
    pub fn step(&mut self, mode: NoiseMode) {
        let tap = match mode {
            NoiseMode::Wide => 1,
            NoiseMode::Narrow => 6,
        };
        let feedback = (self.register ^ (self.register >> tap)) & 1;
        self.register = (self.register >> 1) | (feedback << 14);
    }

    /// Bipolar output of bit 0.
    #[inline]
    pub fn output(&self) -> f32 {
        if self.register & 1 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

impl Default for Lfsr {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance the register by the accumulated clock and return its output.
#[inline]
pub(crate) fn clocked(lfsr: &mut Lfsr, clock: &mut f32, increment: f32, mode: NoiseMode) -> f32 {
    *clock += increment * NOISE_OVERSAMPLE;
    let whole = libm::floorf(*clock);
    *clock -= whole;
    let steps = (whole as u32).min(MAX_STEPS_PER_SAMPLE);
    for _ in 0..steps {
        lfsr.step(mode);
    }
    lfsr.output()
}
