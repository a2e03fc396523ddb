//! Comb/all-pass reverb with pre-delay.
//!
//! Eight damped combs run in parallel on the mono input; even combs feed
//! the left side and odd combs the right. Each side then passes through
//! four series all-pass diffusers. Tunings are in samples at 44.1 kHz and
//! rescaled to the running rate.

use tb_ir::ReverbParams;

use super::delay_line::{scale_to_rate, seconds_to_samples, DelayLine};
use crate::frame::Frame;

const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
/// Extra all-pass length on the right side.
const STEREO_SPREAD: usize = 23;

const INPUT_GAIN: f32 = 0.03;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Longest pre-delay in seconds.
pub const MAX_PRE_DELAY_SECONDS: f32 = 0.5;

/// Feedback comb with a one-pole low-pass in the loop.
#[derive(Clone, Debug)]
struct Comb {
    line: DelayLine,
    length: usize,
    store: f32,
}

impl Comb {
    fn new(length: usize) -> Self {
        Self { line: DelayLine::new(length + 1), length, store: 0.0 }
    }

    #[inline]
    fn tick(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let out = self.line.read(self.length);
        self.store = out * (1.0 - damp) + self.store * damp;
        self.line.write(input + self.store * feedback);
        out
    }

    fn clear(&mut self) {
        self.line.clear();
        self.store = 0.0;
    }
}

/// Schroeder all-pass diffuser.
#[derive(Clone, Debug)]
struct Diffuser {
    line: DelayLine,
    length: usize,
}

impl Diffuser {
    fn new(length: usize) -> Self {
        Self { line: DelayLine::new(length + 1), length }
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.length);
        self.line.write(input + delayed * ALLPASS_FEEDBACK);
        delayed - input
    }
}

#[derive(Clone, Debug)]
pub struct Reverb {
    pre_delay: DelayLine,
    combs: [Comb; 8],
    left: [Diffuser; 4],
    right: [Diffuser; 4],
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            // One extra slot: the current input is written before the tap is read.
            pre_delay: DelayLine::new(seconds_to_samples(MAX_PRE_DELAY_SECONDS, sample_rate) + 2),
            combs: COMB_TUNINGS.map(|n| Comb::new(scale_to_rate(n, sample_rate))),
            left: ALLPASS_TUNINGS.map(|n| Diffuser::new(scale_to_rate(n, sample_rate))),
            right: ALLPASS_TUNINGS.map(|n| Diffuser::new(scale_to_rate(n + STEREO_SPREAD, sample_rate))),
        }
    }

    pub fn reset(&mut self) {
        self.pre_delay.clear();
        self.combs.iter_mut().for_each(Comb::clear);
        self.left.iter_mut().chain(self.right.iter_mut()).for_each(|d| d.line.clear());
    }

    #[inline]
    pub fn process(&mut self, input: Frame, params: &ReverbParams, sample_rate: f32) -> Frame {
        // After the write, tap 1 is the current input, so zero pre-delay is transparent.
        self.pre_delay.write(input.mid());
        let delayed = self.pre_delay.read(seconds_to_samples(params.pre_delay, sample_rate) + 1);
        let feed = delayed * INPUT_GAIN;

        let feedback = params.room_size.clamp(0.0, 1.0) * ROOM_SCALE + ROOM_OFFSET;
        let damp = params.damping.clamp(0.0, 1.0) * DAMP_SCALE;
        let mut wet_l = 0.0;
        let mut wet_r = 0.0;
        for (i, comb) in self.combs.iter_mut().enumerate() {
            let out = comb.tick(feed, feedback, damp);
            if i % 2 == 0 {
                wet_l += out;
            } else {
                wet_r += out;
            }
        }
        let wet_l = self.left.iter_mut().fold(wet_l, |x, d| d.tick(x));
        let wet_r = self.right.iter_mut().fold(wet_r, |x, d| d.tick(x));

        let width = params.width.clamp(0.0, 1.0);
        let wet1 = width * 0.5 + 0.5;
        let wet2 = (1.0 - width) * 0.5;
        let wet = Frame::new(wet_l * wet1 + wet_r * wet2, wet_r * wet1 + wet_l * wet2);
        Frame::blend(input, wet, params.mix.clamp(0.0, 1.0))
    }
}
