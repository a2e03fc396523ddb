//! Stereo feedback delay.

use tb_ir::DelayParams;

use super::delay_line::{seconds_to_samples, DelayLine};
use crate::frame::Frame;

/// Longest delay time in seconds.
pub const MAX_DELAY_SECONDS: f32 = 2.0;

#[derive(Clone, Debug)]
pub struct Delay {
    left: DelayLine,
    right: DelayLine,
}

impl Delay {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: DelayLine::with_max_seconds(MAX_DELAY_SECONDS, sample_rate),
            right: DelayLine::with_max_seconds(MAX_DELAY_SECONDS, sample_rate),
        }
    }

    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    /// Process one frame with the delay given in whole samples.
    #[inline]
    pub fn process_samples(&mut self, input: Frame, delay: usize, feedback: f32, mix: f32) -> Frame {
        let delay = delay.max(1);
        let feedback = feedback.clamp(0.0, 0.95);
        let wet = Frame::new(self.left.read(delay), self.right.read(delay));
        self.left.write(input.left + wet.left * feedback);
        self.right.write(input.right + wet.right * feedback);
        Frame::blend(input, wet, mix.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn process(&mut self, input: Frame, params: &DelayParams, sample_rate: f32) -> Frame {
        let delay = seconds_to_samples(params.time, sample_rate);
        self.process_samples(input, delay, params.feedback, params.mix)
    }
}
