//! Haas-effect stereo widener.

use tb_ir::WidenerParams;

use super::delay_line::{seconds_to_samples, DelayLine};
use crate::frame::Frame;

/// Longest Haas delay in seconds.
pub const MAX_WIDENER_SECONDS: f32 = 0.05;

#[derive(Clone, Debug)]
pub struct Widener {
    line: DelayLine,
}

impl Widener {
    pub fn new(sample_rate: f32) -> Self {
        Self { line: DelayLine::with_max_seconds(MAX_WIDENER_SECONDS, sample_rate) }
    }

    pub fn reset(&mut self) {
        self.line.clear();
    }

    /// Side signal = mid minus its delayed copy, added to L and subtracted from R.
    #[inline]
    pub fn process(&mut self, input: Frame, params: &WidenerParams, sample_rate: f32) -> Frame {
        let mid = input.mid();
        let delay = seconds_to_samples(params.delay, sample_rate).max(1);
        let delayed = self.line.read(delay);
        self.line.write(mid);
        let side = (mid - delayed) * 0.5 * params.width.clamp(0.0, 1.0);
        Frame::new(input.left + side, input.right - side)
    }
}
