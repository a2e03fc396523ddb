//! Stereo audio frame type.

use core::ops::{Add, AddAssign, Mul};

/// A stereo audio frame (32-bit float).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Average of both channels.
    pub fn mid(self) -> f32 {
        (self.left + self.right) * 0.5
    }

    /// Larger absolute value of the two channels.
    pub fn peak(self) -> f32 {
        self.left.abs().max(self.right.abs())
    }

    /// Apply separate gains to each channel.
    pub fn scale(self, left_gain: f32, right_gain: f32) -> Self {
        Self { left: self.left * left_gain, right: self.right * right_gain }
    }

    /// Linear blend: `dry * (1 - mix) + wet * mix`.
    pub fn blend(dry: Frame, wet: Frame, mix: f32) -> Self {
        dry * (1.0 - mix) + wet * mix
    }

    /// Convert to 16-bit PCM, clamping to full scale.
    pub fn to_i16(self) -> (i16, i16) {
        let conv = |s: f32| (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        (conv(self.left), conv(self.right))
    }
}

impl Add for Frame {
    type Output = Frame;

    fn add(self, rhs: Frame) -> Frame {
        Frame { left: self.left + rhs.left, right: self.right + rhs.right }
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Frame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    fn mul(self, gain: f32) -> Frame {
        Frame { left: self.left * gain, right: self.right * gain }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        let dry = Frame::new(1.0, -1.0);
        let wet = Frame::new(0.25, 0.5);
        assert_eq!(Frame::blend(dry, wet, 0.0), dry);
        assert_eq!(Frame::blend(dry, wet, 1.0), wet);
    }

    #[test]
    fn to_i16_clamps() {
        assert_eq!(Frame::new(2.0, -2.0).to_i16(), (32767, -32767));
        assert_eq!(Frame::silence().to_i16(), (0, 0));
    }

    #[test]
    fn mid_and_peak() {
        let f = Frame::new(0.5, -0.75);
        assert_eq!(f.mid(), -0.125);
        assert_eq!(f.peak(), 0.75);
    }
}
