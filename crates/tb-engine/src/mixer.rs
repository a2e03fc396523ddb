//! Final stereo mix: pan law, mute/solo and master soft clip.

use core::f32::consts::FRAC_PI_4;

use tb_ir::ChannelConfig;

use crate::frame::Frame;

/// Constant-power gains: `volume * cos((pan + 1) * pi / 4)` and `volume * sin(...)`.
#[inline]
pub fn pan_gains(volume: f32, pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (volume * libm::cosf(angle), volume * libm::sinf(angle))
}

/// Whether a channel reaches the mix given the solo state of the project.
#[inline]
pub fn is_audible(config: &ChannelConfig, any_solo: bool) -> bool {
    !config.muted && (!any_solo || config.solo)
}

/// Master gain followed by an independent tanh on each side.
#[inline]
pub fn master(frame: Frame, volume: f32) -> Frame {
    Frame::new(libm::tanhf(frame.left * volume), libm::tanhf(frame.right * volume))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centre_pan_is_equal_power() {
        let (l, r) = pan_gains(0.8, 0.0);
        assert_relative_eq!(l, r, epsilon = 1e-6);
        assert_relative_eq!(l, 0.8 * libm::cosf(FRAC_PI_4), epsilon = 1e-6);
    }

    #[test]
    fn hard_pans_are_one_sided() {
        let (l, r) = pan_gains(1.0, -1.0);
        assert_relative_eq!(l, 1.0, epsilon = 1e-6);
        assert!(r.abs() < 1e-6);
        let (l, r) = pan_gains(1.0, 1.0);
        assert!(l.abs() < 1e-6);
        assert_relative_eq!(r, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn power_is_constant_across_pan() {
        for i in -10..=10 {
            let (l, r) = pan_gains(1.0, i as f32 / 10.0);
            assert_relative_eq!(l * l + r * r, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn solo_and_mute() {
        let mut config = ChannelConfig::default();
        assert!(is_audible(&config, false));
        assert!(!is_audible(&config, true));
        config.solo = true;
        assert!(is_audible(&config, true));
        config.muted = true;
        assert!(!is_audible(&config, true));
    }

    #[test]
    fn master_soft_clips() {
        let out = master(Frame::new(2.0, -2.0), 1.0);
        assert!(out.left < 0.97 && out.left > 0.96);
        assert_eq!(out.right, -out.left);
        assert!(master(Frame::mono(50.0), 1.0).left <= 1.0);
        assert_eq!(master(Frame::silence(), 0.8), Frame::silence());
    }
}
