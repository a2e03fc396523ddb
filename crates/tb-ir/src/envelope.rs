//! ADSR envelope parameters.

/// Attack/decay/sustain/release shape shared by all voices of a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level (0.0-1.0).
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl Envelope {
    /// Create an envelope, clamping times to be non-negative and sustain to 0..=1.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }

    /// Gate-style envelope: instant attack, full sustain, instant release.
    pub const fn gate() -> Self {
        Self { attack: 0.0, decay: 0.0, sustain: 1.0, release: 0.0 }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self { attack: 0.01, decay: 0.1, sustain: 0.7, release: 0.2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_values() {
        let env = Envelope::new(-1.0, 0.5, 2.0, -0.1);
        assert_eq!(env.attack, 0.0);
        assert_eq!(env.decay, 0.5);
        assert_eq!(env.sustain, 1.0);
        assert_eq!(env.release, 0.0);
    }

    #[test]
    fn gate_has_full_sustain() {
        let env = Envelope::gate();
        assert_eq!(env.sustain, 1.0);
        assert_eq!(env.attack + env.decay + env.release, 0.0);
    }
}
