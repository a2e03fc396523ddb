//! Voice: one sounding note with its generator, envelope and modulation.

use core::f32::consts::TAU;

use tb_ir::{arpeggio_offsets, ChannelConfig, OscillatorCategory, OscillatorType};

use crate::envelope_state::{EnvelopeStage, EnvelopeState};
use crate::frequency::{cents_to_ratio, note_to_frequency, semitones_to_ratio};
use crate::generators::{wrap, Generate, GeneratorState};

/// Arpeggio step rate in Hz.
pub const ARPEGGIO_RATE: f32 = 15.0;

/// Seconds a portamento glide takes regardless of distance.
pub const GLIDE_TIME: f32 = 0.08;

/// Self-decaying voices stop after this many nominal decay constants.
pub const DECAY_MULTIPLE: f32 = 3.0;

/// Everything needed to start a note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteTrigger {
    /// MIDI note number.
    pub note: u8,
    pub velocity: f32,
    /// Engine time of the note-on, in seconds.
    pub time: f64,
    /// Fade-in length in seconds.
    pub fade_in: f32,
    /// Fade-out length in seconds before `duration`.
    pub fade_out: f32,
    /// Note length in seconds; 0 = until note-off.
    pub duration: f32,
    /// Type override; `None` uses the channel's waveform.
    pub oscillator: Option<OscillatorType>,
    /// Vibrato depth in semitones.
    pub vibrato: f32,
    /// Arpeggio code `0xXY`.
    pub arpeggio: u8,
    /// Portamento distance in semitones.
    pub slide: f32,
}

impl NoteTrigger {
    /// A plain held note.
    pub fn new(note: u8, velocity: f32, time: f64) -> Self {
        Self {
            note,
            velocity,
            time,
            fade_in: 0.0,
            fade_out: 0.0,
            duration: 0.0,
            oscillator: None,
            vibrato: 0.0,
            arpeggio: 0,
            slide: 0.0,
        }
    }

    pub fn with_oscillator(mut self, oscillator: OscillatorType) -> Self {
        self.oscillator = Some(oscillator);
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }
}

/// A single voice slot.
#[derive(Clone, Debug)]
pub struct Voice {
    pub active: bool,
    pub note: u8,
    pub velocity: f32,
    /// Pitch before modulation, in Hz.
    pub base_frequency: f32,
    /// Pitch after portamento, in Hz.
    pub frequency: f32,
    pub oscillator: OscillatorType,
    pub generator: GeneratorState,
    pub envelope: EnvelopeState,
    /// Engine time of the note-on, in seconds. Oldest is stolen first.
    pub start_time: f64,
    pub fade_in: f32,
    pub fade_out: f32,
    /// 0 = indefinite.
    pub duration: f32,
    pub vibrato_depth: f32,
    pub vibrato_phase: f32,
    /// Semitone offsets of the two arpeggio steps.
    pub arpeggio: (u8, u8),
    pub glide_target: Option<f32>,
    /// Glide speed in Hz per second.
    pub glide_speed: f32,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            active: false,
            note: 0,
            velocity: 0.0,
            base_frequency: 0.0,
            frequency: 0.0,
            oscillator: OscillatorType::default(),
            generator: GeneratorState::new(sample_rate, 0),
            envelope: EnvelopeState::new(),
            start_time: 0.0,
            fade_in: 0.0,
            fade_out: 0.0,
            duration: 0.0,
            vibrato_depth: 0.0,
            vibrato_phase: 0.0,
            arpeggio: (0, 0),
            glide_target: None,
            glide_speed: 0.0,
        }
    }

    pub fn is_self_decaying(&self) -> bool {
        self.oscillator.is_self_decaying()
    }

    pub fn is_releasing(&self) -> bool {
        self.envelope.is_releasing()
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    /// Seconds since note-on.
    pub fn elapsed(&self) -> f32 {
        self.generator.elapsed
    }

    /// Initialize this slot for a new note.
    pub fn start(&mut self, trigger: &NoteTrigger, oscillator: OscillatorType, config: &ChannelConfig, seed: u64) {
        let osc = &config.oscillator;
        let frequency = match oscillator.category() {
            OscillatorCategory::Waveform => note_to_frequency(trigger.note) * cents_to_ratio(osc.detune_cents),
            OscillatorCategory::Drum => oscillator.drum_base_frequency().unwrap_or(100.0),
            OscillatorCategory::Preset => note_to_frequency(trigger.note),
        };
        let start_phase = match oscillator.category() {
            OscillatorCategory::Waveform => osc.start_phase,
            _ => 0.0,
        };

        self.active = true;
        self.note = trigger.note;
        self.velocity = trigger.velocity.clamp(0.0, 1.0);
        self.base_frequency = frequency;
        self.frequency = frequency;
        self.oscillator = oscillator;
        self.generator.apply_config(osc);
        self.generator.restart(start_phase, seed);
        self.generator.set_pitch(frequency);
        self.envelope.trigger();
        self.start_time = trigger.time;
        self.fade_in = trigger.fade_in.max(0.0);
        self.fade_out = trigger.fade_out.max(0.0);
        self.duration = trigger.duration.max(0.0);
        self.vibrato_depth = trigger.vibrato;
        self.vibrato_phase = 0.0;
        self.arpeggio = arpeggio_offsets(trigger.arpeggio);

        self.glide_target = None;
        self.glide_speed = 0.0;
        if trigger.slide != 0.0 && oscillator.category() != OscillatorCategory::Drum {
            let target = frequency * semitones_to_ratio(trigger.slide);
            self.glide_target = Some(target);
            self.glide_speed = (target - frequency).abs() / GLIDE_TIME;
        }
    }

    /// Enter release. Self-decaying voices ignore this.
    pub fn release(&mut self) {
        if self.active && !self.is_self_decaying() {
            self.envelope.release();
        }
    }

    /// Retune a sounding voice, cancelling any glide.
    pub fn retune(&mut self, frequency: f32) {
        if self.active && !self.is_self_decaying() {
            self.base_frequency = frequency;
            self.frequency = frequency;
            self.glide_target = None;
        }
    }

    pub fn kill(&mut self) {
        self.active = false;
    }

    /// Effective frequency after portamento, arpeggio and vibrato.
    fn modulated_frequency(&mut self, vibrato_rate: f32, dt: f32) -> f32 {
        if let Some(target) = self.glide_target {
            let step = self.glide_speed * dt;
            let distance = target - self.frequency;
            if distance.abs() <= step {
                self.frequency = target;
                self.glide_target = None;
            } else {
                self.frequency += step.copysign(distance);
            }
        }

        let mut freq = self.frequency;
        if self.arpeggio != (0, 0) {
            let step = libm::floorf(self.generator.elapsed * ARPEGGIO_RATE) as u32 % 3;
            let offset = match step {
                1 => self.arpeggio.0,
                2 => self.arpeggio.1,
                _ => 0,
            };
            freq *= semitones_to_ratio(offset as f32);
        }

        if self.vibrato_depth != 0.0 {
            let wobble = libm::sinf(TAU * self.vibrato_phase) * self.vibrato_depth;
            freq *= semitones_to_ratio(wobble);
            self.vibrato_phase = wrap(self.vibrato_phase + vibrato_rate.max(0.0) * dt);
        }
        freq
    }

    /// Linear fade-in and, when the length is known, fade-out to the note end.
    pub fn fade_gain(&self) -> f32 {
        let t = self.generator.elapsed;
        let mut gain = 1.0;
        if self.fade_in > 0.0 {
            gain *= (t / self.fade_in).min(1.0);
        }
        if !self.is_self_decaying() && self.duration > 0.0 && self.fade_out > 0.0 {
            let remaining = self.duration - t;
            if remaining <= 0.0 {
                return 0.0;
            }
            if remaining < self.fade_out {
                gain *= remaining / self.fade_out;
            }
        }
        gain
    }

    /// Render one sample and advance all per-voice state.
    #[inline]
    pub fn render(&mut self, config: &ChannelConfig, dt: f32) -> f32 {
        if !self.active {
            return 0.0;
        }

        let amplitude = if self.is_self_decaying() {
            if self.generator.elapsed > DECAY_MULTIPLE * self.oscillator.nominal_decay() {
                self.active = false;
                return 0.0;
            }
            1.0
        } else {
            if self.duration > 0.0 && self.generator.elapsed >= self.duration {
                self.envelope.release();
            }
            let level = self.envelope.advance(&config.envelope, dt);
            if self.envelope.is_off() {
                self.active = false;
                return 0.0;
            }
            level
        };

        match self.oscillator.category() {
            OscillatorCategory::Drum => self.generator.frequency = self.base_frequency,
            _ => {
                let freq = self.modulated_frequency(config.vibrato_rate, dt);
                self.generator.set_pitch(freq);
            }
        }

        let sample = self.oscillator.generate(&mut self.generator);
        let out = sample * amplitude * self.velocity * self.fade_gain();

        self.generator.phase = wrap(self.generator.phase + self.generator.phase_increment);
        self.generator.elapsed += dt;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;
    const DT: f32 = 1.0 / SR;

    fn started(trigger: NoteTrigger, kind: OscillatorType) -> (Voice, ChannelConfig) {
        let config = ChannelConfig::default();
        let mut voice = Voice::new(SR);
        voice.start(&trigger, kind, &config, 1);
        (voice, config)
    }

    #[test]
    fn waveform_pitch_includes_detune() {
        let mut config = ChannelConfig::default();
        config.oscillator.detune_cents = 1200.0;
        let mut voice = Voice::new(SR);
        voice.start(&NoteTrigger::new(69, 1.0, 0.0), OscillatorType::Sine, &config, 1);
        assert!((voice.frequency - 880.0).abs() < 0.01);
    }

    #[test]
    fn drums_ignore_note_pitch_and_detune() {
        let mut config = ChannelConfig::default();
        config.oscillator.detune_cents = 700.0;
        let mut voice = Voice::new(SR);
        voice.start(&NoteTrigger::new(90, 1.0, 0.0), OscillatorType::Kick, &config, 1);
        assert_eq!(voice.base_frequency, 55.0);
    }

    #[test]
    fn presets_follow_note_without_detune() {
        let mut config = ChannelConfig::default();
        config.oscillator.detune_cents = 700.0;
        let mut voice = Voice::new(SR);
        voice.start(&NoteTrigger::new(57, 1.0, 0.0), OscillatorType::Organ, &config, 1);
        assert!((voice.frequency - 220.0).abs() < 0.01);
    }

    #[test]
    fn release_then_inactive() {
        let (mut voice, mut config) = started(NoteTrigger::new(60, 1.0, 0.0), OscillatorType::Pulse);
        config.envelope.release = 0.01;
        for _ in 0..100 {
            voice.render(&config, DT);
        }
        voice.release();
        assert!(voice.is_releasing());
        for _ in 0..1000 {
            voice.render(&config, DT);
        }
        assert!(!voice.active);
    }

    #[test]
    fn known_duration_releases_itself() {
        let (mut voice, config) = started(NoteTrigger::new(60, 1.0, 0.0).with_duration(0.05), OscillatorType::Pulse);
        let n = (0.05 * SR) as usize + 2;
        for _ in 0..n {
            voice.render(&config, DT);
        }
        assert!(voice.is_releasing());
    }

    #[test]
    fn self_decaying_voice_ignores_release() {
        let (mut voice, config) = started(NoteTrigger::new(60, 1.0, 0.0), OscillatorType::Snare);
        voice.release();
        assert!(!voice.is_releasing());
        let limit = (DECAY_MULTIPLE * OscillatorType::Snare.nominal_decay() * SR) as usize;
        for _ in 0..limit - 10 {
            voice.render(&config, DT);
        }
        assert!(voice.active);
        for _ in 0..100 {
            voice.render(&config, DT);
        }
        assert!(!voice.active);
    }

    #[test]
    fn glide_arrives_and_clears() {
        let mut trigger = NoteTrigger::new(69, 1.0, 0.0);
        trigger.slide = 12.0;
        let (mut voice, config) = started(trigger, OscillatorType::Sine);
        let steps = (GLIDE_TIME * SR) as usize + 10;
        for _ in 0..steps {
            voice.render(&config, DT);
        }
        assert!(voice.glide_target.is_none());
        assert!((voice.frequency - 880.0).abs() < 0.01);
    }

    #[test]
    fn glide_speed_scales_with_distance() {
        let mut small = NoteTrigger::new(69, 1.0, 0.0);
        small.slide = 1.0;
        let mut large = small;
        large.slide = 12.0;
        let (a, _) = started(small, OscillatorType::Sine);
        let (b, _) = started(large, OscillatorType::Sine);
        assert!(b.glide_speed > a.glide_speed * 5.0);
    }

    #[test]
    fn arpeggio_cycles_three_steps() {
        let mut trigger = NoteTrigger::new(69, 1.0, 0.0);
        trigger.arpeggio = 0x47;
        let (mut voice, config) = started(trigger, OscillatorType::Sine);
        let mut seen = Vec::new();
        let step_len = (SR / ARPEGGIO_RATE) as usize;
        for i in 0..step_len * 3 {
            voice.render(&config, DT);
            if i % step_len == step_len / 2 {
                seen.push(voice.generator.frequency);
            }
        }
        assert!((seen[0] - 440.0).abs() < 0.1);
        assert!((seen[1] - 440.0 * semitones_to_ratio(4.0)).abs() < 0.1);
        assert!((seen[2] - 440.0 * semitones_to_ratio(7.0)).abs() < 0.1);
    }

    #[test]
    fn vibrato_wobbles_around_pitch() {
        let mut trigger = NoteTrigger::new(69, 1.0, 0.0);
        trigger.vibrato = 1.0;
        let (mut voice, config) = started(trigger, OscillatorType::Sine);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..(SR as usize) {
            voice.render(&config, DT);
            lo = lo.min(voice.generator.frequency);
            hi = hi.max(voice.generator.frequency);
        }
        assert!(hi > 460.0 && lo < 420.0);
        assert_eq!(voice.frequency, 440.0);
    }

    #[test]
    fn fade_out_reaches_zero_at_duration() {
        let mut trigger = NoteTrigger::new(69, 1.0, 0.0).with_duration(0.1);
        trigger.fade_out = 0.05;
        trigger.fade_in = 0.01;
        let (mut voice, _) = started(trigger, OscillatorType::Sine);
        voice.generator.elapsed = 0.005;
        assert!((voice.fade_gain() - 0.5).abs() < 1e-3);
        voice.generator.elapsed = 0.075;
        assert!((voice.fade_gain() - 0.5).abs() < 1e-3);
        voice.generator.elapsed = 0.1;
        assert_eq!(voice.fade_gain(), 0.0);
        voice.generator.elapsed = 0.2;
        assert_eq!(voice.fade_gain(), 0.0);
    }

    #[test]
    fn self_decaying_voice_only_fades_in() {
        let mut trigger = NoteTrigger::new(60, 1.0, 0.0).with_duration(0.05);
        trigger.fade_out = 0.05;
        let (mut voice, _) = started(trigger, OscillatorType::Kick);
        voice.generator.elapsed = 0.2;
        assert_eq!(voice.fade_gain(), 1.0);
    }
}
