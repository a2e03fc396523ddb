//! Synthesizer: one channel's fixed voice pool and effects chain.

use tb_ir::{ChannelConfig, OscillatorType};

use crate::effects::EffectsChain;
use crate::frame::Frame;
use crate::voice::{NoteTrigger, Voice};

/// Voices per channel.
pub const VOICES_PER_CHANNEL: usize = 8;

pub struct Synthesizer {
    voices: [Voice; VOICES_PER_CHANNEL],
    config: ChannelConfig,
    effects: EffectsChain,
    sample_rate: f32,
    /// Seed source for per-voice noise; advances on every note-on.
    seed: u64,
}

impl Synthesizer {
    /// `seed` decorrelates noise between channels.
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            config: ChannelConfig::default(),
            effects: EffectsChain::new(sample_rate),
            sample_rate,
            seed,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Rebuild voices and effect buffers for a new rate. Allocates.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.voices = core::array::from_fn(|_| Voice::new(sample_rate));
        self.effects.set_sample_rate(sample_rate);
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Replace the channel configuration. Voices keep playing.
    pub fn configure(&mut self, config: &ChannelConfig) {
        self.config = *config;
        self.effects.configure(&config.effects);
    }

    pub fn effects(&self) -> &EffectsChain {
        &self.effects
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.config.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_waveform(&mut self, waveform: OscillatorType) {
        self.config.oscillator.waveform = waveform;
    }

    /// Retune every sounding tonal voice.
    pub fn set_frequency(&mut self, hz: f32) {
        if !(hz > 0.0 && hz.is_finite()) {
            return;
        }
        self.voices.iter_mut().for_each(|v| v.retune(hz));
    }

    /// Start a note, stealing the oldest voice when the pool is full.
    /// Returns the slot used.
    pub fn note_on(&mut self, trigger: &NoteTrigger) -> usize {
        let slot = self.voices.iter().position(|v| !v.active).unwrap_or_else(|| self.oldest_voice());
        let oscillator = trigger.oscillator.unwrap_or(self.config.oscillator.waveform);
        self.seed = self.seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.voices[slot].start(trigger, oscillator, &self.config, self.seed);
        slot
    }

    /// Active slot with the smallest start time; first in scan order on ties.
    fn oldest_voice(&self) -> usize {
        let mut oldest = 0;
        for (i, voice) in self.voices.iter().enumerate() {
            if voice.start_time < self.voices[oldest].start_time {
                oldest = i;
            }
        }
        oldest
    }

    /// Release every held voice playing `note`.
    pub fn note_off(&mut self, note: u8) {
        for voice in self.voices.iter_mut() {
            if voice.active && voice.note == note && !voice.is_releasing() {
                voice.release();
            }
        }
    }

    /// Release every held voice. Drums and presets keep ringing.
    pub fn all_notes_off(&mut self) {
        self.voices.iter_mut().for_each(Voice::release);
    }

    /// Silence everything immediately, including self-decaying voices.
    pub fn kill_all(&mut self) {
        self.voices.iter_mut().for_each(Voice::kill);
    }

    /// Kill every voice and clear the effect tails.
    pub fn reset(&mut self) {
        self.kill_all();
        self.effects.reset();
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Sum of all voices, before effects.
    #[inline]
    pub fn render_dry(&mut self) -> f32 {
        let dt = 1.0 / self.sample_rate;
        let config = &self.config;
        self.voices.iter_mut().map(|v| v.render(config, dt)).sum()
    }

    /// Voices through the chain up to and including reverb.
    #[inline]
    pub fn render_pre(&mut self) -> Frame {
        let dry = self.render_dry();
        self.effects.process_pre(dry)
    }

    /// Sidechain, saturation and widener on a pre-rendered frame.
    #[inline]
    pub fn render_post(&mut self, frame: Frame, key: f32) -> Frame {
        self.effects.process_post(frame, key)
    }

    /// Source channel of this channel's sidechain, when enabled.
    pub fn sidechain_source(&self) -> Option<usize> {
        self.effects.sidechain_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn synth() -> Synthesizer {
        Synthesizer::new(SR, 1)
    }

    #[test]
    fn fills_free_slots_first() {
        let mut s = synth();
        for i in 0..VOICES_PER_CHANNEL {
            assert_eq!(s.note_on(&NoteTrigger::new(60 + i as u8, 1.0, i as f64)), i);
        }
        assert_eq!(s.active_voices(), VOICES_PER_CHANNEL);
    }

    #[test]
    fn ninth_note_steals_oldest() {
        let mut s = synth();
        let starts = [3.0, 1.0, 4.0, 0.5, 9.0, 2.0, 6.0, 5.0];
        for (i, t) in starts.iter().enumerate() {
            s.note_on(&NoteTrigger::new(60 + i as u8, 1.0, *t));
        }
        let slot = s.note_on(&NoteTrigger::new(80, 1.0, 10.0));
        assert_eq!(slot, 3);
        assert_eq!(s.voice(3).map(|v| v.note), Some(80));
        assert_eq!(s.active_voices(), VOICES_PER_CHANNEL);
    }

    #[test]
    fn steal_ties_break_by_scan_order() {
        let mut s = synth();
        for i in 0..VOICES_PER_CHANNEL {
            s.note_on(&NoteTrigger::new(60 + i as u8, 1.0, 1.0));
        }
        assert_eq!(s.note_on(&NoteTrigger::new(90, 1.0, 2.0)), 0);
    }

    #[test]
    fn note_off_releases_matching_voices_only() {
        let mut s = synth();
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0));
        s.note_on(&NoteTrigger::new(64, 1.0, 0.0));
        s.note_off(60);
        assert!(s.voice(0).is_some_and(|v| v.is_releasing()));
        assert!(s.voice(1).is_some_and(|v| !v.is_releasing()));
    }

    #[test]
    fn drums_survive_all_notes_off() {
        let mut s = synth();
        s.note_on(&NoteTrigger::new(36, 1.0, 0.0).with_oscillator(OscillatorType::Kick));
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0));
        s.all_notes_off();
        assert!(s.voice(0).is_some_and(|v| v.active && !v.is_releasing()));
        assert!(s.voice(1).is_some_and(|v| v.is_releasing()));

        let decay = OscillatorType::Kick.nominal_decay();
        let mut audible = false;
        for i in 0..(SR * decay * 3.0) as usize - 10 {
            let out = s.render_dry();
            if i > 100 && out.abs() > 1e-4 {
                audible = true;
            }
        }
        assert!(audible);
        assert!(s.voice(0).is_some_and(|v| v.active));
        for _ in 0..100 {
            s.render_dry();
        }
        assert!(s.voice(0).is_some_and(|v| !v.active));
    }

    #[test]
    fn channel_waveform_is_default_type() {
        let mut s = synth();
        s.set_waveform(OscillatorType::Sawtooth);
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0));
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0).with_oscillator(OscillatorType::Sine));
        assert_eq!(s.voice(0).map(|v| v.oscillator), Some(OscillatorType::Sawtooth));
        assert_eq!(s.voice(1).map(|v| v.oscillator), Some(OscillatorType::Sine));
    }

    #[test]
    fn set_frequency_retunes_tonal_voices() {
        let mut s = synth();
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0));
        s.note_on(&NoteTrigger::new(36, 1.0, 0.0).with_oscillator(OscillatorType::Kick));
        s.set_frequency(300.0);
        assert_eq!(s.voice(0).map(|v| v.frequency), Some(300.0));
        assert_eq!(s.voice(1).map(|v| v.base_frequency), Some(55.0));
        s.set_frequency(f32::NAN);
        assert_eq!(s.voice(0).map(|v| v.frequency), Some(300.0));
    }

    #[test]
    fn voices_get_distinct_noise_seeds() {
        let mut s = synth();
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0).with_oscillator(OscillatorType::Snare));
        s.note_on(&NoteTrigger::new(60, 1.0, 0.0).with_oscillator(OscillatorType::Snare));
        let a: Vec<f32> = (0..64).map(|_| s.voices[0].render(&ChannelConfig::default(), 1.0 / SR)).collect();
        let b: Vec<f32> = (0..64).map(|_| s.voices[1].render(&ChannelConfig::default(), 1.0 / SR)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn idle_synth_is_silent() {
        let mut s = synth();
        assert_eq!(s.render_pre(), Frame::silence());
    }
}
