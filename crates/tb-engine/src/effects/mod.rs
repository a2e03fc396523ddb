//! Per-channel effects chain.
//!
//! Stages run in a fixed order: bitcrusher, distortion, filter, ring
//! modulator, tremolo, phaser, chorus, delay, reverb, sidechain, saturation,
//! widener. The chain is split at the sidechain so the mixer can feed each
//! channel the pre-sidechain output of another channel:
//!
//! - [`EffectsChain::process_pre`] takes the dry voice sum through reverb.
//! - [`EffectsChain::process_post`] applies sidechain, saturation and widener.
//!
//! Disabled stages are skipped and keep whatever state they had.

pub mod bitcrusher;
pub mod chorus;
pub mod delay;
pub mod delay_line;
pub mod distortion;
pub mod filter;
pub mod modulation;
pub mod phaser;
pub mod reverb;
pub mod saturation;
pub mod sidechain;
pub mod unison;
pub mod widener;

use tb_ir::EffectSettings;

use crate::frame::Frame;

use bitcrusher::Bitcrusher;
use chorus::Chorus;
use delay::Delay;
use filter::StateVariableFilter;
use modulation::{RingMod, Tremolo};
use phaser::Phaser;
use reverb::Reverb;
use saturation::Saturation;
use sidechain::Sidechain;
use widener::Widener;

pub struct EffectsChain {
    settings: EffectSettings,
    sample_rate: f32,
    bitcrusher: Bitcrusher,
    filter: StateVariableFilter,
    ring_mod: RingMod,
    tremolo: Tremolo,
    phaser: Phaser,
    chorus: Chorus,
    delay: Delay,
    reverb: Reverb,
    sidechain: Sidechain,
    saturation: Saturation,
    widener: Widener,
}

impl EffectsChain {
    /// Allocate every stage's buffers for `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            settings: EffectSettings::default(),
            sample_rate,
            bitcrusher: Bitcrusher::new(),
            filter: StateVariableFilter::new(),
            ring_mod: RingMod::new(),
            tremolo: Tremolo::new(),
            phaser: Phaser::new(),
            chorus: Chorus::new(sample_rate),
            delay: Delay::new(sample_rate),
            reverb: Reverb::new(sample_rate),
            sidechain: Sidechain::new(),
            saturation: Saturation::new(),
            widener: Widener::new(sample_rate),
        }
    }

    /// Rebuild buffers for a new rate. Allocates; call from the control side.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let settings = self.settings;
        *self = Self::new(sample_rate);
        self.settings = settings;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Copy new stage parameters. State is kept.
    pub fn configure(&mut self, settings: &EffectSettings) {
        self.settings = *settings;
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Source channel of the sidechain, when enabled.
    pub fn sidechain_source(&self) -> Option<usize> {
        let sc = &self.settings.sidechain;
        sc.enabled.then_some(sc.source)
    }

    /// Clear every delay memory and filter state.
    pub fn reset(&mut self) {
        self.bitcrusher.reset();
        self.filter.reset();
        self.ring_mod.reset();
        self.tremolo.reset();
        self.phaser.reset();
        self.chorus.reset();
        self.delay.reset();
        self.reverb.reset();
        self.sidechain.reset();
        self.saturation.reset();
        self.widener.reset();
    }

    /// Bitcrusher through reverb.
    #[inline]
    pub fn process_pre(&mut self, input: f32) -> Frame {
        let fx = &self.settings;
        let sr = self.sample_rate;
        let mut x = input;
        if fx.bitcrusher.enabled {
            x = self.bitcrusher.process(x, &fx.bitcrusher);
        }
        if fx.distortion.enabled {
            x = distortion::process(x, &fx.distortion);
        }
        if fx.filter.enabled {
            x = self.filter.process(x, &fx.filter, sr);
        }
        if fx.ring_mod.enabled {
            x = self.ring_mod.process(x, &fx.ring_mod, sr);
        }
        if fx.tremolo.enabled {
            x = self.tremolo.process(x, &fx.tremolo, sr);
        }
        if fx.phaser.enabled {
            x = self.phaser.process(x, &fx.phaser, sr);
        }

        let mut frame = Frame::mono(x);
        if fx.chorus.enabled {
            frame = self.chorus.process(frame, &fx.chorus, sr);
        }
        if fx.delay.enabled {
            frame = self.delay.process(frame, &fx.delay, sr);
        }
        if fx.reverb.enabled {
            frame = self.reverb.process(frame, &fx.reverb, sr);
        }
        frame
    }

    /// Sidechain, saturation and widener. `key` is the source channel's
    /// pre-sidechain level and is ignored when the sidechain is off.
    #[inline]
    pub fn process_post(&mut self, input: Frame, key: f32) -> Frame {
        let fx = &self.settings;
        let sr = self.sample_rate;
        let mut frame = input;
        if fx.sidechain.enabled {
            frame = self.sidechain.process(frame, key, &fx.sidechain, sr);
        }
        if fx.saturation.enabled {
            frame = self.saturation.process(frame, &fx.saturation, sr);
        }
        if fx.widener.enabled {
            frame = self.widener.process(frame, &fx.widener, sr);
        }
        frame
    }
}
