//! Runtime ADSR evaluator.

use tb_ir::Envelope;

/// Envelope stage. Stages only move forward; a new trigger restarts at `Attack`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    #[default]
    Off,
}

/// Runtime state for one voice's amplitude envelope.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeState {
    stage: EnvelopeStage,
    /// Seconds spent in the current stage.
    stage_time: f32,
    /// Current output level.
    level: f32,
}

impl EnvelopeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_off(&self) -> bool {
        self.stage == EnvelopeStage::Off
    }

    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    /// Gate on: restart from silence.
    pub fn trigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.stage_time = 0.0;
        self.level = 0.0;
    }

    /// Gate off: ramp from the sustain level to zero, whatever stage the
    /// gate closes in. No effect once releasing or off.
    pub fn release(&mut self) {
        if matches!(self.stage, EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Sustain) {
            self.enter(EnvelopeStage::Release);
        }
    }

    fn enter(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        self.stage_time = 0.0;
    }

    /// Advance by `dt` seconds and return the new level.
    pub fn advance(&mut self, envelope: &Envelope, dt: f32) -> f32 {
        let sustain = envelope.sustain.clamp(0.0, 1.0);
        match self.stage {
            EnvelopeStage::Attack => {
                self.stage_time += dt;
                if self.stage_time >= envelope.attack {
                    self.level = 1.0;
                    self.enter(EnvelopeStage::Decay);
                    if envelope.decay <= 0.0 {
                        self.level = sustain;
                        self.enter(EnvelopeStage::Sustain);
                    }
                } else {
                    self.level = self.stage_time / envelope.attack;
                }
            }
            EnvelopeStage::Decay => {
                self.stage_time += dt;
                if self.stage_time >= envelope.decay {
                    self.level = sustain;
                    self.enter(EnvelopeStage::Sustain);
                } else {
                    self.level = 1.0 + (sustain - 1.0) * (self.stage_time / envelope.decay);
                }
            }
            EnvelopeStage::Sustain => self.level = sustain,
            EnvelopeStage::Release => {
                self.stage_time += dt;
                if self.stage_time >= envelope.release {
                    self.level = 0.0;
                    self.enter(EnvelopeStage::Off);
                } else {
                    self.level = sustain * (1.0 - self.stage_time / envelope.release);
                }
            }
            EnvelopeStage::Off => self.level = 0.0,
        }
        self.level
    }
}
