//! Layered synth presets with built-in envelopes.
//!
//! Presets follow the note pitch in `state.frequency` and keep their stacked
//! copies in the voice's auxiliary layer phases. Every preset fades to zero
//! by three nominal decay constants.

use core::f32::consts::{PI, TAU};

use tb_ir::OscillatorType;

use super::{attack_ramp, blep_pulse, blep_saw, decay_env, sine, GeneratorState, MAX_LAYERS};
use crate::effects::unison::unison;

/// Drawbar ratios and levels for the organ.
const DRAWBARS: [(f32, f32); 6] = [(1.0, 1.0), (2.0, 0.8), (3.0, 0.6), (4.0, 0.5), (6.0, 0.3), (8.0, 0.2)];

pub(super) fn generate(kind: OscillatorType, state: &mut GeneratorState) -> f32 {
    let t = state.elapsed;
    let freq = state.frequency;
    state.phase_increment = freq * state.dt();
    let body = match kind {
        OscillatorType::SuperSaw => supersaw(state, freq, t),
        OscillatorType::Strings => strings(state, freq, t),
        OscillatorType::WarmPad => warm_pad(state, freq, t),
        OscillatorType::FmBell => fm_bell(state, freq, t),
        OscillatorType::FmBass => fm_bass(state, freq, t),
        OscillatorType::ElectricPiano => electric_piano(state, freq, t),
        OscillatorType::Organ => organ(state, freq, t),
        OscillatorType::Pluck => pluck(state, freq, t),
        OscillatorType::Brass => brass(state, freq, t),
        OscillatorType::AcidBass => acid_bass(state, freq, t),
        OscillatorType::VinylNoise => vinyl(state, t),
        _ => 0.0,
    };
    body * decay_env(t, kind.nominal_decay())
}

#[inline]
fn lowpass_coefficient(state: &GeneratorState, hz: f32) -> f32 {
    1.0 - libm::expf(-2.0 * PI * hz * state.dt())
}

/// Sum of detuned copies of a band-limited shape, normalized to the shape's range.
fn stack(state: &mut GeneratorState, freq: f32, count: usize, cents: f32, shape: fn(f32, f32) -> f32) -> f32 {
    let dt = state.dt();
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (i, copy) in unison(count.min(MAX_LAYERS), cents, 1.0).iter().enumerate() {
        let hz = freq * copy.ratio;
        let phase = state.layer(i, hz);
        sum += shape(phase, hz * dt) * copy.mono();
        weight += copy.mono();
    }
    if weight > 0.0 {
        sum / weight
    } else {
        0.0
    }
}

fn saw_shape(phase: f32, dt: f32) -> f32 {
    blep_saw(phase, dt)
}

fn triangle_shape(phase: f32, _dt: f32) -> f32 {
    1.0 - 4.0 * (phase - 0.5).abs()
}

/// Two-operator FM: carrier on the main phase, modulator on layer 0.
fn fm(state: &mut GeneratorState, freq: f32, ratio: f32, index: f32) -> f32 {
    let modulator = sine(state.layer(0, freq * ratio));
    libm::sinf(TAU * state.phase + index * modulator)
}

fn supersaw(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let saws = stack(state, freq, 7, 30.0, saw_shape);
    saws * 0.8 * attack_ramp(t, 0.01)
}

fn strings(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let saws = stack(state, freq, 5, 12.0, saw_shape);
    let a = lowpass_coefficient(state, freq * 4.0 + 800.0);
    state.one_pole(0, saws, a) * attack_ramp(t, 0.15)
}

fn warm_pad(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let body = stack(state, freq, 4, 8.0, triangle_shape);
    let sub = sine(state.phase) * 0.4;
    let a = lowpass_coefficient(state, 1200.0);
    state.one_pole(0, 0.7 * body + sub, a) * attack_ramp(t, 0.3)
}

fn fm_bell(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let index = 4.0 * libm::expf(-t / 0.3);
    fm(state, freq, 3.5, index) * attack_ramp(t, 0.002)
}

fn fm_bass(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let index = 3.0 * libm::expf(-t / 0.08);
    let tone = fm(state, freq, 1.0, index);
    let sub = sine(state.layer(1, freq * 0.5));
    libm::tanhf(1.4 * (0.7 * tone + 0.4 * sub)) * attack_ramp(t, 0.003)
}

fn electric_piano(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let body = fm(state, freq, 1.0, 1.5 * libm::expf(-t / 0.5));
    let tine = sine(state.layer(1, freq * 14.0)) * 0.15 * libm::expf(-t / 0.03);
    (0.85 * body + tine) * attack_ramp(t, 0.002)
}

fn organ(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let total: f32 = DRAWBARS.iter().map(|(_, level)| level).sum();
    let mut sum = 0.0;
    for (i, (ratio, level)) in DRAWBARS.iter().enumerate() {
        sum += sine(state.layer(i, freq * ratio)) * level;
    }
    sum / total * attack_ramp(t, 0.005)
}

fn pluck(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let raw = blep_saw(state.phase, state.phase_increment);
    // Brightness closes quickly after the pick.
    let cutoff = freq + 6000.0 * libm::expf(-t / 0.05);
    let a = lowpass_coefficient(state, cutoff);
    state.one_pole(0, raw, a)
}

fn brass(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let raw = stack(state, freq, 2, 6.0, saw_shape);
    let opening = 1.0 - libm::expf(-t / 0.06);
    let a = lowpass_coefficient(state, freq * (1.0 + 6.0 * opening));
    let filtered = state.one_pole(0, raw, a);
    libm::tanhf(1.5 * filtered) * attack_ramp(t, 0.04)
}

fn acid_bass(state: &mut GeneratorState, freq: f32, t: f32) -> f32 {
    let raw = 0.6 * blep_saw(state.phase, state.phase_increment)
        + 0.4 * blep_pulse(state.phase, 0.5, state.phase_increment);
    let cutoff = 200.0 + 2500.0 * libm::expf(-t / 0.08);
    let f = (2.0 * libm::sinf(PI * cutoff * state.dt())).min(1.0);
    let q = 0.35;
    let [low, band, ..] = state.noise.filter;
    let high = raw - low - q * band;
    let band = band + f * high;
    let low = low + f * band;
    state.noise.filter[0] = low;
    state.noise.filter[1] = band;
    libm::tanhf(1.8 * low)
}

fn vinyl(state: &mut GeneratorState, t: f32) -> f32 {
    let white = state.noise.white();
    let a = lowpass_coefficient(state, 4000.0);
    let hiss = state.one_pole(0, white, a) * 0.12;
    // Sparse crackle impulses ringing out in filter slot 1.
    let chance = state.noise.white() * 0.5 + 0.5;
    let mut crackle = state.noise.filter[1] * 0.5;
    if chance > 0.9992 {
        crackle += state.noise.white() * 0.4;
    }
    state.noise.filter[1] = crackle;
    let rumble = sine(state.layer(0, 30.0)) * 0.03;
    (hiss + crackle + rumble) * attack_ramp(t, 0.02)
}
