//! Synthesized percussion.
//!
//! Each drum derives its pitch sweep and amplitude shape from the voice's
//! elapsed time, rewrites the phase increment every sample, and ends with
//! an amplitude curve that reaches zero at three nominal decay constants.
//! `state.frequency` holds the drum's base pitch and is never modified here.

use core::f32::consts::PI;

use tb_ir::OscillatorType;

use super::{decay_env, sine, wrap, GeneratorState};

/// Inharmonic square-bank ratios for cymbal-like metal.
const METAL_RATIOS: [f32; 6] = [1.0, 1.342, 1.2312, 1.6532, 1.9523, 2.1523];

pub(super) fn generate(kind: OscillatorType, state: &mut GeneratorState) -> f32 {
    let t = state.elapsed;
    let base = state.frequency;
    let body = match kind {
        OscillatorType::Kick => kick(state, t, base, 3.0, 0.03, 1.6),
        OscillatorType::Kick808 => kick(state, t, base, 1.5, 0.05, 2.4),
        OscillatorType::Snare => snare(state, t, base),
        OscillatorType::Clap => clap(state, t, base),
        OscillatorType::HiHatClosed | OscillatorType::HiHatOpen => hat(state, t, base),
        OscillatorType::TomLow | OscillatorType::TomHigh => tom(state, t, base),
        OscillatorType::Rimshot => rimshot(state, t, base),
        OscillatorType::Cowbell => cowbell(state, t, base),
        OscillatorType::Crash => crash(state, t, base),
        OscillatorType::Shaker => shaker(state, t, base),
        _ => 0.0,
    };
    body * decay_env(t, kind.nominal_decay())
}

#[inline]
fn sweep(state: &mut GeneratorState, hz: f32) {
    state.phase_increment = hz * state.dt();
}

#[inline]
fn square(phase: f32) -> f32 {
    if phase < 0.5 {
        1.0
    } else {
        -1.0
    }
}

/// Coefficient for a one-pole low-pass at `hz`.
#[inline]
fn lowpass_coefficient(state: &GeneratorState, hz: f32) -> f32 {
    1.0 - libm::expf(-2.0 * PI * hz * state.dt())
}

/// White noise with the low end removed by a one-pole high-pass.
#[inline]
fn bright_noise(state: &mut GeneratorState, slot: usize, hz: f32) -> f32 {
    let white = state.noise.white();
    let a = lowpass_coefficient(state, hz);
    white - state.one_pole(slot, white, a)
}

/// Inharmonic square bank computed from elapsed time.
fn metal(t: f32, base: f32) -> f32 {
    let sum: f32 = METAL_RATIOS.iter().map(|r| square(wrap(t * base * r * 2.0))).sum();
    sum / METAL_RATIOS.len() as f32
}

fn kick(state: &mut GeneratorState, t: f32, base: f32, sweep_depth: f32, sweep_time: f32, drive: f32) -> f32 {
    sweep(state, base * (1.0 + sweep_depth * libm::expf(-t / sweep_time)));
    let tone = sine(state.phase);
    let click = state.noise.white() * decay_env(t, 0.003) * 0.3;
    libm::tanhf((tone + click) * drive) / libm::tanhf(drive)
}

fn snare(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base * (1.0 + 0.5 * libm::expf(-t / 0.01)));
    let tone = sine(state.phase) * decay_env(t, 0.05);
    let rattle = bright_noise(state, 0, 1500.0);
    libm::tanhf(0.5 * tone + 0.7 * rattle)
}

fn clap(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base);
    // Three short bursts then a diffuse tail.
    let mut env = 0.0f32;
    for offset in [0.0, 0.011, 0.022] {
        if t >= offset {
            env = env.max(decay_env(t - offset, 0.006));
        }
    }
    let tail = if t >= 0.022 { 0.6 * decay_env(t - 0.022, 0.06) } else { 0.0 };
    let white = state.noise.white();
    // Band-limit around the base pitch with a state-variable filter.
    let f = (2.0 * libm::sinf(PI * base * state.dt())).min(1.0);
    let [low, band, ..] = state.noise.filter;
    let high = white - low - band;
    let band = band + f * high;
    let low = low + f * band;
    state.noise.filter[0] = low;
    state.noise.filter[1] = band;
    libm::tanhf(band * 1.5 * env.max(tail))
}

fn hat(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base);
    let tone = metal(t, base);
    let hiss = bright_noise(state, 0, 6000.0);
    let mixed = 0.5 * tone + 0.5 * hiss;
    let a = lowpass_coefficient(state, 7000.0);
    let shaped = mixed - state.one_pole(1, mixed, a);
    libm::tanhf(shaped * 1.4)
}

fn tom(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base * (1.0 + 0.6 * libm::expf(-t / 0.04)));
    let tone = sine(state.phase);
    let skin = state.noise.white() * decay_env(t, 0.01) * 0.2;
    libm::tanhf((tone + skin) * 1.3)
}

fn rimshot(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base);
    let body = 0.6 * square(state.phase) + 0.4 * sine(wrap(t * base * 3.55));
    let click = bright_noise(state, 0, 2000.0) * decay_env(t, 0.004);
    libm::tanhf(0.7 * body + 0.5 * click)
}

fn cowbell(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base);
    let pair = 0.5 * square(state.phase) + 0.5 * square(wrap(t * base * 1.48));
    let a = lowpass_coefficient(state, 2500.0);
    let filtered = state.one_pole(0, pair, a);
    let strike = 0.4 + 0.6 * decay_env(t, 0.02);
    libm::tanhf(filtered * strike * 1.5)
}

fn crash(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base);
    let tone = metal(t, base * 1.7);
    let wash = bright_noise(state, 0, 4000.0);
    let attack = 0.6 + 0.4 * decay_env(t, 0.05);
    libm::tanhf((0.35 * tone + 0.65 * wash) * attack * 1.2)
}

fn shaker(state: &mut GeneratorState, t: f32, base: f32) -> f32 {
    sweep(state, base);
    let grains = bright_noise(state, 0, base);
    let a = lowpass_coefficient(state, base * 3.0);
    let band = state.one_pole(1, grains, a);
    let swell = super::attack_ramp(t, 0.01);
    libm::tanhf(band * swell * 1.8)
}
