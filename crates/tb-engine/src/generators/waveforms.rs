//! Periodic waveforms and LFSR noise, shaped by the channel ADSR.

use tb_ir::OscillatorType;

use super::noise::clocked;
use super::{blep_pulse, blep_saw, sine, GeneratorState};

pub(super) fn generate(kind: OscillatorType, state: &mut GeneratorState) -> f32 {
    let phase = state.phase;
    let dt = state.phase_increment;
    match kind {
        OscillatorType::Sine => sine(phase),
        OscillatorType::Pulse => blep_pulse(phase, state.pulse_width, dt),
        OscillatorType::Sawtooth => blep_saw(phase, dt),
        OscillatorType::Triangle => sloped_triangle(phase, state.triangle_slope),
        OscillatorType::Noise => {
            let mode = state.noise_mode;
            let noise = &mut state.noise;
            clocked(&mut noise.lfsr, &mut noise.clock, dt, mode)
        }
        _ => 0.0,
    }
}

/// Triangle rising over `slope` of the cycle and falling over the rest.
#[inline]
fn sloped_triangle(phase: f32, slope: f32) -> f32 {
    if phase < slope {
        -1.0 + 2.0 * phase / slope
    } else {
        1.0 - 2.0 * (phase - slope) / (1.0 - slope)
    }
}
