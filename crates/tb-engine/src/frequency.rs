//! Pitch conversion helpers.
//!
//! Converts MIDI note numbers, cent and semitone offsets into frequencies
//! and per-sample phase increments.

use libm::exp2f;

/// MIDI note number of A-4.
pub const A4_NOTE: u8 = 69;

/// Frequency of A-4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Convert a MIDI note to a frequency: `440 * 2^((note - 69) / 12)`.
pub fn note_to_frequency(note: u8) -> f32 {
    A4_FREQUENCY * semitones_to_ratio(note as f32 - A4_NOTE as f32)
}

/// Frequency ratio for a pitch offset in semitones.
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Frequency ratio for a pitch offset in cents.
pub fn cents_to_ratio(cents: f32) -> f32 {
    exp2f(cents / 1200.0)
}

/// Phase increment (cycles per sample) for a frequency.
pub fn frequency_to_increment(frequency: f32, sample_rate: f32) -> f32 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    frequency / sample_rate
}
