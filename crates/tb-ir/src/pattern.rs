//! Notes and patterns.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::oscillator::OscillatorType;

/// A note placed in a pattern. All times are in beats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Note {
    /// MIDI note number (60 = C-4).
    pub pitch: u8,
    /// Velocity (0.0-1.0).
    pub velocity: f32,
    /// Start position within the pattern, in beats.
    pub start: f64,
    /// Length in beats.
    pub duration: f64,
    /// Oscillator override; `None` uses the channel's waveform.
    pub oscillator: Option<OscillatorType>,
    /// Fade-in length in beats.
    pub fade_in: f64,
    /// Fade-out length in beats, measured back from the note end.
    pub fade_out: f64,
    /// Arpeggio code `0xXY`: X and Y are semitone offsets. 0 = off.
    pub arpeggio: u8,
    /// Vibrato depth in semitones.
    pub vibrato: f32,
    /// Portamento amount in semitones, gliding away from the note pitch.
    pub slide: f32,
}

impl Note {
    /// Create a plain note with full velocity and no modulation.
    pub fn new(pitch: u8, start: f64, duration: f64) -> Self {
        Self {
            pitch,
            velocity: 1.0,
            start,
            duration,
            oscillator: None,
            fade_in: 0.0,
            fade_out: 0.0,
            arpeggio: 0,
            vibrato: 0.0,
            slide: 0.0,
        }
    }

    /// Builder: set velocity.
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity.clamp(0.0, 1.0);
        self
    }

    /// Builder: override the oscillator type.
    pub fn with_oscillator(mut self, oscillator: OscillatorType) -> Self {
        self.oscillator = Some(oscillator);
        self
    }

    /// End position within the pattern, in beats.
    pub fn end(&self) -> f64 {
        self.start + self.duration.max(0.0)
    }
}

/// Pack two semitone offsets into an arpeggio code.
pub const fn arpeggio_code(first: u8, second: u8) -> u8 {
    ((first & 0x0F) << 4) | (second & 0x0F)
}

/// Unpack an arpeggio code into its two semitone offsets.
pub const fn arpeggio_offsets(code: u8) -> (u8, u8) {
    (code >> 4, code & 0x0F)
}

/// A named collection of notes with a fixed length.
#[derive(Clone, Debug)]
pub struct Pattern {
    /// Display name.
    pub name: ArrayString<32>,
    /// Notes in placement order.
    pub notes: Vec<Note>,
    /// Pattern length in beats.
    pub length: f64,
}

impl Pattern {
    /// Create an empty pattern of the given length.
    pub fn new(name: &str, length: f64) -> Self {
        let mut pattern_name = ArrayString::new();
        let _ = pattern_name.try_push_str(name);
        Self { name: pattern_name, notes: Vec::new(), length: length.max(0.0) }
    }

    /// Append a note, returning its index.
    pub fn add_note(&mut self, note: Note) -> usize {
        self.notes.push(note);
        self.notes.len() - 1
    }

    /// End of the latest-ending note, in beats (0 when empty).
    pub fn last_note_end(&self) -> f64 {
        self.notes.iter().map(Note::end).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arpeggio_code_roundtrip() {
        let code = arpeggio_code(4, 7);
        assert_eq!(code, 0x47);
        assert_eq!(arpeggio_offsets(code), (4, 7));
    }

    #[test]
    fn note_end_ignores_negative_duration() {
        let note = Note::new(60, 2.0, -1.0);
        assert_eq!(note.end(), 2.0);
    }

    #[test]
    fn pattern_name_truncates_silently() {
        let long = "a-very-long-pattern-name-that-exceeds-thirty-two-bytes";
        let pat = Pattern::new(long, 4.0);
        assert!(pat.name.is_empty() || pat.name.len() <= 32);
    }

    #[test]
    fn last_note_end_is_latest() {
        let mut pat = Pattern::new("p", 4.0);
        pat.add_note(Note::new(60, 0.0, 1.0));
        pat.add_note(Note::new(62, 2.0, 1.5));
        pat.add_note(Note::new(64, 1.0, 0.5));
        assert_eq!(pat.last_note_end(), 3.5);
    }

    #[test]
    fn velocity_builder_clamps() {
        assert_eq!(Note::new(60, 0.0, 1.0).with_velocity(3.0).velocity, 1.0);
    }
}
