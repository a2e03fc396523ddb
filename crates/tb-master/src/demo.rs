//! Built-in demo project used by the CLI.

use tb_ir::{
    arpeggio_code, Clip, DistortionCurve, Envelope, Note, OscillatorType, Pattern, Project,
};

const DRUMS: usize = 0;
const BASS: usize = 1;
const LEAD: usize = 2;
const PAD: usize = 3;

/// A four-channel, eight-bar groove: drums, acid bass, an arpeggiated
/// pulse lead and a side-chained pad.
pub fn demo_project() -> Project {
    let mut project = Project::with_channels(4);
    project.bpm = 124.0;

    let drums = &mut project.channels[DRUMS];
    drums.volume = 0.9;

    let bass = &mut project.channels[BASS];
    bass.oscillator.waveform = OscillatorType::AcidBass;
    bass.volume = 0.7;
    bass.effects.distortion.enabled = true;
    bass.effects.distortion.curve = DistortionCurve::Asymmetric;
    bass.effects.distortion.drive = 3.0;
    bass.effects.distortion.mix = 0.4;

    let lead = &mut project.channels[LEAD];
    lead.oscillator.waveform = OscillatorType::Pulse;
    lead.oscillator.pulse_width = 0.25;
    lead.envelope = Envelope::new(0.005, 0.15, 0.5, 0.1);
    lead.volume = 0.45;
    lead.pan = 0.3;
    lead.effects.delay.enabled = true;
    lead.effects.delay.time = 60.0 / 124.0 * 0.75;

    let pad = &mut project.channels[PAD];
    pad.oscillator.waveform = OscillatorType::WarmPad;
    pad.envelope = Envelope::new(0.4, 0.5, 0.8, 1.0);
    pad.volume = 0.5;
    pad.pan = -0.3;
    pad.effects.chorus.enabled = true;
    pad.effects.reverb.enabled = true;
    pad.effects.reverb.mix = 0.35;
    pad.effects.sidechain.enabled = true;
    pad.effects.sidechain.source = DRUMS;

    let beat = project.add_pattern(drum_pattern());
    let bassline = project.add_pattern(bass_pattern());
    let arp = project.add_pattern(lead_pattern());
    let chords = project.add_pattern(pad_pattern());

    for bar in 0..8 {
        let start = bar as f64 * 4.0;
        project.add_clip(Clip::new(beat, DRUMS, start, 4.0));
        project.add_clip(Clip::new(bassline, BASS, start, 4.0));
        if bar >= 2 {
            project.add_clip(Clip::new(arp, LEAD, start, 4.0));
        }
    }
    project.add_clip(Clip::new(chords, PAD, 0.0, 16.0));
    project.add_clip(Clip::new(chords, PAD, 16.0, 16.0));

    project
}

fn drum_pattern() -> Pattern {
    let mut pattern = Pattern::new("beat", 4.0);
    for step in 0..4 {
        let beat = step as f64;
        pattern.add_note(Note::new(36, beat, 0.5).with_oscillator(OscillatorType::Kick));
        pattern.add_note(
            Note::new(42, beat + 0.5, 0.25)
                .with_oscillator(OscillatorType::HiHatClosed)
                .with_velocity(0.6),
        );
    }
    pattern.add_note(Note::new(38, 1.0, 0.5).with_oscillator(OscillatorType::Snare));
    pattern.add_note(Note::new(39, 3.0, 0.5).with_oscillator(OscillatorType::Clap));
    pattern
}

fn bass_pattern() -> Pattern {
    let mut pattern = Pattern::new("bass", 4.0);
    let line = [36u8, 36, 48, 36, 39, 36, 46, 43];
    for (i, pitch) in line.iter().enumerate() {
        let mut note = Note::new(*pitch, i as f64 * 0.5, 0.4);
        if i == 6 {
            note.slide = -3.0;
        }
        pattern.add_note(note);
    }
    pattern
}

fn lead_pattern() -> Pattern {
    let mut pattern = Pattern::new("arp", 4.0);
    let mut first = Note::new(72, 0.0, 1.5).with_velocity(0.8);
    first.arpeggio = arpeggio_code(3, 7);
    pattern.add_note(first);
    let mut second = Note::new(75, 2.0, 1.5).with_velocity(0.8);
    second.vibrato = 0.3;
    second.fade_out = 0.5;
    pattern.add_note(second);
    pattern
}

fn pad_pattern() -> Pattern {
    let mut pattern = Pattern::new("chords", 16.0);
    let chords: [[u8; 3]; 4] = [[60, 63, 67], [56, 60, 63], [58, 62, 65], [55, 58, 62]];
    for (bar, chord) in chords.iter().enumerate() {
        for pitch in chord {
            let mut note = Note::new(*pitch, bar as f64 * 4.0, 3.75).with_velocity(0.7);
            note.fade_in = 0.5;
            pattern.add_note(note);
        }
    }
    pattern
}
