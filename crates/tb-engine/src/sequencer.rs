//! Sequencer: beat clock, note scheduling and the per-sample mix.
//!
//! Each sample the beat clock advances by `bpm / 60 / sample_rate` and the
//! half-open interval `[previous, current)` is scanned for note starts and
//! ends; note-offs fire before note-ons. In arrangement mode notes come from
//! the project's clips. In pattern preview mode a single pattern repeats and
//! swing and humanize are applied.
//!
//! The mix runs in three passes per sample: every channel renders through
//! its pre-sidechain effects, then sidechained channels duck against their
//! source's pass-one level and finish their chain, then the pan law,
//! mute/solo and master soft clip produce the output frame.

use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tb_ir::{ChannelConfig, Clip, Note, OscillatorType, Pattern, PatternPreview, Project};

use crate::frame::Frame;
use crate::mixer::{is_audible, master, pan_gains};
use crate::synth::Synthesizer;
use crate::voice::NoteTrigger;

/// Maximum humanize start offset in beats at full amount.
pub const HUMANIZE_TIMING: f64 = 0.03;
/// Maximum humanize velocity offset at full amount.
pub const HUMANIZE_VELOCITY: f32 = 0.15;

/// Transport state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackState {
    pub playing: bool,
    pub looping: bool,
    /// Loop start in beats.
    pub loop_start: f64,
    /// Loop end in beats.
    pub loop_end: f64,
    /// Playback position in beats.
    pub current_beat: f64,
    /// Playback position in seconds.
    pub current_time: f64,
}

impl PlaybackState {
    /// Loop bounds, when looping over a non-empty range.
    fn active_loop(&self) -> Option<(f64, f64)> {
        (self.looping && self.loop_end > self.loop_start).then_some((self.loop_start, self.loop_end))
    }
}

/// Offset applied to a note in the second half of each `2 * grid` period.
pub fn swing_offset(start: f64, swing: f32, grid: f64) -> f64 {
    if grid <= 0.0 || swing <= 0.0 {
        return 0.0;
    }
    let position = start.rem_euclid(2.0 * grid);
    if position >= grid {
        swing.clamp(0.0, 1.0) as f64 * grid / 3.0
    } else {
        0.0
    }
}

/// Deterministic jitter in [-1, 1] for timing and velocity of one note.
///
/// Each (channel, note, pattern cycle) gets its own draw from a generator
/// seeded by the project seed, so repeated renders are identical and
/// channels vary independently.
pub fn humanize_jitter(seed: u64, channel: usize, note: usize, cycle: u64) -> (f64, f32) {
    let key = seed
        ^ (channel as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (note as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ cycle.wrapping_mul(0x1656_67B1_9E37_79F9);
    let mut rng = SmallRng::seed_from_u64(key);
    (rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0f32..=1.0))
}

/// A note's start and velocity after swing and humanize, in pattern beats.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    start: f64,
    velocity: f32,
}

pub struct Sequencer {
    project: Option<Project>,
    synths: Vec<Synthesizer>,
    /// Pass-one output per channel.
    dry: Vec<Frame>,
    playback: PlaybackState,
    preview: Option<PatternPreview>,
    bpm: f64,
    master_volume: f32,
    sample_rate: f32,
    /// Seconds since the engine started; stamps voice start times.
    clock: f64,
}

impl Sequencer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            project: None,
            synths: Vec::new(),
            dry: Vec::new(),
            playback: PlaybackState::default(),
            preview: None,
            bpm: 120.0,
            master_volume: 0.8,
            sample_rate,
            clock: 0.0,
        }
    }

    /// Install a project and build one synthesizer per channel. Allocates.
    pub fn set_project(&mut self, project: Project) {
        self.synths = project
            .channels
            .iter()
            .enumerate()
            .map(|(i, config)| {
                let mut synth = Synthesizer::new(self.sample_rate, 0xC0FF_EE00 + i as u64);
                synth.configure(config);
                synth
            })
            .collect();
        self.dry = alloc::vec![Frame::silence(); self.synths.len()];
        self.bpm = project.bpm;
        self.master_volume = project.master_volume;
        self.project = Some(project);
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn preview(&self) -> Option<PatternPreview> {
        self.preview
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.synths.len()
    }

    pub fn synth(&self, channel: usize) -> Option<&Synthesizer> {
        self.synths.get(channel)
    }

    pub fn synth_mut(&mut self, channel: usize) -> Option<&mut Synthesizer> {
        self.synths.get_mut(channel)
    }

    fn seconds_per_beat(&self) -> f64 {
        if self.bpm > 0.0 {
            60.0 / self.bpm
        } else {
            0.0
        }
    }

    // === Transport ===

    pub fn play(&mut self) {
        if self.project.is_some() {
            self.playback.playing = true;
        }
    }

    /// Stop advancing, keep the position.
    pub fn pause(&mut self) {
        self.playback.playing = false;
        self.all_notes_off();
    }

    /// Stop and rewind to the loop start (or 0).
    pub fn stop(&mut self) {
        self.playback.playing = false;
        self.rewind();
        self.all_notes_off();
    }

    fn rewind(&mut self) {
        let start = if self.playback.looping { self.playback.loop_start } else { 0.0 };
        self.playback.current_beat = start;
        self.playback.current_time = start * self.seconds_per_beat();
    }

    pub fn set_position(&mut self, beat: f64) {
        if !beat.is_finite() {
            return;
        }
        let beat = beat.max(0.0);
        self.playback.current_beat = beat;
        self.playback.current_time = beat * self.seconds_per_beat();
        self.all_notes_off();
    }

    pub fn set_loop(&mut self, enabled: bool, start: f64, end: f64) {
        if !(start.is_finite() && end.is_finite()) {
            return;
        }
        let start = start.max(0.0);
        self.playback.looping = enabled;
        self.playback.loop_start = start;
        self.playback.loop_end = end.max(start);
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            self.bpm = bpm;
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Switch between arrangement playback and looping one pattern.
    pub fn set_preview(&mut self, preview: Option<PatternPreview>) {
        self.preview = preview;
        self.all_notes_off();
    }

    // === Live notes ===

    pub fn note_on(&mut self, channel: usize, note: u8, velocity: f32) {
        let trigger = NoteTrigger::new(note, velocity, self.clock);
        if let Some(synth) = self.synths.get_mut(channel) {
            synth.note_on(&trigger);
        }
    }

    pub fn note_off(&mut self, channel: usize, note: u8) {
        if let Some(synth) = self.synths.get_mut(channel) {
            synth.note_off(note);
        }
    }

    /// One-shot note of a given type that releases itself after `duration` seconds.
    pub fn preview_sound(&mut self, channel: usize, note: u8, oscillator: OscillatorType, duration: f32) {
        let trigger = NoteTrigger::new(note, 1.0, self.clock).with_oscillator(oscillator).with_duration(duration);
        if let Some(synth) = self.synths.get_mut(channel) {
            synth.note_on(&trigger);
        }
    }

    pub fn all_notes_off(&mut self) {
        self.synths.iter_mut().for_each(Synthesizer::all_notes_off);
    }

    /// Cut every voice and clear every effect tail.
    pub fn all_sound_off(&mut self) {
        self.synths.iter_mut().for_each(Synthesizer::reset);
    }

    /// Rebuild every channel for a new rate. Allocates.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.synths.iter_mut().for_each(|synth| synth.set_sample_rate(sample_rate));
    }

    pub fn sync_channel(&mut self, channel: usize, config: &ChannelConfig) {
        if let Some(synth) = self.synths.get_mut(channel) {
            synth.configure(config);
        }
        if let Some(stored) = self.project.as_mut().and_then(|p| p.channels.get_mut(channel)) {
            *stored = *config;
        }
    }

    // === Per-sample processing ===

    /// Advance one sample and return the mixed output frame.
    #[inline]
    pub fn tick(&mut self) -> Frame {
        let dt = 1.0 / self.sample_rate as f64;
        if self.project.is_none() {
            self.clock += dt;
            return Frame::silence();
        }
        if self.playback.playing {
            self.advance(dt);
        }
        let out = self.mix();
        self.clock += dt;
        out
    }

    fn advance(&mut self, dt: f64) {
        let beats_per_sample = self.bpm / 60.0 * dt;
        let prev = self.playback.current_beat;
        let next = prev + beats_per_sample;
        self.playback.current_time += dt;

        let Some(end) = self.scan(prev, next) else {
            // The previewed pattern is gone.
            self.playback.playing = false;
            self.all_notes_off();
            return;
        };
        if next < end {
            self.playback.current_beat = next;
            return;
        }

        self.all_notes_off();
        match self.playback.active_loop() {
            Some((loop_start, _)) => {
                // Carry the overshoot so the loop keeps sample-accurate length.
                let wrapped = loop_start + (next - end).rem_euclid(end - loop_start);
                self.scan(loop_start, wrapped);
                self.playback.current_beat = wrapped;
                self.playback.current_time = wrapped * self.seconds_per_beat();
            }
            None => {
                self.playback.playing = false;
                self.rewind();
            }
        }
    }

    /// Fire note events in `[from, to)`, clamped to the current end, and
    /// return that end. `None` when the previewed pattern does not exist.
    fn scan(&mut self, from: f64, to: f64) -> Option<f64> {
        let project = self.project.as_ref()?;
        let spb = self.seconds_per_beat();
        let synths = &mut self.synths;
        let clock = self.clock;

        match self.preview {
            Some(preview) => {
                let pattern = project.patterns.get(preview.pattern).filter(|p| p.length > 0.0)?;
                let scan = PreviewScan { project, preview, length: pattern.length, notes: &pattern.notes };
                let end = self.playback.loop_end.max(pattern.last_note_end());
                scan.run(synths, from, to.min(end), spb, clock);
                Some(end)
            }
            None => {
                let end = match self.playback.active_loop() {
                    Some((_, loop_end)) => loop_end,
                    None => project.arrangement_end(),
                };
                scan_arrangement(project, synths, from, to.min(end), spb, clock);
                Some(end)
            }
        }
    }

    fn mix(&mut self) -> Frame {
        for (synth, dry) in self.synths.iter_mut().zip(self.dry.iter_mut()) {
            *dry = synth.render_pre();
        }
        let any_solo = self.synths.iter().any(|s| s.config().solo);
        let mut acc = Frame::silence();
        for (i, synth) in self.synths.iter_mut().enumerate() {
            let key = synth
                .sidechain_source()
                .filter(|&source| source != i)
                .and_then(|source| self.dry.get(source))
                .map_or(0.0, |frame| frame.peak());
            let frame = synth.render_post(self.dry[i], key);
            let config = synth.config();
            if is_audible(config, any_solo) {
                let (left, right) = pan_gains(config.volume, config.pan);
                acc += frame.scale(left, right);
            }
        }
        master(acc, self.master_volume)
    }
}

#[inline]
fn within(beat: f64, from: f64, to: f64) -> bool {
    from <= beat && beat < to
}

fn trigger_for(note: &Note, velocity: f32, start: f64, end: f64, spb: f64, clock: f64) -> NoteTrigger {
    NoteTrigger {
        note: note.pitch,
        velocity,
        time: clock,
        fade_in: (note.fade_in * spb) as f32,
        fade_out: (note.fade_out * spb) as f32,
        duration: ((end - start).max(0.0) * spb) as f32,
        oscillator: note.oscillator,
        vibrato: note.vibrato,
        arpeggio: note.arpeggio,
        slide: note.slide,
    }
}

/// Clips whose pattern exists, paired with that pattern.
fn clip_patterns(project: &Project) -> impl Iterator<Item = (&Clip, &Pattern)> {
    project.clips.iter().filter_map(move |clip| Some((clip, project.patterns.get(clip.pattern)?)))
}

/// Notes that can sound: non-negative start, positive length, inside `length`.
#[inline]
fn playable(note: &Note, length: f64) -> bool {
    note.start >= 0.0 && note.start < length && note.duration > 0.0
}

/// Fire every clip note starting or ending in `[from, to)`.
///
/// Notes starting past the clip length are skipped and note ends are
/// clamped to the clip end. Clips naming a missing pattern or channel are
/// ignored.
fn scan_arrangement(project: &Project, synths: &mut [Synthesizer], from: f64, to: f64, spb: f64, clock: f64) {
    if to <= from {
        return;
    }
    for (clip, pattern) in clip_patterns(project) {
        let Some(synth) = synths.get_mut(clip.channel) else {
            continue;
        };
        for note in pattern.notes.iter().filter(|n| playable(n, clip.length)) {
            let end = clip.start + note.end().min(clip.length);
            if within(end, from, to) {
                synth.note_off(note.pitch);
            }
        }
    }
    for (clip, pattern) in clip_patterns(project) {
        let Some(synth) = synths.get_mut(clip.channel) else {
            continue;
        };
        for note in pattern.notes.iter().filter(|n| playable(n, clip.length)) {
            let start = clip.start + note.start;
            if within(start, from, to) {
                let end = clip.start + note.end().min(clip.length);
                synth.note_on(&trigger_for(note, note.velocity, start, end, spb, clock));
            }
        }
    }
}

/// One pattern looping on one channel, with swing and humanize.
struct PreviewScan<'a> {
    project: &'a Project,
    preview: PatternPreview,
    length: f64,
    notes: &'a [Note],
}

impl PreviewScan<'_> {
    /// Scan absolute beats `[from, to)`, splitting where the pattern wraps.
    fn run(&self, synths: &mut [Synthesizer], from: f64, to: f64, spb: f64, clock: f64) {
        let mut from = from;
        while from < to {
            let cycle = libm::floor(from / self.length);
            let offset = cycle * self.length;
            let until = to.min(offset + self.length);
            if until <= from {
                break;
            }
            self.scan(synths, from - offset, until - offset, cycle as u64, spb, clock);
            from = until;
        }
    }

    /// Swing offset for a note. Moves both ends.
    fn swing(&self, note: &Note) -> f64 {
        swing_offset(note.start, self.project.swing, self.project.swing_grid)
    }

    /// Pattern-relative end of a note. Humanize never moves ends, so this
    /// does not depend on the cycle.
    fn end_of(&self, note: &Note) -> f64 {
        (note.end() + self.swing(note)).rem_euclid(self.length)
    }

    /// Pattern-relative placement of a note in a given cycle.
    ///
    /// Swing moves the whole note. Humanize moves only the start (kept
    /// before the end) and the velocity.
    fn place(&self, index: usize, note: &Note, cycle: u64) -> Placement {
        let project = self.project;
        let swing = self.swing(note);
        let mut start = note.start + swing;
        let end = note.end() + swing;
        let mut velocity = note.velocity;
        let amount = project.humanize.clamp(0.0, 1.0);
        if amount > 0.0 {
            let (timing, vel) = humanize_jitter(project.humanize_seed, self.preview.channel, index, cycle);
            let latest = (end - 1e-3).max(start);
            start = (start + timing * HUMANIZE_TIMING * amount as f64).clamp(0.0, latest);
            velocity = (velocity + vel * HUMANIZE_VELOCITY * amount).clamp(0.0, 1.0);
        }
        Placement { start: start.rem_euclid(self.length), velocity }
    }

    /// Scan pattern-relative beats `[from, to)` within one cycle. Each
    /// note's placement is drawn once.
    fn scan(&self, synths: &mut [Synthesizer], from: f64, to: f64, cycle: u64, spb: f64, clock: f64) {
        let Some(synth) = synths.get_mut(self.preview.channel) else {
            return;
        };
        let length = self.length;
        for note in self.notes.iter().filter(|n| playable(n, length)) {
            if within(self.end_of(note), from, to) {
                synth.note_off(note.pitch);
            }
        }
        for (index, note) in self.notes.iter().enumerate().filter(|(_, n)| playable(n, length)) {
            let placed = self.place(index, note, cycle);
            if within(placed.start, from, to) {
                let end = placed.start + note.duration;
                synth.note_on(&trigger_for(note, placed.velocity, placed.start, end, spb, clock));
            }
        }
    }
}
