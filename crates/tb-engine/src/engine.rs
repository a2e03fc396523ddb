//! Audio-context boundary.
//!
//! [`Engine`] owns the sequencer and the consumer half of the control
//! channel. Each call to [`Engine::process`] drains queued commands, renders
//! one block and publishes a few status values through [`SharedState`],
//! which the control context reads without locking.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use tb_ir::{Command, OscillatorType, Project};

use crate::control::{control_channel, ControlReceiver, ControlSender, DEFAULT_CAPACITY};
use crate::sequencer::Sequencer;

/// Commands applied per block; the rest wait for the next block.
pub const MAX_COMMANDS_PER_BLOCK: usize = 256;

/// Engine construction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Control queue slots (one is kept free).
    pub queue_capacity: usize,
    /// Largest block the host is expected to request.
    pub max_block: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { sample_rate: 44100, queue_capacity: DEFAULT_CAPACITY, max_block: 4096 }
    }
}

/// Status values written by the audio context and read by the control context.
#[derive(Debug)]
pub struct SharedState {
    /// Set once the first block has been rendered.
    running: AtomicBool,
    /// Request from the control context to stop applying commands.
    shutdown: AtomicBool,
    /// Render time divided by block duration, as f32 bits.
    load: AtomicU32,
    playing: AtomicBool,
    /// Transport position in beats, as f64 bits.
    current_beat: AtomicU64,
    /// Last frequency set through `SetFrequency`, as f32 bits.
    last_frequency: AtomicU32,
    /// Last volume set through `SetVolume`, as f32 bits.
    last_volume: AtomicU32,
    /// Index into `OscillatorType::ALL` of the last waveform selected.
    last_waveform: AtomicU32,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            load: AtomicU32::new(0f32.to_bits()),
            playing: AtomicBool::new(false),
            current_beat: AtomicU64::new(0f64.to_bits()),
            last_frequency: AtomicU32::new(0f32.to_bits()),
            last_volume: AtomicU32::new(0f32.to_bits()),
            last_waveform: AtomicU32::new(0),
        }
    }
}

impl SharedState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the audio context to discard pending commands and go silent.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.load.load(Ordering::Relaxed))
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn current_beat(&self) -> f64 {
        f64::from_bits(self.current_beat.load(Ordering::Relaxed))
    }

    pub fn last_frequency(&self) -> f32 {
        f32::from_bits(self.last_frequency.load(Ordering::Relaxed))
    }

    pub fn last_volume(&self) -> f32 {
        f32::from_bits(self.last_volume.load(Ordering::Relaxed))
    }

    pub fn last_waveform(&self) -> Option<OscillatorType> {
        OscillatorType::ALL.get(self.last_waveform.load(Ordering::Relaxed) as usize).copied()
    }
}

/// The audio-context half of the engine.
pub struct Engine {
    sequencer: Sequencer,
    receiver: ControlReceiver,
    shared: Arc<SharedState>,
    sample_rate: f32,
    max_block: usize,
}

impl Engine {
    /// Build an engine and the sender that feeds it. Allocates.
    pub fn new(config: EngineConfig) -> (Self, ControlSender) {
        let (sender, receiver) = control_channel(config.queue_capacity);
        (Self::with_receiver(config, receiver), sender)
    }

    /// Build an engine around an existing control receiver.
    pub fn with_receiver(config: EngineConfig, receiver: ControlReceiver) -> Self {
        let sample_rate = config.sample_rate.max(1) as f32;
        Self {
            sequencer: Sequencer::new(sample_rate),
            receiver,
            shared: Arc::new(SharedState::default()),
            sample_rate,
            max_block: config.max_block.max(1),
        }
    }

    /// Install a project. Allocates, so call it before handing the engine
    /// to the audio context.
    pub fn set_project(&mut self, project: Project) {
        self.sequencer.set_project(project);
        self.publish();
    }

    /// Handle to the status values, for the control context.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Switch to a new output rate, rebuilding every delay buffer and
    /// cutting sounding voices. Allocates, so call it before handing the
    /// engine to the audio context.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        let sample_rate = sample_rate.max(1) as f32;
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.sequencer.set_sample_rate(sample_rate);
        }
    }

    /// Scratch size hosts should preallocate per channel.
    pub fn max_block(&self) -> usize {
        self.max_block
    }

    /// Apply one command immediately.
    pub fn apply_command(&mut self, command: Command) {
        let seq = &mut self.sequencer;
        match command {
            Command::SetFrequency { channel, hz } => {
                if let Some(synth) = seq.synth_mut(channel) {
                    synth.set_frequency(hz);
                }
                if hz.is_finite() && hz > 0.0 {
                    self.shared.last_frequency.store(hz.to_bits(), Ordering::Relaxed);
                }
            }
            Command::SetVolume { channel, volume } => {
                let volume = volume.clamp(0.0, 1.0);
                if let Some(synth) = seq.synth_mut(channel) {
                    synth.set_volume(volume);
                }
                self.shared.last_volume.store(volume.to_bits(), Ordering::Relaxed);
            }
            Command::SetWaveform { channel, waveform } => {
                if let Some(synth) = seq.synth_mut(channel) {
                    synth.set_waveform(waveform);
                }
                self.shared.last_waveform.store(waveform.index() as u32, Ordering::Relaxed);
            }
            Command::NoteOn { channel, note, velocity } => seq.note_on(channel, note, velocity),
            Command::NoteOff { channel, note } => seq.note_off(channel, note),
            Command::PreviewSound { channel, note, oscillator, duration } => {
                seq.preview_sound(channel, note, oscillator, duration)
            }
            Command::AllNotesOff => seq.all_notes_off(),
            Command::AllSoundOff => seq.all_sound_off(),
            Command::Play => seq.play(),
            Command::Pause => seq.pause(),
            Command::Stop => seq.stop(),
            Command::SetPosition(beat) => seq.set_position(beat),
            Command::SetLoop { enabled, start, end } => seq.set_loop(enabled, start, end),
            Command::SetBpm(bpm) => seq.set_bpm(bpm),
            Command::SetMasterVolume(volume) => seq.set_master_volume(volume),
            Command::PreviewPattern(preview) => seq.set_preview(preview),
            Command::SyncChannel { channel, config } => seq.sync_channel(channel, &config),
        }
    }

    /// Render `frames` samples into the two output slices.
    ///
    /// Never allocates, locks or blocks. Frames beyond the shorter slice are
    /// not written.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], frames: usize) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.process_block(left, right, frames));
        #[cfg(not(feature = "alloc_check"))]
        self.process_block(left, right, frames);
    }

    fn process_block(&mut self, left: &mut [f32], right: &mut [f32], frames: usize) {
        let frames = frames.min(left.len()).min(right.len());

        if self.shared.is_shutdown() {
            self.receiver.discard_all();
            left[..frames].fill(0.0);
            right[..frames].fill(0.0);
            return;
        }

        #[cfg(feature = "std")]
        let started = std::time::Instant::now();

        for _ in 0..MAX_COMMANDS_PER_BLOCK {
            match self.receiver.pop() {
                Some(command) => self.apply_command(command),
                None => break,
            }
        }

        for (l, r) in left[..frames].iter_mut().zip(right[..frames].iter_mut()) {
            let frame = self.sequencer.tick();
            *l = frame.left;
            *r = frame.right;
        }

        #[cfg(feature = "std")]
        if frames > 0 {
            let block = frames as f32 / self.sample_rate;
            let load = started.elapsed().as_secs_f32() / block;
            self.shared.load.store(load.to_bits(), Ordering::Relaxed);
        }

        self.publish();
        self.shared.running.store(true, Ordering::Release);
    }

    fn publish(&self) {
        let playback = self.sequencer.playback();
        self.shared.playing.store(playback.playing, Ordering::Relaxed);
        self.shared.current_beat.store(playback.current_beat.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_ir::{Clip, Note, Pattern};

    const SR: u32 = 8000;

    fn config() -> EngineConfig {
        EngineConfig { sample_rate: SR, queue_capacity: 16, max_block: 256 }
    }

    fn one_note_project() -> Project {
        let mut project = Project::with_channels(1);
        let mut pattern = Pattern::new("p", 4.0);
        pattern.add_note(Note::new(69, 0.0, 1.0));
        let idx = project.add_pattern(pattern);
        project.add_clip(Clip::new(idx, 0, 0.0, 4.0));
        project
    }

    fn peak(buf: &[f32]) -> f32 {
        buf.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    // === Lifecycle ===

    #[test]
    fn silent_without_project() {
        let (mut engine, mut tx) = Engine::new(config());
        tx.push(Command::Play);
        let mut l = [1.0f32; 64];
        let mut r = [1.0f32; 64];
        engine.process(&mut l, &mut r, 64);
        assert_eq!(peak(&l), 0.0);
        assert_eq!(peak(&r), 0.0);
        assert!(engine.shared().is_running());
        assert!(!engine.shared().is_playing());
    }

    #[test]
    fn play_command_renders_sound_and_publishes_position() {
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(one_note_project());
        let shared = engine.shared();
        assert!(tx.push(Command::Play));

        let mut l = [0.0f32; 256];
        let mut r = [0.0f32; 256];
        engine.process(&mut l, &mut r, 256);

        assert!(peak(&l) > 0.01);
        assert!(shared.is_playing());
        assert!(shared.current_beat() > 0.0);
    }

    #[test]
    fn shutdown_discards_pending_commands() {
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(one_note_project());
        let shared = engine.shared();
        tx.push(Command::Play);
        tx.push(Command::SetBpm(90.0));
        shared.request_shutdown();

        let mut l = [1.0f32; 32];
        let mut r = [1.0f32; 32];
        engine.process(&mut l, &mut r, 32);

        assert_eq!(tx.pending(), 0);
        assert_eq!(peak(&l), 0.0);
        assert!(!shared.is_playing());
    }

    #[test]
    fn at_most_256_commands_per_block() {
        let mut cfg = config();
        cfg.queue_capacity = 512;
        let (mut engine, mut tx) = Engine::new(cfg);
        engine.set_project(one_note_project());
        for _ in 0..300 {
            assert!(tx.push(Command::SetMasterVolume(0.5)));
        }
        let mut l = [0.0f32; 8];
        let mut r = [0.0f32; 8];
        engine.process(&mut l, &mut r, 8);
        assert_eq!(tx.pending(), 300 - MAX_COMMANDS_PER_BLOCK);
        engine.process(&mut l, &mut r, 8);
        assert_eq!(tx.pending(), 0);
    }

    // === Status values ===

    #[test]
    fn last_values_are_published() {
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(one_note_project());
        let shared = engine.shared();
        tx.push(Command::SetFrequency { channel: 0, hz: 330.0 });
        tx.push(Command::SetVolume { channel: 0, volume: 0.25 });
        tx.push(Command::SetWaveform { channel: 0, waveform: OscillatorType::Sawtooth });

        let mut l = [0.0f32; 4];
        let mut r = [0.0f32; 4];
        engine.process(&mut l, &mut r, 4);

        assert_eq!(shared.last_frequency(), 330.0);
        assert_eq!(shared.last_volume(), 0.25);
        assert_eq!(shared.last_waveform(), Some(OscillatorType::Sawtooth));
    }

    #[test]
    fn invalid_channel_is_ignored() {
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(one_note_project());
        tx.push(Command::NoteOn { channel: 9, note: 60, velocity: 1.0 });
        tx.push(Command::SetVolume { channel: 42, volume: 0.1 });
        let mut l = [0.0f32; 16];
        let mut r = [0.0f32; 16];
        engine.process(&mut l, &mut r, 16);
        assert_eq!(peak(&l), 0.0);
    }

    #[test]
    fn short_slices_bound_the_block() {
        let (mut engine, _tx) = Engine::new(config());
        let mut l = [1.0f32; 8];
        let mut r = [1.0f32; 4];
        engine.process(&mut l, &mut r, 64);
        assert_eq!(&l[..4], &[0.0; 4]);
        assert_eq!(&l[4..], &[1.0; 4]);
    }

    #[test]
    fn live_note_sounds_without_transport() {
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(Project::with_channels(2));
        tx.push(Command::NoteOn { channel: 1, note: 60, velocity: 1.0 });
        let mut l = [0.0f32; 128];
        let mut r = [0.0f32; 128];
        engine.process(&mut l, &mut r, 128);
        assert!(peak(&l) > 0.0);
        assert!(!engine.shared().is_playing());
    }

    #[test]
    fn all_sound_off_cuts_drums_and_effect_tails() {
        let mut project = Project::with_channels(1);
        project.channels[0].effects.reverb.enabled = true;
        project.channels[0].effects.reverb.mix = 0.5;
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(project);
        let mut l = [0.0f32; 256];
        let mut r = [0.0f32; 256];

        tx.push(Command::PreviewSound { channel: 0, note: 36, oscillator: OscillatorType::Kick, duration: 0.5 });
        engine.process(&mut l, &mut r, 256);
        tx.push(Command::AllNotesOff);
        engine.process(&mut l, &mut r, 256);
        assert!(peak(&l) > 0.0, "drums ignore all-notes-off");

        tx.push(Command::AllSoundOff);
        engine.process(&mut l, &mut r, 256);
        assert_eq!(peak(&l), 0.0);
        assert_eq!(peak(&r), 0.0);
    }

    // === Sample rate ===

    #[test]
    fn sample_rate_change_retunes_beat_clock() {
        let (mut engine, mut tx) = Engine::new(config());
        engine.set_project(one_note_project());
        engine.set_sample_rate(16000);
        assert_eq!(engine.sample_rate(), 16000.0);
        assert_eq!(engine.sequencer().sample_rate(), 16000.0);

        tx.push(Command::Play);
        let mut l = [0.0f32; 250];
        let mut r = [0.0f32; 250];
        for _ in 0..64 {
            engine.process(&mut l, &mut r, 250);
        }
        // One second at 120 bpm.
        assert!((engine.shared().current_beat() - 2.0).abs() < 1e-6);
    }
}
