//! Headless controller for tonebox.
//!
//! Owns the project on the control side, turns API calls into
//! [`Command`]s for the audio context and reads back the engine's
//! published status. Also renders projects offline to WAV.

mod demo;
mod wav;

use std::path::Path;
use std::sync::Arc;

use tb_audio::{AudioError, AudioOutput, CpalOutput};
use tb_engine::{ControlSender, Engine, EngineConfig, SharedState};

// Re-export common types so callers don't need tb-ir/tb-engine directly.
pub use tb_engine::Frame;
pub use tb_ir::{ChannelConfig, Command, OscillatorType, PatternPreview, Project};

pub use demo::demo_project;
pub use wav::{frames_to_wav, write_wav};

/// Release tail rendered after the arrangement ends, in seconds.
pub const RENDER_TAIL_SECONDS: f64 = 2.0;

/// Frames rendered per engine call when rendering offline.
const OFFLINE_BLOCK: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Headless synth controller: owns a project and talks to the engine.
pub struct Controller {
    project: Project,
    link: Option<EngineLink>,
    output: Option<CpalOutput>,
}

/// Control-side ends of a running engine.
struct EngineLink {
    sender: ControlSender,
    shared: Arc<SharedState>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_project(Project::with_channels(4))
    }

    pub fn with_project(project: Project) -> Self {
        Self { project, link: None, output: None }
    }

    // --- Project management ---

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace the project. Any running engine is shut down, because a
    /// project cannot be sent through the control queue.
    pub fn set_project(&mut self, project: Project) {
        self.stop_audio();
        self.project = project;
    }

    // --- Engine lifecycle ---

    /// Build an engine for the current project and keep its control ends.
    ///
    /// The caller drives the returned engine (an audio callback, or a test
    /// loop). A previously connected engine is told to shut down.
    pub fn connect(&mut self, config: EngineConfig) -> Engine {
        self.disconnect();
        let (mut engine, sender) = Engine::new(config);
        engine.set_project(self.project.clone());
        self.link = Some(EngineLink { sender, shared: engine.shared() });
        engine
    }

    /// Open the default audio device and start rendering.
    pub fn start_audio(&mut self) -> Result<(), ControllerError> {
        self.stop_audio();
        let mut output = CpalOutput::new()?;
        let config = EngineConfig { sample_rate: output.sample_rate(), ..EngineConfig::default() };
        let engine = self.connect(config);
        if let Err(e) = output.start(engine) {
            self.disconnect();
            return Err(e.into());
        }
        self.output = Some(output);
        Ok(())
    }

    pub fn stop_audio(&mut self) {
        self.disconnect();
        if let Some(mut output) = self.output.take() {
            if let Err(err) = output.stop() {
                tracing::warn!(%err, "failed to stop audio output");
            }
        }
    }

    pub fn is_audio_running(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.is_active())
    }

    fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            link.shared.request_shutdown();
        }
    }

    /// Enqueue a command. Returns `false` when no engine is connected or
    /// the queue is full.
    pub fn send(&mut self, command: Command) -> bool {
        let Some(link) = self.link.as_mut() else {
            tracing::debug!(?command, "no engine connected, command dropped");
            return false;
        };
        let sent = link.sender.push(command);
        if !sent {
            tracing::warn!(?command, "control queue full, command dropped");
        }
        sent
    }

    // --- Transport ---

    pub fn play(&mut self) -> bool {
        self.send(Command::Play)
    }

    pub fn pause(&mut self) -> bool {
        self.send(Command::Pause)
    }

    pub fn stop(&mut self) -> bool {
        self.send(Command::Stop)
    }

    pub fn set_position(&mut self, beat: f64) -> bool {
        self.send(Command::SetPosition(beat))
    }

    pub fn set_loop(&mut self, enabled: bool, start: f64, end: f64) -> bool {
        self.send(Command::SetLoop { enabled, start, end })
    }

    pub fn set_bpm(&mut self, bpm: f64) -> bool {
        if bpm.is_finite() && bpm > 0.0 {
            self.project.bpm = bpm;
        }
        self.send(Command::SetBpm(bpm))
    }

    pub fn set_master_volume(&mut self, volume: f32) -> bool {
        self.project.master_volume = volume.clamp(0.0, 1.0);
        self.send(Command::SetMasterVolume(volume))
    }

    /// Loop one pattern on one channel, or return to the arrangement with `None`.
    pub fn preview_pattern(&mut self, preview: Option<PatternPreview>) -> bool {
        if let Some(p) = preview {
            if p.pattern >= self.project.patterns.len() || p.channel >= self.project.channels.len() {
                return false;
            }
        }
        self.send(Command::PreviewPattern(preview))
    }

    // --- Live notes ---

    pub fn note_on(&mut self, channel: usize, note: u8, velocity: f32) -> bool {
        self.send(Command::NoteOn { channel, note, velocity: velocity.clamp(0.0, 1.0) })
    }

    pub fn note_off(&mut self, channel: usize, note: u8) -> bool {
        self.send(Command::NoteOff { channel, note })
    }

    /// Audition an oscillator type for `duration` seconds.
    pub fn preview_sound(
        &mut self,
        channel: usize,
        note: u8,
        oscillator: OscillatorType,
        duration: f32,
    ) -> bool {
        self.send(Command::PreviewSound { channel, note, oscillator, duration })
    }

    pub fn all_notes_off(&mut self) -> bool {
        self.send(Command::AllNotesOff)
    }

    /// Cut every voice, drums included, and clear effect tails.
    pub fn all_sound_off(&mut self) -> bool {
        self.send(Command::AllSoundOff)
    }

    pub fn set_frequency(&mut self, channel: usize, hz: f32) -> bool {
        self.send(Command::SetFrequency { channel, hz })
    }

    pub fn set_volume(&mut self, channel: usize, volume: f32) -> bool {
        let volume = volume.clamp(0.0, 1.0);
        if let Some(config) = self.project.channels.get_mut(channel) {
            config.volume = volume;
        }
        self.send(Command::SetVolume { channel, volume })
    }

    pub fn set_waveform(&mut self, channel: usize, waveform: OscillatorType) -> bool {
        if let Some(config) = self.project.channels.get_mut(channel) {
            config.oscillator.waveform = waveform;
        }
        self.send(Command::SetWaveform { channel, waveform })
    }

    // --- Channel configuration ---

    /// Store a channel's configuration and push it to the engine.
    pub fn sync_channel(&mut self, channel: usize, config: ChannelConfig) -> bool {
        let Some(stored) = self.project.channels.get_mut(channel) else {
            return false;
        };
        *stored = config;
        self.send(Command::SyncChannel { channel, config })
    }

    // --- State queries ---

    pub fn is_running(&self) -> bool {
        self.link.as_ref().is_some_and(|l| l.shared.is_running())
    }

    pub fn is_playing(&self) -> bool {
        self.link.as_ref().is_some_and(|l| l.shared.is_playing())
    }

    pub fn current_beat(&self) -> f64 {
        self.link.as_ref().map_or(0.0, |l| l.shared.current_beat())
    }

    /// Fraction of the block duration spent rendering the last block.
    pub fn load(&self) -> f32 {
        self.link.as_ref().map_or(0.0, |l| l.shared.load())
    }

    pub fn last_frequency(&self) -> f32 {
        self.link.as_ref().map_or(0.0, |l| l.shared.last_frequency())
    }

    pub fn last_volume(&self) -> f32 {
        self.link.as_ref().map_or(0.0, |l| l.shared.last_volume())
    }

    pub fn last_waveform(&self) -> Option<OscillatorType> {
        self.link.as_ref().and_then(|l| l.shared.last_waveform())
    }

    // --- Offline rendering ---

    /// Render the arrangement once from the top, plus a release tail.
    pub fn render_frames(&self, sample_rate: u32, max_frames: usize) -> Vec<Frame> {
        let config = EngineConfig { sample_rate, ..EngineConfig::default() };
        let (mut engine, mut sender) = Engine::new(config);
        engine.set_project(self.project.clone());
        sender.push(Command::Play);

        let seconds = self.project.arrangement_end() * self.project.seconds_per_beat();
        let wanted = ((seconds + RENDER_TAIL_SECONDS) * sample_rate as f64).ceil() as usize;
        let total = wanted.min(max_frames);

        let mut left = vec![0.0f32; OFFLINE_BLOCK];
        let mut right = vec![0.0f32; OFFLINE_BLOCK];
        let mut frames = Vec::with_capacity(total);
        while frames.len() < total {
            let n = (total - frames.len()).min(OFFLINE_BLOCK);
            engine.process(&mut left, &mut right, n);
            frames.extend(left[..n].iter().zip(&right[..n]).map(|(l, r)| Frame::new(*l, *r)));
        }
        frames
    }

    pub fn render_to_wav(&self, sample_rate: u32, max_seconds: u32) -> Vec<u8> {
        let max_frames = (sample_rate as usize) * (max_seconds as usize);
        let frames = self.render_frames(sample_rate, max_frames);
        wav::frames_to_wav(&frames, sample_rate)
    }

    pub fn write_wav_file(
        &self,
        path: impl AsRef<Path>,
        sample_rate: u32,
        max_seconds: u32,
    ) -> Result<usize, ControllerError> {
        let max_frames = (sample_rate as usize) * (max_seconds as usize);
        let frames = self.render_frames(sample_rate, max_frames);
        let mut file = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
        wav::write_wav(&mut file, &frames, sample_rate)?;
        tracing::info!(path = %path.as_ref().display(), frames = frames.len(), "wrote wav");
        Ok(frames.len())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop_audio();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_ir::{Clip, Note, Pattern};

    const SR: u32 = 8000;

    fn config(capacity: usize) -> EngineConfig {
        EngineConfig { sample_rate: SR, queue_capacity: capacity, max_block: 256 }
    }

    fn one_note_project() -> Project {
        let mut project = Project::with_channels(1);
        let mut pattern = Pattern::new("p", 4.0);
        pattern.add_note(Note::new(69, 0.0, 1.0));
        let idx = project.add_pattern(pattern);
        project.add_clip(Clip::new(idx, 0, 0.0, 2.0));
        project
    }

    fn run(engine: &mut Engine, frames: usize) -> Vec<f32> {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        engine.process(&mut left, &mut right, frames);
        left
    }

    // --- Command plumbing ---

    #[test]
    fn commands_fail_without_engine() {
        let mut ctl = Controller::with_project(one_note_project());
        assert!(!ctl.play());
        assert!(!ctl.note_on(0, 60, 1.0));
        assert!(!ctl.is_playing());
    }

    #[test]
    fn play_is_visible_after_next_block() {
        let mut ctl = Controller::with_project(one_note_project());
        let mut engine = ctl.connect(config(16));
        assert!(ctl.play());
        assert!(!ctl.is_playing());
        run(&mut engine, 64);
        assert!(ctl.is_running());
        assert!(ctl.is_playing());
        assert!(ctl.current_beat() > 0.0);
    }

    #[test]
    fn full_queue_returns_false() {
        let mut ctl = Controller::with_project(one_note_project());
        let _engine = ctl.connect(config(4));
        assert!(ctl.play());
        assert!(ctl.pause());
        assert!(ctl.stop());
        assert!(!ctl.play());
    }

    #[test]
    fn reconnect_shuts_down_previous_engine() {
        let mut ctl = Controller::with_project(one_note_project());
        let old = ctl.connect(config(16));
        let old_shared = old.shared();
        let _new = ctl.connect(config(16));
        assert!(old_shared.is_shutdown());
    }

    #[test]
    fn sync_channel_updates_project_and_rejects_bad_index() {
        let mut ctl = Controller::with_project(one_note_project());
        let _engine = ctl.connect(config(16));
        let mut cfg = ChannelConfig::default();
        cfg.volume = 0.3;
        assert!(ctl.sync_channel(0, cfg));
        assert_eq!(ctl.project().channels[0].volume, 0.3);
        assert!(!ctl.sync_channel(5, cfg));
    }

    #[test]
    fn preview_pattern_validates_indices() {
        let mut ctl = Controller::with_project(one_note_project());
        let _engine = ctl.connect(config(16));
        assert!(ctl.preview_pattern(Some(PatternPreview { pattern: 0, channel: 0 })));
        assert!(!ctl.preview_pattern(Some(PatternPreview { pattern: 3, channel: 0 })));
        assert!(ctl.preview_pattern(None));
    }

    #[test]
    fn last_values_round_trip() {
        let mut ctl = Controller::with_project(one_note_project());
        let mut engine = ctl.connect(config(16));
        ctl.set_frequency(0, 220.0);
        ctl.set_volume(0, 0.5);
        ctl.set_waveform(0, OscillatorType::Triangle);
        run(&mut engine, 8);
        assert_eq!(ctl.last_frequency(), 220.0);
        assert_eq!(ctl.last_volume(), 0.5);
        assert_eq!(ctl.last_waveform(), Some(OscillatorType::Triangle));
        assert_eq!(ctl.project().channels[0].oscillator.waveform, OscillatorType::Triangle);
    }

    // --- Offline rendering ---

    #[test]
    fn render_covers_arrangement_and_tail() {
        let ctl = Controller::with_project(one_note_project());
        let frames = ctl.render_frames(SR, usize::MAX);
        let expected = ((1.0 + RENDER_TAIL_SECONDS) * SR as f64).ceil() as usize;
        assert_eq!(frames.len(), expected);
        assert!(frames[..SR as usize / 4].iter().any(|f| f.peak() > 0.01));
        assert!(frames[frames.len() - 100..].iter().all(|f| f.peak() == 0.0));
    }

    #[test]
    fn render_respects_max_frames() {
        let ctl = Controller::with_project(one_note_project());
        assert_eq!(ctl.render_frames(SR, 1000).len(), 1000);
    }

    #[test]
    fn render_to_wav_has_header_and_data() {
        let ctl = Controller::with_project(one_note_project());
        let bytes = ctl.render_to_wav(SR, 1);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(bytes.len(), 44 + SR as usize * 4);
    }
}
