//! End-to-end render through the public controller and engine APIs.

use tb_engine::{Engine, EngineConfig};
use tb_ir::{Clip, Command, Note, OscillatorType, Pattern, Project};
use tb_master::Controller;

const SAMPLE_RATE: u32 = 44100;

/// One pulse channel at 120 bpm, one A-4 at beat 0 lasting one beat.
fn single_note_project() -> Project {
    let mut project = Project::with_channels(1);
    project.bpm = 120.0;
    project.channels[0].oscillator.waveform = OscillatorType::Pulse;
    let mut pattern = Pattern::new("one", 4.0);
    pattern.add_note(Note::new(69, 0.0, 1.0));
    let idx = project.add_pattern(pattern);
    project.add_clip(Clip::new(idx, 0, 0.0, 4.0));
    project
}

fn window_peak(samples: &[f32], from_s: f32, to_s: f32) -> f32 {
    let from = (from_s * SAMPLE_RATE as f32) as usize;
    let to = ((to_s * SAMPLE_RATE as f32) as usize).min(samples.len());
    samples[from..to].iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn single_note_sounds_then_releases_to_silence() {
    let config = EngineConfig { sample_rate: SAMPLE_RATE, ..EngineConfig::default() };
    let (mut engine, mut tx) = Engine::new(config);
    engine.set_project(single_note_project());
    assert!(tx.push(Command::Play));

    let total = SAMPLE_RATE as usize * 2;
    let mut left = vec![0.0f32; total];
    let mut right = vec![0.0f32; total];
    for (l, r) in left.chunks_mut(256).zip(right.chunks_mut(256)) {
        let n = l.len();
        engine.process(l, r, n);
    }

    // Sounding for the held beat (0.5 s at 120 bpm).
    for step in 0..9 {
        let t = 0.02 + step as f32 * 0.05;
        assert!(window_peak(&left, t, t + 0.02) > 0.05, "silent near {} s", t);
    }
    // Default release is 0.2 s; everything is quiet well after it.
    assert_eq!(window_peak(&left, 0.9, 2.0), 0.0);
    assert_eq!(window_peak(&right, 0.9, 2.0), 0.0);
    assert!(left.iter().chain(&right).all(|s| s.is_finite() && s.abs() <= 1.0));
}

#[test]
fn centered_channel_is_balanced() {
    let ctl = Controller::with_project(single_note_project());
    let frames = ctl.render_frames(SAMPLE_RATE, SAMPLE_RATE as usize);
    for f in &frames {
        approx::assert_abs_diff_eq!(f.left, f.right, epsilon = 1e-6);
    }
}

#[test]
fn controller_render_matches_arrangement_length() {
    let ctl = Controller::with_project(single_note_project());
    let frames = ctl.render_frames(SAMPLE_RATE, usize::MAX);
    let expected = ((2.0 + tb_master::RENDER_TAIL_SECONDS) * SAMPLE_RATE as f64).ceil() as usize;
    assert_eq!(frames.len(), expected);
    assert!(frames[..SAMPLE_RATE as usize / 2].iter().any(|f| f.peak() > 0.05));
    assert!(frames[SAMPLE_RATE as usize..].iter().all(|f| f.peak() == 0.0));
}

#[test]
fn demo_project_renders_audible_and_bounded() {
    let ctl = Controller::with_project(tb_master::demo_project());
    let frames = ctl.render_frames(22050, 22050 * 4);
    assert_eq!(frames.len(), 22050 * 4);
    assert!(frames.iter().any(|f| f.peak() > 0.1));
    assert!(frames.iter().all(|f| f.left.is_finite() && f.right.abs() <= 1.0));
}
