//! tonebox CLI: play the demo project, audition a sound, or export WAV.
//!
//! Usage:
//!   cargo run --bin tb-cli
//!   cargo run --bin tb-cli -- --wav output.wav
//!   cargo run --bin tb-cli -- --sound FmBell [--note 60]
//!   cargo run --bin tb-cli -- --list

use std::env;
use std::io::Write;
use std::time::Duration;

use tb_master::{demo_project, Controller, OscillatorType};

const USAGE: &str = "Usage: tb-cli [--wav output.wav] [--sound <type> [--note N]] [--bpm N] [--list]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }
    if args.iter().any(|a| a == "--list") {
        for kind in OscillatorType::ALL {
            println!("{:<14} {:?}", kind.name(), kind.category());
        }
        return;
    }

    let value_of = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    let mut project = demo_project();
    if let Some(bpm) = value_of("--bpm") {
        project.bpm = bpm.parse().unwrap_or_else(|_| {
            eprintln!("Invalid --bpm value: {}", bpm);
            std::process::exit(1);
        });
    }

    println!("Channels: {}", project.channels.len());
    println!("Patterns: {}", project.patterns.len());
    println!("Clips:    {}", project.clips.len());
    println!("Tempo:    {} BPM, {} beats", project.bpm, project.arrangement_end());
    println!();

    let mut ctrl = Controller::with_project(project);

    if let Some(wav) = value_of("--wav") {
        render_to_wav(&ctrl, &wav);
    } else if let Some(name) = value_of("--sound") {
        let kind = OscillatorType::ALL
            .into_iter()
            .find(|k| normalize(k.name()) == normalize(&name))
            .unwrap_or_else(|| {
                eprintln!("Unknown sound '{}'; try --list", name);
                std::process::exit(1);
            });
        let note = value_of("--note").and_then(|n| n.parse().ok()).unwrap_or(60);
        audition(&mut ctrl, kind, note);
    } else {
        play_audio(&mut ctrl);
    }
}

/// Lowercase with spaces and dashes removed, so "fm-bell" matches "FM Bell".
fn normalize(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect()
}

fn start(ctrl: &mut Controller) {
    if let Err(e) = ctrl.start_audio() {
        eprintln!("Failed to start audio: {}", e);
        std::process::exit(1);
    }
}

fn play_audio(ctrl: &mut Controller) {
    start(ctrl);
    ctrl.play();
    println!("Playing...");
    println!();

    while !ctrl.is_running() {
        std::thread::sleep(Duration::from_millis(5));
    }
    while ctrl.is_playing() {
        print!("\rBeat: {:6.2} | Load: {:5.1}%", ctrl.current_beat(), ctrl.load() * 100.0);
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(20));
    }

    // Let release tails ring out.
    std::thread::sleep(Duration::from_millis(1500));
    ctrl.stop_audio();
    println!("\rDone.                              ");
}

fn audition(ctrl: &mut Controller, kind: OscillatorType, note: u8) {
    start(ctrl);
    let duration = if kind.is_self_decaying() { kind.nominal_decay() * 3.0 } else { 1.0 };
    println!("Sound: {} (note {}, {:.2} s)", kind.name(), note, duration);
    ctrl.preview_sound(0, note, kind, duration);
    std::thread::sleep(Duration::from_secs_f32(duration + 0.5));
    ctrl.stop_audio();
}

fn render_to_wav(ctrl: &Controller, path: &str) {
    let sample_rate: u32 = 44100;
    let max_seconds: u32 = 300;
    println!("Rendering to {} at {} Hz...", path, sample_rate);

    match ctrl.write_wav_file(path, sample_rate, max_seconds) {
        Ok(frames) => println!("Rendered {} frames", frames),
        Err(e) => {
            eprintln!("Failed to write {}: {}", path, e);
            std::process::exit(1);
        }
    }

    println!("Done.");
}
