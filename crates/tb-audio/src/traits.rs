//! Audio output trait and error types.

use tb_engine::Engine;

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
}

/// Trait for audio output backends.
///
/// A backend takes ownership of the [`Engine`] and calls
/// [`Engine::process`] from its real-time callback.
pub trait AudioOutput {
    /// Get the sample rate the device runs at.
    fn sample_rate(&self) -> u32;

    /// Build the stream around `engine` and start playback.
    fn start(&mut self, engine: Engine) -> Result<(), AudioError>;

    /// Stop playback and drop the stream (and the engine with it).
    fn stop(&mut self) -> Result<(), AudioError>;

    fn is_active(&self) -> bool;
}
