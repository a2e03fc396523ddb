//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use tb_engine::Engine;

use crate::traits::{AudioError, AudioOutput};

/// CPAL-based audio output.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl CpalOutput {
    /// Open the default output device.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // Force stereo output; extra device channels are zero-filled anyway
        config.channels = 2;

        tracing::info!(
            host = host.id().name(),
            sample_rate = config.sample_rate.0,
            "audio device opened"
        );

        Ok(Self { device, config, stream: None })
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

/// Fill an interleaved device buffer from the engine.
///
/// `left`/`right` are preallocated scratch slices; the device buffer is
/// rendered in chunks of their length. Channels past the second are zeroed.
pub fn render_interleaved(
    engine: &mut Engine,
    left: &mut [f32],
    right: &mut [f32],
    data: &mut [f32],
    channels: usize,
) {
    let chunk_frames = left.len().min(right.len());
    if channels == 0 || chunk_frames == 0 {
        data.fill(0.0);
        return;
    }

    for block in data.chunks_mut(chunk_frames * channels) {
        let frames = block.len() / channels;
        engine.process(left, right, frames);
        for (i, frame) in block.chunks_mut(channels).enumerate() {
            let (l, r) = if i < frames { (left[i], right[i]) } else { (0.0, 0.0) };
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = match ch {
                    0 => l,
                    1 => r,
                    _ => 0.0,
                };
            }
        }
    }
}

/// Retune `engine` to the device rate when the two differ. Allocates.
pub(crate) fn adopt_device_rate(engine: &mut Engine, sample_rate: u32) {
    if engine.sample_rate() != sample_rate as f32 {
        tracing::info!(from = engine.sample_rate(), to = sample_rate, "resampling engine to device rate");
        engine.set_sample_rate(sample_rate);
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self, mut engine: Engine) -> Result<(), AudioError> {
        self.stream = None;
        adopt_device_rate(&mut engine, self.config.sample_rate.0);
        let channels = self.config.channels as usize;
        let mut left = vec![0.0f32; engine.max_block()];
        let mut right = vec![0.0f32; engine.max_block()];

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render_interleaved(&mut engine, &mut left, &mut right, data, channels);
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        tracing::info!(channels, sample_rate = self.config.sample_rate.0, "output stream started");
        self.stream = Some(stream);

        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.take() {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
            tracing::info!("output stream stopped");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}
