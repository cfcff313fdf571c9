//! # Audio Capture Module
//!
//! Live microphone capture through CPAL. The input callback slices the device
//! stream into fixed-size mono frames and hands them to the analysis thread
//! over a bounded channel, dropping frames when the analysis side falls
//! behind.

use anyhow::{Context, Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use log::{info, warn};

/// Starts audio capture from the default input device.
///
/// Frames of exactly `frame_size` samples are sent on `sender`. Multi-channel
/// devices are downmixed to mono by averaging.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - the running stream (stops when dropped) and
///   the sample rate actually in use
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    frame_size: usize,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("using audio input device: {}", device.name()?);

    let configs = device
        .supported_input_configs()
        .context("querying input configs")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let channels = config.channels() as usize;
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    info!("capturing {} channel(s) at {} Hz, {} samples per frame", channels, sample_rate, frame_size);

    let err_fn = |err| warn!("audio stream error: {}", err);

    // Accumulates mono samples between callbacks.
    let mut pending = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if channels == 1 {
                pending.extend_from_slice(data);
            } else {
                pending.extend(
                    data.chunks_exact(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }

            while pending.len() >= frame_size {
                let frame = pending[..frame_size].to_vec();
                // Full channel: the analysis thread is behind, drop this frame
                let _ = sender.try_send(frame);
                pending.drain(..frame_size);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the f32 input configuration whose rate range is closest to
/// `target_rate`, preferring mono.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_miss = if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate) {
                0
            } else {
                let min_diff = c.min_sample_rate().0.abs_diff(target_rate);
                let max_diff = c.max_sample_rate().0.abs_diff(target_rate);
                min_diff.min(max_diff)
            };
            (rate_miss, c.channels())
        })
}
