//! Offline analysis of WAV files.

use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};

/// A decoded mono signal.
#[derive(Debug)]
pub struct Signal {
    pub sample_rate: u32,
    pub data: Vec<f32>,
}

/// Reads a WAV file into mono `f32` samples in `-1.0..=1.0`.
///
/// Integer formats are scaled by their bit depth; multi-channel files are
/// averaged down to one channel.
pub fn read_wav(path: &Path) -> Result<Signal> {
    let mut reader = WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("decoding float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .context("decoding integer samples")?
        }
    };

    let data = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(Signal {
        sample_rate: spec.sample_rate,
        data,
    })
}

/// Splits `signal` into consecutive, non-overlapping frames of `frame_size`
/// samples. A trailing partial frame is dropped.
pub fn frames(signal: &[f32], frame_size: usize) -> impl Iterator<Item = &[f32]> {
    signal.chunks_exact(frame_size.max(1))
}
