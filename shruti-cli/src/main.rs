//! # shruti - Carnatic shruti detector
//!
//! Feeds audio through a [`ShrutiDetector`] and prints one JSON line per
//! detection on stdout. Logs go to stderr (`RUST_LOG` controls verbosity).
//!
//! ## Modes
//! - **Live** (default, needs the `capture` feature): listens on the default
//!   input device. A dedicated audio thread captures and analyses frames
//!   while the main thread reads control commands from stdin
//!   (`tonic <hz>`, `raga`, `history`, `quit`).
//! - **Offline** (`--wav <file>`): analyses a WAV file frame by frame.

#[cfg(feature = "capture")]
mod audio;
mod commands;
mod offline;
mod record;

use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use shruti_core::{DetectionSummary, DetectorConfig, SharedDetector, ShrutiDetector};

use crate::commands::Command;
use crate::record::DetectionRecord;

/// Real-time shruti detection against a configurable Sa
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Detector config (JSON). Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sa in Hz (overrides the config)
    #[arg(long)]
    tonic: Option<f64>,

    /// Analyse this WAV file instead of listening
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Samples per analysis frame
    #[arg(long, default_value_t = 4096)]
    frame_size: usize,

    /// Preferred capture sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Write the detection history here (pretty JSON) on exit
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    anyhow::ensure!(args.frame_size > 0, "--frame-size must be positive");

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };
    let mut detector = ShrutiDetector::new(config).context("invalid detector configuration")?;
    if let Some(tonic) = args.tonic {
        detector.set_tonic(tonic)?;
    }
    info!("Sa = {:.2} Hz", detector.tonic());

    let detector = SharedDetector::new(detector);
    match &args.wav {
        Some(path) => run_offline(&detector, path, args.frame_size)?,
        None => run_live(&detector, args.frame_size, args.sample_rate)?,
    }

    if let Some(path) = &args.export {
        save_history(&detector.export_history(), path)?;
        info!("history written to {}", path.display());
    }
    Ok(())
}

/// Analyses a WAV file and prints every detection.
fn run_offline(detector: &SharedDetector, path: &Path, frame_size: usize) -> Result<()> {
    let signal = offline::read_wav(path)?;
    info!(
        "analysing {} ({} samples at {} Hz)",
        path.display(),
        signal.data.len(),
        signal.sample_rate
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut detections = 0usize;
    for frame in offline::frames(&signal.data, frame_size) {
        if let Some(result) = detector.process_frame(frame, signal.sample_rate)? {
            detections += 1;
            let record = DetectionRecord::new(&result, detector.tonic(), detector.current_raga_context());
            record::emit(&mut out, &record)?;
        }
    }

    info!(
        "{} detections, raga context: {}",
        detections,
        detector.current_raga_context().unwrap_or("none")
    );
    Ok(())
}

#[cfg(feature = "capture")]
fn run_live(detector: &SharedDetector, frame_size: usize, sample_rate: u32) -> Result<()> {
    use std::io::BufRead;

    let worker = AudioWorker::start(detector.clone(), frame_size, sample_rate);
    info!("listening; commands: tonic <hz>, raga, history, quit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match commands::parse(&line) {
            Ok(Some(command)) => {
                if handle_command(detector, command)?.is_break() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
        if worker.is_finished() {
            break;
        }
    }

    worker.stop();
    Ok(())
}

#[cfg(not(feature = "capture"))]
fn run_live(_detector: &SharedDetector, _frame_size: usize, _sample_rate: u32) -> Result<()> {
    anyhow::bail!("built without live capture; rebuild with `--features capture` or pass --wav <file>")
}

/// Applies one stdin command. `Break` means stop listening.
#[cfg_attr(not(feature = "capture"), allow(dead_code))]
fn handle_command(detector: &SharedDetector, command: Command) -> Result<ControlFlow<()>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::SetTonic(hz) => match detector.set_tonic(hz) {
            Ok(()) => {}
            Err(e) => warn!("{e}"),
        },
        Command::Raga => {
            record::emit(&mut out, &serde_json::json!({ "raga_context": detector.current_raga_context() }))?;
        }
        Command::History => {
            record::emit(&mut out, &detector.export_history())?;
        }
        Command::Quit => return Ok(ControlFlow::Break(())),
    }
    Ok(ControlFlow::Continue(()))
}

/// Audio thread handle.
///
/// The thread owns the CPAL stream, runs every captured frame through the
/// detector and prints detections until told to stop.
#[cfg(feature = "capture")]
struct AudioWorker {
    shutdown_tx: crossbeam_channel::Sender<()>,
    thread_handle: std::thread::JoinHandle<()>,
}

#[cfg(feature = "capture")]
impl AudioWorker {
    fn start(detector: SharedDetector, frame_size: usize, target_rate: u32) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_handle = std::thread::spawn(move || {
            // A few frames of slack; beyond that the capture callback drops.
            let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);

            let (stream, sample_rate) = match audio::start_audio_capture(raw_audio_tx, frame_size, target_rate) {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("could not start audio capture: {e:#}");
                    return;
                }
            };

            let stdout = io::stdout();
            loop {
                crossbeam_channel::select! {
                    recv(raw_audio_rx) -> msg => match msg {
                        Ok(frame) => match detector.process_frame(&frame, sample_rate) {
                            Ok(Some(result)) => {
                                let record = DetectionRecord::new(
                                    &result,
                                    detector.tonic(),
                                    detector.current_raga_context(),
                                );
                                if let Err(e) = record::emit(&mut stdout.lock(), &record) {
                                    warn!("stdout closed: {e}");
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => warn!("dropped frame: {e}"),
                        },
                        Err(_) => {
                            warn!("audio channel closed");
                            break;
                        }
                    },
                    recv(shutdown_rx) -> _ => break,
                }
            }

            use cpal::traits::StreamTrait;
            if let Err(e) = stream.pause() {
                warn!("error pausing stream: {e}");
            }
            drop(stream);
            info!("audio thread finished");
        });

        Self {
            shutdown_tx,
            thread_handle,
        }
    }

    fn is_finished(&self) -> bool {
        self.thread_handle.is_finished()
    }

    fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if self.thread_handle.join().is_err() {
            warn!("audio thread panicked");
        }
    }
}

fn load_config(path: &Path) -> Result<DetectorConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn save_history(history: &[DetectionSummary], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(history)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
