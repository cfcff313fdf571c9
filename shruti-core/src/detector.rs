//! # Detector
//!
//! The per-session entry point. A [`ShrutiDetector`] owns everything that
//! changes during a session: the tonic, the frequency table resolved from
//! it, the detection history and the raga guess. Every other component is a
//! pure function of what the detector hands it.
//!
//! One detector serves one session. Sessions never share an instance. When a
//! session drives its detector from more than one thread (an audio callback
//! and a control channel, say), wrap it in a [`SharedDetector`]: one mutex per
//! instance, one frame in flight at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{debug, info, trace};

use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::fft::SpectralAnalyzer;
use crate::history::DetectionHistory;
use crate::matcher::{self, MatchParams};
use crate::raga::{RagaParams, RagaTracker};
use crate::tuning::{self, FrequencyTable};
use crate::{DetectionResult, DetectionSummary};

/// Whether the tonic has been chosen explicitly yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Running on the configured default tonic.
    Idle,
    /// A tonic has been set through [`ShrutiDetector::set_tonic`].
    Active,
}

/// Detection pipeline plus the session state it accumulates.
#[derive(Debug)]
pub struct ShrutiDetector {
    config: DetectorConfig,
    state: DetectorState,
    tonic: f64,
    table: FrequencyTable,
    analyzer: SpectralAnalyzer,
    match_params: MatchParams,
    history: DetectionHistory,
    raga: RagaTracker,
}

impl Default for ShrutiDetector {
    fn default() -> Self {
        Self::build(DetectorConfig::default())
    }
}

impl ShrutiDetector {
    /// Creates a detector after validating `config`.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DetectorConfig) -> Self {
        let tonic = config.tonic_frequency;
        Self {
            state: DetectorState::Idle,
            tonic,
            table: tuning::resolve(tonic, config.octave_range),
            analyzer: SpectralAnalyzer::new(
                config.noise_floor,
                config.min_fft_size,
                config.zero_pad_factor,
            ),
            match_params: MatchParams::from(&config),
            history: DetectionHistory::new(config.history_capacity),
            raga: RagaTracker::new(RagaParams::from(&config)),
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Current Sa in Hz.
    pub fn tonic(&self) -> f64 {
        self.tonic
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.table
    }

    pub fn history(&self) -> &DetectionHistory {
        &self.history
    }

    /// Changes Sa and re-resolves the frequency table.
    ///
    /// Out-of-range tonics are rejected and leave the previous tonic in
    /// effect. History is kept across tonic changes.
    pub fn set_tonic(&mut self, frequency: f64) -> Result<()> {
        let (min, max) = (self.config.min_tonic, self.config.max_tonic);
        if !frequency.is_finite() || frequency < min || frequency > max {
            return Err(DetectorError::TonicOutOfRange { frequency, min, max });
        }

        self.table = tuning::resolve(frequency, self.config.octave_range);
        self.tonic = frequency;
        self.state = DetectorState::Active;
        info!("tonic set to {:.2} Hz", frequency);
        Ok(())
    }

    /// Runs one frame through the pipeline.
    ///
    /// `Ok(None)` means nothing matched this frame (silence, noise, or no peak
    /// close enough to a shruti) and leaves the session state untouched.
    /// Errors are reserved for malformed input.
    pub fn process_frame(&mut self, samples: &[f32], sample_rate: u32) -> Result<Option<DetectionResult>> {
        if sample_rate == 0 {
            return Err(DetectorError::InvalidSampleRate(sample_rate));
        }
        if samples.is_empty() {
            return Err(DetectorError::EmptyFrame);
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(DetectorError::NonFiniteSample { index });
        }

        let peaks = self.analyzer.analyze(samples, sample_rate);
        trace!("{} spectral peaks", peaks.len());

        let Some(candidate) = matcher::best_match(&peaks, &self.table, &self.match_params) else {
            return Ok(None);
        };

        let shruti = candidate.shruti.definition();
        let detection = DetectionResult {
            shruti,
            shruti_id: candidate.shruti,
            octave: candidate.octave,
            frequency: candidate.frequency,
            expected_frequency: candidate.expected_frequency,
            cents_deviation: tuning::calculate_cents_deviation(
                candidate.frequency,
                candidate.expected_frequency,
            ),
            magnitude: candidate.magnitude,
            confidence: candidate.confidence,
            timestamp: Utc::now(),
        };
        debug!(
            "{} (octave {}) at {:.2} Hz, {:+.1} cents, confidence {:.2}",
            shruti.name, detection.octave, detection.frequency, detection.cents_deviation, detection.confidence
        );

        self.history.push(detection.clone());
        if self.raga.update(&self.history) {
            if let Some(raga) = self.raga.current() {
                info!("raga context is now {}", raga.name);
            }
        }

        Ok(Some(detection))
    }

    /// Best guess at the raga being performed, if any has been established.
    pub fn current_raga_context(&self) -> Option<&'static str> {
        self.raga.current().map(|raga| raga.name)
    }

    /// Snapshot of the history, oldest first. Does not modify the history.
    pub fn export_history(&self) -> Vec<DetectionSummary> {
        self.history.iter().map(DetectionSummary::from).collect()
    }

    /// Drops all detections and the raga guess. The tonic is kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.raga.reset();
    }
}

/// A [`ShrutiDetector`] behind a mutex, cloneable across the threads of one
/// session.
#[derive(Debug, Clone)]
pub struct SharedDetector {
    inner: Arc<Mutex<ShrutiDetector>>,
}

impl SharedDetector {
    pub fn new(detector: ShrutiDetector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    // A panic mid-frame leaves the detector consistent (history pushes are
    // atomic), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, ShrutiDetector> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_tonic(&self, frequency: f64) -> Result<()> {
        self.lock().set_tonic(frequency)
    }

    pub fn process_frame(&self, samples: &[f32], sample_rate: u32) -> Result<Option<DetectionResult>> {
        self.lock().process_frame(samples, sample_rate)
    }

    pub fn tonic(&self) -> f64 {
        self.lock().tonic()
    }

    pub fn current_raga_context(&self) -> Option<&'static str> {
        self.lock().current_raga_context()
    }

    pub fn export_history(&self) -> Vec<DetectionSummary> {
        self.lock().export_history()
    }

    /// Runs `f` with exclusive access to the detector.
    pub fn with<R>(&self, f: impl FnOnce(&mut ShrutiDetector) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_on_default_tonic() {
        let detector = ShrutiDetector::default();
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.tonic(), 261.63);
        assert_eq!(detector.current_raga_context(), None);
        assert!(detector.export_history().is_empty());
    }

    #[test]
    fn rejected_tonic_keeps_previous_table() {
        let mut detector = ShrutiDetector::default();
        detector.set_tonic(220.0).unwrap();
        let before = detector.frequency_table().clone();

        for bad in [99.9, 500.1, 0.0, -220.0, f64::NAN] {
            assert!(matches!(
                detector.set_tonic(bad),
                Err(DetectorError::TonicOutOfRange { .. })
            ));
        }
        assert_eq!(detector.tonic(), 220.0);
        assert_eq!(detector.frequency_table(), &before);
        assert_eq!(detector.state(), DetectorState::Active);
    }

    #[test]
    fn malformed_frames_are_rejected() {
        let mut detector = ShrutiDetector::default();
        assert_eq!(detector.process_frame(&[], 44100), Err(DetectorError::EmptyFrame));
        assert_eq!(
            detector.process_frame(&[0.0; 16], 0),
            Err(DetectorError::InvalidSampleRate(0))
        );
        assert_eq!(
            detector.process_frame(&[0.0, f32::NAN, 0.0], 44100),
            Err(DetectorError::NonFiniteSample { index: 1 })
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DetectorConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(ShrutiDetector::new(config).is_err());
    }

    #[test]
    fn shared_handle_sees_one_detector() {
        let shared = SharedDetector::new(ShrutiDetector::default());
        let other = shared.clone();
        other.set_tonic(300.0).unwrap();
        assert_eq!(shared.tonic(), 300.0);
        assert_eq!(shared.with(|d| d.state()), DetectorState::Active);
    }
}
