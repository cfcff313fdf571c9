//! Tunable parameters for the detector.

use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Every knob of the detection pipeline.
///
/// Deserializes with per-field defaults, so a config file only has to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Initial Sa in Hz.
    pub tonic_frequency: f64,
    /// Lowest tonic `set_tonic` accepts.
    pub min_tonic: f64,
    /// Highest tonic `set_tonic` accepts.
    pub max_tonic: f64,

    // Spectral analysis
    /// Minimum magnitude for a bin to count as a peak.
    pub noise_floor: f32,
    /// FFT length never drops below this many samples.
    pub min_fft_size: usize,
    /// Extra zero-padding applied on top of the frame's power-of-two length.
    pub zero_pad_factor: usize,

    // Matching
    /// Peaks below this frequency are ignored.
    pub min_frequency: f64,
    /// Peaks above this frequency are ignored.
    pub max_frequency: f64,
    /// A peak must land strictly closer than this to a shruti (cents).
    pub cent_tolerance: f64,
    /// A match must score above this to be reported.
    pub confidence_threshold: f64,
    /// Weight of frequency accuracy in the confidence score. Magnitude gets
    /// the rest.
    pub accuracy_weight: f64,
    /// Magnitude at which the magnitude factor saturates to 1.
    pub magnitude_saturation: f64,
    /// Octaves around Sa to resolve, inclusive.
    pub octave_range: (i32, i32),

    // History and raga context
    pub history_capacity: usize,
    /// How many recent detections the raga tracker looks at.
    pub raga_window: usize,
    /// Detections needed in history before any raga is inferred.
    pub raga_min_detections: usize,
    /// Matching notes a raga needs within the window to be chosen.
    pub raga_min_matches: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tonic_frequency: 261.63,
            min_tonic: 100.0,
            max_tonic: 500.0,
            noise_floor: 15.0,
            min_fft_size: 4096,
            zero_pad_factor: 2,
            min_frequency: 50.0,
            max_frequency: 2000.0,
            cent_tolerance: 25.0,
            confidence_threshold: 0.6,
            accuracy_weight: 0.7,
            magnitude_saturation: 100.0,
            octave_range: (-2, 3),
            history_capacity: 50,
            raga_window: 10,
            raga_min_detections: 5,
            raga_min_matches: 3,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> DetectorError {
    DetectorError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

impl DetectorConfig {
    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_tonic > 0.0 && self.min_tonic <= self.max_tonic) {
            return Err(invalid("min_tonic", "must be positive and not above max_tonic"));
        }
        if !(self.min_tonic..=self.max_tonic).contains(&self.tonic_frequency) {
            return Err(DetectorError::TonicOutOfRange {
                frequency: self.tonic_frequency,
                min: self.min_tonic,
                max: self.max_tonic,
            });
        }
        if !(self.noise_floor >= 0.0) {
            return Err(invalid("noise_floor", "must be non-negative"));
        }
        if self.min_fft_size < 4 {
            return Err(invalid("min_fft_size", "must be at least 4"));
        }
        if self.zero_pad_factor == 0 {
            return Err(invalid("zero_pad_factor", "must be at least 1"));
        }
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            return Err(invalid("min_frequency", "must be positive and below max_frequency"));
        }
        if !(self.cent_tolerance > 0.0) {
            return Err(invalid("cent_tolerance", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid("confidence_threshold", "must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.accuracy_weight) {
            return Err(invalid("accuracy_weight", "must be within 0..=1"));
        }
        if !(self.magnitude_saturation > 0.0) {
            return Err(invalid("magnitude_saturation", "must be positive"));
        }
        if self.octave_range.0 > self.octave_range.1 {
            return Err(invalid("octave_range", "min octave above max octave"));
        }
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity", "must be at least 1"));
        }
        if self.raga_window == 0 {
            return Err(invalid("raga_window", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DetectorConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{ "cent_tolerance": 30.0, "octave_range": [-1, 2] }"#).unwrap();
        assert_eq!(cfg.cent_tolerance, 30.0);
        assert_eq!(cfg.octave_range, (-1, 2));
        assert_eq!(cfg.history_capacity, 50);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = DetectorConfig {
            cent_tolerance: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(DetectorError::InvalidConfig { field: "cent_tolerance", .. })
        ));

        let cfg = DetectorConfig {
            tonic_frequency: 40.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(DetectorError::TonicOutOfRange { .. })));
    }
}
