// shruti-core/src/lib.rs

//! The core logic for the Carnatic shruti detector.
//! This crate turns audio frames into shruti detections relative to a
//! configurable Sa, and keeps a short rolling history with a raga guess on
//! top. It is completely headless and does no audio I/O of its own.

pub mod config;
pub mod detector;
pub mod error;
pub mod fft;
pub mod history;
pub mod matcher;
pub mod raga;
pub mod shruti;
pub mod tuning;

pub use config::DetectorConfig;
pub use detector::{SharedDetector, ShrutiDetector};
pub use error::DetectorError;
pub use shruti::{ShrutiDefinition, ShrutiId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted detection. Never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// The matched catalog entry.
    pub shruti: &'static ShrutiDefinition,
    pub shruti_id: ShrutiId,
    /// Octave of the matched entry relative to Sa.
    pub octave: i32,
    /// The peak frequency as measured, before snapping.
    pub frequency: f64,
    /// Frequency of the matched table entry.
    pub expected_frequency: f64,
    /// Signed deviation from the expected frequency (positive = sharp).
    pub cents_deviation: f64,
    /// Spectral magnitude of the matched peak.
    pub magnitude: f32,
    /// Match confidence (0.0 to 1.0).
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Owned, serializable view of a [`DetectionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub shruti: String,
    pub western: String,
    /// Nominal cents of the shruti above Sa.
    pub cent_value: u16,
    pub octave: i32,
    pub frequency: f64,
    pub expected_frequency: f64,
    pub cents_deviation: f64,
    pub magnitude: f32,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&DetectionResult> for DetectionSummary {
    fn from(result: &DetectionResult) -> Self {
        Self {
            shruti: result.shruti.name.to_string(),
            western: result.shruti.western_equivalent.to_string(),
            cent_value: result.shruti.cent_offset,
            octave: result.octave,
            frequency: result.frequency,
            expected_frequency: result.expected_frequency,
            cents_deviation: result.cents_deviation,
            magnitude: result.magnitude,
            confidence: result.confidence,
            timestamp: result.timestamp,
        }
    }
}
