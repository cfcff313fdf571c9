//! # Shruti Matcher
//!
//! Snaps spectral peaks to the nearest shruti in a resolved
//! [`FrequencyTable`] and keeps the single most confident match per frame.
//!
//! Per peak:
//! 1. Skip it if it lies outside the plausible band.
//! 2. Find the table entry with the smallest cent distance.
//! 3. Reject it unless that distance is strictly below the tolerance.
//! 4. Score `accuracy_weight * (1 - distance / tolerance)` plus the remaining
//!    weight times the saturated magnitude.
//!
//! Across peaks the highest score above the threshold wins. Equal scores keep
//! the earlier peak.

use crate::fft::SpectralPeak;
use crate::shruti::ShrutiId;
use crate::tuning::FrequencyTable;

// Absorbs rounding when a peak is constructed exactly on the tolerance edge.
const CENT_EPSILON: f64 = 1e-6;

/// Matching thresholds, lifted out of
/// [`DetectorConfig`](crate::DetectorConfig).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub cent_tolerance: f64,
    pub confidence_threshold: f64,
    pub accuracy_weight: f64,
    pub magnitude_saturation: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self::from(&crate::DetectorConfig::default())
    }
}

impl From<&crate::DetectorConfig> for MatchParams {
    fn from(config: &crate::DetectorConfig) -> Self {
        Self {
            min_frequency: config.min_frequency,
            max_frequency: config.max_frequency,
            cent_tolerance: config.cent_tolerance,
            confidence_threshold: config.confidence_threshold,
            accuracy_weight: config.accuracy_weight,
            magnitude_saturation: config.magnitude_saturation,
        }
    }
}

/// A peak snapped to a shruti.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub shruti: ShrutiId,
    pub octave: i32,
    /// Frequency of the table entry the peak snapped to.
    pub expected_frequency: f64,
    /// The peak as measured.
    pub frequency: f64,
    pub magnitude: f32,
    /// Absolute cent distance to the table entry.
    pub cent_distance: f64,
    pub confidence: f64,
}

/// Absolute distance in cents between two frequencies.
pub fn cent_distance(freq: f64, target: f64) -> f64 {
    (1200.0 * (freq / target).log2()).abs()
}

/// Confidence for a peak `distance` cents off with the given magnitude, in
/// `0.0..=1.0`.
pub fn score(distance: f64, magnitude: f32, params: &MatchParams) -> f64 {
    let accuracy = (1.0 - distance / params.cent_tolerance).max(0.0);
    let magnitude_factor = (magnitude as f64 / params.magnitude_saturation).clamp(0.0, 1.0);
    params.accuracy_weight * accuracy + (1.0 - params.accuracy_weight) * magnitude_factor
}

/// Snaps a single peak to its nearest table entry.
///
/// Returns `None` when the peak is outside the band or no entry is within
/// tolerance. The confidence threshold is not applied here.
pub fn nearest(peak: &SpectralPeak, table: &FrequencyTable, params: &MatchParams) -> Option<Candidate> {
    if !peak.frequency.is_finite()
        || peak.frequency < params.min_frequency
        || peak.frequency > params.max_frequency
    {
        return None;
    }

    let closest = table
        .entries()
        .map(|entry| (entry, cent_distance(peak.frequency, entry.frequency)))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    let (entry, distance) = closest;
    if distance >= params.cent_tolerance - CENT_EPSILON {
        return None;
    }

    Some(Candidate {
        shruti: entry.shruti,
        octave: entry.octave,
        expected_frequency: entry.frequency,
        frequency: peak.frequency,
        magnitude: peak.magnitude,
        cent_distance: distance,
        confidence: score(distance, peak.magnitude, params),
    })
}

/// Picks the best candidate across all peaks of a frame.
///
/// Only strictly higher confidence displaces the current best, so ties go to
/// the first peak in scan order.
pub fn best_match(peaks: &[SpectralPeak], table: &FrequencyTable, params: &MatchParams) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for candidate in peaks.iter().filter_map(|peak| nearest(peak, table, params)) {
        if candidate.confidence <= params.confidence_threshold {
            continue;
        }
        match &best {
            Some(current) if candidate.confidence <= current.confidence => {}
            _ => best = Some(candidate),
        }
    }
    best
}
