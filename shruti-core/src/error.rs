use thiserror::Error;

/// Errors surfaced by the detector.
///
/// "No shruti this frame" is not an error; see
/// [`ShrutiDetector::process_frame`](crate::ShrutiDetector::process_frame).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// The requested tonic is outside the accepted range.
    #[error("tonic {frequency} Hz is outside the accepted range {min}..={max} Hz")]
    TonicOutOfRange { frequency: f64, min: f64, max: f64 },

    /// Sample rate of zero.
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    /// A frame with no samples.
    #[error("audio frame is empty")]
    EmptyFrame,

    /// A frame containing NaN or infinity.
    #[error("audio frame has a non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    /// A configuration value that cannot work.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, DetectorError>;
