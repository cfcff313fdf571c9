//! The line-oriented output format: one JSON object per line on stdout.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use shruti_core::{DetectionResult, DetectionSummary};

/// A detection as printed, with the session context at the time it was made.
#[derive(Debug, Serialize)]
pub struct DetectionRecord {
    #[serde(flatten)]
    pub detection: DetectionSummary,
    pub tonic: f64,
    pub raga_context: Option<&'static str>,
}

impl DetectionRecord {
    pub fn new(result: &DetectionResult, tonic: f64, raga_context: Option<&'static str>) -> Self {
        Self {
            detection: DetectionSummary::from(result),
            tonic,
            raga_context,
        }
    }
}

/// Writes `value` as a single JSON line and flushes.
pub fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
