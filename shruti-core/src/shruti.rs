//! # Shruti Table
//!
//! The fixed catalog of the 22 shrutis of Carnatic just intonation. Each entry
//! carries the rational ratio it sits at above Sa; everything else on the entry
//! is descriptive and never enters a computation.
//!
//! The catalog is ordered by ascending ratio, which keeps nearest-match ties
//! inside one octave impossible (adjacent entries are at least ~20 cents apart).

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Index of a shruti inside [`SHRUTIS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShrutiId(pub(crate) usize);

impl ShrutiId {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn definition(self) -> &'static ShrutiDefinition {
        &SHRUTIS[self.0]
    }
}

/// A single catalog entry.
#[derive(Debug, PartialEq, Eq)]
pub struct ShrutiDefinition {
    /// Unique name, e.g. "Antara Ga".
    pub name: &'static str,
    /// Closest Western label, informational only.
    pub western_equivalent: &'static str,
    /// Nominal cents above Sa. Documentation value; matching uses the ratio.
    pub cent_offset: u16,
    /// Just-intonation ratio above Sa as (numerator, denominator).
    pub ratio: (u32, u32),
    /// Ragas this shruti is characteristic of.
    pub typical_raga_usage: &'static [&'static str],
}

impl ShrutiDefinition {
    /// The ratio as a multiplier on the tonic frequency.
    pub fn frequency_ratio(&self) -> f64 {
        self.ratio.0 as f64 / self.ratio.1 as f64
    }

    /// Exact cents above Sa derived from the ratio.
    pub fn ratio_cents(&self) -> f64 {
        1200.0 * self.frequency_ratio().log2()
    }
}

macro_rules! shruti {
    ($name:expr, $western:expr, $cents:expr, $num:expr, $den:expr, [$($raga:expr),* $(,)?]) => {
        ShrutiDefinition {
            name: $name,
            western_equivalent: $western,
            cent_offset: $cents,
            ratio: ($num, $den),
            typical_raga_usage: &[$($raga),*],
        }
    };
}

/// Number of shrutis in one octave.
pub const SHRUTI_COUNT: usize = 22;

/// The 22 shrutis in ascending order.
pub static SHRUTIS: [ShrutiDefinition; SHRUTI_COUNT] = [
    shruti!("Shadja", "C", 0, 1, 1, ["All ragas"]),
    shruti!("Ekashruti Ri", "Db-", 90, 256, 243, []),
    shruti!("Shuddha Ri", "Db", 112, 16, 15, ["Mayamalavagowla", "Todi"]),
    shruti!("Trishruti Ri", "D-", 182, 10, 9, []),
    shruti!("Chatushruti Ri", "D", 204, 9, 8, ["Shankarabharanam", "Kalyani", "Kharaharapriya", "Mohanam", "Hamsadhwani"]),
    shruti!("Shuddha Ga", "Eb-", 294, 32, 27, []),
    shruti!("Sadharana Ga", "Eb", 316, 6, 5, ["Kharaharapriya", "Hindolam", "Todi"]),
    shruti!("Antara Ga", "E", 386, 5, 4, ["Shankarabharanam", "Kalyani", "Mayamalavagowla", "Mohanam", "Hamsadhwani"]),
    shruti!("Chyuta Madhyama Ga", "E+", 408, 81, 64, []),
    shruti!("Shuddha Ma", "F", 498, 4, 3, ["Shankarabharanam", "Kharaharapriya", "Mayamalavagowla", "Hindolam", "Todi"]),
    shruti!("Tivra Shuddha Ma", "F+", 520, 27, 20, []),
    shruti!("Prati Ma", "F#", 590, 45, 32, ["Kalyani"]),
    shruti!("Chyuta Panchama Ma", "F#+", 612, 729, 512, []),
    shruti!("Panchama", "G", 702, 3, 2, ["Shankarabharanam", "Kalyani", "Kharaharapriya", "Mayamalavagowla", "Mohanam", "Hamsadhwani", "Todi"]),
    shruti!("Ekashruti Dha", "Ab-", 792, 128, 81, []),
    shruti!("Shuddha Dha", "Ab", 814, 8, 5, ["Mayamalavagowla", "Hindolam", "Todi"]),
    shruti!("Chatushruti Dha", "A", 884, 5, 3, ["Shankarabharanam", "Kalyani", "Kharaharapriya", "Mohanam"]),
    shruti!("Panchashruti Dha", "A+", 906, 27, 16, []),
    shruti!("Shuddha Ni", "Bb-", 996, 16, 9, []),
    shruti!("Kaishiki Ni", "Bb", 1018, 9, 5, ["Kharaharapriya", "Hindolam", "Todi"]),
    shruti!("Kakali Ni", "B", 1088, 15, 8, ["Shankarabharanam", "Kalyani", "Mayamalavagowla", "Hamsadhwani"]),
    shruti!("Chyuta Shadja Ni", "B+", 1110, 243, 128, []),
];

static NAME_MAP: Lazy<BTreeMap<&'static str, ShrutiId>> = Lazy::new(|| {
    SHRUTIS
        .iter()
        .enumerate()
        .map(|(i, shruti)| (shruti.name, ShrutiId(i)))
        .collect()
});

/// Returns the whole catalog in ascending ratio order.
pub fn get_all() -> &'static [ShrutiDefinition] {
    &SHRUTIS
}

/// Iterates over every catalog id in order.
pub fn ids() -> impl Iterator<Item = ShrutiId> {
    (0..SHRUTI_COUNT).map(ShrutiId)
}

/// Looks up a shruti id by name. Unknown names yield `None`.
pub fn find_id(name: &str) -> Option<ShrutiId> {
    NAME_MAP.get(name).copied()
}

/// Looks up a shruti definition by name. Unknown names yield `None`.
pub fn find(name: &str) -> Option<&'static ShrutiDefinition> {
    find_id(name).map(ShrutiId::definition)
}

/// The root note (Sa).
pub fn shadja() -> ShrutiId {
    ShrutiId(0)
}
