//! # Frequency Resolver
//!
//! Turns a tonic (Sa) frequency and the shruti catalog into absolute target
//! frequencies across a span of octaves. The table is keyed by
//! `(ShrutiId, octave)` and stored as a dense two-dimensional grid, so lookups
//! never go through string keys.
//!
//! The resolver is pure: the same tonic and octave span always produce the
//! same table. Callers recompute it whenever the tonic changes.

use crate::shruti::{self, ShrutiId, SHRUTI_COUNT};

/// Absolute frequencies for every shruti in every octave of a span.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    tonic: f64,
    min_octave: i32,
    max_octave: i32,
    // rows[octave - min_octave][shruti index]
    rows: Vec<[f64; SHRUTI_COUNT]>,
}

/// One cell of a [`FrequencyTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableEntry {
    pub shruti: ShrutiId,
    pub octave: i32,
    pub frequency: f64,
}

/// Resolves the catalog against `tonic` for every octave in
/// `min_octave..=max_octave`.
///
/// `tonic` must be positive and `min_octave <= max_octave`; the detector
/// validates both before calling this.
pub fn resolve(tonic: f64, (min_octave, max_octave): (i32, i32)) -> FrequencyTable {
    debug_assert!(tonic > 0.0, "tonic must be positive");
    debug_assert!(min_octave <= max_octave, "empty octave span");

    let bases: Vec<f64> = shruti::get_all()
        .iter()
        .map(|s| tonic * s.frequency_ratio())
        .collect();

    let rows = (min_octave..=max_octave)
        .map(|octave| {
            let scale = 2f64.powi(octave);
            let mut row = [0.0; SHRUTI_COUNT];
            for (slot, base) in row.iter_mut().zip(&bases) {
                *slot = base * scale;
            }
            row
        })
        .collect();

    FrequencyTable {
        tonic,
        min_octave,
        max_octave,
        rows,
    }
}

impl FrequencyTable {
    pub fn tonic(&self) -> f64 {
        self.tonic
    }

    pub fn octave_range(&self) -> (i32, i32) {
        (self.min_octave, self.max_octave)
    }

    /// Frequency of `shruti` in `octave`, or `None` outside the resolved span.
    pub fn get(&self, shruti: ShrutiId, octave: i32) -> Option<f64> {
        if octave < self.min_octave || octave > self.max_octave {
            return None;
        }
        let row = &self.rows[(octave - self.min_octave) as usize];
        row.get(shruti.index()).copied()
    }

    /// Iterates over every cell, lowest octave first, catalog order within an
    /// octave.
    pub fn entries(&self) -> impl Iterator<Item = TableEntry> + '_ {
        self.rows.iter().enumerate().flat_map(move |(row_idx, row)| {
            let octave = self.min_octave + row_idx as i32;
            shruti::ids().zip(row.iter()).map(move |(shruti, &frequency)| TableEntry {
                shruti,
                octave,
                frequency,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len() * SHRUTI_COUNT
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Signed distance from `target_freq` to `freq` in cents.
///
/// Positive values are sharp, negative values flat.
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_eq(a: f64, b: f64) -> bool {
        ((a - b) / b).abs() < 1e-9
    }

    #[test]
    fn base_octave_is_tonic_times_ratio() {
        for &tonic in &[100.0, 146.83, 261.63, 440.0, 500.0] {
            let table = resolve(tonic, (-2, 3));
            for id in shruti::ids() {
                let expected = tonic * id.definition().frequency_ratio();
                assert!(rel_eq(table.get(id, 0).unwrap(), expected));
            }
        }
    }

    #[test]
    fn octaves_double() {
        let table = resolve(261.63, (-2, 3));
        for id in shruti::ids() {
            for k in -2..3 {
                let lo = table.get(id, k).unwrap();
                let hi = table.get(id, k + 1).unwrap();
                assert!(rel_eq(hi, 2.0 * lo));
            }
        }
    }

    #[test]
    fn lookups_outside_span_are_none() {
        let table = resolve(220.0, (-1, 1));
        assert_eq!(table.octave_range(), (-1, 1));
        assert!(table.get(shruti::shadja(), -2).is_none());
        assert!(table.get(shruti::shadja(), 2).is_none());
        assert_eq!(table.get(shruti::shadja(), -1), Some(110.0));
    }

    #[test]
    fn entries_cover_the_grid() {
        let table = resolve(261.63, (-2, 3));
        assert_eq!(table.entries().count(), 6 * SHRUTI_COUNT);
        assert_eq!(table.len(), 6 * SHRUTI_COUNT);
        let first = table.entries().next().unwrap();
        assert_eq!(first.octave, -2);
        assert_eq!(first.shruti, shruti::shadja());
    }

    #[test]
    fn cents_deviation_sign() {
        assert!((calculate_cents_deviation(880.0, 440.0) - 1200.0).abs() < 1e-9);
        assert!(calculate_cents_deviation(430.0, 440.0) < 0.0);
    }
}
