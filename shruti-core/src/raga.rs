//! # Raga Context
//!
//! A coarse, advisory guess at the raga being sung: count how many recent
//! detections fall inside each known raga's note set and take the best.
//!
//! This is note-overlap counting only. Arohanam/avarohanam order, vakra
//! phrases and gamakas are not modelled, so treat the result as a hint.

use crate::history::DetectionHistory;

/// A raga and the shrutis it permits.
#[derive(Debug, PartialEq, Eq)]
pub struct RagaDefinition {
    pub name: &'static str,
    /// Shruti names, in ascending order.
    pub notes: &'static [&'static str],
}

impl RagaDefinition {
    pub fn contains(&self, shruti_name: &str) -> bool {
        self.notes.contains(&shruti_name)
    }
}

/// Known ragas. Order matters: it breaks ties.
pub static RAGAS: &[RagaDefinition] = &[
    RagaDefinition {
        name: "Shankarabharanam",
        notes: &["Shadja", "Chatushruti Ri", "Antara Ga", "Shuddha Ma", "Panchama", "Chatushruti Dha", "Kakali Ni"],
    },
    RagaDefinition {
        name: "Kalyani",
        notes: &["Shadja", "Chatushruti Ri", "Antara Ga", "Prati Ma", "Panchama", "Chatushruti Dha", "Kakali Ni"],
    },
    RagaDefinition {
        name: "Kharaharapriya",
        notes: &["Shadja", "Chatushruti Ri", "Sadharana Ga", "Shuddha Ma", "Panchama", "Chatushruti Dha", "Kaishiki Ni"],
    },
    RagaDefinition {
        name: "Mayamalavagowla",
        notes: &["Shadja", "Shuddha Ri", "Antara Ga", "Shuddha Ma", "Panchama", "Shuddha Dha", "Kakali Ni"],
    },
    RagaDefinition {
        name: "Mohanam",
        notes: &["Shadja", "Chatushruti Ri", "Antara Ga", "Panchama", "Chatushruti Dha"],
    },
    RagaDefinition {
        name: "Hindolam",
        notes: &["Shadja", "Sadharana Ga", "Shuddha Ma", "Shuddha Dha", "Kaishiki Ni"],
    },
    RagaDefinition {
        name: "Hamsadhwani",
        notes: &["Shadja", "Chatushruti Ri", "Antara Ga", "Panchama", "Kakali Ni"],
    },
    RagaDefinition {
        name: "Todi",
        notes: &["Shadja", "Shuddha Ri", "Sadharana Ga", "Shuddha Ma", "Panchama", "Shuddha Dha", "Kaishiki Ni"],
    },
];

/// Looks up a raga by name.
pub fn find(name: &str) -> Option<&'static RagaDefinition> {
    RAGAS.iter().find(|raga| raga.name == name)
}

/// Thresholds for [`RagaTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagaParams {
    /// Most recent detections considered.
    pub window: usize,
    /// History length below which nothing is inferred.
    pub min_detections: usize,
    /// Matching detections the winning raga needs.
    pub min_matches: usize,
}

impl Default for RagaParams {
    fn default() -> Self {
        Self {
            window: 10,
            min_detections: 5,
            min_matches: 3,
        }
    }
}

impl From<&crate::DetectorConfig> for RagaParams {
    fn from(config: &crate::DetectorConfig) -> Self {
        Self {
            window: config.raga_window,
            min_detections: config.raga_min_detections,
            min_matches: config.raga_min_matches,
        }
    }
}

/// Best raga for the last `window` detections, with its match count. Ties go
/// to the earlier raga in [`RAGAS`].
pub fn best_raga(history: &DetectionHistory, window: usize) -> Option<(&'static RagaDefinition, usize)> {
    let mut best: Option<(&'static RagaDefinition, usize)> = None;
    for raga in RAGAS {
        let count = history
            .recent(window)
            .filter(|detection| raga.contains(detection.shruti.name))
            .count();
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((raga, count)),
        }
    }
    best
}

/// Holds the current raga guess and only replaces it when a new window is
/// convincing. An inconclusive window leaves the previous guess in place.
#[derive(Debug, Clone, Default)]
pub struct RagaTracker {
    params: RagaParams,
    current: Option<&'static RagaDefinition>,
}

impl RagaTracker {
    pub fn new(params: RagaParams) -> Self {
        Self {
            params,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&'static RagaDefinition> {
        self.current
    }

    /// Re-evaluates the guess against `history`. Returns `true` if it changed.
    pub fn update(&mut self, history: &DetectionHistory) -> bool {
        if history.len() < self.params.min_detections {
            return false;
        }
        let Some((raga, count)) = best_raga(history, self.params.window) else {
            return false;
        };
        if count < self.params.min_matches {
            return false;
        }
        let changed = self.current.is_none_or(|current| current.name != raga.name);
        self.current = Some(raga);
        changed
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::detection;
    use crate::shruti;

    fn push_named(history: &mut DetectionHistory, name: &str) {
        let id = shruti::find_id(name).unwrap();
        history.push(detection(id, id.definition().frequency_ratio() * 261.63));
    }

    #[test]
    fn raga_notes_exist_in_catalog() {
        for raga in RAGAS {
            for note in raga.notes {
                assert!(shruti::find(note).is_some(), "{}: unknown shruti {}", raga.name, note);
            }
            assert!(raga.contains("Shadja"));
        }
    }

    #[test]
    fn needs_enough_detections() {
        let mut history = DetectionHistory::new(50);
        let mut tracker = RagaTracker::new(RagaParams::default());
        for name in ["Shadja", "Prati Ma", "Panchama", "Kakali Ni"] {
            push_named(&mut history, name);
            assert!(!tracker.update(&history));
            assert!(tracker.current().is_none());
        }
    }

    #[test]
    fn picks_the_raga_with_most_overlap() {
        let mut history = DetectionHistory::new(50);
        let mut tracker = RagaTracker::new(RagaParams::default());
        for name in ["Shadja", "Prati Ma", "Antara Ga", "Prati Ma", "Panchama"] {
            push_named(&mut history, name);
            tracker.update(&history);
        }
        assert_eq!(tracker.current().map(|r| r.name), Some("Kalyani"));
    }

    #[test]
    fn ties_go_to_catalog_order() {
        let mut history = DetectionHistory::new(50);
        for _ in 0..5 {
            push_named(&mut history, "Shadja");
        }
        let (raga, count) = best_raga(&history, 10).unwrap();
        assert_eq!(raga.name, "Shankarabharanam");
        assert_eq!(count, 5);
    }

    #[test]
    fn inconclusive_window_keeps_previous_context() {
        let mut history = DetectionHistory::new(50);
        let mut tracker = RagaTracker::new(RagaParams::default());
        for name in ["Sadharana Ga", "Kaishiki Ni", "Shuddha Dha", "Shuddha Ma", "Sadharana Ga"] {
            push_named(&mut history, name);
            tracker.update(&history);
        }
        assert_eq!(tracker.current().map(|r| r.name), Some("Hindolam"));

        // Microtonal variants belong to no raga in the catalog
        for name in ["Ekashruti Ri", "Trishruti Ri", "Shuddha Ga", "Chyuta Madhyama Ga", "Tivra Shuddha Ma"] {
            for _ in 0..2 {
                push_named(&mut history, name);
                assert!(!tracker.update(&history));
            }
        }
        assert_eq!(tracker.current().map(|r| r.name), Some("Hindolam"));
    }
}
