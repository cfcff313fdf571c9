use std::thread;

use shruti_core::detector::DetectorState;
use shruti_core::{DetectorConfig, SharedDetector, ShrutiDetector};

const SAMPLE_RATE: u32 = 44100;
const FRAME: usize = 4096;

fn sine(freq: f64, amplitude: f32) -> Vec<f32> {
    (0..FRAME)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            amplitude * (2.0 * std::f64::consts::PI * freq * t).sin() as f32
        })
        .collect()
}

fn tone_for(detector: &ShrutiDetector, shruti: &str) -> Vec<f32> {
    let ratio = shruti_core::shruti::find(shruti).unwrap().frequency_ratio();
    sine(detector.tonic() * ratio, 0.5)
}

#[test]
fn clean_sa_is_shadja_every_time() {
    let mut detector = ShrutiDetector::default();
    let frame = sine(261.63, 0.5);
    for _ in 0..5 {
        let result = detector.process_frame(&frame, SAMPLE_RATE).unwrap().unwrap();
        assert_eq!(result.shruti.name, "Shadja");
        assert_eq!(result.octave, 0);
        assert!(result.confidence >= 0.9, "confidence {}", result.confidence);
    }
    assert_eq!(detector.history().len(), 5);
}

#[test]
fn fifth_above_middle_c_is_panchama() {
    let mut detector = ShrutiDetector::default();
    detector.set_tonic(261.63).unwrap();
    assert_eq!(detector.state(), DetectorState::Active);

    let result = detector
        .process_frame(&sine(392.44, 0.5), SAMPLE_RATE)
        .unwrap()
        .expect("a clean fifth should match");
    assert_eq!(result.shruti.name, "Panchama");
    assert!((result.frequency - 392.44).abs() < 1.0, "frequency {}", result.frequency);
    assert!((result.expected_frequency - 392.445).abs() < 1e-9);
    assert!(result.confidence >= 0.8, "confidence {}", result.confidence);
    assert!(result.cents_deviation.abs() < 2.0);
}

#[test]
fn silence_changes_nothing() {
    let mut detector = ShrutiDetector::default();
    for name in ["Shadja", "Chatushruti Ri", "Antara Ga", "Prati Ma", "Panchama"] {
        let frame = tone_for(&detector, name);
        detector.process_frame(&frame, SAMPLE_RATE).unwrap().unwrap();
    }
    let raga = detector.current_raga_context();
    let history = detector.export_history();
    assert!(raga.is_some());

    let result = detector.process_frame(&vec![0.0; FRAME], SAMPLE_RATE).unwrap();
    assert!(result.is_none());
    assert_eq!(detector.current_raga_context(), raga);
    assert_eq!(detector.export_history(), history);
}

#[test]
fn quiet_noise_does_not_match() {
    let mut detector = ShrutiDetector::default();
    // Tiny deterministic dither, far below the noise floor after the FFT
    let frame: Vec<f32> = (0..FRAME)
        .map(|i| ((i * 7919 % 101) as f32 / 101.0 - 0.5) * 1e-4)
        .collect();
    assert!(detector.process_frame(&frame, SAMPLE_RATE).unwrap().is_none());
    assert!(detector.history().is_empty());
}

#[test]
fn tonic_change_recomputes_the_table() {
    let mut detector = ShrutiDetector::default();
    let a440 = sine(440.0, 0.5);

    detector.set_tonic(440.0).unwrap();
    let first = detector.process_frame(&a440, SAMPLE_RATE).unwrap().unwrap();
    assert_eq!(first.shruti.name, "Shadja");

    detector.set_tonic(261.63).unwrap();
    let second = detector.process_frame(&a440, SAMPLE_RATE).unwrap().unwrap();
    assert_ne!(second.shruti.name, "Shadja");
    assert!(second.shruti.name.ends_with("Dha"), "got {}", second.shruti.name);

    // History survives the tonic change
    assert_eq!(detector.history().len(), 2);
}

#[test]
fn history_is_bounded() {
    let config = DetectorConfig {
        history_capacity: 50,
        ..Default::default()
    };
    let mut detector = ShrutiDetector::new(config).unwrap();
    let frame = sine(261.63, 0.5);
    for _ in 0..60 {
        detector.process_frame(&frame, SAMPLE_RATE).unwrap();
    }
    assert_eq!(detector.history().len(), 50);
    assert_eq!(detector.export_history().len(), 50);

    let exported = detector.export_history();
    for pair in exported.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[test]
fn raga_context_needs_five_and_holds_through_ambiguity() {
    let mut detector = ShrutiDetector::default();
    let kalyani = ["Shadja", "Chatushruti Ri", "Antara Ga", "Prati Ma", "Panchama"];

    for (i, name) in kalyani.iter().enumerate() {
        let frame = tone_for(&detector, name);
        let result = detector.process_frame(&frame, SAMPLE_RATE).unwrap().unwrap();
        assert_eq!(result.shruti.name, *name);
        if i < 4 {
            assert_eq!(detector.current_raga_context(), None);
        }
    }
    assert_eq!(detector.current_raga_context(), Some("Kalyani"));

    let variants = ["Trishruti Ri", "Shuddha Ga", "Chyuta Madhyama Ga", "Tivra Shuddha Ma", "Ekashruti Dha"];
    for _ in 0..2 {
        for name in variants {
            let frame = tone_for(&detector, name);
            let result = detector.process_frame(&frame, SAMPLE_RATE).unwrap().unwrap();
            assert_eq!(result.shruti.name, name);
        }
    }
    assert_eq!(detector.current_raga_context(), Some("Kalyani"));
}

#[test]
fn export_is_serializable_and_read_only() {
    let mut detector = ShrutiDetector::default();
    detector.process_frame(&sine(261.63 * 1.25, 0.5), SAMPLE_RATE).unwrap().unwrap();

    let exported = detector.export_history();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].shruti, "Antara Ga");
    assert_eq!(exported[0].western, "E");
    assert_eq!(exported[0].cent_value, 386);

    let json = serde_json::to_string(&exported).unwrap();
    assert!(json.contains("\"shruti\":\"Antara Ga\""));
    assert_eq!(detector.history().len(), 1);
}

#[test]
fn shared_detector_processes_one_frame_at_a_time() {
    let shared = SharedDetector::new(ShrutiDetector::default());
    let frame = sine(261.63, 0.5);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let detector = shared.clone();
            let frame = frame.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    detector.process_frame(&frame, SAMPLE_RATE).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(shared.export_history().len(), 20);
}

#[test]
fn sessions_do_not_share_state() {
    let mut a = ShrutiDetector::default();
    let b = ShrutiDetector::default();
    a.set_tonic(440.0).unwrap();
    a.process_frame(&sine(440.0, 0.5), SAMPLE_RATE).unwrap();
    assert_eq!(b.tonic(), 261.63);
    assert!(b.history().is_empty());
}
