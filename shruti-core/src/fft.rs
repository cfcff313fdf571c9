//! # Spectral Analysis Module
//!
//! Turns a raw audio frame into a list of spectral peaks.
//!
//! ## Pipeline
//! 1. DC offset removal
//! 2. Hann windowing
//! 3. Zero-padding to the FFT length
//! 4. Forward FFT and magnitude spectrum (up to Nyquist)
//! 5. Local-maximum peak picking above a noise floor
//! 6. Log-parabolic interpolation of each peak's frequency
//!
//! An empty peak list means "no signal" and is not an error.

use rustfft::{num_complex::Complex, FftPlanner};

/// A local maximum of the magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Interpolated peak frequency in Hz.
    pub frequency: f64,
    /// Magnitude of the peak bin.
    pub magnitude: f32,
    /// FFT bin the peak was found at.
    pub bin: usize,
}

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window to the input buffer to reduce spectral leakage.
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// FFT length for a frame of `frame_len` samples.
///
/// The frame's power-of-two length times `zero_pad_factor`, never below
/// `min_fft_size`.
pub fn fft_size_for(frame_len: usize, min_fft_size: usize, zero_pad_factor: usize) -> usize {
    (frame_len.next_power_of_two() * zero_pad_factor.max(1)).max(min_fft_size)
}

/// Windowed, zero-padded FFT front end with peak picking.
///
/// Holds the FFT planner and working buffers so repeated frames of the same
/// size do not re-plan or reallocate.
pub struct SpectralAnalyzer {
    planner: FftPlanner<f32>,
    noise_floor: f32,
    min_fft_size: usize,
    zero_pad_factor: usize,
    windowed: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("noise_floor", &self.noise_floor)
            .field("min_fft_size", &self.min_fft_size)
            .field("zero_pad_factor", &self.zero_pad_factor)
            .finish()
    }
}

impl SpectralAnalyzer {
    pub fn new(noise_floor: f32, min_fft_size: usize, zero_pad_factor: usize) -> Self {
        Self {
            planner: FftPlanner::new(),
            noise_floor,
            min_fft_size,
            zero_pad_factor,
            windowed: Vec::new(),
            spectrum: Vec::new(),
            magnitudes: Vec::new(),
        }
    }

    /// Magnitude spectrum of the last analyzed frame, DC to Nyquist.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Computes the magnitude spectrum of `frame` and returns the FFT length
    /// used.
    pub fn compute_magnitudes(&mut self, frame: &[f32]) -> usize {
        let fft_size = fft_size_for(frame.len(), self.min_fft_size, self.zero_pad_factor);

        self.windowed.clear();
        self.windowed.extend_from_slice(frame);
        remove_dc_offset(&mut self.windowed);
        apply_hann_window(&mut self.windowed);

        self.spectrum.clear();
        self.spectrum
            .extend(self.windowed.iter().map(|&sample| Complex { re: sample, im: 0.0 }));
        self.spectrum.resize(fft_size, Complex { re: 0.0, im: 0.0 });

        let fft = self.planner.plan_fft_forward(fft_size);
        fft.process(&mut self.spectrum);

        self.magnitudes.clear();
        self.magnitudes
            .extend(self.spectrum.iter().take(fft_size / 2 + 1).map(|c| c.norm()));
        fft_size
    }

    /// Runs the full pipeline on one frame and returns its peaks in ascending
    /// frequency order.
    pub fn analyze(&mut self, frame: &[f32], sample_rate: u32) -> Vec<SpectralPeak> {
        if frame.is_empty() || sample_rate == 0 {
            return Vec::new();
        }
        let fft_size = self.compute_magnitudes(frame);
        let bin_hz = sample_rate as f64 / fft_size as f64;

        find_peaks(&self.magnitudes, self.noise_floor)
            .into_iter()
            .map(|bin| SpectralPeak {
                frequency: interpolate_peak(&self.magnitudes, bin) * bin_hz,
                magnitude: self.magnitudes[bin],
                bin,
            })
            .collect()
    }
}

/// Bins strictly above both neighbours and above `noise_floor`. The first and
/// last bins are never peaks.
pub fn find_peaks(magnitudes: &[f32], noise_floor: f32) -> Vec<usize> {
    if magnitudes.len() < 3 {
        return Vec::new();
    }
    (1..magnitudes.len() - 1)
        .filter(|&i| {
            let m = magnitudes[i];
            m > noise_floor && m > magnitudes[i - 1] && m > magnitudes[i + 1]
        })
        .collect()
}

/// Fractional bin position of the peak at `bin`, by fitting a parabola through
/// the log magnitudes of the bin and its neighbours.
///
/// Falls back to the integer bin when the fit is degenerate.
pub fn interpolate_peak(magnitudes: &[f32], bin: usize) -> f64 {
    if bin == 0 || bin + 1 >= magnitudes.len() {
        return bin as f64;
    }

    let y1 = (magnitudes[bin - 1] as f64).ln();
    let y2 = (magnitudes[bin] as f64).ln();
    let y3 = (magnitudes[bin + 1] as f64).ln();

    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() {
        return bin as f64;
    }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-12 {
        return bin as f64;
    }

    let shift = (y3 - y1) / (2.0 * denominator);
    if shift.abs() > 0.5 {
        return bin as f64;
    }
    bin as f64 + shift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                amplitude * (2.0 * std::f64::consts::PI * freq * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn fft_size_respects_minimum_and_padding() {
        assert_eq!(fft_size_for(1024, 4096, 2), 4096);
        assert_eq!(fft_size_for(2048, 4096, 2), 4096);
        assert_eq!(fft_size_for(4096, 4096, 2), 8192);
        assert_eq!(fft_size_for(3000, 4096, 1), 4096);
        assert_eq!(fft_size_for(5000, 4096, 1), 8192);
    }

    #[test]
    fn peaks_need_both_neighbours_and_floor() {
        let mags = [50.0, 10.0, 20.0, 10.0, 40.0, 40.0, 5.0, 30.0];
        // 0 and 7 are edges, 4/5 is a plateau
        assert_eq!(find_peaks(&mags, 15.0), vec![2]);
        assert!(find_peaks(&mags, 25.0).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.0).is_empty());
    }

    #[test]
    fn silence_has_no_peaks() {
        let mut analyzer = SpectralAnalyzer::new(15.0, 4096, 2);
        assert!(analyzer.analyze(&vec![0.0; 4096], 44100).is_empty());
    }

    #[test]
    fn sine_peak_lands_on_its_frequency() {
        let mut analyzer = SpectralAnalyzer::new(15.0, 4096, 2);
        let frame = sine(392.44, 44100, 4096, 0.5);
        let peaks = analyzer.analyze(&frame, 44100);
        assert!(!peaks.is_empty());

        let strongest = peaks
            .iter()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
            .unwrap();
        assert!((strongest.frequency - 392.44).abs() < 0.5, "got {}", strongest.frequency);
        assert!(strongest.magnitude > 100.0);

        for pair in peaks.windows(2) {
            assert!(pair[0].frequency < pair[1].frequency);
        }
    }

    #[test]
    fn dc_offset_is_removed() {
        let mut signal = vec![1.0, 2.0, 3.0];
        remove_dc_offset(&mut signal);
        assert_eq!(signal, vec![-1.0, 0.0, 1.0]);
    }
}
