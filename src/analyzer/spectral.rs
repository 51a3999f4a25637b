use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

/// FFT frame size (2048 samples = ~46ms at 44.1kHz)
pub const FRAME_SIZE: usize = 2048;

/// Hop size between frames (512 samples, 75% overlap)
pub const HOP_SIZE: usize = 512;

/// Number of triangular mel filters
const MEL_FILTERS: usize = 26;

/// Number of cepstral coefficients kept per frame
pub const NUM_MFCC: usize = 13;

/// Frame-based spectral analyzer with a pre-planned FFT, Hann window and
/// mel filterbank.
pub struct SpectralAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    mel_bank: Vec<Vec<f32>>,
    frame_size: usize,
    hop_size: usize,
    sample_rate: u32,
    scratch_input: Vec<f32>,
    scratch_output: Vec<Complex<f32>>,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_params(sample_rate, FRAME_SIZE, HOP_SIZE)
    }

    pub fn with_params(sample_rate: u32, frame_size: usize, hop_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);

        let window: Vec<f32> = (0..frame_size)
            .map(|i| {
                let t = i as f32 / (frame_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        let mel_bank = mel_filterbank(
            MEL_FILTERS,
            frame_size,
            sample_rate,
            0.0,
            sample_rate as f32 / 2.0,
        );

        let scratch_input = vec![0.0f32; frame_size];
        let scratch_output = vec![Complex::new(0.0f32, 0.0f32); frame_size / 2 + 1];

        Self {
            fft,
            window,
            mel_bank,
            frame_size,
            hop_size,
            sample_rate,
            scratch_input,
            scratch_output,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Magnitude spectrum of one Hann-windowed frame (frame_size/2 + 1 bins).
    pub fn compute_spectrum(&mut self, frame: &[f32]) -> Vec<f32> {
        debug_assert_eq!(frame.len(), self.frame_size);

        for (dst, (&sample, &coef)) in self
            .scratch_input
            .iter_mut()
            .zip(frame.iter().zip(self.window.iter()))
        {
            *dst = sample * coef;
        }

        // realfft only errors on length mismatch, which the scratch buffers rule out
        if self
            .fft
            .process(&mut self.scratch_input, &mut self.scratch_output)
            .is_err()
        {
            return vec![0.0; self.frame_size / 2 + 1];
        }

        self.scratch_output
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect()
    }

    /// Magnitude-weighted mean frequency of a spectrum, in Hz.
    pub fn spectral_centroid(&self, spectrum: &[f32]) -> f32 {
        let bin_width = self.sample_rate as f32 / self.frame_size as f32;

        let mut weighted_sum = 0.0f32;
        let mut magnitude_sum = 0.0f32;
        for (i, &magnitude) in spectrum.iter().enumerate() {
            weighted_sum += i as f32 * bin_width * magnitude;
            magnitude_sum += magnitude;
        }

        if magnitude_sum > f32::EPSILON {
            weighted_sum / magnitude_sum
        } else {
            0.0
        }
    }

    /// 13 mel-frequency cepstral coefficients for one magnitude spectrum:
    /// mel filterbank → log energy → DCT-II.
    pub fn mfcc(&self, spectrum: &[f32]) -> [f32; NUM_MFCC] {
        let mut mel_energies = [0.0f32; MEL_FILTERS];
        for (energy, filter) in mel_energies.iter_mut().zip(self.mel_bank.iter()) {
            let mut acc = 0.0f32;
            for (&mag, &weight) in spectrum.iter().zip(filter.iter()) {
                acc += mag * mag * weight;
            }
            // Epsilon keeps log finite on silent frames
            *energy = (acc + 1e-10).ln();
        }

        let coeffs = dct_ii(&mel_energies, NUM_MFCC);
        let mut out = [0.0f32; NUM_MFCC];
        out.copy_from_slice(&coeffs);
        out
    }
}

/// Convert frequency in Hz to the mel scale.
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel scale back to Hz.
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the magnitude spectrum bins.
/// Each row is one filter of length frame_size/2 + 1.
fn mel_filterbank(
    num_filters: usize,
    frame_size: usize,
    sample_rate: u32,
    low_freq: f32,
    high_freq: f32,
) -> Vec<Vec<f32>> {
    let num_bins = frame_size / 2 + 1;
    let low_mel = hz_to_mel(low_freq);
    let high_mel = hz_to_mel(high_freq.min(sample_rate as f32 / 2.0));

    // num_filters + 2 equally spaced mel points, mapped back to bin indices
    let bin_points: Vec<usize> = (0..num_filters + 2)
        .map(|i| {
            let mel = low_mel + (high_mel - low_mel) * i as f32 / (num_filters + 1) as f32;
            let hz = mel_to_hz(mel);
            ((hz * frame_size as f32 / sample_rate as f32) as usize).min(num_bins - 1)
        })
        .collect();

    let mut bank = vec![vec![0.0f32; num_bins]; num_filters];
    for (i, filter) in bank.iter_mut().enumerate() {
        let start = bin_points[i];
        let center = bin_points[i + 1];
        let end = bin_points[i + 2];

        if center > start {
            for k in start..center {
                filter[k] = (k - start) as f32 / (center - start) as f32;
            }
        }
        if end > center {
            for k in center..=end {
                filter[k] = (end - k) as f32 / (end - center) as f32;
            }
        }
    }

    bank
}

/// DCT-II of the log mel energies, keeping the first `num_coeffs` terms.
fn dct_ii(input: &[f32], num_coeffs: usize) -> Vec<f32> {
    let n = input.len();
    (0..num_coeffs)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x as f64
                        * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0)
                            / (2.0 * n as f64))
                            .cos()
                })
                .sum::<f64>() as f32
        })
        .collect()
}

/// Fraction of sign changes in a signal, normalized to [0, 1].
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| w[0] * w[1] < 0.0)
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

/// Root-mean-square amplitude of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Mean per-frame RMS energy. Falls back to whole-signal RMS when the
/// signal is shorter than one frame; `None` only for empty input.
pub fn mean_rms(samples: &[f32]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    if samples.len() < FRAME_SIZE {
        return Some(rms(samples) as f64);
    }
    let values: Vec<f32> = frames(samples, FRAME_SIZE, HOP_SIZE).map(rms).collect();
    Some(mean(&values))
}

/// Mean per-frame zero-crossing rate, with the same short-signal fallback.
pub fn mean_zcr(samples: &[f32]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    if samples.len() < FRAME_SIZE {
        return Some(zero_crossing_rate(samples) as f64);
    }
    let values: Vec<f32> = frames(samples, FRAME_SIZE, HOP_SIZE)
        .map(zero_crossing_rate)
        .collect();
    Some(mean(&values))
}

/// Mean per-frame spectral centroid in Hz. `None` below one frame of audio.
pub fn mean_centroid(samples: &[f32], sample_rate: u32) -> Option<f64> {
    if samples.len() < FRAME_SIZE {
        return None;
    }
    let mut analyzer = SpectralAnalyzer::new(sample_rate);
    let values: Vec<f32> = frames(samples, FRAME_SIZE, HOP_SIZE)
        .map(|frame| {
            let spectrum = analyzer.compute_spectrum(frame);
            analyzer.spectral_centroid(&spectrum)
        })
        .collect();
    Some(mean(&values))
}

/// Per-coefficient mean of frame-wise MFCCs. `None` below one frame of audio.
pub fn mean_mfcc(samples: &[f32], sample_rate: u32) -> Option<[f64; NUM_MFCC]> {
    if samples.len() < FRAME_SIZE {
        return None;
    }
    let mut analyzer = SpectralAnalyzer::new(sample_rate);

    let mut sums = [0.0f64; NUM_MFCC];
    let mut count = 0usize;
    for frame in frames(samples, FRAME_SIZE, HOP_SIZE) {
        let spectrum = analyzer.compute_spectrum(frame);
        let coeffs = analyzer.mfcc(&spectrum);
        for (sum, &c) in sums.iter_mut().zip(coeffs.iter()) {
            *sum += c as f64;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }
    for sum in &mut sums {
        *sum /= count as f64;
    }
    Some(sums)
}

fn frames(samples: &[f32], frame_size: usize, hop_size: usize) -> impl Iterator<Item = &[f32]> {
    (0..)
        .map(move |i| i * hop_size)
        .take_while(move |start| start + frame_size <= samples.len())
        .map(move |start| &samples[start..start + frame_size])
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}
